//! Process handle lifecycle
//!
//! A [`ProcessHandle`] is the capability to query and read one target
//! process: a task port on Mach-based systems, a kernel handle on
//! Windows, a validated pid on Linux. `open` hands back a handle even
//! when it fails, and `close` consumes the handle, so the
//! close-exactly-once contract is enforced by move semantics. A handle
//! that is dropped without being closed is cleaned up best-effort with
//! errors ignored.

use crate::core::types::{Address, LoadedLibrary, MemoryRegion, Pid, Response, SysError};
use crate::platform::imp;
use crate::process::ProcessIntrospection;
use std::fmt;

/// An open (or failed-to-open) handle onto a target process.
pub struct ProcessHandle {
    inner: imp::OsHandle,
    closed: bool,
}

impl ProcessHandle {
    /// Open a handle for `pid` with the minimal privilege needed to
    /// query information and read memory.
    ///
    /// On failure the response carries a fatal error and the handle is
    /// invalid, but it must still be passed to [`close`](Self::close):
    /// the OS may have partially acquired resources.
    pub fn open(pid: Pid) -> (Response, ProcessHandle) {
        let (response, inner) = imp::open(pid);
        (
            response,
            ProcessHandle {
                inner,
                closed: false,
            },
        )
    }

    /// The target's pid.
    pub fn pid(&self) -> Pid {
        self.inner.pid()
    }

    /// Whether the handle can be used for introspection calls.
    pub fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    /// Release the capability. Must be called exactly once per open,
    /// successful or not; a release failure is reported as a fatal
    /// error but not retried.
    pub fn close(mut self) -> Response {
        let response = imp::close(&mut self.inner);
        self.closed = true;
        response
    }

    pub(crate) fn os(&self) -> &imp::OsHandle {
        &self.inner
    }

    /// Fatal response for operations invoked on an invalid handle.
    pub(crate) fn guard(&self) -> Option<Response> {
        if self.is_valid() {
            None
        } else {
            Some(Response::fatal(SysError::with_message(
                "invalid process handle",
            )))
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if !self.closed {
            // Best-effort cleanup for leaked handles; errors are only
            // reported through the explicit close path.
            let _ = imp::close(&mut self.inner);
        }
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid())
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProcessHandle(pid={}, valid={})",
            self.pid(),
            self.is_valid()
        )
    }
}

impl ProcessIntrospection for ProcessHandle {
    fn pid(&self) -> Pid {
        ProcessHandle::pid(self)
    }

    fn next_readable_region(&self, address: Address) -> (Response, Option<MemoryRegion>) {
        crate::memory::next_readable_region(self, address)
    }

    fn copy_memory(&self, address: Address, buffer: &mut [u8]) -> (Response, usize) {
        crate::memory::copy_memory(self, address, buffer)
    }

    fn list_loaded_libraries(&self) -> (Response, Vec<LoadedLibrary>) {
        crate::process::list_loaded_libraries(self)
    }

    fn name(&self) -> (Response, String) {
        if let Some(response) = self.guard() {
            return (response, String::new());
        }
        imp::process_name(self.os())
    }
}
