//! Windows implementation backed by kernel32/psapi
//!
//! The region scanner walks `VirtualQueryEx` info blocks, the copier is
//! a single `ReadProcessMemory`, and library enumeration combines the
//! doubling-buffer module probe with per-module filename/info queries.

pub mod bindings;

use crate::core::types::{Address, LoadedLibrary, MemoryRegion, Pid, Response, SysError};
use crate::platform::scan::{self, BlockState, QueryAnswer};
use std::ptr;
use tracing::debug;
use winapi::shared::winerror::ERROR_INVALID_PARAMETER;
use winapi::um::winnt::{
    HANDLE, MEMORY_BASIC_INFORMATION, MEM_FREE, PAGE_EXECUTE_READ, PAGE_EXECUTE_READWRITE,
    PAGE_READONLY, PAGE_READWRITE, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

/// Windows process handle wrapping the kernel object from OpenProcess.
#[derive(Debug)]
pub struct OsHandle {
    handle: HANDLE,
    pid: Pid,
}

// HANDLEs are process-local kernel object references.
unsafe impl Send for OsHandle {}
unsafe impl Sync for OsHandle {}

impl OsHandle {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn is_valid(&self) -> bool {
        !self.handle.is_null()
    }
}

/// Open a handle with the minimal rights needed: query information and
/// read memory. A (null) handle is returned even on failure so the
/// caller can follow the close-exactly-once contract.
pub fn open(pid: Pid) -> (Response, OsHandle) {
    let mut response = Response::new();
    let handle = match bindings::open_process(pid, PROCESS_QUERY_INFORMATION | PROCESS_VM_READ) {
        Ok(handle) => handle,
        Err(code) => {
            response.set_fatal(SysError::from_os_code(code as i32));
            ptr::null_mut()
        }
    };
    debug!(pid, valid = !handle.is_null(), "opened process handle");
    (response, OsHandle { handle, pid })
}

/// Close the handle. Closing a handle that was never acquired (failed
/// open) is a no-op; an actual CloseHandle failure is fatal but not
/// retried.
pub fn close(handle: &mut OsHandle) -> Response {
    let mut response = Response::new();
    if !handle.handle.is_null() {
        if let Err(code) = unsafe { bindings::close_handle(handle.handle) } {
            response.set_fatal(SysError::from_os_code(code as i32));
        }
        handle.handle = ptr::null_mut();
    }
    debug!(pid = handle.pid, "closed process handle");
    response
}

/// Protection allow-list: only plainly readable protections count, the
/// exotic ones (guard, no-cache, write-copy) do not.
fn block_state(info: &MEMORY_BASIC_INFORMATION) -> BlockState {
    if info.State == MEM_FREE {
        return BlockState::Unmapped;
    }
    match info.Protect {
        PAGE_READONLY | PAGE_READWRITE | PAGE_EXECUTE_READ | PAGE_EXECUTE_READWRITE => {
            BlockState::Readable
        }
        _ => BlockState::Unreadable,
    }
}

pub fn next_readable_region(handle: &OsHandle, address: Address) -> (Response, Option<MemoryRegion>) {
    scan::next_region_exact(address, |cursor| {
        match unsafe { bindings::virtual_query_ex(handle.handle, cursor) } {
            Ok(info) => QueryAnswer::Block {
                base: info.BaseAddress as u64,
                size: info.RegionSize as u64,
                state: block_state(&info),
            },
            // Querying past the last mapping fails with
            // ERROR_INVALID_PARAMETER: that is the end of the address
            // space, not a failure.
            Err(ERROR_INVALID_PARAMETER) => QueryAnswer::End,
            Err(code) => QueryAnswer::Fail(SysError::from_os_code(code as i32)),
        }
    })
}

pub fn copy_memory(handle: &OsHandle, address: Address, buffer: &mut [u8]) -> (Response, usize) {
    match unsafe { bindings::read_process_memory(handle.handle, address.as_u64(), buffer) } {
        Ok(bytes_read) => (Response::new(), bytes_read),
        Err(code) => (Response::fatal(SysError::from_os_code(code as i32)), 0),
    }
}

/// List all modules with their paths, base addresses, and sizes. Any
/// single resolution failure aborts the whole enumeration; there is no
/// best-effort partial list on this platform.
pub fn list_loaded_libraries(handle: &OsHandle) -> (Response, Vec<LoadedLibrary>) {
    let modules = match unsafe { bindings::enum_process_modules(handle.handle) } {
        Ok(modules) => modules,
        Err(code) => return (Response::fatal(SysError::from_os_code(code as i32)), Vec::new()),
    };

    let mut libraries = Vec::with_capacity(modules.len());
    for module in modules {
        let path = match unsafe { bindings::module_file_name(handle.handle, module) } {
            Ok(path) => path,
            Err(code) => {
                return (Response::fatal(SysError::from_os_code(code as i32)), Vec::new())
            }
        };
        let info = match unsafe { bindings::module_information(handle.handle, module) } {
            Ok(info) => info,
            Err(code) => {
                return (Response::fatal(SysError::from_os_code(code as i32)), Vec::new())
            }
        };
        libraries.push(LoadedLibrary::with_location(
            path,
            Address::from(info.lpBaseOfDll as usize),
            info.SizeOfImage as u64,
        ));
    }

    debug!(pid = handle.pid, count = libraries.len(), "listed loaded libraries");
    (Response::new(), libraries)
}

/// The target's executable path: the first module in the enumeration is
/// the executable itself.
pub fn process_name(handle: &OsHandle) -> (Response, String) {
    let modules = match unsafe { bindings::enum_process_modules(handle.handle) } {
        Ok(modules) => modules,
        Err(code) => return (Response::fatal(SysError::from_os_code(code as i32)), String::new()),
    };
    let Some(&first) = modules.first() else {
        return (
            Response::fatal(SysError::with_message("process has no modules")),
            String::new(),
        );
    };
    match unsafe { bindings::module_file_name(handle.handle, first) } {
        Ok(path) => (Response::new(), path),
        Err(code) => (Response::fatal(SysError::from_os_code(code as i32)), String::new()),
    }
}

/// All running pids via the EnumProcesses doubling probe.
pub fn all_pids() -> std::io::Result<Vec<Pid>> {
    bindings::enum_processes().map_err(|code| std::io::Error::from_raw_os_error(code as i32))
}
