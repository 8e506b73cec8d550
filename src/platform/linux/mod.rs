//! Linux implementation backed by procfs
//!
//! Regions come from `/proc/<pid>/maps`, bulk reads from a positioned
//! read on `/proc/<pid>/mem`, and library listings from the file-backed
//! maps entries. No kernel object is held between calls; the "handle"
//! is the validated pid itself.

pub mod maps;

use crate::core::types::{Address, LoadedLibrary, MemoryRegion, Pid, Response, SysError};
use std::fs::File;
use std::io::BufReader;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;
use tracing::debug;

fn proc_path(pid: Pid, entry: &str) -> PathBuf {
    PathBuf::from(format!("/proc/{pid}/{entry}"))
}

/// Linux process handle: a pid whose procfs directory existed at open
/// time.
#[derive(Debug)]
pub struct OsHandle {
    pid: Pid,
    valid: bool,
}

impl OsHandle {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Open a handle for `pid`. The handle is returned even on failure so
/// the caller can follow the close-exactly-once contract.
pub fn open(pid: Pid) -> (Response, OsHandle) {
    let mut response = Response::new();
    let valid = match std::fs::metadata(proc_path(pid, "maps")) {
        Ok(_) => true,
        Err(err) => {
            response.set_fatal(err.into());
            false
        }
    };
    debug!(pid, valid, "opened process handle");
    (response, OsHandle { pid, valid })
}

/// Close a handle. Nothing is held open between calls on Linux, so
/// this only invalidates the handle.
pub fn close(handle: &mut OsHandle) -> Response {
    debug!(pid = handle.pid, "closed process handle");
    handle.valid = false;
    Response::new()
}

pub fn next_readable_region(handle: &OsHandle, address: Address) -> (Response, Option<MemoryRegion>) {
    let maps = match File::open(proc_path(handle.pid, "maps")) {
        Ok(file) => file,
        Err(err) => return (Response::fatal(err.into()), None),
    };
    maps::next_readable_region_in(BufReader::new(maps), address)
}

pub fn copy_memory(handle: &OsHandle, address: Address, buffer: &mut [u8]) -> (Response, usize) {
    let mem = match File::open(proc_path(handle.pid, "mem")) {
        Ok(file) => file,
        Err(err) => return (Response::fatal(err.into()), 0),
    };

    match mem.read_at(buffer, address.as_u64()) {
        Ok(bytes_read) => (Response::new(), bytes_read),
        Err(err) => {
            let mut response = Response::new();
            response.set_fatal(SysError::from(err));
            (response, 0)
        }
    }
}

pub fn list_loaded_libraries(handle: &OsHandle) -> (Response, Vec<LoadedLibrary>) {
    let maps = match File::open(proc_path(handle.pid, "maps")) {
        Ok(file) => file,
        Err(err) => return (Response::fatal(err.into()), Vec::new()),
    };
    maps::list_libraries_in(BufReader::new(maps))
}

pub fn process_name(handle: &OsHandle) -> (Response, String) {
    match std::fs::read_link(proc_path(handle.pid, "exe")) {
        Ok(path) => (Response::new(), path.display().to_string()),
        Err(err) => (Response::fatal(err.into()), String::new()),
    }
}

/// All currently running pids, from the numeric entries of `/proc`.
pub fn all_pids() -> std::io::Result<Vec<Pid>> {
    let mut pids = Vec::new();
    for entry in std::fs::read_dir("/proc")? {
        let entry = entry?;
        if let Ok(pid) = entry.file_name().to_string_lossy().parse::<Pid>() {
            pids.push(pid);
        }
    }
    Ok(pids)
}
