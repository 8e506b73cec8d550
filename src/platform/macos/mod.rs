//! Mach-based (macOS) implementation
//!
//! The handle is a task port from `task_for_pid`. Regions come from the
//! recursive, submap-aware `mach_vm_region_recurse`, bulk reads from
//! `mach_vm_read_overwrite`, and the library list from manually walking
//! the target's `dyld_all_image_infos` array in remote memory.

pub mod ffi;

use crate::core::types::{Address, LoadedLibrary, MemoryRegion, Pid, Response, SysError};
use crate::platform::scan::{self, BlockState, QueryAnswer};
use mach2::kern_return::{kern_return_t, KERN_INVALID_ADDRESS, KERN_SUCCESS};
use mach2::message::mach_msg_type_number_t;
use mach2::port::{mach_port_t, MACH_PORT_NULL};
use mach2::vm::{mach_vm_read_overwrite, mach_vm_region_recurse};
use mach2::vm_prot::VM_PROT_READ;
use mach2::vm_region::{
    vm_region_recurse_info_t, vm_region_submap_short_info_data_64_t,
    VM_REGION_SUBMAP_SHORT_INFO_COUNT_64,
};
use mach2::vm_types::{mach_vm_address_t, mach_vm_size_t, natural_t};
use std::ffi::CStr;
use std::mem;
use tracing::debug;

/// Chunk size for the bounded null-terminated path reads during
/// library enumeration.
const PATH_READ_CHUNK: usize = 128;

impl SysError {
    /// Build an error from a kernel return code, mapped through the
    /// kernel's own string table.
    pub fn from_kern_return(kret: kern_return_t) -> Self {
        let description = unsafe {
            let raw = ffi::mach_error_string(kret);
            if raw.is_null() {
                String::from("unknown kernel error")
            } else {
                CStr::from_ptr(raw).to_string_lossy().into_owned()
            }
        };
        SysError::new(kret, description)
    }
}

/// macOS process handle: the target's Mach task port.
#[derive(Debug)]
pub struct OsHandle {
    task: mach_port_t,
    pid: Pid,
}

impl OsHandle {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn is_valid(&self) -> bool {
        self.task != MACH_PORT_NULL
    }
}

/// Open the target's task port. A (null) handle is returned even on
/// failure so the caller can follow the close-exactly-once contract.
pub fn open(pid: Pid) -> (Response, OsHandle) {
    let mut response = Response::new();
    let mut task: mach_port_t = MACH_PORT_NULL;
    let kret =
        unsafe { ffi::task_for_pid(mach2::traps::mach_task_self(), pid as libc::c_int, &mut task) };
    if kret != KERN_SUCCESS {
        response.set_fatal(SysError::from_kern_return(kret));
        task = MACH_PORT_NULL;
    }
    debug!(pid, valid = task != MACH_PORT_NULL, "opened process handle");
    (response, OsHandle { task, pid })
}

/// Deallocate the task port. Closing a handle that was never acquired
/// is a no-op; a deallocation failure is fatal but not retried.
pub fn close(handle: &mut OsHandle) -> Response {
    let mut response = Response::new();
    if handle.task != MACH_PORT_NULL {
        let kret = unsafe {
            mach2::mach_port::mach_port_deallocate(mach2::traps::mach_task_self(), handle.task)
        };
        if kret != KERN_SUCCESS {
            response.set_fatal(SysError::from_kern_return(kret));
        }
        handle.task = MACH_PORT_NULL;
    }
    debug!(pid = handle.pid, "closed process handle");
    response
}

pub fn next_readable_region(handle: &OsHandle, address: Address) -> (Response, Option<MemoryRegion>) {
    // Submap recursion depth is kernel-query state: it persists across
    // queries and grows every time an answer is a submap.
    let mut depth: natural_t = 0;

    scan::next_region_spanning(address, |cursor| {
        let mut addr: mach_vm_address_t = cursor;
        loop {
            let mut size: mach_vm_size_t = 0;
            let mut info: vm_region_submap_short_info_data_64_t = unsafe { mem::zeroed() };
            let mut count: mach_msg_type_number_t = VM_REGION_SUBMAP_SHORT_INFO_COUNT_64;

            let kret = unsafe {
                mach_vm_region_recurse(
                    handle.task,
                    &mut addr,
                    &mut size,
                    &mut depth,
                    &mut info as *mut _ as vm_region_recurse_info_t,
                    &mut count,
                )
            };
            if kret == KERN_INVALID_ADDRESS {
                // End of the address space, a normal stop condition.
                return QueryAnswer::End;
            }
            if kret != KERN_SUCCESS {
                return QueryAnswer::Fail(SysError::from_kern_return(kret));
            }

            if info.is_submap != 0 {
                // Re-query the same address one level deeper.
                depth += 1;
                continue;
            }

            let state = if info.protection & VM_PROT_READ == VM_PROT_READ {
                BlockState::Readable
            } else {
                BlockState::Unreadable
            };
            return QueryAnswer::Block {
                base: addr,
                size,
                state,
            };
        }
    })
}

pub fn copy_memory(handle: &OsHandle, address: Address, buffer: &mut [u8]) -> (Response, usize) {
    let mut read: mach_vm_size_t = 0;
    let kret = unsafe {
        mach_vm_read_overwrite(
            handle.task,
            address.as_u64(),
            buffer.len() as mach_vm_size_t,
            buffer.as_mut_ptr() as mach_vm_address_t,
            &mut read,
        )
    };
    if kret != KERN_SUCCESS {
        return (Response::fatal(SysError::from_kern_return(kret)), 0);
    }
    (Response::new(), read as usize)
}

/// Read exactly `buffer.len()` bytes of remote memory; a short read is
/// an error here because loader metadata is never allowed to be
/// truncated.
fn read_exact_remote(task: mach_port_t, address: u64, buffer: &mut [u8]) -> Result<(), SysError> {
    let mut read: mach_vm_size_t = 0;
    let kret = unsafe {
        mach_vm_read_overwrite(
            task,
            address,
            buffer.len() as mach_vm_size_t,
            buffer.as_mut_ptr() as mach_vm_address_t,
            &mut read,
        )
    };
    if kret != KERN_SUCCESS {
        return Err(SysError::from_kern_return(kret));
    }
    if read as usize != buffer.len() {
        return Err(SysError::with_message(format!(
            "couldn't read {} bytes from {:#x}",
            buffer.len(),
            address
        )));
    }
    Ok(())
}

/// Read `width` little-endian bytes (4 or 8, the target's pointer
/// width) as a zero-extended u64.
fn read_remote_pointer(task: mach_port_t, address: u64, width: usize) -> Result<u64, SysError> {
    let mut bytes = [0u8; 8];
    read_exact_remote(task, address, &mut bytes[..width])?;
    Ok(u64::from_le_bytes(bytes))
}

/// Read a null-terminated string from remote memory in fixed-size
/// chunks. A chunk that comes back short before a terminator was found
/// means the string ran into non-contiguous memory.
fn read_remote_string(task: mach_port_t, address: u64) -> Result<String, SysError> {
    let mut collected = Vec::new();
    let mut offset = 0u64;
    loop {
        let mut chunk = [0u8; PATH_READ_CHUNK];
        let mut read: mach_vm_size_t = 0;
        let kret = unsafe {
            mach_vm_read_overwrite(
                task,
                address + offset,
                PATH_READ_CHUNK as mach_vm_size_t,
                chunk.as_mut_ptr() as mach_vm_address_t,
                &mut read,
            )
        };
        if kret != KERN_SUCCESS {
            return Err(SysError::from_kern_return(kret));
        }
        let read = read as usize;

        if let Some(terminator) = chunk[..read].iter().position(|&byte| byte == 0) {
            collected.extend_from_slice(&chunk[..terminator]);
            return Ok(String::from_utf8_lossy(&collected).into_owned());
        }
        collected.extend_from_slice(&chunk[..read]);

        if read < PATH_READ_CHUNK {
            return Err(SysError::with_message(format!(
                "couldn't read library path from {:#x}",
                address
            )));
        }
        offset += read as u64;
    }
}

/// Walk the target's `dyld_all_image_infos` image array. The pointer
/// width and per-entry stride follow the *target's* reported image-info
/// format, since the inspector's bit-width may differ from its
/// target's.
pub fn list_loaded_libraries(handle: &OsHandle) -> (Response, Vec<LoadedLibrary>) {
    let mut response = Response::new();

    let mut dyld_info = ffi::TaskDyldInfo::default();
    let mut count: mach_msg_type_number_t = ffi::TASK_DYLD_INFO_COUNT;
    let kret = unsafe {
        mach2::task::task_info(
            handle.task,
            ffi::TASK_DYLD_INFO,
            &mut dyld_info as *mut _ as mach2::task_info::task_info_t,
            &mut count,
        )
    };
    if kret != KERN_SUCCESS {
        response.set_fatal(SysError::from_kern_return(kret));
        return (response, Vec::new());
    }

    let all_info_addr = dyld_info.all_image_info_addr;
    if all_info_addr == 0 {
        response.set_fatal(SysError::with_message(
            "can't find dyld_all_image_infos in the process",
        ));
        return (response, Vec::new());
    }

    let pointer_size: usize = match dyld_info.all_image_info_format {
        ffi::TASK_DYLD_ALL_IMAGE_INFO_32 => 4,
        // TASK_DYLD_ALL_IMAGE_INFO_64 and any later format.
        _ => {
            debug_assert_eq!(
                dyld_info.all_image_info_format,
                ffi::TASK_DYLD_ALL_IMAGE_INFO_64
            );
            8
        }
    };
    // Each dyld_image_info entry is two pointers and a pointer-sized
    // modification date.
    let entry_stride = (pointer_size * 3) as u64;

    // dyld_all_image_infos: a 4-byte version, a 4-byte image count,
    // then the pointer to the image-info array.
    let mut raw_count = [0u8; 4];
    if let Err(err) = read_exact_remote(handle.task, all_info_addr + 4, &mut raw_count) {
        response.set_fatal(err);
        return (response, Vec::new());
    }
    let image_count = u32::from_le_bytes(raw_count);

    let array_addr = match read_remote_pointer(handle.task, all_info_addr + 8, pointer_size) {
        Ok(addr) => addr,
        Err(err) => {
            response.set_fatal(err);
            return (response, Vec::new());
        }
    };

    let mut libraries = Vec::with_capacity(64);
    for index in 0..image_count as u64 {
        // The path pointer sits one pointer past the entry start.
        let path_addr_location = array_addr + index * entry_stride + pointer_size as u64;
        let path_addr = match read_remote_pointer(handle.task, path_addr_location, pointer_size) {
            Ok(addr) => addr,
            Err(err) => {
                response.set_fatal(err);
                return (response, Vec::new());
            }
        };
        let path = match read_remote_string(handle.task, path_addr) {
            Ok(path) => path,
            Err(err) => {
                response.set_fatal(err);
                return (response, Vec::new());
            }
        };
        libraries.push(LoadedLibrary::new(path));
    }

    debug!(pid = handle.pid, count = libraries.len(), "listed loaded libraries");
    (response, libraries)
}

pub fn process_name(handle: &OsHandle) -> (Response, String) {
    match libproc::proc_pid::pidpath(handle.pid as i32) {
        Ok(path) => (Response::new(), path),
        Err(err) => (
            Response::fatal(SysError::with_message(err.to_string())),
            String::new(),
        ),
    }
}

/// All running pids via `proc_listallpids`.
pub fn all_pids() -> std::io::Result<Vec<Pid>> {
    libproc::processes::pids_by_type(libproc::processes::ProcFilter::All)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // task_for_pid on the test's own pid works without extra
    // privileges; other targets need root or the debugger entitlement.

    #[test]
    fn test_open_close_and_copy_own_memory() {
        let marker: [u8; 8] = *b"memscout";
        let (response, mut handle) = open(std::process::id());
        assert!(response.fatal_error().is_none());
        assert!(handle.is_valid());

        let mut buffer = [0u8; 8];
        let (response, bytes_read) =
            copy_memory(&handle, Address::from(marker.as_ptr() as usize), &mut buffer);
        assert!(response.fatal_error().is_none());
        assert_eq!(bytes_read, 8);
        assert_eq!(buffer, marker);

        assert!(close(&mut handle).fatal_error().is_none());
        assert!(!handle.is_valid());
    }

    #[test]
    fn test_scan_own_address_space() {
        let (_, mut handle) = open(std::process::id());
        let (response, region) = next_readable_region(&handle, Address::new(0));
        assert!(response.fatal_error().is_none());
        assert!(region.is_some());
        close(&mut handle);
    }

    #[test]
    fn test_dyld_walk_lists_own_images() {
        let (_, mut handle) = open(std::process::id());
        let (response, libraries) = list_loaded_libraries(&handle);
        assert!(response.fatal_error().is_none());
        assert!(!libraries.is_empty());
        assert!(libraries
            .iter()
            .any(|lib| lib.path.contains("libsystem") || lib.path.contains("dyld")));
        close(&mut handle);
    }

    #[test]
    fn test_process_name_resolves() {
        let (_, mut handle) = open(std::process::id());
        let (response, name) = process_name(&handle);
        assert!(response.fatal_error().is_none());
        assert!(!name.is_empty());
        close(&mut handle);
    }
}
