//! Thin wrappers over the kernel32/psapi calls memscout needs
//!
//! Each wrapper returns the raw `GetLastError` code on failure so the
//! layer above can build `SysError`s with the OS's own description.

use std::mem;
use winapi::shared::minwindef::{DWORD, FALSE, HMODULE, MAX_PATH};
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::{ReadProcessMemory, VirtualQueryEx};
use winapi::um::processthreadsapi::OpenProcess;
use winapi::um::psapi::{
    EnumProcessModulesEx, EnumProcesses, GetModuleFileNameExW, GetModuleInformation,
    LIST_MODULES_ALL, MODULEINFO,
};
use winapi::um::winnt::{HANDLE, MEMORY_BASIC_INFORMATION};

/// Safe wrapper for OpenProcess.
pub fn open_process(pid: u32, desired_access: u32) -> Result<HANDLE, u32> {
    unsafe {
        let handle = OpenProcess(desired_access, FALSE, pid);
        if handle.is_null() {
            Err(GetLastError())
        } else {
            Ok(handle)
        }
    }
}

/// Safe wrapper for CloseHandle.
///
/// # Safety
/// The handle must be a valid, open Windows handle.
pub unsafe fn close_handle(handle: HANDLE) -> Result<(), u32> {
    if CloseHandle(handle) == FALSE {
        Err(GetLastError())
    } else {
        Ok(())
    }
}

/// Safe wrapper for VirtualQueryEx.
///
/// # Safety
/// The handle must be a valid process handle with query access.
pub unsafe fn virtual_query_ex(
    handle: HANDLE,
    address: u64,
) -> Result<MEMORY_BASIC_INFORMATION, u32> {
    let mut info: MEMORY_BASIC_INFORMATION = mem::zeroed();
    let written = VirtualQueryEx(
        handle,
        address as usize as *const _,
        &mut info,
        mem::size_of::<MEMORY_BASIC_INFORMATION>(),
    );
    if written == 0 {
        Err(GetLastError())
    } else {
        Ok(info)
    }
}

/// Safe wrapper for ReadProcessMemory.
///
/// # Safety
/// The handle must be a valid process handle with read access.
pub unsafe fn read_process_memory(
    handle: HANDLE,
    address: u64,
    buffer: &mut [u8],
) -> Result<usize, u32> {
    let mut bytes_read = 0usize;
    let result = ReadProcessMemory(
        handle,
        address as usize as *const _,
        buffer.as_mut_ptr() as *mut _,
        buffer.len(),
        &mut bytes_read,
    );
    if result == FALSE {
        Err(GetLastError())
    } else {
        Ok(bytes_read)
    }
}

/// All module handles of a process, probed with a doubling buffer: the
/// listing is complete only once the reported byte count is strictly
/// less than the buffer's, anything else may be truncated.
///
/// # Safety
/// The handle must be a valid process handle with query access.
pub unsafe fn enum_process_modules(handle: HANDLE) -> Result<Vec<HMODULE>, u32> {
    let mut capacity = 512usize;
    loop {
        capacity *= 2;
        let mut modules: Vec<HMODULE> = vec![std::ptr::null_mut(); capacity];
        let byte_capacity = (capacity * mem::size_of::<HMODULE>()) as DWORD;
        let mut bytes_needed: DWORD = 0;
        let result = EnumProcessModulesEx(
            handle,
            modules.as_mut_ptr(),
            byte_capacity,
            &mut bytes_needed,
            LIST_MODULES_ALL,
        );
        if result == FALSE {
            return Err(GetLastError());
        }
        if bytes_needed < byte_capacity {
            modules.truncate(bytes_needed as usize / mem::size_of::<HMODULE>());
            return Ok(modules);
        }
    }
}

/// Resolve a module handle to its file path, doubling the buffer while
/// the path fills it completely: GetModuleFileNameExW truncates
/// silently, returning the buffer size with no error, so only a
/// strictly smaller return value means the path came back whole.
///
/// # Safety
/// The process handle and module handle must be valid.
pub unsafe fn module_file_name(handle: HANDLE, module: HMODULE) -> Result<String, u32> {
    let mut capacity = MAX_PATH;
    loop {
        let mut buffer = vec![0u16; capacity];
        let length =
            GetModuleFileNameExW(handle, module, buffer.as_mut_ptr(), capacity as DWORD) as usize;
        if length == 0 {
            return Err(GetLastError());
        }
        if length < capacity {
            return Ok(String::from_utf16_lossy(&buffer[..length]));
        }
        capacity *= 2;
    }
}

/// Resolve a module handle to its base address and image size.
///
/// # Safety
/// The process handle and module handle must be valid.
pub unsafe fn module_information(handle: HANDLE, module: HMODULE) -> Result<MODULEINFO, u32> {
    let mut info: MODULEINFO = mem::zeroed();
    let result = GetModuleInformation(
        handle,
        module,
        &mut info,
        mem::size_of::<MODULEINFO>() as DWORD,
    );
    if result == FALSE {
        Err(GetLastError())
    } else {
        Ok(info)
    }
}

/// All running pids, probed with a doubling buffer exactly like the
/// module enumeration: `EnumProcesses` reports only the bytes written,
/// so a completely filled buffer means elements were probably left out.
pub fn enum_processes() -> Result<Vec<u32>, u32> {
    let mut capacity = 512usize;
    loop {
        capacity *= 2;
        let mut pids = vec![0u32; capacity];
        let byte_capacity = (capacity * mem::size_of::<DWORD>()) as DWORD;
        let mut bytes_returned: DWORD = 0;
        let result =
            unsafe { EnumProcesses(pids.as_mut_ptr(), byte_capacity, &mut bytes_returned) };
        if result == FALSE {
            return Err(unsafe { GetLastError() });
        }
        if bytes_returned < byte_capacity {
            pids.truncate(bytes_returned as usize / mem::size_of::<DWORD>());
            return Ok(pids);
        }
    }
}
