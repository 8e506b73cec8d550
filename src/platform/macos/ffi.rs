//! Mach API declarations the `mach2` crate does not provide
//!
//! `task_for_pid` is a restricted API (root or a debugging
//! entitlement), `mach_error_string` maps kernel return codes to the
//! kernel's own descriptions, and the dyld task-info structures are the
//! loader metadata the library enumerator walks.

use mach2::kern_return::kern_return_t;
use mach2::port::mach_port_t;

extern "C" {
    /// Obtain the Mach task port for a process by pid. Requires root or
    /// the `com.apple.security.cs.debugger` entitlement.
    pub fn task_for_pid(
        target_task: mach_port_t,
        pid: libc::c_int,
        task: *mut mach_port_t,
    ) -> kern_return_t;

    /// The kernel's string table for `kern_return_t` codes.
    pub fn mach_error_string(error_value: kern_return_t) -> *const libc::c_char;
}

/// `task_info` flavor selecting [`TaskDyldInfo`].
pub const TASK_DYLD_INFO: u32 = 17;

/// Image-info format markers from `all_image_info_format`.
pub const TASK_DYLD_ALL_IMAGE_INFO_32: i32 = 0;
pub const TASK_DYLD_ALL_IMAGE_INFO_64: i32 = 1;

/// `struct task_dyld_info` from `<mach/task_info.h>`: where the
/// target's `dyld_all_image_infos` lives and which pointer width its
/// entries use.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskDyldInfo {
    pub all_image_info_addr: u64,
    pub all_image_info_size: u64,
    pub all_image_info_format: i32,
}

/// Size of [`TaskDyldInfo`] in `natural_t` units, as `task_info`
/// expects.
pub const TASK_DYLD_INFO_COUNT: u32 =
    (std::mem::size_of::<TaskDyldInfo>() / std::mem::size_of::<u32>()) as u32;
