//! Discovery of running processes
//!
//! This is a coarse bootstrap query, so unlike every per-target
//! operation it reports failures as a plain `io::Error` (the raw OS
//! code is available through `raw_os_error`) instead of a
//! [`Response`](crate::Response).

use crate::core::types::Pid;
use crate::platform::imp;

/// All currently running process identifiers, in no particular order.
pub fn get_all_pids() -> std::io::Result<Vec<Pid>> {
    imp::all_pids()
}
