//! Bulk copying of target memory
//!
//! One OS-level read per call. The platform primitives may legitimately
//! return fewer bytes than requested without failing; callers that need
//! an exact-length read must check `bytes_read` themselves, this
//! component never retries short reads.

use crate::core::types::{Address, Response};
use crate::platform::imp;
use crate::process::ProcessHandle;

/// Copy `buffer.len()` bytes from the target starting at `address`.
///
/// Returns how many bytes were actually read; on a fatal error the
/// count is unspecified and the buffer contents are undefined.
pub fn copy_memory(handle: &ProcessHandle, address: Address, buffer: &mut [u8]) -> (Response, usize) {
    if let Some(response) = handle.guard() {
        return (response, 0);
    }
    imp::copy_memory(handle.os(), address, buffer)
}
