//! Loaded-library enumeration
//!
//! Produces the libraries mapped into the target in loader order.
//! Windows resolves paths, base addresses, and sizes through psapi;
//! Mach-based systems walk the target's dyld metadata in remote
//! memory; Linux derives the list from the file-backed maps entries.

use crate::core::types::{LoadedLibrary, Response};
use crate::platform::imp;
use crate::process::ProcessHandle;

/// List the libraries mapped into the target process.
///
/// The order follows the target's loader metadata; entries are never
/// sorted. On a fatal error the returned list is empty, partially
/// enumerated entries are discarded.
pub fn list_loaded_libraries(handle: &ProcessHandle) -> (Response, Vec<LoadedLibrary>) {
    if let Some(response) = handle.guard() {
        return (response, Vec::new());
    }
    imp::list_loaded_libraries(handle.os())
}
