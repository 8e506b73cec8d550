//! memscout - cross-platform process memory introspection
//!
//! Open a handle to a running process and inspect it without stopping
//! it: enumerate maximal readable memory regions, copy memory, walk
//! everything readable, and list loaded libraries. Linux, macOS, and
//! Windows are supported behind one API, selected at compile time.
//!
//! ## Error model
//!
//! Every operation returns a [`Response`] next to its payload instead
//! of a plain `Result`. A *fatal* error means the operation did not
//! complete; *soft* errors accumulate for partial, survivable failures
//! (an unreadable mapping skipped mid-scan, a library path that could
//! not be resolved) without discarding the rest of the result. A
//! response carries at most one fatal error.
//!
//! ```no_run
//! use memscout::{Address, ProcessHandle};
//!
//! let (response, handle) = ProcessHandle::open(1234);
//! if let Some(error) = response.fatal_error() {
//!     eprintln!("open failed: {error}");
//!     handle.close();
//!     return;
//! }
//!
//! let (_, region) = memscout::next_readable_region(&handle, Address::NULL);
//! if let Some(region) = region {
//!     let mut buffer = vec![0u8; region.length.min(4096) as usize];
//!     let (_, bytes_read) = memscout::copy_memory(&handle, region.start_address, &mut buffer);
//!     println!("read {bytes_read} bytes from {region}");
//! }
//!
//! handle.close();
//! ```

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
compile_error!("memscout supports only Linux, macOS, and Windows targets");

pub mod config;
pub mod core;
pub mod memory;
pub(crate) mod platform;
pub mod process;

// Re-export main types from core module
pub use core::types::{Address, LoadedLibrary, MemoryRegion, Pid, Response, SysError};

pub use config::{Config, ConfigError, WalkSettings};
pub use memory::{copy_memory, next_readable_region, walk_memory};
pub use process::{get_all_pids, list_loaded_libraries, ProcessHandle, ProcessIntrospection};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_module_accessible() {
        let _authors = core::AUTHORS;
        assert_eq!(core::VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_address_reexport() {
        let addr = Address::new(0x1000);
        assert_eq!(addr.as_u64(), 0x1000);
        assert!(Address::NULL.is_null());
    }

    #[test]
    fn test_response_reexport() {
        let mut response = Response::new();
        assert!(response.is_clean());
        response.add_soft(SysError::with_message("skipped a mapping"));
        assert!(!response.is_clean());
        assert!(!response.is_fatal());
    }

    #[test]
    fn test_open_self_through_reexports() {
        let (response, handle) = ProcessHandle::open(std::process::id());
        assert!(response.fatal_error().is_none());
        assert_eq!(handle.pid(), std::process::id());
        let close = handle.close();
        assert!(close.is_clean());
    }
}
