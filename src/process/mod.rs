//! Process handles, discovery, and loaded-library enumeration

mod enumerator;
mod handle;
mod modules;

pub use enumerator::get_all_pids;
pub use handle::ProcessHandle;
pub use modules::list_loaded_libraries;

use crate::core::types::{Address, LoadedLibrary, MemoryRegion, Pid, Response};

/// The capability set every platform implementation provides for an
/// open target process. Implemented by [`ProcessHandle`] with the
/// platform selected at compile time; there is no runtime dispatch
/// across platforms.
pub trait ProcessIntrospection {
    /// The target's pid.
    fn pid(&self) -> Pid;

    /// The next maximal readable region at or after `address`, or
    /// `None` once the address space is exhausted (not an error).
    fn next_readable_region(&self, address: Address) -> (Response, Option<MemoryRegion>);

    /// Copy target memory into `buffer` with a single bulk read,
    /// returning how many bytes were actually read. Short reads are
    /// reported honestly and never retried here.
    fn copy_memory(&self, address: Address, buffer: &mut [u8]) -> (Response, usize);

    /// The libraries mapped into the target, in loader order.
    fn list_loaded_libraries(&self) -> (Response, Vec<LoadedLibrary>);

    /// The target's executable path.
    fn name(&self) -> (Response, String);
}
