//! Readable-region scanning
//!
//! The scanner walks the target's address space forward from a given
//! address, merging consecutive OS-level mappings into one maximal
//! readable region. Callers iterate by passing each returned region's
//! end address back in, until no region comes back.

use crate::core::types::{Address, MemoryRegion, Response};
use crate::platform::imp;
use crate::process::ProcessHandle;

/// Return the readable region containing `address`, or the next
/// readable region after it.
///
/// The region is maximal: it absorbs every readable mapping contiguous
/// with it, and ends where unreadable memory or a gap begins. `None`
/// with no fatal error means the address space is exhausted.
/// Unreadable stretches encountered before the region starts are
/// recorded as soft errors. On a fatal error the accumulated partial
/// state is returned, but must not be trusted before checking
/// [`Response::fatal_error`].
pub fn next_readable_region(
    handle: &ProcessHandle,
    address: Address,
) -> (Response, Option<MemoryRegion>) {
    if let Some(response) = handle.guard() {
        return (response, None);
    }
    imp::next_readable_region(handle.os(), address)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_self() -> ProcessHandle {
        let (response, handle) = ProcessHandle::open(std::process::id());
        assert!(response.fatal_error().is_none());
        handle
    }

    #[test]
    fn test_first_region_exists() {
        let handle = open_self();
        let (response, region) = next_readable_region(&handle, Address::new(0));
        assert!(response.fatal_error().is_none());
        assert!(region.is_some());
        handle.close();
    }

    #[test]
    fn test_region_contains_live_address() {
        let handle = open_self();
        let local = 0xa5a5_5a5au32;
        let address = Address::from(&local as *const u32 as usize);

        let (response, region) = next_readable_region(&handle, address);
        assert!(response.fatal_error().is_none());
        let region = region.unwrap();
        assert!(
            region.contains(address),
            "{region} should contain {address}"
        );
        handle.close();
    }

    #[test]
    fn test_forward_walk_makes_progress_and_exhausts() {
        let handle = open_self();
        let mut address = Address::new(0);
        let mut regions = 0u32;

        loop {
            let (response, region) = next_readable_region(&handle, address);
            assert!(response.fatal_error().is_none());
            let Some(region) = region else { break };
            assert!(
                region.end_address() > address,
                "scan must make forward progress"
            );
            address = region.end_address();
            regions += 1;
            assert!(regions < 1_000_000, "runaway region walk");
        }

        assert!(regions > 0);
        // Exhaustion is not an error: query past the last region again.
        let (response, region) = next_readable_region(&handle, address);
        assert!(response.fatal_error().is_none());
        assert!(region.is_none());
        handle.close();
    }

    #[test]
    fn test_successive_regions_are_separated() {
        let handle = open_self();
        let (_, first) = next_readable_region(&handle, Address::new(0));
        let first = first.unwrap();
        let (response, second) = next_readable_region(&handle, first.end_address());
        assert!(response.fatal_error().is_none());
        if let Some(second) = second {
            // Maximality: the next region cannot touch this one.
            assert!(second.start_address > first.end_address());
        }
        handle.close();
    }
}
