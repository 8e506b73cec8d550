//! Buffered traversal of all readable memory
//!
//! Walks every readable region from a starting address upwards,
//! handing fixed-size chunks to a caller-supplied closure. Regions can
//! disappear between being reported and being read (the target keeps
//! running), so a failed chunk re-anchors the walk on the nearest
//! readable region instead of aborting.

use crate::config::WalkSettings;
use crate::core::types::{Address, MemoryRegion, Response, SysError};
use crate::process::{ProcessHandle, ProcessIntrospection};

/// Outcome of walking a single region.
enum RegionWalk {
    /// The whole region was visited.
    Completed,
    /// The closure asked to stop.
    Stopped,
    /// A chunk starting at this address could not be read in full.
    Failed(Address),
}

/// Walk all readable memory starting at `start_address`.
///
/// `walk_fn` receives the address of each chunk and its contents, and
/// returns whether the walk should continue. Chunks are at most
/// `settings.buffer_size` bytes and never overlap; the last chunk of a
/// region may be shorter.
///
/// A chunk that fails to read re-anchors the walk on the nearest
/// readable region at most `settings.max_retries` times per region;
/// after that the failure is recorded as a soft error and the walk
/// moves on.
pub fn walk_memory<F>(
    handle: &ProcessHandle,
    start_address: Address,
    settings: &WalkSettings,
    walk_fn: F,
) -> Response
where
    F: FnMut(Address, &[u8]) -> bool,
{
    if let Some(guard) = handle.guard() {
        return guard;
    }
    walk_target(handle, start_address, settings, walk_fn)
}

/// The walk itself, over any [`ProcessIntrospection`] target.
fn walk_target<T, F>(
    target: &T,
    start_address: Address,
    settings: &WalkSettings,
    mut walk_fn: F,
) -> Response
where
    T: ProcessIntrospection,
    F: FnMut(Address, &[u8]) -> bool,
{
    let mut response = Response::new();
    if settings.buffer_size == 0 {
        response.set_fatal(SysError::with_message("walk buffer size must be non-zero"));
        return response;
    }

    let (sub, found) = target.next_readable_region(start_address);
    if response.absorb(sub) {
        return response;
    }
    let mut region = match found {
        Some(region) => region,
        None => return response,
    };

    // The first region may begin before the requested start; trim it so
    // the closure never sees addresses below start_address.
    if region.start_address < start_address {
        if region.end_address() <= start_address {
            response.set_fatal(SysError::with_message(
                "first readable region does not contain the start address",
            ));
            return response;
        }
        let skipped = start_address.as_u64() - region.start_address.as_u64();
        region = MemoryRegion::new(start_address, region.length - skipped);
    }

    let mut buffer = vec![0u8; settings.buffer_size];
    let mut retries = settings.max_retries;

    loop {
        let (outcome, sub) = walk_region(target, region, &mut buffer, &mut walk_fn);
        if response.absorb(sub) {
            return response;
        }

        let next_from = match outcome {
            RegionWalk::Stopped => return response,
            RegionWalk::Failed(failed_at) if retries > 0 => {
                // Re-anchor on whatever is readable at or past the
                // failing address, skipping bytes already visited.
                retries -= 1;
                let (sub, found) = target.next_readable_region(failed_at);
                if response.absorb(sub) {
                    return response;
                }
                region = match found {
                    Some(region) => region,
                    None => return response,
                };
                if region.start_address < failed_at {
                    let skipped = failed_at.as_u64() - region.start_address.as_u64();
                    region = MemoryRegion::new(failed_at, region.length - skipped);
                }
                continue;
            }
            RegionWalk::Failed(failed_at) => {
                response.add_soft(SysError::with_message(format!(
                    "retries exceeded reading {} bytes starting at {}",
                    buffer.len(),
                    failed_at
                )));
                region.end_address()
            }
            RegionWalk::Completed => region.end_address(),
        };

        let (sub, found) = target.next_readable_region(next_from);
        if response.absorb(sub) {
            return response;
        }
        region = match found {
            Some(region) => region,
            None => return response,
        };
        retries = settings.max_retries;
    }
}

/// Visit one region chunk by chunk. A short or failed read aborts the
/// region and reports the address of the chunk that could not be
/// filled.
fn walk_region<T, F>(
    target: &T,
    region: MemoryRegion,
    buffer: &mut [u8],
    walk_fn: &mut F,
) -> (RegionWalk, Response)
where
    T: ProcessIntrospection,
    F: FnMut(Address, &[u8]) -> bool,
{
    let mut response = Response::new();
    let mut address = region.start_address;
    let mut remaining = region.length;

    while remaining > 0 {
        let chunk_len = remaining.min(buffer.len() as u64) as usize;
        let chunk = &mut buffer[..chunk_len];

        let (sub, bytes_read) = target.copy_memory(address, chunk);
        // A fatal read here only fails this chunk; the walk decides
        // whether to retry, so keep the soft errors and drop the rest.
        let failed = sub.is_fatal() || bytes_read < chunk_len;
        for soft in sub.soft_errors() {
            response.add_soft(soft.clone());
        }
        if failed {
            return (RegionWalk::Failed(address), response);
        }

        if !walk_fn(address, chunk) {
            return (RegionWalk::Stopped, response);
        }

        address = address + chunk_len as u64;
        remaining -= chunk_len as u64;
    }

    (RegionWalk::Completed, response)
}
