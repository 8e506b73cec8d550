//! Readable-region accumulation shared by the query-driven scanners
//!
//! The merge loops depend only on the sequence of answers the kernel
//! gives for successive query addresses, so they are written against a
//! query closure: the platform modules plug in their kernel calls, and
//! tests drive the loops with synthetic layouts. Two query disciplines
//! exist: `next_region_exact` for kernels that describe the block
//! containing the query address itself, `next_region_spanning` for
//! kernels that answer with the region at or after it.

use crate::core::types::{Address, MemoryRegion, Response, SysError};

/// How a queried block of address space is mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockState {
    Readable,
    Unreadable,
    /// Reserved address space with no mapping behind it.
    Unmapped,
}

/// One answer from a platform's address-space query.
#[derive(Debug)]
pub(crate) enum QueryAnswer {
    /// Mapping information for a block of address space.
    Block { base: u64, size: u64, state: BlockState },
    /// No mapping at or after the queried address.
    End,
    /// The query itself failed.
    Fail(SysError),
}

/// Accumulate the next maximal readable region when each query
/// describes the block containing the query address itself.
///
/// Unmapped blocks are skipped silently, unreadable mapped blocks are
/// recorded as soft errors; either kind terminates a region already
/// being accumulated.
pub(crate) fn next_region_exact<F>(
    address: Address,
    mut query: F,
) -> (Response, Option<MemoryRegion>)
where
    F: FnMut(u64) -> QueryAnswer,
{
    let mut response = Response::new();
    let mut region: Option<MemoryRegion> = None;
    let mut cursor = address.as_u64();

    loop {
        let (base, size, state) = match query(cursor) {
            QueryAnswer::Block { base, size, state } => (base, size, state),
            QueryAnswer::End => break,
            QueryAnswer::Fail(err) => {
                response.set_fatal(err);
                break;
            }
        };

        if state != BlockState::Readable {
            if region.is_some() {
                break;
            }
            if state == BlockState::Unreadable {
                response.add_soft(SysError::with_message(format!(
                    "unreadable memory {:#x}-{:#x}",
                    base,
                    base + size
                )));
            }
            cursor = base + size;
            continue;
        }

        match region.as_mut() {
            None => region = Some(MemoryRegion::new(Address::new(base), size)),
            Some(current) if current.end_address().as_u64() == base => current.extend(size),
            // Not contiguous with the accumulated region.
            Some(_) => break,
        }
        cursor = base + size;
    }

    (response, region)
}

/// Accumulate the next maximal readable region when queries answer
/// with the region at or after the query address.
///
/// Two kernel behaviors are handled here. Answers may overlap the
/// accumulated region, in which case the overlapped bytes are counted
/// once. And the first answer can describe a region that ends at or
/// before the requested address; that answer is recorded as a soft
/// error and the query re-anchored one byte past the request, so the
/// scan always makes progress instead of looping on the same region.
pub(crate) fn next_region_spanning<F>(
    address: Address,
    mut query: F,
) -> (Response, Option<MemoryRegion>)
where
    F: FnMut(u64) -> QueryAnswer,
{
    let mut response = Response::new();
    let mut region: Option<MemoryRegion> = None;
    let mut cursor = address.as_u64();

    loop {
        let (base, size, state) = match query(cursor) {
            QueryAnswer::Block { base, size, state } => (base, size, state),
            QueryAnswer::End => break,
            QueryAnswer::Fail(err) => {
                response.set_fatal(err);
                break;
            }
        };

        if state != BlockState::Readable {
            if region.is_some() {
                break;
            }
            response.add_soft(SysError::with_message(format!(
                "unreadable memory {:#x}-{:#x}",
                base,
                base + size
            )));
            cursor = base + size;
            continue;
        }

        match region.as_mut() {
            None => {
                if base + size <= address.as_u64() {
                    response.add_soft(SysError::with_message(format!(
                        "wrong region obtained, expected it to contain {:#x}, got {:#x}-{:#x}",
                        address.as_u64(),
                        base,
                        base + size
                    )));
                    cursor = address.as_u64() + 1;
                    continue;
                }
                region = Some(MemoryRegion::new(Address::new(base), size));
            }
            Some(current) => {
                let limit = current.end_address().as_u64();
                if limit < base {
                    // Not contiguous with the accumulated region.
                    break;
                }
                current.extend(size - (limit - base));
            }
        }
        cursor = base + size;
    }

    (response, region)
}
