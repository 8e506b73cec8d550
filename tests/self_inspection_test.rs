//! End-to-end introspection of the test process itself
//!
//! Plants a known byte pattern in stack, heap, and static storage,
//! then finds it by walking regions and copying memory through the
//! public API only.

use memscout::{
    copy_memory, next_readable_region, walk_memory, Address, ProcessHandle, WalkSettings,
};
use pretty_assertions::assert_eq;

const NEEDLE: [u8; 8] = [0x0d, 0x0e, 0x0a, 0x0d, 0x0b, 0x0e, 0x0e, 0x0f];

static STATIC_NEEDLE: [u8; 8] = NEEDLE;

fn open_self() -> ProcessHandle {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let (response, handle) = ProcessHandle::open(std::process::id());
    assert!(
        response.fatal_error().is_none(),
        "opening own process must succeed: {:?}",
        response.fatal_error()
    );
    handle
}

/// Locate the region containing `address` by scanning forward from
/// null, then read back `len` bytes at `address` with one copy.
fn read_at(handle: &ProcessHandle, address: Address, len: usize) -> Vec<u8> {
    let mut cursor = Address::NULL;
    loop {
        let (response, region) = next_readable_region(handle, cursor);
        assert!(response.fatal_error().is_none());
        let region = region.expect("address space exhausted before the target address");
        if region.contains(address) {
            assert!(
                address.as_u64() + len as u64 <= region.end_address().as_u64(),
                "pattern must fit inside its region"
            );
            break;
        }
        assert!(
            region.start_address <= address,
            "scanner skipped past a live address"
        );
        cursor = region.end_address();
    }

    let mut buffer = vec![0u8; len];
    let (response, bytes_read) = copy_memory(handle, address, &mut buffer);
    assert!(response.fatal_error().is_none());
    assert_eq!(bytes_read, len);
    buffer
}

#[test]
fn test_finds_pattern_on_the_stack() {
    let handle = open_self();
    let on_stack: [u8; 8] = NEEDLE;

    let copied = read_at(&handle, Address::from(on_stack.as_ptr() as usize), 8);
    assert_eq!(copied, NEEDLE.to_vec());
    handle.close();
}

#[test]
fn test_finds_pattern_on_the_heap() {
    let handle = open_self();
    let on_heap: Box<[u8; 8]> = Box::new(NEEDLE);

    let copied = read_at(&handle, Address::from(on_heap.as_ptr() as usize), 8);
    assert_eq!(copied, NEEDLE.to_vec());
    handle.close();
}

#[test]
fn test_finds_pattern_in_static_storage() {
    let handle = open_self();

    let copied = read_at(&handle, Address::from(STATIC_NEEDLE.as_ptr() as usize), 8);
    assert_eq!(copied, NEEDLE.to_vec());
    handle.close();
}

#[test]
fn test_walk_reaches_a_heap_allocation() {
    let handle = open_self();
    let marker: Box<[u8]> = Box::new(*b"integration-walk-marker-55aa");
    let target = marker.as_ptr() as u64;
    let settings = WalkSettings::default();

    let mut hit = false;
    let response = walk_memory(&handle, Address::NULL, &settings, |address, chunk| {
        let start = address.as_u64();
        if target >= start && target < start + chunk.len() as u64 {
            hit = true;
            return false;
        }
        true
    });

    assert!(response.fatal_error().is_none());
    assert!(hit, "walk must visit the heap allocation");
    handle.close();
}

#[test]
fn test_region_scan_terminates_without_fatal_error() {
    let handle = open_self();

    let mut cursor = Address::NULL;
    let mut regions = 0usize;
    loop {
        let (response, region) = next_readable_region(&handle, cursor);
        assert!(response.fatal_error().is_none());
        match region {
            Some(region) => {
                assert!(region.length > 0);
                assert!(region.start_address >= cursor);
                cursor = region.end_address();
                regions += 1;
            }
            None => break,
        }
        assert!(regions < 1_000_000, "scan must terminate");
    }
    assert!(regions > 0, "a live process has readable memory");
    handle.close();
}
