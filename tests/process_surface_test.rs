//! Process discovery, naming, and library enumeration through the
//! public API.

use memscout::{get_all_pids, Address, ProcessHandle, ProcessIntrospection};

#[test]
fn test_all_pids_includes_self() {
    let pids = get_all_pids().expect("pid enumeration must work on a live system");
    assert!(pids.contains(&std::process::id()));
    assert!(pids.len() >= 2, "at least this process and its parent run");
}

#[test]
fn test_name_points_at_the_test_binary() {
    let (_, handle) = ProcessHandle::open(std::process::id());
    let (response, name) = handle.name();
    assert!(response.fatal_error().is_none());
    // Test binaries carry the integration test's name in their path.
    assert!(
        name.contains("process_surface_test"),
        "unexpected executable path: {name}"
    );
    handle.close();
}

#[test]
fn test_loaded_libraries_include_the_executable_mapping() {
    let (_, handle) = ProcessHandle::open(std::process::id());
    let (response, libraries) = handle.list_loaded_libraries();
    assert!(response.fatal_error().is_none());
    assert!(!libraries.is_empty());

    for library in &libraries {
        assert!(!library.path.is_empty());
    }
    handle.close();
}

#[test]
fn test_library_bases_fall_inside_readable_regions() {
    let (_, handle) = ProcessHandle::open(std::process::id());
    let (response, libraries) = handle.list_loaded_libraries();
    assert!(response.fatal_error().is_none());

    // Every reported base address must be somewhere the scanner also
    // reports as mapped.
    for library in libraries.iter().take(3) {
        let Some(base) = library.base_address else {
            continue;
        };
        let (response, region) = handle.next_readable_region(base);
        assert!(response.fatal_error().is_none());
        let region = region.expect("mapped library must have a region at or after its base");
        assert!(
            region.contains(base) || region.start_address > base,
            "scanner disagrees with loader about {}",
            library.path
        );
    }
    handle.close();
}

#[test]
fn test_trait_object_is_usable() {
    let (_, handle) = ProcessHandle::open(std::process::id());
    let introspection: &dyn ProcessIntrospection = &handle;

    assert_eq!(introspection.pid(), std::process::id());
    let (response, region) = introspection.next_readable_region(Address::NULL);
    assert!(response.fatal_error().is_none());
    assert!(region.is_some());

    let mut buffer = [0u8; 4];
    let sample = 0xfeed_beefu32;
    let (response, bytes_read) =
        introspection.copy_memory(Address::from(&sample as *const u32 as usize), &mut buffer);
    assert!(response.fatal_error().is_none());
    assert_eq!(bytes_read, 4);
    assert_eq!(u32::from_ne_bytes(buffer), sample);

    handle.close();
}
