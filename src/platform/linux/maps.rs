//! `/proc/<pid>/maps` parsing and readable-region accumulation
//!
//! The merge loop is written against any [`BufRead`] so tests can
//! drive it with synthetic map fixtures instead of a live process.

use crate::core::types::{Address, LoadedLibrary, MemoryRegion, Response, SysError};
use std::io::BufRead;

/// One line of a maps file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    /// Start address of the mapping.
    pub start: u64,
    /// One past the last address of the mapping.
    pub end: u64,
    /// Whether the mapping is readable.
    pub readable: bool,
    /// Pathname column; empty for anonymous mappings.
    pub pathname: String,
}

/// Parse a single maps line.
///
/// Format: `start-end perms offset dev inode [pathname]`, where the
/// pathname may itself contain spaces.
pub fn parse_maps_line(line: &str) -> Result<MapEntry, SysError> {
    let mut remainder = line.trim_end();
    let mut fields = [""; 5];
    for field in fields.iter_mut() {
        let trimmed = remainder.trim_start();
        let split_at = trimmed
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(trimmed.len());
        *field = &trimmed[..split_at];
        remainder = &trimmed[split_at..];
    }
    let pathname = remainder.trim_start().to_string();

    let (start_hex, end_hex) = fields[0]
        .split_once('-')
        .ok_or_else(|| SysError::with_message(format!("unrecognized maps line: {line}")))?;
    let start = u64::from_str_radix(start_hex, 16)
        .map_err(|_| SysError::with_message(format!("invalid memory limits: {}", fields[0])))?;
    let end = u64::from_str_radix(end_hex, 16)
        .map_err(|_| SysError::with_message(format!("invalid memory limits: {}", fields[0])))?;

    let perms = fields[1];
    if perms.len() < 4 {
        return Err(SysError::with_message(format!(
            "unrecognized maps line: {line}"
        )));
    }

    Ok(MapEntry {
        start,
        end,
        readable: perms.as_bytes()[0] == b'r',
        pathname,
    })
}

/// Accumulate the next maximal readable region at or after `address`
/// from a maps listing.
///
/// Merges consecutive readable mappings while they stay contiguous,
/// skips the unreadable kernel `[vsyscall]` page, records unreadable
/// gaps as soft errors, and stops the region at the first unreadable
/// or non-contiguous mapping once something has been accumulated.
pub fn next_readable_region_in<R: BufRead>(
    maps: R,
    address: Address,
) -> (Response, Option<MemoryRegion>) {
    let mut response = Response::new();
    let mut region: Option<MemoryRegion> = None;

    for line in maps.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                response.set_fatal(err.into());
                return (response, region);
            }
        };
        let entry = match parse_maps_line(&line) {
            Ok(entry) => entry,
            Err(err) => {
                response.set_fatal(err);
                return (response, region);
            }
        };

        if entry.end <= address.as_u64() {
            continue;
        }

        // The vsyscall page is mapped by the kernel and cannot be read
        // through /proc/<pid>/mem.
        if entry.pathname == "[vsyscall]" {
            continue;
        }

        if !entry.readable {
            // An accumulated region is terminated by unreadable memory;
            // otherwise note the gap and keep looking.
            if region.is_some() {
                return (response, region);
            }
            response.add_soft(SysError::with_message(format!(
                "unreadable memory {:#x}-{:#x}",
                entry.start, entry.end
            )));
            continue;
        }

        match region.as_mut() {
            None => {
                region = Some(MemoryRegion::new(
                    Address::new(entry.start),
                    entry.end - entry.start,
                ));
            }
            Some(current) if current.end_address().as_u64() == entry.start => {
                current.extend(entry.end - entry.start);
            }
            // A gap before the next readable mapping: the region is
            // complete.
            Some(_) => return (response, region),
        }
    }

    (response, region)
}

/// Collect the file-backed mappings of a maps listing as loaded
/// libraries, first mapping per distinct path, in mapping order.
pub fn list_libraries_in<R: BufRead>(maps: R) -> (Response, Vec<LoadedLibrary>) {
    let mut response = Response::new();
    let mut libraries: Vec<LoadedLibrary> = Vec::new();

    for line in maps.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                response.set_fatal(err.into());
                return (response, Vec::new());
            }
        };
        let entry = match parse_maps_line(&line) {
            Ok(entry) => entry,
            Err(err) => {
                response.set_fatal(err);
                return (response, Vec::new());
            }
        };

        if !entry.pathname.starts_with('/') {
            continue;
        }
        if libraries.iter().any(|lib| lib.path == entry.pathname) {
            continue;
        }

        let mut library = LoadedLibrary::new(entry.pathname);
        library.base_address = Some(Address::new(entry.start));
        libraries.push(library);
    }

    (response, libraries)
}
