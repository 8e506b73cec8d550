//! Loaded-library descriptor

use crate::core::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A library (module) mapped into the target process.
///
/// The sequence produced by the enumerator follows the target's loader
/// metadata order, never a sorted order. `base_address` and `size` are
/// populated only on platforms that expose them (Windows exposes both,
/// Linux exposes the base, Mach-based systems expose neither).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedLibrary {
    /// Absolute path of the library on disk.
    pub path: String,
    /// Base address the library is mapped at, where known.
    pub base_address: Option<Address>,
    /// Size of the mapped image in bytes, where known.
    pub size: Option<u64>,
}

impl LoadedLibrary {
    /// Create a library entry with only a path.
    pub fn new(path: impl Into<String>) -> Self {
        LoadedLibrary {
            path: path.into(),
            base_address: None,
            size: None,
        }
    }

    /// Create a library entry with full location metadata.
    pub fn with_location(path: impl Into<String>, base_address: Address, size: u64) -> Self {
        LoadedLibrary {
            path: path.into(),
            base_address: Some(base_address),
            size: Some(size),
        }
    }
}

impl fmt::Display for LoadedLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.base_address, self.size) {
            (Some(base), Some(size)) => {
                write!(f, "{} @ {} ({} bytes)", self.path, base, size)
            }
            (Some(base), None) => write!(f, "{} @ {}", self.path, base),
            _ => write!(f, "{}", self.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_only_entry() {
        let lib = LoadedLibrary::new("/usr/lib/libc.dylib");
        assert_eq!(lib.path, "/usr/lib/libc.dylib");
        assert!(lib.base_address.is_none());
        assert!(lib.size.is_none());
        assert_eq!(lib.to_string(), "/usr/lib/libc.dylib");
    }

    #[test]
    fn test_full_entry_display() {
        let lib =
            LoadedLibrary::with_location("C:\\Windows\\System32\\ntdll.dll", Address::new(0x7ff0_0000), 0x1000);
        assert!(lib.to_string().contains("@ 0x7ff00000"));
        assert!(lib.to_string().contains("4096 bytes"));
    }

    #[test]
    fn test_library_serde_roundtrip() {
        let lib = LoadedLibrary::with_location("/lib/ld.so", Address::new(0x1000), 42);
        let json = serde_json::to_string(&lib).unwrap();
        let back: LoadedLibrary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lib);
    }
}
