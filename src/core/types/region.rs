//! Readable memory region type

use crate::core::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A maximal run of contiguous, currently-readable memory in the
/// target process.
///
/// No readable byte exists immediately past `start_address + length`;
/// the scanner absorbs adjacent readable mappings before returning.
/// This is not necessarily a single OS-level mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    /// First address of the region.
    pub start_address: Address,
    /// Length of the region in bytes.
    pub length: u64,
}

impl MemoryRegion {
    /// Create a new region.
    pub fn new(start_address: Address, length: u64) -> Self {
        MemoryRegion {
            start_address,
            length,
        }
    }

    /// One past the last address of the region.
    pub fn end_address(&self) -> Address {
        self.start_address + self.length
    }

    /// Check whether an address falls inside the region.
    pub fn contains(&self, address: Address) -> bool {
        address >= self.start_address && address < self.end_address()
    }

    /// Grow the region to absorb `bytes` more at its upper end.
    pub(crate) fn extend(&mut self, bytes: u64) {
        self.length += bytes;
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MemoryRegion[{:#x}-{:#x})",
            self.start_address.as_u64(),
            self.end_address().as_u64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_bounds() {
        let region = MemoryRegion::new(Address::new(0x1000), 0x2000);
        assert_eq!(region.end_address(), Address::new(0x3000));
        assert!(region.contains(Address::new(0x1000)));
        assert!(region.contains(Address::new(0x2fff)));
        assert!(!region.contains(Address::new(0x3000)));
        assert!(!region.contains(Address::new(0xfff)));
    }

    #[test]
    fn test_region_extend() {
        let mut region = MemoryRegion::new(Address::new(0x1000), 0x1000);
        region.extend(0x1000);
        assert_eq!(region.end_address(), Address::new(0x3000));
    }

    #[test]
    fn test_region_display() {
        let region = MemoryRegion::new(Address::new(0x1000), 0x1000);
        assert_eq!(region.to_string(), "MemoryRegion[0x1000-0x2000)");
    }

    #[test]
    fn test_region_serde_roundtrip() {
        let region = MemoryRegion::new(Address::new(0x7f00_0000), 4096);
        let json = serde_json::to_string(&region).unwrap();
        let back: MemoryRegion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, region);
    }
}
