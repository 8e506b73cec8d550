//! Remote address type used throughout memscout
//!
//! Addresses refer to the *target* process' address space, which may be
//! wider than the inspecting process' (a 32-bit inspector can scan a
//! 64-bit target), so they are always carried as `u64`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// An address in the target process' address space.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Address(u64);

impl Address {
    /// The null address.
    pub const NULL: Address = Address(0);

    /// Create a new address.
    pub fn new(value: u64) -> Self {
        Address(value)
    }

    /// Get the raw address value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Check if this is the null address.
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Offset the address by `bytes`, saturating at the top of the
    /// address space.
    pub fn saturating_add(&self, bytes: u64) -> Address {
        Address(self.0.saturating_add(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address(value)
    }
}

impl From<usize> for Address {
    fn from(value: usize) -> Self {
        Address(value as u64)
    }
}

impl Add<u64> for Address {
    type Output = Address;

    fn add(self, rhs: u64) -> Address {
        Address(self.0 + rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_basics() {
        let addr = Address::new(0x1000);
        assert_eq!(addr.as_u64(), 0x1000);
        assert!(!addr.is_null());
        assert!(Address::NULL.is_null());
    }

    #[test]
    fn test_address_display() {
        assert_eq!(Address::new(0xdead).to_string(), "0xdead");
        assert_eq!(Address::NULL.to_string(), "0x0");
    }

    #[test]
    fn test_address_arithmetic() {
        let addr = Address::new(0x1000);
        assert_eq!(addr + 0x500, Address::new(0x1500));
        assert_eq!(
            Address::new(u64::MAX).saturating_add(1),
            Address::new(u64::MAX)
        );
    }

    #[test]
    fn test_address_ordering() {
        assert!(Address::new(0x1000) < Address::new(0x2000));
        assert!(Address::new(0x2000) >= Address::new(0x2000));
    }

    #[test]
    fn test_address_serde() {
        let addr = Address::new(0x7fff_0000_1234);
        let json = serde_json::to_string(&addr).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
