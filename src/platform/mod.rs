//! Platform-specific implementations behind one capability surface
//!
//! Each platform module exposes the same set of functions over its own
//! `OsHandle` type; selection happens at compile time. The contracts
//! they implement live in [`crate::memory`] and [`crate::process`].

#[cfg(any(test, target_os = "macos", windows))]
pub(crate) mod scan;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(windows)]
pub mod windows;

#[cfg(target_os = "linux")]
pub(crate) use linux as imp;

#[cfg(target_os = "macos")]
pub(crate) use macos as imp;

#[cfg(windows)]
pub(crate) use windows as imp;
