//! Core module containing the fundamental types of memscout
//!
//! Everything else in the crate builds on these: the remote [`Address`]
//! type, the [`Response`] envelope with its fatal/soft error split, and
//! the [`MemoryRegion`]/[`LoadedLibrary`] data carriers.

pub mod types;

pub use types::{Address, LoadedLibrary, MemoryRegion, Pid, Response, SysError};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
