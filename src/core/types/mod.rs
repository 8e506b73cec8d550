//! Fundamental types shared by every memscout component

mod address;
mod error;
mod library;
mod region;
mod response;

pub use address::Address;
pub use error::SysError;
pub use library::LoadedLibrary;
pub use region::MemoryRegion;
pub use response::Response;

/// Process identifier of a target process.
pub type Pid = u32;
