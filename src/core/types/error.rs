//! System error type carried by every [`Response`](crate::Response)
//!
//! A `SysError` pairs the raw OS error code with a human-readable
//! description. Code `0` means "no error"; conditions that have no OS
//! code (short reads, malformed kernel metadata, ...) use [`SysError::NO_CODE`].

use thiserror::Error;

/// An error as reported by the operating system, or a synthesized one
/// for conditions the OS does not assign a code to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("os error {code}: {description}")]
pub struct SysError {
    /// Raw OS error code, 0 for none, [`SysError::NO_CODE`] for
    /// conditions without one.
    pub code: i32,
    /// Human-readable, owned description.
    pub description: String,
}

impl SysError {
    /// Code used for errors that do not originate from an OS call.
    pub const NO_CODE: i32 = -1;

    /// Create an error from a code and description.
    pub fn new(code: i32, description: impl Into<String>) -> Self {
        SysError {
            code,
            description: description.into(),
        }
    }

    /// Create an error with no OS code, only a description.
    pub fn with_message(description: impl Into<String>) -> Self {
        Self::new(Self::NO_CODE, description)
    }

    /// Create an error from a raw OS error code, fetching the OS's own
    /// description for it.
    pub fn from_os_code(code: i32) -> Self {
        SysError {
            code,
            description: std::io::Error::from_raw_os_error(code).to_string(),
        }
    }

    /// Create an error from the calling thread's last OS error.
    pub fn last_os_error() -> Self {
        std::io::Error::last_os_error().into()
    }
}

impl From<std::io::Error> for SysError {
    fn from(err: std::io::Error) -> Self {
        SysError {
            code: err.raw_os_error().unwrap_or(Self::NO_CODE),
            description: err.to_string(),
        }
    }
}
