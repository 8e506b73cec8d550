//! Result envelope for every memscout operation
//!
//! A [`Response`] distinguishes a *fatal* error, which invalidates the
//! operation's primary output, from *soft* errors, which record
//! localized problems the operation worked around. Operations return a
//! `(Response, value)` pair; callers must check [`Response::fatal_error`]
//! before trusting the value.

use crate::core::types::SysError;

/// The error-reporting half of an operation's result.
///
/// At most one fatal error may ever be set on a response; a second
/// `set_fatal` is a programming defect and panics. Soft errors
/// accumulate in emission order.
#[derive(Debug, Default, Clone)]
pub struct Response {
    fatal_error: Option<SysError>,
    soft_errors: Vec<SysError>,
}

impl Response {
    /// Create a response with no errors.
    pub fn new() -> Self {
        Response::default()
    }

    /// Create a response that already carries a fatal error.
    pub fn fatal(error: SysError) -> Self {
        Response {
            fatal_error: Some(error),
            soft_errors: Vec::new(),
        }
    }

    /// Set the fatal error.
    ///
    /// # Panics
    ///
    /// Panics if a fatal error is already set. At-most-one fatal error
    /// per response is a hard invariant, not a recoverable condition.
    pub fn set_fatal(&mut self, error: SysError) {
        assert!(
            self.fatal_error.is_none(),
            "fatal error set twice on the same response: {:?} then {:?}",
            self.fatal_error,
            error
        );
        self.fatal_error = Some(error);
    }

    /// Append a soft error.
    pub fn add_soft(&mut self, error: SysError) {
        self.soft_errors.push(error);
    }

    /// The fatal error, if the operation aborted.
    pub fn fatal_error(&self) -> Option<&SysError> {
        self.fatal_error.as_ref()
    }

    /// Soft errors in emission order.
    pub fn soft_errors(&self) -> &[SysError] {
        &self.soft_errors
    }

    /// True if a fatal error is set.
    pub fn is_fatal(&self) -> bool {
        self.fatal_error.is_some()
    }

    /// True if no error of any kind was recorded.
    pub fn is_clean(&self) -> bool {
        self.fatal_error.is_none() && self.soft_errors.is_empty()
    }

    /// Fold a sub-operation's response into this one: soft errors are
    /// appended, and a fatal error (if any) is moved over. Returns true
    /// if a fatal error was moved, in which case the caller should stop.
    pub fn absorb(&mut self, other: Response) -> bool {
        self.soft_errors.extend(other.soft_errors);
        match other.fatal_error {
            Some(fatal) => {
                self.set_fatal(fatal);
                true
            }
            None => false,
        }
    }

    /// Convert into a plain `Result`, keeping the soft errors on the
    /// success path.
    pub fn into_result(self) -> Result<Vec<SysError>, SysError> {
        match self.fatal_error {
            Some(fatal) => Err(fatal),
            None => Ok(self.soft_errors),
        }
    }
}
