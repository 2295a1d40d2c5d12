//! Error types for mdn-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mdn-core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Malformed reference token, or a sheet name that is not declared
    #[error("Invalid reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Reference bounds are inverted (start after end)
    #[error("Reference '{reference}' out of range: {reason}")]
    OutOfRange { reference: String, reason: String },

    /// The coalescer produced declarations that do not resolve back to its input.
    ///
    /// This is a defect in the coalescer, never caused by input shape.
    #[error("Coalesce invariant violated: {0}")]
    CoalesceInvariantViolation(String),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    pub(crate) fn invalid_reference(reference: &str, reason: impl Into<String>) -> Self {
        Error::InvalidReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn out_of_range(reference: &str, reason: impl Into<String>) -> Self {
        Error::OutOfRange {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }
}
