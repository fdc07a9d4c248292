//! Field-level validation failures for user payloads.

use super::{EmailError, PhoneError, UserNameError};

/// A user payload failed validation.
///
/// Wraps the parse error of whichever field was rejected first.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The `name` field was rejected.
    #[error(transparent)]
    Name(#[from] UserNameError),
    /// The `email` field was rejected.
    #[error(transparent)]
    Email(#[from] EmailError),
    /// The `phone` field was rejected.
    #[error(transparent)]
    Phone(#[from] PhoneError),
    /// The payload itself could not be decoded.
    #[error("{0}")]
    Malformed(String),
}
