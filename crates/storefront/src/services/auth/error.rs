//! Authentication error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur during sign-in and sign-out.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required form field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] quickcart_core::EmailError),

    /// Persisting or clearing the session failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
