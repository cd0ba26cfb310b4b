//! Error types for sync engine operations.

use thiserror::Error;

/// Error type for all sync engine operations.
///
/// Validation and state errors are detected before any remote call is
/// made; remote failures carry the store adapter's own message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A required draft field is empty after trimming.
    #[error("Validation error: {field} must not be empty")]
    Validation {
        /// The first missing field, in validation order.
        field: &'static str,
    },

    /// The operation does not fit the engine's current state.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// The store rejected or failed the operation.
    ///
    /// The payload is the adapter's error message, unchanged.
    #[error("Store error: {0}")]
    Remote(String),
}

/// Convenience Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
