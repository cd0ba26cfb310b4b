//! Error types for remote store operations.
//!
//! Defines error variants for network, API, serialization, and configuration
//! failures, plus the structured credential error the session gate
//! classifies sign-in failures from.

use thiserror::Error;

/// Provider error code: the secret did not match the identifier.
pub const CODE_INVALID_CREDENTIALS: &str = "invalid_credentials";
/// Provider error code: no account exists for the identifier.
pub const CODE_USER_NOT_FOUND: &str = "user_not_found";
/// Provider error code: the provider could not be reached.
pub const CODE_NETWORK_ERROR: &str = "network_error";

/// Error type for all collection store operations.
///
/// Uses thiserror for Display and Error implementations, with automatic
/// conversion from reqwest, tungstenite, and serde_json errors via #[from].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or transport-level HTTP error from reqwest.
    ///
    /// Includes connection failures, timeouts, and TLS errors.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store API returned a non-success HTTP status.
    #[error("Store error: {status} - {message}")]
    Api {
        /// The HTTP status code returned by the store.
        status: u16,
        /// The response body, typically containing error details.
        message: String,
    },

    /// WebSocket transport error from the live feed.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration or initialization error.
    ///
    /// Used for invalid API URLs, missing keys, or other setup issues.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The live subscription could not be opened or was refused.
    #[error("Subscription error: {0}")]
    Subscription(String),
}

/// Convenience Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A credential operation failed at the authentication provider.
///
/// Carries the provider's machine-readable error code when the response
/// included one. Classification should match on the code first and fall
/// back to the message text only when the code is absent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct CredentialError {
    /// Machine-readable error code, when the provider sent one.
    pub code: Option<String>,
    /// Human-readable description from the provider.
    pub message: String,
}

impl CredentialError {
    /// Creates an error with a machine-readable code.
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Creates an error that carries only message text.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Returns true when the provider sent the given error code.
    pub fn is_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

impl From<reqwest::Error> for CredentialError {
    /// Transport failures classify as network errors.
    fn from(e: reqwest::Error) -> Self {
        Self::with_code(CODE_NETWORK_ERROR, e.to_string())
    }
}
