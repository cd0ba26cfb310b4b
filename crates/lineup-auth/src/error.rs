//! Sign-in error classification.

use thiserror::Error;

/// What went wrong during sign-in, reduced to variants a caller can act
/// on. Provider errors that fit no known category pass their message
/// through as [`Unknown`](SignInError::Unknown).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignInError {
    /// A required input was blank.
    #[error("Validation error: {field} must not be empty")]
    Validation { field: &'static str },

    /// The account exists but the secret does not match.
    #[error("Wrong email or password")]
    WrongCredential,

    /// No account matches the given identifier.
    #[error("No account matches that email")]
    UnknownAccount,

    /// The provider could not be reached.
    #[error("Network unavailable")]
    NetworkUnavailable,

    /// An unclassified provider error, message preserved.
    #[error("Sign-in failed: {0}")]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_blank_field() {
        let err = SignInError::Validation { field: "email" };
        assert_eq!(err.to_string(), "Validation error: email must not be empty");
    }

    #[test]
    fn unknown_keeps_the_provider_message() {
        let err = SignInError::Unknown("backend melted".to_string());
        assert_eq!(err.to_string(), "Sign-in failed: backend melted");
    }
}
