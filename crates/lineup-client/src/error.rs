//! Client-level errors.

use thiserror::Error;

use lineup_engine::EngineError;

/// What a roster operation can fail with at the client surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The operation needs an authenticated session.
    #[error("Not signed in")]
    NotSignedIn,

    /// The sync engine rejected or failed the operation.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
