//! # lineup-client
//!
//! The composed roster client: session handling and live roster sync
//! behind one facade, wired over a single shared backend.
//!
//! The backend type implements both [`CollectionStore`] and
//! [`CredentialProvider`]; in production that is
//! [`RemoteStore`](lineup_store::RemoteStore), in tests an in-process
//! double. The facade adds one rule of its own: roster operations are
//! rejected locally with [`ClientError::NotSignedIn`] until a sign-in
//! succeeds.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lineup_client::RosterClient;
//! use lineup_core::Player;
//! use lineup_store::RemoteStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Targets the built-in endpoints; pass a custom `StoreConfig`
//!     // through `RemoteStore::new` to point elsewhere.
//!     let client = RosterClient::new(Arc::new(RemoteStore::with_defaults()?));
//!
//!     client.sign_in("coach@example.com", "s3cret").await?;
//!     client.start_sync().await?;
//!
//!     let draft = Player::draft("A. Diaz", "7", "Argentina", "Forward", "");
//!     client.create_player(&draft).await?;
//!
//!     client.sign_out().await;
//!     Ok(())
//! }
//! ```
//!
//! [`CollectionStore`]: lineup_store::CollectionStore
//! [`CredentialProvider`]: lineup_store::CredentialProvider

mod client;
mod error;

pub use client::RosterClient;
pub use error::ClientError;

pub use lineup_auth::{SessionGate, SignInError};
pub use lineup_core::{Player, Roster, Session};
pub use lineup_engine::{EngineError, EngineEvent, SyncEngine, SyncPhase};
pub use lineup_store::{RemoteStore, StoreConfig};
