//! Remote document store adapters for the lineup roster.
//!
//! This crate provides:
//! - The [`CollectionStore`] / [`CredentialProvider`] contract the sync
//!   engine and session gate are generic over
//! - The production [`RemoteStore`]: REST writes plus a WebSocket live
//!   feed with heartbeats and reconnection backoff
//! - In-process doubles ([`MemoryStore`], [`StubCredentials`]) for tests

mod config;
mod error;
mod feed;
mod frames;
mod memory;
mod remote;
mod rest;
mod traits;

pub use config::{StoreConfig, DEFAULT_ANON_KEY, DEFAULT_API_URL, DEFAULT_COLLECTION};
pub use error::{
    CredentialError, StoreError, StoreResult, CODE_INVALID_CREDENTIALS, CODE_NETWORK_ERROR,
    CODE_USER_NOT_FOUND,
};
pub use feed::FeedHandle;
pub use frames::{FeedFrame, FeedFrameType};
pub use memory::{MemoryHandle, MemoryStore, StubCredentials};
pub use remote::RemoteStore;
pub use rest::RestClient;
pub use traits::{CollectionStore, Credential, CredentialProvider};
