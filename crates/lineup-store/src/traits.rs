//! Store adapter contract.
//!
//! The sync engine and session gate are generic over these traits. The
//! production [`RemoteStore`](crate::RemoteStore) and the in-process
//! [`MemoryStore`](crate::MemoryStore) / [`StubCredentials`](crate::StubCredentials)
//! both implement them, so the same engine code runs against either.
//!
//! Methods return named `impl Future + Send` rather than using `async fn`
//! sugar so the futures stay spawnable; implementations still write plain
//! `async fn`.

use std::future::Future;

use lineup_core::ChangeBatch;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{CredentialError, StoreError};

/// A signed-in user's credential as issued by the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    /// Provider-assigned stable user identifier.
    pub user_id: String,
    /// Email address the credential was issued for.
    pub email: String,
    /// Bearer token for subsequent store calls.
    pub access_token: String,
}

impl Credential {
    /// Creates a credential from its parts.
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            access_token: access_token.into(),
        }
    }
}

/// One live document collection with push updates and remote writes.
///
/// Implementations own transport concerns: heartbeats, reconnection, and
/// retry all happen below this seam. Callers own lifecycle: at most one
/// subscription at a time, released with [`unsubscribe`](CollectionStore::unsubscribe).
pub trait CollectionStore: Send + Sync + 'static {
    /// Opaque token for one open live channel.
    type Handle: Send + 'static;

    /// Opens the live channel.
    ///
    /// The store sends the collection's current full document set into
    /// `updates` immediately and again after every remote change. When the
    /// channel closes from the store's side, the subscription is gone and
    /// will not come back on its own.
    fn subscribe(
        &self,
        updates: mpsc::Sender<ChangeBatch>,
    ) -> impl Future<Output = Result<Self::Handle, StoreError>> + Send;

    /// Releases a live channel.
    ///
    /// Infallible from the caller's point of view; transport failures
    /// during teardown are the implementation's to log.
    fn unsubscribe(&self, handle: Self::Handle) -> impl Future<Output = ()> + Send;

    /// Creates a document from its stored fields and returns the assigned id.
    fn create(&self, fields: Value) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Deletes a document by id.
    ///
    /// Deleting an id that no longer exists is not an error; the next push
    /// already reflects the absence either way.
    fn delete(&self, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Credential issue and invalidation at the authentication provider.
pub trait CredentialProvider: Send + Sync + 'static {
    /// Exchanges an identifier/secret pair for a credential.
    fn sign_in(
        &self,
        identifier: &str,
        secret: &str,
    ) -> impl Future<Output = Result<Credential, CredentialError>> + Send;

    /// Invalidates the currently held credential at the provider.
    fn sign_out(&self) -> impl Future<Output = Result<(), CredentialError>> + Send;

    /// The credential currently held, if any. Pure read, no I/O.
    fn current_credential(&self) -> Option<Credential>;
}
