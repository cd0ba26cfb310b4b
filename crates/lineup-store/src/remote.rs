//! Production store adapter.

use std::sync::RwLock;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::info;

use lineup_core::ChangeBatch;

use crate::config::StoreConfig;
use crate::error::{CredentialError, StoreError, StoreResult};
use crate::feed::{open_feed, FeedHandle};
use crate::rest::RestClient;
use crate::traits::{CollectionStore, Credential, CredentialProvider};

/// Remote roster store: REST writes plus a WebSocket live feed.
///
/// Both surfaces share one credential slot, so once a user signs in every
/// store call reuses their bearer token. The slot is plain in-memory state;
/// nothing is persisted across restarts.
pub struct RemoteStore {
    rest: RestClient,
    config: StoreConfig,
    credential: RwLock<Option<Credential>>,
}

impl RemoteStore {
    /// Creates a store for the given backend.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let rest = RestClient::new(config.clone())?;
        Ok(Self {
            rest,
            config,
            credential: RwLock::new(None),
        })
    }

    /// Creates a store with the default configuration.
    pub fn with_defaults() -> StoreResult<Self> {
        Self::new(StoreConfig::default())
    }

    fn access_token(&self) -> Option<String> {
        self.credential
            .read()
            .expect("lock poisoned")
            .as_ref()
            .map(|c| c.access_token.clone())
    }
}

impl CollectionStore for RemoteStore {
    type Handle = FeedHandle;

    async fn subscribe(&self, updates: mpsc::Sender<ChangeBatch>) -> Result<FeedHandle, StoreError> {
        let token = self.access_token();
        open_feed(&self.config, token, updates).await
    }

    async fn unsubscribe(&self, handle: FeedHandle) {
        handle.close().await;
    }

    async fn create(&self, fields: Value) -> Result<String, StoreError> {
        let token = self.access_token();
        self.rest.create_document(&fields, token.as_deref()).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let token = self.access_token();
        self.rest.delete_document(id, token.as_deref()).await
    }
}

impl CredentialProvider for RemoteStore {
    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Credential, CredentialError> {
        let credential = self.rest.password_sign_in(identifier, secret).await?;
        *self.credential.write().expect("lock poisoned") = Some(credential.clone());
        info!(user_id = %credential.user_id, "Signed in");
        Ok(credential)
    }

    async fn sign_out(&self) -> Result<(), CredentialError> {
        // Clear the slot first; a failed revocation must not leave the
        // token in use locally.
        let taken = self.credential.write().expect("lock poisoned").take();
        match taken {
            Some(credential) => {
                self.rest.sign_out(&credential.access_token).await?;
                info!("Signed out");
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn current_credential(&self) -> Option<Credential> {
        self.credential.read().expect("lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RemoteStore {
        RemoteStore::new(StoreConfig::new("https://roster.example.co", "key"))
            .expect("valid config")
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = StoreConfig::new("not a url", "key");
        assert!(RemoteStore::new(config).is_err());
    }

    #[test]
    fn with_defaults_starts_clean() {
        let store = RemoteStore::with_defaults().expect("builtin config is valid");
        assert!(store.current_credential().is_none());
    }

    #[test]
    fn starts_with_no_credential() {
        assert!(store().current_credential().is_none());
    }

    #[tokio::test]
    async fn sign_out_without_credential_is_a_no_op() {
        let store = store();
        assert!(store.sign_out().await.is_ok());
        assert!(store.current_credential().is_none());
    }
}
