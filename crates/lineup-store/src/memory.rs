//! In-process store doubles.
//!
//! [`MemoryStore`] behaves like the real backend as seen from the engine:
//! it assigns ids, keeps the collection's current document set, and pushes
//! a fresh full snapshot to every subscriber after each committed write.
//! [`StubCredentials`] resolves sign-ins against scripted accounts. Both
//! live here rather than behind `cfg(test)` so downstream crates can drive
//! their own tests with them.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use lineup_core::{ChangeBatch, Document};

use crate::error::{CredentialError, StoreError, CODE_INVALID_CREDENTIALS, CODE_USER_NOT_FOUND};
use crate::traits::{CollectionStore, Credential, CredentialProvider};

/// Subscription token handed out by [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryHandle {
    id: u64,
}

/// In-memory [`CollectionStore`] with write echo.
///
/// Every committed create or delete pushes the full document set to all
/// subscribers, the way the real backend pushes a snapshot after each
/// remote change. Call counters and one-shot failure injection make write
/// paths assertable.
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    echo_order: tokio::sync::Mutex<()>,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
}

struct MemoryInner {
    documents: Vec<Document>,
    subscribers: Vec<Subscriber>,
    next_subscriber_id: u64,
    fail_next_subscribe: Option<String>,
    fail_next_create: Option<String>,
    fail_next_delete: Option<String>,
}

struct Subscriber {
    id: u64,
    sender: mpsc::Sender<ChangeBatch>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_documents(Vec::new())
    }

    /// Creates a store seeded with documents.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                documents,
                subscribers: Vec::new(),
                next_subscriber_id: 0,
                fail_next_subscribe: None,
                fail_next_create: None,
                fail_next_delete: None,
            }),
            echo_order: tokio::sync::Mutex::new(()),
            create_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            subscribe_calls: AtomicUsize::new(0),
        }
    }

    /// Number of create calls that reached the store.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of delete calls that reached the store.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Number of subscribe calls that reached the store.
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    /// Total create and delete calls that reached the store.
    pub fn write_calls(&self) -> usize {
        self.create_calls() + self.delete_calls()
    }

    /// Makes the next subscribe call fail with the given message.
    pub fn fail_next_subscribe(&self, message: impl Into<String>) {
        self.inner.lock().expect("lock poisoned").fail_next_subscribe = Some(message.into());
    }

    /// Makes the next create call fail with the given message.
    pub fn fail_next_create(&self, message: impl Into<String>) {
        self.inner.lock().expect("lock poisoned").fail_next_create = Some(message.into());
    }

    /// Makes the next delete call fail with the given message.
    pub fn fail_next_delete(&self, message: impl Into<String>) {
        self.inner.lock().expect("lock poisoned").fail_next_delete = Some(message.into());
    }

    /// Replaces the document set as if another client edited the
    /// collection, and pushes the new snapshot to all subscribers.
    pub async fn push_documents(&self, documents: Vec<Document>) {
        self.inner.lock().expect("lock poisoned").documents = documents;
        self.broadcast().await;
    }

    /// Drops every live channel, simulating the backend cutting its
    /// connections. Subscribers see their channel close.
    pub fn disconnect_all(&self) {
        self.inner.lock().expect("lock poisoned").subscribers.clear();
    }

    /// The current document set in store order.
    pub fn documents(&self) -> Vec<Document> {
        self.inner.lock().expect("lock poisoned").documents.clone()
    }

    async fn broadcast(&self) {
        // Capture and send under the echo lock: overlapping writes must not
        // deliver an older snapshot after a newer one.
        let _echo = self.echo_order.lock().await;
        let (batch, senders) = {
            let inner = self.inner.lock().expect("lock poisoned");
            let senders: Vec<(u64, mpsc::Sender<ChangeBatch>)> = inner
                .subscribers
                .iter()
                .map(|s| (s.id, s.sender.clone()))
                .collect();
            (ChangeBatch::new(inner.documents.clone()), senders)
        };

        let mut dead = Vec::new();
        for (id, sender) in senders {
            if sender.send(batch.clone()).await.is_err() {
                dead.push(id);
            }
        }
        if !dead.is_empty() {
            let mut inner = self.inner.lock().expect("lock poisoned");
            inner.subscribers.retain(|s| !dead.contains(&s.id));
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionStore for MemoryStore {
    type Handle = MemoryHandle;

    async fn subscribe(
        &self,
        updates: mpsc::Sender<ChangeBatch>,
    ) -> Result<MemoryHandle, StoreError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        // Registration and the first snapshot share the echo lock, so a
        // write landing alongside the subscribe echoes strictly after it.
        let _echo = self.echo_order.lock().await;
        let (id, batch) = {
            let mut inner = self.inner.lock().expect("lock poisoned");
            if let Some(message) = inner.fail_next_subscribe.take() {
                return Err(StoreError::Subscription(message));
            }
            let id = inner.next_subscriber_id;
            inner.next_subscriber_id += 1;
            inner.subscribers.push(Subscriber {
                id,
                sender: updates.clone(),
            });
            (id, ChangeBatch::new(inner.documents.clone()))
        };

        // The first snapshot arrives with the subscription itself.
        if updates.send(batch).await.is_err() {
            let mut inner = self.inner.lock().expect("lock poisoned");
            inner.subscribers.retain(|s| s.id != id);
            return Err(StoreError::Subscription(
                "receiver closed before first snapshot".to_string(),
            ));
        }
        Ok(MemoryHandle { id })
    }

    async fn unsubscribe(&self, handle: MemoryHandle) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.subscribers.retain(|s| s.id != handle.id);
    }

    async fn create(&self, fields: Value) -> Result<String, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let id = Uuid::new_v4().to_string();
        {
            let mut inner = self.inner.lock().expect("lock poisoned");
            if let Some(message) = inner.fail_next_create.take() {
                return Err(StoreError::Api {
                    status: 400,
                    message,
                });
            }
            inner.documents.push(Document::new(id.clone(), fields));
        }
        self.broadcast().await;
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut inner = self.inner.lock().expect("lock poisoned");
            if let Some(message) = inner.fail_next_delete.take() {
                return Err(StoreError::Api {
                    status: 400,
                    message,
                });
            }
            // Deleting an id that is already gone is not an error.
            inner.documents.retain(|d| d.id != id);
        }
        self.broadcast().await;
        Ok(())
    }
}

/// Scriptable [`CredentialProvider`] double.
///
/// Sign-ins resolve against registered accounts; queued failures take
/// priority and are consumed one per call. [`revoke`](StubCredentials::revoke)
/// drops the held credential without a sign-out, simulating provider-side
/// invalidation.
pub struct StubCredentials {
    inner: Mutex<StubInner>,
}

struct StubInner {
    accounts: Vec<StubAccount>,
    queued_sign_in_failures: VecDeque<CredentialError>,
    sign_out_failure: Option<CredentialError>,
    current: Option<Credential>,
    sign_in_calls: usize,
    sign_out_calls: usize,
}

struct StubAccount {
    identifier: String,
    secret: String,
    user_id: String,
}

impl StubCredentials {
    /// Creates a provider with no accounts.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StubInner {
                accounts: Vec::new(),
                queued_sign_in_failures: VecDeque::new(),
                sign_out_failure: None,
                current: None,
                sign_in_calls: 0,
                sign_out_calls: 0,
            }),
        }
    }

    /// Creates a provider with one registered account.
    pub fn with_account(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        let stub = Self::new();
        stub.add_account(identifier, secret);
        stub
    }

    /// Registers an account; user ids are assigned as `uid-1`, `uid-2`, ...
    pub fn add_account(&self, identifier: impl Into<String>, secret: impl Into<String>) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let user_id = format!("uid-{}", inner.accounts.len() + 1);
        inner.accounts.push(StubAccount {
            identifier: identifier.into(),
            secret: secret.into(),
            user_id,
        });
    }

    /// Queues an error for the next sign-in call, ahead of account lookup.
    pub fn queue_sign_in_failure(&self, error: CredentialError) {
        self.inner
            .lock()
            .expect("lock poisoned")
            .queued_sign_in_failures
            .push_back(error);
    }

    /// Makes the next sign-out call fail with the given error.
    pub fn fail_next_sign_out(&self, error: CredentialError) {
        self.inner.lock().expect("lock poisoned").sign_out_failure = Some(error);
    }

    /// Drops the held credential without a sign-out call.
    pub fn revoke(&self) {
        self.inner.lock().expect("lock poisoned").current = None;
    }

    /// Number of sign-in calls made.
    pub fn sign_in_calls(&self) -> usize {
        self.inner.lock().expect("lock poisoned").sign_in_calls
    }

    /// Number of sign-out calls made.
    pub fn sign_out_calls(&self) -> usize {
        self.inner.lock().expect("lock poisoned").sign_out_calls
    }
}

impl Default for StubCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for StubCredentials {
    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Credential, CredentialError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.sign_in_calls += 1;

        if let Some(err) = inner.queued_sign_in_failures.pop_front() {
            return Err(err);
        }

        let found = inner
            .accounts
            .iter()
            .find(|a| a.identifier == identifier)
            .map(|a| (a.secret.clone(), a.user_id.clone()));
        match found {
            None => Err(CredentialError::with_code(
                CODE_USER_NOT_FOUND,
                format!("no account for {identifier}"),
            )),
            Some((stored_secret, _)) if stored_secret != secret => Err(
                CredentialError::with_code(CODE_INVALID_CREDENTIALS, "Invalid login credentials"),
            ),
            Some((_, user_id)) => {
                let credential = Credential::new(user_id, identifier, Uuid::new_v4().to_string());
                inner.current = Some(credential.clone());
                Ok(credential)
            }
        }
    }

    async fn sign_out(&self) -> Result<(), CredentialError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.sign_out_calls += 1;
        // The credential is gone locally whether or not the provider call
        // is scripted to fail.
        inner.current = None;
        match inner.sign_out_failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn current_credential(&self) -> Option<Credential> {
        self.inner.lock().expect("lock poisoned").current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn doc(id: &str, numero: u32) -> Document {
        Document::new(id, json!({ "nombre": id, "numero": numero }))
    }

    // ============================================================
    // MemoryStore
    // ============================================================

    #[tokio::test]
    async fn subscribe_delivers_the_current_set_immediately() {
        let store = MemoryStore::with_documents(vec![doc("p1", 1)]);
        let (tx, mut rx) = mpsc::channel(8);
        let _handle = store.subscribe(tx).await.unwrap();

        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.documents.len(), 1);
        assert_eq!(batch.documents[0].id, "p1");
        assert_eq!(store.subscribe_calls(), 1);
    }

    #[tokio::test]
    async fn create_assigns_an_id_and_echoes() {
        let store = MemoryStore::new();
        let (tx, mut rx) = mpsc::channel(8);
        let _handle = store.subscribe(tx).await.unwrap();
        let _initial = rx.recv().await.unwrap();

        let id = store.create(json!({ "nombre": "Ana" })).await.unwrap();
        assert!(!id.is_empty());

        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.documents.len(), 1);
        assert_eq!(batch.documents[0].id, id);
        assert_eq!(store.create_calls(), 1);
        assert_eq!(store.write_calls(), 1);
    }

    #[tokio::test]
    async fn delete_removes_and_echoes() {
        let store = MemoryStore::with_documents(vec![doc("p1", 1), doc("p2", 2)]);
        let (tx, mut rx) = mpsc::channel(8);
        let _handle = store.subscribe(tx).await.unwrap();
        let _initial = rx.recv().await.unwrap();

        store.delete("p1").await.unwrap();
        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.documents.len(), 1);
        assert_eq!(batch.documents[0].id, "p2");
    }

    #[tokio::test]
    async fn deleting_a_missing_id_is_ok() {
        let store = MemoryStore::new();
        assert!(store.delete("nope").await.is_ok());
        assert_eq!(store.delete_calls(), 1);
    }

    #[tokio::test]
    async fn injected_create_failure_is_consumed_once() {
        let store = MemoryStore::new();
        store.fail_next_create("disk on fire");

        let err = store.create(json!({})).await.unwrap_err();
        assert!(err.to_string().contains("disk on fire"));
        assert!(store.documents().is_empty());

        assert!(store.create(json!({})).await.is_ok());
        assert_eq!(store.create_calls(), 2);
    }

    #[tokio::test]
    async fn injected_subscribe_failure_registers_nothing() {
        let store = MemoryStore::new();
        store.fail_next_subscribe("no live slots");
        let (tx, _rx) = mpsc::channel(8);
        let err = store.subscribe(tx).await.unwrap_err();
        assert!(matches!(err, StoreError::Subscription(_)));

        // The next subscribe works again.
        let (tx2, mut rx2) = mpsc::channel(8);
        assert!(store.subscribe(tx2).await.is_ok());
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let store = MemoryStore::new();
        let (tx, mut rx) = mpsc::channel(8);
        let handle = store.subscribe(tx).await.unwrap();
        let _initial = rx.recv().await.unwrap();

        store.unsubscribe(handle).await;
        store.create(json!({ "nombre": "Ana" })).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn push_documents_reaches_subscribers() {
        let store = MemoryStore::new();
        let (tx, mut rx) = mpsc::channel(8);
        let _handle = store.subscribe(tx).await.unwrap();
        let _initial = rx.recv().await.unwrap();

        store.push_documents(vec![doc("p9", 9)]).await;
        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.documents[0].id, "p9");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_echo_in_commit_order() {
        let store = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::channel(64);
        let _handle = store.subscribe(tx).await.unwrap();
        let _initial = rx.recv().await.unwrap();

        let writers: Vec<_> = (0..8)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.create(json!({ "numero": n })).await.unwrap();
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        // Full-set echoes: each snapshot covers at least the writes the
        // previous one covered, and the last covers all eight.
        let mut covered = 0;
        for _ in 0..8 {
            let batch = rx.recv().await.unwrap();
            assert!(batch.documents.len() >= covered);
            covered = batch.documents.len();
        }
        assert_eq!(covered, 8);
    }

    #[tokio::test]
    async fn disconnect_all_closes_the_channel() {
        let store = MemoryStore::new();
        let (tx, mut rx) = mpsc::channel(8);
        let _handle = store.subscribe(tx).await.unwrap();
        let _initial = rx.recv().await.unwrap();

        store.disconnect_all();
        assert!(rx.recv().await.is_none());
    }

    // ============================================================
    // StubCredentials
    // ============================================================

    #[tokio::test]
    async fn sign_in_resolves_registered_accounts() {
        let stub = StubCredentials::with_account("coach@example.com", "secret");
        let credential = stub.sign_in("coach@example.com", "secret").await.unwrap();
        assert_eq!(credential.user_id, "uid-1");
        assert_eq!(credential.email, "coach@example.com");
        assert!(stub.current_credential().is_some());
    }

    #[tokio::test]
    async fn wrong_secret_yields_invalid_credentials_code() {
        let stub = StubCredentials::with_account("coach@example.com", "secret");
        let err = stub.sign_in("coach@example.com", "wrong").await.unwrap_err();
        assert!(err.is_code(CODE_INVALID_CREDENTIALS));
        assert!(stub.current_credential().is_none());
    }

    #[tokio::test]
    async fn unknown_identifier_yields_user_not_found_code() {
        let stub = StubCredentials::new();
        let err = stub.sign_in("nobody@example.com", "x").await.unwrap_err();
        assert!(err.is_code(CODE_USER_NOT_FOUND));
    }

    #[tokio::test]
    async fn queued_failures_take_priority() {
        let stub = StubCredentials::with_account("coach@example.com", "secret");
        stub.queue_sign_in_failure(CredentialError::message_only("temporarily offline"));

        let err = stub.sign_in("coach@example.com", "secret").await.unwrap_err();
        assert_eq!(err.message, "temporarily offline");

        // Consumed; the account works again.
        assert!(stub.sign_in("coach@example.com", "secret").await.is_ok());
        assert_eq!(stub.sign_in_calls(), 2);
    }

    #[tokio::test]
    async fn failed_sign_out_still_drops_the_credential() {
        let stub = StubCredentials::with_account("coach@example.com", "secret");
        stub.sign_in("coach@example.com", "secret").await.unwrap();
        stub.fail_next_sign_out(CredentialError::message_only("revocation failed"));

        assert!(stub.sign_out().await.is_err());
        assert!(stub.current_credential().is_none());
        assert_eq!(stub.sign_out_calls(), 1);
    }

    #[tokio::test]
    async fn revoke_simulates_provider_side_invalidation() {
        let stub = StubCredentials::with_account("coach@example.com", "secret");
        stub.sign_in("coach@example.com", "secret").await.unwrap();
        stub.revoke();
        assert!(stub.current_credential().is_none());
        assert_eq!(stub.sign_out_calls(), 0);
    }
}
