//! The signed-in roster client.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use lineup_auth::{SessionGate, SignInError};
use lineup_core::{Player, Roster, Session};
use lineup_engine::{EngineEvent, SyncEngine, SyncPhase};
use lineup_store::{CollectionStore, CredentialProvider};

use crate::error::ClientError;

/// One backend, two concerns: a [`SessionGate`] for authentication and a
/// [`SyncEngine`] for the live roster, composed over a single shared
/// store.
///
/// Roster operations require an authenticated session; the check is
/// local, so an unauthenticated call never reaches the store. Signing
/// out stops the sync first, then releases the credential.
pub struct RosterClient<S>
where
    S: CollectionStore + CredentialProvider,
{
    gate: SessionGate<S>,
    engine: SyncEngine<S>,
}

impl<S> RosterClient<S>
where
    S: CollectionStore + CredentialProvider,
{
    /// Creates a client over a shared backend.
    pub fn new(backend: Arc<S>) -> Self {
        Self {
            gate: SessionGate::new(backend.clone()),
            engine: SyncEngine::new(backend),
        }
    }

    /// Signs in. See [`SessionGate::sign_in`] for classification rules.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, SignInError> {
        self.gate.sign_in(email, password).await
    }

    /// Signs out, stopping the sync first so no request runs on a
    /// released credential. Never fails observably.
    pub async fn sign_out(&self) {
        info!("Signing out; stopping sync first");
        self.engine.shutdown().await;
        self.gate.sign_out().await;
    }

    /// Opens the live roster subscription.
    pub async fn start_sync(&self) -> Result<(), ClientError> {
        self.ensure_signed_in()?;
        self.engine.start().await?;
        Ok(())
    }

    /// Stops the live roster subscription, keeping the session.
    pub async fn stop_sync(&self) {
        self.engine.shutdown().await;
    }

    /// Persists a draft to the roster collection.
    pub async fn create_player(&self, draft: &Player) -> Result<(), ClientError> {
        self.ensure_signed_in()?;
        self.engine.create(draft).await?;
        Ok(())
    }

    /// Deletes a persisted player from the roster collection.
    pub async fn delete_player(&self, player: &Player) -> Result<(), ClientError> {
        self.ensure_signed_in()?;
        self.engine.delete(player).await?;
        Ok(())
    }

    /// Watches the session.
    pub fn session(&self) -> watch::Receiver<Session> {
        self.gate.watch_session()
    }

    /// Watches the roster projection.
    pub fn roster(&self) -> watch::Receiver<Roster> {
        self.engine.roster()
    }

    /// Watches the in-flight-mutation flag.
    pub fn busy(&self) -> watch::Receiver<bool> {
        self.engine.busy()
    }

    /// Watches the sync phase.
    pub fn phase(&self) -> watch::Receiver<SyncPhase> {
        self.engine.phase()
    }

    /// Subscribes to sync engine notices.
    pub fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.engine.events()
    }

    /// The current session snapshot.
    pub fn current_session(&self) -> Session {
        self.gate.current_session()
    }

    /// The current roster snapshot.
    pub fn current_roster(&self) -> Roster {
        self.engine.current_roster()
    }

    /// Whether a create or delete is outstanding right now.
    pub fn is_busy(&self) -> bool {
        self.engine.is_busy()
    }

    /// The current sync phase.
    pub fn current_phase(&self) -> SyncPhase {
        self.engine.current_phase()
    }

    /// Re-checks the session against the provider's held credential.
    pub fn revalidate_session(&self) -> Session {
        self.gate.revalidate()
    }

    fn ensure_signed_in(&self) -> Result<(), ClientError> {
        if self.gate.current_session().is_authenticated() {
            Ok(())
        } else {
            debug!("Roster operation rejected; not signed in");
            Err(ClientError::NotSignedIn)
        }
    }
}
