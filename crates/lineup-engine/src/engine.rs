//! Live collection sync engine.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch, Mutex};
use tracing::{debug, error, info, warn};

use lineup_core::{ChangeBatch, Player, Roster};
use lineup_store::CollectionStore;

use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, SyncPhase};

/// Queued change batches the actor has not applied yet.
const BATCH_QUEUE_CAPACITY: usize = 64;
/// Queued engine commands (mutation bookkeeping, shutdown).
const COMMAND_QUEUE_CAPACITY: usize = 64;

/// The subscribe → project → mutate lifecycle for one roster collection.
///
/// One spawned actor task owns every state transition: change batches and
/// mutation bookkeeping flow into it over channels, so the roster, busy
/// flag, and phase can only move on that single serialization point.
/// Observers hold `watch` receivers and see atomic replacements, never
/// partial updates.
pub struct SyncEngine<S: CollectionStore> {
    store: Arc<S>,
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle<S::Handle>>,
}

struct Shared {
    roster_tx: watch::Sender<Roster>,
    busy_tx: watch::Sender<bool>,
    phase_tx: watch::Sender<SyncPhase>,
    event_tx: broadcast::Sender<EngineEvent>,
}

enum Lifecycle<H> {
    Idle,
    Running {
        commands: mpsc::Sender<EngineCommand>,
        subscription: H,
        actor: tokio::task::JoinHandle<()>,
    },
}

enum EngineCommand {
    MutationStarted,
    MutationFinished,
    Shutdown(oneshot::Sender<()>),
}

impl<S: CollectionStore> SyncEngine<S> {
    /// Creates an idle engine over the given store.
    pub fn new(store: Arc<S>) -> Self {
        let (roster_tx, _) = watch::channel(Roster::default());
        let (busy_tx, _) = watch::channel(false);
        let (phase_tx, _) = watch::channel(SyncPhase::Idle);
        let (event_tx, _) = broadcast::channel(100);

        Self {
            store,
            shared: Arc::new(Shared {
                roster_tx,
                busy_tx,
                phase_tx,
                event_tx,
            }),
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Opens the live subscription and spawns the actor.
    ///
    /// Idempotent while started: a second call is a no-op, never a second
    /// subscription. On subscribe failure the engine returns to idle and
    /// can be started again. A started engine whose feed is later lost
    /// stays started; call [`shutdown`](Self::shutdown) first to rebuild
    /// the subscription.
    pub async fn start(&self) -> EngineResult<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Lifecycle::Running { .. } = &*lifecycle {
            debug!("Engine already started");
            return Ok(());
        }

        self.shared.phase_tx.send_replace(SyncPhase::Subscribing);

        let (batch_tx, batch_rx) = mpsc::channel(BATCH_QUEUE_CAPACITY);
        let subscription = match self.store.subscribe(batch_tx).await {
            Ok(handle) => handle,
            Err(e) => {
                self.shared.phase_tx.send_replace(SyncPhase::Idle);
                error!(error = %e, "Subscribe failed");
                return Err(EngineError::Remote(e.to_string()));
            }
        };

        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let actor = tokio::spawn(run_actor(self.shared.clone(), batch_rx, command_rx));

        *lifecycle = Lifecycle::Running {
            commands: command_tx,
            subscription,
            actor,
        };
        info!("Sync engine started");
        Ok(())
    }

    /// Persists an unsaved draft to the collection.
    ///
    /// The roster is not touched here: the created player arrives through
    /// the next pushed batch like any other remote change. While the write
    /// is outstanding the busy flag reports true.
    pub async fn create(&self, draft: &Player) -> EngineResult<()> {
        if !draft.id.is_empty() {
            return Err(EngineError::InvalidState(
                "create requires an unpersisted draft",
            ));
        }
        validate_draft(draft)?;

        let commands = self
            .command_sender()
            .await
            .ok_or(EngineError::InvalidState("engine not started"))?;

        let _ = commands.send(EngineCommand::MutationStarted).await;
        let result = self.store.create(draft.to_fields()).await;
        let _ = commands.send(EngineCommand::MutationFinished).await;

        match result {
            Ok(id) => {
                debug!(id = %id, "Player created");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Create failed");
                Err(EngineError::Remote(e.to_string()))
            }
        }
    }

    /// Deletes a persisted player from the collection.
    ///
    /// Never removes the player locally first; the disappearance arrives
    /// through the next pushed batch. Failures are returned, not retried.
    pub async fn delete(&self, player: &Player) -> EngineResult<()> {
        if player.id.is_empty() {
            return Err(EngineError::InvalidState(
                "cannot delete an unpersisted draft",
            ));
        }

        let commands = self
            .command_sender()
            .await
            .ok_or(EngineError::InvalidState("engine not started"))?;

        let _ = commands.send(EngineCommand::MutationStarted).await;
        let result = self.store.delete(&player.id).await;
        let _ = commands.send(EngineCommand::MutationFinished).await;

        match result {
            Ok(()) => {
                debug!(id = %player.id, "Player deleted");
                Ok(())
            }
            Err(e) => {
                warn!(id = %player.id, error = %e, "Delete failed");
                Err(EngineError::Remote(e.to_string()))
            }
        }
    }

    /// Stops the actor, releases the subscription, and returns to idle.
    ///
    /// No-op when idle. The actor is joined before the subscription is
    /// released, so a batch that was already queued can never apply after
    /// this returns. The roster keeps its last value; busy resets to
    /// false.
    pub async fn shutdown(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let (commands, subscription, actor) =
            match std::mem::replace(&mut *lifecycle, Lifecycle::Idle) {
                Lifecycle::Idle => {
                    debug!("Shutdown on idle engine is a no-op");
                    return;
                }
                Lifecycle::Running {
                    commands,
                    subscription,
                    actor,
                } => (commands, subscription, actor),
            };

        // Stop the actor first so nothing can mutate state afterwards.
        let (ack_tx, ack_rx) = oneshot::channel();
        if commands.send(EngineCommand::Shutdown(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
        if let Err(e) = actor.await {
            if e.is_panic() {
                warn!("Engine actor panicked during shutdown");
            }
        }

        self.store.unsubscribe(subscription).await;

        self.shared.busy_tx.send_replace(false);
        self.shared.phase_tx.send_replace(SyncPhase::Idle);
        let _ = self.shared.event_tx.send(EngineEvent::ShutDown);
        info!("Sync engine stopped");
    }

    /// Watches the roster projection.
    pub fn roster(&self) -> watch::Receiver<Roster> {
        self.shared.roster_tx.subscribe()
    }

    /// Watches the in-flight-mutation flag.
    pub fn busy(&self) -> watch::Receiver<bool> {
        self.shared.busy_tx.subscribe()
    }

    /// Watches the sync phase.
    pub fn phase(&self) -> watch::Receiver<SyncPhase> {
        self.shared.phase_tx.subscribe()
    }

    /// Subscribes to engine notices.
    pub fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.shared.event_tx.subscribe()
    }

    /// The current roster snapshot.
    pub fn current_roster(&self) -> Roster {
        self.shared.roster_tx.borrow().clone()
    }

    /// Whether a create or delete is outstanding right now.
    pub fn is_busy(&self) -> bool {
        *self.shared.busy_tx.borrow()
    }

    /// The current sync phase.
    pub fn current_phase(&self) -> SyncPhase {
        *self.shared.phase_tx.borrow()
    }

    async fn command_sender(&self) -> Option<mpsc::Sender<EngineCommand>> {
        match &*self.lifecycle.lock().await {
            Lifecycle::Running { commands, .. } => Some(commands.clone()),
            Lifecycle::Idle => None,
        }
    }
}

/// Checks the draft's required fields, in order. The jersey number needs
/// no check: draft construction already defaulted it.
fn validate_draft(draft: &Player) -> EngineResult<()> {
    if draft.name.trim().is_empty() {
        return Err(EngineError::Validation { field: "name" });
    }
    if draft.nationality.trim().is_empty() {
        return Err(EngineError::Validation { field: "nationality" });
    }
    if draft.position.trim().is_empty() {
        return Err(EngineError::Validation { field: "position" });
    }
    Ok(())
}

async fn run_actor(
    shared: Arc<Shared>,
    mut batches: mpsc::Receiver<ChangeBatch>,
    mut commands: mpsc::Receiver<EngineCommand>,
) {
    let mut in_flight: usize = 0;
    let mut synced = false;
    let mut feed_open = true;

    loop {
        tokio::select! {
            maybe_batch = batches.recv(), if feed_open => {
                match maybe_batch {
                    Some(batch) => {
                        let roster = Roster::from_batch(&batch);
                        debug!(players = roster.len(), "Applying change batch");
                        shared.roster_tx.send_replace(roster);
                        if !synced {
                            synced = true;
                            shared.phase_tx.send_replace(SyncPhase::Synced);
                            let _ = shared.event_tx.send(EngineEvent::Synced);
                        }
                    }
                    None => {
                        feed_open = false;
                        warn!("Live subscription lost; keeping last roster");
                        let _ = shared.event_tx.send(EngineEvent::SubscriptionLost {
                            reason: "change feed closed".to_string(),
                        });
                    }
                }
            }
            maybe_cmd = commands.recv() => {
                match maybe_cmd {
                    Some(EngineCommand::MutationStarted) => {
                        in_flight += 1;
                        if in_flight == 1 {
                            shared.busy_tx.send_replace(true);
                        }
                    }
                    Some(EngineCommand::MutationFinished) => {
                        in_flight = in_flight.saturating_sub(1);
                        if in_flight == 0 {
                            shared.busy_tx.send_replace(false);
                        }
                    }
                    Some(EngineCommand::Shutdown(ack)) => {
                        debug!("Engine actor stopping");
                        let _ = ack.send(());
                        return;
                    }
                    None => {
                        // Every command sender is gone; nothing can reach
                        // the actor anymore.
                        return;
                    }
                }
            }
        }
    }
}
