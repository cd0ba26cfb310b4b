//! Engine lifecycle notices.

/// Sync lifecycle phase.
///
/// `Idle` before the first start and after shutdown; `Subscribing` once
/// the live channel has been requested; `Synced` from the first applied
/// change batch onward. A lost subscription does not change the phase:
/// the engine keeps serving its last known roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Subscribing,
    Synced,
}

impl SyncPhase {
    /// Returns true once the engine has applied at least one batch.
    pub fn is_synced(&self) -> bool {
        *self == Self::Synced
    }
}

/// Events emitted by the sync engine.
///
/// These are notices, not state: every one of them is also observable
/// through the roster, busy, and phase watches. Slow consumers may miss
/// events (broadcast semantics) but can always read current state.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The first change batch after start was applied.
    Synced,
    /// The live subscription is gone and will not recover by itself.
    ///
    /// The roster keeps its last known value; call `shutdown` and `start`
    /// to rebuild the subscription.
    SubscriptionLost {
        /// Why the subscription ended, as reported by the transport.
        reason: String,
    },
    /// The engine stopped and released its subscription.
    ShutDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_phase_is_idle() {
        assert_eq!(SyncPhase::default(), SyncPhase::Idle);
        assert!(!SyncPhase::Idle.is_synced());
        assert!(SyncPhase::Synced.is_synced());
    }
}
