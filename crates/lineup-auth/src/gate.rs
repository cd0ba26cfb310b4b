//! Session gate over the credential provider.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use lineup_core::Session;
use lineup_store::{
    Credential, CredentialError, CredentialProvider, CODE_INVALID_CREDENTIALS, CODE_NETWORK_ERROR,
    CODE_USER_NOT_FOUND,
};

use crate::error::SignInError;

/// Authentication state for the roster client.
///
/// Wraps a [`CredentialProvider`] and publishes the resulting [`Session`]
/// over a watch channel. Sign-in failures come back classified into
/// variants the caller can present; sign-out never fails observably.
pub struct SessionGate<P: CredentialProvider> {
    provider: Arc<P>,
    session_tx: watch::Sender<Session>,
}

impl<P: CredentialProvider> SessionGate<P> {
    /// Creates a gate, restoring the session when the provider already
    /// holds a credential.
    pub fn new(provider: Arc<P>) -> Self {
        let initial = match provider.current_credential() {
            Some(credential) => session_for(&credential),
            None => Session::Unauthenticated,
        };
        let (session_tx, _) = watch::channel(initial);
        Self {
            provider,
            session_tx,
        }
    }

    /// Signs in and publishes the authenticated session.
    ///
    /// Blank input is rejected before any provider call. On failure the
    /// session stays untouched.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, SignInError> {
        if email.trim().is_empty() {
            return Err(SignInError::Validation { field: "email" });
        }
        if password.trim().is_empty() {
            return Err(SignInError::Validation { field: "password" });
        }

        match self.provider.sign_in(email, password).await {
            Ok(credential) => {
                let session = session_for(&credential);
                self.session_tx.send_replace(session.clone());
                info!(user_id = %credential.user_id, "Signed in");
                Ok(session)
            }
            Err(e) => {
                let classified = classify(&e);
                warn!(error = %e, classified = ?classified, "Sign-in failed");
                Err(classified)
            }
        }
    }

    /// Signs out. The local session clears before the provider call, and
    /// a provider failure is logged, never surfaced.
    pub async fn sign_out(&self) {
        self.session_tx.send_replace(Session::Unauthenticated);
        match self.provider.sign_out().await {
            Ok(()) => info!("Signed out"),
            Err(e) => {
                warn!(error = %e, "Provider sign-out failed; local session already cleared")
            }
        }
    }

    /// The current session, read from local state only.
    pub fn current_session(&self) -> Session {
        self.session_tx.borrow().clone()
    }

    /// Re-derives the session from the provider's held credential and
    /// publishes the result when it differs.
    pub fn revalidate(&self) -> Session {
        let derived = match self.provider.current_credential() {
            Some(credential) => session_for(&credential),
            None => Session::Unauthenticated,
        };
        let changed = *self.session_tx.borrow() != derived;
        if changed {
            self.session_tx.send_replace(derived.clone());
        }
        derived
    }

    /// Watches the session.
    pub fn watch_session(&self) -> watch::Receiver<Session> {
        self.session_tx.subscribe()
    }
}

fn session_for(credential: &Credential) -> Session {
    Session::Authenticated {
        user_id: credential.user_id.clone(),
        email: credential.email.clone(),
    }
}

/// Maps a provider error onto a sign-in variant: structured codes are
/// authoritative, message wording is a fallback, and anything else passes
/// through with its message intact.
fn classify(error: &CredentialError) -> SignInError {
    if error.is_code(CODE_INVALID_CREDENTIALS) || error.is_code("invalid_grant") {
        return SignInError::WrongCredential;
    }
    if error.is_code(CODE_USER_NOT_FOUND) || error.is_code("email_not_found") {
        return SignInError::UnknownAccount;
    }
    if error.is_code(CODE_NETWORK_ERROR) {
        return SignInError::NetworkUnavailable;
    }

    let message = error.message.to_lowercase();
    // Any password complaint counts as a wrong credential, covering
    // "password mismatch" and "the password is invalid" alike.
    if message.contains("invalid login credentials") || message.contains("password") {
        return SignInError::WrongCredential;
    }
    if message.contains("user not found")
        || message.contains("no user record")
        || message.contains("no account")
    {
        return SignInError::UnknownAccount;
    }
    if message.contains("network") || message.contains("connection") || message.contains("timed out")
    {
        return SignInError::NetworkUnavailable;
    }
    SignInError::Unknown(error.message.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineup_store::StubCredentials;

    const EMAIL: &str = "coach@example.com";
    const PASSWORD: &str = "s3cret";

    fn gate_with_account() -> (Arc<StubCredentials>, SessionGate<StubCredentials>) {
        let provider = Arc::new(StubCredentials::with_account(EMAIL, PASSWORD));
        let gate = SessionGate::new(provider.clone());
        (provider, gate)
    }

    // ============================================================
    // Construction
    // ============================================================

    #[tokio::test]
    async fn starts_unauthenticated() {
        let (_, gate) = gate_with_account();
        assert_eq!(gate.current_session(), Session::Unauthenticated);
    }

    #[tokio::test]
    async fn restores_a_session_the_provider_already_holds() {
        let provider = Arc::new(StubCredentials::with_account(EMAIL, PASSWORD));
        provider.sign_in(EMAIL, PASSWORD).await.unwrap();

        let gate = SessionGate::new(provider);
        assert!(gate.current_session().is_authenticated());
        assert_eq!(gate.current_session().email(), Some(EMAIL));
    }

    // ============================================================
    // Sign-in
    // ============================================================

    #[tokio::test]
    async fn sign_in_publishes_the_session() {
        let (provider, gate) = gate_with_account();
        let mut session_rx = gate.watch_session();

        let session = gate.sign_in(EMAIL, PASSWORD).await.unwrap();
        assert_eq!(session.email(), Some(EMAIL));
        assert_eq!(session.user_id(), Some("uid-1"));

        session_rx.wait_for(|s| s.is_authenticated()).await.unwrap();
        assert_eq!(provider.sign_in_calls(), 1);
    }

    #[tokio::test]
    async fn blank_input_never_reaches_the_provider() {
        let (provider, gate) = gate_with_account();

        let err = gate.sign_in("  ", PASSWORD).await.unwrap_err();
        assert_eq!(err, SignInError::Validation { field: "email" });
        let err = gate.sign_in(EMAIL, "").await.unwrap_err();
        assert_eq!(err, SignInError::Validation { field: "password" });

        assert_eq!(provider.sign_in_calls(), 0);
        assert!(!gate.current_session().is_authenticated());
    }

    // ============================================================
    // Classification
    // ============================================================

    #[tokio::test]
    async fn wrong_password_classifies_as_wrong_credential() {
        let (_, gate) = gate_with_account();
        let err = gate.sign_in(EMAIL, "wrong").await.unwrap_err();
        assert_eq!(err, SignInError::WrongCredential);
        assert!(!gate.current_session().is_authenticated());
    }

    #[tokio::test]
    async fn unknown_email_classifies_as_unknown_account() {
        let (_, gate) = gate_with_account();
        let err = gate.sign_in("nobody@example.com", PASSWORD).await.unwrap_err();
        assert_eq!(err, SignInError::UnknownAccount);
    }

    #[tokio::test]
    async fn network_code_classifies_as_network_unavailable() {
        let (provider, gate) = gate_with_account();
        provider.queue_sign_in_failure(CredentialError::with_code(
            CODE_NETWORK_ERROR,
            "connect timed out",
        ));
        let err = gate.sign_in(EMAIL, PASSWORD).await.unwrap_err();
        assert_eq!(err, SignInError::NetworkUnavailable);
    }

    #[tokio::test]
    async fn message_wording_classifies_when_no_code_is_present() {
        let (provider, gate) = gate_with_account();

        provider.queue_sign_in_failure(CredentialError::message_only(
            "The password is invalid for this account",
        ));
        let err = gate.sign_in(EMAIL, PASSWORD).await.unwrap_err();
        assert_eq!(err, SignInError::WrongCredential);

        provider.queue_sign_in_failure(CredentialError::message_only(
            "There is no user record for that identifier",
        ));
        let err = gate.sign_in(EMAIL, PASSWORD).await.unwrap_err();
        assert_eq!(err, SignInError::UnknownAccount);

        provider.queue_sign_in_failure(CredentialError::message_only("connection reset by peer"));
        let err = gate.sign_in(EMAIL, PASSWORD).await.unwrap_err();
        assert_eq!(err, SignInError::NetworkUnavailable);
    }

    #[tokio::test]
    async fn password_mismatch_wording_classifies_as_wrong_credential() {
        let (provider, gate) = gate_with_account();
        provider.queue_sign_in_failure(CredentialError::message_only("password mismatch"));

        let err = gate.sign_in(EMAIL, PASSWORD).await.unwrap_err();
        assert_eq!(err, SignInError::WrongCredential);
        assert!(!gate.current_session().is_authenticated());
    }

    #[tokio::test]
    async fn codes_win_over_message_wording() {
        let (provider, gate) = gate_with_account();
        // Misleading text, authoritative code.
        provider.queue_sign_in_failure(CredentialError::with_code(
            CODE_USER_NOT_FOUND,
            "network trouble while checking the password",
        ));
        let err = gate.sign_in(EMAIL, PASSWORD).await.unwrap_err();
        assert_eq!(err, SignInError::UnknownAccount);
    }

    #[tokio::test]
    async fn unclassified_errors_keep_their_message() {
        let (provider, gate) = gate_with_account();
        provider.queue_sign_in_failure(CredentialError::message_only("backend melted"));
        match gate.sign_in(EMAIL, PASSWORD).await.unwrap_err() {
            SignInError::Unknown(message) => assert_eq!(message, "backend melted"),
            other => panic!("expected Unknown, got {:?}", other),
        }
    }

    // ============================================================
    // Sign-out
    // ============================================================

    #[tokio::test]
    async fn sign_out_clears_locally_even_when_the_provider_fails() {
        let (provider, gate) = gate_with_account();
        gate.sign_in(EMAIL, PASSWORD).await.unwrap();
        provider.fail_next_sign_out(CredentialError::message_only(
            "revocation endpoint is down",
        ));

        gate.sign_out().await;

        assert!(!gate.current_session().is_authenticated());
        assert_eq!(provider.sign_out_calls(), 1);
    }

    #[tokio::test]
    async fn sign_out_when_signed_out_is_harmless() {
        let (provider, gate) = gate_with_account();
        gate.sign_out().await;
        assert!(!gate.current_session().is_authenticated());
        assert_eq!(provider.sign_out_calls(), 1);
    }

    // ============================================================
    // Reads
    // ============================================================

    #[tokio::test]
    async fn current_session_reads_without_provider_traffic() {
        let (provider, gate) = gate_with_account();
        gate.sign_in(EMAIL, PASSWORD).await.unwrap();

        let first = gate.current_session();
        let second = gate.current_session();
        assert_eq!(first, second);
        assert_eq!(provider.sign_in_calls(), 1);
        assert_eq!(provider.sign_out_calls(), 0);
    }

    #[tokio::test]
    async fn revalidate_downgrades_a_revoked_session() {
        let (provider, gate) = gate_with_account();
        gate.sign_in(EMAIL, PASSWORD).await.unwrap();
        let mut session_rx = gate.watch_session();

        provider.revoke();
        let session = gate.revalidate();

        assert!(!session.is_authenticated());
        session_rx.wait_for(|s| !s.is_authenticated()).await.unwrap();
        assert!(!gate.current_session().is_authenticated());
    }

    #[tokio::test]
    async fn revalidate_confirms_an_intact_session() {
        let (_, gate) = gate_with_account();
        gate.sign_in(EMAIL, PASSWORD).await.unwrap();

        let session = gate.revalidate();
        assert!(session.is_authenticated());
        assert_eq!(session.email(), Some(EMAIL));
    }
}
