//! Session manager
//!
//! Single source of truth for "is this client authenticated, and as whom".
//! All session mutations go through here and are written through to the
//! settings store under one lock, so the in-memory value and the persisted
//! record cannot diverge; concurrent mutations are last-writer-wins.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;

use tracker_storage::Database;

use crate::cancel::CancelToken;
use crate::record;
use crate::session::{AuthUser, Session, SessionNotice, SessionPhase};
use crate::verify::TokenVerifier;

const EXPIRY_NOTICE: &str = "Session expired. Please sign in again.";

struct SessionState {
    phase: SessionPhase,
    session: Option<Session>,
    initialized: bool,
    /// Message of the last failure notice, kept to suppress duplicates
    /// until the next successful establish or verification.
    last_failure: Option<String>,
}

pub struct SessionManager {
    state: Arc<RwLock<SessionState>>,
    db: Database,
    notices: broadcast::Sender<SessionNotice>,
}

impl SessionManager {
    pub fn new(db: Database) -> Self {
        let (notices, _) = broadcast::channel(16);

        Self {
            state: Arc::new(RwLock::new(SessionState {
                phase: SessionPhase::Unknown,
                session: None,
                initialized: false,
                last_failure: None,
            })),
            db,
            notices,
        }
    }

    /// Load the persisted record, if any, as an untrusted candidate session.
    ///
    /// A missing, malformed, or partial record is an expected cold start:
    /// the state becomes unauthenticated and no error is raised. Calling
    /// this again after the first time changes nothing.
    pub fn initialize(&self) -> Option<Session> {
        let mut state = self.state.write();
        if state.initialized {
            return state.session.clone();
        }
        state.initialized = true;

        match record::load(&self.db) {
            Some(candidate) => {
                tracing::info!(user = %candidate.user.email, "Restored candidate session");
                state.session = Some(candidate.clone());
                // Not trusted until verification resolves.
                state.phase = SessionPhase::Unknown;
                Some(candidate)
            }
            None => {
                state.phase = SessionPhase::Unauthenticated;
                None
            }
        }
    }

    /// Token to verify on startup: the in-memory session's token, else
    /// whatever storage still holds (including the legacy key).
    pub fn candidate_token(&self) -> Option<String> {
        if let Some(session) = self.state.read().session.as_ref() {
            return Some(session.token.clone());
        }
        record::stored_token(&self.db)
    }

    /// Ask the remote authority whether the candidate token is still valid
    /// and reconcile local state with the answer.
    ///
    /// Fail-closed: an explicit `valid: false` and any transport failure
    /// both clear the session and surface one notice. A valid response
    /// without a user profile leaves the current snapshot alone. With no
    /// candidate token the session is cleared without a network call.
    /// Cancelling via `cancel` discards the in-flight result without
    /// mutating state or emitting a notice.
    pub async fn verify(
        &self,
        verifier: &dyn TokenVerifier,
        mut cancel: CancelToken,
    ) -> SessionPhase {
        let Some(token) = self.candidate_token() else {
            self.clear();
            return SessionPhase::Unauthenticated;
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Verification abandoned by caller");
                return self.phase();
            }
            outcome = verifier.verify_token(&token) => outcome,
        };

        if cancel.is_cancelled() {
            tracing::debug!("Verification result discarded after cancellation");
            return self.phase();
        }

        match outcome {
            Ok(response) if !response.valid => {
                tracing::info!("Token rejected by server");
                self.expire(EXPIRY_NOTICE.to_string());
                SessionPhase::Unauthenticated
            }
            Ok(response) => match response.user {
                Some(user) => {
                    let token = response.token.unwrap_or(token);
                    self.establish(token, user);
                    SessionPhase::Authenticated
                }
                None => {
                    // Valid but incomplete payload: keep the prior snapshot
                    // rather than overwrite it with half a session.
                    let mut state = self.state.write();
                    state.phase = if state.session.is_some() {
                        SessionPhase::Authenticated
                    } else {
                        SessionPhase::Unauthenticated
                    };
                    state.last_failure = None;
                    state.phase
                }
            },
            Err(e) => {
                tracing::warn!("Verification failed: {}", e);
                self.expire(e.message);
                SessionPhase::Unauthenticated
            }
        }
    }

    /// Atomically replace the session after a successful sign-in, sign-up,
    /// or verification, writing the record through to storage. A failed
    /// write is logged and swallowed; the next startup simply will not
    /// find a record.
    pub fn establish(&self, token: String, user: AuthUser) {
        let session = Session { token, user };

        let mut state = self.state.write();
        if let Err(e) = record::store(&self.db, &session) {
            tracing::warn!("Failed to persist session: {}", e);
        }
        tracing::info!(user = %session.user.email, "Session established");
        state.session = Some(session);
        state.phase = SessionPhase::Authenticated;
        state.last_failure = None;
    }

    /// Empty the session and remove the persisted record. Safe to call
    /// when already logged out.
    pub fn clear(&self) {
        let mut state = self.state.write();
        if let Err(e) = record::remove(&self.db) {
            tracing::warn!("Failed to remove persisted session: {}", e);
        }
        if state.session.take().is_some() {
            tracing::info!("Session cleared");
        }
        state.phase = SessionPhase::Unauthenticated;
    }

    /// Clear the session and surface one user-visible notice. Repeated
    /// failures with the same message stay silent until a successful
    /// establish or verification resets the latch.
    fn expire(&self, message: String) {
        let mut state = self.state.write();
        if let Err(e) = record::remove(&self.db) {
            tracing::warn!("Failed to remove persisted session: {}", e);
        }
        state.session = None;
        state.phase = SessionPhase::Unauthenticated;

        if state.last_failure.as_deref() != Some(message.as_str()) {
            state.last_failure = Some(message.clone());
            let _ = self.notices.send(SessionNotice { message });
        }
    }

    /// True iff both token and user are present. No side effects.
    pub fn is_authenticated(&self) -> bool {
        self.state.read().session.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.read().phase
    }

    /// Snapshot of the current session, if any.
    pub fn session(&self) -> Option<Session> {
        self.state.read().session.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().session.as_ref().map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.state.read().session.as_ref().map(|s| s.user.clone())
    }

    /// Subscribe to transient user-facing notices (session expiry).
    pub fn subscribe_notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            db: self.db.clone(),
            notices: self.notices.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancel_scope;
    use crate::record::{AUTH_STATE_KEY, LEGACY_TOKEN_KEY};
    use crate::verify::{VerifyError, VerifyOutcome};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_user() -> AuthUser {
        AuthUser {
            id: "u-1".to_string(),
            name: "Ada Park".to_string(),
            email: "ada@company.com".to_string(),
            role: "admin".to_string(),
            department: "Engineering".to_string(),
        }
    }

    struct StaticVerifier(Result<VerifyOutcome, VerifyError>);

    #[async_trait]
    impl TokenVerifier for StaticVerifier {
        async fn verify_token(&self, _token: &str) -> Result<VerifyOutcome, VerifyError> {
            self.0.clone()
        }
    }

    struct CountingVerifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenVerifier for CountingVerifier {
        async fn verify_token(&self, _token: &str) -> Result<VerifyOutcome, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(VerifyOutcome {
                valid: true,
                token: None,
                user: Some(test_user()),
            })
        }
    }

    /// Never resolves; the verification stays in flight until cancelled.
    struct PendingVerifier;

    #[async_trait]
    impl TokenVerifier for PendingVerifier {
        async fn verify_token(&self, _token: &str) -> Result<VerifyOutcome, VerifyError> {
            std::future::pending().await
        }
    }

    fn valid_outcome(token: Option<&str>, user: Option<AuthUser>) -> VerifyOutcome {
        VerifyOutcome {
            valid: true,
            token: token.map(|t| t.to_string()),
            user,
        }
    }

    #[test]
    fn test_cold_start_without_record() {
        let db = Database::open_in_memory().unwrap();
        let manager = SessionManager::new(db);

        assert_eq!(manager.phase(), SessionPhase::Unknown);
        assert!(manager.initialize().is_none());
        assert_eq!(manager.phase(), SessionPhase::Unauthenticated);
        assert!(!manager.is_authenticated());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let seeded = SessionManager::new(db.clone());
        seeded.establish("abc".to_string(), test_user());

        let manager = SessionManager::new(db);
        let first = manager.initialize();
        let second = manager.initialize();

        assert_eq!(first, second);
        assert_eq!(manager.phase(), SessionPhase::Unknown);
    }

    #[test]
    fn test_establish_round_trips_through_storage() {
        let db = Database::open_in_memory().unwrap();
        let manager = SessionManager::new(db.clone());
        manager.establish("xyz".to_string(), test_user());

        assert!(manager.is_authenticated());
        assert!(db.get_setting(AUTH_STATE_KEY).unwrap().is_some());

        // Simulate a fresh process over the same storage.
        let restarted = SessionManager::new(db);
        let candidate = restarted.initialize().unwrap();
        assert_eq!(candidate.token, "xyz");
        assert_eq!(candidate.user, test_user());
    }

    #[test]
    fn test_corrupt_record_is_treated_as_absent() {
        let db = Database::open_in_memory().unwrap();
        db.set_setting(AUTH_STATE_KEY, "{not json").unwrap();

        let manager = SessionManager::new(db);
        assert!(manager.initialize().is_none());
        assert_eq!(manager.phase(), SessionPhase::Unauthenticated);
    }

    #[test]
    fn test_partial_record_is_treated_as_absent() {
        let db = Database::open_in_memory().unwrap();
        db.set_setting(AUTH_STATE_KEY, r#"{"token":"abc"}"#).unwrap();

        let manager = SessionManager::new(db);
        assert!(manager.initialize().is_none());
        assert!(!manager.is_authenticated());
        // The bare token is still offered for verification.
        assert_eq!(manager.candidate_token(), Some("abc".to_string()));
    }

    #[test]
    fn test_clear_when_already_empty_is_a_no_op() {
        let db = Database::open_in_memory().unwrap();
        let manager = SessionManager::new(db.clone());
        manager.initialize();

        manager.clear();
        manager.clear();

        assert!(!manager.is_authenticated());
        assert_eq!(db.get_setting(AUTH_STATE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_verify_without_token_skips_network() {
        let db = Database::open_in_memory().unwrap();
        let manager = SessionManager::new(db);
        manager.initialize();

        let verifier = CountingVerifier {
            calls: AtomicUsize::new(0),
        };
        let (_handle, token) = cancel_scope();
        let phase = manager.verify(&verifier, token).await;

        assert_eq!(phase, SessionPhase::Unauthenticated);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_verify_success_adopts_refreshed_session() {
        let db = Database::open_in_memory().unwrap();
        let seeded = SessionManager::new(db.clone());
        seeded.establish("abc".to_string(), test_user());

        let manager = SessionManager::new(db);
        manager.initialize();

        let mut refreshed = test_user();
        refreshed.name = "Ada Park-Lee".to_string();
        let verifier = StaticVerifier(Ok(valid_outcome(Some("abc2"), Some(refreshed.clone()))));

        let (_handle, token) = cancel_scope();
        let phase = manager.verify(&verifier, token).await;

        assert_eq!(phase, SessionPhase::Authenticated);
        let session = manager.session().unwrap();
        assert_eq!(session.token, "abc2");
        assert_eq!(session.user, refreshed);
    }

    #[tokio::test]
    async fn test_verify_success_falls_back_to_candidate_token() {
        let db = Database::open_in_memory().unwrap();
        let seeded = SessionManager::new(db.clone());
        seeded.establish("abc".to_string(), test_user());

        let manager = SessionManager::new(db);
        manager.initialize();

        let verifier = StaticVerifier(Ok(valid_outcome(None, Some(test_user()))));
        let (_handle, token) = cancel_scope();
        manager.verify(&verifier, token).await;

        assert_eq!(manager.token(), Some("abc".to_string()));
    }

    #[tokio::test]
    async fn test_verify_invalid_fails_closed_and_notifies_once() {
        let db = Database::open_in_memory().unwrap();
        let seeded = SessionManager::new(db.clone());
        seeded.establish("abc".to_string(), test_user());

        let manager = SessionManager::new(db.clone());
        manager.initialize();
        let mut notices = manager.subscribe_notices();

        let verifier = StaticVerifier(Ok(VerifyOutcome {
            valid: false,
            token: Some("abc".to_string()),
            user: None,
        }));
        let (_handle, token) = cancel_scope();
        let phase = manager.verify(&verifier, token).await;

        assert_eq!(phase, SessionPhase::Unauthenticated);
        assert!(!manager.is_authenticated());
        assert_eq!(db.get_setting(AUTH_STATE_KEY).unwrap(), None);

        let notice = notices.try_recv().unwrap();
        assert_eq!(notice.message, EXPIRY_NOTICE);
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_transport_failure_fails_closed() {
        let db = Database::open_in_memory().unwrap();
        let seeded = SessionManager::new(db.clone());
        seeded.establish("abc".to_string(), test_user());

        let manager = SessionManager::new(db);
        manager.initialize();
        let mut notices = manager.subscribe_notices();

        let error = VerifyError {
            message: "Request failed".to_string(),
            status_code: Some(503),
        };
        let verifier = StaticVerifier(Err(error));
        let (_handle, token) = cancel_scope();

        assert_eq!(
            manager.verify(&verifier, token).await,
            SessionPhase::Unauthenticated
        );
        assert!(!manager.is_authenticated());
        assert_eq!(notices.try_recv().unwrap().message, "Request failed");
    }

    #[tokio::test]
    async fn test_repeated_failures_emit_one_notice() {
        let db = Database::open_in_memory().unwrap();
        db.set_setting(LEGACY_TOKEN_KEY, "stale").unwrap();

        let manager = SessionManager::new(db);
        manager.initialize();
        let mut notices = manager.subscribe_notices();

        let error = VerifyError {
            message: "Request failed".to_string(),
            status_code: None,
        };

        // The legacy key survives expiry, so both polls see a candidate.
        for _ in 0..2 {
            let verifier = StaticVerifier(Err(error.clone()));
            let (_handle, token) = cancel_scope();
            manager.verify(&verifier, token).await;
        }

        assert!(notices.try_recv().is_ok());
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_valid_without_user_preserves_session() {
        let db = Database::open_in_memory().unwrap();
        let manager = SessionManager::new(db);
        manager.establish("abc".to_string(), test_user());

        let verifier = StaticVerifier(Ok(valid_outcome(Some("abc"), None)));
        let (_handle, token) = cancel_scope();
        let phase = manager.verify(&verifier, token).await;

        assert_eq!(phase, SessionPhase::Authenticated);
        let session = manager.session().unwrap();
        assert_eq!(session.token, "abc");
        assert_eq!(session.user, test_user());
    }

    #[tokio::test]
    async fn test_legacy_token_feeds_verification() {
        let db = Database::open_in_memory().unwrap();
        db.set_setting(LEGACY_TOKEN_KEY, "legacy-token").unwrap();

        let manager = SessionManager::new(db.clone());
        assert!(manager.initialize().is_none());

        let verifier = StaticVerifier(Ok(valid_outcome(None, Some(test_user()))));
        let (_handle, token) = cancel_scope();
        let phase = manager.verify(&verifier, token).await;

        assert_eq!(phase, SessionPhase::Authenticated);
        assert_eq!(manager.token(), Some("legacy-token".to_string()));
        // The legacy key itself is left untouched.
        assert_eq!(
            db.get_setting(LEGACY_TOKEN_KEY).unwrap(),
            Some("legacy-token".to_string())
        );
    }

    #[tokio::test]
    async fn test_cancelled_verification_mutates_nothing() {
        let db = Database::open_in_memory().unwrap();
        let manager = SessionManager::new(db);
        manager.establish("abc".to_string(), test_user());
        let mut notices = manager.subscribe_notices();

        let (handle, token) = cancel_scope();
        let task = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.verify(&PendingVerifier, token).await })
        };

        handle.cancel();
        let phase = task.await.unwrap();

        assert_eq!(phase, SessionPhase::Authenticated);
        assert!(manager.is_authenticated());
        assert_eq!(manager.token(), Some("abc".to_string()));
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_scope_abandons_verification() {
        let db = Database::open_in_memory().unwrap();
        let manager = SessionManager::new(db);
        manager.establish("abc".to_string(), test_user());

        let (handle, token) = cancel_scope();
        drop(handle);

        let phase = manager.verify(&PendingVerifier, token).await;
        assert_eq!(phase, SessionPhase::Authenticated);
        assert!(manager.is_authenticated());
    }

    #[test]
    fn test_token_and_user_are_always_paired() {
        let db = Database::open_in_memory().unwrap();
        let manager = SessionManager::new(db);

        assert_eq!(manager.token().is_some(), manager.user().is_some());

        manager.establish("abc".to_string(), test_user());
        assert_eq!(manager.token().is_some(), manager.user().is_some());

        manager.clear();
        assert_eq!(manager.token().is_some(), manager.user().is_some());
    }
}
