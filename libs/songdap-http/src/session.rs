use tokio::sync::watch;
use tracing::info;

/// Why the gate gave up on the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// The refresh call itself failed.
    RefreshFailed,
    /// A request was rejected again after its single replay.
    RetryExhausted,
    /// The backend answered 403.
    Forbidden,
}

/// Output port for the "session expired, please re-authenticate" signal.
pub trait SessionObserver: Send + Sync {
    fn on_session_expired(&self, reason: ExpiryReason);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Expired(ExpiryReason),
}

/// Process-wide auth state holder consumed by the presentation layer.
#[derive(Debug)]
pub struct SessionState {
    tx: watch::Sender<SessionStatus>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionStatus::Active);
        Self { tx }
    }

    pub fn status(&self) -> SessionStatus {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.tx.subscribe()
    }

    /// Called after a successful sign-in.
    pub fn mark_authenticated(&self) {
        self.tx.send_replace(SessionStatus::Active);
    }
}

impl SessionObserver for SessionState {
    fn on_session_expired(&self, reason: ExpiryReason) {
        info!(?reason, "session expired; re-authentication required");
        self.tx.send_replace(SessionStatus::Expired(reason));
    }
}
