//! Single-flight coordination of token refreshes.
//!
//! The first caller to hit an expired token becomes the leader and performs the
//! refresh; everyone arriving while it is in flight parks on a oneshot receiver.
//! The leader's [`RefreshLease`] releases all waiters at once with the outcome,
//! and clears the in-flight flag even if the leader future is dropped. In that
//! case waiters see [`RefreshOutcome::Abandoned`] and compete for leadership
//! again.

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Result of one refresh cycle as seen by every participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Renewed,
    Failed,
    /// The leader went away before the refresh finished; nothing is known
    /// about the session.
    Abandoned,
}

#[derive(Default)]
struct CycleState {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    completed_cycles: u64,
}

/// Owned by the gate; one instance per client, not a process global.
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<CycleState>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &state.in_flight)
            .field("waiters", &state.waiters.len())
            .field("completed_cycles", &state.completed_cycles)
            .finish()
    }
}

/// What a caller got from [`RefreshCoordinator::acquire_or_wait`].
#[derive(Debug)]
pub enum Acquire<'a> {
    /// No refresh was running; the caller must perform it and release the lease.
    Leader(RefreshLease<'a>),
    /// A refresh is already running; await its outcome.
    Waiter(RefreshWait),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire_or_wait(&self) -> Acquire<'_> {
        let mut state = self.state.lock();
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            debug!(waiters = state.waiters.len(), "joining in-flight token refresh");
            Acquire::Waiter(RefreshWait(rx))
        } else {
            state.in_flight = true;
            Acquire::Leader(RefreshLease {
                coordinator: self,
                released: false,
            })
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.lock().in_flight
    }

    pub fn waiter_count(&self) -> usize {
        self.state.lock().waiters.len()
    }

    pub fn completed_cycles(&self) -> u64 {
        self.state.lock().completed_cycles
    }

    fn finish_cycle(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut state = self.state.lock();
            state.in_flight = false;
            state.completed_cycles += 1;
            std::mem::take(&mut state.waiters)
        };

        debug!(?outcome, released = waiters.len(), "token refresh cycle finished");
        for waiter in waiters {
            // A waiter whose request future was dropped is simply gone.
            let _ = waiter.send(outcome);
        }
    }
}

/// Proof of leadership for one refresh cycle.
#[must_use = "a lease must be released with the refresh outcome"]
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    released: bool,
}

impl std::fmt::Debug for RefreshLease<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshLease")
            .field("released", &self.released)
            .finish()
    }
}

impl RefreshLease<'_> {
    pub fn release(mut self, outcome: RefreshOutcome) {
        self.released = true;
        self.coordinator.finish_cycle(outcome);
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.released {
            warn!("token refresh abandoned before completion; handing over to waiters");
            self.coordinator.finish_cycle(RefreshOutcome::Abandoned);
        }
    }
}

/// Pending participation in someone else's refresh.
#[derive(Debug)]
pub struct RefreshWait(oneshot::Receiver<RefreshOutcome>);

impl RefreshWait {
    pub async fn outcome(self) -> RefreshOutcome {
        self.0.await.unwrap_or(RefreshOutcome::Abandoned)
    }
}
