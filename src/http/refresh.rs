//! Single-flight gate over the token refresh call.
//!
//! The first caller to [`RefreshCoordinator::enter`] while the gate is down
//! becomes the leader and owns a [`RefreshLease`]; every later caller gets a
//! [`RefreshWaiter`] queued behind it. Settling the lease lowers the gate and
//! releases the queue in insertion order with the same outcome. Dropping the
//! lease without settling releases everyone with
//! [`ClientError::RefreshAbandoned`], so the gate can never stay raised.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::error::ClientError;

/// Result of one refresh cycle: the new access token or the shared cause.
pub type RefreshOutcome = std::result::Result<String, Arc<ClientError>>;

#[derive(Debug, Default)]
struct GateState {
    in_flight: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
    cycles: u64,
}

/// Instance-scoped refresh gate. Clones share the same gate.
#[derive(Debug, Clone, Default)]
pub struct RefreshCoordinator {
    state: Arc<Mutex<GateState>>,
}

/// Role assigned to a caller entering the gate.
#[derive(Debug)]
pub enum RefreshTicket {
    /// No refresh was running: this caller must perform it.
    Leader(RefreshLease),
    /// A refresh is running: wait for its outcome.
    Waiter(RefreshWaiter),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> RefreshTicket {
        let mut state = lock(&self.state);
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            tracing::debug!(queued = state.waiters.len(), "Refresh in flight; queueing caller");
            return RefreshTicket::Waiter(RefreshWaiter { rx });
        }
        state.in_flight = true;
        state.cycles += 1;
        RefreshTicket::Leader(RefreshLease {
            state: Arc::clone(&self.state),
            settled: false,
        })
    }

    pub fn is_refreshing(&self) -> bool {
        lock(&self.state).in_flight
    }

    /// Callers currently queued behind the in-flight refresh.
    pub fn pending(&self) -> usize {
        lock(&self.state).waiters.len()
    }

    /// Number of refresh cycles started so far.
    pub fn cycles(&self) -> u64 {
        lock(&self.state).cycles
    }
}

/// Exclusive right to perform the current refresh.
#[derive(Debug)]
pub struct RefreshLease {
    state: Arc<Mutex<GateState>>,
    settled: bool,
}

impl RefreshLease {
    /// Lower the gate and release every queued caller. Returns how many were released.
    pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
        self.settled = true;
        release(&self.state, outcome)
    }
}

impl Drop for RefreshLease {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("Refresh leader dropped before settling; releasing waiters");
            release(&self.state, Err(Arc::new(ClientError::RefreshAbandoned)));
        }
    }
}

/// A caller suspended until the in-flight refresh settles.
#[derive(Debug)]
pub struct RefreshWaiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl RefreshWaiter {
    pub async fn wait(self) -> RefreshOutcome {
        self.rx
            .await
            .unwrap_or_else(|_| Err(Arc::new(ClientError::RefreshAbandoned)))
    }
}

fn release(state: &Mutex<GateState>, outcome: RefreshOutcome) -> usize {
    let waiters = {
        let mut state = lock(state);
        state.in_flight = false;
        std::mem::take(&mut state.waiters)
    };
    let released = waiters.len();
    for waiter in waiters {
        // A waiter whose caller went away has nothing left to resume.
        let _ = waiter.send(outcome.clone());
    }
    released
}

fn lock(state: &Mutex<GateState>) -> MutexGuard<'_, GateState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
