//! # In-flight ledger and orchestrator phase.
//!
//! The in-flight counter and the `Active → Draining → Drained` phase share one
//! value behind a [`tokio::sync::watch`] channel, so admission (phase check plus
//! insert) is a single atomic modification and drain waiters are woken on every
//! release.
//!
//! ```text
//! dispatch ──► admit(name) ──► running.insert(id)      (only while Active)
//!                   │
//!                   └──► InFlightGuard ──drop──► running.remove(id) ──► notify waiters
//!
//! drain ──► begin_drain() ──► wait_idle() ──► finish_drain()
//!           Active→Draining   running empty   Draining→Drained
//! ```
//!
//! Each running task is keyed by its dispatch id so names may repeat; the count
//! is the ledger size and a timed-out drain can name what is stuck.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

/// Orchestrator lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting dispatches.
    Active,
    /// Drain requested; existing tasks run to completion, dispatches fail.
    Draining,
    /// Terminal: nothing in flight, nothing accepted.
    Drained,
}

#[derive(Debug)]
struct Ledger {
    phase: Phase,
    running: BTreeMap<u64, Arc<str>>,
}

/// Shared in-flight state.
pub(crate) struct InFlight {
    tx: Arc<watch::Sender<Ledger>>,
    next_id: AtomicU64,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(Ledger {
            phase: Phase::Active,
            running: BTreeMap::new(),
        });
        Self {
            tx: Arc::new(tx),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a task if the phase is `Active`.
    ///
    /// Returns the release guard and the in-flight count including this task.
    pub(crate) fn admit(&self, name: &Arc<str>) -> Option<(InFlightGuard, usize)> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut in_flight = 0;
        let admitted = self.tx.send_if_modified(|l| {
            if l.phase != Phase::Active {
                return false;
            }
            l.running.insert(id, Arc::clone(name));
            in_flight = l.running.len();
            true
        });
        admitted.then(|| {
            let guard = InFlightGuard {
                tx: Arc::clone(&self.tx),
                id,
            };
            (guard, in_flight)
        })
    }

    /// Moves `Active → Draining`. Returns the in-flight count if this call made the move.
    pub(crate) fn begin_drain(&self) -> Option<usize> {
        let mut in_flight = 0;
        let moved = self.tx.send_if_modified(|l| {
            if l.phase != Phase::Active {
                return false;
            }
            l.phase = Phase::Draining;
            in_flight = l.running.len();
            true
        });
        moved.then_some(in_flight)
    }

    /// Completes once nothing is in flight.
    pub(crate) async fn wait_idle(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this can only return Ok.
        let _ = rx.wait_for(|l| l.running.is_empty()).await;
    }

    /// Moves to `Drained`. Returns true if this call made the move.
    pub(crate) fn finish_drain(&self) -> bool {
        self.tx.send_if_modified(|l| {
            if l.phase == Phase::Drained {
                return false;
            }
            l.phase = Phase::Drained;
            true
        })
    }

    pub(crate) fn phase(&self) -> Phase {
        self.tx.borrow().phase
    }

    pub(crate) fn len(&self) -> usize {
        self.tx.borrow().running.len()
    }

    /// Sorted names of the tasks still running.
    pub(crate) fn stuck(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tx
            .borrow()
            .running
            .values()
            .map(|n| n.to_string())
            .collect();
        names.sort_unstable();
        names
    }
}

/// Releases one in-flight slot when dropped, on every exit path.
pub(crate) struct InFlightGuard {
    tx: Arc<watch::Sender<Ledger>>,
    id: u64,
}

impl InFlightGuard {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let id = self.id;
        self.tx.send_modify(|l| {
            l.running.remove(&id);
        });
    }
}
