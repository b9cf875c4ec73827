//! # Event bus.
//!
//! [`Bus`] wraps two [`tokio::sync::broadcast`] rings used by the orchestrator,
//! the task runner and subscriber workers.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                 Receivers (many):
//!   dispatch()   ──┐   events ring   ┌──► subscriber listener ──► SubscriberSet
//!   task runner  ──┼──► Bus ─────────┘
//!   drain()      ──┤     │ failures ring (TaskFailed, DrainCompleted)
//!   lifecycle    ──┘     └──────────────► ErrorStream #1 .. #N
//! ```
//!
//! Publishing never waits: a task reporting its failure must not stall because
//! nobody is reading. Every event goes on the events ring. `TaskFailed` and
//! `DrainCompleted` are also copied onto a failures ring of the same capacity,
//! so routine events from successful tasks never push a failure out of an
//! error stream's window. A receiver further behind than the capacity loses
//! the oldest entries of its ring. Events published while nobody is subscribed
//! are gone.

use tokio::sync::broadcast;

use super::event::{Event, EventKind};
use crate::config::MAX_BUS_CAPACITY;

/// Shared publish side of the runtime event channels. Clones publish to the same rings.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
    failures: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus whose rings hold `capacity` entries each, clamped to
    /// `1..=MAX_BUS_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_BUS_CAPACITY);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        let (failures, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx, failures }
    }

    /// Publishes an event to all active receivers; drops it if there are none.
    pub fn publish(&self, ev: Event) {
        if matches!(ev.kind, EventKind::TaskFailed | EventKind::DrainCompleted) {
            let _ = self.failures.send(ev.clone());
        }
        let _ = self.tx.send(ev);
    }

    /// A receiver that sees every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// A receiver limited to `TaskFailed` and `DrainCompleted` events.
    pub fn subscribe_failures(&self) -> broadcast::Receiver<Event> {
        self.failures.subscribe()
    }
}
