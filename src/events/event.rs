//! # Runtime events emitted by the orchestrator and its tasks.
//!
//! The [`EventKind`] enum classifies event types across four groups:
//! - **Task events**: dispatch, start, stop, failure, timeout
//! - **Drain events**: drain requested, completed, timed out
//! - **Shutdown events**: signal observed, forced exit
//! - **Subscriber events**: overflow and panics inside subscriber workers
//!
//! The [`Event`] struct carries optional metadata (task name and id, error,
//! timeout, in-flight count) depending on the kind.
//!
//! `seq` is taken from one process-wide counter, so it orders events across
//! every orchestrator in the process; delivery order on the bus matches it per
//! publisher.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use membervisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TimeoutHit)
//!     .with_task("manual")
//!     .with_task_id(7)
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::TimeoutHit);
//! assert_eq!(ev.task.as_deref(), Some("manual"));
//! assert_eq!(ev.timeout_ms, Some(5_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::error::TaskError;

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task events ===
    /// Task admitted; the in-flight counter already includes it.
    ///
    /// Sets: `task`, `task_id`, `in_flight`
    TaskDispatched,

    /// Task execution began on its own tokio task.
    ///
    /// Sets: `task`, `task_id`
    TaskStarting,

    /// Task finished successfully **or** stopped on cancellation.
    ///
    /// Sets: `task`, `task_id`, `reason` (`"canceled"` on cancellation)
    TaskStopped,

    /// Task failed; this is what error streams deliver.
    ///
    /// Sets: `task`, `task_id`, `error`
    TaskFailed,

    /// Task exceeded its timeout (always followed by `TaskFailed`).
    ///
    /// Sets: `task`, `task_id`, `timeout_ms`
    TimeoutHit,

    /// Dispatch refused because the orchestrator is no longer active.
    ///
    /// Sets: `task`
    DispatchRejected,

    // === Drain events ===
    /// Orchestrator moved from `Active` to `Draining`.
    ///
    /// Sets: `in_flight`
    DrainRequested,

    /// Every in-flight task completed; orchestrator is `Drained`.
    ///
    /// Published once. Error streams end when they see it.
    DrainCompleted,

    /// A drain bound elapsed with tasks still running.
    ///
    /// Sets: `in_flight`, `timeout_ms`, `reason` (stuck task names)
    DrainTimedOut,

    // === Shutdown events ===
    /// Termination signal observed.
    ShutdownRequested,

    /// Grace elapsed during shutdown; runtime token cancelled and exit forced.
    ///
    /// Sets: `in_flight`, `reason` (stuck task names)
    ShutdownForced,

    // === Subscriber events ===
    /// An event was not delivered to one subscriber (queue full or worker gone).
    ///
    /// Sets: `task` (subscriber name), `reason`
    SubscriberOverflow,

    /// A subscriber's `on_event` panicked; the worker keeps running.
    ///
    /// Sets: `task` (subscriber name), `reason` (panic message)
    SubscriberPanicked,
}

/// One runtime event. Which optional fields are set depends on [`EventKind`].
#[derive(Clone, Debug)]
pub struct Event {
    /// Process-wide publish order.
    pub seq: u64,
    pub at: SystemTime,
    pub kind: EventKind,

    /// Name of the task (or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Per-dispatch task id, if applicable.
    pub task_id: Option<u64>,
    /// Task error for `TaskFailed`.
    pub error: Option<TaskError>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// In-flight task count at the time of the event.
    pub in_flight: Option<usize>,
}

impl Event {
    /// Stamps a new event with the next sequence number and the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            task_id: None,
            error: None,
            reason: None,
            timeout_ms: None,
            in_flight: None,
        }
    }

    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn with_task_id(mut self, id: u64) -> Self {
        self.task_id = Some(id);
        self
    }

    pub fn with_error(mut self, err: TaskError) -> Self {
        self.error = Some(err);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Stored as whole milliseconds, saturating at `u32::MAX`.
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    pub fn with_in_flight(mut self, n: usize) -> Self {
        self.in_flight = Some(n);
        self
    }

    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::TaskStarting);
        let b = Event::new(EventKind::TaskStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn timeout_is_saturated_to_u32() {
        let ev = Event::new(EventKind::TimeoutHit).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }
}
