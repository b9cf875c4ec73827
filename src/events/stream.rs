//! # Error observation stream.
//!
//! [`ErrorStream`] is the reader side of the error-observation channel: it reads
//! the failures ring of the [`Bus`](super::Bus) and yields one [`TaskFailure`]
//! per failing task, in delivery order.
//!
//! ## Rules
//! - Every stream is an independent broadcast receiver, so any number of
//!   observers can run at once and each sees every failure.
//! - A stream only sees failures published **after** it was created. Create it
//!   before dispatching work you want to observe.
//! - A stream that falls more than `bus_capacity` failures behind skips the
//!   oldest ones; the skipped count is logged at warn level. Events from
//!   successful tasks do not count against that window.
//! - The stream ends once the orchestrator publishes `DrainCompleted` (or right
//!   away if it was created after the orchestrator was drained).

use std::sync::Arc;
use std::time::SystemTime;

use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

use crate::error::TaskError;
use crate::events::{Event, EventKind};

/// One task failure as observed on the error stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Sequence number of the underlying `TaskFailed` event.
    pub seq: u64,
    /// Per-dispatch task id.
    pub task_id: u64,
    /// Task name (e.g. `"invoice"`, `"manual"`).
    pub task: Arc<str>,
    /// Why the task failed.
    pub error: TaskError,
    /// When the failure was published.
    pub at: SystemTime,
}

impl TaskFailure {
    fn from_event(ev: Event) -> Option<Self> {
        Some(Self {
            seq: ev.seq,
            task_id: ev.task_id?,
            task: ev.task?,
            error: ev.error?,
            at: ev.at,
        })
    }
}

/// Lazy sequence of task failures.
///
/// Obtained from [`Orchestrator::observe_errors`](crate::Orchestrator::observe_errors).
pub struct ErrorStream {
    rx: broadcast::Receiver<Event>,
    done: bool,
}

impl ErrorStream {
    pub(crate) fn new(rx: broadcast::Receiver<Event>, done: bool) -> Self {
        Self { rx, done }
    }

    /// Waits for the next failure; `None` once the orchestrator has drained.
    pub async fn next(&mut self) -> Option<TaskFailure> {
        while !self.done {
            match self.rx.recv().await {
                Ok(ev) => {
                    if let Some(failure) = self.accept(ev) {
                        return Some(failure);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "error stream lagged behind; oldest failures dropped");
                }
                Err(RecvError::Closed) => self.done = true,
            }
        }
        None
    }

    /// Returns an already-delivered failure without waiting.
    pub fn try_next(&mut self) -> Option<TaskFailure> {
        while !self.done {
            match self.rx.try_recv() {
                Ok(ev) => {
                    if let Some(failure) = self.accept(ev) {
                        return Some(failure);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "error stream lagged behind; oldest failures dropped");
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => self.done = true,
            }
        }
        None
    }

    /// Adapts this reader into a [`futures::Stream`].
    pub fn into_stream(self) -> impl Stream<Item = TaskFailure> + Send + 'static {
        futures::stream::unfold(self, |mut s| async move {
            let failure = s.next().await?;
            Some((failure, s))
        })
    }

    fn accept(&mut self, ev: Event) -> Option<TaskFailure> {
        match ev.kind {
            EventKind::TaskFailed => TaskFailure::from_event(ev),
            EventKind::DrainCompleted => {
                self.done = true;
                None
            }
            _ => None,
        }
    }
}
