//! # Logging subscriber.
//!
//! [`LogWriter`] renders runtime events through `tracing` with structured fields.
//! Task failures are logged at `debug` here; the operator-facing error line comes
//! from the error logger started by
//! [`LifecycleController::spawn_error_logger`](crate::LifecycleController::spawn_error_logger).

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// `tracing` subscriber for runtime events.
///
/// Enabled via the `logging` feature (on by default).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::TaskDispatched => {
                debug!(task, task_id = e.task_id, in_flight = e.in_flight, "task dispatched");
            }
            EventKind::TaskStarting => debug!(task, task_id = e.task_id, "task starting"),
            EventKind::TaskStopped => {
                debug!(task, task_id = e.task_id, reason = e.reason.as_deref(), "task stopped");
            }
            EventKind::TaskFailed => {
                let error = e.error.as_ref().map(ToString::to_string);
                debug!(task, task_id = e.task_id, error = error.as_deref(), "task failed");
            }
            EventKind::TimeoutHit => {
                warn!(task, task_id = e.task_id, timeout_ms = e.timeout_ms, "task timed out");
            }
            EventKind::DispatchRejected => warn!(task, "dispatch rejected: shutting down"),
            EventKind::DrainRequested => info!(in_flight = e.in_flight, "drain requested"),
            EventKind::DrainCompleted => info!("all background tasks completed"),
            EventKind::DrainTimedOut => {
                warn!(
                    in_flight = e.in_flight,
                    timeout_ms = e.timeout_ms,
                    stuck = e.reason.as_deref(),
                    "drain timed out"
                );
            }
            EventKind::ShutdownRequested => info!("shutdown requested"),
            EventKind::ShutdownForced => {
                warn!(in_flight = e.in_flight, stuck = e.reason.as_deref(), "forcing shutdown");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = task, reason = e.reason.as_deref(), "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = task, reason = e.reason.as_deref(), "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
