//! # Lifecycle controller: error logging and bounded drain-on-shutdown.
//!
//! ```text
//! startup:   LifecycleController::new(orch) ──► spawn_error_logger()   (always-on error consumer)
//!
//! shutdown:  wait_for_shutdown_signal() ──► ShutdownRequested
//!              └─► orch.drain(Some(grace))
//!                    ├─ Ok            → flush subscribers → ShutdownOutcome::Drained
//!                    └─ DrainTimeout  → orch.cancel() → ShutdownForced
//!                                       → warn!(stuck) → flush subscribers
//!                                       → ShutdownOutcome::Forced
//! ```
//!
//! The controller never exits the process itself; the caller decides what a
//! forced outcome means (the bundled binary exits non-zero).

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::core::{orchestrator::Orchestrator, shutdown};
use crate::error::RuntimeError;
use crate::events::{Event, EventKind};

/// How a shutdown ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every background task completed within the grace period.
    Drained,
    /// Grace elapsed; the runtime token was cancelled and these tasks were still running.
    Forced {
        /// Sorted names of the stuck tasks.
        stuck: Vec<String>,
    },
}

/// Owns process startup/shutdown for one [`Orchestrator`].
pub struct LifecycleController {
    orchestrator: Arc<Orchestrator>,
    grace: Duration,
}

impl LifecycleController {
    /// Creates a controller using the orchestrator's configured grace period.
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        let grace = orchestrator.config().grace;
        Self {
            orchestrator,
            grace,
        }
    }

    /// Overrides the shutdown grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// The orchestrator handle to share with dispatching components.
    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Starts the always-on consumer that logs every task failure.
    ///
    /// The handle resolves to the number of failures logged once the
    /// orchestrator has drained.
    pub fn spawn_error_logger(&self) -> JoinHandle<usize> {
        let mut errors = self.orchestrator.observe_errors();
        tokio::spawn(async move {
            let mut logged = 0;
            while let Some(failure) = errors.next().await {
                error!(
                    task = %failure.task,
                    task_id = failure.task_id,
                    label = failure.error.as_label(),
                    error = %failure.error,
                    "background task failed"
                );
                logged += 1;
            }
            logged
        })
    }

    /// Drains the orchestrator within the grace period, forcing it past that.
    pub async fn shutdown(&self) -> ShutdownOutcome {
        info!(
            grace = ?self.grace,
            in_flight = self.orchestrator.in_flight(),
            "waiting for background tasks"
        );
        match self.orchestrator.drain(Some(self.grace)).await {
            Ok(()) => {
                self.flush_subscribers().await;
                ShutdownOutcome::Drained
            }
            Err(RuntimeError::DrainTimeout {
                in_flight, stuck, ..
            }) => {
                self.orchestrator.cancel();
                self.orchestrator.publish(
                    Event::new(EventKind::ShutdownForced)
                        .with_in_flight(in_flight)
                        .with_reason(stuck.join(",")),
                );
                warn!(
                    grace = ?self.grace,
                    in_flight,
                    stuck = ?stuck,
                    "background tasks did not finish in time; forcing shutdown"
                );
                self.flush_subscribers().await;
                ShutdownOutcome::Forced { stuck }
            }
            Err(other) => {
                warn!(error = %other, "unexpected drain error; forcing shutdown");
                self.orchestrator.cancel();
                ShutdownOutcome::Forced {
                    stuck: Vec::new(),
                }
            }
        }
    }

    /// Gives subscribers (e.g. the log writer) a bounded chance to drain their queues.
    async fn flush_subscribers(&self) {
        let bound = self.grace.max(Duration::from_secs(1));
        if tokio::time::timeout(bound, self.orchestrator.flush_subscribers())
            .await
            .is_err()
        {
            warn!(bound = ?bound, "subscribers did not flush in time");
        }
    }

    /// Waits for a termination signal, then runs [`shutdown`](Self::shutdown).
    pub async fn run_until_signal(&self) -> ShutdownOutcome {
        match shutdown::wait_for_shutdown_signal().await {
            Ok(signal) => info!(signal, "termination signal received"),
            Err(e) => error!(error = %e, "failed to install signal handlers; shutting down"),
        }
        self.orchestrator
            .publish(Event::new(EventKind::ShutdownRequested));
        self.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::TaskError;
    use crate::tasks::TaskFn;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn logger_counts_failures_and_stops_after_drain() {
        let orch = Orchestrator::builder(Config::default()).build();
        let lifecycle = LifecycleController::new(orch.clone());
        let logger = lifecycle.spawn_error_logger();

        for name in ["invoice", "manual"] {
            orch.dispatch(TaskFn::boxed(name, |_ctx: CancellationToken| async {
                Err::<(), TaskError>(TaskError::fail("smtp down"))
            }))
            .unwrap();
        }

        assert_eq!(lifecycle.shutdown().await, ShutdownOutcome::Drained);
        assert_eq!(logger.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn stuck_task_forces_shutdown_and_is_cancelled() {
        let orch = Orchestrator::builder(Config::default()).build();
        let lifecycle =
            LifecycleController::new(orch.clone()).with_grace(Duration::from_millis(50));

        orch.dispatch(TaskFn::boxed("manual", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<(), TaskError>(TaskError::Canceled)
        }))
        .unwrap();

        let outcome = lifecycle.shutdown().await;
        assert_eq!(
            outcome,
            ShutdownOutcome::Forced {
                stuck: vec!["manual".into()]
            }
        );
        // The cancelled task stops at its safe point, so a second drain completes.
        orch.drain(Some(Duration::from_secs(2))).await.unwrap();
    }

    #[derive(Default)]
    struct Recorder {
        seen: std::sync::Mutex<Vec<EventKind>>,
    }

    #[async_trait::async_trait]
    impl crate::subscribers::Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().unwrap().push(event.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn shutdown_returns_after_subscribers_saw_drain() {
        let rec = Arc::new(Recorder::default());
        let orch = Orchestrator::builder(Config::default())
            .with_subscriber(rec.clone())
            .build();
        let lifecycle = LifecycleController::new(orch.clone());

        orch.dispatch(TaskFn::boxed("invoice", |_ctx: CancellationToken| async {
            Ok::<(), TaskError>(())
        }))
        .unwrap();

        assert_eq!(lifecycle.shutdown().await, ShutdownOutcome::Drained);
        let seen = rec.seen.lock().unwrap().clone();
        assert!(seen.contains(&EventKind::TaskStopped));
        assert_eq!(seen.last(), Some(&EventKind::DrainCompleted));
    }

    #[tokio::test]
    async fn forced_shutdown_flushes_subscribers() {
        let rec = Arc::new(Recorder::default());
        let orch = Orchestrator::builder(Config::default())
            .with_subscriber(rec.clone())
            .build();
        let lifecycle =
            LifecycleController::new(orch.clone()).with_grace(Duration::from_millis(50));

        orch.dispatch(TaskFn::boxed("manual", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<(), TaskError>(TaskError::Canceled)
        }))
        .unwrap();

        assert!(matches!(
            lifecycle.shutdown().await,
            ShutdownOutcome::Forced { .. }
        ));
        let seen = rec.seen.lock().unwrap().clone();
        assert_eq!(seen.last(), Some(&EventKind::ShutdownForced));
    }
}
