//! # Orchestrator: dispatch, completion tracking, error observation, drain.
//!
//! The [`Orchestrator`] is a passive coordination structure shared (via `Arc`) by
//! every component that dispatches background work. It has no loop of its own:
//! each dispatched task runs on its own tokio task, and the orchestrator only
//! tracks what is in flight.
//!
//! ## High-level architecture
//! ```text
//! dispatch(task) ──► ledger.admit() ──► TaskDispatched ──► tokio::spawn ─┐
//!      │  (rejected unless Active: DispatchRejected + ShuttingDown)      │
//!      ▼                                                                 ▼
//!   returns immediately                      runner::run_task(task, child token)
//!                                                   ├─ TaskStarting
//!                                                   ├─ TaskStopped | TaskFailed ──► Bus ──► ErrorStream(s)
//!                                                   └─ guard dropped: in-flight -1
//!
//! drain(timeout) ──► Active→Draining (DrainRequested)
//!                ──► wait until in-flight == 0
//!                      ├─ Ok      → Draining→Drained (DrainCompleted, once)
//!                      └─ elapsed → DrainTimedOut, RuntimeError::DrainTimeout (tasks keep running)
//! ```
//!
//! ## Rules
//! - The in-flight counter is incremented before `dispatch` returns and
//!   decremented exactly once, after `run` has returned or panicked.
//! - Dispatch never blocks and never waits for the task.
//! - Failures never propagate to the dispatcher; they are published on the bus
//!   and read through [`Orchestrator::observe_errors`].
//! - Drain never cancels tasks. [`Orchestrator::cancel`] is the separate,
//!   cooperative stop signal tasks observe through their token.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug_span, warn};

use crate::core::builder::OrchestratorBuilder;
use crate::core::ledger::{InFlight, Phase};
use crate::core::runner::{self, RunIdent};
use crate::{
    config::Config,
    error::RuntimeError,
    events::{Bus, ErrorStream, Event, EventKind},
    tasks::TaskBox,
};

/// Fans out background tasks, tracks them, and drains them on shutdown.
pub struct Orchestrator {
    cfg: Config,
    bus: Bus,
    ledger: InFlight,
    runtime_token: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Orchestrator {
    /// Returns a builder for configuring subscribers before construction.
    pub fn builder(cfg: Config) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: Config, bus: Bus, listener: Option<JoinHandle<()>>) -> Self {
        Self {
            cfg,
            bus,
            ledger: InFlight::new(),
            runtime_token: CancellationToken::new(),
            listener: Mutex::new(listener),
        }
    }

    /// Starts `task` in the background and returns immediately.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// [`RuntimeError::ShuttingDown`] once a drain has begun; the task is not run.
    pub fn dispatch(&self, task: TaskBox) -> Result<(), RuntimeError> {
        let name: Arc<str> = Arc::from(task.name());

        let Some((guard, in_flight)) = self.ledger.admit(&name) else {
            warn!(task = %name, phase = ?self.ledger.phase(), "dispatch rejected");
            self.bus
                .publish(Event::new(EventKind::DispatchRejected).with_task(Arc::clone(&name)));
            return Err(RuntimeError::ShuttingDown {
                task: name.to_string(),
            });
        };

        let ident = RunIdent {
            name,
            id: guard.id(),
        };
        self.bus.publish(
            Event::new(EventKind::TaskDispatched)
                .with_task(Arc::clone(&ident.name))
                .with_task_id(ident.id)
                .with_in_flight(in_flight),
        );

        let span = debug_span!("task", task = %ident.name, task_id = ident.id);
        let bus = self.bus.clone();
        let parent = self.runtime_token.clone();
        let timeout = self.cfg.default_timeout();

        tokio::spawn(
            async move {
                // Dropped last, after the terminal event is on the bus.
                let _guard = guard;
                let _ = runner::run_task(task, &ident, &parent, timeout, &bus).await;
            }
            .instrument(span),
        );
        Ok(())
    }

    /// Waits until every dispatched task has completed, then enters `Drained`.
    ///
    /// The first call moves the orchestrator to `Draining`, after which dispatches
    /// fail. Calling it when nothing is in flight returns at once; calling it again
    /// after success is a no-op.
    ///
    /// # Errors
    /// [`RuntimeError::DrainTimeout`] if `timeout` elapses first. Tasks keep
    /// running, the orchestrator stays `Draining`, and a later drain may succeed.
    pub async fn drain(&self, timeout: Option<Duration>) -> Result<(), RuntimeError> {
        if let Some(in_flight) = self.ledger.begin_drain() {
            self.bus
                .publish(Event::new(EventKind::DrainRequested).with_in_flight(in_flight));
        }

        match timeout {
            Some(bound) => {
                if time::timeout(bound, self.ledger.wait_idle()).await.is_err() {
                    let stuck = self.ledger.stuck();
                    let in_flight = stuck.len();
                    self.bus.publish(
                        Event::new(EventKind::DrainTimedOut)
                            .with_in_flight(in_flight)
                            .with_timeout(bound)
                            .with_reason(stuck.join(",")),
                    );
                    return Err(RuntimeError::DrainTimeout {
                        timeout: bound,
                        in_flight,
                        stuck,
                    });
                }
            }
            None => self.ledger.wait_idle().await,
        }

        if self.ledger.finish_drain() {
            self.bus.publish(Event::new(EventKind::DrainCompleted));
        }
        Ok(())
    }

    /// Returns a fresh stream of task failures published from now on.
    ///
    /// Any number of streams may be open; each sees every failure. See
    /// [`ErrorStream`] for the lag policy and when the stream ends.
    pub fn observe_errors(&self) -> ErrorStream {
        let rx = self.bus.subscribe_failures();
        ErrorStream::new(rx, self.ledger.phase() == Phase::Drained)
    }

    /// Signals every running and future task's token to stop at its next safe point.
    ///
    /// Does not change the phase and does not wait.
    pub fn cancel(&self) {
        self.runtime_token.cancel();
    }

    /// Waits until subscribers have handled every event up to `DrainCompleted`
    /// or `ShutdownForced`.
    ///
    /// Returns at once when there are no subscribers or a previous call already
    /// waited. Only call it after one of those events was published, or it waits
    /// for the next one.
    pub async fn flush_subscribers(&self) {
        let handle = self.listener.lock().ok().and_then(|mut l| l.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "subscriber listener ended abnormally");
            }
        }
    }

    /// Number of tasks currently in flight.
    pub fn in_flight(&self) -> usize {
        self.ledger.len()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.ledger.phase()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub(crate) fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }
}
