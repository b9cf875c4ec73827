//! # Run one dispatched task.
//!
//! Executes a [`Task`] once, with optional timeout and panic capture, and
//! publishes its lifecycle to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! Success:       TaskStarting → run() → Ok(())          → TaskStopped
//! Cancellation:  TaskStarting → run() → Err(Canceled)   → TaskStopped (reason=canceled)
//! Failure:       TaskStarting → run() → Err(Fail)       → TaskFailed
//! Panic:         TaskStarting → run() panics            → TaskFailed (Panicked)
//! Timeout:       TaskStarting → bound elapsed → cancel child → TimeoutHit → TaskFailed
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event: `TaskStopped` or `TaskFailed`.
//! - The terminal event is published before the caller releases the in-flight
//!   slot, so a completed drain implies every failure is already on the bus.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    core::panic_message,
    error::TaskError,
    events::{Bus, Event, EventKind},
    tasks::TaskBox,
};

/// Identity of a dispatched task, as carried on its events.
pub(crate) struct RunIdent {
    pub name: Arc<str>,
    pub id: u64,
}

/// Executes `task` to completion, publishing lifecycle events to `bus`.
///
/// A panic inside `run` (including while constructing its future) is caught and
/// reported as [`TaskError::Panicked`].
pub(crate) async fn run_task(
    task: TaskBox,
    ident: &RunIdent,
    parent: &CancellationToken,
    timeout: Option<Duration>,
    bus: &Bus,
) -> Result<(), TaskError> {
    bus.publish(task_event(EventKind::TaskStarting, ident));

    let child = parent.child_token();
    let ctx = child.clone();
    let guarded = AssertUnwindSafe(async move { task.run(ctx).await }).catch_unwind();

    let res = if let Some(dur) = timeout.filter(|d| *d > Duration::ZERO) {
        match time::timeout(dur, guarded).await {
            Ok(r) => settle(r),
            Err(_elapsed) => {
                child.cancel();
                bus.publish(task_event(EventKind::TimeoutHit, ident).with_timeout(dur));
                Err(TaskError::Timeout { timeout: dur })
            }
        }
    } else {
        settle(guarded.await)
    };

    match &res {
        Ok(()) => bus.publish(task_event(EventKind::TaskStopped, ident)),
        Err(TaskError::Canceled) => {
            bus.publish(task_event(EventKind::TaskStopped, ident).with_reason("canceled"))
        }
        Err(e) => bus.publish(task_event(EventKind::TaskFailed, ident).with_error(e.clone())),
    }
    res
}

fn settle(outcome: Result<Result<(), TaskError>, Box<dyn Any + Send>>) -> Result<(), TaskError> {
    outcome.unwrap_or_else(|panic| {
        Err(TaskError::Panicked {
            info: panic_message(panic.as_ref()),
        })
    })
}

fn task_event(kind: EventKind, ident: &RunIdent) -> Event {
    Event::new(kind)
        .with_task(Arc::clone(&ident.name))
        .with_task_id(ident.id)
}
