//! # membervisor
//!
//! **membervisor** coordinates the background work a membership site triggers
//! when a user subscribes to a plan: invoice and manual generation plus their
//! notifications run off the request path, their completion is tracked for
//! graceful shutdown, and their failures are surfaced on a side channel instead
//! of the HTTP response.
//!
//! ## Architecture
//! ```text
//!   request handler
//!        │ SubscriptionEvent
//!        ▼
//! ┌──────────────────────────┐  dispatch(task) ×2   ┌──────────────────────────────────┐
//! │ SubscriptionFulfillment  │ ───────────────────► │ Orchestrator                     │
//! │  InvoiceTask, ManualTask │                      │  - in-flight ledger + phase      │
//! └──────────────────────────┘                      │  - runtime CancellationToken     │
//!                                                   │  - Bus (bounded broadcast)       │
//!                                                   └──┬──────────────┬────────────────┘
//!                                      tokio::spawn per task          │ events
//!                                                      ▼              ▼
//!                                              runner::run_task   ┌────────────┬──────────────┐
//!                                              (panic capture,    │ Subscriber │ ErrorStream  │
//!                                               timeout, events)  │ Set (logs) │ (failures)   │
//!                                                                 └────────────┴──────────────┘
//!
//! LifecycleController: spawn_error_logger() at startup,
//!                      signal → drain(grace) → Drained | cancel + Forced
//! ```
//!
//! ## Lifecycle
//! ```text
//! Active ──drain()──► Draining ──in-flight reaches 0──► Drained
//!   │                   │                                  │
//!   dispatch ok         dispatch → ShuttingDown            dispatch → ShuttingDown
//! ```
//!
//! ## Features
//! | Area             | Description                                                   | Key types                                   |
//! |------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Orchestration**| Dispatch, in-flight tracking, drain with optional bound       | [`Orchestrator`], [`Phase`]                 |
//! | **Errors**       | Failure stream and typed runtime/task errors                  | [`ErrorStream`], [`TaskFailure`], [`TaskError`], [`RuntimeError`] |
//! | **Tasks**        | One-shot cancelable tasks as values                           | [`Task`], [`TaskFn`], [`TaskBox`]           |
//! | **Lifecycle**    | Signal handling, bounded shutdown, error logging              | [`LifecycleController`], [`ShutdownOutcome`]|
//! | **Events**       | Lifecycle events and subscriber fan-out                       | [`Event`], [`Subscribe`], [`SubscriberSet`] |
//! | **Fulfillment**  | Invoice/manual tasks and their collaborators                  | [`fulfillment`]                             |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a `tracing` subscriber for runtime events.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use membervisor::{Config, Orchestrator, TaskError, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orch = Orchestrator::builder(Config::default()).build();
//!     let mut errors = orch.observe_errors();
//!
//!     orch.dispatch(TaskFn::boxed("invoice", |_ctx: CancellationToken| async {
//!         Err::<(), TaskError>(TaskError::fail("smtp unavailable"))
//!     }))?;
//!
//!     orch.drain(Some(Duration::from_secs(5))).await?;
//!
//!     let failure = errors.next().await.expect("one failure");
//!     assert_eq!(&*failure.task, "invoice");
//!     assert!(errors.next().await.is_none());
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod subscribers;
mod tasks;

pub mod fulfillment;

// ---- Public re-exports ----

pub use config::{Config, MAX_BUS_CAPACITY};
pub use crate::core::{
    LifecycleController, Orchestrator, OrchestratorBuilder, Phase, ShutdownOutcome,
    wait_for_shutdown_signal,
};
pub use error::{ConfigError, RuntimeError, TaskError};
pub use events::{Bus, ErrorStream, Event, EventKind, TaskFailure};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{BoxTaskFuture, Task, TaskBox, TaskFn};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
