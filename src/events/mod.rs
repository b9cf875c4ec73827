//! Runtime events: types, broadcast bus and the error stream.
//!
//! ## Contents
//! - [`EventKind`], [`Event`]: event classification and payload metadata
//! - [`Bus`]: thin wrapper over `tokio::sync::broadcast`
//! - [`ErrorStream`], [`TaskFailure`]: failure-only view of the bus
//!
//! ## Quick reference
//! - **Publishers**: `Orchestrator::dispatch`/`drain`, the task runner,
//!   `LifecycleController`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener (fans out to `SubscriberSet`) and
//!   any number of `ErrorStream`s.

mod bus;
mod event;
mod stream;

pub use bus::Bus;
pub use event::{Event, EventKind};
pub use stream::{ErrorStream, TaskFailure};
