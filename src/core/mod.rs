//! Runtime core: dispatch, tracking and lifecycle.
//!
//! Internal modules:
//! - [`orchestrator`]: dispatch, drain, error observation;
//! - [`ledger`]: in-flight counter and phase behind one lock;
//! - [`runner`]: executes one task with panic capture, timeout and event publishing;
//! - [`builder`]: wires the bus and subscribers;
//! - [`lifecycle`]: error logger and bounded drain-on-shutdown;
//! - [`shutdown`]: OS signal handling.

mod builder;
mod ledger;
mod lifecycle;
mod orchestrator;
mod runner;
mod shutdown;

pub use builder::OrchestratorBuilder;
pub use ledger::Phase;
pub use lifecycle::{LifecycleController, ShutdownOutcome};
pub use orchestrator::Orchestrator;
pub use shutdown::wait_for_shutdown_signal;

use std::any::Any;

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
