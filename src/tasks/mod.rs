//! # Task abstractions.
//!
//! - [`Task`]: trait for one-shot, cancelable background work
//! - [`TaskFn`]: closure-backed implementation
//! - [`TaskBox`]: owned handle handed to the orchestrator

mod task;
mod task_fn;

pub use task::{BoxTaskFuture, Task, TaskBox};
pub use task_fn::TaskFn;
