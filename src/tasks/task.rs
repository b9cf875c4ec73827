//! # One-shot task abstraction.
//!
//! A [`Task`] has a stable [`name`](Task::name) and a [`run`](Task::run) method that
//! **consumes** the task: a task object never survives its own execution. `run`
//! receives a [`CancellationToken`] and should check it at safe points (before
//! expensive work) so shutdown can be bounded.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Boxed future returned by [`Task::run`].
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// Owned, type-erased task handle accepted by [`Orchestrator::dispatch`](crate::Orchestrator::dispatch).
pub type TaskBox = Box<dyn Task>;

/// # Asynchronous, cancelable, one-shot unit of background work.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use membervisor::{BoxTaskFuture, Task, TaskError};
///
/// struct Hello;
///
/// impl Task for Hello {
///     fn name(&self) -> &str { "hello" }
///
///     fn run(self: Box<Self>, ctx: CancellationToken) -> BoxTaskFuture {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Task: Send + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task to completion, consuming it.
    fn run(self: Box<Self>, ctx: CancellationToken) -> BoxTaskFuture;
}
