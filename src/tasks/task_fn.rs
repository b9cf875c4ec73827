//! # Closure-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: FnOnce(CancellationToken) -> Fut`. The closure is
//! called exactly once, when the orchestrator starts the task.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use membervisor::{TaskBox, TaskError, TaskFn};
//!
//! let t: TaskBox = TaskFn::boxed("worker", |_ctx: CancellationToken| async move {
//!     Ok::<_, TaskError>(())
//! });
//! assert_eq!(t.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::{BoxTaskFuture, Task, TaskBox};

/// Closure-backed task implementation.
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new closure-backed task.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F, Fut> TaskFn<F>
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    /// Creates the task and returns it as a [`TaskBox`].
    pub fn boxed(name: impl Into<Cow<'static, str>>, f: F) -> TaskBox {
        Box::new(Self::new(name, f))
    }
}

impl<F, Fut> Task for TaskFn<F>
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(self: Box<Self>, ctx: CancellationToken) -> BoxTaskFuture {
        let Self { f, .. } = *self;
        Box::pin(f(ctx))
    }
}
