//! One-off background notification (account activation, failed login alerts).

use std::borrow::Cow;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use super::notifier::{Message, Notifier};
use crate::error::TaskError;
use crate::tasks::{BoxTaskFuture, Task};

/// Sends a single message off the request path.
pub struct NotifyTask {
    name: Cow<'static, str>,
    message: Message,
    notifier: Arc<dyn Notifier>,
}

impl NotifyTask {
    /// Creates a task named `"notify"`.
    pub fn new(message: Message, notifier: Arc<dyn Notifier>) -> Self {
        Self::named("notify", message, notifier)
    }

    pub fn named(
        name: impl Into<Cow<'static, str>>,
        message: Message,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            name: name.into(),
            message,
            notifier,
        }
    }
}

impl Task for NotifyTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(self: Box<Self>, ctx: CancellationToken) -> BoxTaskFuture {
        Box::pin(async move {
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }
            self.notifier
                .send(&self.message)
                .await
                .with_context(|| format!("sending '{}'", self.message.subject))
                .map_err(TaskError::fail)
        })
    }
}
