//! Manual task: render the user guide, stage it, send it as an attachment.
//!
//! Safe points: before rendering, while rendering (the render future is dropped
//! on cancellation, nothing is on disk yet), and before staging.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::model::SubscriptionEvent;
use super::notifier::{Message, Notifier};
use super::producer::DocumentProducer;
use super::staging::Staging;
use crate::error::TaskError;
use crate::tasks::{BoxTaskFuture, Task};

/// Task name carried on events and failures.
pub const MANUAL_TASK: &str = "manual";

/// Renders and sends the plan manual for a subscription.
pub struct ManualTask {
    event: Arc<SubscriptionEvent>,
    producer: Arc<dyn DocumentProducer>,
    notifier: Arc<dyn Notifier>,
    staging: Staging,
}

impl ManualTask {
    pub fn new(
        event: Arc<SubscriptionEvent>,
        producer: Arc<dyn DocumentProducer>,
        notifier: Arc<dyn Notifier>,
        staging: Staging,
    ) -> Self {
        Self {
            event,
            producer,
            notifier,
            staging,
        }
    }

    async fn execute(self, ctx: CancellationToken) -> Result<(), TaskError> {
        let user = &self.event.subscriber;
        let plan = &self.event.plan;

        if ctx.is_cancelled() {
            return Err(TaskError::Canceled);
        }
        let artifact = tokio::select! {
            res = self.producer.render(user, plan) => {
                res.context("rendering manual").map_err(TaskError::fail)?
            }
            _ = ctx.cancelled() => return Err(TaskError::Canceled),
        };

        if ctx.is_cancelled() {
            return Err(TaskError::Canceled);
        }
        let staged = self
            .staging
            .stage(user.id, &artifact)
            .await
            .context("staging manual")
            .map_err(TaskError::fail)?;

        let message = Message::new(&user.email, "Your Manual", "Your user manual is attached")
            .with_attachment(&artifact.file_name, staged.path());
        let sent = self.notifier.send(&message).await;

        if let Err(e) = staged.discard().await {
            debug!(error = %e, "failed to remove staged manual");
        }
        sent.context("sending manual").map_err(TaskError::fail)
    }
}

impl Task for ManualTask {
    fn name(&self) -> &str {
        MANUAL_TASK
    }

    fn run(self: Box<Self>, ctx: CancellationToken) -> BoxTaskFuture {
        Box::pin((*self).execute(ctx))
    }
}
