//! Invoice task: format the invoice and send it to the subscriber.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use super::model::{PlanRef, SubscriptionEvent, UserRef};
use super::notifier::{Message, Notifier};
use crate::error::TaskError;
use crate::tasks::{BoxTaskFuture, Task};

/// Task name carried on events and failures.
pub const INVOICE_TASK: &str = "invoice";

/// Invoice for one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub plan_name: String,
    pub amount: String,
}

impl Invoice {
    pub fn for_plan(plan: &PlanRef) -> Self {
        Self {
            plan_name: plan.name.clone(),
            amount: plan.formatted_amount.clone(),
        }
    }

    /// The invoice email; the body carries the amount for the `invoice` template.
    pub fn message(&self, to: &UserRef) -> Message {
        Message::new(&to.email, "Your Invoice", &self.amount).with_template("invoice")
    }
}

/// Sends the invoice for a subscription.
pub struct InvoiceTask {
    event: Arc<SubscriptionEvent>,
    notifier: Arc<dyn Notifier>,
}

impl InvoiceTask {
    pub fn new(event: Arc<SubscriptionEvent>, notifier: Arc<dyn Notifier>) -> Self {
        Self { event, notifier }
    }
}

impl Task for InvoiceTask {
    fn name(&self) -> &str {
        INVOICE_TASK
    }

    fn run(self: Box<Self>, ctx: CancellationToken) -> BoxTaskFuture {
        let Self { event, notifier } = *self;
        Box::pin(async move {
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }
            let message = Invoice::for_plan(&event.plan).message(&event.subscriber);
            notifier
                .send(&message)
                .await
                .context("sending invoice")
                .map_err(TaskError::fail)
        })
    }
}
