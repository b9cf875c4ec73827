//! # Subscription fulfillment.
//!
//! Turns one [`SubscriptionEvent`] into exactly two independent background tasks:
//!
//! ```text
//! SubscriptionEvent ──► Arc ──┬──► InvoiceTask  (format → send)
//!                             └──► ManualTask   (render → stage → send → discard)
//! ```
//!
//! Either task may fail without affecting the other, and neither outcome is
//! reported to the caller: fulfillment is best-effort and its failures surface
//! on the orchestrator's error stream.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::invoice::InvoiceTask;
use super::manual::ManualTask;
use super::model::SubscriptionEvent;
use super::notifier::{Message, Notifier};
use super::notify::NotifyTask;
use super::producer::DocumentProducer;
use super::staging::Staging;
use crate::config::parse_number;
use crate::core::Orchestrator;
use crate::error::{ConfigError, RuntimeError};
use crate::tasks::TaskBox;

/// Fulfillment settings.
///
/// | Variable                       | Field          | Default  |
/// |--------------------------------|----------------|----------|
/// | `MEMBERVISOR_STAGING_DIR`      | `staging_dir`  | `./tmp`  |
/// | `MEMBERVISOR_RENDER_DELAY_MS`  | `render_delay` | `0`      |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentConfig {
    /// Where rendered manuals are staged before sending.
    pub staging_dir: PathBuf,
    /// Simulated render cost of the built-in manual producer.
    pub render_delay: Duration,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("./tmp"),
            render_delay: Duration::ZERO,
        }
    }
}

impl FulfillmentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(dir) = lookup("MEMBERVISOR_STAGING_DIR").filter(|d| !d.trim().is_empty()) {
            cfg.staging_dir = PathBuf::from(dir);
        }
        if let Some(v) = lookup("MEMBERVISOR_RENDER_DELAY_MS") {
            cfg.render_delay = Duration::from_millis(parse_number("MEMBERVISOR_RENDER_DELAY_MS", &v)?);
        }
        Ok(cfg)
    }
}

/// Builds and dispatches the background work for subscriptions.
#[derive(Clone)]
pub struct SubscriptionFulfillment {
    notifier: Arc<dyn Notifier>,
    producer: Arc<dyn DocumentProducer>,
    staging: Staging,
}

impl SubscriptionFulfillment {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        producer: Arc<dyn DocumentProducer>,
        staging: Staging,
    ) -> Self {
        Self {
            notifier,
            producer,
            staging,
        }
    }

    /// The invoice and manual tasks for `event`, in that order.
    pub fn tasks(&self, event: SubscriptionEvent) -> [TaskBox; 2] {
        let event = Arc::new(event);
        [
            Box::new(InvoiceTask::new(Arc::clone(&event), Arc::clone(&self.notifier))),
            Box::new(ManualTask::new(
                event,
                Arc::clone(&self.producer),
                Arc::clone(&self.notifier),
                self.staging.clone(),
            )),
        ]
    }

    /// Dispatches both tasks for `event` and returns without waiting for them.
    ///
    /// # Errors
    /// [`RuntimeError::ShuttingDown`] if the orchestrator refused either task.
    /// A task that was accepted keeps running regardless.
    pub fn fulfill(
        &self,
        orchestrator: &Orchestrator,
        event: SubscriptionEvent,
    ) -> Result<(), RuntimeError> {
        let [invoice, manual] = self.tasks(event);
        let invoice = orchestrator.dispatch(invoice);
        let manual = orchestrator.dispatch(manual);
        invoice.and(manual)
    }

    /// Sends a single message in the background.
    pub fn notify(&self, orchestrator: &Orchestrator, message: Message) -> Result<(), RuntimeError> {
        orchestrator.dispatch(Box::new(NotifyTask::new(
            message,
            Arc::clone(&self.notifier),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn fulfillment_config_from_lookup() {
        let env = HashMap::from([
            ("MEMBERVISOR_STAGING_DIR", "/var/tmp/manuals"),
            ("MEMBERVISOR_RENDER_DELAY_MS", "250"),
        ]);
        let cfg = FulfillmentConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.staging_dir, PathBuf::from("/var/tmp/manuals"));
        assert_eq!(cfg.render_delay, Duration::from_millis(250));
    }

    #[test]
    fn blank_staging_dir_keeps_default() {
        let cfg =
            FulfillmentConfig::from_lookup(|k| (k == "MEMBERVISOR_STAGING_DIR").then(String::new))
                .unwrap();
        assert_eq!(cfg, FulfillmentConfig::default());
    }
}
