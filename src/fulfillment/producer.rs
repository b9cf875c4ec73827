//! # Document rendering.
//!
//! [`DocumentProducer`] renders an [`Artifact`] for a subscriber and plan. Rendering
//! is expected to be slow, which is why it only ever runs inside a background task.

use std::time::Duration;

use async_trait::async_trait;

use super::model::{PlanRef, UserRef};

/// A rendered document held in memory until it is staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name presented to the recipient.
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Renders per-subscriber documents.
#[async_trait]
pub trait DocumentProducer: Send + Sync + 'static {
    async fn render(&self, subscriber: &UserRef, plan: &PlanRef) -> anyhow::Result<Artifact>;
}

/// Renders a plain-text user guide personalised with the subscriber's name.
///
/// `render_delay` stands in for the cost of real document layout.
#[derive(Debug, Clone, Default)]
pub struct TemplateManualProducer {
    render_delay: Duration,
}

impl TemplateManualProducer {
    pub fn new(render_delay: Duration) -> Self {
        Self { render_delay }
    }
}

#[async_trait]
impl DocumentProducer for TemplateManualProducer {
    async fn render(&self, subscriber: &UserRef, plan: &PlanRef) -> anyhow::Result<Artifact> {
        if !self.render_delay.is_zero() {
            tokio::time::sleep(self.render_delay).await;
        }
        let content = format!("{}\n\n{} User Guide\n", subscriber.full_name(), plan.name);
        Ok(Artifact {
            file_name: "Manual.txt".to_string(),
            content: content.into_bytes(),
        })
    }
}
