//! # Outbound notifications.
//!
//! [`Notifier`] is the transport boundary: it receives a fully formatted
//! [`Message`] and reports success or failure. Any failure becomes a task
//! failure; nothing here retries.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// A file attached to a message, read by the transport at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// Name shown to the recipient.
    pub name: String,
    /// Where the transport reads the content from.
    pub path: PathBuf,
}

/// A formatted notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Transport-side template to render `body` into, if any.
    pub template: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            template: None,
            attachments: Vec::new(),
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_attachment(mut self, name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        self.attachments.push(Attachment {
            name: name.into(),
            path: path.as_ref().to_path_buf(),
        });
        self
    }
}

/// Message transport.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Delivers `message`. May perform network I/O.
    async fn send(&self, message: &Message) -> anyhow::Result<()>;
}

/// Development transport: logs each message instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &Message) -> anyhow::Result<()> {
        let attachments: Vec<&str> = message.attachments.iter().map(|a| a.name.as_str()).collect();
        info!(
            to = %message.to,
            subject = %message.subject,
            template = message.template.as_deref(),
            attachments = ?attachments,
            "notification sent"
        );
        Ok(())
    }
}
