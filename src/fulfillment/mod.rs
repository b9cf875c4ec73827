//! Subscription fulfillment: the background work triggered by a plan subscription.
//!
//! External collaborators are injected as traits: [`Notifier`] (message transport)
//! and [`DocumentProducer`] (manual rendering). [`LogNotifier`] and
//! [`TemplateManualProducer`] are the bundled development implementations.

mod invoice;
mod manual;
mod model;
mod notifier;
mod notify;
mod producer;
mod service;
mod staging;

pub use invoice::{INVOICE_TASK, Invoice, InvoiceTask};
pub use manual::{MANUAL_TASK, ManualTask};
pub use model::{PlanRef, SubscriptionEvent, UserRef};
pub use notifier::{Attachment, LogNotifier, Message, Notifier};
pub use notify::NotifyTask;
pub use producer::{Artifact, DocumentProducer, TemplateManualProducer};
pub use service::{FulfillmentConfig, SubscriptionFulfillment};
pub use staging::{StagedArtifact, Staging};
