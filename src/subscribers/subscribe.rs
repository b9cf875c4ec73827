//! # Runtime event handlers.
//!
//! A [`Subscribe`] implementation sees every [`Event`] the orchestrator, its
//! tasks and the lifecycle controller publish: dispatches, task outcomes,
//! drain progress and forced shutdowns. Failures additionally reach
//! [`ErrorStream`](crate::ErrorStream)s; subscribers are for everything else
//! (logging, counters, audit trails).
//!
//! Each handler runs on its own worker behind a bounded queue, so a slow
//! handler only delays itself. When its queue is full the event is dropped for
//! that handler and `SubscriberOverflow` is published.

use async_trait::async_trait;

use crate::events::Event;

/// Receives runtime events from a [`SubscriberSet`](crate::SubscriberSet) worker.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Called once per delivered event, in publish order.
    async fn on_event(&self, event: &Event);

    /// Name used on overflow and panic reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue depth before events are dropped for this handler.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
