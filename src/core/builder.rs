//! # Orchestrator construction.
//!
//! [`OrchestratorBuilder`] creates the [`Bus`], starts the subscriber workers and
//! the listener that forwards bus events to them. The listener stops after
//! forwarding `DrainCompleted` or `ShutdownForced`, then closes the subscriber
//! queues and waits for the workers to finish what they hold;
//! [`Orchestrator::flush_subscribers`] awaits that.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::warn;

use super::orchestrator::Orchestrator;
use crate::{
    config::Config,
    events::{Bus, EventKind},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing an [`Orchestrator`] with event subscribers.
pub struct OrchestratorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers, replacing any added before.
    ///
    /// Subscribers receive every runtime event through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the orchestrator.
    ///
    /// When subscribers are configured this spawns their workers and the bus
    /// listener feeding them, so it must be called inside a tokio runtime.
    pub fn build(self) -> Arc<Orchestrator> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener = (!self.subscribers.is_empty()).then(|| {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            spawn_subscriber_listener(&bus, set)
        });
        Arc::new(Orchestrator::new_internal(self.cfg, bus, listener))
    }
}

/// Forwards bus events to the subscriber set until the orchestrator is
/// drained or shut down by force, then flushes the set.
fn spawn_subscriber_listener(bus: &Bus, set: SubscriberSet) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    let last = matches!(
                        ev.kind,
                        EventKind::DrainCompleted | EventKind::ShutdownForced
                    );
                    set.emit(ev);
                    if last {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber listener lagged; events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            self.seen.lock().unwrap().push(event.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn listener_flushes_subscribers_after_drain() {
        let rec = Arc::new(Recorder::default());
        let orch = OrchestratorBuilder::new(Config::default())
            .with_subscriber(rec.clone())
            .build();

        orch.drain(None).await.unwrap();
        orch.flush_subscribers().await;

        let seen = rec.seen.lock().unwrap().clone();
        assert_eq!(seen.last(), Some(&EventKind::DrainCompleted));
    }

    #[tokio::test]
    async fn flush_without_subscribers_returns() {
        let orch = OrchestratorBuilder::new(Config::default()).build();
        orch.flush_subscribers().await;
    }
}
