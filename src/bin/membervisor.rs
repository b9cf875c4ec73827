use std::sync::Arc;

use anyhow::Result;
use membervisor::{
    Config, LifecycleController, LogWriter, Orchestrator, ShutdownOutcome,
    fulfillment::{
        FulfillmentConfig, LogNotifier, PlanRef, Staging, SubscriptionEvent,
        SubscriptionFulfillment, TemplateManualProducer, UserRef,
    },
};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    std::env::args().for_each(|arg| {
        if arg == "--version" {
            println!("{}", env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }
    });

    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "membervisor=info".into()),
    );
    let fmt_layer = if std::env::var("JSON_LOGS").is_ok() {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_thread_ids(true)
            .with_thread_names(true)
            .boxed()
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let config = Config::from_env()?;
    let fulfillment_config = FulfillmentConfig::from_env()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        grace = ?config.grace,
        staging_dir = %fulfillment_config.staging_dir.display(),
        "starting membervisor"
    );

    let orchestrator = Orchestrator::builder(config)
        .with_subscriber(Arc::new(LogWriter))
        .build();
    let lifecycle = LifecycleController::new(Arc::clone(&orchestrator));
    let error_logger = lifecycle.spawn_error_logger();

    let fulfillment = SubscriptionFulfillment::new(
        Arc::new(LogNotifier),
        Arc::new(TemplateManualProducer::new(fulfillment_config.render_delay)),
        Staging::new(fulfillment_config.staging_dir),
    );

    // Sample subscription so a local run exercises both fulfillment tasks.
    let event = SubscriptionEvent::new(
        UserRef {
            id: 1,
            email: "admin@example.com".into(),
            first_name: "Admin".into(),
            last_name: "User".into(),
        },
        PlanRef {
            id: 1,
            name: "Bronze Plan".into(),
            formatted_amount: "$10.00".into(),
        },
    );
    fulfillment.fulfill(&orchestrator, event)?;

    match lifecycle.run_until_signal().await {
        ShutdownOutcome::Drained => {
            let failures = error_logger.await.unwrap_or_default();
            tracing::info!(failures, "all background tasks finished; exiting");
            Ok(())
        }
        ShutdownOutcome::Forced { stuck } => {
            tracing::warn!(stuck = ?stuck, "exiting with background tasks still running");
            std::process::exit(1);
        }
    }
}
