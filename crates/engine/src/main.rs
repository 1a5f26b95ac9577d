use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use domain::services::notification::LoggingNotifier;
use petmeet_engine::config::Config;
use petmeet_engine::jobs::{ExpirySweepJob, JobScheduler, PoolMetricsJob};
use petmeet_engine::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    logging::init_logging(&config.logging);

    info!(
        "Starting PetMeet scheduling engine v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Optional Prometheus exporter
    if let Some(port) = config.metrics.port {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .install()?;
        info!(port, "Prometheus metrics exporter listening");
    }

    // Create database pool
    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    // Run migrations
    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    // Start the background jobs. This process owns the expiry sweep; the
    // request-facing operations are served by the transport layer embedding
    // the SchedulingEngine as a library.
    let notifier = Arc::new(LoggingNotifier::new());
    let mut scheduler = JobScheduler::new();
    scheduler.register(ExpirySweepJob::new(
        pool.clone(),
        notifier,
        &config.scheduling,
    ));
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    shutdown_signal().await;
    info!("Shutdown signal received");

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(30)).await;

    pool.close().await;
    info!("PetMeet scheduling engine stopped");
    Ok(())
}

/// Completes on SIGTERM or ctrl-c.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
