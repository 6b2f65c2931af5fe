//! rowcast-gateway server entry point.
//!
//! Starts the Axum HTTP server, the polling detection loop, and the
//! insert-notification consumer.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::{broadcast, watch};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use rowcast_gateway::api;
use rowcast_gateway::app_state::AppState;
use rowcast_gateway::config::GatewayConfig;
use rowcast_gateway::domain::EventBus;
use rowcast_gateway::persistence::{RecordStore, TrackingStore};
use rowcast_gateway::service::{ChangeDetector, Dispatcher, RecordService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting rowcast-gateway");

    // Connect to PostgreSQL; the watermark store is mandatory, so a
    // failure here is fatal.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;

    // Build persistence and service layers
    let tracking = TrackingStore::new(pool.clone());
    let records = RecordStore::new(pool);
    let dispatcher = Dispatcher::from_config(config.webhook.as_ref(), config.email.clone())?;
    tracing::info!(sinks = dispatcher.sink_count(), "notification sinks configured");

    let event_bus = EventBus::new(config.event_bus_capacity);
    let record_service = Arc::new(RecordService::new(
        records.clone(),
        event_bus.clone(),
        &config,
    ));
    let detector = Arc::new(ChangeDetector::new(
        records,
        tracking.clone(),
        dispatcher.clone(),
        config.watched_tables.clone(),
        config.batch_limit,
    ));

    // Boot reconciliation: schema, registration, watermark hydration.
    detector.hydrate().await?;

    // Background loops
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = tokio::spawn(poll_loop(
        Arc::clone(&detector),
        config.poll_interval_secs,
        shutdown_rx,
    ));
    tokio::spawn(notify_loop(
        event_bus.subscribe(),
        dispatcher,
        Arc::clone(&detector),
    ));

    // Build application state and router
    let app_state = AppState::new(record_service, Arc::clone(&detector), tracking);
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let an in-flight detection cycle finish before exiting, within the
    // configured grace period.
    shutdown_tx.send(true).ok();
    let grace = Duration::from_secs(config.shutdown_grace_secs);
    if tokio::time::timeout(grace, poller).await.is_err() {
        tracing::warn!("detection loop did not stop within the grace period");
    }
    tracing::info!("shutdown complete");

    Ok(())
}

/// Runs a detection cycle on every tick until shutdown is signalled.
///
/// The cycle branch runs to completion before the select is re-entered,
/// so shutdown never interrupts a cycle mid-table.
async fn poll_loop(
    detector: Arc<ChangeDetector>,
    interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = detector.run_cycle().await;
                let detected: usize = report.tables.iter().map(|t| t.detected).sum();
                let failed: usize = report.tables.iter().map(|t| t.failed).sum();
                if detected > 0 || failed > 0 {
                    tracing::info!(detected, failed, "detection cycle finished");
                } else {
                    tracing::debug!("detection cycle finished, no changes");
                }
            }
            _ = shutdown.changed() => {
                tracing::info!("detection loop stopping");
                return;
            }
        }
    }
}

/// Consumes insert events published by the CRUD path and pushes them to
/// the sinks. After a fully successful delivery the detector is told, so
/// the watermark moves past the row and the next poll does not deliver
/// it again. Failures (and gaps) are left to the polling backstop.
async fn notify_loop(
    mut rx: broadcast::Receiver<rowcast_gateway::domain::ChangeEvent>,
    dispatcher: Dispatcher,
    detector: Arc<ChangeDetector>,
) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if dispatcher.dispatch(&event).await.all_succeeded() {
                    if let Err(err) = detector
                        .note_synchronous_delivery(&event.table, event.row_id)
                        .await
                    {
                        tracing::warn!(
                            table = %event.table,
                            row_id = event.row_id,
                            error = %err,
                            "failed to record synchronous delivery"
                        );
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "insert notifier lagged, events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::debug!("event bus closed, insert notifier stopping");
                return;
            }
        }
    }
}

/// Resolves when Ctrl-C (or SIGTERM-equivalent) is received.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to install shutdown handler");
    }
}
