//! Storefront Server
//!
//! This binary:
//! - Loads configuration from the environment (and `.env`)
//! - Starts the Prometheus exporter on `METRICS_PORT`
//! - Connects to `PostgreSQL`, or seeds in-memory stores when `DATABASE_URL` is unset
//! - Serves the HTTP API until Ctrl+C or SIGTERM, then closes the pool
//!
//! # Usage
//!
//! ```bash
//! AUTH_TOKENS="admin-token=admin:admin,john-token=john" cargo run --bin storefront-server
//! ```

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use storefront_orders::metrics::register_business_metrics;
use storefront_orders::{Config, Resources, build_router};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_orders=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting storefront server...");

    let config = Config::from_env()?;
    info!(
        address = %config.server_address(),
        database = config.database.url.is_some(),
        tax_rate_bps = config.checkout.pricing.tax_rate_bps,
        "Configuration loaded"
    );

    let metrics_addr: SocketAddr = config.metrics_address().parse()?;
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
        )?
        .install()?;
    register_business_metrics();
    info!(addr = %metrics_addr, "✓ Metrics exporter listening");

    let resources = Resources::from_config(&config).await?;
    let app = build_router(resources.app_state(&config));

    let listener = tokio::net::TcpListener::bind(config.server_address()).await?;
    info!(address = %config.server_address(), "✓ Storefront server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, releasing resources...");
    if tokio::time::timeout(config.shutdown_timeout(), resources.close())
        .await
        .is_err()
    {
        error!("Timed out closing resources");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        () = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
