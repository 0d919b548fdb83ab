//! keepsake server.
//!
//! Stores messages, memories with photos, and the background setting, and
//! serves the uploaded photos back.

use std::net::SocketAddr;

use keepsake::config::{Config, LogFormat};
use keepsake::services::{start_reconcile_task, SweepMode};
use keepsake::{api, AppState, Error, Result};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(config.logging.format);
    info!(
        "Starting keepsake server on {}:{}",
        config.server.host, config.server.port
    );

    // Initialize application state
    let state = AppState::new(&config).await?;
    info!(blobs = state.blobs.backend(), "Application state initialized");

    // Start the reconciliation sweep
    let sweep_task = config.reconcile.interval.map(|interval| {
        let mode = if config.reconcile.repair {
            SweepMode::Repair
        } else {
            SweepMode::Report
        };
        start_reconcile_task(state.reconcile.clone(), interval, mode)
    });
    if sweep_task.is_none() {
        info!("Reconciliation sweep disabled");
    }

    // Build router
    let app = api::router(state.clone());

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Validation(format!("Invalid listen address: {}", e)))?;

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, shutting down");

    if let Some(task) = sweep_task {
        task.abort();
    }

    if tokio::time::timeout(config.server.shutdown_timeout, state.close())
        .await
        .is_err()
    {
        warn!(
            timeout_secs = config.server.shutdown_timeout.as_secs(),
            "Database pool did not close in time"
        );
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "keepsake=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
