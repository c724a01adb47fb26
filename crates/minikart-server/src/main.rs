#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use server::config::{CliArgs, ServerConfig};
use server::state::AppState;
use server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    init_telemetry();

    let state = AppState::new(config)?;

    if state.config.seed {
        let report = server::seed::run(&state)?;
        tracing::info!(
            "seed complete: {} accounts backfilled, admin {}, {} products",
            report.backfilled,
            if report.admin_created {
                "created"
            } else {
                "already present"
            },
            report.products
        );
        return Ok(());
    }

    if state.config.backfill {
        let updated = state.allocator.backfill(&state.store)?;
        tracing::info!("backfill complete: {updated} accounts updated");
        return Ok(());
    }

    let app = server::routes::router(state.clone());
    let listener = TcpListener::bind(state.config.addr).await?;
    tracing::info!("Starting storefront API on {}", state.config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
}
