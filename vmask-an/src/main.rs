//! Anonymization service (vmask-an) - Main entry point
//!
//! Hosts the segment replacement pipeline and the annotation agreement
//! engine behind an HTTP API. Surrogate clips are indexed once at startup;
//! annotation sets and agreement records persist in SQLite.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vmask_an::api::{self, AppContext};
use vmask_an::config::Config;
use vmask_an::replace::ReplacementEngine;
use vmask_an::surrogate::inventory;

/// Command-line arguments for vmask-an
#[derive(Parser, Debug)]
#[command(name = "vmask-an")]
#[command(about = "Voice anonymization microservice for VMask")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5840", env = "VMASK_AN_PORT")]
    port: u16,

    /// Root folder holding the database, surrogate library and output files
    #[arg(short, long, env = "VMASK_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Surrogate clip library (defaults to <root>/surrogates)
    #[arg(long, env = "VMASK_SURROGATES")]
    surrogates: Option<PathBuf>,

    /// Database file (defaults to <root>/vmask.db)
    #[arg(long, env = "VMASK_DB")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vmask_an=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let root_folder = vmask_common::config::resolve_root_folder(
        args.root_folder.as_ref().and_then(|p| p.to_str()),
        "VMASK_ROOT_FOLDER",
    )
    .context("Failed to resolve root folder")?;

    let config = Arc::new(Config::new(
        root_folder,
        args.port,
        args.surrogates,
        args.database,
    ));

    info!("Starting VMask anonymizer on port {}", config.port);
    info!("Root folder: {}", config.root_folder.display());

    // Anonymized output files land here
    std::fs::create_dir_all(&config.root_folder).context("Failed to create root folder")?;

    let db_pool = vmask_common::db::init_database(&config.db_path)
        .await
        .context("Failed to initialize database")?;

    let clips = inventory::scan_surrogate_root(&config.surrogates_root)
        .context("Failed to scan surrogate library")?;
    let engine = Arc::new(ReplacementEngine::new(Arc::new(clips)));
    info!("Surrogate inventory ready");

    let ctx = AppContext {
        engine,
        db_pool,
        config: config.clone(),
    };
    let app = api::create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
