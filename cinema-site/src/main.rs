//! cinema-site - movie catalog web service
//!
//! Serves the public catalog pages, the review form endpoint and the
//! back-office API from one process backed by `<root>/cinema.db`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cinema_common::api::load_shared_secret;
use cinema_common::config::{Overrides, RootFolderInitializer, SiteConfig};
use cinema_site::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for cinema-site
#[derive(Parser, Debug)]
#[command(name = "cinema-site")]
#[command(about = "Movie catalog site with threaded reviews")]
#[command(version)]
struct Args {
    /// Root folder holding cinema.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "CINEMA_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long)]
    bind: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = SiteConfig::resolve(&Overrides {
        root_folder: args.root_folder,
        port: args.port,
        bind_address: args.bind,
        config_file: args.config,
    });

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting cinema-site v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let pool = cinema_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let shared_secret = load_shared_secret(&pool)
        .await
        .context("Failed to load back-office shared secret")?;
    if shared_secret == 0 {
        info!("Back-office authentication disabled (shared_secret = 0)");
    }

    if config.reject_invalid_reviews {
        info!("Invalid review submissions are rejected with 422");
    }

    let state = AppState::new(pool, shared_secret)
        .with_reject_invalid_reviews(config.reject_invalid_reviews);
    let app = build_router(state);

    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("cinema-site listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
