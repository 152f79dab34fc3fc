use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::{router, AppState};
use crate::config::{AppConfig, LogFormat};
use crate::database::{DatabaseManager, MemberStoreHandle, MemoryMemberStore, PgMemberStore};

#[derive(Parser)]
#[command(name = "bmup-setting")]
#[command(about = "PTM BMUP Setting API - member directory service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API (default)")]
    Serve(ServeArgs),

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Apply database migrations before serving")]
    pub migrate: bool,

    #[arg(long, conflicts_with = "migrate", help = "Serve from a process-local store instead of Postgres")]
    pub in_memory: bool,
}

/// Installs the global subscriber. `RUST_LOG` wins over the default `info` level.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => serve(args, config).await,
        Commands::Migrate => migrate(config).await,
    }
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    let manager = DatabaseManager::connect(&config.database).await?;
    manager.migrate().await?;
    manager.close().await;
    Ok(())
}

async fn serve(args: ServeArgs, mut config: AppConfig) -> anyhow::Result<()> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    info!("Starting PTM BMUP Setting API in {} mode", config.environment.as_str());

    let (store, manager): (MemberStoreHandle, Option<DatabaseManager>) = if args.in_memory {
        info!("Using in-memory member store");
        (Arc::new(MemoryMemberStore::new()), None)
    } else {
        let manager = DatabaseManager::connect(&config.database).await?;
        if args.migrate {
            manager.migrate().await?;
        }
        let store = PgMemberStore::new(manager.clone(), config.database.slow_query_threshold_ms);
        (Arc::new(store), Some(manager))
    };

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);

    let app = router(AppState::new(config, store));
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(manager) = manager {
        manager.close().await;
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining connections");
}
