use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::database::{MemoryStore, PgStore, Store};
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "article-api")]
#[command(about = "Article API - multi-user article publishing service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve(ServeArgs),

    #[command(about = "Create the users and articles tables, then exit")]
    InitDb {
        #[arg(long, env = "DATABASE_URL", help = "PostgreSQL connection URL")]
        database_url: String,
    },
}

#[derive(Args, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Bind host (overrides HOST)")]
    pub host: Option<String>,

    #[arg(long, help = "Bind port (overrides PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "PostgreSQL connection URL (overrides DATABASE_URL)")]
    pub database_url: Option<String>,
}

impl ServeArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = self.database_url {
            config.database.url = Some(url);
        }
    }
}

pub async fn run(cli: Cli, mut config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => {
            args.apply(&mut config);
            serve(config).await
        }
        Commands::InitDb { database_url } => {
            let store = PgStore::connect(&database_url, &config.database)
                .await
                .context("failed to connect to database")?;
            store.init_schema().await.context("failed to create tables")?;
            store.close().await;
            Ok(())
        }
    }
}

/// Build the configured store; PostgreSQL tables are created if missing
async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    match &config.database.url {
        Some(url) => {
            let store = PgStore::connect(url, &config.database)
                .await
                .context("failed to connect to database")?;
            store.init_schema().await.context("failed to create tables")?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;
    info!("Starting Article API in {:?} mode", config.environment);

    let store = build_store(&config).await?;
    let bind_addr = config.bind_address();
    let app = crate::app(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Article API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
