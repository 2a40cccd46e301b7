use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use modeldeck_core::config::{self, Config};
use modeldeck_core::export;
use modeldeck_core::scrape::{OpenRouterSource, RefreshController, RefreshStatus, RemoteSource};
use modeldeck_core::service::http::{self, AppState};
use modeldeck_core::store::Store;

#[derive(Parser)]
#[command(
    name = "modeldeck",
    about = "Locally cached AI model catalog with a scrape pipeline and HTTP API",
    version = modeldeck_core::VERSION,
)]
struct Cli {
    /// Path to the config file (default: ~/.modeldeck/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
        /// Kick off a refresh as soon as the server is up
        #[arg(long)]
        refresh: bool,
    },
    /// Run one full refresh and wait for it to finish
    Refresh,
    /// Create the local store schema
    InitDb,
    /// Export the catalog as CSV
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("modeldeck=info".parse().unwrap())
                .add_directive("modeldeck_core=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Serve { port, refresh } => {
            if let Some(port) = port {
                cfg.server.port = port;
            }
            cmd_serve(cfg, refresh).await?;
        }
        Commands::Refresh => cmd_refresh(cfg).await?,
        Commands::InitDb => cmd_init_db(cfg)?,
        Commands::Export { output } => cmd_export(cfg, output)?,
    }

    Ok(())
}

async fn cmd_serve(config: Config, refresh_on_start: bool) -> Result<()> {
    let store = Store::new(config.database_path());
    store.initialize()?;

    let state = Arc::new(AppState {
        source: Arc::new(OpenRouterSource::new(config.clone())),
        refresh: Arc::new(RefreshController::new()),
        store,
        config,
    });

    if refresh_on_start {
        state.refresh.refresh_all(
            state.store.clone(),
            state.source.clone(),
            state.config.clone(),
        );
    }

    http::serve(state).await
}

async fn cmd_refresh(config: Config) -> Result<()> {
    let store = Store::new(config.database_path());
    store.initialize()?;

    let controller = Arc::new(RefreshController::new());
    let source: Arc<dyn RemoteSource> = Arc::new(OpenRouterSource::new(config.clone()));
    if !controller.refresh_all(store.clone(), source, config) {
        anyhow::bail!("a refresh is already running");
    }

    tracing::info!("Waiting for refresh to finish");
    while controller.status() != RefreshStatus::Idle {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    println!("Catalog refreshed: {} models", store.model_count());
    Ok(())
}

fn cmd_init_db(config: Config) -> Result<()> {
    let store = Store::new(config.database_path());
    store.initialize()?;
    println!("Store initialized at {}", config.database_path().display());
    Ok(())
}

fn cmd_export(config: Config, output: Option<PathBuf>) -> Result<()> {
    let store = Store::new(config.database_path());
    let bytes = export::export_models_csv(&store);
    match output {
        Some(path) => {
            std::fs::write(&path, &bytes)?;
            println!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&bytes)?;
        }
    }
    Ok(())
}
