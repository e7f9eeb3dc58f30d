//! # Dispatch Server
//!
//! Loads configuration, initializes logging and serves the dispatch API until Ctrl-C.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use dispatch_core::config::{ConfigManager, ConfigurationError, DispatchConfig};
use dispatch_core::logging::init_structured_logging;
use dispatch_core::web::{self, AppState};

#[derive(Parser)]
#[command(name = "dispatch-server")]
#[command(about = "Discover peers and dispatch requests to them, streaming progress over SSE")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration directory (default: $DISPATCH_CONFIG_DIR or ./config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Environment whose overrides are applied
    #[arg(short, long, env = "DISPATCH_ENV", default_value = "development")]
    environment: String,

    /// Bind address, overriding server.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging reads the environment from the process before any worker thread exists
    std::env::set_var("DISPATCH_ENV", &cli.environment);
    init_structured_logging();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;
    if let Some(bind) = &cli.bind {
        config.server.bind_address = bind.clone();
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("dispatch-core/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_millis(config.discovery.per_call_timeout_ms))
        .build()
        .context("failed to build HTTP client")?;

    let bind_address = config.server.bind_address.clone();
    let state = AppState::from_config(config, &cli.environment, client)
        .context("failed to initialize application state")?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    info!(
        environment = %cli.environment,
        bind_address = %bind_address,
        "Starting dispatch server"
    );
    web::serve(listener, state, shutdown_signal()).await?;
    info!("Dispatch server stopped");
    Ok(())
}

/// Configuration from disk; a missing file falls back to the built-in defaults
fn load_config(cli: &Cli) -> anyhow::Result<DispatchConfig> {
    match ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &cli.environment) {
        Ok(manager) => Ok(manager.config().clone()),
        Err(ConfigurationError::ConfigFileNotFound { searched_paths }) => {
            warn!(
                searched = ?searched_paths,
                "No configuration file found, using built-in defaults"
            );
            let manager = ConfigManager::from_config(DispatchConfig::default(), &cli.environment)?;
            Ok(manager.config().clone())
        }
        Err(e) => Err(e).context("failed to load configuration"),
    }
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "Failed to install Ctrl-C handler, serving until killed");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, shutting down");
}
