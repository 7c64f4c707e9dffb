use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use taskboard_server::{AppState, ServerConfig};
use taskboard_store::Database;
use taskboard_telemetry::TelemetryConfig;
use tracing::Level;

/// Task board HTTP backend.
#[derive(Debug, Parser)]
#[command(name = "taskboard", version)]
struct Cli {
    /// JSON settings file merged over the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on.
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database file.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Default log level (RUST_LOG takes precedence).
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Log as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn apply_to(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(db) = &self.db {
            config.db_path = db.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    taskboard_telemetry::init_telemetry(&TelemetryConfig {
        log_level: cli.log_level,
        json: cli.log_json,
        ..TelemetryConfig::default()
    })?;

    let mut config =
        taskboard_server::load_config(cli.config.as_deref()).context("loading settings")?;
    cli.apply_to(&mut config);

    tracing::info!(db = %config.db_path.display(), "starting taskboard");

    let db = Database::open(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path.display()))?;

    let handle = taskboard_server::start(&config, AppState::new(db))
        .await
        .with_context(|| format!("binding {}", config.bind_addr()))?;

    tracing::info!(port = handle.port, "taskboard ready");

    tokio::signal::ctrl_c()
        .await
        .context("listening for ctrl+c")?;

    tracing::info!("shutting down");
    handle.shutdown().await;
    Ok(())
}
