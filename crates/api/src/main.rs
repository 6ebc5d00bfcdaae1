//! Jet-Engine RUL Service - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, Settings};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rul-service")]
#[command(about = "Remaining Useful Life prediction service for jet-engine telemetry")]
#[command(version)]
struct CliArgs {
    /// TOML config file (default: rul-service.toml if present)
    #[arg(short, long, env = "RUL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the server address
    #[arg(short, long)]
    addr: Option<String>,

    /// Serve the deterministic mock model instead of loading artifacts
    #[arg(long)]
    mock: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let mut settings = Settings::load_validated(args.config.as_deref()).context("loading configuration")?;
    if let Some(addr) = args.addr {
        settings.server.addr = addr;
    }
    if args.mock {
        settings.model.use_mock = true;
    }

    init_logging(&settings.logging)?;
    info!("=== Jet-Engine RUL Service v{} ===", env!("CARGO_PKG_VERSION"));

    run_server(settings).await?;
    Ok(())
}
