//! Herald binary.
//!
//! # Usage
//!
//! ```bash
//! herald --config /etc/herald/herald.toml --profile production
//! HERALD_TELEGRAM__TOKEN=... herald --debug
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use herald_runtime::config::LogLevel;
use herald_runtime::{ConfigLoader, HeraldRuntime};

/// Moderated Telegram group relay.
#[derive(Debug, Parser)]
#[command(name = "herald", version, about)]
struct Cli {
    /// Configuration file (searched in the working and user config dirs when omitted).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. "production".
    #[arg(short, long, env = "HERALD_PROFILE")]
    profile: Option<String>,

    /// Log at debug level regardless of configuration.
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    if let Some(profile) = &cli.profile {
        loader = loader.profile(profile);
    }

    let mut config = loader.load().context("loading configuration")?;
    if cli.debug {
        config.logging.level = LogLevel::Debug;
    }

    let runtime = HeraldRuntime::from_config(config).context("invalid configuration")?;
    runtime.run().await.context("relay stopped")?;
    Ok(())
}
