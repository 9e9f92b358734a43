//! soundcheck - natural-language music-production requests in, DAW actions out
//!
//! Config resolution starts from compiled defaults, layers
//! `/etc/soundcheck/config.toml`, `~/.config/soundcheck/config.toml`, and
//! `./soundcheck.toml` (or the `--config` path) on top, and applies `PORT`,
//! `OPENAI_API_KEY`, `AUTH_MODE`, and `SOUNDCHECK_*` environment variables
//! last. See the soundconf crate for the details.

use anyhow::{Context, Result};
use clap::Parser;
use soundconf::SoundConfig;
use std::path::PathBuf;

/// Natural-language to DAW-action translation server
#[derive(Parser)]
#[command(name = "soundcheck")]
#[command(about = "Natural-language to DAW-action translation server")]
#[command(version)]
struct Cli {
    /// Path to config file (overrides ./soundcheck.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Show loaded configuration and exit
    #[arg(long)]
    show_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = SoundConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if cli.show_config {
        match sources.files.as_slice() {
            [] => println!("# no config files found; compiled defaults plus environment"),
            files => {
                println!("# merged from, later wins:");
                for path in files {
                    println!("#   {}", path.display());
                }
            }
        }
        for var in &sources.env_overrides {
            println!("# {var} taken from the environment");
        }
        print!("{}", config.to_toml());
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.telemetry.log_level)),
        )
        .init();

    tracing::info!(
        files = ?sources.files,
        env = ?sources.env_overrides,
        "configuration resolved"
    );

    soundcheck::run(config).await
}
