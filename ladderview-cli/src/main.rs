//! Ladderview CLI - Command-line interface
//!
//! Runs the detection, ladder and relabelling logic outside the browser,
//! and replays whole playback sessions against the simulated player.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use ladderview_core::LadderviewConfig;
use ladderview_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "ladderview")]
#[command(about = "Inspect video URLs and quality menu relabelling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,

    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Console log level
    #[arg(long, value_enum, default_value_t = CliLogLevel::Warn)]
    log_level: CliLogLevel,

    /// Also write a full trace log into this directory
    #[arg(long)]
    logs_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = cli.log_level.as_tracing_level();

    init_tracing(level, cli.logs_dir.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;

    let config = match &cli.config {
        Some(path) => {
            let mut config = LadderviewConfig::from_file(path)?;
            config.apply_env_overrides();
            config
        }
        None => LadderviewConfig::from_env(),
    };

    commands::handle_command(cli.command, &config)
}
