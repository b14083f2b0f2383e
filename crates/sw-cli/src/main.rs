//! seedwarden: cleans up stalled, broken and retired torrents.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// seedwarden -- torrent cleanup policy engine for qBittorrent.
#[derive(Parser)]
#[command(name = "seedwarden", version, about)]
struct Cli {
    /// Config file (default: ~/.seedwarden/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log deletions instead of executing them.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one cleanup pass (default when no subcommand is given).
    Run,

    /// Show the tasks currently being monitored.
    Monitor,

    /// Print the effective configuration.
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Secrets may come from a local .env file.
    dotenv::dotenv().ok();

    let mut config = commands::load_config(cli.config.as_deref())?;
    if cli.dry_run {
        config.general.dry_run = true;
    }
    if cli.json_logs {
        config.general.json_logs = true;
    }

    if config.general.json_logs {
        sw_telemetry::logging::init_logging_json("seedwarden", &config.general.log_level);
    } else {
        sw_telemetry::logging::init_logging("seedwarden", &config.general.log_level);
    }

    match cli.command {
        None | Some(Commands::Run) => commands::run::run(&config).await?,
        Some(Commands::Monitor) => commands::monitor::run(&config)?,
        Some(Commands::Config) => commands::config::run(&config)?,
    }

    Ok(())
}
