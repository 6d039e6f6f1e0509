mod run;
mod state_cmds;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use tutor_config::{AppConfig, TelemetryConfig};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Parser)]
#[command(
    name = "tutor",
    version,
    about = "A daily Korean conversation partner on Telegram"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the bot: Telegram polling, daily topic scheduler, liveness probe.
    Run,
    /// Print the persisted session record.
    State,
    /// Delete the persisted session record.
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Write the default configuration file.
    InitConfig {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;
    let _log_guard = init_tracing(&config.telemetry)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run::run(config).await?,
        Commands::State => state_cmds::print_state(&config)?,
        Commands::Reset { yes } => state_cmds::reset(&config, yes)?,
        Commands::InitConfig { force } => state_cmds::init_config(&cli.config, force)?,
    }
    Ok(())
}

/// `RUST_LOG` wins over `telemetry.log_level`.  With `telemetry.log_dir` set,
/// logs are mirrored to a daily-rolling file; keep the guard alive until exit.
fn init_tracing(telemetry: &TelemetryConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&telemetry.log_level))?;
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    let log_dir = telemetry.log_dir.trim();
    if log_dir.is_empty() {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    }

    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, "tutor.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(Some(guard))
}
