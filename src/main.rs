//! Dubba CLI entry point.

use anyhow::Result;
use clap::Parser;
use dubba::cli::{commands, Cli, Commands};
use dubba::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("dubba={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.output_dir())?;

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Apply { operations } => {
            commands::run_apply(operations, settings)?;
        }

        Commands::Status => {
            commands::run_status(settings)?;
        }

        Commands::Extract { audio } => {
            commands::run_extract(audio, settings)?;
        }

        Commands::Assemble => {
            commands::run_assemble(settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
