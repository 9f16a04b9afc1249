//! scriptrag CLI entry point.

use anyhow::Result;
use clap::Parser;
use scriptrag::cli::{commands, Cli, Commands};
use scriptrag::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("scriptrag={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Execute command
    match cli.command {
        Commands::Prepare { input, output, jobs } => {
            commands::run_prepare(input, output, jobs, settings).await?;
        }

        Commands::Parse { file, episode } => {
            commands::run_parse(&file, episode, &settings)?;
        }

        Commands::Chunk {
            input,
            output,
            chunk_size,
            chunk_overlap,
        } => {
            commands::run_chunk(input, output, chunk_size, chunk_overlap, &settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}
