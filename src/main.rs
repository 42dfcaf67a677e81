//! venvboot - container entrypoint
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use venvboot::cli::{Cli, Commands, LogFormat};
use venvboot::config::ConfigManager;
use venvboot::error::BootResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> BootResult<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // Dispatch to command; no subcommand is the container entrypoint case
    match cli.command {
        None => venvboot::cli::commands::start(Default::default(), config).await,
        Some(Commands::Start(args)) => venvboot::cli::commands::start(args, config).await,
        Some(Commands::Build(args)) => venvboot::cli::commands::build(args, config).await.map(|_| 0),
        Some(Commands::Status(args)) => venvboot::cli::commands::status(args, &config).await.map(|_| 0),
        Some(Commands::Config(args)) => venvboot::cli::commands::config(args, &config, &config_manager)
            .await
            .map(|_| 0),
    }
}

/// Logs go to stderr: the runner speaks its protocol over stdout.
/// `VENVBOOT_LOG` overrides the verbosity flags.
fn init_logging(verbose: u8, format: LogFormat) {
    let filter = EnvFilter::try_from_env("VENVBOOT_LOG").unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("venvboot=info"),
        1 => EnvFilter::new("venvboot=debug"),
        _ => EnvFilter::new("venvboot=trace"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.without_time().init(),
        LogFormat::Json => builder.json().init(),
    }
}
