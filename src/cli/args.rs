//! CLI argument definitions using clap derive

use crate::config::{HandoffMode, Strategy};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// venvboot - container entrypoint for mcp-python-runner
///
/// Provisions a Python virtual environment in the project volume (or uses
/// one baked into the image) and hands off to the runner.
#[derive(Parser, Debug)]
#[command(name = "venvboot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute (defaults to `start`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "VENVBOOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, env = "VENVBOOT_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare the environment and hand off to the runner
    Start(StartArgs),

    /// Provision the image-baked environment (run at image build time)
    Build(BuildArgs),

    /// Report layout and provisioning state
    Status(StatusArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the start command
#[derive(Parser, Debug, Default)]
pub struct StartArgs {
    /// Provisioning strategy
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Project volume mount point
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// How to hand off to the runner
    #[arg(long)]
    pub handoff: Option<HandoffMode>,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Where to create the image environment
    #[arg(long)]
    pub venv: Option<PathBuf>,

    /// Distribution to install
    #[arg(long)]
    pub source: Option<PathBuf>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration (file + environment)
    Show,

    /// Show configuration file path
    Path,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}
