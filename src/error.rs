//! Error types for venvboot
//!
//! All modules use `BootResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for venvboot operations
pub type BootResult<T> = Result<T, BootError>;

/// All errors that can occur while bootstrapping
#[derive(Error, Debug)]
pub enum BootError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Invalid value for {key}: {value:?} (expected one of: {expected})")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    // Project volume errors
    #[error("Project directory not found: {0}")]
    ProjectDirMissing(PathBuf),

    #[error("Project path is not a directory: {0}")]
    ProjectDirNotDirectory(PathBuf),

    // Provisioning errors
    #[error("Failed to lock {path}: {source}")]
    LockFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create virtual environment at {path}: {stderr}")]
    VenvCreate { path: PathBuf, stderr: String },

    #[error("Failed to install {source_path} into {venv}: {stderr}")]
    Install {
        source_path: PathBuf,
        venv: PathBuf,
        stderr: String,
    },

    #[error("Provisioning marker at {path} is unreadable: {reason}")]
    MarkerCorrupt { path: PathBuf, reason: String },

    // Handoff errors
    #[error("Runner executable not found: {0}")]
    RunnerNotFound(PathBuf),

    #[error("Failed to hand off to {program}: {source}")]
    Handoff {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BootError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            expected,
        }
    }

    /// Whether the failure happened after provisioning started, leaving
    /// a building sentinel behind for the next start to repair
    pub fn leaves_partial_state(&self) -> bool {
        matches!(self, Self::VenvCreate { .. } | Self::Install { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ProjectDirMissing(_) => {
                Some("Mount a writable volume at the project path, e.g. -v \"$PWD:/project\"")
            }
            Self::RunnerNotFound(_) => {
                Some("Check runner.program in the config, or run `venvboot build` for the eager strategy")
            }
            Self::CommandFailed { .. } => Some("Is uv installed and on PATH? Set install.uv to its location"),
            Self::Install { .. } | Self::VenvCreate { .. } => {
                Some("The next start will discard the partial environment and retry")
            }
            _ => None,
        }
    }
}
