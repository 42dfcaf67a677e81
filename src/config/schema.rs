//! Configuration schema for venvboot
//!
//! Configuration is read from `/etc/venvboot/config.toml` when present.
//! Every field has a default matching the stock image layout, so an empty
//! or missing file is valid.

use crate::error::{BootError, BootResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bootstrap behavior
    pub bootstrap: BootstrapConfig,

    /// Project volume layout
    pub project: ProjectConfig,

    /// Package installation settings
    pub install: InstallConfig,

    /// Eager (image-baked) environment settings
    pub eager: EagerConfig,

    /// Runner handoff settings
    pub runner: RunnerConfig,
}

/// When the virtual environment gets provisioned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// On first start against a given project directory
    #[default]
    Lazy,
    /// Once at image-build time via `venvboot build`
    Eager,
}

impl Strategy {
    pub const VARIANTS: &'static str = "lazy, eager";
}

impl FromStr for Strategy {
    type Err = BootError;

    fn from_str(s: &str) -> BootResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lazy" => Ok(Self::Lazy),
            "eager" => Ok(Self::Eager),
            _ => Err(BootError::invalid_value("strategy", s, Self::VARIANTS)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lazy => write!(f, "lazy"),
            Self::Eager => write!(f, "eager"),
        }
    }
}

/// How control passes to the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandoffMode {
    /// Replace the bootstrap process image
    Exec,
    /// Spawn, forward signals, propagate the exit code
    Supervise,
}

impl HandoffMode {
    pub const VARIANTS: &'static str = "exec, supervise";
}

impl Default for HandoffMode {
    fn default() -> Self {
        if cfg!(unix) {
            Self::Exec
        } else {
            Self::Supervise
        }
    }
}

impl FromStr for HandoffMode {
    type Err = BootError;

    fn from_str(s: &str) -> BootResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exec" => Ok(Self::Exec),
            "supervise" => Ok(Self::Supervise),
            _ => Err(BootError::invalid_value("handoff", s, Self::VARIANTS)),
        }
    }
}

impl fmt::Display for HandoffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exec => write!(f, "exec"),
            Self::Supervise => write!(f, "supervise"),
        }
    }
}

/// Bootstrap settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Provisioning strategy
    pub strategy: Strategy,

    /// Handoff mode
    pub handoff: HandoffMode,
}

/// Project volume layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Mount point of the project volume
    pub dir: PathBuf,

    /// Virtual environment location, relative to `dir` unless absolute
    pub venv: PathBuf,

    /// uv cache location, relative to `dir` unless absolute
    pub cache: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/project"),
            venv: PathBuf::from(".venv"),
            cache: PathBuf::from(".cache/uv"),
        }
    }
}

/// Package installation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// uv executable (name on PATH or absolute path)
    pub uv: PathBuf,

    /// Application distribution to install (directory, wheel or sdist)
    pub source: PathBuf,

    /// Interpreter request passed to `uv venv --python`
    pub python: Option<String>,

    /// uv link mode: copy, hardlink, symlink or clone
    pub link_mode: String,

    /// Extra interpreter search path entries
    pub python_path: Vec<PathBuf>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            uv: PathBuf::from("uv"),
            source: PathBuf::from("/app"),
            python: None,
            link_mode: "copy".to_string(),
            python_path: vec![],
        }
    }
}

/// Link modes uv understands
pub const LINK_MODES: &[&str] = &["copy", "hardlink", "symlink", "clone"];

/// Eager environment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EagerConfig {
    /// Image-baked virtual environment, outside the project volume
    pub venv: PathBuf,
}

impl Default for EagerConfig {
    fn default() -> Self {
        Self {
            venv: PathBuf::from("/opt/venv"),
        }
    }
}

/// Runner handoff settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Runner executable, looked up in the venv's bin directory first
    pub program: PathBuf,

    /// Flag placed before the project directory, e.g. `--dir`.
    /// When unset the directory is passed positionally.
    pub dir_flag: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("mcp-python-runner"),
            dir_flag: None,
        }
    }
}

impl Config {
    /// Reject values serde cannot check on its own
    pub fn validate(&self) -> BootResult<()> {
        if !LINK_MODES.contains(&self.install.link_mode.as_str()) {
            return Err(BootError::invalid_value(
                "install.link_mode",
                self.install.link_mode.clone(),
                "copy, hardlink, symlink, clone",
            ));
        }
        if self.runner.program.as_os_str().is_empty() {
            return Err(BootError::invalid_value(
                "runner.program",
                "",
                "a program name or path",
            ));
        }
        Ok(())
    }
}
