//! Handoff to the runner
//!
//! The last thing a bootstrap does. With `exec` the bootstrap process
//! becomes the runner; with `supervise` it stays as a thin parent that
//! forwards signals and mirrors the runner's exit status.

mod exec;
mod supervise;

pub use exec::ExecLauncher;
pub use supervise::SuperviseLauncher;

use crate::config::{Config, HandoffMode};
use crate::error::{BootError, BootResult};
use crate::layout::Layout;
use crate::provision::Venv;
use async_trait::async_trait;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fully resolved runner command line and environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Added to (or replacing entries of) the inherited environment
    pub env: Vec<(OsString, OsString)>,
}

impl Invocation {
    /// Build the runner invocation for a prepared layout
    pub fn for_runner(config: &Config, layout: &Layout) -> BootResult<Self> {
        let program = resolve_program(&config.runner.program, &layout.venv)?;

        let mut args = Vec::with_capacity(2);
        if let Some(ref flag) = config.runner.dir_flag {
            args.push(OsString::from(flag));
        }
        args.push(layout.project_dir.clone().into_os_string());

        let mut env_vars = vec![
            (
                OsString::from("VIRTUAL_ENV"),
                layout.venv.path().as_os_str().to_owned(),
            ),
            (OsString::from("PATH"), prepend_path(&layout.venv.bin_dir())?),
            (
                OsString::from("UV_CACHE_DIR"),
                layout.cache_dir.as_os_str().to_owned(),
            ),
            (
                OsString::from("UV_LINK_MODE"),
                OsString::from(&config.install.link_mode),
            ),
        ];
        if !config.install.python_path.is_empty() {
            let joined = env::join_paths(&config.install.python_path).map_err(|e| {
                BootError::invalid_value(
                    "install.python_path",
                    e.to_string(),
                    "paths without the separator character",
                )
            })?;
            env_vars.push((OsString::from("PYTHONPATH"), joined));
        }

        Ok(Self {
            program,
            args,
            env: env_vars,
        })
    }
}

/// Runs the runner and reports how it ended
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Hand off to `invocation`; returns the exit code to propagate.
    /// Replacing launchers only return on failure.
    async fn launch(&self, invocation: Invocation) -> BootResult<i32>;

    fn mode(&self) -> HandoffMode;
}

/// Create the launcher for a handoff mode
pub fn launcher_for(mode: HandoffMode) -> Box<dyn Launcher> {
    match mode {
        HandoffMode::Exec => Box::new(ExecLauncher),
        HandoffMode::Supervise => Box::new(SuperviseLauncher),
    }
}

/// Locate the runner executable.
///
/// Paths are used as given. Bare names are looked up in the venv's bin
/// directory first, then on `PATH`.
pub fn resolve_program(program: &Path, venv: &Venv) -> BootResult<PathBuf> {
    if program.components().count() > 1 {
        return if program.is_file() {
            Ok(program.to_path_buf())
        } else {
            Err(BootError::RunnerNotFound(program.to_path_buf()))
        };
    }

    let in_venv = venv.bin_dir().join(program);
    if in_venv.is_file() {
        debug!("Runner resolved in venv: {}", in_venv.display());
        return Ok(in_venv);
    }

    env::var_os("PATH")
        .into_iter()
        .flat_map(|paths| env::split_paths(&paths).collect::<Vec<_>>())
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| BootError::RunnerNotFound(program.to_path_buf()))
}

fn prepend_path(dir: &Path) -> BootResult<OsString> {
    let mut paths = vec![dir.to_path_buf()];
    if let Some(existing) = env::var_os("PATH") {
        paths.extend(env::split_paths(&existing).filter(|p| p != dir));
    }
    env::join_paths(paths)
        .map_err(|e| BootError::invalid_value("PATH", e.to_string(), "paths without the separator character"))
}
