//! Package manager abstraction
//!
//! Provisioning needs two operations from the package manager: create an
//! empty venv, and install the application distribution into it. The trait
//! keeps the provisioner testable without a Python toolchain.

use crate::error::{BootError, BootResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use super::Venv;

/// Inputs that determine what ends up in the venv
#[derive(Debug, Clone)]
pub struct InstallRequest {
    /// Distribution to install (project directory, wheel or sdist)
    pub source: PathBuf,

    /// Interpreter request for venv creation
    pub python: Option<String>,

    /// uv link mode
    pub link_mode: String,

    /// uv cache directory, if one should be forced
    pub cache_dir: Option<PathBuf>,
}

/// Creates venvs and installs packages into them
#[async_trait]
pub trait Installer: Send + Sync {
    /// Create a fresh venv at `venv`
    async fn create_venv(&self, venv: &Venv, request: &InstallRequest) -> BootResult<()>;

    /// Install `request.source` into an existing venv
    async fn install(&self, venv: &Venv, request: &InstallRequest) -> BootResult<()>;

    /// Human-readable tool name for logs
    fn name(&self) -> &'static str;
}

/// Installer backed by the `uv` CLI
pub struct UvInstaller {
    uv: PathBuf,
}

impl UvInstaller {
    pub fn new(uv: impl Into<PathBuf>) -> Self {
        Self { uv: uv.into() }
    }

    /// Run uv with output captured; stdout belongs to the runner later on
    async fn exec(&self, args: &[String], request: &InstallRequest) -> BootResult<std::process::Output> {
        debug!("Executing: {} {:?}", self.uv.display(), args);

        let mut cmd = Command::new(&self.uv);
        cmd.args(args)
            .env("UV_LINK_MODE", &request.link_mode)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref cache) = request.cache_dir {
            cmd.env("UV_CACHE_DIR", cache);
        }

        cmd.output()
            .await
            .map_err(|e| BootError::command_failed(format!("{} {}", self.uv.display(), args.join(" ")), e))
    }
}

#[async_trait]
impl Installer for UvInstaller {
    async fn create_venv(&self, venv: &Venv, request: &InstallRequest) -> BootResult<()> {
        info!("Creating virtual environment at {}", venv);

        let mut args = vec!["venv".to_string()];
        if let Some(ref python) = request.python {
            args.push("--python".to_string());
            args.push(python.clone());
        }
        args.push(venv.path().to_string_lossy().into_owned());

        let output = self.exec(&args, request).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(BootError::VenvCreate {
                path: venv.path().to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    async fn install(&self, venv: &Venv, request: &InstallRequest) -> BootResult<()> {
        info!("Installing {} into {}", request.source.display(), venv);

        let source_exists = tokio::fs::try_exists(&request.source)
            .await
            .map_err(|e| BootError::io(format!("checking {}", request.source.display()), e))?;
        if !source_exists {
            return Err(BootError::Install {
                source_path: request.source.clone(),
                venv: venv.path().to_path_buf(),
                stderr: "distribution not found".to_string(),
            });
        }

        let args = vec![
            "pip".to_string(),
            "install".to_string(),
            "--python".to_string(),
            venv.path().to_string_lossy().into_owned(),
            request.source.to_string_lossy().into_owned(),
        ];

        let output = self.exec(&args, request).await?;
        if output.status.success() {
            debug!("{}", String::from_utf8_lossy(&output.stderr).trim());
            Ok(())
        } else {
            Err(BootError::Install {
                source_path: request.source.clone(),
                venv: venv.path().to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "uv"
    }
}
