//! Start command - prepare the environment and hand off to the runner

use crate::bootstrap::Bootstrap;
use crate::cli::args::StartArgs;
use crate::config::Config;
use crate::error::BootResult;
use crate::handoff::launcher_for;
use crate::provision::UvInstaller;
use tracing::debug;

/// Execute the start command, returning the runner's exit code.
///
/// With the exec handoff this only returns on failure.
pub async fn execute(args: StartArgs, config: Config) -> BootResult<i32> {
    let config = apply_overrides(config, &args);
    debug!(
        "Starting with {} strategy against {}",
        config.bootstrap.strategy,
        config.project.dir.display()
    );

    let launcher = launcher_for(config.bootstrap.handoff);
    let installer = UvInstaller::new(config.install.uv.clone());
    let boot = Bootstrap::new(config, installer);

    boot.run(launcher.as_ref()).await
}

/// Command-line flags take precedence over file and environment
fn apply_overrides(mut config: Config, args: &StartArgs) -> Config {
    if let Some(strategy) = args.strategy {
        config.bootstrap.strategy = strategy;
    }
    if let Some(ref dir) = args.project_dir {
        config.project.dir = dir.clone();
    }
    if let Some(handoff) = args.handoff {
        config.bootstrap.handoff = handoff;
    }
    config
}
