//! Build command - provision the image-baked environment
//!
//! Meant for a `RUN venvboot build` line in the image definition, so that
//! containers started with the eager strategy never provision anything.

use crate::bootstrap::Bootstrap;
use crate::cli::args::BuildArgs;
use crate::config::{Config, Strategy};
use crate::error::BootResult;
use crate::provision::{Outcome, UvInstaller};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");

/// Execute the build command
pub async fn execute(args: BuildArgs, config: Config) -> BootResult<()> {
    let config = build_config(config, &args);
    let installer = UvInstaller::new(config.install.uv.clone());
    let boot = Bootstrap::new(config, installer);

    let outcome = boot.build().await?;
    let venv = &boot.layout().venv;

    match outcome {
        Outcome::Provisioned(marker) => println!(
            "{} Provisioned {} from {} ({})",
            CHECK,
            style(venv).bold(),
            marker.source.display(),
            style(&marker.fingerprint).dim()
        ),
        Outcome::AlreadyProvisioned { .. } => {
            println!("{} {} is already provisioned", CHECK, style(venv).bold())
        }
    }

    Ok(())
}

/// Build always targets the eager environment
fn build_config(mut config: Config, args: &BuildArgs) -> Config {
    config.bootstrap.strategy = Strategy::Eager;
    if let Some(ref venv) = args.venv {
        config.eager.venv = venv.clone();
    }
    if let Some(ref source) = args.source {
        config.install.source = source.clone();
    }
    config
}
