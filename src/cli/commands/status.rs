//! Status command - report layout and provisioning state

use crate::cli::args::StatusArgs;
use crate::config::{Config, Strategy};
use crate::error::BootResult;
use crate::handoff::resolve_program;
use crate::layout::Layout;
use crate::provision::ProvisionState;
use console::{style, Emoji};
use serde::Serialize;
use std::path::PathBuf;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Snapshot of what a start would find
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub strategy: Strategy,
    pub layout: Layout,
    pub project_dir_present: bool,
    pub cache_dir_present: bool,
    pub provision: ProvisionState,
    pub runner: Option<PathBuf>,
}

impl StatusReport {
    pub async fn collect(config: &Config) -> BootResult<Self> {
        let layout = Layout::from_config(config);
        let provision = layout.venv.state().await?;
        let runner = resolve_program(&config.runner.program, &layout.venv).ok();

        Ok(Self {
            strategy: config.bootstrap.strategy,
            project_dir_present: layout.project_dir.is_dir(),
            cache_dir_present: layout.cache_dir.is_dir(),
            provision,
            runner,
            layout,
        })
    }
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> BootResult<()> {
    let report = StatusReport::collect(config).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", style("venvboot status").bold().cyan());
    println!();
    println!("  Strategy:    {}", report.strategy);

    let mark = |ok: bool| if ok { &CHECK } else { &CROSS };
    println!(
        "  {}Project:   {}",
        mark(report.project_dir_present),
        report.layout.project_dir.display()
    );
    println!(
        "  {}Cache:     {}",
        if report.cache_dir_present { &CHECK } else { &WARN },
        report.layout.cache_dir.display()
    );

    let state_mark = match report.provision {
        ProvisionState::Provisioned { .. } => &CHECK,
        ProvisionState::Partial | ProvisionState::Unprovisioned => &WARN,
    };
    println!(
        "  {}Venv:      {} ({})",
        state_mark,
        report.layout.venv,
        style(&report.provision).bold()
    );
    if let ProvisionState::Provisioned { marker: Some(ref m) } = report.provision {
        println!(
            "               venvboot {}, {}, {}",
            m.version,
            m.source.display(),
            m.provisioned_at.to_rfc3339()
        );
    }

    match report.runner {
        Some(ref path) => println!("  {}Runner:    {}", CHECK, path.display()),
        None => println!(
            "  {}Runner:    {} not found",
            CROSS,
            config.runner.program.display()
        ),
    }

    Ok(())
}
