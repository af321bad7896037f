//! `verify` command implementation.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::core::types::Step;
use crate::exit_codes;
use crate::io::config::{DEFAULT_CONFIG_FILE, Overrides, VerifyConfig, load_config, write_config};
use crate::io::launcher::ProcessLauncher;
use crate::io::report::{RunReport, write_report};
use crate::run::{exit_code, run_steps};

/// Options gathered from the command line.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub config: Option<PathBuf>,
    pub overrides: Overrides,
    pub list: bool,
    pub init: bool,
    pub report: Option<PathBuf>,
}

/// Execute the command and return the process exit code.
pub fn execute<W: Write>(options: &Options, out: &mut W) -> Result<i32> {
    let (config_path, required) = match &options.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    if options.init {
        init_config(&config_path, out)?;
        return Ok(exit_codes::OK);
    }

    let cfg = load_config(&config_path, required)?
        .apply(&options.overrides)
        .context("apply command-line overrides")?;
    let steps = cfg.resolve_steps();
    debug!(
        config = %config_path.display(),
        project_dir = %cfg.project_dir.display(),
        steps = steps.len(),
        "config loaded"
    );

    if options.list {
        list_steps(&steps, out)?;
        return Ok(exit_codes::OK);
    }

    let launcher = ProcessLauncher::new(&cfg.project_dir).with_env(cfg.extra_env.clone());
    let started_at = Utc::now();
    let summary = run_steps(&steps, &launcher, out)?;
    let finished_at = Utc::now();
    info!(
        passed = summary.passed_count(),
        failed = summary.reports.len() - summary.passed_count(),
        "verification finished"
    );

    if let Some(path) = &options.report {
        let report = RunReport::new(&summary, started_at, finished_at);
        if let Err(err) = write_report(path, &report) {
            warn!(err = %format!("{err:#}"), "failed to write report");
        }
    }

    Ok(exit_code(&summary))
}

fn init_config<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    write_config(path, &VerifyConfig::default())?;
    writeln!(out, "wrote {}", path.display()).context("write init message")?;
    Ok(())
}

fn list_steps<W: Write>(steps: &[Step], out: &mut W) -> Result<()> {
    for (idx, step) in steps.iter().enumerate() {
        writeln!(out, "{}. {}: {}", idx + 1, step.label, step.display_command())
            .context("write step list")?;
    }
    Ok(())
}
