//! Step orchestration: header, forwarded output, verdict, final banner.

use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::core::aggregate::RunSummary;
use crate::core::console::{final_banner, step_header, verdict_line};
use crate::core::types::{Step, StepReport};
use crate::core::verdict::classify_launch;
use crate::exit_codes;
use crate::io::launcher::StepLauncher;

/// Run one step and print its verdict.
///
/// A step that fails or cannot be launched is recorded, never returned as an
/// error. Errors come only from writing to `out`.
#[instrument(skip_all, fields(label = %step.label))]
pub fn run_step<L, W>(step: &Step, launcher: &L, out: &mut W) -> Result<StepReport>
where
    L: StepLauncher + ?Sized,
    W: Write,
{
    writeln!(out, "{}", step_header(&step.label)).context("write step header")?;

    let started = Instant::now();
    let launch = launcher.launch(step, &mut |line: &str| {
        writeln!(out, "{line}").context("write step output")?;
        out.flush().context("flush step output")?;
        Ok(())
    })?;
    let duration = started.elapsed();

    if let Err(err) = &launch {
        debug!(err = %err, command = %step.display_command(), "step did not run to completion");
        writeln!(out, "could not run step: {err}").context("write launch error")?;
    }

    let report = StepReport {
        label: step.label.clone(),
        command: step.command.clone(),
        verdict: classify_launch(&launch),
        duration,
    };
    info!(
        verdict = ?report.verdict,
        duration_ms = report.duration_ms(),
        "step finished"
    );
    writeln!(out, "{}", verdict_line(&report)).context("write verdict")?;
    out.flush().context("flush verdict")?;
    Ok(report)
}

/// Run every step in order, then print the final banner.
///
/// Failures never short-circuit: each step gets a verdict line.
pub fn run_steps<L, W>(steps: &[Step], launcher: &L, out: &mut W) -> Result<RunSummary>
where
    L: StepLauncher + ?Sized,
    W: Write,
{
    let mut summary = RunSummary::new();
    for step in steps {
        summary.record(run_step(step, launcher, out)?);
    }
    writeln!(out, "{}", final_banner(&summary)).context("write final banner")?;
    out.flush().context("flush final banner")?;
    Ok(summary)
}

/// Process exit code for a finished run.
pub fn exit_code(summary: &RunSummary) -> i32 {
    if summary.overall_failed() {
        exit_codes::FAILED
    } else {
        exit_codes::OK
    }
}
