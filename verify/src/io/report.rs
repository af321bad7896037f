//! Machine-readable run report.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::aggregate::RunSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub passed: bool,
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepRecord {
    pub label: String,
    pub command: Vec<String>,
    pub passed: bool,
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn new(summary: &RunSummary, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        let steps = summary
            .reports
            .iter()
            .map(|report| StepRecord {
                label: report.label.clone(),
                command: report.command.clone(),
                passed: report.verdict.passed(),
                exit_code: report.verdict.exit_code(),
                duration_ms: report.duration_ms(),
            })
            .collect();
        Self {
            started_at,
            finished_at,
            passed: !summary.overall_failed(),
            steps,
        }
    }
}

pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let contents = serde_json::to_string_pretty(report).context("serialize report")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create report dir {}", parent.display()))?;
    }
    fs::write(path, format!("{contents}\n"))
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
