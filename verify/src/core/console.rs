//! Console line formats for the verification report.

use crate::core::aggregate::RunSummary;
use crate::core::types::StepReport;

pub const ALL_PASSED_BANNER: &str = "ALL VERIFICATION PASSED";
pub const FAILED_BANNER: &str = "VERIFICATION FAILED";

/// Header printed before a step's forwarded output.
pub fn step_header(label: &str) -> String {
    format!("=== {label} ===")
}

/// `PASSED: <label>` or `FAILED: <label> (exit code <N>)`.
pub fn verdict_line(report: &StepReport) -> String {
    match report.failure() {
        None => format!("PASSED: {}", report.label),
        Some(failure) => format!("FAILED: {failure}"),
    }
}

pub fn final_banner(summary: &RunSummary) -> &'static str {
    if summary.overall_failed() {
        FAILED_BANNER
    } else {
        ALL_PASSED_BANNER
    }
}
