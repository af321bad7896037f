//! Run-scoped aggregation of step reports.

use crate::core::types::{StepFailed, StepReport};

/// Ordered step reports for one run.
///
/// The aggregate failure flag is derived from the reports rather than stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub reports: Vec<StepReport>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, report: StepReport) {
        self.reports.push(report);
    }

    pub fn overall_failed(&self) -> bool {
        self.reports.iter().any(|report| !report.verdict.passed())
    }

    pub fn failures(&self) -> impl Iterator<Item = StepFailed<'_>> {
        self.reports.iter().filter_map(StepReport::failure)
    }

    pub fn passed_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| report.verdict.passed())
            .count()
    }
}

impl FromIterator<StepReport> for RunSummary {
    fn from_iter<T: IntoIterator<Item = StepReport>>(iter: T) -> Self {
        Self {
            reports: iter.into_iter().collect(),
        }
    }
}
