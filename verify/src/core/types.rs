//! Core verification types.

use std::fmt;
use std::time::Duration;

/// One external command the runner executes and verdicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub label: String,
    /// Program followed by its arguments.
    pub command: Vec<String>,
    /// Kill the child once this elapses. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Step {
    pub fn new<L, I, S>(label: L, command: I) -> Self
    where
        L: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            command: command.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }

    /// Space-joined command line, for display only.
    pub fn display_command(&self) -> String {
        self.command.join(" ")
    }
}

/// PASSED/FAILED classification of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed { exit_code: i32 },
}

impl Verdict {
    pub fn passed(self) -> bool {
        matches!(self, Verdict::Passed)
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Passed => 0,
            Verdict::Failed { exit_code } => exit_code,
        }
    }
}

/// Outcome of a single executed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub label: String,
    pub command: Vec<String>,
    pub verdict: Verdict,
    pub duration: Duration,
}

impl StepReport {
    /// Wall-clock duration in milliseconds, saturating at `u64::MAX`.
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn failure(&self) -> Option<StepFailed<'_>> {
        match self.verdict {
            Verdict::Passed => None,
            Verdict::Failed { exit_code } => Some(StepFailed {
                label: &self.label,
                exit_code,
            }),
        }
    }
}

/// A failed step, as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepFailed<'a> {
    pub label: &'a str,
    pub exit_code: i32,
}

impl fmt::Display for StepFailed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (exit code {})", self.label, self.exit_code)
    }
}
