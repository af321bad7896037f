//! Launch adapter between verification steps and child processes.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::process::Command;

use anyhow::Result;
use tracing::warn;

use crate::core::types::Step;
use crate::core::verdict::status_code;
use crate::io::process::run_merged;

/// Launches a step and forwards its merged output.
///
/// `Ok(Ok(code))` is the child's exit code, `Ok(Err(_))` means the program
/// could not be launched or waited on, and the outer `Err` is a console
/// failure.
pub trait StepLauncher {
    fn launch(
        &self,
        step: &Step,
        on_line: &mut dyn FnMut(&str) -> Result<()>,
    ) -> Result<io::Result<i32>>;
}

/// Runs steps as real child processes in a working directory.
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    pub workdir: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl ProcessLauncher {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    fn command(&self, step: &Step) -> io::Result<Command> {
        let program = step
            .program()
            .filter(|program| !program.trim().is_empty())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "launch command: empty command"))?;
        let mut cmd = Command::new(program);
        cmd.args(step.args()).current_dir(&self.workdir);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        Ok(cmd)
    }
}

impl StepLauncher for ProcessLauncher {
    fn launch(
        &self,
        step: &Step,
        on_line: &mut dyn FnMut(&str) -> Result<()>,
    ) -> Result<io::Result<i32>> {
        let cmd = match self.command(step) {
            Ok(cmd) => cmd,
            Err(e) => return Ok(Err(e)),
        };
        let exited = run_merged(cmd, step.timeout, on_line)?;
        Ok(exited.map(|exited| {
            if exited.timed_out {
                warn!(label = %step.label, "step timed out");
            }
            status_code(&exited.status)
        }))
    }
}
