//! Test-only helpers: a scripted launcher and temp project directories.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::types::Step;
use crate::io::config::{StepConfig, VerifyConfig, write_config};
use crate::io::launcher::StepLauncher;

/// Canned behavior for one step label.
#[derive(Debug, Clone)]
pub struct ScriptedStep {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    /// `Err(message)` simulates a program that cannot be launched.
    pub result: std::result::Result<i32, String>,
}

impl ScriptedStep {
    pub fn exit(code: i32) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            result: Ok(code),
        }
    }

    pub fn launch_error(message: &str) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            result: Err(message.to_string()),
        }
    }

    pub fn stdout(mut self, line: &str) -> Self {
        self.stdout.push(line.to_string());
        self
    }

    pub fn stderr(mut self, line: &str) -> Self {
        self.stderr.push(line.to_string());
        self
    }
}

/// Launcher that replays scripted steps by label and records launch order.
///
/// Unscripted labels exit 0 with no output.
#[derive(Debug, Default)]
pub struct ScriptedLauncher {
    scripts: BTreeMap<String, ScriptedStep>,
    launched: RefCell<Vec<String>>,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, label: impl Into<String>, step: ScriptedStep) -> Self {
        self.scripts.insert(label.into(), step);
        self
    }

    pub fn launched(&self) -> Vec<String> {
        self.launched.borrow().clone()
    }
}

impl StepLauncher for ScriptedLauncher {
    fn launch(
        &self,
        step: &Step,
        on_line: &mut dyn FnMut(&str) -> Result<()>,
    ) -> Result<io::Result<i32>> {
        self.launched.borrow_mut().push(step.label.clone());
        let script = self
            .scripts
            .get(&step.label)
            .cloned()
            .unwrap_or_else(|| ScriptedStep::exit(0));

        match script.result {
            Err(message) => Ok(Err(io::Error::new(io::ErrorKind::NotFound, message))),
            Ok(code) => {
                for line in script.stdout.iter().chain(script.stderr.iter()) {
                    on_line(line)?;
                }
                Ok(Ok(code))
            }
        }
    }
}

/// Temporary project directory with a `verify.toml`.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp project")?;
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("verify.toml")
    }

    /// Write a config whose steps are `(label, command)` pairs.
    pub fn write_steps(&self, steps: &[(&str, &[&str])]) -> Result<PathBuf> {
        let cfg = VerifyConfig {
            steps: steps
                .iter()
                .map(|(label, command)| StepConfig {
                    label: label.to_string(),
                    command: command.iter().map(|arg| arg.to_string()).collect(),
                    timeout_secs: None,
                })
                .collect(),
            ..VerifyConfig::default()
        };
        let path = self.config_path();
        write_config(&path, &cfg)?;
        Ok(path)
    }
}
