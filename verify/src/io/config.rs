//! Verification configuration stored in `verify.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::Step;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "verify.toml";

/// Placeholder in step commands replaced by the configured interpreter.
pub const PYTHON_PLACEHOLDER: &str = "{python}";

/// Verification configuration (TOML).
///
/// Missing fields default to the Django project layout: `manage.py` and
/// `smoke_test.py` in the project directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VerifyConfig {
    /// Interpreter substituted for `{python}` in step commands.
    pub python: String,

    /// Working directory for every step.
    pub project_dir: PathBuf,

    /// Extra environment variables for every step. A table in the file
    /// replaces the default (`PYTHONUNBUFFERED=1`).
    pub extra_env: BTreeMap<String, String>,

    pub steps: Vec<StepConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepConfig {
    pub label: String,
    /// Program and arguments, e.g. `["{python}", "manage.py", "check"]`.
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl StepConfig {
    fn new(label: &str, command: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            command: command.iter().map(|arg| arg.to_string()).collect(),
            timeout_secs: None,
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            project_dir: PathBuf::from("."),
            extra_env: default_env(),
            steps: default_steps(),
        }
    }
}

/// Python block-buffers stdout into a pipe; unbuffered keeps Django's output
/// live and in order with its stderr.
pub fn default_env() -> BTreeMap<String, String> {
    BTreeMap::from([("PYTHONUNBUFFERED".to_string(), "1".to_string())])
}

/// System check, `portfolio` test suite, smoke test.
pub fn default_steps() -> Vec<StepConfig> {
    vec![
        StepConfig::new("Django system check", &[PYTHON_PLACEHOLDER, "manage.py", "check"]),
        StepConfig::new(
            "Portfolio test suite",
            &[PYTHON_PLACEHOLDER, "manage.py", "test", "portfolio", "-v", "2"],
        ),
        StepConfig::new("Smoke test", &[PYTHON_PLACEHOLDER, "smoke_test.py"]),
    ]
}

/// Command-line overrides applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub python: Option<String>,
    pub project_dir: Option<PathBuf>,
}

impl VerifyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.python.trim().is_empty() {
            return Err(anyhow!("python must be non-empty"));
        }
        for (idx, step) in self.steps.iter().enumerate() {
            if step.label.trim().is_empty() {
                return Err(anyhow!("steps[{idx}].label must be non-empty"));
            }
            if step.command.is_empty() || step.command[0].trim().is_empty() {
                return Err(anyhow!(
                    "steps[{idx}] ({}): command must be a non-empty array",
                    step.label
                ));
            }
            if step.timeout_secs == Some(0) {
                return Err(anyhow!(
                    "steps[{idx}] ({}): timeout_secs must be > 0",
                    step.label
                ));
            }
        }
        Ok(())
    }

    pub fn apply(mut self, overrides: &Overrides) -> Result<Self> {
        if let Some(python) = &overrides.python {
            self.python = python.clone();
        }
        if let Some(project_dir) = &overrides.project_dir {
            self.project_dir = project_dir.clone();
        }
        self.validate()?;
        Ok(self)
    }

    /// Ordered steps with `{python}` expanded.
    pub fn resolve_steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .map(|step| {
                let command = step
                    .command
                    .iter()
                    .map(|arg| arg.replace(PYTHON_PLACEHOLDER, &self.python));
                let resolved = Step::new(step.label.clone(), command);
                match step.timeout_secs {
                    Some(secs) => resolved.with_timeout(Duration::from_secs(secs)),
                    None => resolved,
                }
            })
            .collect()
    }
}

/// Load config from a TOML file.
///
/// If the file is missing and `required` is false, returns
/// `VerifyConfig::default()`.
pub fn load_config(path: &Path, required: bool) -> Result<VerifyConfig> {
    if !path.exists() {
        if required {
            return Err(anyhow!("config file {} not found", path.display()));
        }
        let cfg = VerifyConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: VerifyConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Write config to disk (used to scaffold a `verify.toml`).
pub fn write_config(path: &Path, cfg: &VerifyConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, buf).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
