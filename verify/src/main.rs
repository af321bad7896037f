//! Sequential verification runner.
//!
//! Runs the project's system check, test suite, and smoke test in order and
//! exits non-zero if any of them failed. Verdicts come from exit status only.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use verify::cli::{Options, execute};
use verify::exit_codes;
use verify::io::config::Overrides;

#[derive(Parser)]
#[command(
    name = "verify",
    version,
    about = "Run the project's verification steps and report a single verdict"
)]
struct Cli {
    /// Config file (defaults to `verify.toml` in the current directory, if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interpreter substituted for `{python}` in step commands.
    #[arg(long)]
    python: Option<String>,

    /// Working directory for every step.
    #[arg(long)]
    project_dir: Option<PathBuf>,

    /// Print the resolved steps without running them.
    #[arg(long, conflicts_with = "init")]
    list: bool,

    /// Write a default config file and exit.
    #[arg(long)]
    init: bool,

    /// Write a JSON report of the run to this path.
    #[arg(long, conflicts_with_all = ["list", "init"])]
    report: Option<PathBuf>,
}

impl From<Cli> for Options {
    fn from(cli: Cli) -> Self {
        Self {
            config: cli.config,
            overrides: Overrides {
                python: cli.python,
                project_dir: cli.project_dir,
            },
            list: cli.list,
            init: cli.init,
            report: cli.report,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    verify::logging::init();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FAILED);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let options = Options::from(cli);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&options, &mut out)
}
