//! Sequential verification runner.
//!
//! Runs an ordered list of external check commands (system check, test suite,
//! smoke test), streams each command's merged output to the console, and
//! reduces the per-step verdicts into one exit code.
//!
//! - **[`core`]**: Pure logic (verdict classification, aggregation, console
//!   formats). No I/O.
//! - **[`io`]**: Side effects (config, child processes, JSON report).
//!
//! [`run`] coordinates the two; [`cli`] implements the `verify` command.

pub mod cli;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
