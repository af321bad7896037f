//! Diagnostics for the runner itself, written to stderr.
//!
//! Step output and verdicts go to stdout through [`crate::run`]; nothing
//! logged here affects a verdict. `RUST_LOG` overrides the `warn` default,
//! e.g. `RUST_LOG=verify=debug` to trace spawns, timeouts and verdicts.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub fn init() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// `warn` unless `directives` says otherwise. Unparseable directives are
/// skipped rather than rejected.
fn filter(directives: Option<&str>) -> EnvFilter {
    let builder = EnvFilter::builder().with_default_directive(LevelFilter::WARN.into());
    match directives {
        Some(directives) => builder.parse_lossy(directives),
        None => builder.parse_lossy(""),
    }
}
