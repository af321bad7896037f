//! Stable exit codes for the `verify` CLI.

/// Every step passed (or there were no steps).
pub const OK: i32 = 0;
/// At least one step failed, or the configuration/CLI usage was invalid.
pub const FAILED: i32 = 1;
