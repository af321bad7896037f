//! I/O helpers for verification runs.

pub mod config;
pub mod launcher;
pub mod process;
pub mod report;
