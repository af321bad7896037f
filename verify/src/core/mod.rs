//! Pure, deterministic verification logic.
//!
//! Nothing here touches the filesystem or spawns processes; the verdict for a
//! step is computed from an exit status alone.

pub mod aggregate;
pub mod console;
pub mod types;
pub mod verdict;
