//! Exit-status classification.
//!
//! The verdict reads only the exit status. Output is display-only and never
//! reaches this module.

use std::io;
use std::process::ExitStatus;

use crate::core::types::Verdict;

/// Status reported for a step whose program could not be started.
pub const LAUNCH_FAILURE_STATUS: i32 = 1;

/// Status reported when the child exited without a code and no signal is known.
pub const UNKNOWN_STATUS: i32 = 1;

/// Classify a raw exit code. `0` passes, anything else fails with that code.
pub fn classify_code(code: i32) -> Verdict {
    if code == 0 {
        Verdict::Passed
    } else {
        Verdict::Failed { exit_code: code }
    }
}

/// Classify a launch result carrying the child's exit code. A launch error
/// becomes a failed step with [`LAUNCH_FAILURE_STATUS`].
pub fn classify_launch(launch: &io::Result<i32>) -> Verdict {
    match launch {
        Ok(code) => classify_code(*code),
        Err(_) => Verdict::Failed {
            exit_code: LAUNCH_FAILURE_STATUS,
        },
    }
}

/// Numeric code for an exit status.
///
/// Signal-terminated children have no code; on Unix these map to the shell
/// convention `128 + signal`.
pub fn status_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    signal_code(status).unwrap_or(UNKNOWN_STATUS)
}

#[cfg(unix)]
fn signal_code(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|signal| 128 + signal)
}

#[cfg(not(unix))]
fn signal_code(_status: &ExitStatus) -> Option<i32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_passes() {
        assert_eq!(classify_code(0), Verdict::Passed);
    }

    #[test]
    fn non_zero_fails_with_code() {
        assert_eq!(classify_code(2), Verdict::Failed { exit_code: 2 });
        assert_eq!(classify_code(-1), Verdict::Failed { exit_code: -1 });
    }

    #[test]
    fn launch_error_fails_with_sentinel() {
        let launch = Err(io::Error::new(io::ErrorKind::NotFound, "no such program"));
        assert_eq!(
            classify_launch(&launch),
            Verdict::Failed {
                exit_code: LAUNCH_FAILURE_STATUS
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_codes_are_classified() {
        use std::os::unix::process::ExitStatusExt;

        // Raw wait statuses: exit code lives in the high byte.
        let ok = ExitStatus::from_raw(0);
        let three = ExitStatus::from_raw(3 << 8);
        assert_eq!(classify_launch(&Ok(status_code(&ok))), Verdict::Passed);
        assert_eq!(
            classify_launch(&Ok(status_code(&three))),
            Verdict::Failed { exit_code: 3 }
        );
    }

    #[cfg(unix)]
    #[test]
    fn signal_maps_to_shell_convention() {
        use std::os::unix::process::ExitStatusExt;

        let killed = ExitStatus::from_raw(9);
        assert_eq!(status_code(&killed), 137);
    }
}
