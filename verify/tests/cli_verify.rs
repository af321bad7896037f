//! CLI tests for the `verify` binary.
//!
//! Spawns the binary against temp projects whose steps are small shell
//! commands, and checks console output and exit codes.
#![cfg(unix)]

use std::process::{Command, Output};

use verify::exit_codes;
use verify::test_support::TestProject;

fn run_verify(project: &TestProject, extra_args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_verify"))
        .current_dir(project.root())
        .args(extra_args)
        .output()
        .expect("run verify")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn all_steps_pass_exits_ok() {
    let project = TestProject::new().expect("project");
    project
        .write_steps(&[
            ("Check", &["sh", "-c", "echo checked"]),
            ("Tests", &["sh", "-c", "echo OK"]),
            ("Smoke", &["true"]),
        ])
        .expect("write steps");

    let output = run_verify(&project, &[]);
    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(exit_codes::OK), "{text}");
    assert_eq!(text.matches("PASSED: ").count(), 3);
    assert!(text.trim_end().ends_with("ALL VERIFICATION PASSED"));
}

#[test]
fn failing_smoke_test_fails_the_run() {
    let project = TestProject::new().expect("project");
    project
        .write_steps(&[
            ("Check", &["sh", "-c", "echo 'Creating test database...' >&2"]),
            ("Tests", &["sh", "-c", "echo OK"]),
            ("Smoke", &["sh", "-c", "echo 'connection refused'; exit 1"]),
        ])
        .expect("write steps");

    let output = run_verify(&project, &[]);
    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(exit_codes::FAILED), "{text}");
    assert!(text.contains("Creating test database..."));
    assert!(text.contains("PASSED: Check"));
    assert!(text.contains("PASSED: Tests"));
    assert!(text.contains("connection refused"));
    assert!(text.contains("FAILED: Smoke (exit code 1)"));
    assert!(text.trim_end().ends_with("VERIFICATION FAILED"));
}

#[test]
fn exit_status_two_is_reported() {
    let project = TestProject::new().expect("project");
    project
        .write_steps(&[("Lint", &["sh", "-c", "exit 2"])])
        .expect("write steps");

    let output = run_verify(&project, &[]);
    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let failed = text
        .lines()
        .find(|line| line.contains("FAILED"))
        .expect("failed line");
    assert!(failed.contains('2'), "{failed}");
}

#[test]
fn stderr_chatter_with_zero_exit_passes() {
    let project = TestProject::new().expect("project");
    project
        .write_steps(&[(
            "Chatty",
            &["sh", "-c", "echo 'ERROR: not really' >&2; echo 'Traceback' >&2"],
        )])
        .expect("write steps");

    let output = run_verify(&project, &[]);
    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(exit_codes::OK), "{text}");
    assert!(text.contains("ERROR: not really"));
    assert!(text.contains("PASSED: Chatty"));
}

#[test]
fn missing_program_fails_step_and_continues() {
    let project = TestProject::new().expect("project");
    project
        .write_steps(&[
            ("Missing", &["/definitely/not/a/real/program"]),
            ("After", &["true"]),
        ])
        .expect("write steps");

    let output = run_verify(&project, &[]);
    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    assert!(text.contains("could not run step: launch command:"));
    assert!(text.contains("FAILED: Missing (exit code 1)"));
    assert!(text.contains("PASSED: After"));
}

#[test]
fn headers_follow_declared_order() {
    let project = TestProject::new().expect("project");
    project
        .write_steps(&[("Third", &["true"]), ("First", &["true"]), ("Second", &["true"])])
        .expect("write steps");

    let output = run_verify(&project, &[]);
    let text = stdout(&output);
    let headers: Vec<&str> = text
        .lines()
        .filter(|line| line.starts_with("=== "))
        .collect();
    assert_eq!(
        headers,
        vec!["=== Third ===", "=== First ===", "=== Second ==="]
    );
}

#[test]
fn empty_step_list_passes() {
    let project = TestProject::new().expect("project");
    std::fs::write(project.config_path(), "steps = []\n").expect("write config");

    let output = run_verify(&project, &[]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&output), "ALL VERIFICATION PASSED\n");
}

#[test]
fn python_override_is_substituted() {
    let project = TestProject::new().expect("project");
    project
        .write_steps(&[("Interpreter", &["{python}", "-c", "echo from override"])])
        .expect("write steps");

    let output = run_verify(&project, &["--python", "sh"]);
    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(exit_codes::OK), "{text}");
    assert!(text.contains("from override"));
}

#[test]
fn invalid_config_exits_failed_without_running() {
    let project = TestProject::new().expect("project");
    std::fs::write(
        project.config_path(),
        "[[steps]]\nlabel = \"Empty\"\ncommand = []\n",
    )
    .expect("write config");

    let output = run_verify(&project, &[]);
    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    assert!(stdout(&output).is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("non-empty array"), "{stderr}");
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let project = TestProject::new().expect("project");
    project
        .write_steps(&[("Marker", &["touch", "ran"])])
        .expect("write steps");

    let output = run_verify(&project, &["--no-such-flag"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
    assert!(!project.root().join("ran").exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--no-such-flag"), "{stderr}");
}

#[test]
fn step_environment_disables_python_buffering() {
    let project = TestProject::new().expect("project");
    project
        .write_steps(&[("Env", &["sh", "-c", "echo unbuffered=$PYTHONUNBUFFERED"])])
        .expect("write steps");

    let output = run_verify(&project, &[]);
    assert!(stdout(&output).contains("unbuffered=1"));
}
