//! End-to-end tests of the rxgap binary against the simulated receiver

use assert_cmd::prelude::*;
use predicates::prelude::*;
use regex::Regex;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const RXGAP_VARS: &[&str] = &[
    "RXGAP_BACKEND",
    "RXGAP_DEVICE",
    "RXGAP_CASES",
    "RXGAP_NUM_BUFFERS",
    "RXGAP_BUFFER_SIZE",
    "RXGAP_NUM_TRANSFERS",
    "RXGAP_TIMEOUT_MS",
    "RXGAP_TIMESTAMP_STEP",
    "RXGAP_SIM_FAULTS",
    "ENABLE_COLOR",
];

/// Command running in an empty directory with a clean RXGAP environment
fn rxgap_colors_unset(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rxgap").unwrap();
    cmd.current_dir(dir.path());
    for var in RXGAP_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn rxgap(dir: &TempDir) -> Command {
    let mut cmd = rxgap_colors_unset(dir);
    cmd.arg("--no-color");
    cmd
}

#[test]
fn test_clean_run_passes() {
    let dir = TempDir::new().unwrap();
    rxgap(&dir)
        .args(["--case", "1023:50", "--case", "1024:50", "--case", "1025:50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Case: Read size=1023 samples, 50 iterations"))
        .stdout(predicate::str::contains("Test passed."))
        .stdout(predicate::str::contains("All 3 test case(s) passed"));
}

#[test]
fn test_progress_lines_use_hex_timestamps() {
    let dir = TempDir::new().unwrap();
    let output = rxgap(&dir).args(["--case", "8:3"]).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let timestamp = Regex::new(r"Initial timestamp: 0x[0-9a-f]{16}").unwrap();
    let status = Regex::new(r"Initial status:    0x[0-9a-f]{8}").unwrap();
    assert!(timestamp.is_match(&stdout));
    assert!(status.is_match(&stdout));
}

#[test]
fn test_dropped_samples_fail_the_run() {
    let dir = TempDir::new().unwrap();
    rxgap(&dir)
        .args(["--case", "1024:20", "--sim-fault", "drop:5:7"])
        .assert()
        .code(6)
        .stdout(predicate::str::contains("Test failed."))
        .stderr(predicate::str::contains("Timestamp mismatch @ 4."));
}

#[test]
fn test_failed_case_does_not_stop_later_cases() {
    let dir = TempDir::new().unwrap();
    let output = rxgap(&dir)
        // fault indices restart per case; the second case ends before read 15
        .args(["--case", "64:20", "--case", "128:10", "--sim-fault", "repeat:15:2"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(6));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("Test failed.").count(), 1);
    assert_eq!(stdout.matches("Test passed.").count(), 1);
}

#[test]
fn test_read_error_aborts_case() {
    let dir = TempDir::new().unwrap();
    rxgap(&dir)
        .args(["--case", "256:10", "--sim-fault", "error:3:timeout"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("RX 2 failed"));
}

#[test]
fn test_overrun_status_fails_case() {
    let dir = TempDir::new().unwrap();
    rxgap(&dir)
        .args(["--case", "512:10", "--sim-fault", "overrun:4"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("Warning: status=0x"));
}

#[test]
fn test_json_report() {
    let dir = TempDir::new().unwrap();
    let output = rxgap(&dir)
        .args(["--json", "--case", "1024:5", "--case", "2048:5"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["backend"], "sim");
    assert_eq!(report["cases"].as_array().unwrap().len(), 2);
    assert_eq!(report["cases"][1]["case"]["gap"], 2048);
    assert_eq!(report["summary"]["passed"], 2);
    assert!(report["fatal_error"].is_null());
}

#[test]
fn test_read_larger_than_buffer_is_rejected() {
    let dir = TempDir::new().unwrap();
    rxgap(&dir)
        .args(["--buffer-size", "1024", "--case", "1025:1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("reads more samples than the buffer size"));
}

#[test]
fn test_malformed_case_argument() {
    let dir = TempDir::new().unwrap();
    rxgap(&dir).args(["--case", "1024"]).assert().failure();
}

#[test]
fn test_env_file_supplies_cases() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "RXGAP_CASES=16:4\n").unwrap();

    rxgap(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Read size=16 samples, 4 iterations"));
}

#[test]
fn test_cli_overrides_environment() {
    let dir = TempDir::new().unwrap();
    rxgap(&dir)
        .env("RXGAP_CASES", "32:4")
        .args(["--case", "48:2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Read size=48 samples, 2 iterations"))
        .stdout(predicate::str::contains("Read size=32").not());
}

#[test]
fn test_environment_timestamp_step_matches_cli_flag() {
    let dir = TempDir::new().unwrap();
    rxgap(&dir)
        .env("RXGAP_TIMESTAMP_STEP", "1")
        .args(["--case", "8:3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test passed."));

    rxgap(&dir)
        .args(["--timestamp-step", "1", "--case", "8:3"])
        .assert()
        .success();
}

#[test]
fn test_env_file_timestamp_step_reaches_simulator() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "RXGAP_TIMESTAMP_STEP=1\nRXGAP_CASES=8:3\n").unwrap();
    rxgap(&dir).assert().success();
}

#[test]
fn test_bad_env_file_line_is_named() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "RXGAP_TIMESTAMP_STEP=zero\n").unwrap();
    rxgap(&dir)
        .args(["--case", "8:3"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Warning: .env Line 'RXGAP_TIMESTAMP_STEP=zero'"));
}

#[test]
fn test_invalid_environment_value() {
    let dir = TempDir::new().unwrap();
    rxgap(&dir)
        .env("RXGAP_CASES", "not-a-case")
        .assert()
        .code(1);
}

#[test]
fn test_enable_color_from_environment_applies_to_final_error() {
    let dir = TempDir::new().unwrap();
    let output = rxgap_colors_unset(&dir)
        .env_remove("NO_COLOR")
        .env("TERM", "xterm-256color")
        .env("CLICOLOR_FORCE", "1")
        .env("ENABLE_COLOR", "false")
        .args(["--case", "8:3", "--sim-fault", "drop:2:1"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(6));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[TEST] Test failure: 1 of 1 test case(s) did not pass"));
    assert!(!stderr.contains('\u{1b}'), "unexpected escape codes: {}", stderr);
}

#[test]
fn test_env_help() {
    let dir = TempDir::new().unwrap();
    rxgap(&dir)
        .arg("--env-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("RXGAP_CASES"));
}

#[test]
fn test_simulator_options_rejected_for_hardware() {
    let dir = TempDir::new().unwrap();
    rxgap(&dir)
        .args(["--backend", "bladerf", "--sim-fault", "drop:1:1"])
        .assert()
        .code(1);
}
