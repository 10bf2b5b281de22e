mod common;

use common::*;
use std::process::Command;

fn logslice(args: &[&str], cwd: &std::path::Path) -> (String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_logslice"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to start logslice");
    (
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn missing_date_is_a_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, code) = logslice(&[], tmp.path());
    assert_ne!(code, 0);
}

#[test]
fn malformed_date_is_a_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    let (stderr, code) = logslice(&["2024-1-01"], tmp.path());
    assert_ne!(code, 0);
    assert!(stderr.contains("YYYY-MM-DD"), "stderr: {stderr}");
}

#[test]
fn zero_workers_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let (stderr, code) = logslice(&["2024-12-01", "-j", "0"], tmp.path());
    assert_ne!(code, 0);
    assert!(stderr.contains("worker count"), "stderr: {stderr}");
}

#[test]
fn extracts_from_default_archive_into_output_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let log = synthetic_log(300, 17);
    write_file(tmp.path(), "logs.zip", &build_zip(&[("big.log", log.as_slice(), Method::Deflate)]));

    let (stderr, code) = logslice(&["2024-12-02", "-j", "3", "--min-chunk-size", "1K"], tmp.path());
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stderr.contains("Logs extracted successfully"), "stderr: {stderr}");

    let written = std::fs::read(tmp.path().join("output").join("output_2024-12-02.txt")).unwrap();
    assert_eq!(written, expected_for(&log, "2024-12-02"));
    assert!(!tmp.path().join("output").join("output_2024-12-02.txt.partial").exists());
}

#[test]
fn plain_input_and_no_matches() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "app.log", b"2024-12-01 A\n2024-12-02 B\n");

    let (stderr, code) = logslice(
        &["2031-01-01", "-i", "app.log", "--plain", "-d", "out"],
        tmp.path(),
    );
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stderr.contains("No logs found for date 2031-01-01"), "stderr: {stderr}");
    assert_eq!(std::fs::read(tmp.path().join("out/output_2031-01-01.txt")).unwrap(), b"");
}

#[test]
fn partition_table_only_in_verbose_mode() {
    let tmp = tempfile::tempdir().unwrap();
    let log = synthetic_log(200, 0);
    write_file(tmp.path(), "app.log", &log);
    let args = ["2024-12-01", "-i", "app.log", "--plain", "-j", "2", "--min-chunk-size", "1K"];

    let (stderr, code) = logslice(&args, tmp.path());
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(!stderr.contains("Malformed"), "stderr: {stderr}");

    let mut verbose = args.to_vec();
    verbose.push("-v");
    let (stderr, code) = logslice(&verbose, tmp.path());
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stderr.contains("Malformed"), "stderr: {stderr}");
}

#[test]
fn missing_archive_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let (_, code) = logslice(&["2024-12-01", "-i", "nope.zip"], tmp.path());
    assert_ne!(code, 0);
}
