use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use privca::report::{Report, Status};

fn privca(store: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_privca"))
        .arg("--store-dir")
        .arg(store)
        .args(["--key-bits", "2048"])
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run privca")
}

fn report(output: &Output) -> Report {
    serde_json::from_slice(&output.stdout).expect("stdout is not a report")
}

#[test]
fn full_run_prints_reports_and_exit_codes() {
    let dir = tempfile::tempdir().unwrap();

    let created = privca(dir.path(), &["-t", "ca-certs", "-r", "Test CA", "-c", "Test Root"]);
    assert!(created.status.success());
    assert_eq!(
        report(&created),
        Report::ok("The CA (Test CA) has successfully been registered on the database.")
    );
    let stdout = String::from_utf8(created.stdout.clone()).unwrap();
    assert!(stdout.starts_with("{\n    \"status\": \"ok\","));

    let again = privca(dir.path(), &["-t", "ca-certs", "-r", "Test CA", "-c", "Test Root"]);
    assert!(again.status.success());
    assert_eq!(
        report(&again).message,
        "The CA (Test CA) is already registered on the database."
    );

    let leaf = privca(
        dir.path(),
        &["--cert_type", "tls-certs", "--ca_name", "Test CA", "--common_name", "a.local,10.0.0.5"],
    );
    assert!(leaf.status.success());
    assert_eq!(
        report(&leaf),
        Report::ok("The TLS certificate has been created for the FQDN (a.local).")
    );
    assert!(dir.path().join("test_ca/tls-certs/a.local.pem").exists());
}

#[test]
fn unregistered_ca_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = privca(dir.path(), &["-t", "tls-certs", "-r", "Nope CA", "-c", "a.local"]);

    assert_eq!(output.status.code(), Some(1));
    let report = report(&output);
    assert_eq!(report.status, Status::Failed);
    assert_eq!(
        report.message,
        "The CA (Nope CA) is not registered yet in the database."
    );
}

#[test]
fn invalid_settings_are_reported_as_failures() {
    let dir = tempfile::tempdir().unwrap();
    let output = privca(
        dir.path(),
        &["-t", "ca-certs", "-r", "Test CA", "-c", "Test Root", "--days", "0"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(report(&output).status, Status::Failed);
    assert!(!dir.path().join("test_ca").exists());
}

#[test]
fn validity_past_year_9999_fails_before_writing_anything() {
    let dir = tempfile::tempdir().unwrap();
    let output = privca(
        dir.path(),
        &["-t", "ca-certs", "-r", "Big CA", "-c", "Big Root", "--days", "4000000"],
    );

    assert_eq!(output.status.code(), Some(1));
    let report = report(&output);
    assert_eq!(report.status, Status::Failed);
    assert!(report.message.contains("9999-12-31"), "{}", report.message);
    assert!(!dir.path().join("big_ca").exists());
}

#[test]
fn names_are_trimmed_before_use() {
    let dir = tempfile::tempdir().unwrap();
    let created = privca(
        dir.path(),
        &["-t", "ca-certs", "-r", "  Test CA  ", "-c", " Test Root "],
    );
    assert!(created.status.success());
    assert_eq!(
        report(&created),
        Report::ok("The CA (Test CA) has successfully been registered on the database.")
    );
    assert!(dir.path().join("test_ca").is_dir());
    assert!(!dir.path().join("__test_ca__").exists());

    let metadata = fs::read_to_string(dir.path().join("test_ca/ca/ca.json")).unwrap();
    let metadata: serde_json::Value = serde_json::from_str(&metadata).unwrap();
    assert_eq!(metadata["ca_name"], "Test CA");
    assert_eq!(metadata["common_name"], "Test Root");

    let leaf = privca(
        dir.path(),
        &["-t", "tls-certs", "-r", " Test CA ", "-c", " a.local , b.local "],
    );
    assert!(leaf.status.success());
    assert_eq!(
        report(&leaf),
        Report::ok("The TLS certificate has been created for the FQDN (a.local).")
    );
    assert!(dir.path().join("test_ca/tls-certs/a.local.pem").exists());
}
