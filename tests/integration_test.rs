// file: tests/integration_test.rs
// version: 1.0.0
// guid: 1c6f82a4-93d5-4b07-ae29-65d80c3f41b9

//! Integration tests for incus-provision

use assert_cmd::Command;
use incus_provision::{
    config::RunConfig,
    credentials,
    steps::StepOutcome,
    system::{
        detect::{detect_from, PackageManager},
        CommandRunner, DurableLog,
    },
    uninstall::{self, RemovalPaths},
    update, ProvisionError,
};
use predicates::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

fn runner_in(dir: &TempDir) -> CommandRunner {
    let log = DurableLog::open(dir.path().join("run.log")).unwrap();
    CommandRunner::new(Arc::new(log), false)
}

#[test]
fn test_detection_matrix() {
    let cases = [
        ("ubuntu", PackageManager::Apt),
        ("debian", PackageManager::Apt),
        ("fedora", PackageManager::Dnf),
        ("rocky", PackageManager::Dnf),
    ];

    for (id, expected) in cases {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("os-release");
        std::fs::write(&path, format!("ID={}\nPRETTY_NAME=\"{}\"\n", id, id)).unwrap();

        let profile = detect_from(&path, true).unwrap();
        assert_eq!(profile.pkg, expected, "id={}", id);
    }

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("os-release");
    std::fs::write(&path, "ID=slackware\n").unwrap();
    assert!(matches!(
        detect_from(&path, true),
        Err(ProvisionError::UnsupportedOs(_))
    ));
}

#[tokio::test]
async fn test_command_runner_audit_trail() {
    let dir = TempDir::new().unwrap();
    let runner = runner_in(&dir);

    runner.run("sh", &["-c", "echo provisioning step"]).await.unwrap();
    let err = runner.run("sh", &["-c", "exit 3"]).await.unwrap_err();
    match err {
        ProvisionError::CommandFailed { code, .. } => assert_eq!(code, 3),
        other => panic!("unexpected error: {}", other),
    }

    // Every executed command left an entry before the flow moved on
    let content = std::fs::read_to_string(runner.log().path()).unwrap();
    assert!(content.contains("+ sh -c echo provisioning step"));
    assert!(content.contains("provisioning step"));
    assert!(content.contains("FATAL: sh -c exit 3 (exit 3)"));
}

#[tokio::test]
async fn test_credential_reissue_grows_backup_dir() {
    let dir = TempDir::new().unwrap();
    let runner = runner_in(&dir);
    let key = dir.path().join("client.key");
    let cert = dir.path().join("client.crt");
    let backups = dir.path().join("backups");

    credentials::issue_at(&runner, &key, &cert, &backups)
        .await
        .unwrap();
    let first = std::fs::read_dir(&backups).map(|d| d.count()).unwrap_or(0);

    credentials::issue_at(&runner, &key, &cert, &backups)
        .await
        .unwrap();
    let second = std::fs::read_dir(&backups).unwrap().count();

    assert!(second > first);
    assert!(key.exists());
    assert!(cert.exists());
}

#[test]
fn test_self_update_rejects_bad_payloads_without_replacement() {
    let dir = TempDir::new().unwrap();
    let log = DurableLog::open(dir.path().join("run.log")).unwrap();
    let target = dir.path().join("incus-provision");
    let backups = dir.path().join("backups");
    std::fs::write(&target, b"#!/bin/sh\necho current\n").unwrap();

    let bad_payloads: [&[u8]; 3] = [
        b"",
        b"plain text, no marker\n",
        b"<!DOCTYPE html>\n<html>Not Found</html>\n",
    ];
    for payload in bad_payloads {
        let err = update::apply_payload(payload, &target, &backups, &log).unwrap_err();
        assert!(matches!(err, ProvisionError::UpdateRejected(_)));
    }

    assert_eq!(
        std::fs::read(&target).unwrap(),
        b"#!/bin/sh\necho current\n"
    );
    assert!(!backups.exists());
}

#[test]
fn test_self_update_applies_valid_payload() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let log = DurableLog::open(dir.path().join("run.log")).unwrap();
    let target = dir.path().join("incus-provision");
    let backups = dir.path().join("backups");
    std::fs::write(&target, b"#!/bin/sh\necho v1\n").unwrap();

    let payload = b"#!/bin/sh\necho v2\n";
    update::apply_payload(payload, &target, &backups, &log).unwrap();

    assert_eq!(std::fs::read(&target).unwrap(), payload);
    assert_eq!(std::fs::read_dir(&backups).unwrap().count(), 1);
    let mode = std::fs::metadata(&target).unwrap().permissions().mode();
    assert_eq!(mode & 0o111, 0o111);
}

#[tokio::test]
async fn test_uninstall_is_total_best_effort() {
    let dir = TempDir::new().unwrap();
    let os_release = dir.path().join("os-release");
    std::fs::write(&os_release, "ID=debian\nVERSION_CODENAME=bookworm\n").unwrap();
    let profile = detect_from(&os_release, true).unwrap();

    // Point removal at read-only-ish nonsense: nothing exists, package
    // commands fail, and the flow must still return all outcomes.
    let removal = RemovalPaths {
        compiled_binary: dir.path().join("none/incusd"),
        unit_dir: dir.path().join("none/units"),
        client_key: dir.path().join("none/client.key"),
        client_cert: dir.path().join("none/client.crt"),
        backup_dir: dir.path().join("backups"),
        apt_source: dir.path().join("none/zabbly.sources"),
        apt_keyring: dir.path().join("none/zabbly.asc"),
        dnf_repo: dir.path().join("none/zabbly.repo"),
        data_dirs: vec![dir.path().join("none/var-lib")],
    };

    let outcomes = uninstall::uninstall(&profile, &runner_in(&dir), &removal).await;
    assert_eq!(outcomes.len(), 7);
    assert!(outcomes
        .iter()
        .all(|(_, o)| matches!(o, StepOutcome::Completed | StepOutcome::Skipped(_) | StepOutcome::Failed(_))));
}

#[test]
fn test_run_config_defaults() {
    let config = RunConfig::default();
    assert!(config.run_init);
    assert_eq!(config.git_url, RunConfig::DEFAULT_GIT_URL);
}

#[test]
fn test_cli_help_and_invalid_arguments() {
    Command::cargo_bin("incus-provision")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("uninstall"))
        .stdout(predicate::str::contains("update"));

    // Invalid arguments exit 2
    Command::cargo_bin("incus-provision")
        .unwrap()
        .arg("--definitely-not-a-flag")
        .assert()
        .failure()
        .code(2);
}
