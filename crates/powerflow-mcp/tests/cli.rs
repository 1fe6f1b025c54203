use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn powerflow_mcp(scratch: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("powerflow-mcp").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("--scratch-dir")
        .arg(scratch)
        .arg("--log-level")
        .arg("warn");
    cmd
}

#[test]
fn list_prints_builtin_cases() {
    let scratch = tempdir().unwrap();
    powerflow_mcp(scratch.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::eq("case9\ncase14\ncase30\nieee30\n"));
}

#[test]
fn run_then_analyze_writes_png() {
    let scratch = tempdir().unwrap();
    powerflow_mcp(scratch.path())
        .args(["run", "case9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initializing network: case9..."))
        .stdout(predicate::str::contains(
            "Powerflow completed successfully and network saved to",
        ));
    assert!(scratch.path().join("case9.json").is_file());

    let out = scratch.path().join("profile.png");
    powerflow_mcp(scratch.path())
        .args(["analyze", "case9", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("9 buses"));
    let bytes = fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"\x89PNG"));
}

#[test]
fn run_unknown_network_reports_not_found() {
    let scratch = tempdir().unwrap();
    powerflow_mcp(scratch.path())
        .args(["run", "case0"])
        .assert()
        .success()
        .stdout(predicate::eq("Network not found.\n"));
    assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn analyze_before_run_fails() {
    let scratch = tempdir().unwrap();
    let out = scratch.path().join("profile.png");
    powerflow_mcp(scratch.path())
        .args(["analyze", "case14", "--output"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("run the power flow first"));
    assert!(!out.exists());
}

#[test]
fn config_file_is_honoured() {
    let scratch = tempdir().unwrap();
    let config = scratch.path().join("server.toml");
    fs::write(&config, "[solver]\nmax_iterations = 1\n").unwrap();
    powerflow_mcp(scratch.path())
        .arg("--config")
        .arg(&config)
        .args(["run", "ieee30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not converge"));
}

#[test]
fn missing_config_file_fails() {
    let scratch = tempdir().unwrap();
    powerflow_mcp(scratch.path())
        .args(["--config", "/nonexistent/powerflow.toml", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading config file"));
}
