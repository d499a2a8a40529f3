use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const EXPECTED: &str = "author=Daisy Mae West; retailCost=34.99; quantityInStock=10
author=Clarence Meeks; retailCost=11.99; quantityInStock=4
author=Jim Heavisides; retailCost=59.99; quantityInStock=36
";

fn gridsql_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gridsql"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn run_prints_one_line_per_row() {
    let home = TempDir::new().expect("home");
    for scenario in ["locator", "registry", "0", "1"] {
        gridsql_cmd(home.path())
            .args(["run", scenario])
            .assert()
            .success()
            .stdout(EXPECTED);
    }
}

#[test]
fn unknown_example_is_rejected() {
    let home = TempDir::new().expect("home");
    gridsql_cmd(home.path())
        .args(["run", "2"])
        .assert()
        .failure()
        .stderr(contains("unknown example"));
}

#[test]
fn offline_run_reports_connection_failure() {
    let home = TempDir::new().expect("home");
    gridsql_cmd(home.path())
        .args(["run", "locator", "--offline"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(contains("connection failure").and(contains("localhost[10334]")));
}

#[test]
fn run_json_carries_states() {
    let home = TempDir::new().expect("home");
    let output = gridsql_cmd(home.path())
        .args(["run", "registry", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["scenario"], "registry");
    assert_eq!(report["lines"].as_array().map(Vec::len), Some(3));
    assert_eq!(report["states"][5], "torn_down");
}

#[test]
fn model_prints_registry_operand() {
    let home = TempDir::new().expect("home");
    gridsql_cmd(home.path())
        .args(["model", "registry"])
        .assert()
        .success()
        .stdout(contains("\"jndiClientCacheObjectKey\": \"testClientCacheObject\""))
        .stdout(contains("gridsql.adapter.GridSchemaFactory"));
}

#[test]
fn compare_reports_identical_outputs() {
    let home = TempDir::new().expect("home");
    gridsql_cmd(home.path())
        .args(["compare"])
        .assert()
        .success()
        .stdout(contains("outputs are identical"));
}

#[test]
fn home_config_changes_the_query() {
    let home = TempDir::new().expect("home");
    let dir = home.path().join(".gridsql");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(
        dir.join("harness.yaml"),
        "query: SELECT author FROM BookMaster WHERE retailCost = 0\n",
    )
    .expect("write config");

    gridsql_cmd(home.path())
        .args(["run", "locator"])
        .assert()
        .success()
        .stdout("author=Bookshop Staff\n");
}

#[test]
fn explicit_config_must_parse() {
    let home = TempDir::new().expect("home");
    let path = home.path().join("broken.yaml");
    fs::write(&path, "locator: [").expect("write config");

    gridsql_cmd(home.path())
        .args(["run", "locator", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("failed to load config"));
}

#[test]
fn missing_explicit_config_names_the_path() {
    let home = TempDir::new().expect("home");
    let path = home.path().join("absent.yaml");

    gridsql_cmd(home.path())
        .args(["model", "locator", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("failed to load config from").and(contains("absent.yaml")));
}

#[test]
fn run_logs_command_boundaries_at_info() {
    let home = TempDir::new().expect("home");
    gridsql_cmd(home.path())
        .env("RUST_LOG", "info")
        .args(["run", "locator"])
        .assert()
        .success()
        .stdout(EXPECTED)
        .stderr(contains("example starting").and(contains("example finished")));
}
