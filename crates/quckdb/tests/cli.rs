use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn quckdb() -> Command {
    let mut cmd: Command = cargo_bin_cmd!("quckdb").into();
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("QUCKDB_MONGO_URI");
    cmd.env_remove("QUCKDB_POSTGRES_URI");
    cmd.env_remove("QUCKDB_SCYLLA_HOSTS");
    cmd
}

// --- Binary startup ---

#[test]
fn binary_runs() {
    quckdb()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quckdb"));
}

#[test]
fn migrate_lists_subcommands() {
    quckdb()
        .args(["migrate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("conversations"))
        .stdout(predicate::str::contains("messages"));
}

#[test]
fn migrate_messages_help_shows_scylla_defaults() {
    quckdb()
        .args(["migrate", "messages", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--scylla-hosts"))
        .stdout(predicate::str::contains("--scylla-keyspace"))
        .stdout(predicate::str::contains("[default: 1000]"));
}

// --- Check ---

#[test]
fn check_passes_for_development_data() {
    quckdb()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("audit_logs: 7 documents"))
        .stdout(predicate::str::contains("user_presence: 5 documents"))
        .stdout(predicate::str::contains("total: 20 documents"))
        .stderr(predicate::str::contains("All integrity checks passed"));
}

#[test]
fn check_snake_style() {
    quckdb()
        .args(["check", "--style", "snake"])
        .assert()
        .success()
        .stdout(predicate::str::contains("snake keys"));
}

#[test]
fn check_rejects_unknown_style() {
    quckdb()
        .args(["check", "--style", "kebab"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("kebab"));
}

// --- Show ---

#[test]
fn show_presence_camel() {
    quckdb()
        .args(["show", "user_presence"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"userId\""))
        .stdout(predicate::str::contains("\"status\":\"away\""))
        .stdout(predicate::str::contains("\"statusText\":\"\""));
}

#[test]
fn show_audit_snake_has_severity() {
    quckdb()
        .args(["show", "audit_logs", "--style", "snake"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"severity\":\"warning\""))
        .stdout(predicate::str::contains("\"user_id\":null"))
        .stdout(predicate::str::contains("\"userId\"").not());
}

#[test]
fn show_unknown_collection_fails() {
    quckdb()
        .args(["show", "messages"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown collection"));
}

#[test]
fn show_writes_json_lines_to_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("files.jsonl");

    quckdb()
        .args(["show", "file_metadata", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    for line in &lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(value["sizeBytes"].as_i64().unwrap() > 0);
    }
    assert!(lines[0].contains("design-v2.png"));
}

// --- Seed ---

#[test]
fn seed_dry_run_needs_no_database() {
    quckdb()
        .args(["seed", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Dry run: 20 documents rendered, nothing written.",
        ))
        .stderr(predicate::str::contains("user_presence: 5 documents (created)"));
}

#[test]
fn seed_dry_run_fresh_snake() {
    quckdb()
        .args(["seed", "--dry-run", "--fresh", "--style", "snake"])
        .assert()
        .success()
        .stdout(predicate::str::contains("20 documents rendered"));
}
