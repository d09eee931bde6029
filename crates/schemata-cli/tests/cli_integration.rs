//! End-to-end tests for the `schemata` binary
//!
//! These tests run the compiled binary against fixture files and check the
//! test-suite runner exit codes.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn schemata(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schemata"))
        .args(args)
        .current_dir(dir)
        .env_remove("SCHEMATA_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run schemata")
}

fn suite(dir: &Path) {
    fs::write(
        dir.join("suite.json"),
        r#"[
            {
                "description": "unevaluatedProperties",
                "schema": {
                    "type": "object",
                    "properties": {"a": {}},
                    "unevaluatedProperties": false
                },
                "tests": [
                    {"data": {"a": 1}, "valid": true},
                    {"data": {"a": 1, "b": 2}, "valid": false}
                ]
            },
            {
                "description": "remote reference",
                "schema": {"$ref": "http://localhost:1234/integer.json"},
                "tests": [
                    {"data": 1, "valid": true},
                    {"data": "a", "valid": false}
                ]
            }
        ]"#,
    )
    .unwrap();
}

#[test]
fn test_eval_valid_exits_zero() {
    let dir = TempDir::new().unwrap();
    suite(dir.path());
    let output = schemata(
        &["-q", "eval", "--schema", "suite.json#/0/schema", "--instance", "suite.json#/0/tests/0/data"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(0));
}

#[cfg(unix)]
#[test]
fn test_eval_invalid_exits_minus_one() {
    let dir = TempDir::new().unwrap();
    suite(dir.path());
    let output = schemata(
        &["-q", "eval", "--schema", "suite.json#/0/schema", "--instance", "suite.json#/0/tests/1/data"],
        dir.path(),
    );
    // -1 is reported as 255 by the operating system
    assert_eq!(output.status.code(), Some(255));
}

#[test]
fn test_eval_unsupported_version_exits_two() {
    let dir = TempDir::new().unwrap();
    suite(dir.path());
    let output = schemata(
        &[
            "-q",
            "eval",
            "--schema",
            "suite.json#/0/schema",
            "--instance",
            "suite.json#/0/tests/0/data",
            "--spec-version",
            "draft-04",
        ],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("draft-04"));
}

#[test]
fn test_eval_missing_file_exits_one() {
    let dir = TempDir::new().unwrap();
    let output = schemata(
        &["-q", "eval", "--schema", "absent.json#", "--instance", "absent.json#"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_eval_remote_reference_through_config_mapping() {
    let dir = TempDir::new().unwrap();
    suite(dir.path());
    fs::create_dir(dir.path().join("remotes")).unwrap();
    fs::write(dir.path().join("remotes/integer.json"), r#"{"type": "integer"}"#).unwrap();
    fs::write(
        dir.path().join("schemata.yaml"),
        "documents:\n  mappings:\n    \"http://localhost:1234/\": remotes\n",
    )
    .unwrap();

    let valid = schemata(
        &["-q", "eval", "--schema", "suite.json#/1/schema", "--instance", "suite.json#/1/tests/0/data"],
        dir.path(),
    );
    assert_eq!(valid.status.code(), Some(0));

    let invalid = schemata(
        &["-q", "eval", "--schema", "suite.json#/1/schema", "--instance", "suite.json#/1/tests/1/data"],
        dir.path(),
    );
    assert_ne!(invalid.status.code(), Some(0));
    assert_ne!(invalid.status.code(), Some(1));
}

#[test]
fn test_validate_prints_json_output() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("schema.json"), r#"{"properties": {"name": {"type": "string"}}}"#).unwrap();
    fs::write(dir.path().join("data.json"), r#"{"name": 1}"#).unwrap();

    let output = schemata(
        &["--output", "json", "validate", "schema.json", "data.json", "--format", "basic"],
        dir.path(),
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let unit: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(unit["valid"], false);
    assert!(unit["details"].as_array().is_some_and(|details| !details.is_empty()));
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let output = schemata(&["completions", "bash"], dir.path());
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("schemata"));
}
