//! CLI integration tests: spawn the `json-to-proto` binary and check exit
//! codes, files written and stdout/stderr.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn json_to_proto() -> Command {
    cargo_bin_cmd!("json-to-proto")
}

fn write_input(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

// ──────────────────────────────────────────────
// 1. Usage
// ──────────────────────────────────────────────

#[test]
fn convert_without_paths_prints_usage() {
    json_to_proto()
        .arg("convert")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn convert_without_output_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "in.json", r#"{"a": 1}"#);
    json_to_proto()
        .args(["convert", "-i"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--out"));
}

// ──────────────────────────────────────────────
// 2. Convert
// ──────────────────────────────────────────────

#[test]
fn convert_writes_message_and_proto() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "in.json", r#"{"user": {"name": "ada"}, "ids": [1, 2]}"#);
    let out = dir.path().join("out.bin");
    let proto = dir.path().join("out.proto");
    let descriptor = dir.path().join("out.desc");

    json_to_proto()
        .args(["convert", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&out)
        .arg("--proto-out")
        .arg(&proto)
        .arg("--descriptor-out")
        .arg(&descriptor)
        .assert()
        .success();

    assert!(!fs::read(&out).unwrap().is_empty());
    assert!(!fs::read(&descriptor).unwrap().is_empty());
    let src = fs::read_to_string(&proto).unwrap();
    assert!(src.contains("message USER_1 {"), "{src}");
    assert!(src.contains("repeated int64 ids = 3;"), "{src}");
}

#[test]
fn missing_input_is_reported() {
    let dir = TempDir::new().unwrap();
    json_to_proto()
        .args(["convert", "-i"])
        .arg(dir.path().join("absent.json"))
        .arg("-o")
        .arg(dir.path().join("out.bin"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("input file does not exist"));
}

#[test]
fn failing_conversion_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "in.json", r#"{"a": [1, "x"]}"#);
    let out = dir.path().join("out.bin");
    json_to_proto()
        .args(["convert", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("array started with integer"));
    assert!(!out.exists());
}

#[test]
fn malformed_json_names_line() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "in.json", "{\n\"a\": ,\n}");
    json_to_proto()
        .args(["convert", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.bin"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn failed_side_output_keeps_message_unwritten() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "in.json", r#"{"a": 1}"#);
    let out = dir.path().join("out.bin");
    let blocker = dir.path().join("blocker");
    fs::create_dir(&blocker).unwrap();

    json_to_proto()
        .args(["convert", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&out)
        .arg("--proto-out")
        .arg(&blocker)
        .assert()
        .failure();
    assert!(!out.exists());
    assert!(blocker.is_dir());
}

#[test]
fn convert_dumps_message_json() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "in.json", r#"{"n": 7, "tags": ["x"], "owner": {"ok": true}}"#);
    let dump = dir.path().join("message.json");

    json_to_proto()
        .args(["convert", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.bin"))
        .arg("--message-json-out")
        .arg(&dump)
        .assert()
        .success();

    let message: serde_json::Value = serde_json::from_str(&fs::read_to_string(&dump).unwrap()).unwrap();
    assert_eq!(message["type_name"], "ROOT");
    assert_eq!(message["fields"]["n"], 7);
    assert_eq!(message["fields"]["tags"], serde_json::json!(["x"]));
    assert_eq!(message["fields"]["owner_1"]["type_name"], "OWNER_1");
    assert_eq!(message["fields"]["owner_1"]["fields"]["ok"], true);
}

// ──────────────────────────────────────────────
// 3. Schema
// ──────────────────────────────────────────────

#[test]
fn schema_prints_proto_by_default() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "in.json", r#"{"a": [{"x": 1}, {"y": "z"}]}"#);
    json_to_proto()
        .args(["schema", "-i"])
        .arg(&input)
        .args(["--package", "acme.events"])
        .assert()
        .success()
        .stdout(predicate::str::contains("package acme.events;"))
        .stdout(predicate::str::contains("optional A_1_4_5 a_1_4_5 = 4;"));
}

#[test]
fn schema_json_with_pointer_and_config() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "in.json", r#"{"data": {"tags": [], "n": 1}}"#);
    let config = write_input(&dir, "options.json", r#"{"empty_arrays": "reject"}"#);

    json_to_proto()
        .args(["schema", "-i"])
        .arg(&input)
        .args(["--json-pointer", "/data", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("#/tags"));

    let out = json_to_proto()
        .args(["schema", "--format", "json", "-i"])
        .arg(&input)
        .args(["--json-pointer", "/data"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let schema: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(schema["root"], "ROOT");
    assert_eq!(schema["types"][0]["fields"][0]["name"], "n");
    assert_eq!(schema["types"][0]["fields"].as_array().unwrap().len(), 1);
}

#[test]
fn bad_config_key_names_path() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "in.json", r#"{"n": 1}"#);
    let config = write_input(&dir, "options.json", r#"{"scalar_arrays": "sloppy"}"#);
    json_to_proto()
        .args(["schema", "-i"])
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("scalar_arrays"));
}
