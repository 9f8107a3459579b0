// CLI integration tests for the rdb binary.
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_rdb");
    let mut command = Command::new(exe);
    command.env_remove("RDB_PATH").env_remove("RUST_LOG");
    command
}

fn run(db: &Path, args: &[&str]) -> Output {
    cmd()
        .arg("--db")
        .arg(db)
        .args(args)
        .output()
        .expect("spawn rdb")
}

fn json_lines(output: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(output)
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid json"))
        .collect()
}

#[test]
fn set_get_list_count_remove_flow() {
    let temp = tempfile::tempdir().expect("tempdir");
    let db = temp.path().join("cli_db");

    for (key, value) in [("key1", "value1"), ("key2", "value2")] {
        let set = run(&db, &["set", key, value]);
        assert!(set.status.success(), "{}", String::from_utf8_lossy(&set.stderr));
        assert_eq!(json_lines(&set.stdout)[0]["set"], key);
    }

    let get = run(&db, &["get", "key1"]);
    assert!(get.status.success());
    let got = &json_lines(&get.stdout)[0];
    assert_eq!(got["key"], "key1");
    assert_eq!(got["value"], "value1");

    let list = run(&db, &["list"]);
    assert!(list.status.success());
    let mut keys: Vec<_> = json_lines(&list.stdout)
        .iter()
        .map(|entry| entry["key"].as_str().expect("key").to_string())
        .collect();
    keys.sort();
    assert_eq!(keys, ["key1", "key2"]);

    let limited = run(&db, &["list", "--limit", "1"]);
    assert_eq!(json_lines(&limited.stdout).len(), 1);

    let count = run(&db, &["count"]);
    assert_eq!(json_lines(&count.stdout)[0]["count"], 2);

    let remove = run(&db, &["remove", "key1"]);
    assert!(remove.status.success());
    assert_eq!(json_lines(&remove.stdout)[0]["removed"], "key1");

    let count = run(&db, &["count"]);
    assert_eq!(json_lines(&count.stdout)[0]["count"], 1);
}

#[test]
fn missing_key_exits_with_not_found() {
    let temp = tempfile::tempdir().expect("tempdir");
    let db = temp.path().join("cli_db");

    let get = run(&db, &["get", "absent"]);
    assert_eq!(get.status.code(), Some(3));
    assert!(get.stdout.is_empty());
    let err = &json_lines(&get.stderr)[0]["error"];
    assert_eq!(err["kind"], "NotFound");
    assert!(err.get("code").is_none());
}

#[test]
fn database_path_can_come_from_env() {
    let temp = tempfile::tempdir().expect("tempdir");
    let db = temp.path().join("env_db");

    let set = cmd()
        .env("RDB_PATH", &db)
        .args(["set", "k", "v"])
        .output()
        .expect("spawn rdb");
    assert!(set.status.success());

    let get = run(&db, &["get", "k"]);
    assert_eq!(json_lines(&get.stdout)[0]["value"], "v");
}

#[test]
fn missing_database_path_is_usage_error() {
    let output = cmd().args(["count"]).output().expect("spawn rdb");
    assert_eq!(output.status.code(), Some(2));
    let err = &json_lines(&output.stderr)[0]["error"];
    assert_eq!(err["kind"], "Usage");
}

#[test]
fn opening_a_directory_reports_engine_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = run(temp.path(), &["count"]);
    assert_eq!(output.status.code(), Some(8));
    let err = &json_lines(&output.stderr)[0]["error"];
    assert_eq!(err["kind"], "IsDir");
    assert_eq!(err["code"], 54);
    assert!(err["message"].as_str().expect("message").starts_with("open "));
}
