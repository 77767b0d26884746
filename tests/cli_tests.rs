//! CLI end-to-end tests.
//!
//! These tests spawn the `pyrmute` binary and check stdout and exit codes:
//! - 0: Success
//! - 2: Invalid arguments or configuration
//! - 3: Input not found
//! - 4: Invalid input tree
//! - 5: Execution failed

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use pyrmute::pyrmute_core::{build, Location, Module};
use serde_json::Value;
use tempfile::TempDir;

/// Run pyrmute in `dir` and return (stdout, exit_code).
fn run_pyrmute(dir: &Path, args: &[&str]) -> (String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_pyrmute"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute pyrmute");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    (stdout, output.status.code().unwrap_or(-1))
}

fn loc() -> Location {
    Location::new(1, 0)
}

/// `v = [1]` then `v.append(2)`.
fn vector_unit() -> Module {
    Module::new(vec![
        build::assign(
            vec![build::name("v", loc())],
            build::list(vec![build::int(1, loc())], loc()),
            loc(),
        ),
        build::expr_stmt(
            build::name("v", loc()).method("append", vec![build::int(2, loc())]),
            loc(),
        ),
    ])
}

fn write_unit(dir: &Path, name: &str, module: &Module) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, module.to_json().unwrap()).unwrap();
    path
}

// ============================================================================
// rewrite
// ============================================================================

#[test]
fn rewrite_emits_json_tree() {
    let dir = TempDir::new().unwrap();
    write_unit(dir.path(), "unit.json", &vector_unit());

    let (stdout, code) = run_pyrmute(dir.path(), &["rewrite", "unit.json"]);
    assert_eq!(code, 0, "stdout: {}", stdout);

    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["schema_version"], "1");
    let file = &json["files"][0];
    assert_eq!(file["imports"], 2);
    assert_eq!(file["input_hash"].as_str().unwrap().len(), 64);

    let tree: Module = serde_json::from_value(file["tree"].clone()).unwrap();
    assert_eq!(tree.body.len(), 4);
}

#[test]
fn rewrite_source_with_dump() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("trees")).unwrap();
    write_unit(&dir.path().join("trees"), "unit.json", &vector_unit());

    let (stdout, code) = run_pyrmute(
        dir.path(),
        &["rewrite", "trees", "--format", "source", "--dump"],
    );
    assert_eq!(code, 0, "stdout: {}", stdout);

    let json: Value = serde_json::from_str(&stdout).unwrap();
    let source = json["files"][0]["source"].as_str().unwrap();
    assert!(source.ends_with("v = _pvector([1])\nv = _invoke(v, 'append', 2)\n"));
    let dump = fs::read_to_string(dir.path().join("trees").join("unit-dump.py")).unwrap();
    assert_eq!(dump, source);
}

#[test]
fn config_prefix_is_honored() {
    let dir = TempDir::new().unwrap();
    write_unit(dir.path(), "unit.json", &vector_unit());
    fs::write(dir.path().join("pyrmute.toml"), "[rewrite]\nprefix = \"pm_\"\n").unwrap();

    let (stdout, code) = run_pyrmute(dir.path(), &["rewrite", "--format", "source", "unit.json"]);
    assert_eq!(code, 0, "stdout: {}", stdout);
    assert!(stdout.contains("pm_invoke(v, 'append', 2)"));
}

#[test]
fn missing_input_returns_exit_3() {
    let dir = TempDir::new().unwrap();
    let (stdout, code) = run_pyrmute(dir.path(), &["rewrite", "absent.json"]);
    assert_eq!(code, 3);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 3);
}

#[test]
fn invalid_tree_returns_exit_4() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.json"), "not json").unwrap();
    let (_, code) = run_pyrmute(dir.path(), &["rewrite", "bad.json"]);
    assert_eq!(code, 4);
}

#[test]
fn invalid_config_returns_exit_2() {
    let dir = TempDir::new().unwrap();
    write_unit(dir.path(), "unit.json", &vector_unit());
    fs::write(dir.path().join("pyrmute.toml"), "[runtime]\ninvoke = \"invoke\"\n").unwrap();
    let (stdout, code) = run_pyrmute(dir.path(), &["rewrite", "unit.json"]);
    assert_eq!(code, 2, "stdout: {}", stdout);
}

// ============================================================================
// render and exec
// ============================================================================

#[test]
fn render_prints_source() {
    let dir = TempDir::new().unwrap();
    write_unit(dir.path(), "unit.json", &vector_unit());
    let (stdout, code) = run_pyrmute(dir.path(), &["render", "unit.json"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "v = [1]\nv.append(2)\n");
}

#[test]
fn exec_reports_bindings() {
    let dir = TempDir::new().unwrap();
    write_unit(dir.path(), "unit.json", &vector_unit());

    let (stdout, code) = run_pyrmute(dir.path(), &["exec", "unit.json"]);
    assert_eq!(code, 0, "stdout: {}", stdout);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["rewritten"], true);
    assert_eq!(json["bindings"]["v"], "pvector([1, 2])");

    let (stdout, _) = run_pyrmute(dir.path(), &["exec", "--no-rewrite", "unit.json"]);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["bindings"]["v"], "[1, 2]");
}

#[test]
fn exec_failure_returns_exit_5() {
    let dir = TempDir::new().unwrap();
    let unit = Module::new(vec![build::expr_stmt(build::name("missing", loc()), loc())]);
    write_unit(dir.path(), "unit.json", &unit);
    let (stdout, code) = run_pyrmute(dir.path(), &["exec", "unit.json"]);
    assert_eq!(code, 5);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["error"]["path"], "unit.json");
}
