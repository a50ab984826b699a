//! CLI behaviour tests for the `rsonnet` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn rsonnet() -> Command {
    Command::cargo_bin("rsonnet").expect("binary builds")
}

#[test]
fn test_exec_simple_expression() {
    rsonnet()
        .args(["-e", "1 + 2 * 3"])
        .assert()
        .success()
        .stdout("7\n");
}

#[test]
fn test_exec_object_output() {
    rsonnet()
        .args(["-e", "{b: 2, a: 1}"])
        .assert()
        .success()
        .stdout("{\"a\": 1, \"b\": 2}\n");
}

#[test]
fn test_indent_flag() {
    rsonnet()
        .args(["--indent", "2", "-e", "{a: [1]}"])
        .assert()
        .success()
        .stdout("{\n  \"a\": [\n    1\n  ]\n}\n");
}

#[test]
fn test_ensure_ascii_flag() {
    rsonnet()
        .args(["--ensure-ascii", "-e", "'é'"])
        .assert()
        .success()
        .stdout("\"\\u00e9\"\n");
}

#[test]
fn test_file_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.jsonnet");
    std::fs::write(&path, "{x: 1 + 1}").unwrap();

    rsonnet()
        .arg(path.to_str().unwrap())
        .assert()
        .success()
        .stdout("{\"x\": 2}\n");
}

#[test]
fn test_stdin_input() {
    rsonnet()
        .write_stdin("[1, 2] + [3]")
        .assert()
        .success()
        .stdout("[1, 2, 3]\n");
}

#[test]
fn test_ext_str_value() {
    rsonnet()
        .args(["-V", "who=world", "-e", "'hello ' + std.extVar('who')"])
        .assert()
        .success()
        .stdout("\"hello world\"\n");
}

#[test]
fn test_ext_str_from_environment() {
    rsonnet()
        .env("GREETING", "hi")
        .args(["-V", "GREETING", "-e", "std.extVar('GREETING')"])
        .assert()
        .success()
        .stdout("\"hi\"\n");
}

#[test]
fn test_ext_str_missing_environment() {
    rsonnet()
        .env_remove("NO_SUCH_VARIABLE")
        .args(["-V", "NO_SUCH_VARIABLE", "-e", "1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("NO_SUCH_VARIABLE"));
}

#[test]
fn test_syntax_error_exit_code() {
    rsonnet()
        .args(["-e", "{a:}"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("expected expression"));
}

#[test]
fn test_runtime_error_format() {
    rsonnet()
        .args(["-e", "1/0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Runtime Error: Division by zero"));
}

#[test]
fn test_assert_error_message() {
    rsonnet()
        .args(["-e", "assert false : 'nope'; {}"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Runtime Error: nope"));
}

#[test]
fn test_missing_file_fails() {
    rsonnet()
        .arg("definitely-missing.jsonnet")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_ast_output() {
    rsonnet()
        .args(["--ast", "-e", "1 + 2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Binary"))
        .stdout(predicate::str::contains("Add"));
}

#[test]
fn test_version_flag() {
    rsonnet()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_exec_without_argument_fails() {
    rsonnet()
        .arg("-e")
        .assert()
        .failure();
}
