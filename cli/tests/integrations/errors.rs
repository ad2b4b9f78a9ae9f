use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn mathcalc(args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("mathcalc").unwrap();
    cmd.args(args);
    cmd
}

#[test]
fn test_cli_division_by_zero_is_in_band() {
    let assert = mathcalc(&["divide", "1", "0"]).assert().success();
    let body: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(body["success"], Value::Bool(false));
    assert_eq!(body["error"], "Division by zero");
}

#[test]
fn test_cli_parse_error_is_in_band() {
    let assert = mathcalc(&["simplify", "2 +* 3"]).assert().success();
    let body: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(body["success"], Value::Bool(false));
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Could not parse expression '2 +* 3':"));
}

#[test]
fn test_cli_missing_argument_aborts() {
    mathcalc(&["subtract", "1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "subtract() missing 1 required positional argument: 'b'",
        ));
}

#[test]
fn test_cli_surplus_arguments_abort() {
    mathcalc(&["subtract", "1", "2", "3"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("positional arguments"));
}

#[test]
fn test_cli_unexpected_keyword_aborts() {
    mathcalc(&["derivative", r#"{"expr_str": "x**2", "bogus": 1}"#])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "unexpected keyword argument 'bogus'",
        ));
}

#[test]
fn test_cli_unknown_operation() {
    mathcalc(&["transmogrify", "x"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Unknown operation: transmogrify"))
        .stderr(predicate::str::contains(
            "Use --help to see available operations",
        ));
}

#[test]
fn test_cli_unknown_operation_reports_lowercased_name() {
    mathcalc(&["TRANSMOGRIFY"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown operation: transmogrify"));
}

#[test]
fn test_cli_uppercase_help_is_not_help() {
    // Only the exact spellings -h, --help and help open the catalog.
    mathcalc(&["HELP"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown operation: help"));
}

#[test]
fn test_cli_no_arguments_prints_catalog() {
    mathcalc(&[])
        .assert()
        .success()
        .stdout(predicate::str::contains("Available operations:"))
        .stdout(predicate::str::contains("Arithmetic:"))
        .stdout(predicate::str::contains("Utility: evaluate, latex, compare"));
}

#[test]
fn test_cli_help_flags_exit_zero() {
    for flag in ["-h", "--help", "help"] {
        mathcalc(&[flag])
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"));
    }
}

#[test]
fn test_cli_malformed_json_object_falls_back_to_text() {
    // An argument that merely starts with '{' binds positionally.
    let assert = mathcalc(&["simplify", "{not json"]).assert().success();
    let body: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(body["success"], Value::Bool(false));
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Could not parse expression '{not json':"));
}

#[test]
fn test_cli_operation_argument_errors_abort() {
    mathcalc(&["derivative", "x**2", "x", "2.5"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "argument 'order' must be an integer",
        ));
}

#[test]
fn test_cli_unsolvable_equation_is_in_band() {
    let assert = mathcalc(&["solve", "sin(x) + log(x) + x", "x"])
        .assert()
        .success();
    let body: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(body["success"], Value::Bool(false));
}
