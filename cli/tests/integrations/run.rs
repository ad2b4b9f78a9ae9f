use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn run_json(args: &[&str]) -> Value {
    let mut cmd = Command::cargo_bin("mathcalc").unwrap();
    cmd.args(args);
    let assert = cmd.assert().success();
    serde_json::from_slice(&assert.get_output().stdout).unwrap()
}

#[test]
fn test_cli_add_integers() {
    let body = run_json(&["add", "5", "3"]);
    assert_eq!(body["success"], Value::Bool(true));
    assert_eq!(body["result"], "8");
    assert_eq!(body["numeric"], 8.0);
    assert_eq!(body["type"], "Integer");
}

#[test]
fn test_cli_derivative() {
    let body = run_json(&["derivative", "x**2 + 3*x", "x"]);
    assert_eq!(body["result"], "2*x + 3");
    assert_eq!(body["latex"], "2 \\cdot x + 3");
    assert_eq!(body["numeric"], Value::Null);
    assert_eq!(body["type"], "Add");
}

#[test]
fn test_cli_operation_name_is_case_insensitive() {
    let body = run_json(&["DERIVATIVE", "x**2", "x"]);
    assert_eq!(body["result"], "2*x");
}

#[test]
fn test_cli_alias_diff() {
    let body = run_json(&["diff", "x**3", "x"]);
    assert_eq!(body["result"], "3*x**2");
}

#[test]
fn test_cli_solve_quadratic() {
    let body = run_json(&["solve", "x**2 - 4", "x"]);
    assert_eq!(body["solutions"], serde_json::json!(["-2", "2"]));
    assert_eq!(body["count"], 2);
}

#[test]
fn test_cli_solve_equation_with_equals_sign() {
    let body = run_json(&["solve", "2*x + 1 = 7", "x"]);
    assert_eq!(body["solutions"], serde_json::json!(["3"]));
}

#[test]
fn test_cli_json_object_arguments() {
    let body = run_json(&[
        "derivative",
        r#"{"expr_str": "x**3", "var_str": "x", "order": 2}"#,
    ]);
    assert_eq!(body["result"], "6*x");
}

#[test]
fn test_cli_json_array_arguments() {
    let body = run_json(&["gcd", "[12, 18, 24]"]);
    assert_eq!(body["result"], "6");
}

#[test]
fn test_cli_implicit_multiplication() {
    let body = run_json(&["simplify", "2x + 3x"]);
    assert_eq!(body["result"], "5*x");
}

#[test]
fn test_cli_determinant() {
    let body = run_json(&["det", "[[1, 2], [3, 4]]"]);
    assert_eq!(body["result"], "-2");
}

#[test]
fn test_cli_is_prime_envelope_shape() {
    let body = run_json(&["is_prime", "17"]);
    assert_eq!(body["success"], Value::Bool(true));
    assert_eq!(body["is_prime"], Value::Bool(true));
    assert_eq!(body["number"], 17);
}

#[test]
fn test_cli_evaluate_alias_and_precision() {
    let body = run_json(&["eval", "pi", "4"]);
    assert_eq!(body["result"], "3.142");
}

#[test]
fn test_cli_pretty_printed_output() {
    let mut cmd = Command::cargo_bin("mathcalc").unwrap();
    cmd.args(["add", "1", "2"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("{\n  \"success\": true"));
}

#[test]
fn test_cli_envelope_key_order() {
    let mut cmd = Command::cargo_bin("mathcalc").unwrap();
    cmd.args(["simplify", "x + x"]);
    let assert = cmd.assert().success();
    let text = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    let keys = ["\"success\"", "\"result\"", "\"latex\"", "\"numeric\"", "\"type\""];
    let positions: Vec<usize> = keys.iter().map(|key| text.find(key).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}
