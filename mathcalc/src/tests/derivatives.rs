use crate::calculus::derivative;
use crate::parser::parse;

fn diff(text: &str, var: &str, order: u32) -> String {
    derivative(&parse(text).unwrap(), var, order).unwrap().to_string()
}

#[test]
fn test_power_rule() {
    assert_eq!(diff("x**2 + 3*x", "x", 1), "2*x + 3");
    assert_eq!(diff("x**5", "x", 1), "5*x**4");
}

#[test]
fn test_higher_orders() {
    assert_eq!(diff("x**4", "x", 2), "12*x**2");
    assert_eq!(diff("sin(x)", "x", 2), "-sin(x)");
    assert_eq!(diff("x**2", "x", 3), "0");
}

#[test]
fn test_order_zero_returns_the_simplified_input() {
    assert_eq!(diff("x + x", "x", 0), "2*x");
}

#[test]
fn test_chain_rule() {
    assert_eq!(diff("sin(2*x)", "x", 1), "2*cos(2*x)");
    assert_eq!(diff("exp(x**2)", "x", 1), "2*x*exp(x**2)");
}

#[test]
fn test_product_rule() {
    assert_eq!(diff("x*sin(x)", "x", 1), "x*cos(x) + sin(x)");
}

#[test]
fn test_reciprocal() {
    assert_eq!(diff("1/x", "x", 1), "-1/x**2");
}

#[test]
fn test_transcendental_table() {
    assert_eq!(diff("log(x)", "x", 1), "1/x");
    assert_eq!(diff("exp(x)", "x", 1), "exp(x)");
    assert_eq!(diff("tan(x)", "x", 1), "tan(x)**2 + 1");
    assert_eq!(diff("atan(x)", "x", 1), "1/(x**2 + 1)");
    assert_eq!(diff("abs(x)", "x", 1), "sign(x)");
}

#[test]
fn test_symbolic_exponent_differentiates_through_logs() {
    assert_eq!(diff("x**x", "x", 1), "x**x*(log(x) + 1)");
}

#[test]
fn test_discrete_functions_rejected() {
    let err = derivative(&parse("Mod(x, 2)").unwrap(), "x", 1).unwrap_err();
    assert_eq!(err.to_string(), "cannot differentiate Mod(x, 2)");
}

#[test]
fn test_unrelated_variable_vanishes() {
    assert_eq!(diff("y**2", "x", 1), "0");
}
