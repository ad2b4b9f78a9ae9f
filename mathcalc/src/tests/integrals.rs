use crate::ast::Expr;
use crate::calculus::{derivative, integrate, integrate_definite};
use crate::parser::parse;
use crate::simplify::simplify;

fn anti(text: &str) -> String {
    integrate(&parse(text).unwrap(), "x").unwrap().to_string()
}

#[test]
fn test_power_rule() {
    assert_eq!(anti("x**2"), "x**3/3");
    assert_eq!(anti("x"), "x**2/2");
    assert_eq!(anti("1/x"), "log(x)");
}

#[test]
fn test_constants_integrate_linearly() {
    assert_eq!(anti("5"), "5*x");
    assert_eq!(anti("3*x**2"), "x**3");
}

#[test]
fn test_trig_and_exponential_table() {
    assert_eq!(anti("sin(x)"), "-cos(x)");
    assert_eq!(anti("cos(2*x)"), "sin(2*x)/2");
    assert_eq!(anti("exp(3*x)"), "exp(3*x)/3");
}

#[test]
fn test_linear_substitution_in_powers() {
    assert_eq!(anti("(2*x + 1)**3"), "(2*x + 1)**4/8");
}

#[test]
fn test_arctangent_shape() {
    assert_eq!(anti("1/(x**2 + 1)"), "atan(x)");
}

#[test]
fn test_logarithm_antiderivative() {
    assert_eq!(anti("log(x)"), "-x + x*log(x)");
}

#[test]
fn test_integration_by_parts() {
    assert_eq!(anti("x*exp(x)"), "x*exp(x) - exp(x)");
    assert_eq!(anti("x*cos(x)"), "x*sin(x) + cos(x)");
}

#[test]
fn test_monomial_times_log_round_trips() {
    let e = parse("x*log(x)").unwrap();
    let found = integrate(&e, "x").unwrap();
    let back = derivative(&found, "x", 1).unwrap();
    assert_eq!(back, simplify(&e));
}

#[test]
fn test_definite_integral() {
    let e = parse("x**2").unwrap();
    let v = integrate_definite(&e, "x", &Expr::zero(), &Expr::one()).unwrap();
    assert_eq!(v.to_string(), "1/3");
}

#[test]
fn test_definite_integral_with_symbolic_bound() {
    let e = parse("2*x").unwrap();
    let v = integrate_definite(&e, "x", &Expr::one(), &Expr::symbol("t")).unwrap();
    assert_eq!(v.to_string(), "t**2 - 1");
}

#[test]
fn test_no_closed_form_reports_the_integrand() {
    let err = integrate(&parse("sin(x**2)").unwrap(), "x").unwrap_err();
    assert_eq!(err.to_string(), "no closed form found for integral of sin(x**2)");
}
