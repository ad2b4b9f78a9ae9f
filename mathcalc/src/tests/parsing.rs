use crate::ast::{Constant, Expr};
use crate::error::MathError;
use crate::parser::parse;
use crate::simplify::simplify;

#[test]
fn test_parse_integer() {
    assert_eq!(parse("42").unwrap(), Expr::integer(42));
}

#[test]
fn test_parse_decimal_is_exact() {
    assert_eq!(parse("0.25").unwrap(), Expr::rational(1, 4));
    assert_eq!(parse(".5").unwrap(), Expr::rational(1, 2));
}

#[test]
fn test_parse_scientific_notation() {
    assert_eq!(parse("2.5e3").unwrap(), Expr::integer(2500));
    assert_eq!(parse("25e-1").unwrap(), Expr::rational(5, 2));
}

#[test]
fn test_parse_huge_exponent_rejected() {
    let err = parse("1e40000").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not parse expression '1e40000': exponent out of range in '1e40000'"
    );
}

#[test]
fn test_parse_constants() {
    assert_eq!(parse("pi").unwrap(), Expr::Constant(Constant::Pi));
    assert_eq!(parse("E").unwrap(), Expr::Constant(Constant::E));
    assert_eq!(parse("I").unwrap(), Expr::Constant(Constant::I));
    assert_eq!(parse("oo").unwrap(), Expr::Constant(Constant::Infinity));
    assert_eq!(parse("zoo").unwrap(), Expr::Constant(Constant::ComplexInfinity));
}

#[test]
fn test_negated_infinity() {
    let e = simplify(&parse("-oo").unwrap());
    assert_eq!(e, Expr::Constant(Constant::NegInfinity));
}

#[test]
fn test_implicit_multiplication() {
    assert_eq!(parse("2x").unwrap(), parse("2*x").unwrap());
    assert_eq!(parse("3(x + 1)").unwrap(), parse("3*(x + 1)").unwrap());
    assert_eq!(parse("2sin(x)").unwrap(), parse("2*sin(x)").unwrap());
    assert_eq!(parse("(x + 1)(x - 1)").unwrap(), parse("(x + 1)*(x - 1)").unwrap());
    assert_eq!(parse("x y").unwrap(), parse("x*y").unwrap());
}

#[test]
fn test_adjacent_numbers_do_not_multiply() {
    let err = parse("2 3").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not parse expression '2 3': invalid syntax at column 3"
    );
}

#[test]
fn test_empty_input_rejected() {
    assert!(matches!(parse(""), Err(MathError::Parse { .. })));
}

#[test]
fn test_power_is_right_associative() {
    // 2**3**2 groups as 2**(3**2)
    assert_eq!(simplify(&parse("2**3**2").unwrap()), Expr::integer(512));
}

#[test]
fn test_caret_spelling_of_power() {
    assert_eq!(parse("x^2").unwrap(), parse("x**2").unwrap());
}

#[test]
fn test_signed_exponent() {
    assert_eq!(simplify(&parse("2**-2").unwrap()), Expr::rational(1, 4));
}

#[test]
fn test_postfix_factorial() {
    assert_eq!(simplify(&parse("5!").unwrap()), Expr::integer(120));
}

#[test]
fn test_sqrt_and_cbrt_lower_to_powers() {
    assert_eq!(
        parse("sqrt(x)").unwrap(),
        Expr::pow(Expr::symbol("x"), Expr::rational(1, 2))
    );
    assert_eq!(
        parse("cbrt(x)").unwrap(),
        Expr::pow(Expr::symbol("x"), Expr::rational(1, 3))
    );
}

#[test]
fn test_two_argument_log_changes_base() {
    assert_eq!(parse("log(x, 2)").unwrap(), parse("log(x)/log(2)").unwrap());
}

#[test]
fn test_function_name_without_arguments() {
    let err = parse("sqrt").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not parse expression 'sqrt': missing argument list for function 'sqrt'"
    );
}

#[test]
fn test_symbol_applied_to_group_is_adjacency() {
    assert_eq!(parse("x(x + 1)").unwrap(), parse("x*(x + 1)").unwrap());
}

#[test]
fn test_unknown_multi_argument_call_rejected() {
    let err = parse("foo(1, 2)").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not parse expression 'foo(1, 2)': unknown function 'foo'"
    );
}

#[test]
fn test_arity_errors() {
    let err = parse("sin(1, 2)").unwrap_err();
    assert!(err.to_string().contains("sin() takes exactly 1 argument, got 2"));
    let err = parse("log(1, 2, 3)").unwrap_err();
    assert!(err.to_string().contains("log() takes 1 or 2 arguments, got 3"));
    let err = parse("Mod(1)").unwrap_err();
    assert!(err.to_string().contains("Mod() takes exactly 2 arguments, got 1"));
}

#[test]
fn test_function_aliases() {
    assert_eq!(parse("arcsin(x)").unwrap(), parse("asin(x)").unwrap());
    assert_eq!(parse("ln(x)").unwrap(), parse("log(x)").unwrap());
    assert_eq!(parse("abs(x)").unwrap(), parse("Abs(x)").unwrap());
}

#[test]
fn test_unary_signs_stack() {
    assert_eq!(simplify(&parse("--x").unwrap()), Expr::symbol("x"));
    assert_eq!(simplify(&parse("-x").unwrap()), Expr::symbol("x").neg());
}

#[test]
fn test_minus_is_subtraction_not_adjacency() {
    assert_eq!(simplify(&parse("x - 1").unwrap()).to_string(), "x - 1");
}
