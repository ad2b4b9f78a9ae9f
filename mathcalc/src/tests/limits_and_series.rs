use crate::ast::{Constant, Expr};
use crate::calculus::{limit, series, summation, Direction};
use crate::parser::parse;
use crate::simplify::simplify;

fn at(text: &str, var: &str, point: Expr, dir: Direction) -> Expr {
    limit(&parse(text).unwrap(), var, &point, dir).unwrap()
}

#[test]
fn test_direct_substitution() {
    assert_eq!(at("x**2 + 1", "x", Expr::integer(2), Direction::Plus), Expr::integer(5));
}

#[test]
fn test_sin_x_over_x() {
    assert_eq!(at("sin(x)/x", "x", Expr::zero(), Direction::Plus), Expr::one());
}

#[test]
fn test_one_sided_pole() {
    assert_eq!(
        at("1/x", "x", Expr::zero(), Direction::Plus),
        Expr::Constant(Constant::Infinity)
    );
    assert_eq!(
        at("1/x", "x", Expr::zero(), Direction::Minus),
        Expr::Constant(Constant::NegInfinity)
    );
}

#[test]
fn test_even_pole_is_positive_from_both_sides() {
    assert_eq!(
        at("1/x**2", "x", Expr::zero(), Direction::Minus),
        Expr::Constant(Constant::Infinity)
    );
}

#[test]
fn test_rational_function_at_infinity() {
    assert_eq!(
        at("(2*x + 1)/(x + 3)", "x", Expr::Constant(Constant::Infinity), Direction::Minus),
        Expr::integer(2)
    );
}

#[test]
fn test_compound_interest_limit() {
    assert_eq!(
        at("(1 + 1/x)**x", "x", Expr::Constant(Constant::Infinity), Direction::Minus),
        Expr::Constant(Constant::E)
    );
}

#[test]
fn test_x_log_x_vanishes_at_zero() {
    assert_eq!(at("x*log(x)", "x", Expr::zero(), Direction::Plus), Expr::zero());
}

#[test]
fn test_undeterminable_limit_is_an_error() {
    let err = limit(
        &parse("sin(x)").unwrap(),
        "x",
        &Expr::Constant(Constant::Infinity),
        Direction::Minus,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "could not compute limit of sin(x) as x -> oo"
    );
}

#[test]
fn test_direction_parsing() {
    assert_eq!(Direction::parse("+").unwrap(), Direction::Plus);
    assert_eq!(Direction::parse("-").unwrap(), Direction::Minus);
    let err = Direction::parse("up").unwrap_err();
    assert_eq!(err.to_string(), "direction must be '+' or '-', got 'up'");
}

#[test]
fn test_series_exponential() {
    let s = series(&parse("exp(x)").unwrap(), "x", &Expr::zero(), 4).unwrap();
    assert_eq!(s.to_string(), "1 + x + x**2/2 + x**3/6 + O(x**4)");
}

#[test]
fn test_series_skips_zero_coefficients() {
    let s = series(&parse("cos(x)").unwrap(), "x", &Expr::zero(), 5).unwrap();
    assert_eq!(s.to_string(), "1 - x**2/2 + x**4/24 + O(x**5)");
}

#[test]
fn test_series_sine() {
    let s = series(&parse("sin(x)").unwrap(), "x", &Expr::zero(), 6).unwrap();
    assert_eq!(s.to_string(), "x - x**3/6 + x**5/120 + O(x**6)");
}

#[test]
fn test_series_around_a_nonzero_point() {
    let s = series(&parse("log(x)").unwrap(), "x", &Expr::one(), 2).unwrap();
    assert_eq!(s.to_string(), "x - 1 + O((x - 1)**2)");
}

#[test]
fn test_series_order_zero_is_bare_remainder() {
    let s = series(&parse("exp(x)").unwrap(), "x", &Expr::zero(), 0).unwrap();
    assert_eq!(s.to_string(), "O(1)");
}

#[test]
fn test_series_requires_a_finite_point() {
    let err = series(
        &parse("exp(x)").unwrap(),
        "x",
        &Expr::Constant(Constant::Infinity),
        3,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "series expansion requires a finite point");
}

#[test]
fn test_series_rejects_poles() {
    let err = series(&parse("1/x").unwrap(), "x", &Expr::zero(), 3).unwrap_err();
    assert_eq!(err.to_string(), "series expansion failed at x = 0");
}

#[test]
fn test_finite_sums_iterate() {
    let v = summation(&parse("k").unwrap(), "k", &Expr::integer(1), &Expr::integer(10)).unwrap();
    assert_eq!(v, Expr::integer(55));
    let v = summation(&parse("k**2").unwrap(), "k", &Expr::integer(1), &Expr::integer(5)).unwrap();
    assert_eq!(v, Expr::integer(55));
}

#[test]
fn test_empty_range_sums_to_zero() {
    let v = summation(&parse("k").unwrap(), "k", &Expr::integer(5), &Expr::integer(1)).unwrap();
    assert_eq!(v, Expr::zero());
}

#[test]
fn test_geometric_series() {
    let v = summation(
        &parse("(1/2)**k").unwrap(),
        "k",
        &Expr::zero(),
        &Expr::Constant(Constant::Infinity),
    )
    .unwrap();
    assert_eq!(v, Expr::integer(2));
}

#[test]
fn test_divergent_geometric_series() {
    let err = summation(
        &parse("2**k").unwrap(),
        "k",
        &Expr::zero(),
        &Expr::Constant(Constant::Infinity),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "sum diverges: common ratio is not inside the unit interval"
    );
}

#[test]
fn test_basel_sum() {
    let v = summation(
        &parse("1/k**2").unwrap(),
        "k",
        &Expr::one(),
        &Expr::Constant(Constant::Infinity),
    )
    .unwrap();
    assert_eq!(v.to_string(), "pi**2/6");
}

#[test]
fn test_reciprocal_factorial_sums() {
    let v = summation(
        &parse("1/factorial(k)").unwrap(),
        "k",
        &Expr::zero(),
        &Expr::Constant(Constant::Infinity),
    )
    .unwrap();
    assert_eq!(v, Expr::Constant(Constant::E));
    let v = summation(
        &parse("1/factorial(k)").unwrap(),
        "k",
        &Expr::one(),
        &Expr::Constant(Constant::Infinity),
    )
    .unwrap();
    assert_eq!(v.to_string(), "E - 1");
}

#[test]
fn test_symbolic_upper_bounds_use_closed_forms() {
    let v = summation(&parse("k").unwrap(), "k", &Expr::one(), &Expr::symbol("n")).unwrap();
    assert_eq!(v.to_string(), "n*(n + 1)/2");
    assert_eq!(
        simplify(&v.subs_symbol("n", &Expr::integer(10))),
        Expr::integer(55)
    );

    let v = summation(&parse("k**2").unwrap(), "k", &Expr::one(), &Expr::symbol("n")).unwrap();
    assert_eq!(v.to_string(), "n*(n + 1)*(2*n + 1)/6");
}
