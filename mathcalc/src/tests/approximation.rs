use crate::numeric::{
    approx, complex_string, eval_complex, eval_real, fmt_float, fmt_sig, order_key, NumericValue,
};
use crate::parser::parse;
use crate::simplify::simplify;

fn approx_of(text: &str) -> NumericValue {
    approx(&simplify(&parse(text).unwrap()))
}

#[test]
fn test_real_values() {
    assert_eq!(approx_of("2 + 2"), NumericValue::Real(4.0));
    match approx_of("sqrt(2)") {
        NumericValue::Real(v) => assert!((v - std::f64::consts::SQRT_2).abs() < 1e-12),
        other => panic!("expected a real value, got {:?}", other),
    }
}

#[test]
fn test_complex_values() {
    match approx_of("sqrt(-4)") {
        NumericValue::Complex(c) => {
            assert!(c.re.abs() < 1e-12);
            assert!((c.im - 2.0).abs() < 1e-12);
        }
        other => panic!("expected a complex value, got {:?}", other),
    }
}

#[test]
fn test_partial_evaluation_keeps_symbols() {
    assert_eq!(
        approx_of("x + pi"),
        NumericValue::Partial("x + 3.14159265358979".to_string())
    );
}

#[test]
fn test_undefined_values() {
    assert_eq!(approx_of("zoo"), NumericValue::Undefined);
    assert_eq!(approx_of("0 * oo"), NumericValue::Undefined);
}

#[test]
fn test_eval_real() {
    assert_eq!(eval_real(&parse("2**10").unwrap()), Some(1024.0));
    assert_eq!(eval_real(&parse("x + 1").unwrap()), None);
    assert_eq!(eval_real(&parse("I").unwrap()), None);
}

#[test]
fn test_eval_complex() {
    let c = eval_complex(&parse("I*I").unwrap()).unwrap();
    assert_eq!(c.re, -1.0);
    assert_eq!(c.im, 0.0);
}

#[test]
fn test_fmt_sig() {
    assert_eq!(fmt_sig(std::f64::consts::PI, 4), "3.142");
    assert_eq!(fmt_sig(8.0, 15), "8.00000000000000");
    assert_eq!(fmt_sig(0.0, 5), "0");
    assert_eq!(fmt_sig(-2.5, 3), "-2.50");
    assert_eq!(fmt_sig(0.001, 3), "0.00100");
    assert_eq!(fmt_sig(123456.0, 2), "1.2e+5");
    assert_eq!(fmt_sig(0.00001, 3), "1.00e-5");
    assert_eq!(fmt_sig(f64::INFINITY, 5), "oo");
    assert_eq!(fmt_sig(f64::NEG_INFINITY, 5), "-oo");
    assert_eq!(fmt_sig(f64::NAN, 5), "nan");
}

#[test]
fn test_fmt_float() {
    assert_eq!(fmt_float(4.0), "4.0");
    assert_eq!(fmt_float(2.5), "2.5");
    assert_eq!(fmt_float(0.1 + 0.2), "0.3");
    assert_eq!(fmt_float(-1.5), "-1.5");
}

#[test]
fn test_complex_string() {
    use num_complex::Complex64;
    assert_eq!(complex_string(Complex64::new(0.0, 1.0)), "1.0*I");
    assert_eq!(complex_string(Complex64::new(1.0, -2.0)), "1.0 - 2.0*I");
    assert_eq!(complex_string(Complex64::new(0.5, 0.25)), "0.5 + 0.25*I");
}

#[test]
fn test_order_key_sorts_reals_then_complex_then_symbols() {
    let mut values = vec![
        parse("2").unwrap(),
        parse("-2").unwrap(),
        parse("I").unwrap(),
        parse("y").unwrap(),
    ];
    values.sort_by_key(order_key);
    let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    assert_eq!(rendered, vec!["-2", "2", "I", "y"]);
}
