//! Floating-point evaluation and float-style rendering.
//!
//! Exact expressions evaluate through `Complex64`; the outcome feeds the
//! `numeric` field of result payloads. Symbolic expressions render with
//! their constant subtrees collapsed to floats, the way numeric evaluation
//! of a partially symbolic expression is conventionally printed
//! (`x + 3.14159265358979`).

use crate::ast::{ordered_terms, sign_split, Constant, Expr, Func};
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive};

/// Outcome of numerically evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericValue {
    /// Finite real value.
    Real(f64),
    /// Finite value with a nonzero imaginary part.
    Complex(Complex64),
    /// Free symbols remain; holds the float-style rendering.
    Partial(String),
    /// Infinite, undefined, or not evaluable.
    Undefined,
}

pub fn approx(e: &Expr) -> NumericValue {
    if !e.free_symbols().is_empty() {
        return NumericValue::Partial(render_float(&fold_constant_subtrees(e)));
    }
    match eval_complex(e) {
        Some(c) if c.re.is_finite() && c.im.is_finite() => {
            if c.im == 0.0 {
                NumericValue::Real(c.re)
            } else {
                NumericValue::Complex(c)
            }
        }
        _ => NumericValue::Undefined,
    }
}

pub fn eval_real(e: &Expr) -> Option<f64> {
    let c = eval_complex(e)?;
    if c.im == 0.0 {
        Some(c.re)
    } else {
        None
    }
}

pub fn eval_complex(e: &Expr) -> Option<Complex64> {
    match e {
        Expr::Number(n) => Some(Complex64::new(n.to_f64()?, 0.0)),
        Expr::Constant(c) => Some(match c {
            Constant::Pi => Complex64::new(std::f64::consts::PI, 0.0),
            Constant::E => Complex64::new(std::f64::consts::E, 0.0),
            Constant::I => Complex64::new(0.0, 1.0),
            Constant::Infinity => Complex64::new(f64::INFINITY, 0.0),
            Constant::NegInfinity => Complex64::new(f64::NEG_INFINITY, 0.0),
            Constant::ComplexInfinity | Constant::NotANumber => {
                Complex64::new(f64::NAN, f64::NAN)
            }
        }),
        Expr::Symbol(_) => None,
        Expr::Add(items) => {
            let mut acc = Complex64::new(0.0, 0.0);
            for item in items {
                acc += eval_complex(item)?;
            }
            Some(acc)
        }
        Expr::Mul(items) => {
            let mut acc = Complex64::new(1.0, 0.0);
            for item in items {
                acc *= eval_complex(item)?;
            }
            Some(acc)
        }
        Expr::Pow(base, exp) => Some(complex_pow(eval_complex(base)?, eval_complex(exp)?)),
        Expr::Function(f, args) => eval_function(*f, args),
    }
}

/// Principal power, staying on the real line when possible.
fn complex_pow(b: Complex64, x: Complex64) -> Complex64 {
    if b.im == 0.0 && x.im == 0.0 {
        if b.re >= 0.0 {
            return Complex64::new(b.re.powf(x.re), 0.0);
        }
        if x.re.fract() == 0.0 && x.re.abs() < 1e9 {
            let mag = b.re.abs().powf(x.re);
            let odd = (x.re as i64).rem_euclid(2) == 1;
            return Complex64::new(if odd { -mag } else { mag }, 0.0);
        }
    }
    b.powc(x)
}

fn eval_function(f: Func, args: &[Expr]) -> Option<Complex64> {
    let a = eval_complex(&args[0])?;
    let real = a.im == 0.0;
    let one = Complex64::new(1.0, 0.0);
    let value = match f {
        Func::Sin => a.sin(),
        Func::Cos => a.cos(),
        Func::Tan => a.tan(),
        Func::Sec => one / a.cos(),
        Func::Csc => one / a.sin(),
        Func::Cot => one / a.tan(),
        Func::Asin => {
            if real && a.re.abs() <= 1.0 {
                Complex64::new(a.re.asin(), 0.0)
            } else {
                a.asin()
            }
        }
        Func::Acos => {
            if real && a.re.abs() <= 1.0 {
                Complex64::new(a.re.acos(), 0.0)
            } else {
                a.acos()
            }
        }
        Func::Atan => {
            if real {
                Complex64::new(a.re.atan(), 0.0)
            } else {
                a.atan()
            }
        }
        Func::Sinh => a.sinh(),
        Func::Cosh => a.cosh(),
        Func::Tanh => a.tanh(),
        Func::Asinh => {
            if real {
                Complex64::new(a.re.asinh(), 0.0)
            } else {
                a.asinh()
            }
        }
        Func::Acosh => {
            if real && a.re >= 1.0 {
                Complex64::new(a.re.acosh(), 0.0)
            } else {
                a.acosh()
            }
        }
        Func::Atanh => {
            if real && a.re.abs() < 1.0 {
                Complex64::new(a.re.atanh(), 0.0)
            } else {
                a.atanh()
            }
        }
        Func::Exp => a.exp(),
        Func::Log => {
            if real && a.re > 0.0 {
                Complex64::new(a.re.ln(), 0.0)
            } else {
                a.ln()
            }
        }
        Func::Abs => Complex64::new(a.norm(), 0.0),
        Func::Sign => {
            let norm = a.norm();
            if norm == 0.0 {
                Complex64::new(0.0, 0.0)
            } else {
                a / norm
            }
        }
        Func::Factorial => {
            if !real || a.re.fract() != 0.0 || a.re < 0.0 || a.re > 170.0 {
                return None;
            }
            let mut acc = 1.0f64;
            for i in 2..=(a.re as i64) {
                acc *= i as f64;
            }
            Complex64::new(acc, 0.0)
        }
        Func::Mod => {
            let b = eval_complex(&args[1])?;
            if !real || b.im != 0.0 || b.re == 0.0 {
                return None;
            }
            Complex64::new(a.re - b.re * (a.re / b.re).floor(), 0.0)
        }
        Func::Order => return None,
    };
    Some(value)
}

/// Deterministic ordering for reported value sets: reals ascending, then
/// complex values by components, then anything non-numeric by rendering.
pub(crate) fn order_key(e: &Expr) -> (u8, u64, u64, String) {
    fn total_bits(x: f64) -> u64 {
        let b = x.to_bits();
        if b & (1 << 63) != 0 {
            !b
        } else {
            b | (1 << 63)
        }
    }
    match eval_complex(e) {
        Some(c) if c.im == 0.0 && !c.re.is_nan() => (0, total_bits(c.re), 0, String::new()),
        Some(c) if !c.re.is_nan() && !c.im.is_nan() => {
            (1, total_bits(c.re), total_bits(c.im), String::new())
        }
        _ => (2, 0, 0, e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// float formatting
// ---------------------------------------------------------------------------

/// Short float style used inside rendered expressions: up to 15 significant
/// digits, trailing zeros stripped, always a decimal point.
pub fn fmt_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "oo" } else { "-oo" }.to_string();
    }
    let full = fmt_sig(x, 15);
    strip_trailing_zeros(&full)
}

/// Fixed significant-digit rendering, zeros kept, the way a requested-
/// precision evaluation prints standalone.
pub fn fmt_sig(x: f64, digits: usize) -> String {
    let digits = digits.clamp(1, 17);
    if x == 0.0 {
        return "0".to_string();
    }
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "oo" } else { "-oo" }.to_string();
    }

    let sign = if x < 0.0 { "-" } else { "" };
    let sci = format!("{:.*e}", digits - 1, x.abs());
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => (sci, 0),
    };
    let digit_chars: String = mantissa.chars().filter(|c| *c != '.').collect();

    if exp >= -4 && (exp as i64) < digits as i64 {
        let body = if exp >= 0 {
            let split = (exp + 1) as usize;
            if split == digit_chars.len() {
                format!("{}.", digit_chars)
            } else {
                format!("{}.{}", &digit_chars[..split], &digit_chars[split..])
            }
        } else {
            format!("0.{}{}", "0".repeat((-exp - 1) as usize), digit_chars)
        };
        format!("{}{}", sign, body)
    } else {
        let exp_str = if exp >= 0 {
            format!("e+{}", exp)
        } else {
            format!("e{}", exp)
        };
        format!("{}{}{}", sign, mantissa, exp_str)
    }
}

fn strip_trailing_zeros(s: &str) -> String {
    if let Some((mantissa, exp)) = s.split_once('e') {
        return format!("{}e{}", strip_trailing_zeros(mantissa), exp);
    }
    if !s.contains('.') {
        return format!("{}.0", s);
    }
    let trimmed = s.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// `re + im*I` in short float style.
pub fn complex_string(c: Complex64) -> String {
    if c.re == 0.0 {
        return format!("{}*I", fmt_float(c.im));
    }
    let sign = if c.im < 0.0 { '-' } else { '+' };
    format!("{} {} {}*I", fmt_float(c.re), sign, fmt_float(c.im.abs()))
}

// ---------------------------------------------------------------------------
// partial rendering
// ---------------------------------------------------------------------------

/// Collapse every symbol-free subtree with a finite real value into a
/// number; the float renderer then prints those as decimals.
fn fold_constant_subtrees(e: &Expr) -> Expr {
    if e.free_symbols().is_empty() && !matches!(e, Expr::Number(_)) {
        if let Some(c) = eval_complex(e) {
            if c.im == 0.0 && c.re.is_finite() {
                if let Some(r) = BigRational::from_float(c.re) {
                    return Expr::Number(r);
                }
            }
        }
    }
    match e {
        Expr::Add(items) => Expr::Add(items.iter().map(fold_constant_subtrees).collect()),
        Expr::Mul(items) => Expr::Mul(items.iter().map(fold_constant_subtrees).collect()),
        Expr::Pow(b, x) => Expr::pow(fold_constant_subtrees(b), fold_constant_subtrees(x)),
        Expr::Function(f, args) => {
            Expr::Function(*f, args.iter().map(fold_constant_subtrees).collect())
        }
        _ => e.clone(),
    }
}

fn float_of(n: &BigRational) -> String {
    fmt_float(n.to_f64().unwrap_or(f64::NAN))
}

fn render_float(e: &Expr) -> String {
    match e {
        Expr::Number(n) => float_of(n),
        Expr::Constant(c) => c.name().to_string(),
        Expr::Symbol(s) => s.clone(),
        Expr::Add(items) => render_float_add(items),
        Expr::Mul(items) => render_float_mul(items),
        Expr::Pow(_, _) => render_float_mul(std::slice::from_ref(e)),
        Expr::Function(f, args) => {
            let rendered: Vec<String> = args.iter().map(render_float).collect();
            format!("{}({})", f.name(), rendered.join(", "))
        }
    }
}

fn render_float_operand(e: &Expr) -> String {
    match e {
        Expr::Add(_) | Expr::Mul(_) => format!("({})", render_float(e)),
        Expr::Number(n) if n.is_negative() => format!("({})", render_float(e)),
        _ => render_float(e),
    }
}

fn render_float_mul(items: &[Expr]) -> String {
    let mut coeff = 1.0f64;
    let mut has_coeff = false;
    let mut numer: Vec<&Expr> = Vec::new();
    let mut denom: Vec<Expr> = Vec::new();

    for item in items {
        match item {
            Expr::Number(n) => {
                coeff *= n.to_f64().unwrap_or(f64::NAN);
                has_coeff = true;
            }
            Expr::Pow(base, exp) => {
                if let Expr::Number(k) = &**exp {
                    if k.is_negative() {
                        let flipped = -k;
                        if flipped.is_one() {
                            denom.push((**base).clone());
                        } else {
                            denom.push(Expr::pow((**base).clone(), Expr::Number(flipped)));
                        }
                        continue;
                    }
                }
                numer.push(item);
            }
            other => numer.push(other),
        }
    }

    let negative = coeff < 0.0;
    if negative {
        coeff = -coeff;
    }

    let mut num_factors: Vec<String> = Vec::new();
    if (has_coeff && coeff != 1.0) || numer.is_empty() {
        num_factors.push(fmt_float(coeff));
    }
    for f in &numer {
        num_factors.push(render_float_pow_or_operand(f));
    }
    let num_str = num_factors.join("*");

    let den_factors: Vec<String> = denom.iter().map(render_float_operand).collect();
    let body = if den_factors.is_empty() {
        num_str
    } else if den_factors.len() == 1 && !den_factors[0].contains('*') {
        format!("{}/{}", num_str, den_factors[0])
    } else {
        format!("{}/({})", num_str, den_factors.join("*"))
    };

    if negative {
        format!("-{}", body)
    } else {
        body
    }
}

fn render_float_pow_or_operand(e: &Expr) -> String {
    if let Expr::Pow(base, exp) = e {
        let base_str = match &**base {
            Expr::Add(_) | Expr::Mul(_) | Expr::Pow(_, _) => {
                format!("({})", render_float(base))
            }
            Expr::Number(n) if n.is_negative() => format!("({})", render_float(base)),
            _ => render_float(base),
        };
        let exp_str = match &**exp {
            Expr::Add(_) | Expr::Mul(_) | Expr::Pow(_, _) => {
                format!("({})", render_float(exp))
            }
            Expr::Number(n) if n.is_negative() => format!("({})", render_float(exp)),
            _ => render_float(exp),
        };
        return format!("{}**{}", base_str, exp_str);
    }
    render_float_operand(e)
}

fn render_float_add(items: &[Expr]) -> String {
    let terms = ordered_terms(items);
    let mut out = String::new();
    for (i, term) in terms.iter().enumerate() {
        let (neg, abs) = sign_split(term);
        let rendered = render_float(&abs);
        if i == 0 {
            if neg {
                out.push('-');
            }
            out.push_str(&rendered);
        } else if neg {
            out.push_str(" - ");
            out.push_str(&rendered);
        } else {
            out.push_str(" + ");
            out.push_str(&rendered);
        }
    }
    out
}
