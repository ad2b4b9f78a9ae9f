//! Symbolic differentiation, integration, limits, series, and summation.

use crate::ast::{Constant, Expr, Func};
use crate::error::{MathError, MathResult};
use crate::numeric::eval_real;
use crate::simplify::{poly_coefficients, simplify};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed};

const LHOPITAL_ROUNDS: u32 = 8;
const SUM_ITERATION_CAP: i64 = 10_000;

/// Approach side for one-sided limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Plus,
    Minus,
}

impl Direction {
    pub fn parse(s: &str) -> MathResult<Direction> {
        match s {
            "+" => Ok(Direction::Plus),
            "-" => Ok(Direction::Minus),
            other => Err(MathError::Engine(format!(
                "direction must be '+' or '-', got '{}'",
                other
            ))),
        }
    }
}

pub fn derivative(e: &Expr, var: &str, order: u32) -> MathResult<Expr> {
    let mut current = simplify(e);
    for _ in 0..order {
        if !current.has_symbol(var) {
            // Every remaining derivative is zero once the variable is gone.
            return Ok(Expr::zero());
        }
        current = simplify(&diff(&current, var)?);
    }
    Ok(current)
}

fn diff(e: &Expr, var: &str) -> MathResult<Expr> {
    if !e.has_symbol(var) {
        return Ok(Expr::zero());
    }
    match e {
        Expr::Symbol(_) => Ok(Expr::one()),
        Expr::Add(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(diff(item, var)?);
            }
            Ok(Expr::add(out))
        }
        Expr::Mul(items) => {
            let mut terms = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let d = diff(item, var)?;
                if d.is_zero() {
                    continue;
                }
                let mut factors = items.clone();
                factors[i] = d;
                terms.push(Expr::Mul(factors));
            }
            Ok(Expr::add(terms))
        }
        Expr::Pow(base, exp) => diff_pow(base, exp, var),
        Expr::Function(f, args) => diff_function(*f, args, var),
        _ => Ok(Expr::zero()),
    }
}

fn diff_pow(base: &Expr, exp: &Expr, var: &str) -> MathResult<Expr> {
    let base_dep = base.has_symbol(var);
    let exp_dep = exp.has_symbol(var);
    if base_dep && !exp_dep {
        // d/dx u^c = c * u^(c-1) * u'
        let db = diff(base, var)?;
        let lowered = Expr::pow(
            base.clone(),
            Expr::add2(exp.clone(), Expr::integer(-1)),
        );
        Ok(Expr::mul(vec![exp.clone(), lowered, db]))
    } else if !base_dep && exp_dep {
        // d/dx c^u = c^u * log(c) * u'
        let dx = diff(exp, var)?;
        Ok(Expr::mul(vec![
            Expr::pow(base.clone(), exp.clone()),
            Expr::func(Func::Log, vec![base.clone()]),
            dx,
        ]))
    } else {
        // d/dx u^v = u^v * (v' log u + v u' / u)
        let db = diff(base, var)?;
        let dx = diff(exp, var)?;
        let inner = Expr::add2(
            Expr::mul2(dx, Expr::func(Func::Log, vec![base.clone()])),
            Expr::mul(vec![exp.clone(), db, Expr::pow(base.clone(), Expr::integer(-1))]),
        );
        Ok(Expr::mul2(Expr::pow(base.clone(), exp.clone()), inner))
    }
}

fn diff_function(f: Func, args: &[Expr], var: &str) -> MathResult<Expr> {
    let u = args[0].clone();
    let du = diff(&u, var)?;
    let sq = |e: Expr| Expr::pow(e, Expr::integer(2));
    let one_minus_sq = |u: &Expr| Expr::add2(Expr::one(), Expr::mul2(Expr::integer(-1), sq(u.clone())));
    let outer = match f {
        Func::Sin => Expr::func(Func::Cos, vec![u]),
        Func::Cos => Expr::func(Func::Sin, vec![u]).neg(),
        Func::Tan => Expr::add2(sq(Expr::func(Func::Tan, vec![u])), Expr::one()),
        Func::Sec => Expr::mul2(
            Expr::func(Func::Sec, vec![u.clone()]),
            Expr::func(Func::Tan, vec![u]),
        ),
        Func::Csc => Expr::mul2(
            Expr::func(Func::Csc, vec![u.clone()]),
            Expr::func(Func::Cot, vec![u]),
        )
        .neg(),
        Func::Cot => Expr::add2(sq(Expr::func(Func::Cot, vec![u])), Expr::one()).neg(),
        Func::Asin => Expr::pow(one_minus_sq(&u), Expr::rational(-1, 2)),
        Func::Acos => Expr::pow(one_minus_sq(&u), Expr::rational(-1, 2)).neg(),
        Func::Atan => Expr::pow(
            Expr::add2(sq(u), Expr::one()),
            Expr::integer(-1),
        ),
        Func::Sinh => Expr::func(Func::Cosh, vec![u]),
        Func::Cosh => Expr::func(Func::Sinh, vec![u]),
        Func::Tanh => Expr::add2(Expr::one(), sq(Expr::func(Func::Tanh, vec![u])).neg()),
        Func::Asinh => Expr::pow(
            Expr::add2(sq(u), Expr::one()),
            Expr::rational(-1, 2),
        ),
        Func::Acosh => Expr::pow(
            Expr::add2(sq(u), Expr::integer(-1)),
            Expr::rational(-1, 2),
        ),
        Func::Atanh => Expr::pow(one_minus_sq(&u), Expr::integer(-1)),
        Func::Exp => Expr::func(Func::Exp, vec![u]),
        Func::Log => Expr::pow(u, Expr::integer(-1)),
        Func::Abs => Expr::func(Func::Sign, vec![u]),
        Func::Sign => Expr::zero(),
        Func::Factorial | Func::Mod | Func::Order => {
            return Err(MathError::Engine(format!(
                "cannot differentiate {}",
                Expr::Function(f, args.to_vec())
            )))
        }
    };
    Ok(Expr::mul2(outer, du))
}

// ---------------------------------------------------------------------------
// integration
// ---------------------------------------------------------------------------

pub fn integrate(e: &Expr, var: &str) -> MathResult<Expr> {
    let s = simplify(e);
    let anti = integrate_node(&s, var)?;
    Ok(simplify(&anti))
}

pub fn integrate_definite(
    e: &Expr,
    var: &str,
    lower: &Expr,
    upper: &Expr,
) -> MathResult<Expr> {
    let anti = integrate(e, var)?;
    let hi = bound_value(&anti, var, upper)?;
    let lo = bound_value(&anti, var, lower)?;
    Ok(simplify(&Expr::sub(hi, lo)))
}

fn bound_value(anti: &Expr, var: &str, bound: &Expr) -> MathResult<Expr> {
    if bound.is_infinite() {
        let dir = if matches!(bound, Expr::Constant(Constant::NegInfinity)) {
            Direction::Plus
        } else {
            Direction::Minus
        };
        limit(anti, var, bound, dir)
    } else {
        Ok(simplify(&anti.subs_symbol(var, bound)))
    }
}

fn no_closed_form(e: &Expr) -> MathError {
    MathError::Engine(format!("no closed form found for integral of {}", e))
}

fn integrate_node(e: &Expr, var: &str) -> MathResult<Expr> {
    if !e.has_symbol(var) {
        return Ok(Expr::mul2(e.clone(), Expr::symbol(var)));
    }
    match e {
        Expr::Add(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(integrate_node(item, var)?);
            }
            Ok(Expr::add(out))
        }
        Expr::Mul(items) => {
            let (constant, dependent): (Vec<Expr>, Vec<Expr>) =
                items.iter().cloned().partition(|f| !f.has_symbol(var));
            if !constant.is_empty() {
                let inner = integrate_node(&Expr::mul(dependent), var)?;
                Ok(Expr::mul2(Expr::mul(constant), inner))
            } else {
                integrate_product(items, var)
            }
        }
        _ => integrate_atom(e, var),
    }
}

/// `e = a*var + c` with both parts free of `var` and `a` nonzero.
fn linear_parts(e: &Expr, var: &str) -> Option<(Expr, Expr)> {
    let coeffs = poly_coefficients(e, var)?;
    if coeffs.len() != 2 || coeffs[1].is_zero() {
        return None;
    }
    Some((coeffs[1].clone(), coeffs[0].clone()))
}

fn integrate_atom(e: &Expr, var: &str) -> MathResult<Expr> {
    match e {
        Expr::Symbol(_) => Ok(Expr::mul2(
            Expr::rational(1, 2),
            Expr::pow(Expr::symbol(var), Expr::integer(2)),
        )),
        Expr::Pow(base, exp) => integrate_power(base, exp, var).ok_or_else(|| no_closed_form(e)),
        Expr::Function(f, args) => {
            let arg = &args[0];
            if args.len() != 1 {
                return Err(no_closed_form(e));
            }
            let (a, _) = linear_parts(arg, var).ok_or_else(|| no_closed_form(e))?;
            let anti = function_antiderivative(*f, arg).ok_or_else(|| no_closed_form(e))?;
            Ok(Expr::div(anti, a))
        }
        _ => Err(no_closed_form(e)),
    }
}

/// Antiderivative of `f(u)` in `u`, for the linear-argument table.
fn function_antiderivative(f: Func, u: &Expr) -> Option<Expr> {
    let call = |g: Func| Expr::func(g, vec![u.clone()]);
    Some(match f {
        Func::Sin => call(Func::Cos).neg(),
        Func::Cos => call(Func::Sin),
        Func::Tan => Expr::func(Func::Log, vec![call(Func::Cos)]).neg(),
        Func::Cot => Expr::func(Func::Log, vec![call(Func::Sin)]),
        Func::Sec => Expr::func(Func::Log, vec![Expr::add2(call(Func::Sec), call(Func::Tan))]),
        Func::Csc => {
            Expr::func(Func::Log, vec![Expr::add2(call(Func::Csc), call(Func::Cot))]).neg()
        }
        Func::Exp => call(Func::Exp),
        Func::Sinh => call(Func::Cosh),
        Func::Cosh => call(Func::Sinh),
        Func::Tanh => Expr::func(Func::Log, vec![call(Func::Cosh)]),
        Func::Log => Expr::sub(
            Expr::mul2(u.clone(), call(Func::Log)),
            u.clone(),
        ),
        _ => return None,
    })
}

fn integrate_power(base: &Expr, exp: &Expr, var: &str) -> Option<Expr> {
    if let Expr::Number(k) = exp {
        // Power rule over a linear base.
        if let Some((a, _)) = linear_parts(base, var) {
            if k.is_integer() && *k == -BigRational::one() {
                return Some(Expr::div(Expr::func(Func::Log, vec![base.clone()]), a));
            }
            let next = k + BigRational::one();
            let scale = Expr::mul2(Expr::Number(next.clone()), a);
            return Some(Expr::div(
                Expr::pow(base.clone(), Expr::Number(next)),
                scale,
            ));
        }
        // Quadratic bases: arctangent and arcsine shapes.
        let coeffs = rational_quadratic(base, var)?;
        let (c0, c2) = coeffs;
        let minus_one = -BigRational::one();
        if *k == minus_one && c0.is_positive() && c2.is_positive() {
            // 1/(c2 x^2 + c0) = atan(x sqrt(c2/c0)) / sqrt(c0 c2)
            let ratio = Expr::sqrt(Expr::Number(&c2 / &c0));
            let scale = Expr::sqrt(Expr::Number(&c0 * &c2));
            let inner = Expr::mul2(Expr::symbol(var), ratio);
            return Some(Expr::div(Expr::func(Func::Atan, vec![inner]), scale));
        }
        let minus_half = BigRational::new(BigInt::from(-1), BigInt::from(2));
        if *k == minus_half && c0.is_positive() && c2.is_negative() {
            // 1/sqrt(c0 - |c2| x^2) = asin(x sqrt(|c2|/c0)) / sqrt(|c2|)
            let mag = -&c2;
            let ratio = Expr::sqrt(Expr::Number(&mag / &c0));
            let inner = Expr::mul2(Expr::symbol(var), ratio);
            return Some(Expr::div(
                Expr::func(Func::Asin, vec![inner]),
                Expr::sqrt(Expr::Number(mag)),
            ));
        }
        return None;
    }
    // Exponential in the exponent: c^u with a numeric base.
    if let Expr::Number(b) = base {
        if b.is_positive() && !b.is_one() {
            if let Some((a, _)) = linear_parts(exp, var) {
                let scale = Expr::mul2(a, Expr::func(Func::Log, vec![Expr::Number(b.clone())]));
                return Some(Expr::div(Expr::pow(base.clone(), exp.clone()), scale));
            }
        }
    }
    None
}

/// `base = c2*var^2 + c0` with rational coefficients.
fn rational_quadratic(base: &Expr, var: &str) -> Option<(BigRational, BigRational)> {
    let coeffs = poly_coefficients(base, var)?;
    if coeffs.len() != 3 || !coeffs[1].is_zero() {
        return None;
    }
    let c0 = coeffs[0].as_number()?.clone();
    let c2 = coeffs[2].as_number()?.clone();
    Some((c0, c2))
}

/// Products where every factor depends on `var`: a monomial against an
/// oscillating or exponential factor integrates by parts, and a monomial
/// against `log(var)` has a closed form.
fn integrate_product(items: &[Expr], var: &str) -> MathResult<Expr> {
    let original = Expr::Mul(items.to_vec());
    if items.len() != 2 {
        return Err(no_closed_form(&original));
    }

    let monomial_degree = |e: &Expr| -> Option<i64> {
        match e {
            Expr::Symbol(s) if s == var => Some(1),
            Expr::Pow(b, x) if matches!(&**b, Expr::Symbol(s) if s == var) => match x.as_i64() {
                Some(n) if (1..=3).contains(&n) => Some(n),
                _ => None,
            },
            _ => None,
        }
    };

    for (i, j) in [(0, 1), (1, 0)] {
        let Some(n) = monomial_degree(&items[i]) else {
            continue;
        };
        let g = &items[j];
        if let Expr::Function(Func::Log, args) = g {
            if matches!(&args[0], Expr::Symbol(s) if s == var) {
                // x^n log x = x^(n+1) log x / (n+1) - x^(n+1)/(n+1)^2
                let next = Expr::pow(Expr::symbol(var), Expr::integer(n + 1));
                let lead = Expr::div(
                    Expr::mul2(next.clone(), g.clone()),
                    Expr::integer(n + 1),
                );
                let tail = Expr::div(next, Expr::integer((n + 1) * (n + 1)));
                return Ok(Expr::sub(lead, tail));
            }
            return Err(no_closed_form(&original));
        }
        let oscillating = matches!(
            g,
            Expr::Function(Func::Exp | Func::Sin | Func::Cos, args)
                if linear_parts(&args[0], var).is_some()
        );
        if oscillating {
            return integrate_by_parts(n, g, var);
        }
    }
    Err(no_closed_form(&original))
}

/// Repeated `∫ x^n g = x^n G - n ∫ x^(n-1) G`.
fn integrate_by_parts(n: i64, g: &Expr, var: &str) -> MathResult<Expr> {
    let big_g = integrate_node(g, var)?;
    if n == 0 {
        return Ok(big_g);
    }
    let power = Expr::pow(Expr::symbol(var), Expr::integer(n));
    let reduced_integrand = simplify(&Expr::mul2(
        Expr::pow(Expr::symbol(var), Expr::integer(n - 1)),
        big_g.clone(),
    ));
    let reduced = integrate_node(&reduced_integrand, var)?;
    Ok(Expr::sub(
        Expr::mul2(power, big_g),
        Expr::mul2(Expr::integer(n), reduced),
    ))
}

// ---------------------------------------------------------------------------
// limits
// ---------------------------------------------------------------------------

pub fn limit(e: &Expr, var: &str, point: &Expr, dir: Direction) -> MathResult<Expr> {
    let s = simplify(e);
    limit_inner(&s, var, point, dir, 0)
}

fn limit_inner(
    e: &Expr,
    var: &str,
    point: &Expr,
    dir: Direction,
    depth: u32,
) -> MathResult<Expr> {
    if depth > LHOPITAL_ROUNDS {
        return Err(MathError::Engine(
            "limit does not resolve to a determinate form".to_string(),
        ));
    }

    let direct = simplify(&e.subs_symbol(var, point));
    if is_determinate(&direct) {
        return Ok(direct);
    }

    // A bare pole: settle the sign by probing from the requested side.
    if matches!(direct, Expr::Constant(Constant::ComplexInfinity)) {
        if let Some(sign) = probe_sign(e, var, point, dir) {
            return Ok(if sign > 0.0 {
                Expr::Constant(Constant::Infinity)
            } else {
                Expr::Constant(Constant::NegInfinity)
            });
        }
        return Ok(Expr::Constant(Constant::ComplexInfinity));
    }

    // 1^oo, 0^0, oo^0 through the exponential.
    if let Expr::Pow(base, exp) = e {
        let base_at = simplify(&base.subs_symbol(var, point));
        let exp_at = simplify(&exp.subs_symbol(var, point));
        let indeterminate = (base_at.is_one() && exp_at.is_infinite())
            || (base_at.is_zero() && exp_at.is_zero())
            || (base_at.is_infinite() && exp_at.is_zero());
        if indeterminate {
            let log_form = simplify(&Expr::mul2(
                (**exp).clone(),
                Expr::func(Func::Log, vec![(**base).clone()]),
            ));
            let inner = limit_inner(&log_form, var, point, dir, depth + 1)?;
            return Ok(simplify(&Expr::func(Func::Exp, vec![inner])));
        }
    }

    // Quotient forms 0/0 and oo/oo fall to L'Hopital.
    let (num, den) = as_quotient(e);
    if !den.is_one() {
        let num_at = simplify(&num.subs_symbol(var, point));
        let den_at = simplify(&den.subs_symbol(var, point));
        let zero_over_zero = num_at.is_zero() && den_at.is_zero();
        let inf_over_inf = num_at.is_infinite() && den_at.is_infinite();
        if zero_over_zero || inf_over_inf {
            let dn = simplify(&diff(&num, var)?);
            let dd = simplify(&diff(&den, var)?);
            let next = simplify(&Expr::div(dn, dd));
            return limit_inner(&next, var, point, dir, depth + 1);
        }
    }

    // 0 * oo: recast as a quotient. v * r with v -> 0 equals v / (1/r),
    // a 0/0 form, and r / (1/v), an oo/oo form; one derivative ratio or
    // the other usually settles.
    if let Expr::Mul(items) = e {
        let mut vanishing: Vec<Expr> = Vec::new();
        let mut rest: Vec<Expr> = Vec::new();
        for item in items {
            let at = simplify(&item.subs_symbol(var, point));
            if at.is_zero() {
                vanishing.push(item.clone());
            } else {
                rest.push(item.clone());
            }
        }
        if !vanishing.is_empty() && !rest.is_empty() {
            let v = Expr::mul(vanishing);
            let r = Expr::mul(rest);
            let candidates = [
                (v.clone(), Expr::pow(r.clone(), Expr::integer(-1))),
                (r, Expr::pow(v, Expr::integer(-1))),
            ];
            for (num, den) in candidates {
                let (Ok(dn), Ok(dd)) = (diff(&num, var), diff(&den, var)) else {
                    continue;
                };
                let next = simplify(&Expr::div(simplify(&dn), simplify(&dd)));
                if let Ok(value) = limit_inner(&next, var, point, dir, depth + 1) {
                    return Ok(value);
                }
            }
        }
    }

    Err(MathError::Engine(format!(
        "could not compute limit of {} as {} -> {}",
        e, var, point
    )))
}

/// No leftover indeterminate markers: the substitution stands as the limit.
fn is_determinate(e: &Expr) -> bool {
    fn contains_inf(e: &Expr) -> bool {
        match e {
            Expr::Constant(
                Constant::Infinity | Constant::NegInfinity | Constant::ComplexInfinity,
            ) => true,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(contains_inf),
            Expr::Pow(b, x) => contains_inf(b) || contains_inf(x),
            Expr::Function(_, args) => args.iter().any(contains_inf),
            _ => false,
        }
    }
    match e {
        Expr::Constant(Constant::NotANumber) | Expr::Constant(Constant::ComplexInfinity) => false,
        Expr::Constant(_) | Expr::Number(_) | Expr::Symbol(_) => true,
        Expr::Add(items) | Expr::Mul(items) => items.iter().all(is_determinate),
        Expr::Pow(b, x) => is_determinate(b) && is_determinate(x),
        // An unevaluated function of an infinite argument never settled.
        Expr::Function(_, args) => args.iter().all(|a| is_determinate(a) && !contains_inf(a)),
    }
}

/// Split into (numerator, denominator) along negative numeric exponents.
fn as_quotient(e: &Expr) -> (Expr, Expr) {
    let factors: Vec<Expr> = match e {
        Expr::Mul(items) => items.clone(),
        other => vec![other.clone()],
    };
    let mut num: Vec<Expr> = Vec::new();
    let mut den: Vec<Expr> = Vec::new();
    for f in factors {
        if let Expr::Pow(base, exp) = &f {
            if let Expr::Number(k) = &**exp {
                if k.is_negative() {
                    let flipped = -k;
                    if flipped.is_one() {
                        den.push((**base).clone());
                    } else {
                        den.push(Expr::pow((**base).clone(), Expr::Number(flipped)));
                    }
                    continue;
                }
            }
        }
        num.push(f);
    }
    (Expr::mul(num), Expr::mul(den))
}

fn probe_sign(e: &Expr, var: &str, point: &Expr, dir: Direction) -> Option<f64> {
    let p = eval_real(point)?;
    if !p.is_finite() {
        return None;
    }
    let mut signs = Vec::new();
    for eps in [1e-6, 1e-8] {
        let x = match dir {
            Direction::Plus => p + eps,
            Direction::Minus => p - eps,
        };
        let probe_point = Expr::Number(BigRational::from_float(x)?);
        let v = eval_real(&e.subs_symbol(var, &probe_point))?;
        if v.abs() < 1e3 {
            return None;
        }
        signs.push(v.signum());
    }
    if signs[0] == signs[1] {
        Some(signs[0])
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// series
// ---------------------------------------------------------------------------

/// Taylor expansion around `point` up to (excluding) degree `order`, with a
/// trailing order term.
pub fn series(e: &Expr, var: &str, point: &Expr, order: u32) -> MathResult<Expr> {
    if point.is_infinite() {
        return Err(MathError::Engine(
            "series expansion requires a finite point".to_string(),
        ));
    }
    let offset = simplify(&Expr::sub(Expr::symbol(var), point.clone()));
    let mut current = simplify(e);
    let mut factorial = BigInt::one();
    let mut terms: Vec<Expr> = Vec::new();

    for k in 0..order {
        if k > 0 {
            factorial *= k;
        }
        let at_point = simplify(&current.subs_symbol(var, point));
        if !series_coefficient_ok(&at_point) {
            return Err(MathError::Engine(format!(
                "series expansion failed at {} = {}",
                var, point
            )));
        }
        if !at_point.is_zero() {
            let coeff = Expr::div(at_point, Expr::from_bigint(factorial.clone()));
            let term = match k {
                0 => coeff,
                1 => Expr::mul2(coeff, offset.clone()),
                _ => Expr::mul2(coeff, Expr::pow(offset.clone(), Expr::integer(k as i64))),
            };
            terms.push(simplify(&term));
        }
        if k + 1 < order {
            current = simplify(&diff(&current, var)?);
        }
    }

    let order_arg = match order {
        0 => Expr::one(),
        1 => offset,
        _ => Expr::pow(offset, Expr::integer(order as i64)),
    };
    terms.push(Expr::func(Func::Order, vec![order_arg]));
    Ok(Expr::add(terms))
}

fn series_coefficient_ok(e: &Expr) -> bool {
    fn bad(e: &Expr) -> bool {
        match e {
            Expr::Constant(
                Constant::NotANumber
                | Constant::ComplexInfinity
                | Constant::Infinity
                | Constant::NegInfinity,
            ) => true,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(bad),
            Expr::Pow(b, x) => bad(b) || bad(x),
            Expr::Function(_, args) => args.iter().any(bad),
            _ => false,
        }
    }
    !bad(e)
}

// ---------------------------------------------------------------------------
// summation
// ---------------------------------------------------------------------------

pub fn summation(e: &Expr, var: &str, start: &Expr, end: &Expr) -> MathResult<Expr> {
    let body = simplify(e);
    let start = simplify(start);
    let end = simplify(end);

    if let (Some(a), Some(b)) = (start.as_i64(), end.as_i64()) {
        if b < a {
            return Ok(Expr::zero());
        }
        if let Some(span) = b.checked_sub(a) {
            if span <= SUM_ITERATION_CAP {
                let mut terms = Vec::with_capacity((span + 1) as usize);
                for k in a..=b {
                    terms.push(body.subs_symbol(var, &Expr::integer(k)));
                }
                return Ok(simplify(&Expr::add(terms)));
            }
        }
    }

    if end.is_infinite() {
        return infinite_sum(&body, var, &start);
    }
    closed_form_sum(&body, var, &start, &end)
}

fn sum_unsupported(e: &Expr) -> MathError {
    MathError::Engine(format!("no closed form found for sum of {}", e))
}

fn infinite_sum(body: &Expr, var: &str, start: &Expr) -> MathResult<Expr> {
    // Geometric: c * r^k with |r| < 1 sums to c*r^a/(1 - r).
    if let Some((c, r)) = geometric_parts(body, var) {
        if let Expr::Number(ratio) = &r {
            if ratio.abs() < BigRational::one() {
                let lead = simplify(&Expr::pow(r.clone(), start.clone()));
                let denom = simplify(&Expr::sub(Expr::one(), r));
                return Ok(simplify(&Expr::div(Expr::mul2(c, lead), denom)));
            }
            return Err(MathError::Engine(
                "sum diverges: common ratio is not inside the unit interval".to_string(),
            ));
        }
    }
    // The Basel sum and the exponential series.
    if start.as_i64() == Some(1) {
        if let Expr::Pow(b, x) = body {
            if matches!(&**b, Expr::Symbol(s) if s == var) && x.as_i64() == Some(-2) {
                return Ok(simplify(&Expr::div(
                    Expr::pow(Expr::Constant(Constant::Pi), Expr::integer(2)),
                    Expr::integer(6),
                )));
            }
        }
    }
    if let Expr::Pow(b, x) = body {
        if x.is_minus_one() {
            if let Expr::Function(Func::Factorial, args) = &**b {
                if matches!(&args[0], Expr::Symbol(s) if s == var) {
                    return match start.as_i64() {
                        Some(0) => Ok(Expr::Constant(Constant::E)),
                        Some(1) => Ok(simplify(&Expr::add2(
                            Expr::Constant(Constant::E),
                            Expr::integer(-1),
                        ))),
                        _ => Err(sum_unsupported(body)),
                    };
                }
            }
        }
    }
    Err(sum_unsupported(body))
}

/// `body = c * r^var` with `c`, `r` free of `var`.
fn geometric_parts(body: &Expr, var: &str) -> Option<(Expr, Expr)> {
    let factors: Vec<Expr> = match body {
        Expr::Mul(items) => items.clone(),
        other => vec![other.clone()],
    };
    let mut ratio: Option<Expr> = None;
    let mut coeff: Vec<Expr> = Vec::new();
    for f in factors {
        match &f {
            Expr::Pow(b, x)
                if !b.has_symbol(var) && matches!(&**x, Expr::Symbol(s) if s == var) =>
            {
                if ratio.is_some() {
                    return None;
                }
                ratio = Some((**b).clone());
            }
            other if !other.has_symbol(var) => coeff.push(other.clone()),
            _ => return None,
        }
    }
    ratio.map(|r| (Expr::mul(coeff), r))
}

/// Polynomial bodies sum through the Faulhaber formulas up to cubes.
fn closed_form_sum(body: &Expr, var: &str, start: &Expr, end: &Expr) -> MathResult<Expr> {
    let coeffs = poly_coefficients(body, var).ok_or_else(|| sum_unsupported(body))?;
    if coeffs.len() > 4 {
        return Err(sum_unsupported(body));
    }
    let prev = simplify(&Expr::add2(start.clone(), Expr::integer(-1)));
    let mut total: Vec<Expr> = Vec::new();
    for (p, c) in coeffs.iter().enumerate() {
        if c.is_zero() {
            continue;
        }
        let upper = faulhaber(p as u32, end);
        let lower = faulhaber(p as u32, &prev);
        total.push(Expr::mul2(c.clone(), Expr::sub(upper, lower)));
    }
    Ok(simplify(&Expr::add(total)))
}

/// `sum_{k=1}^{n} k^p` for `p <= 3`.
fn faulhaber(p: u32, n: &Expr) -> Expr {
    let n = n.clone();
    let n1 = Expr::add2(n.clone(), Expr::one());
    match p {
        0 => n,
        1 => Expr::div(Expr::mul2(n, n1), Expr::integer(2)),
        2 => {
            let with_odd = Expr::add2(Expr::mul2(Expr::integer(2), n.clone()), Expr::one());
            Expr::div(Expr::mul(vec![n, n1, with_odd]), Expr::integer(6))
        }
        _ => {
            let half = Expr::div(Expr::mul2(n, n1), Expr::integer(2));
            Expr::pow(half, Expr::integer(2))
        }
    }
}
