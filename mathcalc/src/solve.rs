//! Equation solving.
//!
//! Polynomials solve exactly through degree 2, with rational-root deflation
//! and pure-binomial shortcuts above that. Anything non-polynomial where the
//! unknown occurs along a single path is peeled by inverting the outermost
//! operation, branch by branch. Linear systems reduce by Gauss-Jordan.

use crate::ast::{Constant, Expr, Func};
use crate::error::{MathError, MathResult};
use crate::matrix::Matrix;
use crate::numeric::order_key;
use crate::parser;
use crate::simplify::{
    deflate, eval_poly, find_rational_root, poly_coefficients, rational_coefficients, simplify,
};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Parse an equation string: split on the first `=` and move everything to
/// one side, or take the whole text as `expr = 0`.
pub fn equation_expr(text: &str) -> MathResult<Expr> {
    match text.split_once('=') {
        Some((lhs, rhs)) => {
            let l = parser::parse(lhs.trim())?;
            let r = parser::parse(rhs.trim())?;
            Ok(Expr::sub(l, r))
        }
        None => parser::parse(text.trim()),
    }
}

fn unsolved(e: &Expr, var: &str) -> MathError {
    MathError::Engine(format!("could not solve {} = 0 for {}", e, var))
}

/// All exact solutions of `expr = 0` in `var`, deduplicated and ordered.
pub fn solve_equation(expr: &Expr, var: &str) -> MathResult<Vec<Expr>> {
    let s = simplify(expr);
    if !s.has_symbol(var) {
        return Ok(Vec::new());
    }

    if let Some(coeffs) = poly_coefficients(&s, var) {
        if let Some(solutions) = solve_polynomial(&coeffs, &s, var)? {
            return Ok(finalize(solutions));
        }
    }

    let solutions = isolate(s.clone(), Expr::zero(), var).map_err(|e| match e {
        MathError::Engine(_) => unsolved(&s, var),
        other => other,
    })?;
    Ok(finalize(solutions))
}

fn finalize(solutions: Vec<Expr>) -> Vec<Expr> {
    let mut out: Vec<Expr> = solutions
        .into_iter()
        .map(|s| simplify(&s))
        .filter(|s| {
            !matches!(
                s,
                Expr::Constant(
                    Constant::NotANumber
                        | Constant::ComplexInfinity
                        | Constant::Infinity
                        | Constant::NegInfinity
                )
            )
        })
        .collect();
    out.sort_by_key(order_key);
    out.dedup();
    out
}

// ---------------------------------------------------------------------------
// polynomial equations
// ---------------------------------------------------------------------------

/// `Ok(None)` means "not handled here" and falls through to isolation.
fn solve_polynomial(coeffs: &[Expr], original: &Expr, var: &str) -> MathResult<Option<Vec<Expr>>> {
    let mut coeffs = coeffs.to_vec();
    while coeffs.len() > 1 && coeffs.last().map(|c| c.is_zero()).unwrap_or(false) {
        coeffs.pop();
    }
    match coeffs.len() {
        0 | 1 => Ok(Some(Vec::new())),
        2 => {
            let root = simplify(&Expr::div(coeffs[0].clone().neg(), coeffs[1].clone()));
            Ok(Some(vec![root]))
        }
        3 => Ok(Some(quadratic_roots(&coeffs[0], &coeffs[1], &coeffs[2]))),
        _ => {
            if let Some(rational) = rational_coefficients(original, var) {
                let roots = poly_root_multiplicities(&rational)?;
                return Ok(Some(roots.into_iter().map(|(r, _)| r).collect()));
            }
            // Symbolic higher-degree coefficients are out of scope.
            Err(unsolved(original, var))
        }
    }
}

fn quadratic_roots(c0: &Expr, c1: &Expr, c2: &Expr) -> Vec<Expr> {
    let disc = simplify(&Expr::sub(
        Expr::mul2(c1.clone(), c1.clone()),
        Expr::mul(vec![Expr::integer(4), c2.clone(), c0.clone()]),
    ));
    let two_a = Expr::mul2(Expr::integer(2), c2.clone());
    if disc.is_zero() {
        return vec![simplify(&Expr::div(c1.clone().neg(), two_a))];
    }
    let root = simplify(&Expr::sqrt(disc));
    let plus = Expr::div(
        Expr::add2(c1.clone().neg(), root.clone()),
        two_a.clone(),
    );
    let minus = Expr::div(Expr::add2(c1.clone().neg(), root.neg()), two_a);
    vec![simplify(&plus), simplify(&minus)]
}

/// Exact roots of a rational-coefficient polynomial with algebraic
/// multiplicities: rational roots by deflation, then a closing quadratic or
/// pure binomial. Degrees that survive all of that are an engine failure.
pub(crate) fn poly_root_multiplicities(
    coeffs: &[BigRational],
) -> MathResult<Vec<(Expr, usize)>> {
    let mut remaining: Vec<BigRational> = coeffs.to_vec();
    while remaining.len() > 1 && remaining.last().map(|c| c.is_zero()).unwrap_or(false) {
        remaining.pop();
    }
    let mut roots: Vec<(Expr, usize)> = Vec::new();

    let push = |roots: &mut Vec<(Expr, usize)>, value: Expr, count: usize| {
        let value = simplify(&value);
        if let Some(slot) = roots.iter_mut().find(|(v, _)| *v == value) {
            slot.1 += count;
        } else {
            roots.push((value, count));
        }
    };

    while remaining.len() > 3 {
        match find_rational_root(&remaining) {
            Some(r) => {
                let mut mult = 0usize;
                while remaining.len() > 1 && eval_poly(&remaining, &r).is_zero() {
                    remaining = deflate(&remaining, &r);
                    mult += 1;
                }
                push(&mut roots, Expr::Number(r), mult);
            }
            None => {
                // Pure binomial c_n x^n + c_0.
                let n = remaining.len() - 1;
                let middle_zero = remaining[1..n].iter().all(|c| c.is_zero());
                if middle_zero && n <= 4 {
                    let c = -(&remaining[0] / &remaining[n]);
                    for root in binomial_roots(n, &c)? {
                        push(&mut roots, root, 1);
                    }
                    remaining.truncate(1);
                    break;
                }
                return Err(MathError::Engine(format!(
                    "no exact roots found for a degree-{} polynomial",
                    n
                )));
            }
        }
    }

    if remaining.len() == 3 {
        let quad = quadratic_roots(
            &Expr::Number(remaining[0].clone()),
            &Expr::Number(remaining[1].clone()),
            &Expr::Number(remaining[2].clone()),
        );
        let double = quad.len() == 1;
        for root in quad {
            push(&mut roots, root, if double { 2 } else { 1 });
        }
    } else if remaining.len() == 2 {
        let root = -(&remaining[0] / &remaining[1]);
        push(&mut roots, Expr::Number(root), 1);
    }

    Ok(roots)
}

/// Solutions of `x^n = c` for n in 2..=4.
fn binomial_roots(n: usize, c: &BigRational) -> MathResult<Vec<Expr>> {
    let value = Expr::Number(c.clone());
    match n {
        2 => {
            let r = simplify(&Expr::sqrt(value));
            Ok(vec![r.clone(), simplify(&r.neg())])
        }
        3 => {
            let real = real_cube_root(c);
            let half = Expr::rational(-1, 2);
            let imag = Expr::mul(vec![
                Expr::rational(1, 2),
                Expr::sqrt(Expr::integer(3)),
                Expr::Constant(Constant::I),
            ]);
            let omega_plus = Expr::add2(half.clone(), imag.clone());
            let omega_minus = Expr::add2(half, imag.neg());
            Ok(vec![
                real.clone(),
                simplify(&Expr::mul2(real.clone(), omega_plus)),
                simplify(&Expr::mul2(real, omega_minus)),
            ])
        }
        4 => {
            if c.is_negative() {
                return Err(MathError::Engine(
                    "no exact quartic roots for a negative constant".to_string(),
                ));
            }
            let mut out = Vec::with_capacity(4);
            let y = simplify(&Expr::sqrt(value));
            for half in [y.clone(), simplify(&y.neg())] {
                let r = simplify(&Expr::sqrt(half));
                out.push(r.clone());
                out.push(simplify(&r.neg()));
            }
            Ok(out)
        }
        _ => Err(MathError::Engine(format!(
            "no exact roots for x^{} = {}",
            n, value
        ))),
    }
}

fn real_cube_root(c: &BigRational) -> Expr {
    if c.is_negative() {
        simplify(&Expr::pow(Expr::Number(-c), Expr::rational(1, 3)).neg())
    } else {
        simplify(&Expr::pow(Expr::Number(c.clone()), Expr::rational(1, 3)))
    }
}

// ---------------------------------------------------------------------------
// isolation
// ---------------------------------------------------------------------------

/// Peel the outermost operation off `lhs` until the unknown stands alone.
/// The unknown must occur along exactly one path.
fn isolate(lhs: Expr, rhs: Expr, var: &str) -> MathResult<Vec<Expr>> {
    let fail = || MathError::Engine(String::new());

    if matches!(&lhs, Expr::Symbol(s) if s == var) {
        return Ok(vec![rhs]);
    }

    match lhs {
        Expr::Add(items) => {
            let (dependent, free): (Vec<Expr>, Vec<Expr>) =
                items.into_iter().partition(|t| t.has_symbol(var));
            if dependent.len() != 1 {
                return Err(fail());
            }
            let moved = simplify(&Expr::sub(rhs, Expr::add(free)));
            isolate(dependent.into_iter().next().ok_or_else(fail)?, moved, var)
        }
        Expr::Mul(items) => {
            let (dependent, free): (Vec<Expr>, Vec<Expr>) =
                items.into_iter().partition(|t| t.has_symbol(var));
            if dependent.len() != 1 {
                return Err(fail());
            }
            let moved = simplify(&Expr::div(rhs, Expr::mul(free)));
            isolate(dependent.into_iter().next().ok_or_else(fail)?, moved, var)
        }
        Expr::Pow(base, exp) => isolate_power(*base, *exp, rhs, var),
        Expr::Function(f, args) => isolate_function(f, args, rhs, var),
        _ => Err(fail()),
    }
}

fn isolate_power(base: Expr, exp: Expr, rhs: Expr, var: &str) -> MathResult<Vec<Expr>> {
    let fail = || MathError::Engine(String::new());

    if exp.has_symbol(var) {
        // c^u = rhs
        if base.has_symbol(var) {
            return Err(fail());
        }
        if let (Expr::Number(b), Expr::Number(r)) = (&base, &rhs) {
            if let Some(k) = exact_log(b, r) {
                return isolate(exp, Expr::Number(k), var);
            }
        }
        let moved = simplify(&Expr::div(
            Expr::func(Func::Log, vec![rhs]),
            Expr::func(Func::Log, vec![base]),
        ));
        return isolate(exp, moved, var);
    }

    let Expr::Number(k) = &exp else {
        return Err(fail());
    };

    if k.is_integer() {
        let n = k.to_integer().to_i64().ok_or_else(fail)?;
        if n == 0 {
            return Err(fail());
        }
        if n < 0 {
            let flipped = simplify(&Expr::div(Expr::one(), rhs));
            return isolate_power(base, Expr::integer(-n), flipped, var);
        }
        if n % 2 == 0 {
            let principal = principal_root(&rhs, n);
            let mut out = isolate(base.clone(), principal.clone(), var)?;
            out.extend(isolate(base, simplify(&principal.neg()), var)?);
            return Ok(out);
        }
        let root = match &rhs {
            Expr::Number(c) if c.is_negative() => simplify(
                &Expr::pow(Expr::Number(-c), Expr::rational(1, n)).neg(),
            ),
            _ => principal_root(&rhs, n),
        };
        return isolate(base, root, var);
    }

    // Rational exponent p/q: x^(p/q) = c  ->  x = c^(q/p).
    let p = k.numer().to_i64().ok_or_else(fail)?;
    let q = k.denom().to_i64().ok_or_else(fail)?;
    if q % 2 == 0 {
        // Even root on the left; a negative value has no preimage.
        if matches!(&rhs, Expr::Number(c) if c.is_negative()) {
            return Ok(Vec::new());
        }
    }
    let root = simplify(&Expr::pow(rhs, Expr::rational(q, p)));
    if p % 2 == 0 {
        let mut out = isolate(base.clone(), root.clone(), var)?;
        out.extend(isolate(base, simplify(&root.neg()), var)?);
        Ok(out)
    } else {
        isolate(base, root, var)
    }
}

fn principal_root(rhs: &Expr, n: i64) -> Expr {
    simplify(&Expr::pow(rhs.clone(), Expr::rational(1, n)))
}

/// `b^k = r` for an integer `k`, when one exists.
fn exact_log(b: &BigRational, r: &BigRational) -> Option<BigRational> {
    if b.is_one() || !b.is_positive() || !r.is_positive() {
        return None;
    }
    if r.is_one() {
        return Some(BigRational::zero());
    }
    let mut acc = BigRational::one();
    for k in 1..=64i64 {
        acc *= b;
        if acc == *r {
            return Some(BigRational::from_integer(BigInt::from(k)));
        }
        let inv = BigRational::new(acc.denom().clone(), acc.numer().clone());
        if inv == *r {
            return Some(BigRational::from_integer(BigInt::from(-k)));
        }
    }
    None
}

fn isolate_function(f: Func, args: Vec<Expr>, rhs: Expr, var: &str) -> MathResult<Vec<Expr>> {
    let fail = || MathError::Engine(String::new());
    let u = args.into_iter().next().ok_or_else(fail)?;
    let pi = || Expr::Constant(Constant::Pi);

    let targets: Vec<Expr> = match f {
        Func::Sin => {
            let principal = Expr::func(Func::Asin, vec![rhs]);
            vec![
                principal.clone(),
                Expr::sub(pi(), principal),
            ]
        }
        Func::Cos => {
            let principal = Expr::func(Func::Acos, vec![rhs]);
            vec![
                principal.clone(),
                Expr::sub(Expr::mul2(Expr::integer(2), pi()), principal),
            ]
        }
        Func::Tan => vec![Expr::func(Func::Atan, vec![rhs])],
        Func::Sec => {
            return isolate_function(
                Func::Cos,
                vec![u],
                simplify(&Expr::div(Expr::one(), rhs)),
                var,
            )
        }
        Func::Csc => {
            return isolate_function(
                Func::Sin,
                vec![u],
                simplify(&Expr::div(Expr::one(), rhs)),
                var,
            )
        }
        Func::Cot => {
            return isolate_function(
                Func::Tan,
                vec![u],
                simplify(&Expr::div(Expr::one(), rhs)),
                var,
            )
        }
        Func::Exp => {
            if rhs.is_zero() {
                return Ok(Vec::new());
            }
            vec![Expr::func(Func::Log, vec![rhs])]
        }
        Func::Log => vec![Expr::func(Func::Exp, vec![rhs])],
        Func::Abs => match &rhs {
            Expr::Number(c) if c.is_negative() => return Ok(Vec::new()),
            _ => vec![rhs.clone(), rhs.neg()],
        },
        Func::Sinh => vec![Expr::func(Func::Asinh, vec![rhs])],
        Func::Cosh => {
            let principal = Expr::func(Func::Acosh, vec![rhs]);
            vec![principal.clone(), principal.neg()]
        }
        Func::Tanh => vec![Expr::func(Func::Atanh, vec![rhs])],
        Func::Asin => vec![Expr::func(Func::Sin, vec![rhs])],
        Func::Acos => vec![Expr::func(Func::Cos, vec![rhs])],
        Func::Atan => vec![Expr::func(Func::Tan, vec![rhs])],
        Func::Asinh => vec![Expr::func(Func::Sinh, vec![rhs])],
        Func::Acosh => vec![Expr::func(Func::Cosh, vec![rhs])],
        Func::Atanh => vec![Expr::func(Func::Tanh, vec![rhs])],
        Func::Sign | Func::Factorial | Func::Mod | Func::Order => return Err(fail()),
    };

    let mut out = Vec::new();
    for target in targets {
        out.extend(isolate(u.clone(), simplify(&target), var)?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// linear systems
// ---------------------------------------------------------------------------

/// Outcome of a linear solve: a mapping for the pivot variables (possibly
/// parametric in the free ones) or the empty set.
#[derive(Debug)]
pub enum SystemSolution {
    Assignments(Vec<(String, Expr)>),
    Empty,
}

pub fn solve_system(equations: &[Expr], variables: &[String]) -> MathResult<SystemSolution> {
    if equations.is_empty() {
        return Ok(SystemSolution::Empty);
    }
    let nonlinear = || {
        MathError::Engine("system is not linear in the requested variables".to_string())
    };

    let n_var = variables.len();
    let mut rows: Vec<Vec<Expr>> = Vec::with_capacity(equations.len());
    for eq in equations {
        let mut rest = simplify(eq);
        let mut row = Vec::with_capacity(n_var + 1);
        for v in variables {
            let coeffs = poly_coefficients(&rest, v).ok_or_else(nonlinear)?;
            if coeffs.len() > 2 {
                return Err(nonlinear());
            }
            let c = coeffs.get(1).cloned().unwrap_or_else(Expr::zero);
            if variables.iter().any(|other| c.has_symbol(other)) {
                return Err(nonlinear());
            }
            row.push(c);
            rest = coeffs.first().cloned().unwrap_or_else(Expr::zero);
        }
        if variables.iter().any(|v| rest.has_symbol(v)) {
            return Err(nonlinear());
        }
        row.push(simplify(&rest.neg()));
        rows.push(row);
    }

    let augmented = Matrix::from_rows(rows)?;
    let (reduced, pivots) = augmented.rref();

    if pivots.contains(&n_var) {
        return Ok(SystemSolution::Empty);
    }

    let mut assignments = Vec::new();
    for (i, v) in variables.iter().enumerate() {
        let Some(pivot_index) = pivots.iter().position(|p| *p == i) else {
            continue;
        };
        let mut value = reduced.get(pivot_index, n_var).clone();
        for (j, other) in variables.iter().enumerate() {
            if j == i || pivots.contains(&j) {
                continue;
            }
            let coeff = reduced.get(pivot_index, j).clone();
            if coeff.is_zero() {
                continue;
            }
            value = Expr::sub(value, Expr::mul2(coeff, Expr::symbol(other)));
        }
        assignments.push((v.clone(), simplify(&value)));
    }
    Ok(SystemSolution::Assignments(assignments))
}
