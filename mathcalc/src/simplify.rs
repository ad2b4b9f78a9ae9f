//! Expression normalization and algebraic rewriting.
//!
//! [`simplify`] is the canonical form every handler reports through:
//! sums and products are flattened and collected, rational arithmetic is
//! exact, powers of numbers extract perfect roots, and the well-known
//! special values of the function vocabulary fold to closed forms.
//! [`expand`], [`factor`], and the trig rewriters build on top of it.

use crate::ast::{Constant, Expr, Func};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::collections::BTreeMap;

const MAX_FOLD_EXPONENT: i64 = 65_536;
const MAX_FACTORIAL: i64 = 10_000;

pub fn simplify(e: &Expr) -> Expr {
    match e {
        Expr::Number(_) | Expr::Constant(_) | Expr::Symbol(_) => e.clone(),
        Expr::Add(items) => simplify_add(items.iter().map(simplify).collect()),
        Expr::Mul(items) => simplify_mul(items.iter().map(simplify).collect()),
        Expr::Pow(base, exp) => simplify_pow(simplify(base), simplify(exp)),
        Expr::Function(f, args) => simplify_function(*f, args.iter().map(simplify).collect()),
    }
}

fn nan() -> Expr {
    Expr::Constant(Constant::NotANumber)
}

fn is_nan(e: &Expr) -> bool {
    matches!(e, Expr::Constant(Constant::NotANumber))
}

/// Split a product term into its rational coefficient and symbolic core.
/// Pure numbers report a core of `1`.
fn coeff_core(term: &Expr) -> (BigRational, Expr) {
    match term {
        Expr::Number(n) => (n.clone(), Expr::one()),
        Expr::Mul(items) => {
            if let Some(Expr::Number(n)) = items.first() {
                let rest: Vec<Expr> = items[1..].to_vec();
                (n.clone(), Expr::mul(rest))
            } else {
                (BigRational::one(), term.clone())
            }
        }
        _ => (BigRational::one(), term.clone()),
    }
}

/// Rebuild `coeff * core` in canonical shape.
fn scaled(coeff: BigRational, core: Expr) -> Expr {
    if coeff.is_zero() {
        return Expr::zero();
    }
    if core.is_one() {
        return Expr::Number(coeff);
    }
    if coeff.is_one() {
        return core;
    }
    match core {
        Expr::Mul(items) => {
            let mut all = Vec::with_capacity(items.len() + 1);
            all.push(Expr::Number(coeff));
            all.extend(items);
            Expr::Mul(all)
        }
        other => Expr::mul2(Expr::Number(coeff), other),
    }
}

fn simplify_add(terms: Vec<Expr>) -> Expr {
    // Flatten one level; children are already simplified.
    let mut flat: Vec<Expr> = Vec::with_capacity(terms.len());
    for t in terms {
        match t {
            Expr::Add(items) => flat.extend(items),
            other => flat.push(other),
        }
    }

    if flat.iter().any(is_nan) {
        return nan();
    }

    let mut number = BigRational::zero();
    let mut has_pos_inf = false;
    let mut has_neg_inf = false;
    let mut has_complex_inf = false;
    let mut collected: BTreeMap<Expr, BigRational> = BTreeMap::new();

    for term in flat {
        match &term {
            Expr::Constant(Constant::Infinity) => has_pos_inf = true,
            Expr::Constant(Constant::NegInfinity) => has_neg_inf = true,
            Expr::Constant(Constant::ComplexInfinity) => has_complex_inf = true,
            Expr::Number(n) => number += n,
            _ => {
                let (coeff, core) = coeff_core(&term);
                *collected.entry(core).or_insert_with(BigRational::zero) += coeff;
            }
        }
    }

    if (has_pos_inf && has_neg_inf) || (has_complex_inf && (has_pos_inf || has_neg_inf)) {
        return nan();
    }

    let mut out: Vec<Expr> = Vec::new();
    for (core, coeff) in collected {
        let rebuilt = scaled(coeff, core);
        if !rebuilt.is_zero() {
            out.push(rebuilt);
        }
    }
    out.sort();

    if has_complex_inf {
        out.insert(0, Expr::Constant(Constant::ComplexInfinity));
    } else if has_pos_inf {
        out.insert(0, Expr::Constant(Constant::Infinity));
    } else if has_neg_inf {
        out.insert(0, Expr::Constant(Constant::NegInfinity));
    } else if !number.is_zero() || out.is_empty() {
        out.push(Expr::Number(number));
    }

    Expr::add(out)
}

fn simplify_mul(factors: Vec<Expr>) -> Expr {
    let mut flat: Vec<Expr> = Vec::with_capacity(factors.len());
    for f in factors {
        match f {
            Expr::Mul(items) => flat.extend(items),
            other => flat.push(other),
        }
    }

    if flat.iter().any(is_nan) {
        return nan();
    }

    let has_zero = flat.iter().any(Expr::is_zero);
    let inf_count = flat.iter().filter(|f| f.is_infinite()).count();
    if has_zero {
        return if inf_count > 0 { nan() } else { Expr::zero() };
    }

    if inf_count > 0 {
        let has_complex_inf = flat
            .iter()
            .any(|f| matches!(f, Expr::Constant(Constant::ComplexInfinity)));
        let neg_infs = flat
            .iter()
            .filter(|f| matches!(f, Expr::Constant(Constant::NegInfinity)))
            .count();
        let mut sign_negative = neg_infs % 2 == 1;
        let mut rest: Vec<Expr> = Vec::new();
        for f in flat {
            match f {
                Expr::Constant(Constant::Infinity)
                | Expr::Constant(Constant::NegInfinity)
                | Expr::Constant(Constant::ComplexInfinity) => {}
                Expr::Number(n) => {
                    if n.is_negative() {
                        sign_negative = !sign_negative;
                    }
                }
                other => rest.push(other),
            }
        }
        let inf = if has_complex_inf {
            Expr::Constant(Constant::ComplexInfinity)
        } else if sign_negative {
            Expr::Constant(Constant::NegInfinity)
        } else {
            Expr::Constant(Constant::Infinity)
        };
        if rest.is_empty() {
            return inf;
        }
        rest.sort();
        rest.insert(0, inf);
        return Expr::Mul(rest);
    }

    // Group factors by base and sum exponents.
    let mut coeff = BigRational::one();
    let mut powers: Vec<(Expr, Vec<Expr>)> = Vec::new();
    for f in flat {
        match f {
            Expr::Number(n) => coeff *= &n,
            Expr::Pow(base, exp) => add_power(&mut powers, *base, *exp),
            other => add_power(&mut powers, other, Expr::one()),
        }
    }

    // Resolve each base's accumulated exponent.
    let mut resolved: Vec<(Expr, Expr)> = Vec::new();
    for (base, exps) in powers {
        let exp = simplify_add(exps);
        if exp.is_zero() {
            continue;
        }
        resolved.push((base, exp));
    }

    // Surds over the same exponent merge: sqrt(2)*sqrt(3) = sqrt(6).
    let mut merged: Vec<(Expr, Expr)> = Vec::new();
    for (base, exp) in resolved {
        let is_surd = matches!(&base, Expr::Number(_))
            && matches!(&exp, Expr::Number(k) if !k.is_integer());
        if is_surd {
            if let Some(slot) = merged.iter_mut().find(|(b, x)| {
                matches!(b, Expr::Number(_)) && x == &exp
            }) {
                if let (Expr::Number(existing), Expr::Number(new)) = (&mut slot.0, &base) {
                    *existing *= new;
                    continue;
                }
            }
        }
        merged.push((base, exp));
    }

    let mut out: Vec<Expr> = Vec::new();
    for (base, exp) in merged {
        match simplify_pow(base, exp) {
            Expr::Number(n) => coeff *= &n,
            Expr::Constant(Constant::NotANumber) => return nan(),
            Expr::Constant(Constant::ComplexInfinity) => {
                return Expr::Constant(Constant::ComplexInfinity)
            }
            Expr::Mul(items) => {
                // A resolved power may itself be a scaled product (2*sqrt(2)).
                for item in items {
                    match item {
                        Expr::Number(n) => coeff *= &n,
                        other => out.push(other),
                    }
                }
            }
            other => out.push(other),
        }
    }

    if coeff.is_zero() {
        return Expr::zero();
    }
    out.sort();
    if out.is_empty() {
        return Expr::Number(coeff);
    }
    if !coeff.is_one() {
        out.insert(0, Expr::Number(coeff));
    }
    Expr::mul(out)
}

fn add_power(powers: &mut Vec<(Expr, Vec<Expr>)>, base: Expr, exp: Expr) {
    if let Some(slot) = powers.iter_mut().find(|(b, _)| *b == base) {
        slot.1.push(exp);
    } else {
        powers.push((base, vec![exp]));
    }
}

/// Exact `n^k` for integer `k`.
fn pow_rational(n: &BigRational, k: i64) -> BigRational {
    let mag = k.unsigned_abs() as usize;
    let num = num_traits::pow(n.numer().clone(), mag);
    let den = num_traits::pow(n.denom().clone(), mag);
    if k >= 0 {
        BigRational::new(num, den)
    } else {
        BigRational::new(den, num)
    }
}

/// Integer q-th root by bisection; returns the floor root.
fn iroot(n: &BigInt, q: u32) -> BigInt {
    if n.is_zero() || n.is_one() {
        return n.clone();
    }
    let mut lo = BigInt::one();
    let mut hi = n.clone();
    while &lo < &hi {
        let mid: BigInt = (&lo + &hi + 1u32) >> 1;
        if num_traits::pow(mid.clone(), q as usize) <= *n {
            lo = mid;
        } else {
            hi = mid - 1u32;
        }
    }
    lo
}

/// Decompose a positive integer as `outside^q * inside` with `outside`
/// maximal.
fn extract_power(n: &BigInt, q: u32) -> (BigInt, BigInt) {
    let mut outside = BigInt::one();
    let mut inside = n.clone();
    let mut p = BigInt::from(2);
    let limit = BigInt::from(100_000);
    while &p * &p <= inside && p <= limit {
        let mut count = 0u32;
        while (&inside % &p).is_zero() {
            inside /= &p;
            count += 1;
        }
        if count >= q {
            outside *= num_traits::pow(p.clone(), (count / q) as usize);
        }
        let back = count % q;
        if back > 0 {
            inside *= num_traits::pow(p.clone(), back as usize);
        }
        p += 1u32;
    }
    // Whatever large part remains may still be a perfect power.
    if !inside.is_one() {
        let r = iroot(&inside, q);
        if num_traits::pow(r.clone(), q as usize) == inside {
            outside *= r;
            inside = BigInt::one();
        }
    }
    (outside, inside)
}

fn simplify_pow(base: Expr, exp: Expr) -> Expr {
    if is_nan(&base) || is_nan(&exp) {
        return nan();
    }

    if exp.is_zero() {
        return Expr::one();
    }
    if exp.is_one() {
        return base;
    }

    match (&base, &exp) {
        (Expr::Number(b), _) if b.is_zero() => {
            return match &exp {
                Expr::Number(k) if k.is_positive() => Expr::zero(),
                Expr::Number(k) if k.is_negative() => Expr::Constant(Constant::ComplexInfinity),
                Expr::Constant(Constant::Infinity) => Expr::zero(),
                _ => Expr::pow(base, exp),
            };
        }
        (Expr::Number(b), _) if b.is_one() => {
            return if exp.is_infinite() { nan() } else { Expr::one() };
        }
        (Expr::Number(b), Expr::Number(k)) => {
            if k.is_integer() {
                if let Some(ki) = k.to_integer().to_i64() {
                    if ki.abs() <= MAX_FOLD_EXPONENT {
                        return Expr::Number(pow_rational(b, ki));
                    }
                }
                return Expr::pow(base, exp);
            }
            return numeric_radical(b, k);
        }
        (Expr::Number(b), Expr::Constant(Constant::Infinity)) => {
            let one = BigRational::one();
            return if *b > one {
                Expr::Constant(Constant::Infinity)
            } else if b.abs() < one {
                Expr::zero()
            } else {
                nan()
            };
        }
        (Expr::Number(b), Expr::Constant(Constant::NegInfinity)) => {
            let one = BigRational::one();
            return if b.abs() > one {
                Expr::zero()
            } else if b.abs() < one && b.is_positive() {
                Expr::Constant(Constant::Infinity)
            } else if b.abs() < one && b.is_negative() {
                Expr::Constant(Constant::ComplexInfinity)
            } else {
                nan()
            };
        }
        (Expr::Constant(Constant::I), Expr::Number(k)) if k.is_integer() => {
            if let Some(ki) = k.to_integer().to_i64() {
                return match ki.rem_euclid(4) {
                    0 => Expr::one(),
                    1 => Expr::Constant(Constant::I),
                    2 => Expr::integer(-1),
                    _ => Expr::Constant(Constant::I).neg_simplified(),
                };
            }
        }
        (Expr::Constant(Constant::E), _) => {
            return simplify_function(Func::Exp, vec![exp]);
        }
        (Expr::Constant(Constant::Infinity), Expr::Number(k)) => {
            return if k.is_positive() {
                Expr::Constant(Constant::Infinity)
            } else {
                Expr::zero()
            };
        }
        (Expr::Constant(Constant::ComplexInfinity), Expr::Number(k)) => {
            return if k.is_positive() {
                Expr::Constant(Constant::ComplexInfinity)
            } else {
                Expr::zero()
            };
        }
        _ => {}
    }

    // (u^a)^n folds to u^(a*n) for integer outer exponents.
    if let Expr::Pow(inner_base, inner_exp) = &base {
        if matches!(&exp, Expr::Number(k) if k.is_integer()) {
            let combined = simplify_mul(vec![(**inner_exp).clone(), exp]);
            return simplify_pow((**inner_base).clone(), combined);
        }
    }

    // Integer powers distribute over products; fractional powers peel off a
    // positive numeric coefficient: sqrt(4*x) = 2*sqrt(x).
    if let Expr::Mul(items) = &base {
        if matches!(&exp, Expr::Number(k) if k.is_integer()) {
            let parts: Vec<Expr> = items
                .iter()
                .map(|f| simplify_pow(f.clone(), exp.clone()))
                .collect();
            return simplify_mul(parts);
        }
        if let Expr::Number(k) = &exp {
            if let Some(Expr::Number(c)) = items.first() {
                if c.is_positive() && !c.is_one() {
                    let rest = Expr::mul(items[1..].to_vec());
                    let coeff_part = numeric_radical(c, k);
                    let rest_part = Expr::pow(rest, exp.clone());
                    return simplify_mul(vec![coeff_part, rest_part]);
                }
            }
        }
    }

    Expr::pow(base, exp)
}

/// `b^(p/q)` for rational `b` and non-integer rational `p/q`: pull perfect
/// q-th powers out of the radical and rationalize square-root denominators.
fn numeric_radical(b: &BigRational, k: &BigRational) -> Expr {
    let p = match k.numer().to_i64() {
        Some(v) => v,
        None => return Expr::pow(Expr::Number(b.clone()), Expr::Number(k.clone())),
    };
    let q = match k.denom().to_u32() {
        Some(v) if v >= 2 => v,
        _ => return Expr::pow(Expr::Number(b.clone()), Expr::Number(k.clone())),
    };

    if b.is_negative() {
        if q == 2 {
            // (-b)^(p/2) = I^p * |b|^(p/2)
            let mag = numeric_radical(&-b, k);
            let i_pow = simplify_pow(Expr::Constant(Constant::I), Expr::integer(p));
            return simplify_mul(vec![i_pow, mag]);
        }
        return Expr::pow(Expr::Number(b.clone()), Expr::Number(k.clone()));
    }

    // Work on |p| and invert at the end for negative exponents.
    let pa = p.unsigned_abs() as usize;
    if pa > 64 {
        return Expr::pow(Expr::Number(b.clone()), Expr::Number(k.clone()));
    }
    let num = num_traits::pow(b.numer().clone(), pa);
    let den = num_traits::pow(b.denom().clone(), pa);

    let (num_out, num_in) = extract_power(&num, q);
    let (den_out, den_in) = extract_power(&den, q);

    // outside part: num_out/den_out. inside part: (num_in/den_in)^(1/q),
    // rationalized to sqrt(num_in*den_in)/den_in for square roots.
    let mut coeff = BigRational::new(num_out, den_out);
    let radical = if num_in.is_one() && den_in.is_one() {
        None
    } else if den_in.is_one() {
        Some(Expr::pow(
            Expr::from_bigint(num_in),
            Expr::rational(1, q as i64),
        ))
    } else if q == 2 {
        let inside = &num_in * &den_in;
        coeff /= BigRational::from_integer(den_in);
        Some(Expr::pow(
            Expr::from_bigint(inside),
            Expr::rational(1, 2),
        ))
    } else {
        Some(Expr::pow(
            Expr::Number(BigRational::new(num_in, den_in)),
            Expr::rational(1, q as i64),
        ))
    };

    let magnitude = match radical {
        Some(r) => scaled(coeff, r),
        None => Expr::Number(coeff),
    };

    if p < 0 {
        simplify_pow(magnitude, Expr::integer(-1))
    } else {
        magnitude
    }
}

impl Expr {
    /// Simplified negation, used where building `Mul(-1, e)` and
    /// re-simplifying would be wasteful.
    pub(crate) fn neg_simplified(self) -> Expr {
        simplify_mul(vec![Expr::integer(-1), self])
    }
}

/// `r` for arguments of the form `r*pi`, if any.
fn as_pi_multiple(e: &Expr) -> Option<BigRational> {
    match e {
        Expr::Constant(Constant::Pi) => Some(BigRational::one()),
        Expr::Number(n) if n.is_zero() => Some(BigRational::zero()),
        Expr::Mul(items) => {
            if items.len() == 2 {
                if let (Expr::Number(n), Expr::Constant(Constant::Pi)) = (&items[0], &items[1]) {
                    return Some(n.clone());
                }
            }
            None
        }
        _ => None,
    }
}

fn rat(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

fn sqrt_int(n: i64) -> Expr {
    Expr::pow(Expr::integer(n), Expr::rational(1, 2))
}

/// sin(r*pi) for rational r, when the value is a standard exact one.
fn sin_pi(r: &BigRational) -> Option<Expr> {
    let two = rat(2, 1);
    let mut r = r - (r / &two).floor() * &two; // reduce mod 2
    let mut negate = false;
    if r > BigRational::one() {
        r -= BigRational::one();
        negate = true;
    }
    if r > rat(1, 2) {
        r = BigRational::one() - r;
    }
    let value = if r.is_zero() {
        Expr::zero()
    } else if r == rat(1, 6) {
        Expr::rational(1, 2)
    } else if r == rat(1, 4) {
        simplify(&Expr::mul2(Expr::rational(1, 2), sqrt_int(2)))
    } else if r == rat(1, 3) {
        simplify(&Expr::mul2(Expr::rational(1, 2), sqrt_int(3)))
    } else if r == rat(1, 2) {
        Expr::one()
    } else {
        return None;
    };
    Some(if negate { value.neg_simplified() } else { value })
}

fn cos_pi(r: &BigRational) -> Option<Expr> {
    // cos(x) = sin(x + pi/2)
    sin_pi(&(r + rat(1, 2)))
}

fn tan_pi(r: &BigRational) -> Option<Expr> {
    let one = BigRational::one();
    let mut r = r - r.floor(); // reduce mod 1
    let mut negate = false;
    if r > rat(1, 2) {
        r = &one - &r;
        negate = true;
    }
    let value = if r.is_zero() {
        Expr::zero()
    } else if r == rat(1, 6) {
        simplify(&Expr::mul2(Expr::rational(1, 3), sqrt_int(3)))
    } else if r == rat(1, 4) {
        Expr::one()
    } else if r == rat(1, 3) {
        sqrt_int(3)
    } else if r == rat(1, 2) {
        return Some(Expr::Constant(Constant::ComplexInfinity));
    } else {
        return None;
    };
    Some(if negate { value.neg_simplified() } else { value })
}

/// Strip a leading `-1` factor for odd/even symmetry rules.
fn negated_argument(e: &Expr) -> Option<Expr> {
    match e {
        Expr::Number(n) if n.is_negative() => Some(Expr::Number(-n)),
        Expr::Mul(items) => {
            if let Some(Expr::Number(n)) = items.first() {
                if n.is_negative() {
                    let mut rest = items.clone();
                    let pos = -n;
                    if pos.is_one() && rest.len() > 1 {
                        rest.remove(0);
                    } else {
                        rest[0] = Expr::Number(pos);
                    }
                    return Some(Expr::mul(rest));
                }
            }
            None
        }
        _ => None,
    }
}

fn simplify_function(f: Func, args: Vec<Expr>) -> Expr {
    if args.iter().any(is_nan) {
        return nan();
    }
    let arg = || args[0].clone();

    match f {
        Func::Abs => {
            let a = arg();
            match &a {
                Expr::Number(n) => Expr::Number(n.abs()),
                Expr::Constant(Constant::Infinity) | Expr::Constant(Constant::NegInfinity) => {
                    Expr::Constant(Constant::Infinity)
                }
                Expr::Function(Func::Abs, _) => a,
                _ => match negated_argument(&a) {
                    Some(pos) => simplify_function(Func::Abs, vec![pos]),
                    None => Expr::func(Func::Abs, vec![a]),
                },
            }
        }
        Func::Sign => {
            let a = arg();
            match &a {
                Expr::Number(n) => Expr::integer(match n.cmp(&BigRational::zero()) {
                    std::cmp::Ordering::Less => -1,
                    std::cmp::Ordering::Equal => 0,
                    std::cmp::Ordering::Greater => 1,
                }),
                Expr::Constant(Constant::Pi) | Expr::Constant(Constant::E) => Expr::one(),
                Expr::Constant(Constant::Infinity) => Expr::one(),
                Expr::Constant(Constant::NegInfinity) => Expr::integer(-1),
                _ => Expr::func(Func::Sign, vec![a]),
            }
        }
        Func::Sin | Func::Cos | Func::Tan => {
            let a = arg();
            if let Some(r) = as_pi_multiple(&a) {
                let folded = match f {
                    Func::Sin => sin_pi(&r),
                    Func::Cos => cos_pi(&r),
                    _ => tan_pi(&r),
                };
                if let Some(v) = folded {
                    return v;
                }
            }
            if a.is_zero() {
                return match f {
                    Func::Cos => Expr::one(),
                    _ => Expr::zero(),
                };
            }
            if let Some(pos) = negated_argument(&a) {
                let inner = simplify_function(f, vec![pos]);
                return match f {
                    Func::Cos => inner,
                    _ => inner.neg_simplified(),
                };
            }
            Expr::func(f, vec![a])
        }
        Func::Sec | Func::Csc | Func::Cot => {
            let a = arg();
            if a.is_zero() {
                return match f {
                    Func::Sec => Expr::one(),
                    _ => Expr::Constant(Constant::ComplexInfinity),
                };
            }
            if let Some(pos) = negated_argument(&a) {
                let inner = simplify_function(f, vec![pos]);
                return match f {
                    Func::Sec => inner,
                    _ => inner.neg_simplified(),
                };
            }
            Expr::func(f, vec![a])
        }
        Func::Asin | Func::Atan | Func::Asinh | Func::Atanh | Func::Sinh | Func::Tanh => {
            let a = arg();
            if a.is_zero() {
                return Expr::zero();
            }
            if f == Func::Asin {
                if a.is_one() {
                    return simplify(&Expr::mul2(Expr::rational(1, 2), Expr::Constant(Constant::Pi)));
                }
                if a == Expr::rational(1, 2) {
                    return simplify(&Expr::mul2(Expr::rational(1, 6), Expr::Constant(Constant::Pi)));
                }
            }
            if f == Func::Atan {
                if a.is_one() {
                    return simplify(&Expr::mul2(Expr::rational(1, 4), Expr::Constant(Constant::Pi)));
                }
                if matches!(a, Expr::Constant(Constant::Infinity)) {
                    return simplify(&Expr::mul2(Expr::rational(1, 2), Expr::Constant(Constant::Pi)));
                }
            }
            if f == Func::Tanh && matches!(a, Expr::Constant(Constant::Infinity)) {
                return Expr::one();
            }
            if f == Func::Sinh && a.is_infinite() {
                return a;
            }
            if let Some(pos) = negated_argument(&a) {
                return simplify_function(f, vec![pos]).neg_simplified();
            }
            Expr::func(f, vec![a])
        }
        Func::Acos => {
            let a = arg();
            if a.is_zero() {
                return simplify(&Expr::mul2(Expr::rational(1, 2), Expr::Constant(Constant::Pi)));
            }
            if a.is_one() {
                return Expr::zero();
            }
            if a.is_minus_one() {
                return Expr::Constant(Constant::Pi);
            }
            if a == Expr::rational(1, 2) {
                return simplify(&Expr::mul2(Expr::rational(1, 3), Expr::Constant(Constant::Pi)));
            }
            Expr::func(Func::Acos, vec![a])
        }
        Func::Cosh => {
            let a = arg();
            if a.is_zero() {
                return Expr::one();
            }
            if a.is_infinite() {
                return Expr::Constant(Constant::Infinity);
            }
            if let Some(pos) = negated_argument(&a) {
                return simplify_function(Func::Cosh, vec![pos]);
            }
            Expr::func(Func::Cosh, vec![a])
        }
        Func::Acosh => {
            let a = arg();
            if a.is_one() {
                return Expr::zero();
            }
            Expr::func(Func::Acosh, vec![a])
        }
        Func::Exp => {
            let a = arg();
            match &a {
                Expr::Number(n) if n.is_zero() => Expr::one(),
                Expr::Number(n) if n.is_one() => Expr::Constant(Constant::E),
                Expr::Constant(Constant::Infinity) => Expr::Constant(Constant::Infinity),
                Expr::Constant(Constant::NegInfinity) => Expr::zero(),
                Expr::Function(Func::Log, inner) => inner[0].clone(),
                Expr::Mul(items) => {
                    // exp(k*log(u)) = u^k
                    let logs: Vec<&Expr> = items
                        .iter()
                        .filter(|i| matches!(i, Expr::Function(Func::Log, _)))
                        .collect();
                    if logs.len() == 1 {
                        if let Expr::Function(Func::Log, inner) = logs[0] {
                            let k: Vec<Expr> = items
                                .iter()
                                .filter(|i| !matches!(i, Expr::Function(Func::Log, _)))
                                .cloned()
                                .collect();
                            return simplify_pow(inner[0].clone(), Expr::mul(k));
                        }
                    }
                    Expr::func(Func::Exp, vec![a])
                }
                _ => Expr::func(Func::Exp, vec![a]),
            }
        }
        Func::Log => {
            let a = arg();
            match &a {
                Expr::Number(n) if n.is_one() => Expr::zero(),
                Expr::Number(n) if n.is_zero() => Expr::Constant(Constant::ComplexInfinity),
                Expr::Number(n) if n.is_negative() => {
                    let principal = simplify_function(Func::Log, vec![Expr::Number(n.abs())]);
                    simplify_add(vec![
                        principal,
                        Expr::mul2(Expr::Constant(Constant::I), Expr::Constant(Constant::Pi)),
                    ])
                }
                Expr::Constant(Constant::E) => Expr::one(),
                Expr::Constant(Constant::Infinity) => Expr::Constant(Constant::Infinity),
                Expr::Function(Func::Exp, inner) => inner[0].clone(),
                _ => Expr::func(Func::Log, vec![a]),
            }
        }
        Func::Factorial => {
            let a = arg();
            if let Some(n) = a.as_integer() {
                if n.is_negative() {
                    return Expr::Constant(Constant::ComplexInfinity);
                }
                if let Some(small) = n.to_i64() {
                    if small <= MAX_FOLD_EXPONENT.min(MAX_FACTORIAL) {
                        let mut acc = BigInt::one();
                        for i in 2..=small {
                            acc *= i;
                        }
                        return Expr::from_bigint(acc);
                    }
                }
            }
            Expr::func(Func::Factorial, vec![a])
        }
        Func::Mod => {
            let a = args[0].clone();
            let b = args[1].clone();
            if let (Expr::Number(x), Expr::Number(y)) = (&a, &b) {
                if y.is_zero() {
                    return nan();
                }
                let r = x - y * (x / y).floor();
                return Expr::Number(r);
            }
            if a.is_zero() {
                return Expr::zero();
            }
            Expr::func(Func::Mod, vec![a, b])
        }
        Func::Order => Expr::func(Func::Order, args),
    }
}

// ---------------------------------------------------------------------------
// expand / factor / collect
// ---------------------------------------------------------------------------

/// Distribute products over sums and open small integer powers of sums.
pub fn expand(e: &Expr) -> Expr {
    let s = simplify(e);
    simplify(&expand_node(&s))
}

fn expand_node(e: &Expr) -> Expr {
    match e {
        Expr::Add(items) => Expr::Add(items.iter().map(expand_node).collect()),
        Expr::Mul(items) => {
            let factors: Vec<Expr> = items.iter().map(expand_node).collect();
            distribute(factors)
        }
        Expr::Pow(base, exp) => {
            let b = expand_node(base);
            match exp.as_i64() {
                Some(n) if (2..=64).contains(&n) && matches!(b, Expr::Add(_)) => {
                    let factors = vec![b; n as usize];
                    distribute(factors)
                }
                _ => Expr::pow(b, expand_node(exp)),
            }
        }
        Expr::Function(f, args) => Expr::Function(*f, args.iter().map(expand_node).collect()),
        _ => e.clone(),
    }
}

fn distribute(factors: Vec<Expr>) -> Expr {
    let mut terms: Vec<Expr> = vec![Expr::one()];
    for factor in factors {
        let pieces: Vec<Expr> = match factor {
            Expr::Add(items) => items,
            other => vec![other],
        };
        let mut next = Vec::with_capacity(terms.len() * pieces.len());
        for t in &terms {
            for p in &pieces {
                next.push(Expr::mul2(t.clone(), p.clone()));
            }
        }
        terms = next;
    }
    Expr::add(terms)
}

/// Dense coefficients of `e` as a polynomial in `var`, constant term first.
/// `None` when `e` is not a polynomial in `var` or has symbolic coefficients
/// that still mention `var`.
pub fn poly_coefficients(e: &Expr, var: &str) -> Option<Vec<Expr>> {
    let expanded = expand(e);
    let mut map: BTreeMap<i64, Vec<Expr>> = BTreeMap::new();
    let terms: Vec<Expr> = match expanded {
        Expr::Add(items) => items,
        other => vec![other],
    };
    for term in terms {
        let (degree, coeff) = split_var_power(&term, var)?;
        map.entry(degree).or_default().push(coeff);
    }
    let max_degree = map.keys().max().copied().unwrap_or(0);
    let mut out = vec![Expr::zero(); (max_degree + 1) as usize];
    for (degree, coeffs) in map {
        out[degree as usize] = simplify_add(coeffs);
    }
    Some(out)
}

/// Split one product term into `(k, coeff)` with `term = coeff * var^k`.
fn split_var_power(term: &Expr, var: &str) -> Option<(i64, Expr)> {
    let factors: Vec<Expr> = match term {
        Expr::Mul(items) => items.clone(),
        other => vec![other.clone()],
    };
    let mut degree = 0i64;
    let mut coeff_factors: Vec<Expr> = Vec::new();
    for f in factors {
        match &f {
            Expr::Symbol(s) if s == var => degree += 1,
            Expr::Pow(b, x) if matches!(&**b, Expr::Symbol(s) if s == var) => {
                match x.as_i64() {
                    Some(k) if k > 0 => degree += k,
                    _ => return None,
                }
            }
            other if other.has_symbol(var) => return None,
            other => coeff_factors.push(other.clone()),
        }
    }
    Some((degree, Expr::mul(coeff_factors)))
}

/// Rational coefficients of a polynomial in `var`, constant term first.
pub fn rational_coefficients(e: &Expr, var: &str) -> Option<Vec<BigRational>> {
    let coeffs = poly_coefficients(e, var)?;
    coeffs
        .iter()
        .map(|c| c.as_number().cloned())
        .collect()
}

/// Rebuild a dense-coefficient polynomial (constant term first).
pub fn poly_from_coefficients(coeffs: &[Expr], var: &str) -> Expr {
    let mut terms = Vec::new();
    for (k, c) in coeffs.iter().enumerate() {
        if c.is_zero() {
            continue;
        }
        let power = match k {
            0 => Expr::one(),
            1 => Expr::symbol(var),
            _ => Expr::pow(Expr::symbol(var), Expr::integer(k as i64)),
        };
        terms.push(Expr::mul2(c.clone(), power));
    }
    simplify(&Expr::add(terms))
}

/// Factor a polynomial over the rationals. Non-polynomial input and
/// irreducible polynomials come back simplified but otherwise unchanged.
pub fn factor(e: &Expr) -> Expr {
    let expanded = expand(e);
    let symbols = expanded.free_symbols();
    if symbols.len() != 1 {
        return factor_content(&expanded);
    }
    let var = match symbols.iter().next() {
        Some(v) => v.clone(),
        None => return expanded,
    };
    let coeffs = match rational_coefficients(&expanded, &var) {
        Some(c) if c.len() > 2 => c,
        _ => return factor_content(&expanded),
    };

    let mut remaining = coeffs;
    let mut constant = BigRational::one();
    let mut linear_factors: Vec<(BigInt, BigInt)> = Vec::new(); // (q, p): q*x - p

    loop {
        trim_leading_zeros(&mut remaining);
        if remaining.len() <= 1 {
            break;
        }
        match find_rational_root(&remaining) {
            Some(root) => {
                remaining = deflate(&remaining, &root);
                let p = root.numer().clone();
                let q = root.denom().clone();
                constant /= BigRational::from_integer(q.clone());
                linear_factors.push((q, p));
            }
            None => break,
        }
    }

    if linear_factors.is_empty() {
        return factor_content(&expanded);
    }

    let mut factors: Vec<Expr> = Vec::new();
    let mut counts: BTreeMap<(BigInt, BigInt), i64> = BTreeMap::new();
    for key in linear_factors {
        *counts.entry(key).or_insert(0) += 1;
    }
    for ((q, p), count) in counts {
        let linear = simplify(&Expr::add2(
            Expr::mul2(Expr::from_bigint(q), Expr::symbol(&var)),
            Expr::from_bigint(-p),
        ));
        factors.push(if count == 1 {
            linear
        } else {
            Expr::pow(linear, Expr::integer(count))
        });
    }

    // Whatever did not deflate stays as an irreducible tail.
    trim_leading_zeros(&mut remaining);
    if remaining.len() > 1 {
        let tail: Vec<Expr> = remaining.iter().map(|c| Expr::Number(c.clone())).collect();
        factors.push(poly_from_coefficients(&tail, &var));
    } else if let Some(c) = remaining.first() {
        constant *= c;
    }

    if !constant.is_one() {
        factors.insert(0, Expr::Number(constant));
    }
    match factors.len() {
        0 => Expr::one(),
        1 => factors.into_iter().next().unwrap_or_else(Expr::one),
        _ => Expr::Mul(factors),
    }
}

/// Pull the common rational-and-monomial content out of a sum.
fn factor_content(e: &Expr) -> Expr {
    let terms: Vec<Expr> = match e {
        Expr::Add(items) => items.clone(),
        _ => return e.clone(),
    };

    let mut common: Option<BigRational> = None;
    for t in &terms {
        let (c, _) = coeff_core(t);
        common = Some(match common {
            None => c.abs(),
            Some(prev) => gcd_rational(&prev, &c.abs()),
        });
    }
    let content = match common {
        Some(c) if !c.is_one() && !c.is_zero() => c,
        _ => return e.clone(),
    };

    let inner: Vec<Expr> = terms
        .iter()
        .map(|t| {
            let (c, core) = coeff_core(t);
            scaled(c / &content, core)
        })
        .collect();
    Expr::mul2(Expr::Number(content), Expr::add(inner))
}

fn gcd_rational(a: &BigRational, b: &BigRational) -> BigRational {
    use num_integer::Integer;
    let num = a.numer().gcd(b.numer());
    let den = a.denom().lcm(b.denom());
    BigRational::new(num, den)
}

fn trim_leading_zeros(coeffs: &mut Vec<BigRational>) {
    while coeffs.len() > 1 && coeffs.last().map(|c| c.is_zero()).unwrap_or(false) {
        coeffs.pop();
    }
}

/// One rational root of the polynomial, by the rational root theorem.
pub fn find_rational_root(coeffs: &[BigRational]) -> Option<BigRational> {
    use num_integer::Integer;

    // Clear denominators to an integer polynomial.
    let mut lcm = BigInt::one();
    for c in coeffs {
        lcm = lcm.lcm(c.denom());
    }
    let ints: Vec<BigInt> = coeffs
        .iter()
        .map(|c| c.numer() * (&lcm / c.denom()))
        .collect();

    let a0 = ints.first()?.clone();
    let an = ints.last()?.clone();
    if a0.is_zero() {
        return Some(BigRational::zero());
    }

    let p_divs = small_divisors(&a0);
    let q_divs = small_divisors(&an);
    for p in &p_divs {
        for q in &q_divs {
            for sign in [1i64, -1] {
                let candidate = BigRational::new(p * sign, q.clone());
                if eval_poly(coeffs, &candidate).is_zero() {
                    return Some(candidate);
                }
            }
        }
    }
    None
}

fn small_divisors(n: &BigInt) -> Vec<BigInt> {
    let n = n.abs();
    let mut out = Vec::new();
    let mut d = BigInt::one();
    let limit = BigInt::from(10_000);
    while &d * &d <= n && d <= limit {
        if (&n % &d).is_zero() {
            out.push(d.clone());
            out.push(&n / &d);
        }
        d += 1u32;
    }
    out.sort();
    out.dedup();
    out
}

pub fn eval_poly(coeffs: &[BigRational], x: &BigRational) -> BigRational {
    let mut acc = BigRational::zero();
    for c in coeffs.iter().rev() {
        acc = acc * x + c;
    }
    acc
}

/// Synthetic division by `(x - root)`; the root must be exact.
pub fn deflate(coeffs: &[BigRational], root: &BigRational) -> Vec<BigRational> {
    let mut out = vec![BigRational::zero(); coeffs.len().saturating_sub(1)];
    let mut carry = BigRational::zero();
    for i in (0..out.len()).rev() {
        carry = &coeffs[i + 1] + &carry * root;
        out[i] = carry.clone();
    }
    out
}

// ---------------------------------------------------------------------------
// trigonometric rewriting
// ---------------------------------------------------------------------------

/// Apply Pythagorean and quotient identities.
pub fn trig_simplify(e: &Expr) -> Expr {
    let s = simplify(e);
    simplify(&trig_rules(&s))
}

fn trig_rules(e: &Expr) -> Expr {
    match e {
        Expr::Add(items) => {
            let rewritten: Vec<Expr> = items.iter().map(trig_rules).collect();
            fold_pythagorean(rewritten)
        }
        Expr::Mul(items) => {
            let rewritten: Vec<Expr> = items.iter().map(trig_rules).collect();
            fold_products(rewritten)
        }
        Expr::Pow(b, x) => Expr::pow(trig_rules(b), trig_rules(x)),
        Expr::Function(f, args) => Expr::Function(*f, args.iter().map(trig_rules).collect()),
        _ => e.clone(),
    }
}

/// c*sin(u)^2 + c*cos(u)^2 -> c, and c - c*sin(u)^2 -> c*cos(u)^2.
fn fold_pythagorean(terms: Vec<Expr>) -> Expr {
    #[derive(PartialEq)]
    enum Kind {
        SinSq,
        CosSq,
    }
    fn squared_trig(core: &Expr) -> Option<(Kind, Expr)> {
        if let Expr::Pow(b, x) = core {
            if x.as_i64() == Some(2) {
                if let Expr::Function(f, args) = &**b {
                    match f {
                        Func::Sin => return Some((Kind::SinSq, args[0].clone())),
                        Func::Cos => return Some((Kind::CosSq, args[0].clone())),
                        _ => {}
                    }
                }
            }
        }
        None
    }

    let mut terms = terms;
    'outer: loop {
        for i in 0..terms.len() {
            let (ci, core_i) = coeff_core(&terms[i]);
            let Some((kind_i, u)) = squared_trig(&core_i) else {
                continue;
            };
            for j in 0..terms.len() {
                if i == j {
                    continue;
                }
                let (cj, core_j) = coeff_core(&terms[j]);
                if let Some((kind_j, v)) = squared_trig(&core_j) {
                    if u == v && kind_i != kind_j && ci == cj {
                        // sin^2 + cos^2 with equal weights
                        let replacement = Expr::Number(ci);
                        let mut keep: Vec<Expr> = Vec::new();
                        for (k, t) in terms.iter().enumerate() {
                            if k != i && k != j {
                                keep.push(t.clone());
                            }
                        }
                        keep.push(replacement);
                        terms = keep;
                        continue 'outer;
                    }
                } else if core_j.is_one() && cj == -&ci {
                    // c - c*sin^2(u) -> c*cos^2(u) (and symmetrically)
                    let other = match kind_i {
                        Kind::SinSq => Func::Cos,
                        Kind::CosSq => Func::Sin,
                    };
                    let replacement = scaled(
                        cj,
                        Expr::pow(Expr::func(other, vec![u.clone()]), Expr::integer(2)),
                    );
                    let mut keep: Vec<Expr> = Vec::new();
                    for (k, t) in terms.iter().enumerate() {
                        if k != i && k != j {
                            keep.push(t.clone());
                        }
                    }
                    keep.push(replacement);
                    terms = keep;
                    continue 'outer;
                }
            }
        }
        break;
    }
    simplify_add(terms)
}

/// sin(u)/cos(u) -> tan(u) and 2*sin(u)*cos(u) -> sin(2*u).
fn fold_products(factors: Vec<Expr>) -> Expr {
    let mut factors = factors;

    // Quotient identity.
    loop {
        let mut sin_at: Option<(usize, Expr)> = None;
        let mut inv_cos_at: Option<(usize, Expr)> = None;
        for (i, f) in factors.iter().enumerate() {
            match f {
                Expr::Function(Func::Sin, args) => {
                    if sin_at.is_none() {
                        sin_at = Some((i, args[0].clone()));
                    }
                }
                Expr::Pow(b, x) if x.is_minus_one() => {
                    if let Expr::Function(Func::Cos, args) = &**b {
                        if inv_cos_at.is_none() {
                            inv_cos_at = Some((i, args[0].clone()));
                        }
                    }
                }
                _ => {}
            }
        }
        match (&sin_at, &inv_cos_at) {
            (Some((i, u)), Some((j, v))) if u == v => {
                let tan = Expr::func(Func::Tan, vec![u.clone()]);
                let (i, j) = (*i, *j);
                let mut keep: Vec<Expr> = Vec::new();
                for (k, f) in factors.iter().enumerate() {
                    if k != i && k != j {
                        keep.push(f.clone());
                    }
                }
                keep.push(tan);
                factors = keep;
            }
            _ => break,
        }
    }

    // Double angle: sin(u)*cos(u) -> sin(2u)/2.
    let has_pair = |factors: &[Expr]| -> Option<(usize, usize, Expr)> {
        for (i, f) in factors.iter().enumerate() {
            if let Expr::Function(Func::Sin, a) = f {
                for (j, g) in factors.iter().enumerate() {
                    if let Expr::Function(Func::Cos, b) = g {
                        if a[0] == b[0] {
                            return Some((i, j, a[0].clone()));
                        }
                    }
                }
            }
        }
        None
    };
    while let Some((i, j, u)) = has_pair(&factors) {
        let double = Expr::func(Func::Sin, vec![simplify(&Expr::mul2(Expr::integer(2), u))]);
        let mut keep: Vec<Expr> = Vec::new();
        for (k, f) in factors.iter().enumerate() {
            if k != i && k != j {
                keep.push(f.clone());
            }
        }
        keep.push(Expr::rational(1, 2));
        keep.push(double);
        factors = keep;
    }

    simplify_mul(factors)
}

/// Open sums and integer multiples inside trig functions.
pub fn trig_expand(e: &Expr) -> Expr {
    let s = simplify(e);
    simplify(&trig_expand_node(&s))
}

fn trig_expand_node(e: &Expr) -> Expr {
    match e {
        Expr::Add(items) => Expr::Add(items.iter().map(trig_expand_node).collect()),
        Expr::Mul(items) => Expr::Mul(items.iter().map(trig_expand_node).collect()),
        Expr::Pow(b, x) => Expr::pow(trig_expand_node(b), trig_expand_node(x)),
        Expr::Function(f @ (Func::Sin | Func::Cos | Func::Tan), args) => {
            expand_trig_call(*f, &simplify(&trig_expand_node(&args[0])))
        }
        Expr::Function(f, args) => {
            Expr::Function(*f, args.iter().map(trig_expand_node).collect())
        }
        _ => e.clone(),
    }
}

fn expand_trig_call(f: Func, arg: &Expr) -> Expr {
    // Integer multiple: rewrite n*u as (n-1)*u + u and recurse.
    if let Expr::Mul(items) = arg {
        if let Some(Expr::Number(n)) = items.first() {
            if n.is_integer() && !n.is_one() {
                if let Some(k) = n.to_integer().to_i64() {
                    if (2..=64).contains(&k) {
                        let rest = Expr::mul(items[1..].to_vec());
                        let reduced = simplify(&Expr::mul2(Expr::integer(k - 1), rest.clone()));
                        return expand_trig_sum(f, &reduced, &rest);
                    }
                }
            }
        }
    }
    if let Expr::Add(items) = arg {
        if items.len() >= 2 {
            let first = items[0].clone();
            let rest = simplify(&Expr::add(items[1..].to_vec()));
            return expand_trig_sum(f, &first, &rest);
        }
    }
    Expr::func(f, vec![arg.clone()])
}

fn expand_trig_sum(f: Func, a: &Expr, b: &Expr) -> Expr {
    let sin_a = expand_trig_call(Func::Sin, a);
    let cos_a = expand_trig_call(Func::Cos, a);
    let sin_b = expand_trig_call(Func::Sin, b);
    let cos_b = expand_trig_call(Func::Cos, b);
    match f {
        Func::Sin => simplify(&Expr::add2(
            Expr::mul2(sin_a, cos_b),
            Expr::mul2(cos_a, sin_b),
        )),
        Func::Cos => simplify(&Expr::sub(
            Expr::mul2(cos_a.clone(), cos_b.clone()),
            Expr::mul2(sin_a, sin_b),
        )),
        _ => {
            let tan_a = expand_trig_call(Func::Tan, a);
            let tan_b = expand_trig_call(Func::Tan, b);
            simplify(&Expr::div(
                Expr::add2(tan_a.clone(), tan_b.clone()),
                Expr::sub(Expr::one(), Expr::mul2(tan_a, tan_b)),
            ))
        }
    }
}
