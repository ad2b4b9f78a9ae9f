//! Exact integer routines: gcd/lcm folds, factorization, primality,
//! prime indexing, and binomial coefficients.

use crate::error::{MathError, MathResult};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::collections::BTreeMap;

const TRIAL_DIVISION_LIMIT: u32 = 100_000;
const MAX_NTH_PRIME: u64 = 1_000_000;
const MAX_FACTORIAL: u64 = 100_000;
const MAX_BINOMIAL_K: u64 = 1_000_000;

pub fn gcd_many(values: &[BigInt]) -> BigInt {
    values
        .iter()
        .fold(BigInt::zero(), |acc, v| acc.gcd(v))
}

pub fn lcm_many(values: &[BigInt]) -> BigInt {
    values
        .iter()
        .fold(BigInt::one(), |acc, v| acc.lcm(v))
}

/// Prime factorization as an ordered `prime -> exponent` map. Zero maps to
/// `{0: 1}` and negative numbers carry a `{-1: 1}` entry, matching the
/// conventional factorization of signed integers.
pub fn factorint(n: &BigInt) -> BTreeMap<BigInt, u32> {
    let mut out = BTreeMap::new();
    if n.is_zero() {
        out.insert(BigInt::zero(), 1);
        return out;
    }
    let mut n = n.clone();
    if n.is_negative() {
        out.insert(BigInt::from(-1), 1);
        n = -n;
    }
    if n.is_one() {
        return out;
    }

    // Small primes by trial division.
    let mut p = BigInt::from(2);
    let limit = BigInt::from(TRIAL_DIVISION_LIMIT);
    while &p * &p <= n && p <= limit {
        while (&n % &p).is_zero() {
            *out.entry(p.clone()).or_insert(0) += 1;
            n /= &p;
        }
        p += if p == BigInt::from(2) { 1u32 } else { 2u32 };
    }

    // Whatever is left splits recursively with Pollard's rho.
    let mut stack = Vec::new();
    if !n.is_one() {
        stack.push(n);
    }
    while let Some(m) = stack.pop() {
        if is_prime(&m) {
            *out.entry(m).or_insert(0) += 1;
        } else {
            let d = pollard_rho(&m);
            stack.push(&m / &d);
            stack.push(d);
        }
    }
    out
}

/// Deterministic Miller-Rabin for anything below 3.3e24; the same witness
/// set serves as a strong probabilistic test above that.
pub fn is_prime(n: &BigInt) -> bool {
    let two = BigInt::from(2);
    if n < &two {
        return false;
    }
    for p in [2u32, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37] {
        let p = BigInt::from(p);
        if *n == p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    let n_minus_one = n - 1u32;
    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while d.is_even() {
        d /= 2u32;
        s += 1;
    }

    'witness: for a in [2u32, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37] {
        let a = BigInt::from(a);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Brent-style rho; `n` must be odd, composite, and free of small factors.
fn pollard_rho(n: &BigInt) -> BigInt {
    let mut c = BigInt::one();
    loop {
        let mut x = BigInt::from(2);
        let mut y = BigInt::from(2);
        let mut d = BigInt::one();
        while d.is_one() {
            x = (&x * &x + &c) % n;
            y = (&y * &y + &c) % n;
            y = (&y * &y + &c) % n;
            let diff = if x > y { &x - &y } else { &y - &x };
            d = diff.gcd(n);
        }
        if &d != n {
            return d;
        }
        c += 1u32;
    }
}

/// 1-indexed prime lookup via a sieve sized from the prime-counting bound.
pub fn nth_prime(n: u64) -> MathResult<u64> {
    if n == 0 {
        return Err(MathError::Engine(
            "nth_prime index starts at 1".to_string(),
        ));
    }
    if n > MAX_NTH_PRIME {
        return Err(MathError::Engine(format!(
            "nth_prime index too large (max {})",
            MAX_NTH_PRIME
        )));
    }
    let target = n as usize;
    let bound = if target < 6 {
        15usize
    } else {
        let nf = target as f64;
        (nf * (nf.ln() + nf.ln().ln())).ceil() as usize + 10
    };

    let mut composite = vec![false; bound + 1];
    let mut seen = 0usize;
    for candidate in 2..=bound {
        if composite[candidate] {
            continue;
        }
        seen += 1;
        if seen == target {
            return Ok(candidate as u64);
        }
        let mut multiple = candidate * candidate;
        while multiple <= bound {
            composite[multiple] = true;
            multiple += candidate;
        }
    }
    Err(MathError::Engine(
        "prime bound estimate exhausted".to_string(),
    ))
}

pub fn factorial(n: u64) -> MathResult<BigInt> {
    if n > MAX_FACTORIAL {
        return Err(MathError::Engine(format!(
            "factorial argument too large (max {})",
            MAX_FACTORIAL
        )));
    }
    let mut acc = BigInt::one();
    for i in 2..=n {
        acc *= i;
    }
    Ok(acc)
}

/// Binomial coefficient with the standard extensions: negative `k` gives 0,
/// `k > n >= 0` gives 0, and negative `n` goes through the upper-negation
/// identity `C(n, k) = (-1)^k C(k - n - 1, k)`.
pub fn binomial(n: &BigInt, k: &BigInt) -> MathResult<BigInt> {
    if k.is_negative() {
        return Ok(BigInt::zero());
    }
    let k_small = k
        .to_u64()
        .filter(|v| *v <= MAX_BINOMIAL_K)
        .ok_or_else(|| {
            MathError::Engine(format!("binomial index too large (max {})", MAX_BINOMIAL_K))
        })?;

    if n.is_negative() {
        let shifted = k - n - 1u32;
        let value = binomial_nonneg(&shifted, k_small);
        return Ok(if k_small % 2 == 1 { -value } else { value });
    }
    if BigInt::from(k_small) > *n {
        return Ok(BigInt::zero());
    }
    Ok(binomial_nonneg(n, k_small))
}

fn binomial_nonneg(n: &BigInt, k: u64) -> BigInt {
    // Use the shorter side when n is small enough to tell.
    let k = match n.to_u64() {
        Some(nv) if k > nv / 2 => nv - k,
        _ => k,
    };
    let mut num = BigInt::one();
    let mut den = BigInt::one();
    for i in 0..k {
        num *= n - i;
        den *= i + 1;
    }
    num / den
}
