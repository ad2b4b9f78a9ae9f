use crate::number_theory::{
    binomial, factorial, factorint, gcd_many, is_prime, lcm_many, nth_prime,
};
use num_bigint::BigInt;
use std::collections::BTreeMap;

fn big(n: i64) -> BigInt {
    BigInt::from(n)
}

#[test]
fn test_gcd_folds_left() {
    assert_eq!(gcd_many(&[big(12), big(18)]), big(6));
    assert_eq!(gcd_many(&[big(4), big(6), big(8)]), big(2));
    assert_eq!(gcd_many(&[big(-12), big(18)]), big(6));
    assert_eq!(gcd_many(&[big(7), big(13)]), big(1));
}

#[test]
fn test_lcm_folds_left() {
    assert_eq!(lcm_many(&[big(4), big(6)]), big(12));
    assert_eq!(lcm_many(&[big(2), big(3), big(4)]), big(12));
}

#[test]
fn test_factorint_small() {
    let expected: BTreeMap<BigInt, u32> =
        [(big(2), 2), (big(3), 1), (big(5), 1)].into_iter().collect();
    assert_eq!(factorint(&big(60)), expected);

    let expected: BTreeMap<BigInt, u32> = [(big(2), 10)].into_iter().collect();
    assert_eq!(factorint(&big(1024)), expected);
}

#[test]
fn test_factorint_degenerate_inputs() {
    let expected: BTreeMap<BigInt, u32> = [(big(0), 1)].into_iter().collect();
    assert_eq!(factorint(&big(0)), expected);
    assert!(factorint(&big(1)).is_empty());
}

#[test]
fn test_factorint_negative_carries_sign_entry() {
    let expected: BTreeMap<BigInt, u32> =
        [(big(-1), 1), (big(2), 2), (big(3), 1)].into_iter().collect();
    assert_eq!(factorint(&big(-12)), expected);
}

#[test]
fn test_factorint_splits_large_semiprime() {
    // Both factors sit above the trial-division cutoff.
    let n = big(999_983) * big(1_000_003);
    let expected: BTreeMap<BigInt, u32> =
        [(big(999_983), 1), (big(1_000_003), 1)].into_iter().collect();
    assert_eq!(factorint(&n), expected);
}

#[test]
fn test_is_prime() {
    assert!(is_prime(&big(2)));
    assert!(is_prime(&big(17)));
    assert!(is_prime(&big(97)));
    assert!(is_prime(&big(999_983)));

    assert!(!is_prime(&big(1)));
    assert!(!is_prime(&big(0)));
    assert!(!is_prime(&big(-7)));
    assert!(!is_prime(&big(91)));
}

#[test]
fn test_is_prime_mersenne() {
    let m61 = (BigInt::from(1) << 61) - 1;
    assert_eq!(m61, big(2_305_843_009_213_693_951));
    assert!(is_prime(&m61));
}

#[test]
fn test_is_prime_rejects_strong_pseudoprime() {
    // Strong pseudoprime to bases 2, 3, 5, 7; base 11 exposes it.
    assert!(!is_prime(&big(3_215_031_751)));
}

#[test]
fn test_nth_prime() {
    assert_eq!(nth_prime(1).unwrap(), 2);
    assert_eq!(nth_prime(6).unwrap(), 13);
    assert_eq!(nth_prime(25).unwrap(), 97);
    assert_eq!(nth_prime(168).unwrap(), 997);
}

#[test]
fn test_nth_prime_bounds() {
    assert_eq!(
        nth_prime(0).unwrap_err().to_string(),
        "nth_prime index starts at 1"
    );
    assert_eq!(
        nth_prime(1_000_001).unwrap_err().to_string(),
        "nth_prime index too large (max 1000000)"
    );
}

#[test]
fn test_factorial() {
    assert_eq!(factorial(0).unwrap(), big(1));
    assert_eq!(factorial(5).unwrap(), big(120));
    assert_eq!(
        factorial(20).unwrap(),
        BigInt::from(2_432_902_008_176_640_000u64)
    );
    assert_eq!(factorial(100).unwrap().to_string().len(), 158);
}

#[test]
fn test_factorial_cap() {
    assert_eq!(
        factorial(100_001).unwrap_err().to_string(),
        "factorial argument too large (max 100000)"
    );
}

#[test]
fn test_binomial() {
    assert_eq!(binomial(&big(5), &big(2)).unwrap(), big(10));
    assert_eq!(binomial(&big(5), &big(0)).unwrap(), big(1));
    assert_eq!(binomial(&big(50), &big(25)).unwrap(), big(126_410_606_437_752));
}

#[test]
fn test_binomial_out_of_range_is_zero() {
    assert_eq!(binomial(&big(5), &big(6)).unwrap(), big(0));
    assert_eq!(binomial(&big(5), &big(-1)).unwrap(), big(0));
}

#[test]
fn test_binomial_negative_upper_index() {
    assert_eq!(binomial(&big(-5), &big(2)).unwrap(), big(15));
    assert_eq!(binomial(&big(-5), &big(3)).unwrap(), big(-35));
}
