//! The symbolic-engine seam.
//!
//! Operation handlers never reach into the algorithm modules directly; they
//! go through [`SymbolicEngine`], a narrow capability interface (parse,
//! simplify, calculus, solving, matrix ops, number theory, rendering,
//! numeric evaluation). [`NativeEngine`] is the in-repo implementation.
//! Anything satisfying the trait can stand in for it, which keeps the
//! dispatch layer testable against a stub.

use std::collections::BTreeMap;

use num_bigint::BigInt;

use crate::ast::Expr;
use crate::calculus::{self, Direction};
use crate::error::MathResult;
use crate::matrix::Matrix;
use crate::number_theory;
use crate::numeric::{self, NumericValue};
use crate::solve::{self, SystemSolution};
use crate::{latex, parser, simplify};

pub trait SymbolicEngine {
    // parsing & rewriting
    fn parse(&self, text: &str) -> MathResult<Expr>;
    fn parse_equation(&self, text: &str) -> MathResult<Expr>;
    fn simplify(&self, e: &Expr) -> Expr;
    fn expand(&self, e: &Expr) -> Expr;
    fn factor(&self, e: &Expr) -> Expr;
    fn trig_simplify(&self, e: &Expr) -> Expr;
    fn trig_expand(&self, e: &Expr) -> Expr;

    // calculus
    fn derivative(&self, e: &Expr, var: &str, order: u32) -> MathResult<Expr>;
    fn integrate(&self, e: &Expr, var: &str) -> MathResult<Expr>;
    fn integrate_definite(
        &self,
        e: &Expr,
        var: &str,
        lower: &Expr,
        upper: &Expr,
    ) -> MathResult<Expr>;
    fn limit(&self, e: &Expr, var: &str, point: &Expr, dir: Direction) -> MathResult<Expr>;
    fn series(&self, e: &Expr, var: &str, point: &Expr, order: u32) -> MathResult<Expr>;
    fn summation(&self, e: &Expr, var: &str, start: &Expr, end: &Expr) -> MathResult<Expr>;

    // solving
    fn solve(&self, equation: &Expr, var: &str) -> MathResult<Vec<Expr>>;
    fn solve_system(&self, equations: &[Expr], variables: &[String])
        -> MathResult<SystemSolution>;

    // linear algebra
    fn determinant(&self, m: &Matrix) -> MathResult<Expr>;
    fn inverse(&self, m: &Matrix) -> MathResult<Matrix>;
    fn matrix_multiply(&self, a: &Matrix, b: &Matrix) -> MathResult<Matrix>;
    fn rref(&self, m: &Matrix) -> (Matrix, Vec<usize>);
    fn eigenvalues(&self, m: &Matrix) -> MathResult<Vec<(Expr, usize)>>;
    #[allow(clippy::type_complexity)]
    fn eigenvectors(&self, m: &Matrix) -> MathResult<Vec<(Expr, usize, Vec<Vec<Expr>>)>>;

    // number theory
    fn gcd(&self, values: &[BigInt]) -> BigInt;
    fn lcm(&self, values: &[BigInt]) -> BigInt;
    fn factorint(&self, n: &BigInt) -> BTreeMap<BigInt, u32>;
    fn is_prime(&self, n: &BigInt) -> bool;
    fn nth_prime(&self, n: u64) -> MathResult<u64>;
    fn factorial(&self, n: u64) -> MathResult<BigInt>;
    fn binomial(&self, n: &BigInt, k: &BigInt) -> MathResult<BigInt>;

    // rendering & numerics
    fn latex(&self, e: &Expr) -> String;
    fn approx(&self, e: &Expr) -> NumericValue;
}

/// The in-repo symbolic engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolicEngine for NativeEngine {
    fn parse(&self, text: &str) -> MathResult<Expr> {
        parser::parse(text)
    }

    fn parse_equation(&self, text: &str) -> MathResult<Expr> {
        solve::equation_expr(text)
    }

    fn simplify(&self, e: &Expr) -> Expr {
        simplify::simplify(e)
    }

    fn expand(&self, e: &Expr) -> Expr {
        simplify::expand(e)
    }

    fn factor(&self, e: &Expr) -> Expr {
        simplify::factor(e)
    }

    fn trig_simplify(&self, e: &Expr) -> Expr {
        simplify::trig_simplify(e)
    }

    fn trig_expand(&self, e: &Expr) -> Expr {
        simplify::trig_expand(e)
    }

    fn derivative(&self, e: &Expr, var: &str, order: u32) -> MathResult<Expr> {
        calculus::derivative(e, var, order)
    }

    fn integrate(&self, e: &Expr, var: &str) -> MathResult<Expr> {
        calculus::integrate(e, var)
    }

    fn integrate_definite(
        &self,
        e: &Expr,
        var: &str,
        lower: &Expr,
        upper: &Expr,
    ) -> MathResult<Expr> {
        calculus::integrate_definite(e, var, lower, upper)
    }

    fn limit(&self, e: &Expr, var: &str, point: &Expr, dir: Direction) -> MathResult<Expr> {
        calculus::limit(e, var, point, dir)
    }

    fn series(&self, e: &Expr, var: &str, point: &Expr, order: u32) -> MathResult<Expr> {
        calculus::series(e, var, point, order)
    }

    fn summation(&self, e: &Expr, var: &str, start: &Expr, end: &Expr) -> MathResult<Expr> {
        calculus::summation(e, var, start, end)
    }

    fn solve(&self, equation: &Expr, var: &str) -> MathResult<Vec<Expr>> {
        solve::solve_equation(equation, var)
    }

    fn solve_system(
        &self,
        equations: &[Expr],
        variables: &[String],
    ) -> MathResult<SystemSolution> {
        solve::solve_system(equations, variables)
    }

    fn determinant(&self, m: &Matrix) -> MathResult<Expr> {
        m.determinant()
    }

    fn inverse(&self, m: &Matrix) -> MathResult<Matrix> {
        m.inverse()
    }

    fn matrix_multiply(&self, a: &Matrix, b: &Matrix) -> MathResult<Matrix> {
        a.multiply(b)
    }

    fn rref(&self, m: &Matrix) -> (Matrix, Vec<usize>) {
        m.rref()
    }

    fn eigenvalues(&self, m: &Matrix) -> MathResult<Vec<(Expr, usize)>> {
        m.eigenvalues()
    }

    fn eigenvectors(&self, m: &Matrix) -> MathResult<Vec<(Expr, usize, Vec<Vec<Expr>>)>> {
        m.eigenvectors()
    }

    fn gcd(&self, values: &[BigInt]) -> BigInt {
        number_theory::gcd_many(values)
    }

    fn lcm(&self, values: &[BigInt]) -> BigInt {
        number_theory::lcm_many(values)
    }

    fn factorint(&self, n: &BigInt) -> BTreeMap<BigInt, u32> {
        number_theory::factorint(n)
    }

    fn is_prime(&self, n: &BigInt) -> bool {
        number_theory::is_prime(n)
    }

    fn nth_prime(&self, n: u64) -> MathResult<u64> {
        number_theory::nth_prime(n)
    }

    fn factorial(&self, n: u64) -> MathResult<BigInt> {
        number_theory::factorial(n)
    }

    fn binomial(&self, n: &BigInt, k: &BigInt) -> MathResult<BigInt> {
        number_theory::binomial(n, k)
    }

    fn latex(&self, e: &Expr) -> String {
        latex::latex(e)
    }

    fn approx(&self, e: &Expr) -> NumericValue {
        numeric::approx(e)
    }
}
