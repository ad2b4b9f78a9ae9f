//! Operation registry and dispatch.
//!
//! The registry is a closed enum resolved from a case-insensitive name
//! through a constant alias table (`diff` ≡ `derivative`, `det` ≡
//! `determinant`, ...). [`run`] binds arguments, dispatches, and applies the
//! two-tier error policy: content errors (parse failures, division by zero,
//! a singular matrix, engine limits) come back as an in-band
//! `{"success": false, "error": ...}` document, while structural errors
//! (unknown operation, argument arity/shape) propagate as `Err` for the
//! caller to turn into a non-zero exit.

pub mod binding;
pub mod envelope;
mod handlers;

use serde::Serialize;

use crate::engine::{NativeEngine, SymbolicEngine};
use crate::error::{MathError, MathResult};

pub use binding::ArgumentBinding;
use envelope::ErrorEnvelope;

/// The closed set of canonical operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    // arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
    Power,
    Sqrt,
    Abs,
    Factorial,
    // algebra
    Simplify,
    Expand,
    Factor,
    Solve,
    SolveSystem,
    Substitute,
    // calculus
    Derivative,
    Partial,
    Integrate,
    Limit,
    Series,
    Sum,
    // trigonometry
    TrigSimplify,
    TrigExpand,
    ToRadians,
    ToDegrees,
    // linear algebra
    Matrix,
    Determinant,
    Inverse,
    MatrixMult,
    Eigenvalues,
    Eigenvectors,
    Rref,
    // number theory
    Gcd,
    Lcm,
    PrimeFactors,
    IsPrime,
    NthPrime,
    Binomial,
    // statistics
    Mean,
    Variance,
    StdDev,
    // utility
    Evaluate,
    Latex,
    Compare,
}

/// Aliases, resolved before registry lookup.
const ALIASES: &[(&str, &str)] = &[
    ("diff", "derivative"),
    ("integral", "integrate"),
    ("taylor", "series"),
    ("det", "determinant"),
    ("eval", "evaluate"),
    ("modulo", "mod"),
];

impl Operation {
    /// Resolve a case-insensitive operation name through the alias table.
    pub fn resolve(name: &str) -> MathResult<Operation> {
        let lowered = name.to_ascii_lowercase();
        let canonical = ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|(_, target)| *target)
            .unwrap_or(lowered.as_str());
        let op = match canonical {
            "add" => Operation::Add,
            "subtract" => Operation::Subtract,
            "multiply" => Operation::Multiply,
            "divide" => Operation::Divide,
            "mod" => Operation::Mod,
            "power" => Operation::Power,
            "sqrt" => Operation::Sqrt,
            "abs" => Operation::Abs,
            "factorial" => Operation::Factorial,
            "simplify" => Operation::Simplify,
            "expand" => Operation::Expand,
            "factor" => Operation::Factor,
            "solve" => Operation::Solve,
            "solve_system" => Operation::SolveSystem,
            "substitute" => Operation::Substitute,
            "derivative" => Operation::Derivative,
            "partial" => Operation::Partial,
            "integrate" => Operation::Integrate,
            "limit" => Operation::Limit,
            "series" => Operation::Series,
            "sum" => Operation::Sum,
            "trig_simplify" => Operation::TrigSimplify,
            "trig_expand" => Operation::TrigExpand,
            "to_radians" => Operation::ToRadians,
            "to_degrees" => Operation::ToDegrees,
            "matrix" => Operation::Matrix,
            "determinant" => Operation::Determinant,
            "inverse" => Operation::Inverse,
            "matrix_mult" => Operation::MatrixMult,
            "eigenvalues" => Operation::Eigenvalues,
            "eigenvectors" => Operation::Eigenvectors,
            "rref" => Operation::Rref,
            "gcd" => Operation::Gcd,
            "lcm" => Operation::Lcm,
            "prime_factors" => Operation::PrimeFactors,
            "is_prime" => Operation::IsPrime,
            "nth_prime" => Operation::NthPrime,
            "binomial" => Operation::Binomial,
            "mean" => Operation::Mean,
            "variance" => Operation::Variance,
            "std_dev" => Operation::StdDev,
            "evaluate" => Operation::Evaluate,
            "latex" => Operation::Latex,
            "compare" => Operation::Compare,
            _ => return Err(MathError::UnknownOperation(lowered)),
        };
        Ok(op)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Mod => "mod",
            Operation::Power => "power",
            Operation::Sqrt => "sqrt",
            Operation::Abs => "abs",
            Operation::Factorial => "factorial",
            Operation::Simplify => "simplify",
            Operation::Expand => "expand",
            Operation::Factor => "factor",
            Operation::Solve => "solve",
            Operation::SolveSystem => "solve_system",
            Operation::Substitute => "substitute",
            Operation::Derivative => "derivative",
            Operation::Partial => "partial",
            Operation::Integrate => "integrate",
            Operation::Limit => "limit",
            Operation::Series => "series",
            Operation::Sum => "sum",
            Operation::TrigSimplify => "trig_simplify",
            Operation::TrigExpand => "trig_expand",
            Operation::ToRadians => "to_radians",
            Operation::ToDegrees => "to_degrees",
            Operation::Matrix => "matrix",
            Operation::Determinant => "determinant",
            Operation::Inverse => "inverse",
            Operation::MatrixMult => "matrix_mult",
            Operation::Eigenvalues => "eigenvalues",
            Operation::Eigenvectors => "eigenvectors",
            Operation::Rref => "rref",
            Operation::Gcd => "gcd",
            Operation::Lcm => "lcm",
            Operation::PrimeFactors => "prime_factors",
            Operation::IsPrime => "is_prime",
            Operation::NthPrime => "nth_prime",
            Operation::Binomial => "binomial",
            Operation::Mean => "mean",
            Operation::Variance => "variance",
            Operation::StdDev => "std_dev",
            Operation::Evaluate => "evaluate",
            Operation::Latex => "latex",
            Operation::Compare => "compare",
        }
    }
}

pub(crate) fn to_doc<T: Serialize>(envelope: &T) -> MathResult<String> {
    serde_json::to_string_pretty(envelope).map_err(|e| MathError::Engine(e.to_string()))
}

/// Run one operation against a caller-provided engine.
///
/// `Ok` carries the pretty-printed JSON document (which may itself be an
/// in-band error envelope); `Err` carries a structural error the process
/// must report out-of-band.
pub fn run_with(
    engine: &dyn SymbolicEngine,
    operation: Operation,
    raw_args: &[String],
) -> MathResult<String> {
    let binding = ArgumentBinding::from_raw(raw_args);
    match handlers::dispatch(engine, operation, &binding) {
        Ok(document) => Ok(document),
        Err(e) if e.is_structural() => Err(e),
        Err(e) => to_doc(&ErrorEnvelope::from_error(&e)),
    }
}

/// Run one operation against the native engine.
pub fn run(operation: Operation, raw_args: &[String]) -> MathResult<String> {
    run_with(&NativeEngine::new(), operation, raw_args)
}
