//! # mathcalc
//!
//! **Symbolic and numeric math operations behind one string-in / JSON-out
//! contract**
//!
//! mathcalc parses free-form algebraic text (implicit multiplication
//! included), runs one of a closed set of operations against a symbolic
//! engine, and answers with a JSON envelope carrying the string form, LaTeX,
//! a best-effort numeric value, and a type tag.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mathcalc::{ops, MathResult, Operation};
//!
//! fn main() -> MathResult<()> {
//!     let op = Operation::resolve("derivative")?;
//!     let document = ops::run(op, &["x**3 + x".to_string(), "x".to_string()])?;
//!     println!("{}", document);
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Expressions
//! Immutable symbolic trees over exact rationals. `2.5` parses to `5/2`;
//! `sqrt(8)` simplifies to `2*sqrt(2)`; nothing silently rounds.
//!
//! ### Operations
//! A closed registry of 44 named operations (plus aliases) spanning
//! arithmetic, algebra, calculus, linear algebra, number theory, statistics,
//! and formatting utilities.
//!
//! ### Envelopes
//! Every operation serializes one JSON document. Content-level failures
//! (unparseable text, division by zero, a singular matrix) are data:
//! `{"success": false, "error": ...}`. Structural failures (unknown
//! operation, argument shape) are process errors.

pub mod ast;
pub mod calculus;
pub mod engine;
pub mod error;
pub mod latex;
pub mod matrix;
pub mod number_theory;
pub mod numeric;
pub mod ops;
pub mod parser;
pub mod simplify;
pub mod solve;

pub use ast::{Constant, Expr, Func};
pub use calculus::Direction;
pub use engine::{NativeEngine, SymbolicEngine};
pub use error::{MathError, MathResult};
pub use matrix::Matrix;
pub use numeric::NumericValue;
pub use ops::{ArgumentBinding, Operation};
pub use parser::parse;
pub use solve::SystemSolution;

#[cfg(test)]
mod tests;
