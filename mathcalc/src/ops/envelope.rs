//! Result envelopes.
//!
//! Every operation answers with one JSON document. The generic shape is
//! `{success, result, latex, numeric, type}`; matrix, solver, and
//! number-theory operations carry their own shapes. `numeric` is a float
//! exactly when the evaluated value is a finite real number; otherwise it is
//! a string rendering, and an evaluation that produces nothing usable
//! degrades to `null` rather than failing the envelope.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::ast::Expr;
use crate::error::MathError;
use crate::latex;
use crate::numeric::{self, NumericValue};

/// The float-or-string numeric field. `None` serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Numeric {
    Float(f64),
    Text(String),
}

impl From<NumericValue> for Option<Numeric> {
    fn from(value: NumericValue) -> Option<Numeric> {
        match value {
            NumericValue::Real(v) => Some(Numeric::Float(v)),
            NumericValue::Complex(c) => Some(Numeric::Text(numeric::complex_string(c))),
            NumericValue::Partial(s) => Some(Numeric::Text(s)),
            NumericValue::Undefined => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueEnvelope {
    pub success: bool,
    pub result: String,
    pub latex: String,
    pub numeric: Option<Numeric>,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// The generic formatter: string form, LaTeX, best-effort numeric, type tag.
pub fn format_value(e: &Expr) -> ValueEnvelope {
    ValueEnvelope {
        success: true,
        result: e.to_string(),
        latex: latex::latex(e),
        numeric: numeric::approx(e).into(),
        type_name: e.kind_name(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

impl ErrorEnvelope {
    pub fn from_error(err: &MathError) -> ErrorEnvelope {
        ErrorEnvelope {
            success: false,
            error: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SolveEnvelope {
    pub success: bool,
    pub solutions: Vec<String>,
    pub solutions_latex: Vec<String>,
    pub solutions_numeric: Vec<Numeric>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemEnvelope {
    pub success: bool,
    pub solutions: String,
    #[serde(rename = "type")]
    pub type_name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatrixEnvelope {
    pub success: bool,
    pub matrix: String,
    pub latex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RrefEnvelope {
    pub success: bool,
    pub rref: String,
    pub latex: String,
    pub pivot_columns: Vec<usize>,
}

/// A JSON object whose keys keep their insertion order (eigenvalue and
/// prime-factor maps are ordered by value, not lexically).
#[derive(Debug, Clone)]
pub struct OrderedCounts<V>(pub Vec<(String, V)>);

impl<V: Serialize> Serialize for OrderedCounts<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EigenvaluesEnvelope {
    pub success: bool,
    pub eigenvalues: OrderedCounts<usize>,
    pub latex: OrderedCounts<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EigenPair {
    pub eigenvalue: String,
    pub multiplicity: usize,
    pub eigenvectors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EigenvectorsEnvelope {
    pub success: bool,
    pub eigenvectors: Vec<EigenPair>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrimeFactorsEnvelope {
    pub success: bool,
    pub factors: OrderedCounts<u32>,
    pub factorization: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IsPrimeEnvelope {
    pub success: bool,
    pub is_prime: bool,
    pub number: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluateEnvelope {
    pub success: bool,
    pub result: String,
    pub numeric: Option<Numeric>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatexEnvelope {
    pub success: bool,
    pub latex: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareEnvelope {
    pub success: bool,
    pub equal: bool,
    pub difference: String,
}
