use thiserror::Error;

/// Error types for the mathcalc engine.
///
/// Variants split into two tiers with different process-level consequences:
/// *structural* errors ([`MathError::UnknownOperation`], [`MathError::Argument`])
/// mean the invocation itself is malformed and must abort the process, while
/// *content* errors describe a problem with the mathematical input and are
/// reported in-band as a `{"success": false, "error": ...}` document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MathError {
    /// The expression text could not be parsed.
    #[error("Could not parse expression '{input}': {detail}")]
    Parse { input: String, detail: String },

    /// Arguments could not be bound to the operation's parameters.
    #[error("{0}")]
    Argument(String),

    /// The operation name matched nothing in the registry.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Division with a denominator that simplifies to literal zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// Matrix inversion was requested for a singular matrix.
    #[error("{0}")]
    SingularMatrix(String),

    /// The engine has no applicable method for this input.
    #[error("{0}")]
    Engine(String),
}

impl MathError {
    /// Parse failure for `input`, keeping the pinned message shape.
    pub fn parse(input: impl Into<String>, detail: impl Into<String>) -> Self {
        MathError::Parse {
            input: input.into(),
            detail: detail.into(),
        }
    }

    /// Structural errors abort the process; everything else is reported
    /// inside the JSON document with `success: false`.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            MathError::Argument(_) | MathError::UnknownOperation(_)
        )
    }
}

/// Result type for mathcalc operations.
pub type MathResult<T> = Result<T, MathError>;
