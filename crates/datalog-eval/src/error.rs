//! Evaluation errors

use datalog_validate::ValidationError;
use std::fmt;

/// Errors surfaced by the engines. Validation errors are the only
/// user-recoverable kind; pool construction failure is the
/// resource-exhaustion case and halts the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The program or the query failed validation.
    Validation(ValidationError),
    /// The worker pool could not be built.
    ThreadPool(String),
    /// `query` called before a successful `init`.
    Uninitialized,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Validation(e) => write!(f, "validation error: {}", e),
            EvalError::ThreadPool(msg) => write!(f, "worker pool unavailable: {}", msg),
            EvalError::Uninitialized => write!(f, "engine not initialized"),
        }
    }
}

impl std::error::Error for EvalError {}

impl From<ValidationError> for EvalError {
    fn from(e: ValidationError) -> Self {
        EvalError::Validation(e)
    }
}
