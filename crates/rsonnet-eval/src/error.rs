//! The runtime error type.
//!
//! One error kind carries a human message, whatever the failure category
//! (reference, type, user `error`, arithmetic, import, recursion). The
//! taxonomy lives in the message text, not the type, and propagation is
//! flat: any failure surfaces straight to the driver.

use thiserror::Error;

/// A runtime evaluation error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct EvalError {
    /// Human-readable description of the failure.
    pub message: String,
}

impl EvalError {
    /// Creates an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Shorthand constructor used throughout the evaluator.
macro_rules! eval_err {
    ($($arg:tt)*) => {
        return Err($crate::error::EvalError::new(format!($($arg)*)))
    };
}

pub(crate) use eval_err;
