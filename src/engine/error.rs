//! Invocation-level errors.

use thiserror::Error;

use crate::dsl::{EvalError, SyntaxError};

/// Everything that can abort a transform invocation.
///
/// None of these leave partial writes behind: the store is only touched
/// after every phase has succeeded.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("syntax error {0}")]
    Syntax(#[from] SyntaxError),

    #[error("line {line}: {source}")]
    Eval {
        line: usize,
        #[source]
        source: EvalError,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("slicing would create {requested} clips, above the limit of {limit}")]
    SliceLimit { requested: usize, limit: usize },

    #[error("selection holds {count} notes, above the limit of {limit}")]
    NoteLimit { count: usize, limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransformError {
    /// True for a variable read outside its clip kind or context.
    pub fn is_context_error(&self) -> bool {
        matches!(
            self,
            TransformError::Eval {
                source: EvalError::Context { .. },
                ..
            }
        )
    }

    /// True for a non-positive frequency or exponent.
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            TransformError::Eval {
                source: EvalError::Range { .. },
                ..
            }
        )
    }
}
