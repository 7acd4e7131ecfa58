//! Error types for the transform language.

use std::fmt;

/// A syntax error in transform source, with the position of the offending token.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    SelectorError,
    SyncError,
}

impl SyntaxError {
    pub fn lex(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::new(message, line, col, ErrorKind::LexError)
    }

    pub fn parse(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::new(message, line, col, ErrorKind::ParseError)
    }

    pub fn selector(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::new(message, line, col, ErrorKind::SelectorError)
    }

    pub fn sync(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::new(message, line, col, ErrorKind::SyncError)
    }

    fn new(message: impl Into<String>, line: usize, col: usize, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {:?}: {}",
            self.line, self.col, self.kind, self.message
        )
    }
}

impl std::error::Error for SyntaxError {}

/// An error raised while evaluating an expression against a note or clip.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A variable was referenced outside the clip kind or context it belongs to.
    Context { variable: &'static str, reason: String },
    /// A parameter that must be strictly positive was not.
    Range {
        function: &'static str,
        parameter: &'static str,
        value: f64,
    },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Context { variable, reason } => {
                write!(f, "{variable} is not available here: {reason}")
            }
            EvalError::Range {
                function,
                parameter,
                value,
            } => write!(f, "{function}() {parameter} must be > 0, got {value}"),
        }
    }
}

impl std::error::Error for EvalError {}
