//! Transform language — source text → tokens → statements → evaluated numbers.

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod note;
pub mod parser;
pub mod token;
pub mod waveform;

pub use ast::*;
pub use error::{EvalError, SyntaxError};
pub use eval::{evaluate, AudioVars, ClipVars, Env, NoteVars};

use lexer::Lexer;
use parser::Parser;

/// Entry point for parsing transform source.
pub struct TransformParser;

impl TransformParser {
    /// Parse a transform block into its statements, in source order.
    pub fn parse(source: &str) -> Result<Vec<TransformStatement>, SyntaxError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(tokens);
        let statements = parser.parse()?;
        tracing::debug!(count = statements.len(), "parsed transform block");
        Ok(statements)
    }
}
