//! Token types for the transform language lexer.

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Sync,

    // Literals
    Ident(String),
    Number(f64),
    Integer(u64),
    /// `bar:beat` followed by `t`, or a bare `Nt`.
    Period { bars: u64, beats: f64 },

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,      // =
    PlusEq,  // +=
    MinusEq, // -=
    StarEq,  // *=
    SlashEq, // /=

    // Delimiters
    LParen,
    RParen,
    Comma,
    Dot,
    Pipe, // |

    // Special
    Newline,
    Eof,
}

impl TokenKind {
    /// Human-readable form for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Sync => "'sync'".to_string(),
            TokenKind::Ident(s) => format!("'{s}'"),
            TokenKind::Number(v) => format!("{v}"),
            TokenKind::Integer(v) => format!("{v}"),
            TokenKind::Period { bars, beats } => format!("{bars}:{beats}t"),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::Percent => "'%'".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::PlusEq => "'+='".to_string(),
            TokenKind::MinusEq => "'-='".to_string(),
            TokenKind::StarEq => "'*='".to_string(),
            TokenKind::SlashEq => "'/='".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Pipe => "'|'".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}
