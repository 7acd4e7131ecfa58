//! Lexer for the transform language.
//!
//! Converts source text into a stream of [`Token`]s. Newlines are significant
//! (one statement per line) and are emitted as [`TokenKind::Newline`].

use super::error::SyntaxError;
use super::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            self.skip_comment();

            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line: self.line,
                    col: self.col,
                });
                break;
            }

            let ch = self.peek();

            if ch == '\n' {
                tokens.push(Token {
                    kind: TokenKind::Newline,
                    line: self.line,
                    col: self.col,
                });
                self.advance();
                self.line += 1;
                self.col = 1;
                continue;
            }

            let token = match ch {
                '(' => self.single_char(TokenKind::LParen),
                ')' => self.single_char(TokenKind::RParen),
                ',' => self.single_char(TokenKind::Comma),
                '|' => self.single_char(TokenKind::Pipe),
                '%' => self.single_char(TokenKind::Percent),
                '=' => self.single_char(TokenKind::Eq),
                '+' => self.operator(TokenKind::Plus, TokenKind::PlusEq),
                '-' => self.operator(TokenKind::Minus, TokenKind::MinusEq),
                '*' => self.operator(TokenKind::Star, TokenKind::StarEq),
                '/' => self.operator(TokenKind::Slash, TokenKind::SlashEq),
                '.' if self.peek_next().is_some_and(|c| c.is_ascii_digit()) => self.lex_number()?,
                '.' => self.single_char(TokenKind::Dot),
                '0'..='9' => self.lex_number()?,
                'a'..='z' | 'A'..='Z' | '_' => self.lex_ident_or_keyword(),
                _ => {
                    return Err(SyntaxError::lex(
                        format!("unexpected character: '{ch}'"),
                        self.line,
                        self.col,
                    ));
                }
            };

            tokens.push(token);
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch != '\n' {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            let ch = self.peek();
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        if !self.is_at_end() && self.peek() == '/' && self.peek_next() == Some('/') {
            while !self.is_at_end() && self.peek() != '\n' {
                self.advance();
            }
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        Token { kind, line, col }
    }

    /// Lex `op` or its compound-assignment form `op=`.
    fn operator(&mut self, plain: TokenKind, assign: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        if !self.is_at_end() && self.peek() == '=' {
            self.advance();
            Token {
                kind: assign,
                line,
                col,
            }
        } else {
            Token {
                kind: plain,
                line,
                col,
            }
        }
    }

    fn read_digits(&mut self, into: &mut String) {
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            into.push(self.advance());
        }
    }

    fn lex_number(&mut self) -> Result<Token, SyntaxError> {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        self.read_digits(&mut s);

        let is_float = !self.is_at_end()
            && self.peek() == '.'
            && self.peek_next().is_some_and(|c| c.is_ascii_digit());
        if is_float {
            s.push(self.advance()); // consume '.'
            self.read_digits(&mut s);
        }

        let value: f64 = s
            .parse()
            .map_err(|_| SyntaxError::lex(format!("invalid number: {s}"), line, col))?;

        // bar:beat period, e.g. 1:0t or 0:0.5t
        if !self.is_at_end() && self.peek() == ':' {
            if is_float {
                return Err(SyntaxError::lex(
                    format!("bar count must be a whole number, got {s}"),
                    line,
                    col,
                ));
            }
            let bars: u64 = s
                .parse()
                .map_err(|_| SyntaxError::lex(format!("invalid bar count: {s}"), line, col))?;
            self.advance(); // consume ':'
            if self.is_at_end() || !(self.peek().is_ascii_digit() || self.peek() == '.') {
                return Err(SyntaxError::lex("expected beats after ':'", line, col));
            }
            let mut beat_str = String::new();
            self.read_digits(&mut beat_str);
            if !self.is_at_end() && self.peek() == '.' {
                beat_str.push(self.advance());
                self.read_digits(&mut beat_str);
            }
            let beats: f64 = beat_str.parse().map_err(|_| {
                SyntaxError::lex(format!("invalid beat value: {beat_str}"), line, col)
            })?;
            if !self.consume_period_suffix() {
                return Err(SyntaxError::lex(
                    format!("period {s}:{beat_str} must end with 't'"),
                    line,
                    col,
                ));
            }
            return Ok(Token {
                kind: TokenKind::Period { bars, beats },
                line,
                col,
            });
        }

        if self.consume_period_suffix() {
            return Ok(Token {
                kind: TokenKind::Period { bars: 0, beats: value },
                line,
                col,
            });
        }

        if is_float {
            Ok(Token {
                kind: TokenKind::Number(value),
                line,
                col,
            })
        } else {
            match s.parse::<u64>() {
                Ok(n) => Ok(Token {
                    kind: TokenKind::Integer(n),
                    line,
                    col,
                }),
                Err(_) => Ok(Token {
                    kind: TokenKind::Number(value),
                    line,
                    col,
                }),
            }
        }
    }

    /// Consume a trailing `t` that is not the start of a longer word.
    fn consume_period_suffix(&mut self) -> bool {
        if self.is_at_end() || self.peek() != 't' {
            return false;
        }
        if self
            .peek_next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return false;
        }
        self.advance();
        true
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();

        while !self.is_at_end() {
            let c = self.peek();
            let negative_octave = c == '-'
                && is_pitch_letter_prefix(&s)
                && self.peek_next().is_some_and(|n| n.is_ascii_digit());
            if !(c.is_ascii_alphanumeric() || c == '_' || c == '#' || negative_octave) {
                break;
            }
            s.push(self.advance());
        }

        let kind = match s.as_str() {
            "sync" => TokenKind::Sync,
            _ => TokenKind::Ident(s),
        };

        Token { kind, line, col }
    }
}

/// A note letter with an optional accidental and no octave yet, so a `-`
/// directly after it is the sign of the octave (`C-1`, `F#-1`).
fn is_pitch_letter_prefix(s: &str) -> bool {
    matches!(s.as_bytes(), [b'A'..=b'G'] | [b'A'..=b'G', b'#' | b'b'])
}
