//! Parser for the transform language.
//!
//! Parses a token stream into [`TransformStatement`]s, one per line:
//!
//! ```text
//! [C3 | C3-C5] [1|1-2|1] parameter (= | += | -= | *= | /=) expression
//! ```
//!
//! Expressions use the usual precedence (`* / %` over `+ -`), unary minus
//! and parentheses. `sync` is only accepted as the trailing argument of a
//! periodic waveform call.

use super::ast::*;
use super::error::SyntaxError;
use super::note::{is_note_name, parse_note_name};
use super::token::{Token, TokenKind};
use crate::time::{BarBeat, BeatRange, Period};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> Result<Vec<TransformStatement>, SyntaxError> {
        let mut statements = Vec::new();

        loop {
            self.skip_newlines();
            if self.is_at_end() {
                break;
            }
            statements.push(self.parse_statement()?);
            self.expect_end_of_statement()?;
        }

        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<TransformStatement, SyntaxError> {
        let line = self.peek().line;
        let pitch = self.parse_pitch_selector()?;
        let time = self.parse_time_selector()?;
        let parameter = self.parse_parameter()?;
        let op = self.parse_assign_op()?;
        let expr = self.parse_expr()?;

        Ok(TransformStatement {
            pitch,
            time,
            parameter,
            op,
            expr,
            line,
        })
    }

    // --- Selectors ---

    fn parse_pitch_selector(&mut self) -> Result<Option<PitchRange>, SyntaxError> {
        let is_selector = matches!(
            &self.peek().kind,
            TokenKind::Ident(s) if Parameter::from_name(s).is_none() && is_note_name(s)
        );
        if !is_selector {
            return Ok(None);
        }

        let low = self.expect_pitch()?;
        let high = if self.check(TokenKind::Minus) {
            self.advance();
            self.expect_pitch()?
        } else {
            low
        };

        if low > high {
            let t = self.peek();
            return Err(SyntaxError::selector(
                format!("pitch range is inverted: {low} > {high}"),
                t.line,
                t.col,
            ));
        }

        Ok(Some(PitchRange { low, high }))
    }

    fn expect_pitch(&mut self) -> Result<u8, SyntaxError> {
        let t = self.peek().clone();
        match &t.kind {
            TokenKind::Ident(name) if is_note_name(name) => {
                self.advance();
                parse_note_name(name).ok_or_else(|| {
                    SyntaxError::selector(
                        format!("pitch {name} is outside the MIDI range 0-127"),
                        t.line,
                        t.col,
                    )
                })
            }
            other => Err(SyntaxError::selector(
                format!("expected a pitch name, got {}", other.describe()),
                t.line,
                t.col,
            )),
        }
    }

    fn parse_time_selector(&mut self) -> Result<Option<BeatRange>, SyntaxError> {
        let is_selector = matches!(self.peek().kind, TokenKind::Integer(_))
            && matches!(self.peek_at(1).kind, TokenKind::Pipe);
        if !is_selector {
            return Ok(None);
        }

        let start = self.parse_bar_beat()?;
        self.expect(TokenKind::Minus)?;
        let end = self.parse_bar_beat()?;

        if !start.is_before(end) {
            let t = self.peek();
            return Err(SyntaxError::selector(
                format!("time range {start}-{end} must end after it starts"),
                t.line,
                t.col,
            ));
        }

        Ok(Some(BeatRange { start, end }))
    }

    fn parse_bar_beat(&mut self) -> Result<BarBeat, SyntaxError> {
        let t = self.peek().clone();
        let bar = self.expect_integer()?;
        self.expect(TokenKind::Pipe)?;
        let beat = self.expect_number()?;
        u32::try_from(bar)
            .ok()
            .and_then(|bar| BarBeat::new(bar, beat))
            .ok_or_else(|| {
                SyntaxError::selector(
                    format!("invalid position {bar}|{beat}: bar and beat start at 1"),
                    t.line,
                    t.col,
                )
            })
    }

    // --- Statement head ---

    fn parse_parameter(&mut self) -> Result<Parameter, SyntaxError> {
        let t = self.peek().clone();
        match &t.kind {
            TokenKind::Ident(name) => {
                let parameter = Parameter::from_name(name).ok_or_else(|| {
                    SyntaxError::parse(format!("unknown parameter '{name}'"), t.line, t.col)
                })?;
                self.advance();
                Ok(parameter)
            }
            other => Err(SyntaxError::parse(
                format!("expected parameter name, got {}", other.describe()),
                t.line,
                t.col,
            )),
        }
    }

    fn parse_assign_op(&mut self) -> Result<AssignOp, SyntaxError> {
        let t = self.peek().clone();
        let op = match t.kind {
            TokenKind::Eq => AssignOp::Set,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Subtract,
            TokenKind::StarEq => AssignOp::Multiply,
            TokenKind::SlashEq => AssignOp::Divide,
            ref other => {
                return Err(SyntaxError::parse(
                    format!("expected assignment operator, got {}", other.describe()),
                    t.line,
                    t.col,
                ));
            }
        };
        self.advance();
        Ok(op)
    }

    // --- Expressions ---

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        if self.check(TokenKind::Minus) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Negate(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let t = self.peek().clone();
        match &t.kind {
            TokenKind::Number(v) => {
                self.advance();
                Ok(Expr::Number(*v))
            }
            TokenKind::Integer(v) => {
                self.advance();
                Ok(Expr::Number(*v as f64))
            }
            TokenKind::Period { bars, beats } => {
                self.advance();
                Ok(Expr::Period(Period {
                    bars: *bars,
                    beats: *beats,
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Group(Box::new(inner)))
            }
            TokenKind::Ident(name) => {
                if self.check_at(1, TokenKind::Dot) {
                    self.parse_variable()
                } else if self.check_at(1, TokenKind::LParen) {
                    self.parse_call()
                } else {
                    Err(SyntaxError::parse(
                        format!("unknown identifier '{name}'"),
                        t.line,
                        t.col,
                    ))
                }
            }
            TokenKind::Sync => Err(SyntaxError::sync(
                "'sync' is only allowed as the last argument of cos, tri, saw or square",
                t.line,
                t.col,
            )),
            other => Err(SyntaxError::parse(
                format!("expected expression, got {}", other.describe()),
                t.line,
                t.col,
            )),
        }
    }

    fn parse_variable(&mut self) -> Result<Expr, SyntaxError> {
        let t = self.peek().clone();
        let scope = self.expect_ident()?;
        self.expect(TokenKind::Dot)?;
        let name = self.expect_ident()?;
        Variable::from_path(&scope, &name)
            .map(Expr::Variable)
            .ok_or_else(|| {
                SyntaxError::parse(
                    format!("unknown variable '{scope}.{name}'"),
                    t.line,
                    t.col,
                )
            })
    }

    fn parse_call(&mut self) -> Result<Expr, SyntaxError> {
        let t = self.peek().clone();
        let name = self.expect_ident()?;
        let function = Function::from_name(&name).ok_or_else(|| {
            SyntaxError::parse(format!("unknown function '{name}'"), t.line, t.col)
        })?;
        self.expect(TokenKind::LParen)?;

        let mut args = Vec::new();
        let mut sync = false;

        if !self.check(TokenKind::RParen) {
            loop {
                if self.check(TokenKind::Sync) {
                    let s = self.peek().clone();
                    if !function.is_waveform() {
                        return Err(SyntaxError::sync(
                            format!("'sync' is not allowed in {name}()"),
                            s.line,
                            s.col,
                        ));
                    }
                    self.advance();
                    if !self.check(TokenKind::RParen) {
                        return Err(SyntaxError::sync(
                            format!("'sync' must be the last argument of {name}()"),
                            s.line,
                            s.col,
                        ));
                    }
                    sync = true;
                    break;
                }

                args.push(self.parse_expr()?);

                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let (min, max) = function.arity();
        let count = args.len();
        if count < min || max.is_some_and(|max| count > max) {
            let expected = match max {
                Some(max) if max == min => format!("{min}"),
                Some(max) => format!("{min} to {max}"),
                None => format!("at least {min}"),
            };
            return Err(SyntaxError::parse(
                format!("{name}() takes {expected} argument(s), got {count}"),
                t.line,
                t.col,
            ));
        }

        Ok(Expr::Call {
            function,
            args,
            sync,
        })
    }

    // --- Utility methods ---

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + offset).min(last)]
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.check_at(0, kind)
    }

    fn check_at(&self, offset: usize, kind: TokenKind) -> bool {
        std::mem::discriminant(&self.peek_at(offset).kind) == std::mem::discriminant(&kind)
    }

    fn skip_newlines(&mut self) {
        while !self.is_at_end() && self.peek().kind == TokenKind::Newline {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), SyntaxError> {
        if self.check(kind.clone()) {
            self.advance();
            Ok(())
        } else {
            let t = self.peek();
            Err(SyntaxError::parse(
                format!("expected {}, got {}", kind.describe(), t.kind.describe()),
                t.line,
                t.col,
            ))
        }
    }

    fn expect_end_of_statement(&mut self) -> Result<(), SyntaxError> {
        match self.peek().kind {
            TokenKind::Newline | TokenKind::Eof => Ok(()),
            ref other => {
                let t = self.peek();
                Err(SyntaxError::parse(
                    format!("unexpected {} after expression", other.describe()),
                    t.line,
                    t.col,
                ))
            }
        }
    }

    fn expect_ident(&mut self) -> Result<String, SyntaxError> {
        let t = self.peek();
        match &t.kind {
            TokenKind::Ident(s) => {
                let val = s.clone();
                self.advance();
                Ok(val)
            }
            other => Err(SyntaxError::parse(
                format!("expected identifier, got {}", other.describe()),
                t.line,
                t.col,
            )),
        }
    }

    fn expect_number(&mut self) -> Result<f64, SyntaxError> {
        let t = self.peek();
        match &t.kind {
            TokenKind::Number(v) => {
                let val = *v;
                self.advance();
                Ok(val)
            }
            TokenKind::Integer(v) => {
                let val = *v as f64;
                self.advance();
                Ok(val)
            }
            other => Err(SyntaxError::parse(
                format!("expected number, got {}", other.describe()),
                t.line,
                t.col,
            )),
        }
    }

    fn expect_integer(&mut self) -> Result<u64, SyntaxError> {
        let t = self.peek();
        match &t.kind {
            TokenKind::Integer(v) => {
                let val = *v;
                self.advance();
                Ok(val)
            }
            other => Err(SyntaxError::parse(
                format!("expected integer, got {}", other.describe()),
                t.line,
                t.col,
            )),
        }
    }
}
