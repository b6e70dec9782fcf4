//! Strategy DSL parser.
//!
//! A tokenizer plus a hand-written recursive-descent parser for the grammar:
//!
//! ```text
//! start         := section*
//! section       := ("ENTRY"|"EXIT") ":" expr?
//! expr          := or_expr
//! or_expr       := and_expr ("OR" and_expr)*
//! and_expr      := atom ("AND" atom)*
//! atom          := "(" expr ")" | comparison | cross_expr
//! comparison    := value comp_op value
//! comp_op       := ">"|"<"|">="|"<="|"=="
//! cross_expr    := "CROSS" "(" value "," value ")"
//! value         := indicator | shift_ref | identifier | number
//! indicator     := identifier "(" (value ("," value)*)? ")"
//! shift_ref     := identifier "." "shift" "(" integer ")"
//! ```
//!
//! Section keywords are case-insensitive; AND/OR/CROSS and `.shift` are not.
//! Parsing is a pure function text -> [`Strategy`]; errors carry the
//! character offset of the offending token.

use crate::domain::ast::{CmpOp, Expr, Strategy, Value};
use crate::domain::bar::Column;
use crate::domain::error::{SemanticError, StratlangError, SyntaxError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    LParen,
    RParen,
    Comma,
    Dot,
    Colon,
    Gt,
    Lt,
    Ge,
    Le,
    EqEq,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

fn syntax_error(message: impl Into<String>, position: usize) -> StratlangError {
    SyntaxError {
        message: message.into(),
        position,
    }
    .into()
}

fn tokenize(input: &str) -> Result<Vec<Token>, StratlangError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let simple = match ch {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            ',' => Some(TokenKind::Comma),
            '.' => Some(TokenKind::Dot),
            ':' => Some(TokenKind::Colon),
            _ => None,
        };
        if let Some(kind) = simple {
            chars.next();
            tokens.push(Token {
                kind,
                text: ch.to_string(),
                position: pos,
            });
            continue;
        }

        if matches!(ch, '>' | '<' | '=') {
            chars.next();
            let followed_by_eq = matches!(chars.peek(), Some(&(_, '=')));
            let (kind, text) = match ch {
                '>' if followed_by_eq => (TokenKind::Ge, ">="),
                '>' => (TokenKind::Gt, ">"),
                '<' if followed_by_eq => (TokenKind::Le, "<="),
                '<' => (TokenKind::Lt, "<"),
                _ if followed_by_eq => (TokenKind::EqEq, "=="),
                _ => {
                    return Err(syntax_error("unknown operator '=' (did you mean '==')", pos));
                }
            };
            if followed_by_eq {
                chars.next();
            }
            tokens.push(Token {
                kind,
                text: text.to_string(),
                position: pos,
            });
            continue;
        }

        if ch.is_ascii_digit() || ch == '-' {
            let mut text = String::new();
            if ch == '-' {
                chars.next();
                text.push('-');
                match chars.peek() {
                    Some(&(_, next)) if next.is_ascii_digit() => {}
                    _ => return Err(syntax_error("expected digits after '-'", pos)),
                }
            }
            let mut has_dot = false;
            while let Some(&(_, next)) = chars.peek() {
                if next.is_ascii_digit() {
                    text.push(next);
                    chars.next();
                } else if next == '.' && !has_dot {
                    // lookahead: "close.shift" style dots stay separate tokens
                    let mut ahead = chars.clone();
                    ahead.next();
                    match ahead.peek() {
                        Some(&(_, d)) if d.is_ascii_digit() => {
                            has_dot = true;
                            text.push('.');
                            chars.next();
                        }
                        _ => break,
                    }
                } else {
                    break;
                }
            }
            if text.parse::<f64>().is_err() {
                return Err(syntax_error(format!("malformed number '{text}'"), pos));
            }
            tokens.push(Token {
                kind: TokenKind::Number,
                text,
                position: pos,
            });
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let mut text = String::new();
            while let Some(&(_, next)) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    text.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Ident,
                text,
                position: pos,
            });
            continue;
        }

        return Err(syntax_error(format!("unexpected character '{ch}'"), pos));
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    input_len: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>, input_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            input_len,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_ahead(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current_position(&self) -> usize {
        self.peek().map(|t| t.position).unwrap_or(self.input_len)
    }

    fn found(&self) -> String {
        self.peek()
            .map(|t| format!("'{}'", t.text))
            .unwrap_or_else(|| "end of input".to_string())
    }

    fn error(&self, expected: &str) -> StratlangError {
        syntax_error(
            format!("expected {expected}, found {}", self.found()),
            self.current_position(),
        )
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, StratlangError> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.error(expected)),
        }
    }

    /// Consume an identifier token with this exact text.
    fn consume_keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Ident && token.text == keyword => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// A section header is an ENTRY/EXIT identifier (any case) followed by ':'.
    fn at_section_header(&self) -> bool {
        let is_section_keyword = self.peek().is_some_and(|t| {
            t.kind == TokenKind::Ident
                && (t.text.eq_ignore_ascii_case("entry") || t.text.eq_ignore_ascii_case("exit"))
        });
        is_section_keyword
            && self
                .peek_ahead(1)
                .is_some_and(|t| t.kind == TokenKind::Colon)
    }

    fn parse_strategy(&mut self) -> Result<Strategy, StratlangError> {
        let mut strategy = Strategy::default();
        let mut seen_entry = false;
        let mut seen_exit = false;

        while !self.at_end() {
            if !self.at_section_header() {
                return Err(self.error("section header 'ENTRY:' or 'EXIT:'"));
            }
            let keyword = self
                .advance()
                .map(|t| t.text.clone())
                .unwrap_or_default();
            self.expect(TokenKind::Colon, "':'")?;
            let is_entry = keyword.eq_ignore_ascii_case("entry");

            if is_entry && seen_entry {
                return Err(SemanticError::new("duplicate ENTRY section").into());
            }
            if !is_entry && seen_exit {
                return Err(SemanticError::new("duplicate EXIT section").into());
            }

            let expr = if self.at_end() || self.at_section_header() {
                None
            } else {
                Some(self.parse_expr()?)
            };

            if is_entry {
                seen_entry = true;
                strategy.entry = expr;
            } else {
                seen_exit = true;
                strategy.exit = expr;
            }
        }

        Ok(strategy)
    }

    fn parse_expr(&mut self) -> Result<Expr, StratlangError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, StratlangError> {
        let mut left = self.parse_and()?;
        while self.consume_keyword("OR") {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, StratlangError> {
        let mut left = self.parse_atom()?;
        while self.consume_keyword("AND") {
            let right = self.parse_atom()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_atom(&mut self) -> Result<Expr, StratlangError> {
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::LParen {
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                return Ok(inner);
            }
            if token.kind == TokenKind::Ident && token.text == "CROSS" {
                return self.parse_cross();
            }
        }

        let left = self.parse_value()?;
        let op = self.parse_cmp_op()?;
        let right = self.parse_value()?;
        Ok(Expr::Comparison { left, op, right })
    }

    fn parse_cross(&mut self) -> Result<Expr, StratlangError> {
        self.expect(TokenKind::Ident, "'CROSS'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let left = self.parse_value()?;
        self.expect(TokenKind::Comma, "','")?;
        let right = self.parse_value()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Expr::Cross { left, right })
    }

    fn parse_cmp_op(&mut self) -> Result<CmpOp, StratlangError> {
        let op = match self.peek().map(|t| t.kind) {
            Some(TokenKind::Gt) => CmpOp::Gt,
            Some(TokenKind::Lt) => CmpOp::Lt,
            Some(TokenKind::Ge) => CmpOp::Ge,
            Some(TokenKind::Le) => CmpOp::Le,
            Some(TokenKind::EqEq) => CmpOp::Eq,
            _ => return Err(self.error("comparison operator (>, <, >=, <=, ==)")),
        };
        self.pos += 1;
        Ok(op)
    }

    fn parse_value(&mut self) -> Result<Value, StratlangError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Number => {
                let token = token.clone();
                self.pos += 1;
                let value = token
                    .text
                    .parse::<f64>()
                    .map_err(|_| syntax_error("malformed number", token.position))?;
                Ok(Value::Number(value))
            }
            Some(token) if token.kind == TokenKind::Ident => {
                let name = token.text.clone();
                let name_pos = token.position;
                self.pos += 1;

                match self.peek().map(|t| t.kind) {
                    Some(TokenKind::LParen) => self.parse_indicator_args(name),
                    Some(TokenKind::Dot) => self.parse_shift(name, name_pos),
                    _ => match Column::from_name(&name) {
                        Some(column) => Ok(Value::Column(column)),
                        None => Err(syntax_error(
                            format!(
                                "unknown price column '{name}' \
                                 (expected open, high, low, close, volume)"
                            ),
                            name_pos,
                        )),
                    },
                }
            }
            _ => Err(self.error("value")),
        }
    }

    fn parse_indicator_args(&mut self, name: String) -> Result<Value, StratlangError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if self.peek().map(|t| t.kind) != Some(TokenKind::RParen) {
            args.push(self.parse_value()?);
            while self.peek().map(|t| t.kind) == Some(TokenKind::Comma) {
                self.pos += 1;
                args.push(self.parse_value()?);
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Value::Indicator { name, args })
    }

    fn parse_shift(&mut self, name: String, name_pos: usize) -> Result<Value, StratlangError> {
        self.expect(TokenKind::Dot, "'.'")?;
        let method = self.expect(TokenKind::Ident, "'shift'")?;
        if method.text != "shift" {
            return Err(syntax_error(
                format!("expected 'shift' after '.', found '{}'", method.text),
                method.position,
            ));
        }
        self.expect(TokenKind::LParen, "'('")?;
        let lag_token = self.expect(TokenKind::Number, "integer lag")?;
        let lag = lag_token.text.parse::<usize>().map_err(|_| {
            syntax_error(
                format!("shift lag must be a non-negative integer, got '{}'", lag_token.text),
                lag_token.position,
            )
        })?;
        self.expect(TokenKind::RParen, "')'")?;

        let column = Column::from_name(&name).ok_or_else(|| {
            syntax_error(
                format!(
                    "unknown price column '{name}' \
                     (expected open, high, low, close, volume)"
                ),
                name_pos,
            )
        })?;
        Ok(Value::Shift { column, lag })
    }
}

/// Parse strategy text into a [`Strategy`].
///
/// Pure function: no I/O, no side effects. Returns the first syntax or
/// semantic error encountered; no partial AST is ever produced.
pub fn parse(input: &str) -> Result<Strategy, StratlangError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens, input.len());
    parser.parse_strategy()
}
