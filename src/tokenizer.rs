//! Source text -> token stream.
//!
//! Tokenizes eagerly into a `Vec<Token>` and exposes a lazy cursor over it,
//! the same shape as the teacher compiler's `tokenize()` + index-cursor
//! design in its own parser: a single pass over `chars()` with explicit
//! line tracking, rather than a pull-based lexer.

use crate::error::{CompileError, ErrorKind};
use crate::token::{Keyword, Token, TokenKind, SYMBOLS};

#[derive(Debug)]
pub struct Tokenizer {
    tokens: Vec<Token>,
    pos: usize,
}

impl Tokenizer {
    /// Tokenize `source` in full. Fails fast on the first lexical error.
    pub fn new(source: &str) -> Result<Self, CompileError> {
        let tokens = tokenize(source)?;
        Ok(Tokenizer { tokens, pos: 0 })
    }

    /// The next token without consuming it. Always returns something - an
    /// EOF sentinel past the end of the stream.
    pub fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| self.tokens.last().unwrap())
    }

    /// The token after `peek()`, used for the 2-token lookahead that term
    /// parsing needs to disambiguate variable / array / call shapes.
    pub fn peek_second(&self) -> &Token {
        self.tokens
            .get(self.pos + 1)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    /// Consume and return the next token.
    pub fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Index of the next unconsumed token.
    pub fn position(&self) -> usize {
        self.pos
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0usize;
    let mut line = 1usize;

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            line += 1;
            i += 1;
            continue;
        }

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Line comment
        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }

        // Block comment (covers both /* and /** ... */, non-nesting)
        if c == '/' && chars.get(i + 1) == Some(&'*') {
            let start_line = line;
            i += 2;
            let mut closed = false;
            while i < chars.len() {
                if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                    i += 2;
                    closed = true;
                    break;
                }
                if chars[i] == '\n' {
                    line += 1;
                }
                i += 1;
            }
            if !closed {
                return Err(CompileError::new(
                    "",
                    start_line,
                    ErrorKind::Lexical,
                    "unterminated block comment",
                ));
            }
            continue;
        }

        // String constant
        if c == '"' {
            let start_line = line;
            i += 1;
            let mut s = String::new();
            let mut closed = false;
            while i < chars.len() {
                let ch = chars[i];
                if ch == '"' {
                    i += 1;
                    closed = true;
                    break;
                }
                if ch == '\n' {
                    return Err(CompileError::new(
                        "",
                        start_line,
                        ErrorKind::Lexical,
                        "newline inside string constant",
                    ));
                }
                s.push(ch);
                i += 1;
            }
            if !closed {
                return Err(CompileError::new(
                    "",
                    start_line,
                    ErrorKind::Lexical,
                    "unterminated string constant",
                ));
            }
            tokens.push(Token::new(TokenKind::StringConstant(s), start_line));
            continue;
        }

        // Integer constant
        if c.is_ascii_digit() {
            let start_line = line;
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let digits: String = chars[start..i].iter().collect();
            let value: u32 = digits.parse().map_err(|_| {
                CompileError::new(
                    "",
                    start_line,
                    ErrorKind::Lexical,
                    format!("integer constant '{}' is not a valid number", digits),
                )
            })?;
            if value > 32767 {
                return Err(CompileError::new(
                    "",
                    start_line,
                    ErrorKind::Lexical,
                    format!("integer constant {} exceeds maximum of 32767", value),
                ));
            }
            tokens.push(Token::new(TokenKind::IntegerConstant(value as u16), start_line));
            continue;
        }

        // Identifier or keyword
        if c.is_alphabetic() || c == '_' {
            let start_line = line;
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let kind = match Keyword::lookup(&word) {
                Some(kw) => TokenKind::Keyword(kw),
                None => TokenKind::Identifier(word),
            };
            tokens.push(Token::new(kind, start_line));
            continue;
        }

        // Symbol
        if SYMBOLS.contains(&c) {
            tokens.push(Token::new(TokenKind::Symbol(c), line));
            i += 1;
            continue;
        }

        return Err(CompileError::new(
            "",
            line,
            ErrorKind::Lexical,
            format!("unexpected character '{}'", c),
        ));
    }

    let eof_line = line;
    tokens.push(Token::new(TokenKind::Eof, eof_line));
    Ok(tokens)
}
