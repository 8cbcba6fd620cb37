use std::iter::Peekable;
use std::str::Chars;

use crate::token::{Token, TokenKind};

/// Single-pass scanner over the raw source text.
///
/// Lexing is total: malformed input still produces a token stream, and the
/// damage surfaces later as a parse error. An unterminated string simply
/// consumes to end of input.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Produces the next token, or the terminal `EndOfInput` token once the
    /// source is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let line = self.line;
        let column = self.column;
        let Some(c) = self.advance() else {
            return Token::new(TokenKind::EndOfInput, "\0", line, column);
        };
        match c {
            '(' | ')' | '<' | '>' | '{' | '}' | ';' | ',' | '@' => {
                Token::new(TokenKind::Punctuation, c.to_string(), line, column)
            }
            '=' => {
                if self.peek() == Some('>') {
                    self.advance();
                    Token::new(TokenKind::Punctuation, "=>", line, column)
                } else {
                    Token::new(TokenKind::Punctuation, "=", line, column)
                }
            }
            // Compound arrows win over the single-char operator reading.
            '+' | '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    Token::new(TokenKind::Punctuation, "->", line, column)
                } else {
                    Token::new(TokenKind::Operator, c.to_string(), line, column)
                }
            }
            '*' | '/' | '%' => Token::new(TokenKind::Operator, c.to_string(), line, column),
            '"' => self.read_string(line, column),
            c if c.is_ascii_digit() => self.read_number(c, line, column),
            c => self.read_identifier(c, line, column),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let next = self.chars.next();
        if let Some(c) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if matches!(c, ' ' | '\t' | '\r' | '\n') {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Reads a string literal body. The quotes are dropped from the token
    /// text and there is no escape handling; a backslash is kept verbatim.
    fn read_string(&mut self, line: usize, column: usize) -> Token {
        let mut text = String::new();
        while let Some(c) = self.advance() {
            if c == '"' {
                break;
            }
            text.push(c);
        }
        Token::new(TokenKind::String, text, line, column)
    }

    /// Reads a digit run with at most one decimal point. A second dot ends
    /// the literal and starts whatever comes next.
    fn read_number(&mut self, first: char, line: usize, column: usize) -> Token {
        let mut text = String::from(first);
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Number, text, line, column)
    }

    /// Any character with no other reading starts an identifier run: the
    /// first character plus any following alphanumerics or underscores.
    fn read_identifier(&mut self, first: char, line: usize, column: usize) -> Token {
        let mut text = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = if text.contains('@') {
            TokenKind::BuiltinIdentifier
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, text, line, column)
    }
}

/// Tokenizes `source` in full, ending with exactly one `EndOfInput` token.
pub fn lex(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.kind == TokenKind::EndOfInput;
        tokens.push(token);
        if done {
            break;
        }
    }
    // Degenerate matches (an empty string literal) leave empty-text tokens.
    tokens.retain(|token| !token.text.is_empty());
    tokens
}
