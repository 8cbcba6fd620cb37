//! Infix arithmetic over the flat text stored in `BinaryExpr` nodes.
//!
//! The parser folds operator expressions into plain text and runs them
//! through [`transform`] once; the interpreter substitutes variable values
//! into that text and hands the result to [`calculate`].

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InfixError {
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
    #[error("Unexpected end of expression")]
    UnexpectedEnd,
    #[error("Unbalanced parentheses")]
    UnbalancedParentheses,
}

/// Normalizes an operator-expression text at parse time: whitespace is
/// stripped and anything outside the digit/operator/identifier character
/// set is rejected.
pub fn transform(raw: &str) -> Result<String, InfixError> {
    let mut normalized = String::with_capacity(raw.len());
    for (position, c) in raw.chars().enumerate() {
        if c.is_whitespace() {
            continue;
        }
        let allowed = c.is_alphanumeric()
            || matches!(c, '.' | '_' | '+' | '-' | '*' | '/' | '%' | '(' | ')');
        if !allowed {
            return Err(InfixError::UnexpectedCharacter { character: c, position });
        }
        normalized.push(c);
    }
    Ok(normalized)
}

/// Evaluates a fully numeric expression text. Division follows IEEE f64
/// semantics, so dividing by zero yields an infinity rather than an error.
pub fn calculate(text: &str) -> Result<f64, InfixError> {
    let mut cursor = Cursor::new(text);
    let value = parse_additive(&mut cursor)?;
    match cursor.peek() {
        None => Ok(value),
        Some(character) => Err(InfixError::UnexpectedCharacter {
            character,
            position: cursor.position,
        }),
    }
}

struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            position: 0,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let next = self.chars.next();
        if next.is_some() {
            self.position += 1;
        }
        next
    }
}

fn parse_additive(cursor: &mut Cursor) -> Result<f64, InfixError> {
    let mut value = parse_multiplicative(cursor)?;
    while let Some(c) = cursor.peek() {
        match c {
            '+' => {
                cursor.advance();
                value += parse_multiplicative(cursor)?;
            }
            '-' => {
                cursor.advance();
                value -= parse_multiplicative(cursor)?;
            }
            _ => break,
        }
    }
    Ok(value)
}

fn parse_multiplicative(cursor: &mut Cursor) -> Result<f64, InfixError> {
    let mut value = parse_unary(cursor)?;
    while let Some(c) = cursor.peek() {
        match c {
            '*' => {
                cursor.advance();
                value *= parse_unary(cursor)?;
            }
            '/' => {
                cursor.advance();
                value /= parse_unary(cursor)?;
            }
            '%' => {
                cursor.advance();
                value %= parse_unary(cursor)?;
            }
            _ => break,
        }
    }
    Ok(value)
}

fn parse_unary(cursor: &mut Cursor) -> Result<f64, InfixError> {
    match cursor.peek() {
        Some('+') => {
            cursor.advance();
            parse_unary(cursor)
        }
        Some('-') => {
            cursor.advance();
            Ok(-parse_unary(cursor)?)
        }
        _ => parse_primary(cursor),
    }
}

fn parse_primary(cursor: &mut Cursor) -> Result<f64, InfixError> {
    match cursor.peek() {
        Some('(') => {
            cursor.advance();
            let value = parse_additive(cursor)?;
            if cursor.peek() != Some(')') {
                return Err(InfixError::UnbalancedParentheses);
            }
            cursor.advance();
            Ok(value)
        }
        Some(c) if c.is_ascii_digit() => Ok(read_number(cursor)),
        Some(character) => Err(InfixError::UnexpectedCharacter {
            character,
            position: cursor.position,
        }),
        None => Err(InfixError::UnexpectedEnd),
    }
}

/// Reads a digit run with at most one decimal point. The run always starts
/// with a digit, so the conversion cannot fail.
fn read_number(cursor: &mut Cursor) -> f64 {
    let mut literal = String::new();
    let mut seen_dot = false;
    while let Some(c) = cursor.peek() {
        if c.is_ascii_digit() || (c == '.' && !seen_dot) {
            seen_dot = seen_dot || c == '.';
            literal.push(c);
            cursor.advance();
        } else {
            break;
        }
    }
    literal.parse().expect("digit run parses as f64")
}
