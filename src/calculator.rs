//! Arithmetic expression recognition and evaluation
//!
//! Supports decimal numbers, `+ - * / ^`, unary signs and parentheses.
//! `^` binds tighter than unary minus and is right-associative, so
//! `-2^2 == -4` and `2^3^2 == 512`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Only digits, decimal points, operators, parentheses and whitespace
static MATH_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9.\s+\-*/^()]+$").expect("Invalid regex"));

/// Parentheses, sign chains and exponent chains nested deeper than this are rejected
const MAX_NESTING: usize = 128;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("expression ends unexpectedly")]
    UnexpectedEnd,
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("division by zero")]
    DivisionByZero,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("result is not a finite number")]
    NonFinite,
    #[error("unexpected input after expression")]
    TrailingInput,
    #[error("expression is nested too deeply")]
    TooDeep,
}

/// Whether the raw query looks like an arithmetic expression.
///
/// Requires at least one digit and at least one operator so that a bare
/// number is not treated as a calculation.
pub fn looks_like_expression(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() || !MATH_CHARSET.is_match(trimmed) {
        return false;
    }
    let has_digit = trimmed.chars().any(|c| c.is_ascii_digit());
    let has_operator = trimmed.chars().any(|c| matches!(c, '+' | '-' | '*' | '/' | '^'));
    has_digit && has_operator
}

/// Evaluate an arithmetic expression
pub fn evaluate(input: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    match parser.peek() {
        None => {}
        Some(Token::RParen) => return Err(CalcError::UnbalancedParens),
        Some(_) => return Err(CalcError::TrailingInput),
    }
    if !value.is_finite() {
        return Err(CalcError::NonFinite);
    }
    Ok(value)
}

/// Render a result without a trailing `.0` for whole numbers
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Avoid "-0"
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let formatted = format!("{:.10}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        let token = match ch {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '0'..='9' | '.' => {
                let mut end = start;
                while let Some(&(idx, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        end = idx + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &input[start..end];
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| CalcError::InvalidNumber(literal.to_string()))?;
                tokens.push(Token::Number(value));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(CalcError::UnexpectedChar(other)),
        };
        tokens.push(token);
        chars.next();
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Run a recursive rule one level deeper, bounded by `MAX_NESTING`
    fn nested(&mut self, rule: fn(&mut Self) -> Result<f64, CalcError>) -> Result<f64, CalcError> {
        if self.depth >= MAX_NESTING {
            return Err(CalcError::TooDeep);
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus {
                value + rhs
            } else {
                value - rhs
            };
        }
        Ok(value)
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            if op == Token::Star {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    // unary := ('-' | '+') unary | power
    fn unary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.nested(Self::unary)?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            _ => self.power(),
        }
    }

    // power := primary ('^' unary)?
    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if self.peek() == Some(Token::Caret) {
            self.pos += 1;
            let exponent = self.nested(Self::unary)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // primary := number | '(' expression ')'
    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.nested(Self::expression)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    None => Err(CalcError::UnbalancedParens),
                    Some(_) => Err(CalcError::TrailingInput),
                }
            }
            Some(Token::RParen) => Err(CalcError::UnbalancedParens),
            Some(Token::Plus) => Err(CalcError::UnexpectedChar('+')),
            Some(Token::Minus) => Err(CalcError::UnexpectedChar('-')),
            Some(Token::Star) => Err(CalcError::UnexpectedChar('*')),
            Some(Token::Slash) => Err(CalcError::UnexpectedChar('/')),
            Some(Token::Caret) => Err(CalcError::UnexpectedChar('^')),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_nesting_is_rejected() {
        let parens = format!("{}1{}+1", "(".repeat(100_000), ")".repeat(100_000));
        assert!(looks_like_expression(&parens));
        assert_eq!(evaluate(&parens), Err(CalcError::TooDeep));

        let signs = format!("{}1+1", "-".repeat(100_000));
        assert_eq!(evaluate(&signs), Err(CalcError::TooDeep));

        let powers = format!("{}2", "2^".repeat(100_000));
        assert_eq!(evaluate(&powers), Err(CalcError::TooDeep));
    }

    #[test]
    fn test_moderate_nesting_still_evaluates() {
        let parens = format!("{}1{}+1", "(".repeat(50), ")".repeat(50));
        assert_eq!(evaluate(&parens), Ok(2.0));
        assert_eq!(evaluate("--1+1"), Ok(2.0));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("2+2*3"), Ok(8.0));
        assert_eq!(evaluate("(2+2)*3"), Ok(12.0));
        assert_eq!(evaluate("10-4-3"), Ok(3.0));
        assert_eq!(evaluate("100/10/5"), Ok(2.0));
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(evaluate("2^3^2"), Ok(512.0));
        assert_eq!(evaluate("2^-1"), Ok(0.5));
        assert_eq!(evaluate("-2^2"), Ok(-4.0));
        assert_eq!(evaluate("(-2)^2"), Ok(4.0));
    }

    #[test]
    fn test_decimals_and_whitespace() {
        assert_eq!(evaluate(" 1.5 * 4 "), Ok(6.0));
        assert_eq!(evaluate(".5+.25"), Ok(0.75));
    }

    #[test]
    fn test_unary_signs() {
        assert_eq!(evaluate("-3+5"), Ok(2.0));
        assert_eq!(evaluate("4*-2"), Ok(-8.0));
        assert_eq!(evaluate("--3"), Ok(3.0));
    }

    #[test]
    fn test_errors() {
        assert_eq!(evaluate("1/0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("2+"), Err(CalcError::UnexpectedEnd));
        assert_eq!(evaluate("(2+3"), Err(CalcError::UnbalancedParens));
        assert_eq!(evaluate("2+3)"), Err(CalcError::UnbalancedParens));
        assert_eq!(evaluate("2 3"), Err(CalcError::TrailingInput));
        assert_eq!(evaluate("1.2.3+1"), Err(CalcError::InvalidNumber("1.2.3".to_string())));
        assert_eq!(evaluate("2*x"), Err(CalcError::UnexpectedChar('x')));
        assert_eq!(evaluate("*2"), Err(CalcError::UnexpectedChar('*')));
        assert_eq!(evaluate("10^400"), Err(CalcError::NonFinite));
    }

    #[test]
    fn test_looks_like_expression() {
        assert!(looks_like_expression("2+2*3"));
        assert!(looks_like_expression("(1.5 + 2) ^ 2"));
        assert!(looks_like_expression("2+"));
        assert!(!looks_like_expression("42"));
        assert!(!looks_like_expression("chrome"));
        assert!(!looks_like_expression("2+x"));
        assert!(!looks_like_expression("+-"));
        assert!(!looks_like_expression(""));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(8.0), "8");
        assert_eq!(format_number(-4.0), "-4");
        assert_eq!(format_number(0.75), "0.75");
        assert_eq!(format_number(1.0 / 3.0), "0.3333333333");
        assert_eq!(format_number(-0.0), "0");
    }
}
