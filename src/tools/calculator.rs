//! Restricted arithmetic evaluator
//!
//! Accepts numbers, parentheses and the four basic operators. Input is checked
//! against a character whitelist before anything is tokenized, so nothing
//! outside this grammar can ever run:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := factor (('*' | '/') factor)*
//! factor  := ('+' | '-') factor | primary
//! primary := number | '(' expr ')'
//! ```

use std::fmt;

use crate::error::{FlowError, Result};

/// Every character the calculator accepts
pub const ALLOWED_CHARS: &str = "0123456789+-*/(). ";

/// Maximum depth of parentheses and unary operators
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

/// Reject any character outside [`ALLOWED_CHARS`]
pub fn check_whitelist(expr: &str) -> Result<()> {
    for (position, character) in expr.chars().enumerate() {
        if !ALLOWED_CHARS.contains(character) {
            return Err(FlowError::UnsafeExpression { character, position });
        }
    }
    Ok(())
}

/// Check whether a character belongs to the calculator alphabet
pub fn is_allowed(c: char) -> bool {
    ALLOWED_CHARS.contains(c)
}

/// Evaluate an arithmetic expression
///
/// Pure: the same input always produces the same result.
pub fn evaluate(expr: &str) -> Result<f64> {
    check_whitelist(expr)?;

    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(FlowError::MalformedExpression("empty expression".to_string()));
    }

    let mut parser = Parser::new(&tokens);
    let value = parser.parse_expr()?;

    if let Some(token) = parser.peek() {
        return Err(FlowError::MalformedExpression(format!(
            "unexpected '{}' after end of expression",
            token
        )));
    }

    if !value.is_finite() {
        return Err(FlowError::MalformedExpression(
            "result is not a finite number".to_string(),
        ));
    }

    Ok(value)
}

/// Render a result for display: `63` rather than `63.0`, and never `-0`
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

fn tokenize(expr: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let token = match c {
            ' ' => {
                i += 1;
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| FlowError::MalformedExpression(format!("invalid number '{}'", text)))?;
                tokens.push(Token::Number(value));
                continue;
            }
            character => {
                return Err(FlowError::UnsafeExpression {
                    character,
                    position: i,
                });
            }
        };
        tokens.push(token);
        i += 1;
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_expr(&mut self) -> Result<f64> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.parse_term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.parse_term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn parse_term(&mut self) -> Result<f64> {
        let mut value = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.parse_factor()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.parse_factor()?;
                    if divisor == 0.0 {
                        return Err(FlowError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn parse_factor(&mut self) -> Result<f64> {
        match self.next() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Plus) => self.nested(|p| p.parse_factor()),
            Some(Token::Minus) => self.nested(|p| p.parse_factor()).map(|v| -v),
            Some(Token::LParen) => {
                let value = self.nested(|p| p.parse_expr())?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    Some(token) => Err(FlowError::MalformedExpression(format!(
                        "expected ')' but found '{}'",
                        token
                    ))),
                    None => Err(FlowError::MalformedExpression(
                        "missing closing parenthesis".to_string(),
                    )),
                }
            }
            Some(token) => Err(FlowError::MalformedExpression(format!(
                "unexpected '{}'",
                token
            ))),
            None => Err(FlowError::MalformedExpression(
                "unexpected end of expression".to_string(),
            )),
        }
    }

    fn nested<F>(&mut self, f: F) -> Result<f64>
    where
        F: FnOnce(&mut Self) -> Result<f64>,
    {
        if self.depth >= MAX_DEPTH {
            return Err(FlowError::MalformedExpression(format!(
                "nesting deeper than {} levels",
                MAX_DEPTH
            )));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("12 * 5 + 3").unwrap(), 63.0);
        assert_eq!(evaluate("3 + 12 * 5").unwrap(), 63.0);
        assert_eq!(evaluate("2 + 3 * 4 - 6 / 2").unwrap(), 11.0);
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(evaluate("100 / 10 / 5").unwrap(), 2.0);
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("((1 + 2) * (3 + 4))").unwrap(), 21.0);
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(evaluate("-5 + 2").unwrap(), -3.0);
        assert_eq!(evaluate("+5").unwrap(), 5.0);
        assert_eq!(evaluate("2 * -3").unwrap(), -6.0);
        assert_eq!(evaluate("--4").unwrap(), 4.0);
        assert_eq!(evaluate("-(2 + 3)").unwrap(), -5.0);
    }

    #[test]
    fn test_decimals() {
        assert_eq!(evaluate("1.5 * 2").unwrap(), 3.0);
        assert_eq!(evaluate(".5 + .25").unwrap(), 0.75);
        assert_eq!(evaluate("7 / 2").unwrap(), 3.5);
    }

    #[test]
    fn test_compact_whitespace() {
        assert_eq!(evaluate("12*7+5").unwrap(), 89.0);
        assert_eq!(evaluate("  12 *   7 + 5  ").unwrap(), 89.0);
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(evaluate("10 / 0"), Err(FlowError::DivisionByZero)));
        assert!(matches!(evaluate("1 / (2 - 2)"), Err(FlowError::DivisionByZero)));
        assert!(matches!(evaluate("5 / 0.0"), Err(FlowError::DivisionByZero)));
    }

    #[test]
    fn test_rejects_code_injection() {
        let err = evaluate("import os; os.system('rm -rf /')").unwrap_err();
        assert!(matches!(
            err,
            FlowError::UnsafeExpression {
                character: 'i',
                position: 0
            }
        ));
    }

    #[test]
    fn test_rejects_non_whitelisted_characters() {
        for expr in ["2 % 3", "1e5", "abs(-1)", "2\t+ 2", "__import__", "3 + x"] {
            assert!(
                matches!(evaluate(expr), Err(FlowError::UnsafeExpression { .. })),
                "expected unsafe for {:?}",
                expr
            );
        }
    }

    #[test]
    fn test_unsafe_position_counts_chars() {
        let err = check_whitelist("1 + é").unwrap_err();
        assert!(matches!(
            err,
            FlowError::UnsafeExpression {
                character: 'é',
                position: 4
            }
        ));
    }

    #[test]
    fn test_malformed_expressions() {
        for expr in ["", "   ", "1 +", "* 2", "(1 + 2", "1 + 2)", "()", "1 2", "1.2.3", ".", "3 (4)", "2 ** 3"] {
            assert!(
                matches!(evaluate(expr), Err(FlowError::MalformedExpression(_))),
                "expected malformed for {:?}",
                expr
            );
        }
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert!(matches!(evaluate(&deep), Err(FlowError::MalformedExpression(_))));

        let shallow = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(evaluate(&shallow).unwrap(), 1.0);
    }

    #[test]
    fn test_overflow_is_malformed() {
        let huge = "9".repeat(400);
        assert!(matches!(evaluate(&huge), Err(FlowError::MalformedExpression(_))));
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let first = evaluate("(17 + 4) / 3 * 2.5").unwrap();
        let second = evaluate("(17 + 4) / 3 * 2.5").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(63.0), "63");
        assert_eq!(format_number(3.5), "3.5");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_is_allowed() {
        assert!(is_allowed('7'));
        assert!(is_allowed('('));
        assert!(!is_allowed('x'));
        assert!(!is_allowed('\n'));
    }
}
