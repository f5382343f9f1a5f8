//! Sandboxed arithmetic formula parsing and evaluation.
//!
//! Formula components store an arithmetic expression such as
//! `(base_salary * 0.1) + (years_of_service * 100)`. This module parses that
//! text once, with a small recursive-descent parser, into an expression tree
//! that is later evaluated against an [`EvaluationContext`].
//!
//! The grammar is deliberately tiny:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | primary
//! primary := NUMBER | IDENT | '(' expr ')'
//! IDENT   := [A-Za-z_][A-Za-z0-9_.]*
//! ```
//!
//! There are no function calls and no side effects.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::models::EvaluationContext;

/// Maximum nesting depth of a formula.
///
/// Applies both to parentheses and to the parsed expression tree, where every
/// operator in a chain such as `a + b + c` adds a level.
pub const MAX_FORMULA_DEPTH: usize = 64;

/// Errors raised while parsing or evaluating a formula.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// The formula text was empty.
    #[error("formula is empty")]
    Empty,
    /// A character that is not part of the grammar.
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        ch: char,
        /// Byte offset in the formula.
        position: usize,
    },
    /// A numeric literal that could not be parsed.
    #[error("invalid number '{literal}' at position {position}")]
    InvalidNumber {
        /// The literal text.
        literal: String,
        /// Byte offset in the formula.
        position: usize,
    },
    /// A token in a position where the grammar does not allow it.
    #[error("unexpected '{found}' at position {position}")]
    UnexpectedToken {
        /// The token found.
        found: String,
        /// Byte offset in the formula.
        position: usize,
    },
    /// The formula ended in the middle of an expression.
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    /// Parentheses or operators nested beyond [`MAX_FORMULA_DEPTH`].
    #[error("formula nested deeper than {MAX_FORMULA_DEPTH} levels")]
    TooDeep,
    /// A variable that is not present in the context.
    #[error("unknown variable '{name}'")]
    UnknownVariable {
        /// The variable name.
        name: String,
    },
    /// A variable that is present but not numeric.
    #[error("variable '{name}' is not numeric (value: {value})")]
    NonNumericVariable {
        /// The variable name.
        name: String,
        /// The value found.
        value: String,
    },
    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// An intermediate result does not fit a decimal.
    #[error("arithmetic overflow")]
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    fn apply(self, left: Decimal, right: Decimal) -> Result<Decimal, FormulaError> {
        match self {
            BinaryOp::Add => left.checked_add(right).ok_or(FormulaError::Overflow),
            BinaryOp::Subtract => left.checked_sub(right).ok_or(FormulaError::Overflow),
            BinaryOp::Multiply => left.checked_mul(right).ok_or(FormulaError::Overflow),
            BinaryOp::Divide => {
                if right.is_zero() {
                    return Err(FormulaError::DivisionByZero);
                }
                left.checked_div(right).ok_or(FormulaError::Overflow)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Number(Decimal),
    Variable(String),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    fn evaluate(&self, context: &EvaluationContext) -> Result<Decimal, FormulaError> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Variable(name) => match context.get(name) {
                Some(value) => value.as_number().ok_or_else(|| FormulaError::NonNumericVariable {
                    name: name.clone(),
                    value: value.to_string(),
                }),
                None => Err(FormulaError::UnknownVariable { name: name.clone() }),
            },
            Expr::Negate(inner) => Ok(-inner.evaluate(context)?),
            Expr::Binary { op, left, right } => {
                let left = left.evaluate(context)?;
                let right = right.evaluate(context)?;
                op.apply(left, right)
            }
        }
    }

    fn collect_variables<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                out.insert(name.as_str());
            }
            Expr::Negate(inner) => inner.collect_variables(out),
            Expr::Binary { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(Decimal),
    Ident(String),
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
            Token::Number(value) => write!(f, "{value}"),
            Token::Ident(name) => write!(f, "{name}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(position, ch)) = chars.peek() {
        let token = match ch {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = position;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &source[position..end];
                let value =
                    Decimal::from_str(literal).map_err(|_| FormulaError::InvalidNumber {
                        literal: literal.to_string(),
                        position,
                    })?;
                tokens.push((Token::Number(value), position));
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = position;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Ident(source[position..end].to_string()), position));
                continue;
            }
            other => {
                return Err(FormulaError::UnexpectedCharacter {
                    ch: other,
                    position,
                });
            }
        };
        tokens.push((token, position));
        chars.next();
    }

    Ok(tokens)
}

/// A parsed sub-expression and the height of its tree.
type Node = (Expr, usize);

fn checked_height(height: usize) -> Result<usize, FormulaError> {
    if height > MAX_FORMULA_DEPTH {
        return Err(FormulaError::TooDeep);
    }
    Ok(height)
}

fn binary(op: BinaryOp, left: Node, right: Node) -> Result<Node, FormulaError> {
    let height = checked_height(left.1.max(right.1) + 1)?;
    let expr = Expr::Binary {
        op,
        left: Box::new(left.0),
        right: Box::new(right.0),
    };
    Ok((expr, height))
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(token, _)| token)
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let next = self.tokens.get(self.cursor).cloned();
        if next.is_some() {
            self.cursor += 1;
        }
        next
    }

    fn enter(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_FORMULA_DEPTH {
            return Err(FormulaError::TooDeep);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Node, FormulaError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.term()?;
            left = binary(op, left, right)?;
        }
    }

    fn term(&mut self) -> Result<Node, FormulaError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = binary(op, left, right)?;
        }
    }

    fn unary(&mut self) -> Result<Node, FormulaError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                self.enter()?;
                let (inner, height) = self.unary()?;
                self.depth -= 1;
                Ok((Expr::Negate(Box::new(inner)), checked_height(height + 1)?))
            }
            Some(Token::Plus) => {
                self.advance();
                self.enter()?;
                let inner = self.unary()?;
                self.depth -= 1;
                Ok(inner)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Node, FormulaError> {
        match self.advance() {
            Some((Token::Number(value), _)) => Ok((Expr::Number(value), 1)),
            Some((Token::Ident(name), _)) => Ok((Expr::Variable(name), 1)),
            Some((Token::LParen, _)) => {
                self.enter()?;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.advance() {
                    Some((Token::RParen, _)) => Ok(inner),
                    Some((token, position)) => Err(FormulaError::UnexpectedToken {
                        found: token.to_string(),
                        position,
                    }),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some((token, position)) => Err(FormulaError::UnexpectedToken {
                found: token.to_string(),
                position,
            }),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

/// A parsed arithmetic formula.
///
/// The source text is kept so the formula can be displayed, serialized and
/// reported in errors exactly as it was configured.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::Formula;
/// use payroll_engine::models::EvaluationContext;
/// use rust_decimal::Decimal;
///
/// let formula = Formula::parse("(base_salary * 0.1) + (years_of_service * 100)").unwrap();
/// let context = EvaluationContext::new()
///     .with_value("base_salary", Decimal::from(5000))
///     .with_value("years_of_service", Decimal::from(5));
///
/// assert_eq!(formula.evaluate(&context).unwrap(), Decimal::from(1000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parses formula text.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(FormulaError::Empty);
        }

        let mut parser = Parser {
            tokens,
            cursor: 0,
            depth: 0,
        };
        let (expr, _) = parser.expr()?;
        if let Some((token, position)) = parser.advance() {
            return Err(FormulaError::UnexpectedToken {
                found: token.to_string(),
                position,
            });
        }

        Ok(Self {
            source: source.trim().to_string(),
            expr,
        })
    }

    /// Returns the formula text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the distinct variable names referenced by the formula.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut variables = BTreeSet::new();
        self.expr.collect_variables(&mut variables);
        variables
    }

    /// Evaluates the formula against the context.
    ///
    /// The result is not rounded; callers apply currency rounding.
    pub fn evaluate(&self, context: &EvaluationContext) -> Result<Decimal, FormulaError> {
        self.expr.evaluate(context)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::parse(s)
    }
}

impl Serialize for Formula {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Formula {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Formula::parse(&source).map_err(serde::de::Error::custom)
    }
}
