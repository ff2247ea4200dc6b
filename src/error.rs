// SPDX-License-Identifier: MIT

//! Typed error handling for rule expressions
//!
//! Parse-time and evaluation-time failures are separate enums, unified under
//! [`ExprError`] at the public boundary so callers never branch on where a
//! failure originated. Errors are values; nothing panics across the API.

use thiserror::Error;

/// Errors produced while parsing expression text
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Input ended in the middle of an expression
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A character that cannot start or continue any token
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    /// String literal with no closing quote
    #[error("unterminated string starting at position {0}")]
    UnterminatedString(usize),

    /// Numeric literal that does not parse
    #[error("invalid number at position {0}")]
    InvalidNumber(usize),

    /// A specific token was required, e.g. `:` after `?`
    #[error("expected '{expected}' at position {pos}")]
    Expected { expected: char, pos: usize },
}

/// Errors produced while evaluating an expression tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// `Call` nodes are a permanent rejection, not a feature gap
    #[error("function calls are not allowed")]
    FunctionCall,

    /// `Compound` nodes (comma sequences) are likewise always rejected
    #[error("multiple expressions are not allowed")]
    MultipleExpressions,

    /// Member access to a reserved structural property name
    #[error("access to forbidden property '{0}'")]
    ForbiddenProperty(String),

    /// Recursion ceiling reached
    #[error("expression too deeply nested (max depth {0})")]
    TooDeeplyNested(usize),

    /// Array literal or `in` operand over the sequence ceiling
    #[error("array too large (max {0} elements)")]
    ArrayTooLarge(usize),

    /// Right-hand side of `in` was not an array
    #[error("right-hand side of 'in' must be an array")]
    InRequiresArray,

    #[error("division by zero")]
    DivisionByZero,

    /// Operator string the evaluator does not recognize
    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),

    /// Operand of the wrong type for an otherwise valid operator
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

/// Top-level error type for the public evaluation API
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}
