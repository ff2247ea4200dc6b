// SPDX-License-Identifier: MIT

//! Safe evaluation of user-authored rule expressions
//!
//! This crate parses and evaluates a restricted expression language used for
//! visibility rules, validation guards and workflow-transition predicates:
//! - `status == 'active'`
//! - `priority > 3 && status != 'closed'`
//! - `user.role in ['admin', 'editor']`
//! - `amount > limit ? 'review' : 'auto'`
//!
//! Expressions run against a read-only [`ExpressionContext`] and can never
//! execute host code: no function calls, no mutation, a fixed
//! forbidden-property set, and hard ceilings on nesting depth and array
//! length. Every failure is a value ([`ExprError`]); nothing panics across
//! the public boundary.

pub mod ast;
pub mod context;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod fields;
pub mod parser;

pub use ast::Node;
pub use context::ExpressionContext;
pub use engine::{RuleEngine, ValidationResult};
pub use error::{EvalError, ExprError, ParseError};
pub use evaluator::{evaluate, is_truthy, Evaluator, DEFAULT_MAX_ARRAY_LEN, DEFAULT_MAX_DEPTH};
pub use fields::referenced_fields;
pub use parser::{parse, DefaultParser, ExpressionParser};
