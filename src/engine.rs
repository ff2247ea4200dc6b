// SPDX-License-Identifier: MIT

//! Public evaluation API
//!
//! [`RuleEngine`] ties an injected parser to the evaluator and exposes the
//! three operations rule-driven callers use:
//! - [`RuleEngine::evaluate`] - full result
//! - [`RuleEngine::evaluate_as_bool`] - absorb any failure into a default
//! - [`RuleEngine::validate`] - parse and extract fields, no evaluation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ExpressionContext;
use crate::error::ExprError;
use crate::evaluator::{is_truthy, Evaluator};
use crate::fields::referenced_fields;
use crate::parser::{DefaultParser, ExpressionParser};

/// Outcome of authoring-time validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Parse error messages; empty when valid
    pub errors: Vec<String>,
    /// Distinct root context fields the expression reads
    pub referenced_fields: Vec<String>,
}

/// Expression engine with an injected parser and fixed evaluation limits
///
/// Construct one explicitly and pass it to call sites; there is no
/// process-wide default instance.
#[derive(Debug, Clone)]
pub struct RuleEngine<P = DefaultParser> {
    parser: P,
    evaluator: Evaluator,
}

impl RuleEngine<DefaultParser> {
    /// Engine with the default parser and default limits
    pub fn new() -> Self {
        Self {
            parser: DefaultParser,
            evaluator: Evaluator::new(),
        }
    }
}

impl Default for RuleEngine<DefaultParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ExpressionParser> RuleEngine<P> {
    /// Engine with a custom parser and default limits
    pub fn with_parser(parser: P) -> Self {
        Self {
            parser,
            evaluator: Evaluator::new(),
        }
    }

    /// Engine with a custom parser and an explicitly configured evaluator
    pub fn with_evaluator(parser: P, evaluator: Evaluator) -> Self {
        Self { parser, evaluator }
    }

    /// Parse and evaluate an expression against a context
    ///
    /// Empty or whitespace-only text is a vacuously satisfied condition and
    /// evaluates to `true`. Parse and evaluation failures surface through
    /// the single [`ExprError`] shape.
    pub fn evaluate(&self, text: &str, ctx: &ExpressionContext) -> Result<Value, ExprError> {
        if text.trim().is_empty() {
            return Ok(Value::Bool(true));
        }
        let node = self.parser.parse(text)?;
        Ok(self.evaluator.evaluate(&node, ctx)?)
    }

    /// Evaluate as a condition, absorbing every failure into `default`
    ///
    /// Safe to call from rendering or transition paths that must never fail
    /// visibly. Non-boolean results coerce by truthiness.
    pub fn evaluate_as_bool(&self, text: &str, ctx: &ExpressionContext, default: bool) -> bool {
        match self.evaluate(text, ctx) {
            Ok(value) => is_truthy(&value),
            Err(e) => {
                log::debug!("rule '{}' did not evaluate, using default {}: {}", text, default, e);
                default
            }
        }
    }

    /// Parse only: report syntax validity and the referenced fields
    pub fn validate(&self, text: &str) -> ValidationResult {
        if text.trim().is_empty() {
            return ValidationResult {
                is_valid: true,
                ..ValidationResult::default()
            };
        }
        match self.parser.parse(text) {
            Ok(node) => ValidationResult {
                is_valid: true,
                errors: Vec::new(),
                referenced_fields: referenced_fields(&node),
            },
            Err(e) => ValidationResult {
                is_valid: false,
                errors: vec![e.to_string()],
                referenced_fields: Vec::new(),
            },
        }
    }
}
