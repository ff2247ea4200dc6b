//! Expression tree evaluator
//!
//! Walks a parsed [`Node`] tree against a read-only [`ExpressionContext`]
//! and produces a value or a typed [`EvalError`]. The walk enforces the
//! closed operation set: no calls, no compound sequences, a fixed
//! forbidden-property set, a recursion ceiling and an array-length ceiling.
//! Depth and length bounds guarantee termination for any input, so there is
//! no timeout or cancellation mechanism.

use once_cell::sync::Lazy;
use serde_json::{Number, Value};
use std::collections::HashSet;

use crate::ast::Node;
use crate::context::ExpressionContext;
use crate::error::EvalError;

/// Default recursion ceiling
pub const DEFAULT_MAX_DEPTH: usize = 10;
/// Default array-length ceiling
pub const DEFAULT_MAX_ARRAY_LEN: usize = 1000;

/// Property names that can never be accessed, from any access path
static FORBIDDEN_PROPERTIES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["__proto__", "constructor", "prototype"].into_iter().collect());

/// Resolved property key of a member access
enum PropertyKey {
    Name(String),
    Index(Number),
}

/// Recursive interpreter with fixed limits
///
/// Holds no mutable state; a single instance is freely shared across
/// threads and calls.
#[derive(Debug, Clone)]
pub struct Evaluator {
    max_depth: usize,
    max_array_len: usize,
}

impl Evaluator {
    /// Evaluator with the default limits
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_array_len: DEFAULT_MAX_ARRAY_LEN,
        }
    }

    /// Evaluator with explicit depth and array-length ceilings
    pub fn with_limits(max_depth: usize, max_array_len: usize) -> Self {
        Self {
            max_depth,
            max_array_len,
        }
    }

    /// Evaluate an expression tree against a context
    pub fn evaluate(&self, node: &Node, ctx: &ExpressionContext) -> Result<Value, EvalError> {
        self.eval_node(node, ctx, 0)
    }

    fn eval_node(
        &self,
        node: &Node,
        ctx: &ExpressionContext,
        depth: usize,
    ) -> Result<Value, EvalError> {
        if depth > self.max_depth {
            return Err(EvalError::TooDeeplyNested(self.max_depth));
        }

        match node {
            Node::Literal { value } => Ok(value.clone()),
            Node::Identifier { name } => Ok(eval_identifier(name, ctx)),
            Node::Member {
                object,
                property,
                computed,
            } => self.eval_member(object, property, *computed, ctx, depth),
            Node::Binary {
                operator,
                left,
                right,
            } => self.eval_binary(operator, left, right, ctx, depth),
            Node::Unary { operator, argument } => {
                self.eval_unary(operator, argument, ctx, depth)
            }
            Node::Array { elements } => self.eval_array(elements, ctx, depth),
            Node::Conditional {
                test,
                consequent,
                alternate,
            } => {
                // Exactly one branch runs; the untaken branch may be invalid
                // for the current context.
                let test = self.eval_node(test, ctx, depth + 1)?;
                if is_truthy(&test) {
                    self.eval_node(consequent, ctx, depth + 1)
                } else {
                    self.eval_node(alternate, ctx, depth + 1)
                }
            }
            Node::Call { .. } => Err(EvalError::FunctionCall),
            Node::Compound { .. } => Err(EvalError::MultipleExpressions),
        }
    }

    fn eval_member(
        &self,
        object: &Node,
        property: &Node,
        computed: bool,
        ctx: &ExpressionContext,
        depth: usize,
    ) -> Result<Value, EvalError> {
        let target = self.eval_node(object, ctx, depth + 1)?;

        // Absent or scalar targets yield absent, never an error
        if !matches!(target, Value::Object(_) | Value::Array(_)) {
            return Ok(Value::Null);
        }

        let key = if computed {
            match self.eval_node(property, ctx, depth + 1)? {
                Value::String(name) => PropertyKey::Name(name),
                Value::Number(n) => PropertyKey::Index(n),
                other => {
                    return Err(EvalError::TypeMismatch(format!(
                        "property key must be a string or number, got {}",
                        type_name(&other)
                    )))
                }
            }
        } else {
            match property {
                Node::Identifier { name } => PropertyKey::Name(name.clone()),
                _ => {
                    return Err(EvalError::TypeMismatch(
                        "static property access requires an identifier".to_string(),
                    ))
                }
            }
        };

        // The denylist holds regardless of access path or target shape
        if let PropertyKey::Name(name) = &key {
            if FORBIDDEN_PROPERTIES.contains(name.as_str()) {
                return Err(EvalError::ForbiddenProperty(name.clone()));
            }
        }

        Ok(match (target, key) {
            (Value::Object(map), PropertyKey::Name(name)) => {
                map.get(&name).cloned().unwrap_or(Value::Null)
            }
            (Value::Object(map), PropertyKey::Index(n)) => match n.as_i64() {
                Some(i) => map.get(&i.to_string()).cloned().unwrap_or(Value::Null),
                None => Value::Null,
            },
            (Value::Array(items), PropertyKey::Index(n)) => match array_index(&n) {
                Some(i) => items.get(i).cloned().unwrap_or(Value::Null),
                None => Value::Null,
            },
            (Value::Array(_), PropertyKey::Name(_)) => Value::Null,
            _ => Value::Null,
        })
    }

    fn eval_binary(
        &self,
        operator: &str,
        left: &Node,
        right: &Node,
        ctx: &ExpressionContext,
        depth: usize,
    ) -> Result<Value, EvalError> {
        // Logical operators control their own operand evaluation
        match operator {
            "&&" => {
                let lhs = self.eval_node(left, ctx, depth + 1)?;
                if !is_truthy(&lhs) {
                    return Ok(Value::Bool(false));
                }
                let rhs = self.eval_node(right, ctx, depth + 1)?;
                return Ok(Value::Bool(is_truthy(&rhs)));
            }
            "||" => {
                let lhs = self.eval_node(left, ctx, depth + 1)?;
                if is_truthy(&lhs) {
                    return Ok(Value::Bool(true));
                }
                let rhs = self.eval_node(right, ctx, depth + 1)?;
                return Ok(Value::Bool(is_truthy(&rhs)));
            }
            "??" => {
                let lhs = self.eval_node(left, ctx, depth + 1)?;
                if !lhs.is_null() {
                    return Ok(lhs);
                }
                return self.eval_node(right, ctx, depth + 1);
            }
            _ => {}
        }

        let lhs = self.eval_node(left, ctx, depth + 1)?;
        let rhs = self.eval_node(right, ctx, depth + 1)?;

        match operator {
            "==" | "===" => Ok(Value::Bool(values_equal(&lhs, &rhs))),
            "!=" | "!==" => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
            "<" => Ok(Value::Bool(compare_ordered(&lhs, &rhs, |o| o.is_lt()))),
            "<=" => Ok(Value::Bool(compare_ordered(&lhs, &rhs, |o| o.is_le()))),
            ">" => Ok(Value::Bool(compare_ordered(&lhs, &rhs, |o| o.is_gt()))),
            ">=" => Ok(Value::Bool(compare_ordered(&lhs, &rhs, |o| o.is_ge()))),
            "+" => eval_add(&lhs, &rhs),
            "-" => {
                let a = numeric_operand("-", &lhs)?;
                let b = numeric_operand("-", &rhs)?;
                number_value(a - b)
            }
            "*" => {
                let a = numeric_operand("*", &lhs)?;
                let b = numeric_operand("*", &rhs)?;
                number_value(a * b)
            }
            "/" => {
                let a = numeric_operand("/", &lhs)?;
                let b = numeric_operand("/", &rhs)?;
                if b == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                number_value(a / b)
            }
            "%" => {
                let a = numeric_operand("%", &lhs)?;
                let b = numeric_operand("%", &rhs)?;
                if b == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                number_value(a % b)
            }
            "in" => {
                let items = match &rhs {
                    Value::Array(items) => items,
                    _ => return Err(EvalError::InRequiresArray),
                };
                if items.len() > self.max_array_len {
                    return Err(EvalError::ArrayTooLarge(self.max_array_len));
                }
                Ok(Value::Bool(items.iter().any(|item| values_equal(&lhs, item))))
            }
            other => Err(EvalError::UnsupportedOperator(other.to_string())),
        }
    }

    fn eval_unary(
        &self,
        operator: &str,
        argument: &Node,
        ctx: &ExpressionContext,
        depth: usize,
    ) -> Result<Value, EvalError> {
        let operand = self.eval_node(argument, ctx, depth + 1)?;
        match operator {
            "!" => Ok(Value::Bool(!is_truthy(&operand))),
            "-" => {
                let n = numeric_operand("-", &operand)?;
                number_value(-n)
            }
            "+" => {
                let n = numeric_operand("+", &operand)?;
                number_value(n)
            }
            "typeof" => Ok(Value::String(type_name(&operand).to_string())),
            other => Err(EvalError::UnsupportedOperator(other.to_string())),
        }
    }

    fn eval_array(
        &self,
        elements: &[Node],
        ctx: &ExpressionContext,
        depth: usize,
    ) -> Result<Value, EvalError> {
        // Size check runs before any element is evaluated
        if elements.len() > self.max_array_len {
            return Err(EvalError::ArrayTooLarge(self.max_array_len));
        }
        let mut items = Vec::with_capacity(elements.len());
        for element in elements {
            items.push(self.eval_node(element, ctx, depth + 1)?);
        }
        Ok(Value::Array(items))
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate an expression tree with the default limits
pub fn evaluate(node: &Node, ctx: &ExpressionContext) -> Result<Value, EvalError> {
    Evaluator::new().evaluate(node, ctx)
}

fn eval_identifier(name: &str, ctx: &ExpressionContext) -> Value {
    match name {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        // undefined and null both collapse to JSON null; a missing field is
        // absent, never an error
        "null" | "undefined" => Value::Null,
        _ => ctx.get(name).cloned().unwrap_or(Value::Null),
    }
}

fn eval_add(lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    // String concatenation wins when either side is a string
    if matches!(lhs, Value::String(_)) || matches!(rhs, Value::String(_)) {
        let mut out = to_display_string(lhs);
        out.push_str(&to_display_string(rhs));
        return Ok(Value::String(out));
    }
    let a = numeric_operand("+", lhs)?;
    let b = numeric_operand("+", rhs)?;
    number_value(a + b)
}

/// Value equality: numbers compare numerically regardless of integer or
/// float representation, everything else compares structurally.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
            _ => a == b,
        },
        _ => left == right,
    }
}

fn compare_ordered<F>(lhs: &Value, rhs: &Value, check: F) -> bool
where
    F: Fn(std::cmp::Ordering) -> bool,
{
    let ordering = match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    // Incomparable operand pairs order as false
    ordering.map(check).unwrap_or(false)
}

fn numeric_operand(operator: &str, value: &Value) -> Result<f64, EvalError> {
    value.as_f64().ok_or_else(|| {
        EvalError::TypeMismatch(format!(
            "operator '{}' requires numeric operands, got {}",
            operator,
            type_name(value)
        ))
    })
}

/// Build a JSON number, preferring the integer form. JSON has no NaN or
/// infinity, so arithmetic that would produce one fails explicitly.
fn number_value(n: f64) -> Result<Value, EvalError> {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        return Ok(Value::Number(Number::from(n as i64)));
    }
    Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| EvalError::TypeMismatch("arithmetic produced a non-finite number".to_string()))
}

fn array_index(n: &Number) -> Option<usize> {
    if let Some(i) = n.as_u64() {
        return Some(i as usize);
    }
    // Computed indexes may arrive as floats; only whole non-negative values
    // address an element
    match n.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 => Some(f as usize),
        _ => None,
    }
}

fn to_display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Language truthiness: null, `false`, zero and the empty string are falsy;
/// everything else, including empty arrays and objects, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Type name reported by `typeof`
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    fn ctx_with(value: Value) -> ExpressionContext {
        ExpressionContext::from_json(value)
    }

    fn eval(input: &str, ctx: &ExpressionContext) -> Result<Value, EvalError> {
        let expr = parse(input).unwrap();
        Evaluator::new().evaluate(&expr, ctx)
    }

    fn eval_ok(input: &str, ctx: &ExpressionContext) -> Value {
        eval(input, ctx).unwrap()
    }

    /// Unary chain `!...!x`, n operators deep
    fn nested_negation(n: usize) -> Node {
        let mut node = Node::Identifier {
            name: "flag".to_string(),
        };
        for _ in 0..n {
            node = Node::Unary {
                operator: "!".to_string(),
                argument: Box::new(node),
            };
        }
        node
    }

    #[test]
    fn test_literal_passthrough() {
        let ctx = ExpressionContext::empty();
        assert_eq!(eval_ok("5", &ctx), json!(5));
        assert_eq!(eval_ok("2.5", &ctx), json!(2.5));
        assert_eq!(eval_ok("'hello'", &ctx), json!("hello"));
        assert_eq!(eval_ok("true", &ctx), json!(true));
        assert_eq!(eval_ok("null", &ctx), json!(null));

        // An embedded literal comes back unchanged whatever the context
        let node = Node::Literal {
            value: json!({"a": [1, 2]}),
        };
        assert_eq!(evaluate(&node, &ctx).unwrap(), json!({"a": [1, 2]}));
        let ctx = ctx_with(json!({"a": "shadow"}));
        assert_eq!(evaluate(&node, &ctx).unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_reserved_identifiers_are_constants() {
        // Context entries never shadow the reserved words
        let ctx = ctx_with(json!({"true": 0, "null": "x", "undefined": 1}));
        assert_eq!(eval_ok("true", &ctx), json!(true));
        assert_eq!(eval_ok("false", &ctx), json!(false));
        assert_eq!(eval_ok("null", &ctx), json!(null));
        assert_eq!(eval_ok("undefined", &ctx), json!(null));
    }

    #[test]
    fn test_identifier_lookup() {
        let ctx = ctx_with(json!({"status": "active", "priority": 5}));
        assert_eq!(eval_ok("status", &ctx), json!("active"));
        assert_eq!(eval_ok("priority", &ctx), json!(5));
    }

    #[test]
    fn test_missing_identifier_is_absent() {
        let ctx = ExpressionContext::empty();
        assert_eq!(eval_ok("missing", &ctx), json!(null));
        assert_eq!(eval_ok("missing == null", &ctx), json!(true));
    }

    #[test]
    fn test_string_equality() {
        let ctx = ctx_with(json!({"status": "active"}));
        assert_eq!(eval_ok("status == 'active'", &ctx), json!(true));
        assert_eq!(eval_ok("status == 'closed'", &ctx), json!(false));
        assert_eq!(eval_ok("status != 'closed'", &ctx), json!(true));
    }

    #[test]
    fn test_numeric_equality_across_representations() {
        let ctx = ExpressionContext::empty();
        assert_eq!(eval_ok("1 == 1.0", &ctx), json!(true));
        assert_eq!(eval_ok("1 === 1", &ctx), json!(true));
        assert_eq!(eval_ok("1 !== 2", &ctx), json!(true));
    }

    #[test]
    fn test_array_equality_is_structural() {
        let ctx = ExpressionContext::empty();
        assert_eq!(eval_ok("[1, 2] == [1, 2]", &ctx), json!(true));
        assert_eq!(eval_ok("[1, 2] == [2, 1]", &ctx), json!(false));
    }

    #[test]
    fn test_ordering_comparisons() {
        let ctx = ctx_with(json!({"score": 7.5, "name": "beta"}));
        assert_eq!(eval_ok("score > 5", &ctx), json!(true));
        assert_eq!(eval_ok("score > 10", &ctx), json!(false));
        assert_eq!(eval_ok("score >= 7.5", &ctx), json!(true));
        assert_eq!(eval_ok("score < 10", &ctx), json!(true));
        assert_eq!(eval_ok("score <= 7", &ctx), json!(false));
        assert_eq!(eval_ok("name < 'gamma'", &ctx), json!(true));
        assert_eq!(eval_ok("name > 'gamma'", &ctx), json!(false));
    }

    #[test]
    fn test_ordering_incomparable_is_false() {
        let ctx = ctx_with(json!({"score": 5}));
        assert_eq!(eval_ok("score > 'high'", &ctx), json!(false));
        assert_eq!(eval_ok("missing > 3", &ctx), json!(false));
        assert_eq!(eval_ok("missing <= 3", &ctx), json!(false));
    }

    #[test]
    fn test_arithmetic() {
        let ctx = ExpressionContext::empty();
        assert_eq!(eval_ok("2 + 3", &ctx), json!(5));
        assert_eq!(eval_ok("2 - 5", &ctx), json!(-3));
        assert_eq!(eval_ok("4 * 2.5", &ctx), json!(10));
        assert_eq!(eval_ok("10 / 4", &ctx), json!(2.5));
        assert_eq!(eval_ok("10 % 3", &ctx), json!(1));
        assert_eq!(eval_ok("1 + 2 * 3", &ctx), json!(7));
    }

    #[test]
    fn test_string_concatenation() {
        let ctx = ctx_with(json!({"count": 3}));
        assert_eq!(eval_ok("'a' + 'b'", &ctx), json!("ab"));
        assert_eq!(eval_ok("'n=' + 1", &ctx), json!("n=1"));
        assert_eq!(eval_ok("count + ' items'", &ctx), json!("3 items"));
    }

    #[test]
    fn test_arithmetic_type_mismatch() {
        let ctx = ExpressionContext::empty();
        assert!(matches!(
            eval("2 * [1]", &ctx),
            Err(EvalError::TypeMismatch(_))
        ));
        assert!(matches!(eval("-'a'", &ctx), Err(EvalError::TypeMismatch(_))));
        assert!(matches!(
            eval("true + 1", &ctx),
            Err(EvalError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_division_by_zero() {
        let ctx = ExpressionContext::empty();
        assert_eq!(eval("10 / 0", &ctx), Err(EvalError::DivisionByZero));
        assert_eq!(eval("10 % 0", &ctx), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_short_circuit() {
        let ctx = ExpressionContext::empty();
        // The division is never evaluated
        assert_eq!(eval_ok("false && (10 / 0)", &ctx), json!(false));
        assert_eq!(eval_ok("true || (10 / 0)", &ctx), json!(true));
        // Without short-circuit the failure surfaces
        assert_eq!(eval("true && (10 / 0)", &ctx), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_logical_results_are_boolean() {
        let ctx = ExpressionContext::empty();
        assert_eq!(eval_ok("1 && 2", &ctx), json!(true));
        assert_eq!(eval_ok("'' || 0", &ctx), json!(false));
        assert_eq!(eval_ok("'x' || 0", &ctx), json!(true));
    }

    #[test]
    fn test_compound_condition() {
        let ctx = ctx_with(json!({"priority": 5, "status": "open"}));
        assert_eq!(
            eval_ok("priority > 3 && status != 'closed'", &ctx),
            json!(true)
        );
        assert_eq!(
            eval_ok("priority > 7 || status == 'open'", &ctx),
            json!(true)
        );
    }

    #[test]
    fn test_null_coalescing() {
        let ctx = ctx_with(json!({"zero": 0, "empty": "", "name": "ada"}));
        assert_eq!(eval_ok("missing ?? 'fallback'", &ctx), json!("fallback"));
        assert_eq!(eval_ok("name ?? 'fallback'", &ctx), json!("ada"));
        // Falsy but present values pass through; only null falls through
        assert_eq!(eval_ok("zero ?? 42", &ctx), json!(0));
        assert_eq!(eval_ok("empty ?? 'x'", &ctx), json!(""));
    }

    #[test]
    fn test_membership() {
        let ctx = ctx_with(json!({"role": "editor", "roles": ["admin", "editor"]}));
        assert_eq!(eval_ok("2 in [1, 2, 3]", &ctx), json!(true));
        assert_eq!(eval_ok("5 in [1, 2, 3]", &ctx), json!(false));
        assert_eq!(eval_ok("role in ['admin', 'editor']", &ctx), json!(true));
        assert_eq!(eval_ok("role in roles", &ctx), json!(true));
        assert_eq!(eval_ok("2.0 in [1, 2, 3]", &ctx), json!(true));
    }

    #[test]
    fn test_membership_requires_array() {
        let ctx = ctx_with(json!({"name": "ada"}));
        assert_eq!(eval("2 in 5", &ctx), Err(EvalError::InRequiresArray));
        assert_eq!(eval("'a' in name", &ctx), Err(EvalError::InRequiresArray));
        assert_eq!(eval("1 in missing", &ctx), Err(EvalError::InRequiresArray));
    }

    #[test]
    fn test_membership_array_too_large() {
        let evaluator = Evaluator::with_limits(DEFAULT_MAX_DEPTH, 3);
        let ctx = ctx_with(json!({"items": [1, 2, 3, 4]}));
        let expr = parse("1 in items").unwrap();
        assert_eq!(
            evaluator.evaluate(&expr, &ctx),
            Err(EvalError::ArrayTooLarge(3))
        );
    }

    #[test]
    fn test_array_literal() {
        let ctx = ctx_with(json!({"x": 2}));
        assert_eq!(eval_ok("[1, x, 'a']", &ctx), json!([1, 2, "a"]));
        assert_eq!(eval_ok("[]", &ctx), json!([]));
    }

    #[test]
    fn test_array_literal_size_checked_before_elements() {
        let evaluator = Evaluator::with_limits(DEFAULT_MAX_DEPTH, 2);
        let ctx = ExpressionContext::empty();
        // The failing division is never reached
        let expr = parse("[1, 2, 10 / 0]").unwrap();
        assert_eq!(
            evaluator.evaluate(&expr, &ctx),
            Err(EvalError::ArrayTooLarge(2))
        );
    }

    #[test]
    fn test_member_access() {
        let ctx = ctx_with(json!({
            "user": {"profile": {"name": "ada"}, "tags": ["a", "b"]},
        }));
        assert_eq!(eval_ok("user.profile.name", &ctx), json!("ada"));
        assert_eq!(eval_ok("user.tags[1]", &ctx), json!("b"));
        assert_eq!(eval_ok("user['profile']['name']", &ctx), json!("ada"));
        assert_eq!(eval_ok("user.tags[0 + 1]", &ctx), json!("b"));
    }

    #[test]
    fn test_member_access_absent_cases() {
        let ctx = ctx_with(json!({"user": {"name": "ada"}, "n": 5}));
        // Missing property, missing root, scalar target, bad index: all absent
        assert_eq!(eval_ok("user.missing", &ctx), json!(null));
        assert_eq!(eval_ok("missing.anything", &ctx), json!(null));
        assert_eq!(eval_ok("n.anything", &ctx), json!(null));
        assert_eq!(eval_ok("user.name.length", &ctx), json!(null));
        assert_eq!(eval_ok("user['nope']", &ctx), json!(null));
    }

    #[test]
    fn test_array_index_out_of_range() {
        let ctx = ctx_with(json!({"tags": ["a", "b"]}));
        assert_eq!(eval_ok("tags[5]", &ctx), json!(null));
        assert_eq!(eval_ok("tags[0 - 1]", &ctx), json!(null));
        assert_eq!(eval_ok("tags[1 / 2]", &ctx), json!(null));
    }

    #[test]
    fn test_forbidden_properties() {
        let ctx = ctx_with(json!({"a": {}, "items": []}));
        assert_eq!(
            eval("a.__proto__", &ctx),
            Err(EvalError::ForbiddenProperty("__proto__".to_string()))
        );
        assert_eq!(
            eval("a['constructor']", &ctx),
            Err(EvalError::ForbiddenProperty("constructor".to_string()))
        );
        assert_eq!(
            eval("a.prototype", &ctx),
            Err(EvalError::ForbiddenProperty("prototype".to_string()))
        );
        // Array targets are no escape hatch
        assert_eq!(
            eval("items['__proto__']", &ctx),
            Err(EvalError::ForbiddenProperty("__proto__".to_string()))
        );
        // Nor is a computed key assembled at evaluation time
        assert_eq!(
            eval("a['__pro' + 'to__']", &ctx),
            Err(EvalError::ForbiddenProperty("__proto__".to_string()))
        );
    }

    #[test]
    fn test_computed_key_must_be_string_or_number() {
        let ctx = ctx_with(json!({"a": {"b": 1}}));
        assert!(matches!(
            eval("a[true]", &ctx),
            Err(EvalError::TypeMismatch(_))
        ));
        assert!(matches!(
            eval("a[[1]]", &ctx),
            Err(EvalError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_conditional() {
        let ctx = ctx_with(json!({"amount": 150}));
        assert_eq!(
            eval_ok("amount > 100 ? 'review' : 'auto'", &ctx),
            json!("review")
        );
        assert_eq!(
            eval_ok("amount > 200 ? 'review' : 'auto'", &ctx),
            json!("auto")
        );
    }

    #[test]
    fn test_conditional_evaluates_one_branch() {
        let ctx = ExpressionContext::empty();
        // The untaken branch would fail; it must never run
        assert_eq!(eval_ok("true ? 1 : 10 / 0", &ctx), json!(1));
        assert_eq!(eval_ok("false ? 10 / 0 : 2", &ctx), json!(2));
    }

    #[test]
    fn test_call_rejected() {
        let ctx = ctx_with(json!({"a": {"b": 1}}));
        assert_eq!(eval("foo(1)", &ctx), Err(EvalError::FunctionCall));
        assert_eq!(eval("a.b()", &ctx), Err(EvalError::FunctionCall));
    }

    #[test]
    fn test_compound_rejected() {
        let ctx = ExpressionContext::empty();
        assert_eq!(eval("1, 2", &ctx), Err(EvalError::MultipleExpressions));
    }

    #[test]
    fn test_depth_limit() {
        let ctx = ctx_with(json!({"flag": true}));
        let evaluator = Evaluator::new();

        // Exactly at the ceiling succeeds
        let at_limit = nested_negation(DEFAULT_MAX_DEPTH);
        assert!(evaluator.evaluate(&at_limit, &ctx).is_ok());

        // One past it fails
        let too_deep = nested_negation(DEFAULT_MAX_DEPTH + 1);
        assert_eq!(
            evaluator.evaluate(&too_deep, &ctx),
            Err(EvalError::TooDeeplyNested(DEFAULT_MAX_DEPTH))
        );
    }

    #[test]
    fn test_depth_limit_through_parser() {
        let ctx = ctx_with(json!({"flag": true}));
        let ok = format!("{}flag", "!".repeat(DEFAULT_MAX_DEPTH));
        assert_eq!(eval_ok(&ok, &ctx), json!(true));

        let too_deep = format!("{}flag", "!".repeat(DEFAULT_MAX_DEPTH + 1));
        assert_eq!(
            eval(&too_deep, &ctx),
            Err(EvalError::TooDeeplyNested(DEFAULT_MAX_DEPTH))
        );
    }

    #[test]
    fn test_unary_operators() {
        let ctx = ctx_with(json!({"n": 4, "flag": false}));
        assert_eq!(eval_ok("!flag", &ctx), json!(true));
        assert_eq!(eval_ok("!!flag", &ctx), json!(false));
        assert_eq!(eval_ok("-n", &ctx), json!(-4));
        assert_eq!(eval_ok("+n", &ctx), json!(4));
    }

    #[test]
    fn test_typeof() {
        let ctx = ctx_with(json!({
            "s": "x", "n": 1, "b": true, "arr": [], "obj": {},
        }));
        assert_eq!(eval_ok("typeof s", &ctx), json!("string"));
        assert_eq!(eval_ok("typeof n", &ctx), json!("number"));
        assert_eq!(eval_ok("typeof b", &ctx), json!("boolean"));
        assert_eq!(eval_ok("typeof arr", &ctx), json!("array"));
        assert_eq!(eval_ok("typeof obj", &ctx), json!("object"));
        assert_eq!(eval_ok("typeof missing", &ctx), json!("null"));
    }

    #[test]
    fn test_unsupported_operators() {
        let ctx = ExpressionContext::empty();
        let binary = Node::Binary {
            operator: "**".to_string(),
            left: Box::new(Node::Literal { value: json!(2) }),
            right: Box::new(Node::Literal { value: json!(3) }),
        };
        assert_eq!(
            evaluate(&binary, &ctx),
            Err(EvalError::UnsupportedOperator("**".to_string()))
        );

        let unary = Node::Unary {
            operator: "~".to_string(),
            argument: Box::new(Node::Literal { value: json!(1) }),
        };
        assert_eq!(
            evaluate(&unary, &ctx),
            Err(EvalError::UnsupportedOperator("~".to_string()))
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!("no")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }
}
