// SPDX-License-Identifier: MIT

//! Read-only evaluation context

use serde_json::Value;
use std::collections::HashMap;

/// Immutable name→value mapping an expression is evaluated against
///
/// A context is supplied fresh per evaluation call and never mutated by the
/// evaluator. Values are plain JSON trees, so cyclic data is unrepresentable
/// by construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionContext {
    fields: HashMap<String, Value>,
}

impl ExpressionContext {
    /// Context with no fields
    pub fn empty() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }

    /// Build a context from the fields of a JSON object
    ///
    /// Non-object values produce an empty context.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                fields: map.into_iter().collect(),
            },
            _ => Self::empty(),
        }
    }

    /// Look up a root field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Names of all fields in the context
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// Convert the context back to a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl From<HashMap<String, Value>> for ExpressionContext {
    fn from(fields: HashMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, Value)> for ExpressionContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
