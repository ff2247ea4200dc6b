// SPDX-License-Identifier: MIT

//! Abstract syntax tree for rule expressions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifiers that resolve as language constants, never as context lookups
pub const RESERVED_IDENTIFIERS: [&str; 4] = ["true", "false", "null", "undefined"];

/// One node of a parsed rule expression
///
/// The node set is closed: evaluation is an exhaustive match, so a new kind
/// that is not handled everywhere is a compile error. `Call` and `Compound`
/// are representable on purpose: parsers may produce them, and the
/// evaluator rejects them with explicit messages.
///
/// The serde form tags each node with a `type` field. That tagged JSON tree
/// is the interchange contract for external parsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    /// A constant embedded by the parser
    Literal { value: Value },
    /// A context field reference, or one of the reserved constants
    Identifier { name: String },
    /// `object.property` (static) or `object[property]` (computed)
    Member {
        object: Box<Node>,
        property: Box<Node>,
        computed: bool,
    },
    /// Binary operator, including the logical ones; carried as written
    Binary {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Prefix operator: `!`, `-`, `+`, `typeof`
    Unary {
        operator: String,
        argument: Box<Node>,
    },
    /// `[a, b, c]`
    Array { elements: Vec<Node> },
    /// `test ? consequent : alternate`
    Conditional {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    /// Call syntax parses, but evaluation always rejects it
    Call {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    /// Comma-separated sequence; parses, but evaluation always rejects it
    Compound { body: Vec<Node> },
}
