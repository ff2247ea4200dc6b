//! Static field extraction
//!
//! Collects the root context fields an expression reads without evaluating
//! anything, so it is safe to run on untrusted trees with no context at all.
//! Authoring tools use the result for dependency graphs and change-detection
//! triggers.

use std::collections::BTreeSet;

use crate::ast::{Node, RESERVED_IDENTIFIERS};

/// Distinct root field names referenced by an expression, sorted
pub fn referenced_fields(node: &Node) -> Vec<String> {
    let mut fields = BTreeSet::new();
    collect(node, &mut fields);
    fields.into_iter().collect()
}

fn collect(node: &Node, fields: &mut BTreeSet<String>) {
    match node {
        Node::Literal { .. } => {}
        Node::Identifier { name } => {
            if !RESERVED_IDENTIFIERS.contains(&name.as_str()) {
                fields.insert(name.clone());
            }
        }
        Node::Member { object, .. } => collect_member_root(object, fields),
        Node::Binary { left, right, .. } => {
            collect(left, fields);
            collect(right, fields);
        }
        Node::Unary { argument, .. } => collect(argument, fields),
        Node::Array { elements } => {
            for element in elements {
                collect(element, fields);
            }
        }
        Node::Conditional {
            test,
            consequent,
            alternate,
        } => {
            collect(test, fields);
            collect(consequent, fields);
            collect(alternate, fields);
        }
        // Never evaluated, so their bodies contribute no dependencies
        Node::Call { .. } | Node::Compound { .. } => {}
    }
}

/// Walk down a member-access chain and record only the root; intermediate
/// property names are not context fields.
fn collect_member_root(object: &Node, fields: &mut BTreeSet<String>) {
    match object {
        Node::Member { object, .. } => collect_member_root(object, fields),
        other => collect(other, fields),
    }
}
