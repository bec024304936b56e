//! Structural invariant checking.
//!
//! `validate` walks a finished tree and reports every violation of the
//! construction invariants: upward-contagious invalidity, conversion-kind
//! legality, delegate-creation target shape, and declaration-group nesting.
//! It exists for self-testing; production lowering never consults it.

use crate::ops::{ChildSlot, Operation, OperationData};
use std::fmt;

/// One detected invariant violation, with a `/`-separated kind path from
/// the root to the offending node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A node has an invalid descendant but is not itself marked invalid.
    ContagionBroken { path: String },
    /// A `Conversion` node records a nonexistent conversion without being
    /// marked invalid.
    NonexistentConversionOnValidNode { path: String },
    /// A `DelegateCreation` target is not one of the permitted kinds.
    BadDelegateTarget { path: String, found: &'static str },
    /// A declaration container holds a child of the wrong kind.
    BadDeclarationChild { path: String, found: &'static str },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::ContagionBroken { path } => {
                write!(f, "invalid descendant not propagated at {path}")
            }
            InvariantViolation::NonexistentConversionOnValidNode { path } => {
                write!(f, "nonexistent conversion on valid node at {path}")
            }
            InvariantViolation::BadDelegateTarget { path, found } => {
                write!(f, "delegate creation target is {found} at {path}")
            }
            InvariantViolation::BadDeclarationChild { path, found } => {
                write!(f, "declaration container holds {found} at {path}")
            }
        }
    }
}

/// Check the tree rooted at `op` and collect every violation.
#[must_use]
pub fn validate(op: &Operation) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    walk(op, op.kind_name().to_string(), &mut violations);
    violations
}

/// Returns whether the subtree contains any invalid node, for the
/// contagion check at each level.
fn walk(op: &Operation, path: String, out: &mut Vec<InvariantViolation>) -> bool {
    let mut any_child_invalid = false;
    for (label, slot) in op.data.labeled_slots() {
        match slot {
            ChildSlot::Node(child) => {
                any_child_invalid |= walk(child, child_path(&path, label, child), out);
            }
            ChildSlot::Absent => {}
            ChildSlot::List(children) => {
                for child in children {
                    any_child_invalid |= walk(child, child_path(&path, label, child), out);
                }
            }
        }
    }

    if any_child_invalid && !op.is_invalid {
        out.push(InvariantViolation::ContagionBroken { path: path.clone() });
    }

    match &op.data {
        OperationData::Conversion { conversion, .. } => {
            if !conversion.exists && !op.is_invalid {
                out.push(InvariantViolation::NonexistentConversionOnValidNode {
                    path: path.clone(),
                });
            }
        }
        OperationData::DelegateCreation { target } => {
            let allowed = matches!(
                target.data,
                OperationData::AnonymousFunction { .. }
                    | OperationData::MethodReference { .. }
                    | OperationData::DelegateCreation { .. }
                    | OperationData::None { .. }
                    | OperationData::Invalid { .. }
            );
            if !allowed {
                out.push(InvariantViolation::BadDelegateTarget {
                    path: path.clone(),
                    found: target.kind_name(),
                });
            }
        }
        OperationData::VariableDeclarationGroup { declarations } => {
            for declaration in declarations {
                if !matches!(declaration.data, OperationData::VariableDeclaration { .. }) {
                    out.push(InvariantViolation::BadDeclarationChild {
                        path: path.clone(),
                        found: declaration.kind_name(),
                    });
                }
            }
        }
        OperationData::VariableDeclaration {
            initializer: Some(init),
            ..
        } => {
            if !matches!(init.data, OperationData::VariableInitializer { .. }) {
                out.push(InvariantViolation::BadDeclarationChild {
                    path: path.clone(),
                    found: init.kind_name(),
                });
            }
        }
        _ => {}
    }

    any_child_invalid || op.is_invalid
}

fn child_path(parent: &str, label: &str, child: &Operation) -> String {
    format!("{parent}/{label}/{}", child.kind_name())
}
