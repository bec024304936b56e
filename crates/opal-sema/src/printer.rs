//! Canonical tree printing.
//!
//! `describe` renders an operation tree as a deterministic, line-oriented,
//! indentation-scoped text form: one header line per node carrying the kind
//! and its attributes, followed by labeled child sections. Absent optional
//! children print as the literal token `null`; an empty child list prints
//! as `Label(0)` with no following lines. The output is a pure function of
//! the tree and the facts provider, so identical input always yields
//! byte-identical text.

use crate::ops::{BranchKind, ChildSlot, Operation, OperationData, OperatorInfo};
use opal_facts::SemanticFacts;
use opal_syntax::ArgMode;
use std::fmt::Write;

const INDENT: &str = "  ";

/// Render the canonical textual form of an operation tree.
#[must_use]
pub fn describe(op: &Operation, facts: &dyn SemanticFacts) -> String {
    describe_with_source(op, facts, None)
}

/// Render the canonical textual form, quoting source excerpts for each
/// node whose span is non-empty.
#[must_use]
pub fn describe_with_source(
    op: &Operation,
    facts: &dyn SemanticFacts,
    source: Option<&str>,
) -> String {
    let mut out = String::new();
    render(&mut out, op, facts, source, 0, None);
    out
}

fn render(
    out: &mut String,
    op: &Operation,
    facts: &dyn SemanticFacts,
    source: Option<&str>,
    depth: usize,
    parent: Option<&'static str>,
) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(op.kind_name());
    out.push_str(" (");
    out.push_str(&attributes(op, facts));
    out.push(')');

    write!(out, " (Syntax: {}", op.syntax_kind).ok();
    if let Some(text) = source {
        if !op.span.is_empty() {
            write!(out, ", '{}'", op.span.excerpt(text)).ok();
        }
    }
    out.push(')');

    if let Some(parent_kind) = parent {
        write!(out, " (Parent: {parent_kind})").ok();
    }
    out.push('\n');

    let kind = op.kind_name();
    for (label, slot) in op.data.labeled_slots() {
        match slot {
            ChildSlot::Node(child) => {
                label_line(out, depth + 1, label, None);
                render(out, child, facts, source, depth + 2, Some(kind));
            }
            ChildSlot::Absent => {
                label_line(out, depth + 1, label, None);
                for _ in 0..=depth + 1 {
                    out.push_str(INDENT);
                }
                out.push_str("null\n");
            }
            ChildSlot::List(children) => {
                label_line(out, depth + 1, label, Some(children.len()));
                for child in children {
                    render(out, child, facts, source, depth + 2, Some(kind));
                }
            }
        }
    }
}

fn label_line(out: &mut String, depth: usize, label: &str, count: Option<usize>) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    match count {
        // Empty lists close the section on the label line itself.
        Some(0) => {
            out.push_str(label);
            out.push_str("(0)\n");
        }
        Some(n) => {
            writeln!(out, "{label}({n}):").ok();
        }
        None => {
            out.push_str(label);
            out.push_str(":\n");
        }
    }
}

/// The comma-joined attribute list inside the header parentheses.
///
/// Order is fixed: kind-specific detail, then `Type:`, `Constant:`, and
/// the boolean markers.
fn attributes(op: &Operation, facts: &dyn SemanticFacts) -> String {
    let table = facts.type_table();
    let mut parts: Vec<String> = Vec::new();

    let mut info: Option<OperatorInfo> = None;
    match &op.data {
        OperationData::LocalReference { name } => parts.push(format!("Local: {name}")),
        OperationData::ParameterReference { name } => parts.push(format!("Parameter: {name}")),
        OperationData::Branch { kind } => parts.push(format!(
            "Kind: {}",
            match kind {
                BranchKind::Break => "Break",
                BranchKind::Continue => "Continue",
            }
        )),
        OperationData::DeclarationPattern { name } => {
            if let Some(name) = name {
                parts.push(format!("Declared: {name}"));
            }
        }
        OperationData::FieldReference { field, .. } => {
            parts.push(format!("Field: {}", facts.symbol(*field).display(table)));
        }
        OperationData::EventReference { event, .. } => {
            parts.push(format!("Event: {}", facts.symbol(*event).display(table)));
        }
        OperationData::MethodReference { method, .. }
        | OperationData::Invocation { method, .. } => {
            parts.push(format!("Method: {}", facts.symbol(*method).display(table)));
        }
        OperationData::DynamicMemberReference { member, .. } => {
            parts.push(format!("Member: {member}"));
        }
        OperationData::UnaryOperator { op, info: i, .. } => {
            parts.push(format!("Operator: {op:?}"));
            info = Some(*i);
        }
        OperationData::BinaryOperator { op, info: i, .. }
        | OperationData::CompoundAssignment { op, info: i, .. } => {
            parts.push(format!("Operator: {op:?}"));
            info = Some(*i);
        }
        OperationData::IncrementOrDecrement {
            is_increment,
            is_postfix,
            ..
        } => {
            let kind = match (is_increment, is_postfix) {
                (true, false) => "PreIncrement",
                (true, true) => "PostIncrement",
                (false, false) => "PreDecrement",
                (false, true) => "PostDecrement",
            };
            parts.push(format!("Kind: {kind}"));
        }
        OperationData::Conversion { conversion, .. } => {
            parts.push(format!("Conversion: {}", conversion.describe()));
        }
        OperationData::Argument {
            mode,
            in_conversion,
            out_conversion,
            ..
        } => {
            if *mode != ArgMode::Value {
                parts.push(format!(
                    "Mode: {}",
                    match mode {
                        ArgMode::Value => "Value",
                        ArgMode::Ref => "Ref",
                        ArgMode::Out => "Out",
                    }
                ));
            }
            parts.push(format!("InConversion: {}", in_conversion.describe()));
            parts.push(format!("OutConversion: {}", out_conversion.describe()));
        }
        OperationData::EventAssignment { adds, .. } => {
            parts.push(format!(
                "Kind: {}",
                if *adds { "AddHandler" } else { "RemoveHandler" }
            ));
        }
        OperationData::VariableDeclaration { name, .. } => {
            parts.push(format!("Name: {name}"));
        }
        OperationData::CatchClause {
            exception_type,
            local,
            ..
        } => {
            if let Some(ty) = exception_type {
                parts.push(format!("ExceptionType: {}", table.display_name(*ty)));
            }
            if let Some(local) = local {
                parts.push(format!("Local: {local}"));
            }
        }
        _ => {}
    }

    match op.result_type {
        Some(ty) => parts.push(format!("Type: {}", table.display_name(ty))),
        None => parts.push("Type: null".to_string()),
    }
    if let Some(constant) = &op.constant {
        parts.push(format!("Constant: {constant}"));
    }
    if let Some(info) = info {
        if let Some(method) = info.method {
            parts.push(format!(
                "OperatorMethod: {}",
                facts.symbol(method).display(table)
            ));
        }
        if info.is_lifted {
            parts.push("IsLifted".to_string());
        }
        if info.is_dynamic {
            parts.push("IsDynamic".to_string());
        }
    }
    if op.is_invalid {
        parts.push("IsInvalid".to_string());
    }
    if op.is_implicit {
        parts.push("IsImplicit".to_string());
    }
    parts.join(", ")
}
