//! The operation node model.
//!
//! One tagged-variant tree node represents every semantic operation the
//! lowering engine can produce, expression or statement. Nodes carry their
//! semantic type, optional compile-time constant, validity and implicitness
//! markers, and the originating syntax span. Ownership is strictly
//! tree-shaped; the parent relationship needed for printing is derived from
//! recursion context, never stored.
//!
//! Invalidity is contagious upward: constructors fold the children's flags
//! into the parent at build time, so a finished tree never needs a repair
//! pass and never mutates.

use opal_common::Span;
use opal_facts::{ConstValue, Conversion, OperatorKind, SymbolId, TypeId};
use opal_syntax::ArgMode;

// =============================================================================
// Operator detail
// =============================================================================

/// Resolution detail attached to operator nodes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OperatorInfo {
    /// The user-defined operator method applied, when resolution picked one.
    pub method: Option<SymbolId>,
    /// Resolved against a nullable operand's underlying type, result
    /// re-wrapped as nullable.
    pub is_lifted: bool,
    /// Resolution deferred to runtime because an operand was dynamic.
    pub is_dynamic: bool,
}

impl OperatorInfo {
    #[must_use]
    pub const fn builtin() -> Self {
        Self {
            method: None,
            is_lifted: false,
            is_dynamic: false,
        }
    }

    #[must_use]
    pub const fn user_defined(method: SymbolId) -> Self {
        Self {
            method: Some(method),
            is_lifted: false,
            is_dynamic: false,
        }
    }

    #[must_use]
    pub const fn lifted(mut self) -> Self {
        self.is_lifted = true;
        self
    }

    #[must_use]
    pub const fn dynamic() -> Self {
        Self {
            method: None,
            is_lifted: false,
            is_dynamic: true,
        }
    }
}

/// Direction of a `Branch` node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
}

// =============================================================================
// Operation data
// =============================================================================

/// The closed set of operation kinds.
///
/// Child fields are ordered the way they appear in source; traversal and
/// printing follow field order exactly.
#[derive(Clone, Debug)]
pub enum OperationData {
    // --- leaves -------------------------------------------------------------
    /// A literal; the constant value lives on the node envelope.
    Literal,
    LocalReference {
        name: String,
    },
    ParameterReference {
        name: String,
    },
    /// The implicit or explicit receiver of an instance member.
    InstanceReference,
    Branch {
        kind: BranchKind,
    },
    /// A pattern that matches a type and optionally declares a local.
    DeclarationPattern {
        name: Option<String>,
    },
    /// A literal text segment of an interpolated string.
    InterpolatedStringText,

    // --- member references --------------------------------------------------
    FieldReference {
        field: SymbolId,
        receiver: Option<Box<Operation>>,
    },
    EventReference {
        event: SymbolId,
        receiver: Option<Box<Operation>>,
    },
    MethodReference {
        method: SymbolId,
        receiver: Option<Box<Operation>>,
    },
    DynamicMemberReference {
        member: String,
        receiver: Option<Box<Operation>>,
    },

    // --- operators and conversions ------------------------------------------
    UnaryOperator {
        op: OperatorKind,
        info: OperatorInfo,
        operand: Box<Operation>,
    },
    BinaryOperator {
        op: OperatorKind,
        info: OperatorInfo,
        left: Box<Operation>,
        right: Box<Operation>,
    },
    IncrementOrDecrement {
        is_increment: bool,
        is_postfix: bool,
        target: Box<Operation>,
    },
    Conversion {
        conversion: Conversion,
        operand: Box<Operation>,
    },

    // --- calls ---------------------------------------------------------------
    Invocation {
        method: SymbolId,
        receiver: Option<Box<Operation>>,
        arguments: Vec<Operation>,
    },
    Argument {
        mode: ArgMode,
        in_conversion: Conversion,
        out_conversion: Conversion,
        value: Box<Operation>,
    },
    DynamicInvocation {
        callee: Box<Operation>,
        arguments: Vec<Operation>,
    },
    ObjectCreation {
        arguments: Vec<Operation>,
    },

    // --- assignment ----------------------------------------------------------
    SimpleAssignment {
        target: Box<Operation>,
        value: Box<Operation>,
    },
    CompoundAssignment {
        op: OperatorKind,
        info: OperatorInfo,
        target: Box<Operation>,
        value: Box<Operation>,
    },
    /// `+=`/`-=` on an event target, binding an accessor rather than a value.
    EventAssignment {
        adds: bool,
        event: Box<Operation>,
        handler: Box<Operation>,
    },

    // --- delegates and functions ---------------------------------------------
    /// Always exactly one `Target` child: an anonymous function, a method
    /// reference, a nested delegate creation, or an invalid node.
    DelegateCreation {
        target: Box<Operation>,
    },
    AnonymousFunction {
        body: Box<Operation>,
    },

    // --- patterns and strings -------------------------------------------------
    IsPattern {
        value: Box<Operation>,
        pattern: Box<Operation>,
    },
    InterpolatedString {
        parts: Vec<Operation>,
    },
    Interpolation {
        expression: Box<Operation>,
    },

    // --- placeholders ----------------------------------------------------------
    /// A structurally untyped grouping node; used where resolution has a
    /// shape but no single semantic kind fits.
    None {
        children: Vec<Operation>,
    },
    /// Semantic binding failed; children are whatever subtrees survived.
    Invalid {
        children: Vec<Operation>,
    },

    // --- statements -------------------------------------------------------------
    Block {
        statements: Vec<Operation>,
    },
    ExpressionStatement {
        expression: Box<Operation>,
    },
    Return {
        value: Option<Box<Operation>>,
    },
    If {
        condition: Box<Operation>,
        when_true: Box<Operation>,
        when_false: Option<Box<Operation>>,
    },
    /// Top-tested loop.
    While {
        condition: Box<Operation>,
        body: Box<Operation>,
    },
    /// Bottom-tested loop; the condition child follows the body in
    /// traversal order, matching source position.
    DoLoop {
        body: Box<Operation>,
        condition: Box<Operation>,
        ignored_condition: Option<Box<Operation>>,
    },
    Try {
        body: Box<Operation>,
        catches: Vec<Operation>,
        finally: Option<Box<Operation>>,
    },
    CatchClause {
        exception_type: Option<TypeId>,
        local: Option<String>,
        handler: Box<Operation>,
    },
    VariableDeclarationGroup {
        declarations: Vec<Operation>,
    },
    VariableDeclaration {
        name: String,
        initializer: Option<Box<Operation>>,
    },
    VariableInitializer {
        value: Box<Operation>,
    },
    Using {
        resources: Box<Operation>,
        body: Box<Operation>,
    },
    Fixed {
        declaration: Box<Operation>,
        body: Box<Operation>,
    },
}

/// One labeled child position, as the printer and validator see it.
#[derive(Copy, Clone)]
pub enum ChildSlot<'a> {
    /// A present single child.
    Node(&'a Operation),
    /// An absent optional child; prints as the literal token `null`.
    Absent,
    /// An ordered child list; prints as `Label(n)` with or without members.
    List(&'a [Operation]),
}

impl OperationData {
    /// Stable kind name used by the printer and violation paths.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            OperationData::Literal => "Literal",
            OperationData::LocalReference { .. } => "LocalReference",
            OperationData::ParameterReference { .. } => "ParameterReference",
            OperationData::InstanceReference => "InstanceReference",
            OperationData::Branch { .. } => "Branch",
            OperationData::DeclarationPattern { .. } => "DeclarationPattern",
            OperationData::InterpolatedStringText => "InterpolatedStringText",
            OperationData::FieldReference { .. } => "FieldReference",
            OperationData::EventReference { .. } => "EventReference",
            OperationData::MethodReference { .. } => "MethodReference",
            OperationData::DynamicMemberReference { .. } => "DynamicMemberReference",
            OperationData::UnaryOperator { .. } => "UnaryOperator",
            OperationData::BinaryOperator { .. } => "BinaryOperator",
            OperationData::IncrementOrDecrement { .. } => "IncrementOrDecrement",
            OperationData::Conversion { .. } => "Conversion",
            OperationData::Invocation { .. } => "Invocation",
            OperationData::Argument { .. } => "Argument",
            OperationData::DynamicInvocation { .. } => "DynamicInvocation",
            OperationData::ObjectCreation { .. } => "ObjectCreation",
            OperationData::SimpleAssignment { .. } => "SimpleAssignment",
            OperationData::CompoundAssignment { .. } => "CompoundAssignment",
            OperationData::EventAssignment { .. } => "EventAssignment",
            OperationData::DelegateCreation { .. } => "DelegateCreation",
            OperationData::AnonymousFunction { .. } => "AnonymousFunction",
            OperationData::IsPattern { .. } => "IsPattern",
            OperationData::InterpolatedString { .. } => "InterpolatedString",
            OperationData::Interpolation { .. } => "Interpolation",
            OperationData::None { .. } => "None",
            OperationData::Invalid { .. } => "Invalid",
            OperationData::Block { .. } => "Block",
            OperationData::ExpressionStatement { .. } => "ExpressionStatement",
            OperationData::Return { .. } => "Return",
            OperationData::If { .. } => "If",
            OperationData::While { .. } => "While",
            OperationData::DoLoop { .. } => "DoLoop",
            OperationData::Try { .. } => "Try",
            OperationData::CatchClause { .. } => "CatchClause",
            OperationData::VariableDeclarationGroup { .. } => "VariableDeclarationGroup",
            OperationData::VariableDeclaration { .. } => "VariableDeclaration",
            OperationData::VariableInitializer { .. } => "VariableInitializer",
            OperationData::Using { .. } => "Using",
            OperationData::Fixed { .. } => "Fixed",
        }
    }

    /// The labeled child positions of this node, in traversal order.
    ///
    /// Every syntactic slot appears here even when empty, so the printed
    /// tree always shows the full shape.
    #[must_use]
    pub fn labeled_slots(&self) -> Vec<(&'static str, ChildSlot<'_>)> {
        fn opt(child: &Option<Box<Operation>>) -> ChildSlot<'_> {
            match child {
                Some(node) => ChildSlot::Node(node),
                None => ChildSlot::Absent,
            }
        }

        match self {
            OperationData::Literal
            | OperationData::LocalReference { .. }
            | OperationData::ParameterReference { .. }
            | OperationData::InstanceReference
            | OperationData::Branch { .. }
            | OperationData::DeclarationPattern { .. }
            | OperationData::InterpolatedStringText => Vec::new(),
            OperationData::FieldReference { receiver, .. }
            | OperationData::EventReference { receiver, .. }
            | OperationData::MethodReference { receiver, .. }
            | OperationData::DynamicMemberReference { receiver, .. } => {
                vec![("Instance", opt(receiver))]
            }
            OperationData::UnaryOperator { operand, .. } => {
                vec![("Operand", ChildSlot::Node(operand))]
            }
            OperationData::BinaryOperator { left, right, .. } => vec![
                ("Left", ChildSlot::Node(left)),
                ("Right", ChildSlot::Node(right)),
            ],
            OperationData::IncrementOrDecrement { target, .. } => {
                vec![("Target", ChildSlot::Node(target))]
            }
            OperationData::Conversion { operand, .. } => {
                vec![("Operand", ChildSlot::Node(operand))]
            }
            OperationData::Invocation {
                receiver,
                arguments,
                ..
            } => vec![
                ("Instance", opt(receiver)),
                ("Arguments", ChildSlot::List(arguments)),
            ],
            OperationData::Argument { value, .. } => vec![("Value", ChildSlot::Node(value))],
            OperationData::DynamicInvocation { callee, arguments } => vec![
                ("Expression", ChildSlot::Node(callee)),
                ("Arguments", ChildSlot::List(arguments)),
            ],
            OperationData::ObjectCreation { arguments } => {
                vec![("Arguments", ChildSlot::List(arguments))]
            }
            OperationData::SimpleAssignment { target, value } => vec![
                ("Target", ChildSlot::Node(target)),
                ("Value", ChildSlot::Node(value)),
            ],
            OperationData::CompoundAssignment { target, value, .. } => vec![
                ("Target", ChildSlot::Node(target)),
                ("Value", ChildSlot::Node(value)),
            ],
            OperationData::EventAssignment { event, handler, .. } => vec![
                ("EventReference", ChildSlot::Node(event)),
                ("Handler", ChildSlot::Node(handler)),
            ],
            OperationData::DelegateCreation { target } => {
                vec![("Target", ChildSlot::Node(target))]
            }
            OperationData::AnonymousFunction { body } => vec![("Body", ChildSlot::Node(body))],
            OperationData::IsPattern { value, pattern } => vec![
                ("Value", ChildSlot::Node(value)),
                ("Pattern", ChildSlot::Node(pattern)),
            ],
            OperationData::InterpolatedString { parts } => {
                vec![("Parts", ChildSlot::List(parts))]
            }
            OperationData::Interpolation { expression } => {
                vec![("Expression", ChildSlot::Node(expression))]
            }
            OperationData::None { children } | OperationData::Invalid { children } => {
                vec![("Children", ChildSlot::List(children))]
            }
            OperationData::Block { statements } => {
                vec![("Statements", ChildSlot::List(statements))]
            }
            OperationData::ExpressionStatement { expression } => {
                vec![("Expression", ChildSlot::Node(expression))]
            }
            OperationData::Return { value } => vec![("ReturnedValue", opt(value))],
            OperationData::If {
                condition,
                when_true,
                when_false,
            } => vec![
                ("Condition", ChildSlot::Node(condition)),
                ("WhenTrue", ChildSlot::Node(when_true)),
                ("WhenFalse", opt(when_false)),
            ],
            OperationData::While { condition, body } => vec![
                ("Condition", ChildSlot::Node(condition)),
                ("Body", ChildSlot::Node(body)),
            ],
            OperationData::DoLoop {
                body,
                condition,
                ignored_condition,
            } => vec![
                ("Body", ChildSlot::Node(body)),
                ("Condition", ChildSlot::Node(condition)),
                ("IgnoredCondition", opt(ignored_condition)),
            ],
            OperationData::Try {
                body,
                catches,
                finally,
            } => vec![
                ("Body", ChildSlot::Node(body)),
                ("Catches", ChildSlot::List(catches)),
                ("Finally", opt(finally)),
            ],
            OperationData::CatchClause { handler, .. } => {
                vec![("Handler", ChildSlot::Node(handler))]
            }
            OperationData::VariableDeclarationGroup { declarations } => {
                vec![("Declarations", ChildSlot::List(declarations))]
            }
            OperationData::VariableDeclaration { initializer, .. } => {
                vec![("Initializer", opt(initializer))]
            }
            OperationData::VariableInitializer { value } => {
                vec![("Value", ChildSlot::Node(value))]
            }
            OperationData::Using { resources, body } => vec![
                ("Resources", ChildSlot::Node(resources)),
                ("Body", ChildSlot::Node(body)),
            ],
            OperationData::Fixed { declaration, body } => vec![
                ("Declaration", ChildSlot::Node(declaration)),
                ("Body", ChildSlot::Node(body)),
            ],
        }
    }
}

// =============================================================================
// Operation envelope
// =============================================================================

/// One node of the semantic operation tree.
#[derive(Clone, Debug)]
pub struct Operation {
    pub data: OperationData,
    /// Semantic type of the node's value; `None` for statements and for
    /// structurally untyped nodes.
    pub result_type: Option<TypeId>,
    /// Compile-time-known value, when the node is constant.
    pub constant: Option<ConstValue>,
    /// Binding failed for this node or for a descendant feeding it.
    pub is_invalid: bool,
    /// Synthesized by lowering rather than corresponding 1:1 to syntax.
    pub is_implicit: bool,
    pub span: Span,
    /// Kind name of the originating syntax node, for the printer.
    pub syntax_kind: &'static str,
}

impl Operation {
    /// Build a node, folding the children's invalidity upward.
    ///
    /// An `Invalid` variant is invalid by definition regardless of its
    /// children.
    #[must_use]
    pub fn new(
        data: OperationData,
        result_type: Option<TypeId>,
        span: Span,
        syntax_kind: &'static str,
    ) -> Self {
        let child_invalid = data
            .labeled_slots()
            .iter()
            .any(|(_, slot)| match slot {
                ChildSlot::Node(node) => node.is_invalid,
                ChildSlot::Absent => false,
                ChildSlot::List(nodes) => nodes.iter().any(|n| n.is_invalid),
            });
        let is_invalid = child_invalid || matches!(data, OperationData::Invalid { .. });
        Self {
            data,
            result_type,
            constant: None,
            is_invalid,
            is_implicit: false,
            span,
            syntax_kind,
        }
    }

    /// A statement node: no result type.
    #[must_use]
    pub fn statement(data: OperationData, span: Span, syntax_kind: &'static str) -> Self {
        Self::new(data, None, span, syntax_kind)
    }

    /// A minimal invalid leaf, used for unfillable syntax slots.
    #[must_use]
    pub fn invalid_leaf(span: Span, syntax_kind: &'static str) -> Self {
        Self::new(
            OperationData::Invalid {
                children: Vec::new(),
            },
            Some(TypeId::ERROR),
            span,
            syntax_kind,
        )
    }

    /// An invalid node preserving the given subtrees, typed as `object`.
    #[must_use]
    pub fn invalid_wrapping(
        children: Vec<Operation>,
        span: Span,
        syntax_kind: &'static str,
    ) -> Self {
        Self::new(
            OperationData::Invalid { children },
            Some(TypeId::OBJECT),
            span,
            syntax_kind,
        )
    }

    #[must_use]
    pub fn with_constant(mut self, constant: ConstValue) -> Self {
        self.constant = Some(constant);
        self
    }

    #[must_use]
    pub fn with_constant_opt(mut self, constant: Option<ConstValue>) -> Self {
        self.constant = constant;
        self
    }

    /// Mark this node invalid, independent of its children.
    #[must_use]
    pub fn invalid(mut self) -> Self {
        self.is_invalid = true;
        self
    }

    /// Mark this node as synthesized by lowering.
    #[must_use]
    pub fn implicit(mut self) -> Self {
        self.is_implicit = true;
        self
    }

    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        self.data.kind_name()
    }

    /// All present children in traversal order, labels dropped.
    #[must_use]
    pub fn children(&self) -> Vec<&Operation> {
        let mut out = Vec::new();
        for (_, slot) in self.data.labeled_slots() {
            match slot {
                ChildSlot::Node(node) => out.push(node),
                ChildSlot::Absent => {}
                ChildSlot::List(nodes) => out.extend(nodes.iter()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_literal(v: i64) -> Operation {
        Operation::new(
            OperationData::Literal,
            Some(TypeId::INT32),
            Span::empty(),
            "NumericLiteralExpression",
        )
        .with_constant(ConstValue::Int(v))
    }

    #[test]
    fn child_invalidity_is_folded_at_construction() {
        let bad = Operation::invalid_leaf(Span::empty(), "MissingExpression");
        let parent = Operation::new(
            OperationData::BinaryOperator {
                op: OperatorKind::Add,
                info: OperatorInfo::builtin(),
                left: Box::new(int_literal(1)),
                right: Box::new(bad),
            },
            Some(TypeId::INT32),
            Span::empty(),
            "BinaryExpression",
        );
        assert!(parent.is_invalid);
    }

    #[test]
    fn valid_children_leave_parent_valid() {
        let parent = Operation::new(
            OperationData::BinaryOperator {
                op: OperatorKind::Add,
                info: OperatorInfo::builtin(),
                left: Box::new(int_literal(1)),
                right: Box::new(int_literal(2)),
            },
            Some(TypeId::INT32),
            Span::empty(),
            "BinaryExpression",
        );
        assert!(!parent.is_invalid);
        assert_eq!(parent.children().len(), 2);
    }

    #[test]
    fn slots_keep_source_order_for_do_loops() {
        let body = Operation::statement(
            OperationData::Block {
                statements: Vec::new(),
            },
            Span::empty(),
            "Block",
        );
        let condition = int_literal(1);
        let do_loop = Operation::statement(
            OperationData::DoLoop {
                body: Box::new(body),
                condition: Box::new(condition),
                ignored_condition: None,
            },
            Span::empty(),
            "DoStatement",
        );
        let labels: Vec<&str> = do_loop
            .data
            .labeled_slots()
            .iter()
            .map(|&(label, _)| label)
            .collect();
        assert_eq!(labels, ["Body", "Condition", "IgnoredCondition"]);
    }
}
