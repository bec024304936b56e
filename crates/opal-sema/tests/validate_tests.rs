//! Invariant checking over hand-built and lowered trees.

use opal_common::Span;
use opal_facts::{ConstValue, Conversion, FactsHost, TypeId};
use opal_sema::{InvariantViolation, LoweringContext, Operation, OperationData, validate};
use opal_syntax::{BinaryOp, ExprSyntax, StmtSyntax};

fn int_literal() -> Operation {
    Operation::new(
        OperationData::Literal,
        Some(TypeId::INT32),
        Span::empty(),
        "NumericLiteralExpression",
    )
    .with_constant(ConstValue::Int(1))
}

#[test]
fn lowered_trees_are_clean_even_when_invalid() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("b", TypeId::BOOL);
    ctx.declare_local("i", TypeId::INT32);

    let ok = ctx.lower_statement(&StmtSyntax::expr(ExprSyntax::assign(
        ExprSyntax::ident("i"),
        ExprSyntax::int(1),
    )));
    assert!(validate(&ok).is_empty());

    // A resolution failure produces an invalid shape, not a broken one.
    let broken = ctx.lower_expression(
        &ExprSyntax::binary(BinaryOp::Add, ExprSyntax::ident("b"), ExprSyntax::ident("i")),
        None,
    );
    ctx.take_diagnostics();
    assert!(broken.is_invalid);
    assert!(validate(&broken).is_empty());
}

#[test]
fn cleared_invalidity_flag_is_detected() {
    let child = Operation::invalid_leaf(Span::empty(), "IdentifierName");
    let mut stmt = Operation::statement(
        OperationData::ExpressionStatement {
            expression: Box::new(child),
        },
        Span::empty(),
        "ExpressionStatement",
    );
    assert!(stmt.is_invalid);

    stmt.is_invalid = false;
    let violations = validate(&stmt);
    assert_eq!(
        violations,
        vec![InvariantViolation::ContagionBroken {
            path: "ExpressionStatement".to_string(),
        }]
    );
    assert_eq!(
        violations[0].to_string(),
        "invalid descendant not propagated at ExpressionStatement"
    );
}

#[test]
fn contagion_paths_name_every_step() {
    let child = Operation::invalid_leaf(Span::empty(), "IdentifierName");
    let mut stmt = Operation::statement(
        OperationData::ExpressionStatement {
            expression: Box::new(child),
        },
        Span::empty(),
        "ExpressionStatement",
    );
    stmt.is_invalid = false;
    let block = Operation::statement(
        OperationData::Block {
            statements: vec![stmt],
        },
        Span::empty(),
        "Block",
    );

    // The cleared node breaks the invariant, and so does the block above
    // it, which sees the invalid leaf through the cleared node.
    let violations = validate(&block);
    assert_eq!(violations.len(), 2);
    assert!(violations.contains(&InvariantViolation::ContagionBroken {
        path: "Block/Statements/ExpressionStatement".to_string(),
    }));
    assert!(violations.contains(&InvariantViolation::ContagionBroken {
        path: "Block".to_string(),
    }));
}

#[test]
fn nonexistent_conversion_must_be_flagged() {
    let node = Operation::new(
        OperationData::Conversion {
            conversion: Conversion::none(),
            operand: Box::new(int_literal()),
        },
        Some(TypeId::BOOL),
        Span::empty(),
        "CastExpression",
    );
    assert_eq!(
        validate(&node),
        vec![InvariantViolation::NonexistentConversionOnValidNode {
            path: "Conversion".to_string(),
        }]
    );

    // The same node is legal once marked invalid.
    assert!(validate(&node.invalid()).is_empty());
}

#[test]
fn delegate_target_kinds_are_closed() {
    let node = Operation::new(
        OperationData::DelegateCreation {
            target: Box::new(int_literal()),
        },
        Some(TypeId::OBJECT),
        Span::empty(),
        "ObjectCreationExpression",
    );
    let violations = validate(&node);
    assert_eq!(
        violations,
        vec![InvariantViolation::BadDelegateTarget {
            path: "DelegateCreation".to_string(),
            found: "Literal",
        }]
    );
    assert_eq!(
        violations[0].to_string(),
        "delegate creation target is Literal at DelegateCreation"
    );
}

#[test]
fn declaration_group_children_must_be_declarations() {
    let group = Operation::statement(
        OperationData::VariableDeclarationGroup {
            declarations: vec![int_literal()],
        },
        Span::empty(),
        "LocalDeclarationStatement",
    );
    assert_eq!(
        validate(&group),
        vec![InvariantViolation::BadDeclarationChild {
            path: "VariableDeclarationGroup".to_string(),
            found: "Literal",
        }]
    );
}

#[test]
fn declaration_initializer_must_be_wrapped() {
    let declaration = Operation::statement(
        OperationData::VariableDeclaration {
            name: "x".to_string(),
            initializer: Some(Box::new(int_literal())),
        },
        Span::empty(),
        "VariableDeclarator",
    );
    assert_eq!(
        validate(&declaration),
        vec![InvariantViolation::BadDeclarationChild {
            path: "VariableDeclaration".to_string(),
            found: "Literal",
        }]
    );
}

#[test]
fn failed_delegate_binding_still_validates() {
    let mut host = FactsHost::new();
    let c = host.declare_class("C", None);
    host.declare_method(c, "M", &[TypeId::INT32], TypeId::VOID, false);
    let action0 = host.declare_delegate("Action0", &[], TypeId::VOID);
    let mut ctx = LoweringContext::new(&host).in_container(c, false);

    let op = ctx.lower_expression(&ExprSyntax::ident("M"), Some(action0));
    ctx.take_diagnostics();
    assert!(op.is_invalid);
    assert!(validate(&op).is_empty());
}
