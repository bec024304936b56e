//! Statement lowering: branches, loops, declarations, scoping for pattern
//! locals, and per-declarator error isolation.

use opal_common::diagnostics::diagnostic_codes as codes;
use opal_facts::{ConstValue, FactsHost, OperatorKind, TypeId};
use opal_sema::{LoweringContext, OperationData, describe, validate};
use opal_syntax::{
    BinaryOp, CatchSyntax, DeclaratorSyntax, ExprSyntax, StmtKind, StmtSyntax, UnaryOp,
};

#[test]
fn if_without_else_keeps_the_slot() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("b", TypeId::BOOL);

    let op = ctx.lower_statement(&StmtSyntax::if_stmt(
        ExprSyntax::ident("b"),
        StmtSyntax::block(vec![]),
        None,
    ));
    assert!(ctx.take_diagnostics().is_empty());
    let OperationData::If { when_false, .. } = &op.data else {
        panic!();
    };
    assert!(when_false.is_none());
    let text = describe(&op, &host);
    assert!(text.contains("  WhenFalse:\n    null\n"), "{text}");
}

#[test]
fn missing_condition_still_lowers_both_branches() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("i", TypeId::INT32);

    let op = ctx.lower_statement(&StmtSyntax::if_stmt(
        ExprSyntax::missing(),
        StmtSyntax::block(vec![StmtSyntax::expr(ExprSyntax::assign(
            ExprSyntax::ident("i"),
            ExprSyntax::int(1),
        ))]),
        Some(StmtSyntax::block(vec![])),
    ));
    let diags = ctx.take_diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::INVALID_EXPR_TERM);

    assert!(op.is_invalid);
    let OperationData::If { condition, when_true, when_false } = &op.data else {
        panic!();
    };
    assert_eq!(condition.kind_name(), "Invalid");
    assert_eq!(when_true.kind_name(), "Block");
    assert!(!when_true.is_invalid);
    assert!(when_false.is_some());
    assert!(validate(&op).is_empty());
}

#[test]
fn constant_true_condition_is_preserved_not_elided() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    let op = ctx.lower_statement(&StmtSyntax::while_stmt(
        ExprSyntax::boolean(true),
        StmtSyntax::block(vec![]),
    ));
    assert!(ctx.take_diagnostics().is_empty());
    let OperationData::While { condition, .. } = &op.data else {
        panic!();
    };
    assert_eq!(condition.constant, Some(ConstValue::Bool(true)));
    assert!(describe(&op, &host).contains("Constant: true"));
}

#[test]
fn do_loop_traverses_body_before_condition() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("b", TypeId::BOOL);

    let op = ctx.lower_statement(&StmtSyntax::do_stmt(
        StmtSyntax::block(vec![StmtSyntax::declare(
            TypeId::INT32,
            vec![DeclaratorSyntax::new("i", Some(ExprSyntax::int(0)))],
        )]),
        ExprSyntax::ident("b"),
    ));
    assert!(ctx.take_diagnostics().is_empty());
    let text = describe(&op, &host);
    let body_at = text.find("Body:").expect("body section");
    let cond_at = text.find("Condition:").expect("condition section");
    assert!(body_at < cond_at, "{text}");
    assert!(text.contains("IgnoredCondition:\n    null\n"), "{text}");
}

#[test]
fn break_and_continue_lower_to_branches() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    let brk = ctx.lower_statement(&StmtSyntax::new(StmtKind::Break));
    let cont = ctx.lower_statement(&StmtSyntax::new(StmtKind::Continue));
    assert!(describe(&brk, &host).starts_with("Branch (Kind: Break, Type: null)"));
    assert!(describe(&cont, &host).starts_with("Branch (Kind: Continue, Type: null)"));
}

#[test]
fn return_value_coerces_to_declared_return_type() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host).with_return_type(TypeId::INT64);
    let op = ctx.lower_statement(&StmtSyntax::ret(Some(ExprSyntax::int(1))));
    assert!(ctx.take_diagnostics().is_empty());
    let OperationData::Return { value } = &op.data else {
        panic!();
    };
    let value = value.as_deref().unwrap();
    assert_eq!(value.kind_name(), "Conversion");
    assert_eq!(value.result_type, Some(TypeId::INT64));

    let bad = ctx.lower_statement(&StmtSyntax::ret(Some(ExprSyntax::string("s"))));
    let diags = ctx.take_diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::NO_IMPLICIT_CONV);
    assert!(bad.is_invalid);
}

#[test]
fn value_expression_is_not_a_statement() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("x", TypeId::INT32);

    let op = ctx.lower_statement(&StmtSyntax::expr(ExprSyntax::binary(
        BinaryOp::Add,
        ExprSyntax::ident("x"),
        ExprSyntax::int(1),
    )));
    let diags = ctx.take_diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::ILLEGAL_STATEMENT);
    assert!(op.is_invalid);
    assert_eq!(op.kind_name(), "ExpressionStatement");
}

#[test]
fn missing_statement_is_a_silent_invalid_leaf() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    let op = ctx.lower_statement(&StmtSyntax::missing());
    assert!(ctx.take_diagnostics().is_empty());
    assert!(op.is_invalid);
    assert_eq!(op.kind_name(), "Invalid");
}

// =============================================================================
// Declarations
// =============================================================================

#[test]
fn failed_declarator_does_not_poison_siblings() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);

    let op = ctx.lower_statement(&StmtSyntax::declare(
        TypeId::INT32,
        vec![
            DeclaratorSyntax::new("a", Some(ExprSyntax::int(1))),
            DeclaratorSyntax::new("b", Some(ExprSyntax::boolean(true))),
        ],
    ));
    let diags = ctx.take_diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::NO_IMPLICIT_CONV);

    let OperationData::VariableDeclarationGroup { declarations } = &op.data else {
        panic!();
    };
    assert_eq!(declarations.len(), 2);
    assert!(!declarations[0].is_invalid);
    assert!(declarations[1].is_invalid);
    assert!(op.is_invalid);
    assert!(validate(&op).is_empty());
}

#[test]
fn declarator_without_initializer_prints_null_slot() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    let op = ctx.lower_statement(&StmtSyntax::declare(
        TypeId::INT32,
        vec![DeclaratorSyntax::new("a", None)],
    ));
    assert!(ctx.take_diagnostics().is_empty());
    assert!(!op.is_invalid);
    assert!(describe(&op, &host).contains("Initializer:\n"));
    assert!(describe(&op, &host).contains("null\n"));
}

#[test]
fn missing_initializer_expression_reports_and_keeps_wrapper() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    let op = ctx.lower_statement(&StmtSyntax::declare(
        TypeId::INT32,
        vec![DeclaratorSyntax::new("a", Some(ExprSyntax::missing()))],
    ));
    let diags = ctx.take_diagnostics();
    assert_eq!(diags[0].code, codes::INVALID_EXPR_TERM);
    let OperationData::VariableDeclarationGroup { declarations } = &op.data else {
        panic!();
    };
    let OperationData::VariableDeclaration { initializer, .. } = &declarations[0].data else {
        panic!();
    };
    let init = initializer.as_deref().unwrap();
    assert_eq!(init.kind_name(), "VariableInitializer");
    assert!(init.is_invalid);
    assert!(validate(&op).is_empty());
}

#[test]
fn const_locals_propagate_their_value() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);

    let op = ctx.lower_statement(&StmtSyntax::block(vec![
        StmtSyntax::declare_const(
            TypeId::INT32,
            vec![DeclaratorSyntax::new("c", Some(ExprSyntax::int(5)))],
        ),
        StmtSyntax::declare(
            TypeId::INT32,
            vec![DeclaratorSyntax::new("y", Some(ExprSyntax::ident("c")))],
        ),
    ]));
    assert!(ctx.take_diagnostics().is_empty());

    let OperationData::Block { statements } = &op.data else {
        panic!();
    };
    let OperationData::VariableDeclarationGroup { declarations } = &statements[1].data else {
        panic!();
    };
    let OperationData::VariableDeclaration { initializer, .. } = &declarations[0].data else {
        panic!();
    };
    let OperationData::VariableInitializer { value } = &initializer.as_deref().unwrap().data
    else {
        panic!();
    };
    assert_eq!(value.kind_name(), "LocalReference");
    assert_eq!(value.constant, Some(ConstValue::Int(5)));
}

#[test]
fn non_constant_const_initializer_keeps_the_subtree() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("x", TypeId::INT32);

    let op = ctx.lower_statement(&StmtSyntax::declare_const(
        TypeId::INT32,
        vec![DeclaratorSyntax::new("k", Some(ExprSyntax::ident("x")))],
    ));
    let diags = ctx.take_diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::CONST_NOT_CONSTANT);
    assert_eq!(diags[0].message_args, vec!["k".to_string()]);

    let OperationData::VariableDeclarationGroup { declarations } = &op.data else {
        panic!();
    };
    assert!(declarations[0].is_invalid);
    // The offending expression survives inside the initializer wrapper.
    let OperationData::VariableDeclaration { initializer, .. } = &declarations[0].data else {
        panic!();
    };
    let init = initializer.as_deref().unwrap();
    assert_eq!(init.children()[0].kind_name(), "LocalReference");
}

// =============================================================================
// Boolean contexts
// =============================================================================

#[test]
fn operator_true_probe_wraps_short_circuit_condition() {
    let mut host = FactsHost::new();
    let s = host.declare_struct("S");
    host.declare_binary_operator(s, OperatorKind::BitwiseAnd, s, s, s);
    let (true_op, _) = host.declare_true_false_operators(s);
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("a", s);
    ctx.declare_local("b", s);

    let op = ctx.lower_statement(&StmtSyntax::if_stmt(
        ExprSyntax::binary(BinaryOp::ConditionalAnd, ExprSyntax::ident("a"), ExprSyntax::ident("b")),
        StmtSyntax::block(vec![]),
        None,
    ));
    assert!(ctx.take_diagnostics().is_empty());
    assert!(!op.is_invalid);

    let OperationData::If { condition, .. } = &op.data else {
        panic!();
    };
    let OperationData::UnaryOperator { op: kind, info, operand } = &condition.data else {
        panic!("expected probe, got {}", condition.kind_name());
    };
    assert_eq!(*kind, OperatorKind::True);
    assert_eq!(info.method, Some(true_op));
    assert!(condition.is_implicit);
    assert_eq!(condition.result_type, Some(TypeId::BOOL));
    // The raw short circuit underneath stays structurally untyped.
    assert_eq!(operand.kind_name(), "None");
    assert_eq!(operand.result_type, None);
    assert_eq!(operand.children().len(), 2);
}

#[test]
fn dynamic_condition_converts_to_bool() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("d", TypeId::DYNAMIC);

    let op = ctx.lower_statement(&StmtSyntax::if_stmt(
        ExprSyntax::ident("d"),
        StmtSyntax::block(vec![]),
        None,
    ));
    assert!(ctx.take_diagnostics().is_empty());
    let OperationData::If { condition, .. } = &op.data else {
        panic!();
    };
    assert_eq!(condition.kind_name(), "Conversion");
    assert!(condition.is_implicit);
    assert_eq!(condition.result_type, Some(TypeId::BOOL));
}

#[test]
fn non_boolean_condition_reports_conversion_failure() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("s", TypeId::STRING);

    let op = ctx.lower_statement(&StmtSyntax::while_stmt(
        ExprSyntax::ident("s"),
        StmtSyntax::block(vec![]),
    ));
    let diags = ctx.take_diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::NO_IMPLICIT_CONV);
    assert_eq!(
        diags[0].message_args,
        vec!["string".to_string(), "bool".to_string()]
    );
    assert!(op.is_invalid);
    assert!(validate(&op).is_empty());
}

// =============================================================================
// Pattern locals
// =============================================================================

#[test]
fn pattern_local_scopes_to_the_then_branch() {
    let mut host = FactsHost::new();
    let c = host.declare_class("C", None);
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("o", TypeId::OBJECT);
    ctx.declare_local("y", c);

    let op = ctx.lower_statement(&StmtSyntax::if_stmt(
        ExprSyntax::is_declared(ExprSyntax::ident("o"), c, "c"),
        StmtSyntax::block(vec![StmtSyntax::expr(ExprSyntax::assign(
            ExprSyntax::ident("y"),
            ExprSyntax::ident("c"),
        ))]),
        None,
    ));
    assert!(ctx.take_diagnostics().is_empty());
    assert!(!op.is_invalid);

    // Outside the statement the pattern local is gone.
    let after = ctx.lower_expression(&ExprSyntax::ident("c"), None);
    let diags = ctx.take_diagnostics();
    assert!(after.is_invalid);
    assert_eq!(diags[0].code, codes::NAME_NOT_IN_CONTEXT);
}

#[test]
fn negated_pattern_leaks_local_into_enclosing_scope() {
    let mut host = FactsHost::new();
    let c = host.declare_class("C", None);
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("o", TypeId::OBJECT);

    let op = ctx.lower_statement(&StmtSyntax::if_stmt(
        ExprSyntax::unary(
            UnaryOp::LogicalNot,
            ExprSyntax::is_declared(ExprSyntax::ident("o"), c, "c"),
        ),
        StmtSyntax::ret(None),
        None,
    ));
    assert!(ctx.take_diagnostics().is_empty());
    assert!(!op.is_invalid);

    let after = ctx.lower_expression(&ExprSyntax::ident("c"), None);
    assert!(ctx.take_diagnostics().is_empty());
    assert_eq!(after.kind_name(), "LocalReference");
    assert_eq!(after.result_type, Some(c));
}

#[test]
fn while_condition_pattern_local_is_visible_in_the_body() {
    let mut host = FactsHost::new();
    let c = host.declare_class("C", None);
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("o", TypeId::OBJECT);
    ctx.declare_local("y", c);

    let op = ctx.lower_statement(&StmtSyntax::while_stmt(
        ExprSyntax::is_declared(ExprSyntax::ident("o"), c, "v"),
        StmtSyntax::block(vec![StmtSyntax::expr(ExprSyntax::assign(
            ExprSyntax::ident("y"),
            ExprSyntax::ident("v"),
        ))]),
    ));
    assert!(ctx.take_diagnostics().is_empty());
    assert!(!op.is_invalid);
}

// =============================================================================
// Try, using, fixed
// =============================================================================

#[test]
fn try_catch_finally_shapes_and_catch_local_scope() {
    let mut host = FactsHost::new();
    let e = host.declare_class("Failure", None);
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("y", e);

    let op = ctx.lower_statement(&StmtSyntax::new(StmtKind::Try {
        body: vec![],
        catches: vec![CatchSyntax {
            exception_type: Some(e),
            local: Some("ex".to_string()),
            body: vec![StmtSyntax::expr(ExprSyntax::assign(
                ExprSyntax::ident("y"),
                ExprSyntax::ident("ex"),
            ))],
        }],
        finally: Some(vec![]),
    }));
    assert!(ctx.take_diagnostics().is_empty());
    assert!(!op.is_invalid);

    let OperationData::Try { body, catches, finally } = &op.data else {
        panic!();
    };
    assert_eq!(body.kind_name(), "Block");
    assert_eq!(catches.len(), 1);
    let OperationData::CatchClause { exception_type, local, handler } = &catches[0].data else {
        panic!();
    };
    assert_eq!(*exception_type, Some(e));
    assert_eq!(local.as_deref(), Some("ex"));
    assert_eq!(handler.kind_name(), "Block");
    assert!(finally.is_some());

    let text = describe(&op, &host);
    assert!(text.contains("ExceptionType: Failure"), "{text}");
    assert!(text.contains("Local: ex"), "{text}");
}

#[test]
fn using_declares_resources_visible_in_body() {
    let mut host = FactsHost::new();
    let res = host.declare_class("Res", None);
    host.declare_method(res, "Close", &[], TypeId::VOID, false);
    let mut ctx = LoweringContext::new(&host);

    let op = ctx.lower_statement(&StmtSyntax::new(StmtKind::Using {
        declaration: opal_syntax::DeclarationGroupSyntax {
            is_const: false,
            ty: res,
            declarators: vec![DeclaratorSyntax::new(
                "r",
                Some(ExprSyntax::new_object(res, vec![])),
            )],
        },
        body: Box::new(StmtSyntax::block(vec![StmtSyntax::expr(ExprSyntax::call(
            ExprSyntax::member(ExprSyntax::ident("r"), "Close"),
            vec![],
        ))])),
    }));
    assert!(ctx.take_diagnostics().is_empty());
    assert!(!op.is_invalid);

    let OperationData::Using { resources, body } = &op.data else {
        panic!();
    };
    assert_eq!(resources.kind_name(), "VariableDeclarationGroup");
    assert_eq!(body.kind_name(), "Block");

    // The resource local does not outlive the statement.
    let after = ctx.lower_expression(&ExprSyntax::ident("r"), None);
    assert!(after.is_invalid);
    ctx.take_diagnostics();
}

#[test]
fn fixed_mirrors_the_using_shape() {
    let host = FactsHost::new();
    let mut ctx = LoweringContext::new(&host);
    ctx.declare_local("i", TypeId::INT32);

    let op = ctx.lower_statement(&StmtSyntax::new(StmtKind::Fixed {
        declaration: opal_syntax::DeclarationGroupSyntax {
            is_const: false,
            ty: TypeId::INT32,
            declarators: vec![DeclaratorSyntax::new("p", Some(ExprSyntax::ident("i")))],
        },
        body: Box::new(StmtSyntax::block(vec![])),
    }));
    assert!(ctx.take_diagnostics().is_empty());
    let OperationData::Fixed { declaration, body } = &op.data else {
        panic!();
    };
    assert_eq!(declaration.kind_name(), "VariableDeclarationGroup");
    assert_eq!(body.kind_name(), "Block");
}
