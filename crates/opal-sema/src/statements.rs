//! Statement lowering.
//!
//! Control-flow and declaration syntax becomes operation nodes, composing
//! child expressions from the expression engine and child statements
//! recursively. Syntax-level gaps resolve to minimal invalid leaves and
//! never abort sibling lowering; error isolation is per-declarator and
//! per-branch, not per-statement.

use crate::context::LoweringContext;
use crate::ops::{BranchKind, Operation, OperationData};
use opal_common::Span;
use opal_common::diagnostics::diagnostic_codes as codes;
use opal_facts::TypeId;
use opal_syntax::{
    DeclarationGroupSyntax, ExprKind, ExprSyntax, StmtKind, StmtSyntax, UnaryOp,
};

impl LoweringContext<'_> {
    pub(crate) fn lower_stmt(&mut self, s: &StmtSyntax) -> Operation {
        let span = s.span;
        let sk = s.syntax_kind();
        match &s.kind {
            StmtKind::Block(statements) => self.scoped(|ctx| {
                let statements = statements.iter().map(|s| ctx.lower_stmt(s)).collect();
                Operation::statement(OperationData::Block { statements }, span, sk)
            }),

            StmtKind::Expression(e) => self.lower_expression_statement(e, span, sk),

            StmtKind::LocalDeclaration(group) => self.lower_declaration_group(group, span, sk),

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.lower_if(condition, then_branch, else_branch.as_deref(), span, sk),

            StmtKind::While { condition, body } => {
                let condition_op = self.lower_condition_expr(condition);
                let pattern_locals = std::mem::take(&mut self.pending_pattern_locals);
                let body_op = self.scoped_with(&pattern_locals, |ctx| ctx.lower_stmt(body));
                Operation::statement(
                    OperationData::While {
                        condition: Box::new(condition_op),
                        body: Box::new(body_op),
                    },
                    span,
                    sk,
                )
            }

            StmtKind::Do { body, condition } => {
                // Bottom-tested: the body is lowered (and traversed) ahead
                // of the condition, matching source order.
                let body_op = self.scoped(|ctx| ctx.lower_stmt(body));
                let condition_op = self.lower_condition_expr(condition);
                self.pending_pattern_locals.clear();
                Operation::statement(
                    OperationData::DoLoop {
                        body: Box::new(body_op),
                        condition: Box::new(condition_op),
                        ignored_condition: None,
                    },
                    span,
                    sk,
                )
            }

            StmtKind::Break => Operation::statement(
                OperationData::Branch {
                    kind: BranchKind::Break,
                },
                span,
                sk,
            ),
            StmtKind::Continue => Operation::statement(
                OperationData::Branch {
                    kind: BranchKind::Continue,
                },
                span,
                sk,
            ),

            StmtKind::Return(value) => {
                let value_op = value.as_deref().map(|e| {
                    if self.return_type == TypeId::VOID {
                        self.lower_expr(e)
                    } else {
                        let target = self.return_type;
                        self.lower_with_target(e, Some(target))
                    }
                });
                Operation::statement(
                    OperationData::Return {
                        value: value_op.map(Box::new),
                    },
                    span,
                    sk,
                )
            }

            StmtKind::Try {
                body,
                catches,
                finally,
            } => {
                let body_op = self.scoped(|ctx| {
                    let statements = body.iter().map(|s| ctx.lower_stmt(s)).collect();
                    Operation::statement(OperationData::Block { statements }, span, "Block")
                });
                let catch_ops: Vec<Operation> = catches
                    .iter()
                    .map(|catch| {
                        let locals: Vec<(String, TypeId)> = catch
                            .local
                            .iter()
                            .map(|name| {
                                (name.clone(), catch.exception_type.unwrap_or(TypeId::ERROR))
                            })
                            .collect();
                        let handler = self.scoped_with(&locals, |ctx| {
                            let statements =
                                catch.body.iter().map(|s| ctx.lower_stmt(s)).collect();
                            Operation::statement(
                                OperationData::Block { statements },
                                span,
                                "Block",
                            )
                        });
                        Operation::statement(
                            OperationData::CatchClause {
                                exception_type: catch.exception_type,
                                local: catch.local.clone(),
                                handler: Box::new(handler),
                            },
                            span,
                            "CatchClause",
                        )
                    })
                    .collect();
                let finally_op = finally.as_ref().map(|statements| {
                    self.scoped(|ctx| {
                        let statements = statements.iter().map(|s| ctx.lower_stmt(s)).collect();
                        Operation::statement(OperationData::Block { statements }, span, "Block")
                    })
                });
                Operation::statement(
                    OperationData::Try {
                        body: Box::new(body_op),
                        catches: catch_ops,
                        finally: finally_op.map(Box::new),
                    },
                    span,
                    sk,
                )
            }

            StmtKind::Using { declaration, body } => self.scoped(|ctx| {
                let resources = ctx.lower_declaration_group(
                    declaration,
                    span,
                    "VariableDeclarationGroup",
                );
                let body_op = ctx.lower_stmt(body);
                Operation::statement(
                    OperationData::Using {
                        resources: Box::new(resources),
                        body: Box::new(body_op),
                    },
                    span,
                    sk,
                )
            }),

            StmtKind::Fixed { declaration, body } => self.scoped(|ctx| {
                let declaration_op = ctx.lower_declaration_group(
                    declaration,
                    span,
                    "VariableDeclarationGroup",
                );
                let body_op = ctx.lower_stmt(body);
                Operation::statement(
                    OperationData::Fixed {
                        declaration: Box::new(declaration_op),
                        body: Box::new(body_op),
                    },
                    span,
                    sk,
                )
            }),

            StmtKind::Missing => Operation::invalid_leaf(span, sk),
        }
    }

    // =========================================================================
    // Expression statements
    // =========================================================================

    fn lower_expression_statement(
        &mut self,
        e: &ExprSyntax,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let op = self.lower_expr(e);
        let legal = matches!(
            op.data,
            OperationData::SimpleAssignment { .. }
                | OperationData::CompoundAssignment { .. }
                | OperationData::EventAssignment { .. }
                | OperationData::Invocation { .. }
                | OperationData::DynamicInvocation { .. }
                | OperationData::IncrementOrDecrement { .. }
                | OperationData::ObjectCreation { .. }
                | OperationData::Invalid { .. }
        );
        if !legal {
            self.error(codes::ILLEGAL_STATEMENT, span, vec![]);
        }
        let node = Operation::statement(
            OperationData::ExpressionStatement {
                expression: Box::new(op),
            },
            span,
            sk,
        );
        if legal { node } else { node.invalid() }
    }

    // =========================================================================
    // If
    // =========================================================================

    fn lower_if(
        &mut self,
        condition: &ExprSyntax,
        then_branch: &StmtSyntax,
        else_branch: Option<&StmtSyntax>,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let condition_op = self.lower_condition_expr(condition);
        let pattern_locals = std::mem::take(&mut self.pending_pattern_locals);

        // `if (!(x is T t)) return;` leaves `t` usable for the rest of the
        // enclosing block; the plain pattern scopes to the then branch.
        let negated_pattern = matches!(
            &condition.kind,
            ExprKind::Unary {
                op: UnaryOp::LogicalNot,
                operand,
            } if matches!(operand.kind, ExprKind::IsPattern { .. })
        );

        let then_op = if negated_pattern {
            for (name, ty) in &pattern_locals {
                self.insert_local(name, *ty, None);
            }
            self.scoped(|ctx| ctx.lower_stmt(then_branch))
        } else {
            self.scoped_with(&pattern_locals, |ctx| ctx.lower_stmt(then_branch))
        };
        // A missing condition never aborts the branches; the else side is
        // lowered independently of everything above.
        let else_op = else_branch.map(|s| self.scoped(|ctx| ctx.lower_stmt(s)));

        Operation::statement(
            OperationData::If {
                condition: Box::new(condition_op),
                when_true: Box::new(then_op),
                when_false: else_op.map(Box::new),
            },
            span,
            sk,
        )
    }

    /// A condition slot: missing syntax becomes a minimal invalid leaf,
    /// anything else goes through boolean-context lowering.
    fn lower_condition_expr(&mut self, condition: &ExprSyntax) -> Operation {
        if matches!(condition.kind, ExprKind::Missing) {
            self.error(
                codes::INVALID_EXPR_TERM,
                condition.span,
                vec![String::new()],
            );
            return Operation::invalid_leaf(condition.span, condition.syntax_kind());
        }
        self.lower_condition(condition)
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// One group node per declaration statement, one declaration per
    /// comma-separated declarator. A failed initializer marks its own
    /// declarator invalid and leaves the siblings alone.
    pub(crate) fn lower_declaration_group(
        &mut self,
        group: &DeclarationGroupSyntax,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let ty = group.ty;
        let declarations: Vec<Operation> = group
            .declarators
            .iter()
            .map(|declarator| {
                let mut const_violation = false;
                let mut const_value = None;
                let initializer = declarator.initializer.as_ref().map(|init| {
                    let value = self.lower_with_target(init, Some(ty));
                    if group.is_const {
                        match &value.constant {
                            Some(constant) => const_value = Some(constant.clone()),
                            None => {
                                self.error(
                                    codes::CONST_NOT_CONSTANT,
                                    declarator.span,
                                    vec![declarator.name.clone()],
                                );
                                const_violation = true;
                            }
                        }
                    }
                    let vspan = value.span;
                    let vsk = value.syntax_kind;
                    Operation::statement(
                        OperationData::VariableInitializer {
                            value: Box::new(value),
                        },
                        vspan,
                        vsk,
                    )
                });
                self.insert_local(&declarator.name, ty, const_value);
                let node = Operation::statement(
                    OperationData::VariableDeclaration {
                        name: declarator.name.clone(),
                        initializer: initializer.map(Box::new),
                    },
                    declarator.span,
                    "VariableDeclarator",
                );
                if const_violation { node.invalid() } else { node }
            })
            .collect();

        Operation::statement(OperationData::VariableDeclarationGroup { declarations }, span, sk)
    }
}
