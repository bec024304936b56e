//! Delegate and event binding.
//!
//! Delegate creation has three source forms: a lambda, a bare method
//! group, and an explicit delegate constructor. All three funnel into one
//! decision procedure that resolves the target against the delegate's
//! invoke signature and wraps the result in a `DelegateCreation` node,
//! implicit in assignment context and explicit under a cast or
//! constructor. Event `+=`/`-=` reuses the same procedure for its
//! right-hand side.
//!
//! Delegate types are nominal: two delegates with identical signatures
//! never convert, so a resolved creation of the wrong delegate type always
//! fails at the conversion step rather than by signature comparison.

use crate::context::LoweringContext;
use crate::expr::GroupResolution;
use crate::ops::{Operation, OperationData};
use opal_common::Span;
use opal_common::diagnostics::diagnostic_codes as codes;
use opal_facts::{MethodSig, OverloadResolution, SymbolId, SymbolKind, TypeId};
use opal_syntax::{ExprKind, ExprSyntax, LambdaBody};
use tracing::trace;

/// How the delegate target reached the resolver; decides whether the
/// `DelegateCreation` wrapper is implicit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum DelegateContext {
    /// Assignment or initializer position.
    Implicit,
    /// Explicit `(D)target` cast.
    Cast,
    /// Explicit `new D(target)` constructor.
    Constructor,
}

impl LoweringContext<'_> {
    /// Route a delegate-typed target position through the binding
    /// resolver. Returns `None` when the syntax is not a delegate-target
    /// form; the caller then lowers the value and lets conversion
    /// classification reject it.
    pub(crate) fn try_lower_delegate_value(
        &mut self,
        e: &ExprSyntax,
        delegate_ty: TypeId,
    ) -> Option<Operation> {
        match &e.kind {
            ExprKind::Lambda { .. } => {
                Some(self.delegate_from_lambda(e, delegate_ty, DelegateContext::Implicit))
            }
            ExprKind::Identifier(_) | ExprKind::MemberAccess { .. }
                if self.is_method_group_syntax(e) =>
            {
                Some(self.delegate_from_method_group(e, delegate_ty, DelegateContext::Implicit))
            }
            _ => None,
        }
    }

    /// `(D)target` for lambdas, method groups, and nested delegate
    /// constructions. Returns `None` for ordinary value casts.
    pub(crate) fn try_lower_delegate_cast(
        &mut self,
        operand: &ExprSyntax,
        delegate_ty: TypeId,
        span: Span,
        sk: &'static str,
    ) -> Option<Operation> {
        match &operand.kind {
            ExprKind::Lambda { .. } => {
                Some(self.delegate_from_lambda(operand, delegate_ty, DelegateContext::Cast))
            }
            ExprKind::Identifier(_) | ExprKind::MemberAccess { .. }
                if self.is_method_group_syntax(operand) =>
            {
                Some(self.delegate_from_method_group(operand, delegate_ty, DelegateContext::Cast))
            }
            // A cast around an explicit construction of the same delegate
            // type nests one creation inside another.
            ExprKind::ObjectCreation { ty, .. } if *ty == delegate_ty => {
                let inner = self.lower_expr(operand);
                Some(self.delegate_creation(
                    inner,
                    delegate_ty,
                    DelegateContext::Cast,
                    false,
                    span,
                    sk,
                ))
            }
            _ => None,
        }
    }

    /// `new D(target)`. More than one constructor argument never resolves;
    /// the arguments are still lowered independently so valid siblings
    /// survive.
    pub(crate) fn lower_delegate_constructor(
        &mut self,
        delegate_ty: TypeId,
        args: &[opal_syntax::ArgumentSyntax],
        span: Span,
        sk: &'static str,
    ) -> Operation {
        if args.len() != 1 {
            self.error(codes::METHOD_NAME_EXPECTED, span, vec![]);
            let children: Vec<Operation> =
                args.iter().map(|a| self.lower_expr(&a.value)).collect();
            return Operation::invalid_wrapping(children, span, sk);
        }
        let target = &args[0].value;
        match &target.kind {
            ExprKind::Lambda { .. } => {
                self.delegate_from_lambda(target, delegate_ty, DelegateContext::Constructor)
            }
            ExprKind::Identifier(_) | ExprKind::MemberAccess { .. }
                if self.is_method_group_syntax(target) =>
            {
                self.delegate_from_method_group(target, delegate_ty, DelegateContext::Constructor)
            }
            _ => {
                self.error(codes::METHOD_NAME_EXPECTED, target.span, vec![]);
                let value = self.lower_expr(target);
                Operation::invalid_wrapping(vec![value], span, sk)
            }
        }
    }

    /// Whether the expression is a method group rather than a value, as
    /// far as side-effect-free inspection can tell.
    fn is_method_group_syntax(&self, e: &ExprSyntax) -> bool {
        match &e.kind {
            ExprKind::Identifier(name) => {
                if self.lookup_local(name).is_some() || self.lookup_parameter(name).is_some() {
                    return false;
                }
                self.container.is_some_and(|container| {
                    self.facts
                        .resolve_name(container, name)
                        .iter()
                        .any(|&id| self.facts.symbol(id).kind == SymbolKind::Method)
                })
            }
            ExprKind::MemberAccess { receiver, member } => {
                let scope = self
                    .type_name_receiver(receiver)
                    .or_else(|| self.static_type_of(receiver));
                scope.is_some_and(|scope| {
                    self.facts
                        .resolve_name(scope, member)
                        .iter()
                        .any(|&id| self.facts.symbol(id).kind == SymbolKind::Method)
                })
            }
            _ => false,
        }
    }

    // =========================================================================
    // The decision procedure
    // =========================================================================

    fn delegate_from_method_group(
        &mut self,
        callee: &ExprSyntax,
        delegate_ty: TypeId,
        context: DelegateContext,
    ) -> Operation {
        let span = callee.span;
        let sk = callee.syntax_kind();
        let Some(sig) = self.table().delegate_sig(delegate_ty).cloned() else {
            return Operation::invalid_leaf(span, sk);
        };

        match self.resolve_group(callee) {
            // Unresolved name: no creation wrapper exists to build.
            GroupResolution::Failed { node } => node,
            GroupResolution::Dynamic { receiver } => {
                let member = match &callee.kind {
                    ExprKind::MemberAccess { member, .. } => member.clone(),
                    ExprKind::Identifier(name) => name.clone(),
                    _ => String::new(),
                };
                let target = Operation::new(
                    OperationData::DynamicMemberReference {
                        member,
                        receiver: receiver.map(Box::new),
                    },
                    Some(TypeId::DYNAMIC),
                    span,
                    sk,
                );
                self.delegate_creation(target, delegate_ty, context, false, span, sk)
            }
            GroupResolution::Group {
                receiver,
                name,
                candidates,
                via_instance,
                via_type,
            } => {
                trace!(group = %name, delegate = %self.type_name(delegate_ty), "delegate binding");
                match self.facts.resolve_overload(&candidates, &sig.params) {
                    OverloadResolution::Best(method) => self.bound_method_target(
                        method,
                        &sig,
                        receiver,
                        via_instance,
                        via_type,
                        delegate_ty,
                        context,
                        false,
                        span,
                        sk,
                    ),
                    OverloadResolution::Ambiguous(a, b) => {
                        let (da, db) = {
                            let table = self.table();
                            (
                                self.facts.symbol(a).display(table),
                                self.facts.symbol(b).display(table),
                            )
                        };
                        self.error(codes::AMBIGUOUS_CALL, span, vec![da, db]);
                        self.bound_method_target(
                            a,
                            &sig,
                            receiver,
                            via_instance,
                            via_type,
                            delegate_ty,
                            context,
                            true,
                            span,
                            sk,
                        )
                    }
                    OverloadResolution::NoMatch => {
                        // No applicable overload: the method symbol is not
                        // attachable, so only the receiver survives inside
                        // a structurally untyped node.
                        self.error(
                            codes::NO_OVERLOAD_MATCHES_DELEGATE,
                            span,
                            vec![name, self.type_name(delegate_ty)],
                        );
                        let mut children: Vec<Operation> = Vec::new();
                        if let Some(receiver) = receiver {
                            children.push(receiver);
                        } else if !via_type && !self.container_is_static {
                            children.push(self.instance_reference(span));
                        }
                        let none_node =
                            Operation::new(OperationData::None { children }, None, span, sk);
                        self.delegate_creation(
                            none_node,
                            delegate_ty,
                            context,
                            true,
                            span,
                            sk,
                        )
                    }
                }
            }
        }
    }

    /// Wrap one resolved overload as a `MethodReference` target, applying
    /// the receiver and return-type checks.
    fn bound_method_target(
        &mut self,
        method: SymbolId,
        sig: &MethodSig,
        receiver: Option<Operation>,
        via_instance: bool,
        via_type: bool,
        delegate_ty: TypeId,
        context: DelegateContext,
        force_invalid: bool,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let info = self.facts.symbol(method).clone();
        let mut invalid = force_invalid;
        let mut receiver = receiver;
        if info.is_static {
            if via_instance && receiver.is_some() {
                self.error(
                    codes::STATIC_MEMBER_VIA_INSTANCE,
                    span,
                    vec![info.display(self.table())],
                );
                invalid = true;
            }
        } else if via_type || (receiver.is_none() && self.container_is_static) {
            self.error(
                codes::OBJECT_REQUIRED,
                span,
                vec![info.display(self.table())],
            );
            invalid = true;
        } else if receiver.is_none() {
            receiver = Some(self.instance_reference(span));
        }

        if info.ty != sig.ret {
            self.error(
                codes::WRONG_RETURN_TYPE,
                span,
                vec![info.display(self.table())],
            );
            invalid = true;
        }

        let mut target = Operation::new(
            OperationData::MethodReference {
                method,
                receiver: receiver.map(Box::new),
            },
            Some(info.ty),
            span,
            sk,
        );
        if invalid {
            target = target.invalid();
        }
        self.delegate_creation(target, delegate_ty, context, invalid, span, sk)
    }

    /// The `DelegateCreation` wrapper; implicit only in assignment context.
    fn delegate_creation(
        &self,
        target: Operation,
        delegate_ty: TypeId,
        context: DelegateContext,
        force_invalid: bool,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let mut node = Operation::new(
            OperationData::DelegateCreation {
                target: Box::new(target),
            },
            Some(delegate_ty),
            span,
            sk,
        );
        if context == DelegateContext::Implicit {
            node = node.implicit();
        }
        if force_invalid {
            node = node.invalid();
        }
        node
    }

    // =========================================================================
    // Lambdas
    // =========================================================================

    fn delegate_from_lambda(
        &mut self,
        e: &ExprSyntax,
        delegate_ty: TypeId,
        context: DelegateContext,
    ) -> Operation {
        let span = e.span;
        let sk = e.syntax_kind();
        let Some(sig) = self.table().delegate_sig(delegate_ty).cloned() else {
            return Operation::invalid_leaf(span, sk);
        };
        let ExprKind::Lambda { params, .. } = &e.kind else {
            return Operation::invalid_leaf(span, sk);
        };

        if params.len() != sig.params.len() {
            self.error(
                codes::BAD_DELEGATE_ARG_COUNT,
                span,
                vec![self.type_name(delegate_ty), params.len().to_string()],
            );
            let function = self.lower_lambda(e, None).invalid();
            return self.delegate_creation(function, delegate_ty, context, true, span, sk);
        }

        let function = self.lower_lambda(e, Some(&sig));
        let invalid = function.is_invalid;
        self.delegate_creation(function, delegate_ty, context, invalid, span, sk)
    }

    /// Lower a lambda to an `AnonymousFunction`. With a signature the
    /// parameters take the delegate's types and the body returns against
    /// the delegate's return type; without one, parameter annotations are
    /// all there is.
    pub(crate) fn lower_lambda(&mut self, e: &ExprSyntax, sig: Option<&MethodSig>) -> Operation {
        let span = e.span;
        let sk = e.syntax_kind();
        let ExprKind::Lambda { params, body } = &e.kind else {
            return Operation::invalid_leaf(span, sk);
        };

        let locals: Vec<(String, TypeId)> = params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let ty = sig
                    .and_then(|s| s.params.get(i).copied())
                    .or(p.ty)
                    .unwrap_or(TypeId::ERROR);
                (p.name.clone(), ty)
            })
            .collect();
        let ret = sig.map_or(TypeId::VOID, |s| s.ret);

        let body_op = self.scoped_with(&locals, |ctx| {
            ctx.with_return(ret, |ctx| match body {
                LambdaBody::Expression(expr) => {
                    let statement = if ret == TypeId::VOID {
                        let value = ctx.lower_expr(expr);
                        let vspan = value.span;
                        let vsk = value.syntax_kind;
                        Operation::statement(
                            OperationData::ExpressionStatement {
                                expression: Box::new(value),
                            },
                            vspan,
                            vsk,
                        )
                        .implicit()
                    } else {
                        let value = ctx.lower_with_target(expr, Some(ret));
                        let vspan = value.span;
                        let vsk = value.syntax_kind;
                        Operation::statement(
                            OperationData::Return {
                                value: Some(Box::new(value)),
                            },
                            vspan,
                            vsk,
                        )
                        .implicit()
                    };
                    Operation::statement(
                        OperationData::Block {
                            statements: vec![statement],
                        },
                        span,
                        sk,
                    )
                    .implicit()
                }
                LambdaBody::Block(statements) => {
                    let stmts: Vec<Operation> = statements
                        .iter()
                        .map(|s| ctx.lower_stmt(s))
                        .collect();
                    Operation::statement(OperationData::Block { statements: stmts }, span, sk)
                }
            })
        });

        Operation::new(
            OperationData::AnonymousFunction {
                body: Box::new(body_op),
            },
            None,
            span,
            sk,
        )
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// `event += handler` / `event -= handler`. Receiver-shape errors on
    /// the event reference were already diagnosed while lowering it, so
    /// they co-occur with any handler-resolution failure here.
    pub(crate) fn lower_event_assignment(
        &mut self,
        event_op: Operation,
        value: &ExprSyntax,
        adds: bool,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let event_ty = event_op.result_type.unwrap_or(TypeId::ERROR);
        let handler = if event_ty == TypeId::ERROR {
            self.lower_expr(value)
        } else {
            self.lower_with_target(value, Some(event_ty))
        };
        Operation::new(
            OperationData::EventAssignment {
                adds,
                event: Box::new(event_op),
                handler: Box::new(handler),
            },
            Some(TypeId::VOID),
            span,
            sk,
        )
    }
}
