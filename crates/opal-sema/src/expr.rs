//! Expression lowering.
//!
//! Converts a typed expression syntax node into an operation node,
//! inserting implicit conversion nodes, resolving operator overloads
//! (built-in, user-defined, lifted, dynamic), and marking invalid nodes
//! when resolution fails. Resolution failure never drops a subtree: the
//! best-available shape is emitted, flagged invalid, with exactly one
//! diagnostic describing the mismatch.

use crate::context::LoweringContext;
use crate::ops::{Operation, OperationData, OperatorInfo};
use opal_common::Span;
use opal_common::diagnostics::diagnostic_codes as codes;
use opal_facts::{
    ConstValue, Conversion, OperatorKind, OverloadResolution, SymbolId, SymbolKind, TypeId,
    binary_builtin, is_numeric, unary_builtin,
};
use opal_syntax::{ArgMode, ArgumentSyntax, BinaryOp, ExprKind, ExprSyntax, UnaryOp};
use smallvec::SmallVec;
use tracing::trace;

/// Argument type lists stay inline for the call arities that dominate.
pub(crate) type ArgTypes = SmallVec<[TypeId; 4]>;

pub(crate) fn unary_kind(op: UnaryOp) -> OperatorKind {
    match op {
        UnaryOp::Plus => OperatorKind::Plus,
        UnaryOp::Minus => OperatorKind::Minus,
        UnaryOp::LogicalNot => OperatorKind::LogicalNot,
        UnaryOp::BitwiseNot => OperatorKind::BitwiseNot,
    }
}

pub(crate) fn binary_kind(op: BinaryOp) -> OperatorKind {
    match op {
        BinaryOp::Add => OperatorKind::Add,
        BinaryOp::Subtract => OperatorKind::Subtract,
        BinaryOp::Multiply => OperatorKind::Multiply,
        BinaryOp::Divide => OperatorKind::Divide,
        BinaryOp::Remainder => OperatorKind::Remainder,
        BinaryOp::BitwiseAnd => OperatorKind::BitwiseAnd,
        BinaryOp::BitwiseOr => OperatorKind::BitwiseOr,
        BinaryOp::ExclusiveOr => OperatorKind::ExclusiveOr,
        BinaryOp::LeftShift => OperatorKind::LeftShift,
        BinaryOp::RightShift => OperatorKind::RightShift,
        BinaryOp::ConditionalAnd => OperatorKind::ConditionalAnd,
        BinaryOp::ConditionalOr => OperatorKind::ConditionalOr,
        BinaryOp::Equals => OperatorKind::Equals,
        BinaryOp::NotEquals => OperatorKind::NotEquals,
        BinaryOp::LessThan => OperatorKind::LessThan,
        BinaryOp::GreaterThan => OperatorKind::GreaterThan,
        BinaryOp::LessThanOrEqual => OperatorKind::LessThanOrEqual,
        BinaryOp::GreaterThanOrEqual => OperatorKind::GreaterThanOrEqual,
    }
}

/// Where a resolved method group came from, for invocation and delegate
/// binding.
pub(crate) enum GroupResolution {
    Group {
        /// Lowered receiver operation; `None` for bare identifiers and
        /// type-qualified access.
        receiver: Option<Operation>,
        name: String,
        candidates: Vec<SymbolId>,
        /// Accessed through an instance-valued receiver expression.
        via_instance: bool,
        /// Accessed through a type name.
        via_type: bool,
    },
    /// The receiver was dynamic; static resolution does not apply.
    Dynamic { receiver: Option<Operation> },
    /// Resolution already failed with a diagnostic; the node preserves
    /// whatever subtrees survived.
    Failed { node: Operation },
}

impl LoweringContext<'_> {
    /// Lower a free-standing expression.
    pub(crate) fn lower_expr(&mut self, e: &ExprSyntax) -> Operation {
        let span = e.span;
        let sk = e.syntax_kind();
        match &e.kind {
            ExprKind::Literal(value) => Operation::new(
                OperationData::Literal,
                Some(value.natural_type()),
                span,
                sk,
            )
            .with_constant(value.clone()),

            ExprKind::Identifier(name) => self.lower_identifier(name, span, sk),
            ExprKind::MemberAccess { receiver, member } => {
                self.lower_member_access(receiver, member, span, sk)
            }
            ExprKind::Invocation { callee, args } => self.lower_invocation(callee, args, span, sk),
            ExprKind::Unary { op, operand } => self.lower_unary(*op, operand, span, sk),
            ExprKind::Binary { op, left, right } => self.lower_binary(*op, left, right, span, sk),
            ExprKind::IncrementOrDecrement {
                target,
                is_increment,
                is_postfix,
            } => self.lower_increment(target, *is_increment, *is_postfix, span, sk),
            ExprKind::Assignment { target, value } => {
                self.lower_assignment(target, value, span, sk)
            }
            ExprKind::CompoundAssignment { op, target, value } => {
                self.lower_compound_assignment(*op, target, value, span, sk)
            }
            ExprKind::Cast { ty, operand } => self.lower_cast(*ty, operand, span, sk),
            ExprKind::ObjectCreation { ty, args } => {
                self.lower_object_creation(*ty, args, span, sk)
            }
            ExprKind::Lambda { .. } => self.lower_lambda(e, None),
            ExprKind::IsPattern { operand, pattern } => {
                self.lower_is_pattern(operand, pattern, span, sk)
            }
            ExprKind::InterpolatedString { parts } => {
                self.lower_interpolated_string(parts, span, sk)
            }
            ExprKind::Missing => {
                self.error(codes::INVALID_EXPR_TERM, span, vec![String::new()]);
                Operation::invalid_leaf(span, sk)
            }
        }
    }

    /// Lower with an ambient target type, inserting the implicit
    /// conversion the target demands. Delegate-typed targets route
    /// lambdas, method groups, and delegate constructors through the
    /// delegate binding resolver first.
    pub(crate) fn lower_with_target(
        &mut self,
        e: &ExprSyntax,
        target: Option<TypeId>,
    ) -> Operation {
        if let Some(ty) = target {
            if self.table().is_delegate(ty) {
                if let Some(op) = self.try_lower_delegate_value(e, ty) {
                    return op;
                }
            }
            let op = self.lower_expr(e);
            self.coerce_to(op, ty, e.span)
        } else {
            self.lower_expr(e)
        }
    }

    /// Insert the implicit conversion from `op`'s type to `target`.
    ///
    /// Identity conversions leave the node untouched. A conversion that
    /// exists but requires a cast, or does not exist at all, wraps the
    /// node in an invalid `Conversion` and emits one diagnostic.
    pub(crate) fn coerce_to(&mut self, op: Operation, target: TypeId, span: Span) -> Operation {
        let Some(from) = op.result_type else {
            // Structurally untyped value in a typed position.
            self.error(
                codes::NO_IMPLICIT_CONV,
                span,
                vec!["?".to_string(), self.type_name(target)],
            );
            return self.conversion_node(op, target, Conversion::none(), true, true);
        };
        let conv = self.facts.classify_conversion(from, target);
        if conv.is_identity() {
            return op;
        }
        if conv.is_implicit() {
            return self.conversion_node(op, target, conv, true, false);
        }
        if conv.exists {
            self.error(
                codes::IMPLICIT_CONV_NEEDS_CAST,
                span,
                vec![self.type_name(from), self.type_name(target)],
            );
        } else {
            self.error(
                codes::NO_IMPLICIT_CONV,
                span,
                vec![self.type_name(from), self.type_name(target)],
            );
        }
        self.conversion_node(op, target, conv, true, true)
    }

    /// Build a conversion node around `op`.
    pub(crate) fn conversion_node(
        &self,
        op: Operation,
        target: TypeId,
        conversion: Conversion,
        implicit: bool,
        force_invalid: bool,
    ) -> Operation {
        let span = op.span;
        let sk = op.syntax_kind;
        let constant = if conversion.is_identity() {
            op.constant.clone()
        } else {
            None
        };
        let mut node = Operation::new(
            OperationData::Conversion {
                conversion,
                operand: Box::new(op),
            },
            Some(target),
            span,
            sk,
        )
        .with_constant_opt(constant);
        if implicit {
            node = node.implicit();
        }
        if force_invalid {
            node = node.invalid();
        }
        node
    }

    // =========================================================================
    // Names and members
    // =========================================================================

    fn lower_identifier(&mut self, name: &str, span: Span, sk: &'static str) -> Operation {
        if let Some(local) = self.lookup_local(name) {
            let ty = local.ty;
            let constant = local.constant.clone();
            return Operation::new(
                OperationData::LocalReference {
                    name: name.to_string(),
                },
                Some(ty),
                span,
                sk,
            )
            .with_constant_opt(constant);
        }
        if let Some(ty) = self.lookup_parameter(name) {
            return Operation::new(
                OperationData::ParameterReference {
                    name: name.to_string(),
                },
                Some(ty),
                span,
                sk,
            );
        }
        if let Some(container) = self.container {
            let candidates = self.facts.resolve_name(container, name);
            if let Some(&first) = candidates.first() {
                return self.member_reference_node(first, None, false, span, sk);
            }
        }
        if self.table().find_by_name(name).is_some() {
            // A bare type name is not a value.
            self.error(codes::INVALID_EXPR_TERM, span, vec![name.to_string()]);
            return Operation::invalid_leaf(span, sk);
        }
        self.error(codes::NAME_NOT_IN_CONTEXT, span, vec![name.to_string()]);
        Operation::invalid_leaf(span, sk)
    }

    fn lower_member_access(
        &mut self,
        receiver: &ExprSyntax,
        member: &str,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        // Type-qualified access: the receiver identifier names a type, not
        // a value.
        if let Some(ty) = self.type_name_receiver(receiver) {
            let candidates = self.facts.resolve_name(ty, member);
            if let Some(&first) = candidates.first() {
                return self.member_reference_node(first, None, true, span, sk);
            }
            self.error(
                codes::NO_SUCH_MEMBER,
                span,
                vec![self.type_name(ty), member.to_string()],
            );
            return Operation::invalid_leaf(span, sk);
        }

        let receiver_op = self.lower_expr(receiver);
        let rty = receiver_op.result_type.unwrap_or(TypeId::ERROR);
        if rty == TypeId::DYNAMIC {
            return Operation::new(
                OperationData::DynamicMemberReference {
                    member: member.to_string(),
                    receiver: Some(Box::new(receiver_op)),
                },
                Some(TypeId::DYNAMIC),
                span,
                sk,
            );
        }
        if rty == TypeId::ERROR {
            // Cascade suppression: the receiver already carried a diagnostic.
            return Operation::invalid_wrapping(vec![receiver_op], span, sk);
        }
        let candidates = self.facts.resolve_name(rty, member);
        if let Some(&first) = candidates.first() {
            return self.instance_member_node(first, receiver_op, span, sk);
        }
        self.error(
            codes::NO_SUCH_MEMBER,
            span,
            vec![self.type_name(rty), member.to_string()],
        );
        Operation::invalid_wrapping(vec![receiver_op], span, sk)
    }

    /// A field/event/method reference accessed bare or through a type name.
    fn member_reference_node(
        &mut self,
        id: SymbolId,
        receiver: Option<Operation>,
        via_type: bool,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let info = self.facts.symbol(id).clone();
        let mut invalid = false;
        let mut receiver = receiver;
        if !info.is_static {
            if via_type || self.container_is_static {
                self.error(
                    codes::OBJECT_REQUIRED,
                    span,
                    vec![info.display(self.table())],
                );
                invalid = true;
            } else if receiver.is_none() {
                receiver = Some(self.instance_reference(span));
            }
        }
        let data = match info.kind {
            SymbolKind::Field => OperationData::FieldReference {
                field: id,
                receiver: receiver.map(Box::new),
            },
            SymbolKind::Event => OperationData::EventReference {
                event: id,
                receiver: receiver.map(Box::new),
            },
            _ => {
                // A method group has no value by itself.
                self.error(codes::METHOD_NAME_EXPECTED, span, vec![]);
                return Operation::invalid_leaf(span, sk);
            }
        };
        let node = Operation::new(data, Some(info.ty), span, sk);
        if invalid { node.invalid() } else { node }
    }

    /// A field/event/method reference accessed through an instance
    /// receiver expression.
    fn instance_member_node(
        &mut self,
        id: SymbolId,
        receiver_op: Operation,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let info = self.facts.symbol(id).clone();
        let mut invalid = false;
        if info.is_static {
            self.error(
                codes::STATIC_MEMBER_VIA_INSTANCE,
                span,
                vec![info.display(self.table())],
            );
            invalid = true;
        }
        let data = match info.kind {
            SymbolKind::Field => OperationData::FieldReference {
                field: id,
                receiver: Some(Box::new(receiver_op)),
            },
            SymbolKind::Event => OperationData::EventReference {
                event: id,
                receiver: Some(Box::new(receiver_op)),
            },
            _ => {
                self.error(codes::METHOD_NAME_EXPECTED, span, vec![]);
                return Operation::invalid_wrapping(vec![receiver_op], span, sk);
            }
        };
        let node = Operation::new(data, Some(info.ty), span, sk);
        if invalid { node.invalid() } else { node }
    }

    /// The implicit `this` receiver of the enclosing container.
    pub(crate) fn instance_reference(&self, span: Span) -> Operation {
        Operation::new(
            OperationData::InstanceReference,
            self.container,
            span,
            "ThisExpression",
        )
        .implicit()
    }

    /// The type an identifier receiver names, when it is a type and not a
    /// value in scope.
    pub(crate) fn type_name_receiver(&self, receiver: &ExprSyntax) -> Option<TypeId> {
        match &receiver.kind {
            ExprKind::Identifier(name)
                if self.lookup_local(name).is_none() && self.lookup_parameter(name).is_none() =>
            {
                self.table().find_by_name(name)
            }
            _ => None,
        }
    }

    /// Side-effect-free static type of simple receivers, used for
    /// method-group detection before lowering commits to a path.
    pub(crate) fn static_type_of(&self, e: &ExprSyntax) -> Option<TypeId> {
        match &e.kind {
            ExprKind::Literal(value) => Some(value.natural_type()),
            ExprKind::Identifier(name) => self
                .lookup_local(name)
                .map(|l| l.ty)
                .or_else(|| self.lookup_parameter(name)),
            _ => None,
        }
    }

    // =========================================================================
    // Invocation
    // =========================================================================

    /// Resolve a callee expression to a method group, without committing
    /// to an overload.
    pub(crate) fn resolve_group(&mut self, callee: &ExprSyntax) -> GroupResolution {
        let span = callee.span;
        let sk = callee.syntax_kind();
        match &callee.kind {
            ExprKind::Identifier(name) => {
                if self.lookup_local(name).is_some() || self.lookup_parameter(name).is_some() {
                    // Locals and parameters are values, not method groups.
                    self.error(codes::METHOD_NAME_EXPECTED, span, vec![]);
                    let reference = self.lower_expr(callee);
                    return GroupResolution::Failed {
                        node: Operation::invalid_wrapping(vec![reference], span, sk),
                    };
                }
                if let Some(container) = self.container {
                    let candidates: Vec<SymbolId> = self
                        .facts
                        .resolve_name(container, name)
                        .into_iter()
                        .filter(|&id| self.facts.symbol(id).kind == SymbolKind::Method)
                        .collect();
                    if !candidates.is_empty() {
                        return GroupResolution::Group {
                            receiver: None,
                            name: name.clone(),
                            candidates,
                            via_instance: false,
                            via_type: false,
                        };
                    }
                }
                self.error(codes::NAME_NOT_IN_CONTEXT, span, vec![name.clone()]);
                GroupResolution::Failed {
                    node: Operation::invalid_leaf(span, sk),
                }
            }
            ExprKind::MemberAccess { receiver, member } => {
                if let Some(ty) = self.type_name_receiver(receiver) {
                    return self.member_group(None, ty, member, true, span, sk);
                }
                let receiver_op = self.lower_expr(receiver);
                let rty = receiver_op.result_type.unwrap_or(TypeId::ERROR);
                if rty == TypeId::DYNAMIC {
                    return GroupResolution::Dynamic {
                        receiver: Some(receiver_op),
                    };
                }
                if rty == TypeId::ERROR {
                    return GroupResolution::Failed {
                        node: Operation::invalid_wrapping(vec![receiver_op], span, sk),
                    };
                }
                self.member_group(Some(receiver_op), rty, member, false, span, sk)
            }
            _ => {
                self.error(codes::METHOD_NAME_EXPECTED, span, vec![]);
                let value = self.lower_expr(callee);
                GroupResolution::Failed {
                    node: Operation::invalid_wrapping(vec![value], span, sk),
                }
            }
        }
    }

    fn member_group(
        &mut self,
        receiver: Option<Operation>,
        scope: TypeId,
        member: &str,
        via_type: bool,
        span: Span,
        sk: &'static str,
    ) -> GroupResolution {
        let candidates: Vec<SymbolId> = self
            .facts
            .resolve_name(scope, member)
            .into_iter()
            .filter(|&id| self.facts.symbol(id).kind == SymbolKind::Method)
            .collect();
        if candidates.is_empty() {
            self.error(
                codes::NO_SUCH_MEMBER,
                span,
                vec![self.type_name(scope), member.to_string()],
            );
            let children = receiver.into_iter().collect();
            return GroupResolution::Failed {
                node: Operation::invalid_wrapping(children, span, sk),
            };
        }
        GroupResolution::Group {
            receiver,
            name: member.to_string(),
            candidates,
            via_instance: !via_type,
            via_type,
        }
    }

    fn lower_invocation(
        &mut self,
        callee: &ExprSyntax,
        args: &[ArgumentSyntax],
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let group = self.resolve_group(callee);
        let arg_ops: Vec<Operation> = args.iter().map(|a| self.lower_expr(&a.value)).collect();
        let arg_types: ArgTypes = arg_ops
            .iter()
            .map(|a| a.result_type.unwrap_or(TypeId::ERROR))
            .collect();

        match group {
            GroupResolution::Dynamic { receiver } => {
                self.dynamic_invocation(callee, receiver, args, arg_ops, span, sk)
            }
            GroupResolution::Failed { mut node } => {
                // Preserve the argument subtrees alongside the failed callee.
                if let OperationData::Invalid { children } = &mut node.data {
                    children.extend(arg_ops);
                }
                Operation::new(node.data, node.result_type, span, sk)
            }
            GroupResolution::Group {
                receiver,
                name,
                candidates,
                via_instance,
                via_type,
            } => {
                if arg_types.contains(&TypeId::DYNAMIC) {
                    return self.dynamic_invocation(callee, receiver, args, arg_ops, span, sk);
                }
                match self.facts.resolve_overload(&candidates, &arg_types) {
                    OverloadResolution::Best(method) => self.checked_invocation(
                        method,
                        receiver,
                        via_instance,
                        via_type,
                        args,
                        arg_ops,
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
                        self.checked_invocation(
                            a,
                            receiver,
                            via_instance,
                            via_type,
                            args,
                            arg_ops,
                            true,
                            span,
                            sk,
                        )
                    }
                    OverloadResolution::NoMatch => {
                        self.no_match_diagnostic(&name, &candidates, &arg_types, span);
                        let mut children: Vec<Operation> = receiver.into_iter().collect();
                        children.extend(arg_ops);
                        Operation::invalid_wrapping(children, span, sk)
                    }
                }
            }
        }
    }

    /// Emit the arity or argument-type diagnostic for a failed overload
    /// set: arity mismatch when no candidate takes this many arguments,
    /// otherwise the first inconvertible argument of the first
    /// arity-matching candidate.
    pub(crate) fn no_match_diagnostic(
        &mut self,
        name: &str,
        candidates: &[SymbolId],
        arg_types: &[TypeId],
        span: Span,
    ) {
        let arity_match = candidates
            .iter()
            .find(|&&id| self.facts.symbol(id).params.len() == arg_types.len())
            .copied();
        match arity_match {
            None => {
                self.error(
                    codes::BAD_ARG_COUNT,
                    span,
                    vec![name.to_string(), arg_types.len().to_string()],
                );
            }
            Some(candidate) => {
                let params = self.facts.symbol(candidate).params.clone();
                for (index, (&arg, &param)) in arg_types.iter().zip(params.iter()).enumerate() {
                    if !self.facts.classify_conversion(arg, param).is_implicit() {
                        self.error(
                            codes::BAD_ARG_TYPE,
                            span,
                            vec![
                                (index + 1).to_string(),
                                self.type_name(arg),
                                self.type_name(param),
                            ],
                        );
                        return;
                    }
                }
                // Applicability failed for a reason the per-argument scan
                // cannot see; fall back to the arity message.
                self.error(
                    codes::BAD_ARG_COUNT,
                    span,
                    vec![name.to_string(), arg_types.len().to_string()],
                );
            }
        }
    }

    fn checked_invocation(
        &mut self,
        method: SymbolId,
        receiver: Option<Operation>,
        via_instance: bool,
        via_type: bool,
        args: &[ArgumentSyntax],
        arg_ops: Vec<Operation>,
        force_invalid: bool,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let info = self.facts.symbol(method).clone();
        trace!(method = %info.name, args = arg_ops.len(), "invocation resolved");
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

        let arguments = self.argument_nodes(args, arg_ops, &info.params);
        let node = Operation::new(
            OperationData::Invocation {
                method,
                receiver: receiver.map(Box::new),
                arguments,
            },
            Some(info.ty),
            span,
            sk,
        );
        if invalid { node.invalid() } else { node }
    }

    /// One `Argument` node per parameter, with conversions recorded in
    /// both directions.
    fn argument_nodes(
        &mut self,
        args: &[ArgumentSyntax],
        arg_ops: Vec<Operation>,
        params: &[TypeId],
    ) -> Vec<Operation> {
        arg_ops
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let mode = args.get(i).map_or(ArgMode::Value, |a| a.mode);
                let arg_ty = value.result_type.unwrap_or(TypeId::ERROR);
                let param = params.get(i).copied().unwrap_or(TypeId::ERROR);
                let (in_conversion, out_conversion) = match mode {
                    ArgMode::Value => (
                        self.facts.classify_conversion(arg_ty, param),
                        Conversion::identity(),
                    ),
                    ArgMode::Ref => (
                        self.facts.classify_conversion(arg_ty, param),
                        self.facts.classify_conversion(param, arg_ty),
                    ),
                    ArgMode::Out => (
                        Conversion::identity(),
                        self.facts.classify_conversion(param, arg_ty),
                    ),
                };
                let span = value.span;
                let sk = value.syntax_kind;
                Operation::new(
                    OperationData::Argument {
                        mode,
                        in_conversion,
                        out_conversion,
                        value: Box::new(value),
                    },
                    Some(param),
                    span,
                    sk,
                )
                .implicit()
            })
            .collect()
    }

    fn dynamic_invocation(
        &mut self,
        callee: &ExprSyntax,
        receiver: Option<Operation>,
        args: &[ArgumentSyntax],
        arg_ops: Vec<Operation>,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let member = match &callee.kind {
            ExprKind::Identifier(name) => name.clone(),
            ExprKind::MemberAccess { member, .. } => member.clone(),
            _ => String::new(),
        };
        let callee_op = Operation::new(
            OperationData::DynamicMemberReference {
                member,
                receiver: receiver.map(Box::new),
            },
            Some(TypeId::DYNAMIC),
            callee.span,
            callee.syntax_kind(),
        );
        let arguments: Vec<Operation> = arg_ops
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let mode = args.get(i).map_or(ArgMode::Value, |a| a.mode);
                let span = value.span;
                let vsk = value.syntax_kind;
                Operation::new(
                    OperationData::Argument {
                        mode,
                        in_conversion: Conversion::identity(),
                        out_conversion: Conversion::identity(),
                        value: Box::new(value),
                    },
                    Some(TypeId::DYNAMIC),
                    span,
                    vsk,
                )
                .implicit()
            })
            .collect();
        // Dynamic binding cannot fail at this stage.
        Operation::new(
            OperationData::DynamicInvocation {
                callee: Box::new(callee_op),
                arguments,
            },
            Some(TypeId::DYNAMIC),
            span,
            sk,
        )
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn lower_unary(
        &mut self,
        op: UnaryOp,
        operand: &ExprSyntax,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let kind = unary_kind(op);
        let operand_op = self.lower_expr(operand);
        let ty = operand_op.result_type.unwrap_or(TypeId::ERROR);

        if ty == TypeId::DYNAMIC {
            return Operation::new(
                OperationData::UnaryOperator {
                    op: kind,
                    info: OperatorInfo::dynamic(),
                    operand: Box::new(operand_op),
                },
                Some(TypeId::DYNAMIC),
                span,
                sk,
            );
        }
        if ty == TypeId::ERROR {
            return Operation::new(
                OperationData::UnaryOperator {
                    op: kind,
                    info: OperatorInfo::builtin(),
                    operand: Box::new(operand_op),
                },
                Some(TypeId::ERROR),
                span,
                sk,
            );
        }

        if let Some(builtin) = unary_builtin(kind, ty) {
            return match builtin.promote_to {
                Some(promoted) => {
                    // Types narrower than the default operator width have no
                    // direct operator; the promotion conversion is
                    // materialized and the whole application is invalid.
                    self.error(
                        codes::BAD_UNARY_OP,
                        span,
                        vec![kind.token().to_string(), self.type_name(ty)],
                    );
                    let conv = self.facts.classify_conversion(ty, promoted);
                    let converted =
                        self.conversion_node(operand_op, promoted, conv, true, true);
                    Operation::new(
                        OperationData::UnaryOperator {
                            op: kind,
                            info: OperatorInfo::builtin(),
                            operand: Box::new(converted),
                        },
                        Some(builtin.result),
                        span,
                        sk,
                    )
                }
                None => {
                    let constant = operand_op
                        .constant
                        .as_ref()
                        .and_then(|c| fold_unary(kind, c));
                    Operation::new(
                        OperationData::UnaryOperator {
                            op: kind,
                            info: OperatorInfo::builtin(),
                            operand: Box::new(operand_op),
                        },
                        Some(builtin.result),
                        span,
                        sk,
                    )
                    .with_constant_opt(constant)
                }
            };
        }

        if let Some(method) = self.facts.lookup_operator(ty, kind) {
            let info = self.facts.symbol(method).clone();
            let param = info.params.first().copied().unwrap_or(ty);
            let conv = self.facts.classify_conversion(ty, param);
            let operand_op = if conv.is_identity() {
                operand_op
            } else {
                self.conversion_node(operand_op, param, conv, true, !conv.is_implicit())
            };
            return Operation::new(
                OperationData::UnaryOperator {
                    op: kind,
                    info: OperatorInfo::user_defined(method),
                    operand: Box::new(operand_op),
                },
                Some(info.ty),
                span,
                sk,
            );
        }

        // Lifted resolution: attempted only after direct resolution fails.
        if let Some(underlying) = self.table().nullable_underlying(ty) {
            if let Some(builtin) = unary_builtin(kind, underlying) {
                if builtin.promote_to.is_none() {
                    return Operation::new(
                        OperationData::UnaryOperator {
                            op: kind,
                            info: OperatorInfo::builtin().lifted(),
                            operand: Box::new(operand_op),
                        },
                        Some(self.lifted_result(builtin.result)),
                        span,
                        sk,
                    );
                }
            }
            if let Some(method) = self.facts.lookup_operator(underlying, kind) {
                let ret = self.facts.symbol(method).ty;
                return Operation::new(
                    OperationData::UnaryOperator {
                        op: kind,
                        info: OperatorInfo::user_defined(method).lifted(),
                        operand: Box::new(operand_op),
                    },
                    Some(self.lifted_result(ret)),
                    span,
                    sk,
                );
            }
        }

        self.error(
            codes::BAD_UNARY_OP,
            span,
            vec![kind.token().to_string(), self.type_name(ty)],
        );
        Operation::invalid_wrapping(vec![operand_op], span, sk)
    }

    /// The nullable wrapper of a lifted operator's result, when the table
    /// has one interned.
    fn lifted_result(&self, ty: TypeId) -> TypeId {
        if ty == TypeId::BOOL {
            // Lifted comparisons produce a plain bool.
            return ty;
        }
        self.table().existing_nullable(ty).unwrap_or(ty)
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: &ExprSyntax,
        right: &ExprSyntax,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let kind = binary_kind(op);
        let left_op = self.lower_expr(left);
        let right_op = self.lower_expr(right);
        let lt = left_op.result_type.unwrap_or(TypeId::ERROR);
        let rt = right_op.result_type.unwrap_or(TypeId::ERROR);

        // Dynamic operands bypass static resolution entirely.
        if lt == TypeId::DYNAMIC || rt == TypeId::DYNAMIC {
            return Operation::new(
                OperationData::BinaryOperator {
                    op: kind,
                    info: OperatorInfo::dynamic(),
                    left: Box::new(left_op),
                    right: Box::new(right_op),
                },
                Some(TypeId::DYNAMIC),
                span,
                sk,
            );
        }
        if lt == TypeId::ERROR || rt == TypeId::ERROR {
            return Operation::new(
                OperationData::BinaryOperator {
                    op: kind,
                    info: OperatorInfo::builtin(),
                    left: Box::new(left_op),
                    right: Box::new(right_op),
                },
                Some(TypeId::ERROR),
                span,
                sk,
            );
        }

        if let Some(bitwise) = kind.underlying_bitwise() {
            return self.lower_short_circuit(kind, bitwise, left_op, right_op, lt, rt, span, sk);
        }

        // Null-literal equality against references and nullables.
        if matches!(kind, OperatorKind::Equals | OperatorKind::NotEquals)
            && (lt == TypeId::NULL || rt == TypeId::NULL)
        {
            let other = if lt == TypeId::NULL { rt } else { lt };
            if other == TypeId::NULL
                || self.table().is_reference_type(other)
                || self.table().nullable_underlying(other).is_some()
            {
                return Operation::new(
                    OperationData::BinaryOperator {
                        op: kind,
                        info: OperatorInfo::builtin(),
                        left: Box::new(left_op),
                        right: Box::new(right_op),
                    },
                    Some(TypeId::BOOL),
                    span,
                    sk,
                );
            }
        }

        if let Some(builtin) = binary_builtin(kind, lt, rt) {
            let constant = match (&left_op.constant, &right_op.constant) {
                (Some(a), Some(b)) => fold_binary(kind, a, b),
                _ => None,
            };
            let left_op = match builtin.left_promote {
                Some(to) => {
                    let conv = self.facts.classify_conversion(lt, to);
                    self.conversion_node(left_op, to, conv, true, false)
                }
                None => left_op,
            };
            let right_op = match builtin.right_promote {
                Some(to) => {
                    let conv = self.facts.classify_conversion(rt, to);
                    self.conversion_node(right_op, to, conv, true, false)
                }
                None => right_op,
            };
            return Operation::new(
                OperationData::BinaryOperator {
                    op: kind,
                    info: OperatorInfo::builtin(),
                    left: Box::new(left_op),
                    right: Box::new(right_op),
                },
                Some(builtin.result),
                span,
                sk,
            )
            .with_constant_opt(constant);
        }

        if let Some(node) =
            self.user_defined_binary(kind, &left_op, &right_op, lt, rt, span, sk)
        {
            return node;
        }

        if let Some(node) = self.lifted_binary(kind, &left_op, &right_op, lt, rt, span, sk) {
            return node;
        }

        self.error(
            codes::BAD_BINARY_OPS,
            span,
            vec![
                kind.token().to_string(),
                self.type_name(lt),
                self.type_name(rt),
            ],
        );
        Operation::invalid_wrapping(vec![left_op, right_op], span, sk)
    }

    fn user_defined_binary(
        &mut self,
        kind: OperatorKind,
        left_op: &Operation,
        right_op: &Operation,
        lt: TypeId,
        rt: TypeId,
        span: Span,
        sk: &'static str,
    ) -> Option<Operation> {
        let method = self
            .facts
            .lookup_operator(lt, kind)
            .or_else(|| self.facts.lookup_operator(rt, kind))?;
        let info = self.facts.symbol(method).clone();
        if info.params.len() != 2 {
            return None;
        }
        let lconv = self.facts.classify_conversion(lt, info.params[0]);
        let rconv = self.facts.classify_conversion(rt, info.params[1]);
        if !lconv.is_implicit() || !rconv.is_implicit() {
            return None;
        }
        let left_op = if lconv.is_identity() {
            left_op.clone()
        } else {
            self.conversion_node(left_op.clone(), info.params[0], lconv, true, false)
        };
        let right_op = if rconv.is_identity() {
            right_op.clone()
        } else {
            self.conversion_node(right_op.clone(), info.params[1], rconv, true, false)
        };
        Some(Operation::new(
            OperationData::BinaryOperator {
                op: kind,
                info: OperatorInfo::user_defined(method),
                left: Box::new(left_op),
                right: Box::new(right_op),
            },
            Some(info.ty),
            span,
            sk,
        ))
    }

    fn lifted_binary(
        &mut self,
        kind: OperatorKind,
        left_op: &Operation,
        right_op: &Operation,
        lt: TypeId,
        rt: TypeId,
        span: Span,
        sk: &'static str,
    ) -> Option<Operation> {
        let lu = self.table().nullable_underlying(lt);
        let ru = self.table().nullable_underlying(rt);
        if lu.is_none() && ru.is_none() {
            return None;
        }
        let lu = lu.unwrap_or(lt);
        let ru = ru.unwrap_or(rt);
        if let Some(builtin) = binary_builtin(kind, lu, ru) {
            return Some(Operation::new(
                OperationData::BinaryOperator {
                    op: kind,
                    info: OperatorInfo::builtin().lifted(),
                    left: Box::new(left_op.clone()),
                    right: Box::new(right_op.clone()),
                },
                Some(self.lifted_result(builtin.result)),
                span,
                sk,
            ));
        }
        let method = self
            .facts
            .lookup_operator(lu, kind)
            .or_else(|| self.facts.lookup_operator(ru, kind))?;
        let ret = self.facts.symbol(method).ty;
        Some(Operation::new(
            OperationData::BinaryOperator {
                op: kind,
                info: OperatorInfo::user_defined(method).lifted(),
                left: Box::new(left_op.clone()),
                right: Box::new(right_op.clone()),
            },
            Some(self.lifted_result(ret)),
            span,
            sk,
        ))
    }

    /// `&&`/`||`: plain bools short-circuit directly; a type declaring the
    /// underlying `&`/`|` together with `operator true`/`operator false`
    /// participates through its operators.
    fn lower_short_circuit(
        &mut self,
        kind: OperatorKind,
        bitwise: OperatorKind,
        left_op: Operation,
        right_op: Operation,
        lt: TypeId,
        rt: TypeId,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        if lt == TypeId::BOOL && rt == TypeId::BOOL {
            let constant = match (&left_op.constant, &right_op.constant) {
                (Some(a), Some(b)) => fold_binary(kind, a, b),
                _ => None,
            };
            return Operation::new(
                OperationData::BinaryOperator {
                    op: kind,
                    info: OperatorInfo::builtin(),
                    left: Box::new(left_op),
                    right: Box::new(right_op),
                },
                Some(TypeId::BOOL),
                span,
                sk,
            )
            .with_constant_opt(constant);
        }

        let has_operators = lt == rt
            && self.facts.lookup_operator(lt, bitwise).is_some()
            && self.facts.lookup_operator(lt, OperatorKind::True).is_some()
            && self.facts.lookup_operator(lt, OperatorKind::False).is_some();
        if has_operators {
            if self.options.preserve_untyped_logical_shape {
                // The raw short circuit stays a structurally untyped node;
                // a boolean-context consumer adds the `true`-operator probe.
                return Operation::new(
                    OperationData::None {
                        children: vec![left_op, right_op],
                    },
                    None,
                    span,
                    sk,
                );
            }
            let method = self.facts.lookup_operator(lt, bitwise);
            return Operation::new(
                OperationData::BinaryOperator {
                    op: kind,
                    info: OperatorInfo {
                        method,
                        is_lifted: false,
                        is_dynamic: false,
                    },
                    left: Box::new(left_op),
                    right: Box::new(right_op),
                },
                Some(lt),
                span,
                sk,
            );
        }

        self.error(
            codes::BAD_BINARY_OPS,
            span,
            vec![
                kind.token().to_string(),
                self.type_name(lt),
                self.type_name(rt),
            ],
        );
        Operation::invalid_wrapping(vec![left_op, right_op], span, sk)
    }

    /// Lower an expression consumed in a boolean context, wrapping with
    /// the implicit `true`-operator probe or a conversion to `bool` as the
    /// operand type demands.
    pub(crate) fn lower_condition(&mut self, e: &ExprSyntax) -> Operation {
        let op = self.lower_expr(e);
        let span = op.span;
        match op.result_type {
            Some(TypeId::BOOL) | Some(TypeId::ERROR) => op,
            Some(TypeId::DYNAMIC) => {
                self.conversion_node(op, TypeId::BOOL, Conversion::identity(), true, false)
            }
            None => {
                // The untyped short-circuit shape; probe through the left
                // operand's `operator true`.
                let operand_ty = op
                    .children()
                    .first()
                    .and_then(|c| c.result_type)
                    .unwrap_or(TypeId::ERROR);
                let method = self.facts.lookup_operator(operand_ty, OperatorKind::True);
                self.true_operator_probe(op, method, span)
            }
            Some(ty) => {
                if let Some(method) = self.facts.lookup_operator(ty, OperatorKind::True) {
                    return self.true_operator_probe(op, Some(method), span);
                }
                let conv = self.facts.classify_conversion(ty, TypeId::BOOL);
                if conv.is_identity() {
                    return op;
                }
                if conv.is_implicit() {
                    return self.conversion_node(op, TypeId::BOOL, conv, true, false);
                }
                self.error(
                    codes::NO_IMPLICIT_CONV,
                    span,
                    vec![self.type_name(ty), "bool".to_string()],
                );
                self.conversion_node(op, TypeId::BOOL, conv, true, true)
            }
        }
    }

    fn true_operator_probe(
        &self,
        op: Operation,
        method: Option<SymbolId>,
        span: Span,
    ) -> Operation {
        let sk = op.syntax_kind;
        Operation::new(
            OperationData::UnaryOperator {
                op: OperatorKind::True,
                info: OperatorInfo {
                    method,
                    is_lifted: false,
                    is_dynamic: false,
                },
                operand: Box::new(op),
            },
            Some(TypeId::BOOL),
            span,
            sk,
        )
        .implicit()
    }

    fn lower_increment(
        &mut self,
        target: &ExprSyntax,
        is_increment: bool,
        is_postfix: bool,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let target_op = self.lower_expr(target);
        let ty = target_op.result_type.unwrap_or(TypeId::ERROR);
        let ok = ty == TypeId::DYNAMIC || ty == TypeId::ERROR || is_numeric(ty);
        if !ok {
            let token = if is_increment { "++" } else { "--" };
            self.error(
                codes::BAD_UNARY_OP,
                span,
                vec![token.to_string(), self.type_name(ty)],
            );
        }
        let node = Operation::new(
            OperationData::IncrementOrDecrement {
                is_increment,
                is_postfix,
                target: Box::new(target_op),
            },
            Some(ty),
            span,
            sk,
        );
        if ok { node } else { node.invalid() }
    }

    // =========================================================================
    // Assignment, casts, creation
    // =========================================================================

    fn lower_assignment(
        &mut self,
        target: &ExprSyntax,
        value: &ExprSyntax,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let target_op = self.lower_expr(target);
        let ty = target_op.result_type.unwrap_or(TypeId::ERROR);
        let assignable = matches!(
            target_op.data,
            OperationData::LocalReference { .. }
                | OperationData::ParameterReference { .. }
                | OperationData::FieldReference { .. }
                | OperationData::DynamicMemberReference { .. }
                | OperationData::Invalid { .. }
        );
        let value_op = if ty == TypeId::ERROR {
            self.lower_expr(value)
        } else {
            self.lower_with_target(value, Some(ty))
        };
        let node = Operation::new(
            OperationData::SimpleAssignment {
                target: Box::new(target_op),
                value: Box::new(value_op),
            },
            Some(ty),
            span,
            sk,
        );
        if assignable { node } else { node.invalid() }
    }

    fn lower_compound_assignment(
        &mut self,
        op: BinaryOp,
        target: &ExprSyntax,
        value: &ExprSyntax,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        let kind = binary_kind(op);
        let target_op = self.lower_expr(target);

        // `+=`/`-=` against an event target binds the accessors instead.
        if matches!(target_op.data, OperationData::EventReference { .. })
            && matches!(kind, OperatorKind::Add | OperatorKind::Subtract)
        {
            return self.lower_event_assignment(
                target_op,
                value,
                kind == OperatorKind::Add,
                span,
                sk,
            );
        }

        let tty = target_op.result_type.unwrap_or(TypeId::ERROR);
        let value_op = self.lower_expr(value);
        let vty = value_op.result_type.unwrap_or(TypeId::ERROR);

        if tty == TypeId::DYNAMIC || vty == TypeId::DYNAMIC {
            return Operation::new(
                OperationData::CompoundAssignment {
                    op: kind,
                    info: OperatorInfo::dynamic(),
                    target: Box::new(target_op),
                    value: Box::new(value_op),
                },
                Some(TypeId::DYNAMIC),
                span,
                sk,
            );
        }
        if tty == TypeId::ERROR || vty == TypeId::ERROR {
            return Operation::new(
                OperationData::CompoundAssignment {
                    op: kind,
                    info: OperatorInfo::builtin(),
                    target: Box::new(target_op),
                    value: Box::new(value_op),
                },
                Some(tty),
                span,
                sk,
            );
        }

        let resolved: Option<(OperatorInfo, TypeId)> = if let Some(b) =
            binary_builtin(kind, tty, vty)
        {
            Some((OperatorInfo::builtin(), b.result))
        } else if let Some(method) = self
            .facts
            .lookup_operator(tty, kind)
            .or_else(|| self.facts.lookup_operator(vty, kind))
        {
            Some((OperatorInfo::user_defined(method), self.facts.symbol(method).ty))
        } else {
            None
        };

        match resolved {
            Some((info, result)) => {
                // The operation result must flow back into the target.
                let mut invalid = false;
                if !self.facts.classify_conversion(result, tty).is_implicit() {
                    self.error(
                        codes::NO_IMPLICIT_CONV,
                        span,
                        vec![self.type_name(result), self.type_name(tty)],
                    );
                    invalid = true;
                }
                let node = Operation::new(
                    OperationData::CompoundAssignment {
                        op: kind,
                        info,
                        target: Box::new(target_op),
                        value: Box::new(value_op),
                    },
                    Some(tty),
                    span,
                    sk,
                );
                if invalid { node.invalid() } else { node }
            }
            None => {
                self.error(
                    codes::BAD_BINARY_OPS,
                    span,
                    vec![
                        kind.token().to_string(),
                        self.type_name(tty),
                        self.type_name(vty),
                    ],
                );
                Operation::new(
                    OperationData::CompoundAssignment {
                        op: kind,
                        info: OperatorInfo::builtin(),
                        target: Box::new(target_op),
                        value: Box::new(value_op),
                    },
                    Some(tty),
                    span,
                    sk,
                )
                .invalid()
            }
        }
    }

    fn lower_cast(
        &mut self,
        ty: TypeId,
        operand: &ExprSyntax,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        if self.table().is_delegate(ty) {
            if let Some(op) = self.try_lower_delegate_cast(operand, ty, span, sk) {
                return op;
            }
        }
        let operand_op = self.lower_expr(operand);
        let from = operand_op.result_type.unwrap_or(TypeId::ERROR);
        if from == TypeId::ERROR || from == TypeId::DYNAMIC {
            return self.conversion_node(operand_op, ty, Conversion::identity(), false, false);
        }
        let conv = self.facts.classify_conversion(from, ty);
        if conv.exists {
            return self.conversion_node(operand_op, ty, conv, false, false);
        }
        self.error(
            codes::NO_EXPLICIT_CONV,
            span,
            vec![self.type_name(from), self.type_name(ty)],
        );
        self.conversion_node(operand_op, ty, conv, false, true)
    }

    fn lower_object_creation(
        &mut self,
        ty: TypeId,
        args: &[ArgumentSyntax],
        span: Span,
        sk: &'static str,
    ) -> Operation {
        if self.table().is_delegate(ty) {
            return self.lower_delegate_constructor(ty, args, span, sk);
        }
        let arg_ops: Vec<Operation> = args.iter().map(|a| self.lower_expr(&a.value)).collect();
        let arg_types: ArgTypes = arg_ops
            .iter()
            .map(|a| a.result_type.unwrap_or(TypeId::ERROR))
            .collect();
        let candidates = self.facts.resolve_name(ty, ".ctor");
        if candidates.is_empty() {
            // No declared constructor: accept the default shape.
            let params = arg_types.clone();
            let arguments = self.argument_nodes(args, arg_ops, &params);
            return Operation::new(
                OperationData::ObjectCreation { arguments },
                Some(ty),
                span,
                sk,
            );
        }
        match self.facts.resolve_overload(&candidates, &arg_types) {
            OverloadResolution::Best(ctor) => {
                let params = self.facts.symbol(ctor).params.clone();
                let arguments = self.argument_nodes(args, arg_ops, &params);
                Operation::new(
                    OperationData::ObjectCreation { arguments },
                    Some(ty),
                    span,
                    sk,
                )
            }
            OverloadResolution::Ambiguous(a, b) => {
                let (da, db) = {
                    let table = self.table();
                    (
                        self.facts.symbol(a).display(table),
                        self.facts.symbol(b).display(table),
                    )
                };
                self.error(codes::AMBIGUOUS_CALL, span, vec![da, db]);
                let params = self.facts.symbol(a).params.clone();
                let arguments = self.argument_nodes(args, arg_ops, &params);
                Operation::new(
                    OperationData::ObjectCreation { arguments },
                    Some(ty),
                    span,
                    sk,
                )
                .invalid()
            }
            OverloadResolution::NoMatch => {
                let name = self.type_name(ty);
                self.no_match_diagnostic(&name, &candidates, &arg_types, span);
                Operation::invalid_wrapping(arg_ops, span, sk)
            }
        }
    }

    // =========================================================================
    // Patterns and interpolation
    // =========================================================================

    fn lower_is_pattern(
        &mut self,
        operand: &ExprSyntax,
        pattern: &opal_syntax::PatternSyntax,
        span: Span,
        sk: &'static str,
    ) -> Operation {
        use opal_syntax::PatternSyntax;
        let value = self.lower_expr(operand);
        let (pty, name) = match pattern {
            PatternSyntax::Type(ty) => (*ty, None),
            PatternSyntax::Declaration { ty, name } => (*ty, Some(name.clone())),
        };
        if let Some(name) = &name {
            // The enclosing statement decides which scope receives the
            // pattern local.
            self.pending_pattern_locals.push((name.clone(), pty));
        }
        let pattern_op = Operation::new(
            OperationData::DeclarationPattern { name },
            Some(pty),
            span,
            "DeclarationPattern",
        );
        Operation::new(
            OperationData::IsPattern {
                value: Box::new(value),
                pattern: Box::new(pattern_op),
            },
            Some(TypeId::BOOL),
            span,
            sk,
        )
    }

    fn lower_interpolated_string(
        &mut self,
        parts: &[opal_syntax::InterpolatedPart],
        span: Span,
        sk: &'static str,
    ) -> Operation {
        use opal_syntax::InterpolatedPart;
        let part_ops: Vec<Operation> = parts
            .iter()
            .map(|part| match part {
                InterpolatedPart::Text(text) => Operation::new(
                    OperationData::InterpolatedStringText,
                    Some(TypeId::STRING),
                    span,
                    "InterpolatedStringText",
                )
                .with_constant(ConstValue::Str(text.clone())),
                InterpolatedPart::Interpolation(expr) => {
                    let inner = self.lower_expr(expr);
                    let ispan = inner.span;
                    Operation::new(
                        OperationData::Interpolation {
                            expression: Box::new(inner),
                        },
                        None,
                        ispan,
                        "Interpolation",
                    )
                }
            })
            .collect();
        Operation::new(
            OperationData::InterpolatedString { parts: part_ops },
            Some(TypeId::STRING),
            span,
            sk,
        )
    }
}

// =============================================================================
// Constant folding
// =============================================================================

fn fold_unary(kind: OperatorKind, value: &ConstValue) -> Option<ConstValue> {
    match (kind, value) {
        (OperatorKind::Plus, ConstValue::Int(v)) => Some(ConstValue::Int(*v)),
        (OperatorKind::Minus, ConstValue::Int(v)) => v.checked_neg().map(ConstValue::Int),
        (OperatorKind::BitwiseNot, ConstValue::Int(v)) => Some(ConstValue::Int(!v)),
        (OperatorKind::Plus, ConstValue::Float(v)) => Some(ConstValue::Float(*v)),
        (OperatorKind::Minus, ConstValue::Float(v)) => Some(ConstValue::Float(-v)),
        (OperatorKind::LogicalNot, ConstValue::Bool(v)) => Some(ConstValue::Bool(!v)),
        _ => None,
    }
}

fn fold_binary(kind: OperatorKind, a: &ConstValue, b: &ConstValue) -> Option<ConstValue> {
    use OperatorKind as Op;
    match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) => match kind {
            Op::Add => x.checked_add(*y).map(ConstValue::Int),
            Op::Subtract => x.checked_sub(*y).map(ConstValue::Int),
            Op::Multiply => x.checked_mul(*y).map(ConstValue::Int),
            Op::Divide => x.checked_div(*y).map(ConstValue::Int),
            Op::Remainder => x.checked_rem(*y).map(ConstValue::Int),
            Op::BitwiseAnd => Some(ConstValue::Int(x & y)),
            Op::BitwiseOr => Some(ConstValue::Int(x | y)),
            Op::ExclusiveOr => Some(ConstValue::Int(x ^ y)),
            Op::Equals => Some(ConstValue::Bool(x == y)),
            Op::NotEquals => Some(ConstValue::Bool(x != y)),
            Op::LessThan => Some(ConstValue::Bool(x < y)),
            Op::GreaterThan => Some(ConstValue::Bool(x > y)),
            Op::LessThanOrEqual => Some(ConstValue::Bool(x <= y)),
            Op::GreaterThanOrEqual => Some(ConstValue::Bool(x >= y)),
            _ => None,
        },
        (ConstValue::Bool(x), ConstValue::Bool(y)) => match kind {
            Op::BitwiseAnd | Op::ConditionalAnd => Some(ConstValue::Bool(*x && *y)),
            Op::BitwiseOr | Op::ConditionalOr => Some(ConstValue::Bool(*x || *y)),
            Op::ExclusiveOr => Some(ConstValue::Bool(x ^ y)),
            Op::Equals => Some(ConstValue::Bool(x == y)),
            Op::NotEquals => Some(ConstValue::Bool(x != y)),
            _ => None,
        },
        (ConstValue::Str(x), ConstValue::Str(y)) => match kind {
            Op::Add => Some(ConstValue::Str(format!("{x}{y}"))),
            Op::Equals => Some(ConstValue::Bool(x == y)),
            Op::NotEquals => Some(ConstValue::Bool(x != y)),
            _ => None,
        },
        _ => None,
    }
}
