//! Data-driven built-in operator tables.
//!
//! One algorithm plus a promotion table replaces a code path per numeric
//! type. The unary table maps each operand type to its promoted width;
//! types narrower than `int` have no direct operator and promote through
//! an implicit conversion the lowering engine materializes as a node.

use crate::provider::OperatorKind;
use crate::types::TypeId;

/// Resolution of a built-in unary operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BuiltinUnary {
    pub result: TypeId,
    /// Conversion target for the operand, when promotion applies.
    pub promote_to: Option<TypeId>,
}

/// Resolution of a built-in binary operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BuiltinBinary {
    pub result: TypeId,
    pub left_promote: Option<TypeId>,
    pub right_promote: Option<TypeId>,
}

/// Unary promotion table: operand type to promoted width. `None` means
/// the type carries its own direct operator.
pub const UNARY_PROMOTIONS: &[(TypeId, Option<TypeId>)] = &[
    (TypeId::INT8, Some(TypeId::INT32)),
    (TypeId::UINT8, Some(TypeId::INT32)),
    (TypeId::INT16, Some(TypeId::INT32)),
    (TypeId::UINT16, Some(TypeId::INT32)),
    (TypeId::CHAR, Some(TypeId::INT32)),
    (TypeId::INT32, None),
    (TypeId::UINT32, None),
    (TypeId::INT64, None),
    (TypeId::UINT64, None),
    (TypeId::FLOAT32, None),
    (TypeId::FLOAT64, None),
];

/// The numeric types narrower than the default promoted width.
pub const NARROW_NUMERIC: &[TypeId] = &[
    TypeId::INT8,
    TypeId::UINT8,
    TypeId::INT16,
    TypeId::UINT16,
    TypeId::CHAR,
];

#[must_use]
pub fn is_numeric(ty: TypeId) -> bool {
    UNARY_PROMOTIONS.iter().any(|&(t, _)| t == ty)
}

fn is_float(ty: TypeId) -> bool {
    ty == TypeId::FLOAT32 || ty == TypeId::FLOAT64
}

fn is_unsigned(ty: TypeId) -> bool {
    matches!(
        ty,
        TypeId::UINT8 | TypeId::UINT16 | TypeId::UINT32 | TypeId::UINT64 | TypeId::CHAR
    )
}

fn unary_promotion(ty: TypeId) -> Option<Option<TypeId>> {
    UNARY_PROMOTIONS
        .iter()
        .find(|&&(t, _)| t == ty)
        .map(|&(_, p)| p)
}

/// Resolve a built-in unary operator, or `None` when no built-in applies.
#[must_use]
pub fn unary_builtin(op: OperatorKind, operand: TypeId) -> Option<BuiltinUnary> {
    match op {
        OperatorKind::LogicalNot => (operand == TypeId::BOOL).then_some(BuiltinUnary {
            result: TypeId::BOOL,
            promote_to: None,
        }),
        OperatorKind::Plus | OperatorKind::Minus | OperatorKind::BitwiseNot => {
            if op == OperatorKind::BitwiseNot && is_float(operand) {
                return None;
            }
            if op == OperatorKind::Minus && operand == TypeId::UINT64 {
                // No negation for ulong at any width.
                return None;
            }
            if op == OperatorKind::Minus && operand == TypeId::UINT32 {
                return Some(BuiltinUnary {
                    result: TypeId::INT64,
                    promote_to: Some(TypeId::INT64),
                });
            }
            let promote = unary_promotion(operand)?;
            Some(BuiltinUnary {
                result: promote.unwrap_or(operand),
                promote_to: promote,
            })
        }
        _ => None,
    }
}

/// Binary numeric promotion: the common width both operands convert to.
#[must_use]
pub fn binary_promotion(left: TypeId, right: TypeId) -> Option<TypeId> {
    if !is_numeric(left) || !is_numeric(right) {
        return None;
    }
    for wide in [TypeId::FLOAT64, TypeId::FLOAT32] {
        if left == wide || right == wide {
            return Some(wide);
        }
    }
    if left == TypeId::UINT64 || right == TypeId::UINT64 {
        let other = if left == TypeId::UINT64 { right } else { left };
        // ulong mixes only with unsigned operands.
        return (other == TypeId::UINT64 || is_unsigned(other)).then_some(TypeId::UINT64);
    }
    if left == TypeId::INT64 || right == TypeId::INT64 {
        return Some(TypeId::INT64);
    }
    if left == TypeId::UINT32 || right == TypeId::UINT32 {
        let other = if left == TypeId::UINT32 { right } else { left };
        // uint with a signed operand widens both to long.
        if other == TypeId::UINT32 || is_unsigned(other) {
            return Some(TypeId::UINT32);
        }
        return Some(TypeId::INT64);
    }
    Some(TypeId::INT32)
}

fn promoted(operand: TypeId, to: TypeId) -> Option<TypeId> {
    (operand != to).then_some(to)
}

fn promoted_pair(result: TypeId, left: TypeId, right: TypeId, common: TypeId) -> BuiltinBinary {
    BuiltinBinary {
        result,
        left_promote: promoted(left, common),
        right_promote: promoted(right, common),
    }
}

/// Resolve a built-in binary operator, or `None` when no built-in applies.
#[must_use]
pub fn binary_builtin(op: OperatorKind, left: TypeId, right: TypeId) -> Option<BuiltinBinary> {
    use OperatorKind as Op;
    match op {
        Op::ConditionalAnd | Op::ConditionalOr => (left == TypeId::BOOL && right == TypeId::BOOL)
            .then_some(BuiltinBinary {
                result: TypeId::BOOL,
                left_promote: None,
                right_promote: None,
            }),
        Op::BitwiseAnd | Op::BitwiseOr | Op::ExclusiveOr => {
            if left == TypeId::BOOL && right == TypeId::BOOL {
                return Some(BuiltinBinary {
                    result: TypeId::BOOL,
                    left_promote: None,
                    right_promote: None,
                });
            }
            if is_float(left) || is_float(right) {
                return None;
            }
            let common = binary_promotion(left, right)?;
            Some(promoted_pair(common, left, right, common))
        }
        Op::Add if left == TypeId::STRING || right == TypeId::STRING => Some(BuiltinBinary {
            result: TypeId::STRING,
            left_promote: None,
            right_promote: None,
        }),
        Op::Add | Op::Subtract | Op::Multiply | Op::Divide | Op::Remainder => {
            let common = binary_promotion(left, right)?;
            Some(promoted_pair(common, left, right, common))
        }
        Op::LeftShift | Op::RightShift => {
            if is_float(left) {
                return None;
            }
            let shifted = unary_promotion(left).map(|p| p.unwrap_or(left))?;
            let right_promote = match right {
                TypeId::INT32 => None,
                r if unary_promotion(r) == Some(Some(TypeId::INT32)) => Some(TypeId::INT32),
                _ => return None,
            };
            Some(BuiltinBinary {
                result: shifted,
                left_promote: promoted(left, shifted),
                right_promote,
            })
        }
        Op::Equals | Op::NotEquals => {
            if (left == TypeId::BOOL && right == TypeId::BOOL)
                || (left == TypeId::STRING && right == TypeId::STRING)
            {
                return Some(BuiltinBinary {
                    result: TypeId::BOOL,
                    left_promote: None,
                    right_promote: None,
                });
            }
            let common = binary_promotion(left, right)?;
            Some(promoted_pair(TypeId::BOOL, left, right, common))
        }
        Op::LessThan | Op::GreaterThan | Op::LessThanOrEqual | Op::GreaterThanOrEqual => {
            let common = binary_promotion(left, right)?;
            Some(promoted_pair(TypeId::BOOL, left, right, common))
        }
        _ => None,
    }
}
