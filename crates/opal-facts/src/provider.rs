//! Symbol records and the `SemanticFacts` query trait.
//!
//! The lowering engine consumes these four queries and nothing else from
//! the symbol world: name resolution, overload resolution, conversion
//! classification, and operator lookup. Implementations must be pure and
//! synchronous; the engine issues queries and never manages their
//! lifecycle.

use crate::types::{TypeId, TypeTable};
use bitflags::bitflags;
use smallvec::SmallVec;

// =============================================================================
// Symbols
// =============================================================================

/// Identifier for a member symbol known to the facts provider.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Method,
    Field,
    Event,
    OperatorMethod,
    ConversionOperator,
}

/// Declared facts about one member symbol.
#[derive(Clone, Debug)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    pub containing_type: TypeId,
    pub is_static: bool,
    /// Field/event type, or method/operator return type.
    pub ty: TypeId,
    /// Parameter types for methods and operator methods; empty for fields
    /// and events.
    pub params: SmallVec<[TypeId; 4]>,
}

impl SymbolInfo {
    /// `C.M(int, string)` rendering for diagnostic arguments.
    #[must_use]
    pub fn display(&self, table: &TypeTable) -> String {
        match self.kind {
            SymbolKind::Field | SymbolKind::Event => {
                format!("{}.{}", table.display_name(self.containing_type), self.name)
            }
            _ => {
                let params: Vec<String> =
                    self.params.iter().map(|&p| table.display_name(p)).collect();
                format!(
                    "{}.{}({})",
                    table.display_name(self.containing_type),
                    self.name,
                    params.join(", ")
                )
            }
        }
    }
}

// =============================================================================
// Operators
// =============================================================================

/// The operators the lowering engine can ask the provider about.
///
/// `True`/`False` are the boolean-context probe operators a non-boolean
/// type may declare to participate in conditions and short circuits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    // unary
    Plus,
    Minus,
    LogicalNot,
    BitwiseNot,
    True,
    False,
    // binary
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    BitwiseAnd,
    BitwiseOr,
    ExclusiveOr,
    LeftShift,
    RightShift,
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    // short circuits are rewritten, never looked up directly
    ConditionalAnd,
    ConditionalOr,
}

impl OperatorKind {
    /// Source token for diagnostics.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            OperatorKind::Plus | OperatorKind::Add => "+",
            OperatorKind::Minus | OperatorKind::Subtract => "-",
            OperatorKind::LogicalNot => "!",
            OperatorKind::BitwiseNot => "~",
            OperatorKind::True => "true",
            OperatorKind::False => "false",
            OperatorKind::Multiply => "*",
            OperatorKind::Divide => "/",
            OperatorKind::Remainder => "%",
            OperatorKind::BitwiseAnd => "&",
            OperatorKind::BitwiseOr => "|",
            OperatorKind::ExclusiveOr => "^",
            OperatorKind::LeftShift => "<<",
            OperatorKind::RightShift => ">>",
            OperatorKind::Equals => "==",
            OperatorKind::NotEquals => "!=",
            OperatorKind::LessThan => "<",
            OperatorKind::GreaterThan => ">",
            OperatorKind::LessThanOrEqual => "<=",
            OperatorKind::GreaterThanOrEqual => ">=",
            OperatorKind::ConditionalAnd => "&&",
            OperatorKind::ConditionalOr => "||",
        }
    }

    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(
            self,
            OperatorKind::Plus
                | OperatorKind::Minus
                | OperatorKind::LogicalNot
                | OperatorKind::BitwiseNot
                | OperatorKind::True
                | OperatorKind::False
        )
    }

    /// The non-short-circuit operator a `&&`/`||` chain is built from.
    #[must_use]
    pub const fn underlying_bitwise(self) -> Option<OperatorKind> {
        match self {
            OperatorKind::ConditionalAnd => Some(OperatorKind::BitwiseAnd),
            OperatorKind::ConditionalOr => Some(OperatorKind::BitwiseOr),
            _ => None,
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

bitflags! {
    /// Classification bits for a conversion. `EXPLICIT_ONLY` marks a
    /// conversion that exists but requires a cast.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ConversionFlags: u8 {
        const IDENTITY      = 1 << 0;
        const NUMERIC       = 1 << 1;
        const REFERENCE     = 1 << 2;
        const USER_DEFINED  = 1 << 3;
        const NULLABLE      = 1 << 4;
        const EXPLICIT_ONLY = 1 << 5;
    }
}

/// Result of classifying a conversion between two types.
///
/// A `Conversion` with `exists == false` is only legal on a node already
/// marked invalid; the validator enforces this.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Conversion {
    pub exists: bool,
    pub flags: ConversionFlags,
    /// The user-defined conversion operator applied, when `USER_DEFINED`.
    pub method: Option<SymbolId>,
}

impl Conversion {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            exists: false,
            flags: ConversionFlags::empty(),
            method: None,
        }
    }

    #[must_use]
    pub const fn identity() -> Self {
        Self {
            exists: true,
            flags: ConversionFlags::IDENTITY,
            method: None,
        }
    }

    #[must_use]
    pub const fn numeric() -> Self {
        Self {
            exists: true,
            flags: ConversionFlags::NUMERIC,
            method: None,
        }
    }

    #[must_use]
    pub const fn reference() -> Self {
        Self {
            exists: true,
            flags: ConversionFlags::REFERENCE,
            method: None,
        }
    }

    #[must_use]
    pub const fn nullable() -> Self {
        Self {
            exists: true,
            flags: ConversionFlags::NULLABLE,
            method: None,
        }
    }

    #[must_use]
    pub const fn user_defined(method: SymbolId) -> Self {
        Self {
            exists: true,
            flags: ConversionFlags::USER_DEFINED,
            method: Some(method),
        }
    }

    #[must_use]
    pub const fn explicit_only(mut self) -> Self {
        self.flags = self.flags.union(ConversionFlags::EXPLICIT_ONLY);
        self
    }

    #[must_use]
    pub const fn is_identity(self) -> bool {
        self.flags.contains(ConversionFlags::IDENTITY)
    }

    /// Whether this conversion can be applied without a cast.
    #[must_use]
    pub const fn is_implicit(self) -> bool {
        self.exists && !self.flags.contains(ConversionFlags::EXPLICIT_ONLY)
    }

    /// Stable short description used by the printer.
    #[must_use]
    pub fn describe(self) -> &'static str {
        if !self.exists {
            return "None";
        }
        if self.flags.contains(ConversionFlags::IDENTITY) {
            "Identity"
        } else if self.flags.contains(ConversionFlags::USER_DEFINED) {
            "UserDefined"
        } else if self.flags.contains(ConversionFlags::NULLABLE) {
            "Nullable"
        } else if self.flags.contains(ConversionFlags::NUMERIC) {
            "Numeric"
        } else if self.flags.contains(ConversionFlags::REFERENCE) {
            "Reference"
        } else {
            "Other"
        }
    }
}

// =============================================================================
// Overload resolution
// =============================================================================

/// Result of resolving a candidate set against argument types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverloadResolution {
    Best(SymbolId),
    /// The first two candidates neither of which is better than the other.
    Ambiguous(SymbolId, SymbolId),
    NoMatch,
}

// =============================================================================
// The query trait
// =============================================================================

/// The narrow query interface the lowering engine consumes.
///
/// Implementations are read-only from the engine's perspective; multiple
/// lowering calls may share one provider freely.
pub trait SemanticFacts {
    /// The type table backing this provider's `TypeId`s.
    fn type_table(&self) -> &TypeTable;

    /// Declared facts about a symbol previously returned by a query.
    fn symbol(&self, id: SymbolId) -> &SymbolInfo;

    /// Members named `name` declared on `scope` or its bases, most-derived
    /// first, declaration order within a type.
    fn resolve_name(&self, scope: TypeId, name: &str) -> Vec<SymbolId>;

    /// Pick the best applicable candidate for the given argument types.
    fn resolve_overload(&self, candidates: &[SymbolId], args: &[TypeId]) -> OverloadResolution;

    /// Classify the conversion from `from` to `to`.
    fn classify_conversion(&self, from: TypeId, to: TypeId) -> Conversion;

    /// Find a user-defined operator declared on `ty` or its bases, walking
    /// the inheritance chain exactly once with the most-derived declaring
    /// type winning.
    fn lookup_operator(&self, ty: TypeId, op: OperatorKind) -> Option<SymbolId>;
}
