//! Type identifiers, the type table, and compile-time constant values.
//!
//! `TypeId` is a dense index into a `TypeTable`. The intrinsic types are
//! pre-seeded at fixed indices so the lowering engine and the built-in
//! operator tables can name them as constants without a table in hand.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

// =============================================================================
// TypeId
// =============================================================================

/// Identifier for a semantic type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Sentinel for a type that failed to resolve.
    pub const ERROR: Self = Self(0);
    pub const VOID: Self = Self(1);
    pub const OBJECT: Self = Self(2);
    pub const BOOL: Self = Self(3);
    pub const CHAR: Self = Self(4);
    pub const INT8: Self = Self(5);
    pub const UINT8: Self = Self(6);
    pub const INT16: Self = Self(7);
    pub const UINT16: Self = Self(8);
    pub const INT32: Self = Self(9);
    pub const UINT32: Self = Self(10);
    pub const INT64: Self = Self(11);
    pub const UINT64: Self = Self(12);
    pub const FLOAT32: Self = Self(13);
    pub const FLOAT64: Self = Self(14);
    pub const STRING: Self = Self(15);
    /// The type of the `null` literal before conversion.
    pub const NULL: Self = Self(16);
    /// The dynamic marker type; operands of this type bypass static
    /// resolution entirely.
    pub const DYNAMIC: Self = Self(17);

    pub(crate) const FIRST_USER: u32 = 18;

    /// Whether this id names one of the pre-seeded intrinsic types.
    #[must_use]
    pub const fn is_intrinsic(self) -> bool {
        self.0 < Self::FIRST_USER
    }
}

/// Kind tag for the pre-seeded intrinsic types.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntrinsicKind {
    Error,
    Void,
    Object,
    Bool,
    Char,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    String,
    Null,
    Dynamic,
}

impl IntrinsicKind {
    const ALL: [IntrinsicKind; TypeId::FIRST_USER as usize] = [
        IntrinsicKind::Error,
        IntrinsicKind::Void,
        IntrinsicKind::Object,
        IntrinsicKind::Bool,
        IntrinsicKind::Char,
        IntrinsicKind::Int8,
        IntrinsicKind::UInt8,
        IntrinsicKind::Int16,
        IntrinsicKind::UInt16,
        IntrinsicKind::Int32,
        IntrinsicKind::UInt32,
        IntrinsicKind::Int64,
        IntrinsicKind::UInt64,
        IntrinsicKind::Float32,
        IntrinsicKind::Float64,
        IntrinsicKind::String,
        IntrinsicKind::Null,
        IntrinsicKind::Dynamic,
    ];

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            IntrinsicKind::Error => "?",
            IntrinsicKind::Void => "void",
            IntrinsicKind::Object => "object",
            IntrinsicKind::Bool => "bool",
            IntrinsicKind::Char => "char",
            IntrinsicKind::Int8 => "sbyte",
            IntrinsicKind::UInt8 => "byte",
            IntrinsicKind::Int16 => "short",
            IntrinsicKind::UInt16 => "ushort",
            IntrinsicKind::Int32 => "int",
            IntrinsicKind::UInt32 => "uint",
            IntrinsicKind::Int64 => "long",
            IntrinsicKind::UInt64 => "ulong",
            IntrinsicKind::Float32 => "float",
            IntrinsicKind::Float64 => "double",
            IntrinsicKind::String => "string",
            IntrinsicKind::Null => "<null>",
            IntrinsicKind::Dynamic => "dynamic",
        }
    }
}

// =============================================================================
// Constant values
// =============================================================================

/// A compile-time-known constant value attached to literals, constant
/// locals, and constant-folded conditions.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Str(String),
    Null,
}

impl ConstValue {
    /// The natural type of a literal carrying this constant.
    #[must_use]
    pub fn natural_type(&self) -> TypeId {
        match self {
            ConstValue::Bool(_) => TypeId::BOOL,
            ConstValue::Int(v) => {
                if i32::try_from(*v).is_ok() {
                    TypeId::INT32
                } else {
                    TypeId::INT64
                }
            }
            ConstValue::UInt(v) => {
                if u32::try_from(*v).is_ok() {
                    TypeId::UINT32
                } else {
                    TypeId::UINT64
                }
            }
            ConstValue::Float(_) => TypeId::FLOAT64,
            ConstValue::Char(_) => TypeId::CHAR,
            ConstValue::Str(_) => TypeId::STRING,
            ConstValue::Null => TypeId::NULL,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(v) => write!(f, "{v}"),
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::UInt(v) => write!(f, "{v}"),
            ConstValue::Float(v) => write!(f, "{v}"),
            ConstValue::Char(c) => write!(f, "'{c}'"),
            ConstValue::Str(s) => write!(f, "\"{s}\""),
            ConstValue::Null => write!(f, "null"),
        }
    }
}

// =============================================================================
// Type table
// =============================================================================

/// Signature of a method, operator method, or delegate invoke.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSig {
    pub params: SmallVec<[TypeId; 4]>,
    pub ret: TypeId,
}

/// Stored data for one type.
#[derive(Clone, Debug)]
pub enum TypeData {
    Intrinsic(IntrinsicKind),
    /// A declared class or struct.
    Named {
        name: String,
        base: Option<TypeId>,
        is_struct: bool,
    },
    /// A nullable wrapper `T?` around a value type.
    Nullable(TypeId),
    /// A named delegate type with its invoke signature. Delegate types are
    /// nominal: two delegates with identical signatures never convert.
    Delegate { name: String, sig: MethodSig },
}

/// Interning table for types. Intrinsics occupy the first slots in
/// `TypeId` constant order; nullable wrappers are interned so equal
/// underlying types yield equal ids.
#[derive(Debug, Default)]
pub struct TypeTable {
    types: Vec<TypeData>,
    nullable_of: FxHashMap<TypeId, TypeId>,
    by_name: FxHashMap<String, TypeId>,
}

impl TypeTable {
    #[must_use]
    pub fn new() -> Self {
        let mut table = Self {
            types: Vec::with_capacity(IntrinsicKind::ALL.len() + 16),
            nullable_of: FxHashMap::default(),
            by_name: FxHashMap::default(),
        };
        for kind in IntrinsicKind::ALL {
            table.types.push(TypeData::Intrinsic(kind));
        }
        table
    }

    pub fn lookup(&self, id: TypeId) -> Option<&TypeData> {
        self.types.get(id.0 as usize)
    }

    fn push(&mut self, data: TypeData) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(data);
        id
    }

    pub fn add_named(&mut self, name: &str, base: Option<TypeId>, is_struct: bool) -> TypeId {
        let id = self.push(TypeData::Named {
            name: name.to_string(),
            base,
            is_struct,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn add_delegate(&mut self, name: &str, params: &[TypeId], ret: TypeId) -> TypeId {
        let id = self.push(TypeData::Delegate {
            name: name.to_string(),
            sig: MethodSig {
                params: params.iter().copied().collect(),
                ret,
            },
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Intern the nullable wrapper of `underlying`.
    pub fn nullable(&mut self, underlying: TypeId) -> TypeId {
        if let Some(&existing) = self.nullable_of.get(&underlying) {
            return existing;
        }
        let id = self.push(TypeData::Nullable(underlying));
        self.nullable_of.insert(underlying, id);
        id
    }

    /// The already-interned nullable wrapper of `underlying`, if one has
    /// been created. Read-only lookup for callers holding `&TypeTable`.
    #[must_use]
    pub fn existing_nullable(&self, underlying: TypeId) -> Option<TypeId> {
        self.nullable_of.get(&underlying).copied()
    }

    /// The underlying type if `id` is a nullable wrapper.
    #[must_use]
    pub fn nullable_underlying(&self, id: TypeId) -> Option<TypeId> {
        match self.lookup(id) {
            Some(TypeData::Nullable(underlying)) => Some(*underlying),
            _ => None,
        }
    }

    /// Resolve a declared type by its source name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn base_of(&self, id: TypeId) -> Option<TypeId> {
        match self.lookup(id) {
            Some(TypeData::Named { base, .. }) => *base,
            _ => None,
        }
    }

    #[must_use]
    pub fn is_value_type(&self, id: TypeId) -> bool {
        match self.lookup(id) {
            Some(TypeData::Intrinsic(kind)) => !matches!(
                kind,
                IntrinsicKind::Object
                    | IntrinsicKind::String
                    | IntrinsicKind::Null
                    | IntrinsicKind::Dynamic
                    | IntrinsicKind::Error
                    | IntrinsicKind::Void
            ),
            Some(TypeData::Named { is_struct, .. }) => *is_struct,
            Some(TypeData::Nullable(_)) => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn is_reference_type(&self, id: TypeId) -> bool {
        match self.lookup(id) {
            Some(TypeData::Intrinsic(kind)) => {
                matches!(kind, IntrinsicKind::Object | IntrinsicKind::String)
            }
            Some(TypeData::Named { is_struct, .. }) => !*is_struct,
            Some(TypeData::Delegate { .. }) => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn is_delegate(&self, id: TypeId) -> bool {
        matches!(self.lookup(id), Some(TypeData::Delegate { .. }))
    }

    #[must_use]
    pub fn delegate_sig(&self, id: TypeId) -> Option<&MethodSig> {
        match self.lookup(id) {
            Some(TypeData::Delegate { sig, .. }) => Some(sig),
            _ => None,
        }
    }

    /// Canonical display name used by the printer and diagnostic args.
    #[must_use]
    pub fn display_name(&self, id: TypeId) -> String {
        match self.lookup(id) {
            Some(TypeData::Intrinsic(kind)) => kind.display_name().to_string(),
            Some(TypeData::Named { name, .. }) | Some(TypeData::Delegate { name, .. }) => {
                name.clone()
            }
            Some(TypeData::Nullable(underlying)) => {
                format!("{}?", self.display_name(*underlying))
            }
            None => "?".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intrinsics_occupy_constant_slots() {
        let table = TypeTable::new();
        assert!(matches!(
            table.lookup(TypeId::INT32),
            Some(TypeData::Intrinsic(IntrinsicKind::Int32))
        ));
        assert_eq!(table.display_name(TypeId::INT8), "sbyte");
        assert_eq!(table.display_name(TypeId::DYNAMIC), "dynamic");
    }

    #[test]
    fn nullable_is_interned() {
        let mut table = TypeTable::new();
        let a = table.nullable(TypeId::INT32);
        let b = table.nullable(TypeId::INT32);
        assert_eq!(a, b);
        assert_eq!(table.nullable_underlying(a), Some(TypeId::INT32));
        assert_eq!(table.display_name(a), "int?");
    }

    #[test]
    fn int_literal_natural_type_widens_past_i32() {
        assert_eq!(ConstValue::Int(1).natural_type(), TypeId::INT32);
        assert_eq!(
            ConstValue::Int(i64::from(i32::MAX) + 1).natural_type(),
            TypeId::INT64
        );
    }
}
