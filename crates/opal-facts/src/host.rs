//! In-memory `SemanticFacts` implementation.
//!
//! `FactsHost` is the provider used by tests and by embedders without
//! their own symbol table: types and members are declared up front through
//! the `declare_*` methods, then the host answers the four lowering
//! queries. Member lists keep declaration order so resolution results are
//! deterministic.

use crate::operators::is_numeric;
use crate::provider::{
    Conversion, OperatorKind, OverloadResolution, SemanticFacts, SymbolId, SymbolInfo, SymbolKind,
};
use crate::types::{TypeId, TypeTable};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::trace;

/// Implicit numeric widening table, source type to legal targets.
const IMPLICIT_NUMERIC: &[(TypeId, &[TypeId])] = &[
    (
        TypeId::INT8,
        &[
            TypeId::INT16,
            TypeId::INT32,
            TypeId::INT64,
            TypeId::FLOAT32,
            TypeId::FLOAT64,
        ],
    ),
    (
        TypeId::UINT8,
        &[
            TypeId::INT16,
            TypeId::UINT16,
            TypeId::INT32,
            TypeId::UINT32,
            TypeId::INT64,
            TypeId::UINT64,
            TypeId::FLOAT32,
            TypeId::FLOAT64,
        ],
    ),
    (
        TypeId::INT16,
        &[
            TypeId::INT32,
            TypeId::INT64,
            TypeId::FLOAT32,
            TypeId::FLOAT64,
        ],
    ),
    (
        TypeId::UINT16,
        &[
            TypeId::INT32,
            TypeId::UINT32,
            TypeId::INT64,
            TypeId::UINT64,
            TypeId::FLOAT32,
            TypeId::FLOAT64,
        ],
    ),
    (
        TypeId::INT32,
        &[TypeId::INT64, TypeId::FLOAT32, TypeId::FLOAT64],
    ),
    (
        TypeId::UINT32,
        &[
            TypeId::INT64,
            TypeId::UINT64,
            TypeId::FLOAT32,
            TypeId::FLOAT64,
        ],
    ),
    (TypeId::INT64, &[TypeId::FLOAT32, TypeId::FLOAT64]),
    (TypeId::UINT64, &[TypeId::FLOAT32, TypeId::FLOAT64]),
    (
        TypeId::CHAR,
        &[
            TypeId::UINT16,
            TypeId::INT32,
            TypeId::UINT32,
            TypeId::INT64,
            TypeId::UINT64,
            TypeId::FLOAT32,
            TypeId::FLOAT64,
        ],
    ),
    (TypeId::FLOAT32, &[TypeId::FLOAT64]),
];

fn implicit_numeric(from: TypeId, to: TypeId) -> bool {
    IMPLICIT_NUMERIC
        .iter()
        .find(|&&(src, _)| src == from)
        .is_some_and(|&(_, targets)| targets.contains(&to))
}

/// In-memory symbol and type facts.
#[derive(Default)]
pub struct FactsHost {
    table: TypeTable,
    symbols: Vec<SymbolInfo>,
    members: FxHashMap<TypeId, IndexMap<String, Vec<SymbolId>>>,
    operators: FxHashMap<(TypeId, OperatorKind), SymbolId>,
    /// (from, to, operator symbol, implicit)
    conversions: Vec<(TypeId, TypeId, SymbolId, bool)>,
}

impl FactsHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: TypeTable::new(),
            symbols: Vec::new(),
            members: FxHashMap::default(),
            operators: FxHashMap::default(),
            conversions: Vec::new(),
        }
    }

    pub fn types_mut(&mut self) -> &mut TypeTable {
        &mut self.table
    }

    // =========================================================================
    // Declaration API
    // =========================================================================

    pub fn declare_class(&mut self, name: &str, base: Option<TypeId>) -> TypeId {
        self.table.add_named(name, base, false)
    }

    pub fn declare_struct(&mut self, name: &str) -> TypeId {
        self.table.add_named(name, None, true)
    }

    pub fn declare_delegate(&mut self, name: &str, params: &[TypeId], ret: TypeId) -> TypeId {
        self.table.add_delegate(name, params, ret)
    }

    pub fn nullable_of(&mut self, underlying: TypeId) -> TypeId {
        self.table.nullable(underlying)
    }

    fn add_symbol(&mut self, info: SymbolInfo) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        let ty = info.containing_type;
        let name = info.name.clone();
        self.symbols.push(info);
        self.members
            .entry(ty)
            .or_default()
            .entry(name)
            .or_default()
            .push(id);
        id
    }

    pub fn declare_method(
        &mut self,
        ty: TypeId,
        name: &str,
        params: &[TypeId],
        ret: TypeId,
        is_static: bool,
    ) -> SymbolId {
        self.add_symbol(SymbolInfo {
            name: name.to_string(),
            kind: SymbolKind::Method,
            containing_type: ty,
            is_static,
            ty: ret,
            params: params.iter().copied().collect(),
        })
    }

    pub fn declare_field(
        &mut self,
        ty: TypeId,
        name: &str,
        field_ty: TypeId,
        is_static: bool,
    ) -> SymbolId {
        self.add_symbol(SymbolInfo {
            name: name.to_string(),
            kind: SymbolKind::Field,
            containing_type: ty,
            is_static,
            ty: field_ty,
            params: Default::default(),
        })
    }

    pub fn declare_event(
        &mut self,
        ty: TypeId,
        name: &str,
        delegate_ty: TypeId,
        is_static: bool,
    ) -> SymbolId {
        self.add_symbol(SymbolInfo {
            name: name.to_string(),
            kind: SymbolKind::Event,
            containing_type: ty,
            is_static,
            ty: delegate_ty,
            params: Default::default(),
        })
    }

    pub fn declare_unary_operator(
        &mut self,
        ty: TypeId,
        op: OperatorKind,
        operand: TypeId,
        ret: TypeId,
    ) -> SymbolId {
        let id = self.add_symbol(SymbolInfo {
            name: format!("operator {}", op.token()),
            kind: SymbolKind::OperatorMethod,
            containing_type: ty,
            is_static: true,
            ty: ret,
            params: [operand].into_iter().collect(),
        });
        self.operators.insert((ty, op), id);
        id
    }

    pub fn declare_binary_operator(
        &mut self,
        ty: TypeId,
        op: OperatorKind,
        left: TypeId,
        right: TypeId,
        ret: TypeId,
    ) -> SymbolId {
        let id = self.add_symbol(SymbolInfo {
            name: format!("operator {}", op.token()),
            kind: SymbolKind::OperatorMethod,
            containing_type: ty,
            is_static: true,
            ty: ret,
            params: [left, right].into_iter().collect(),
        });
        self.operators.insert((ty, op), id);
        id
    }

    /// Declare the paired `operator true`/`operator false` that lets a
    /// type participate in boolean contexts.
    pub fn declare_true_false_operators(&mut self, ty: TypeId) -> (SymbolId, SymbolId) {
        let t = self.declare_unary_operator(ty, OperatorKind::True, ty, TypeId::BOOL);
        let f = self.declare_unary_operator(ty, OperatorKind::False, ty, TypeId::BOOL);
        (t, f)
    }

    pub fn declare_conversion_operator(
        &mut self,
        from: TypeId,
        to: TypeId,
        implicit: bool,
    ) -> SymbolId {
        // The operator lives on whichever side is a declared type.
        let owner = if self.table.is_value_type(from) || self.table.is_reference_type(from) {
            from
        } else {
            to
        };
        let id = self.add_symbol(SymbolInfo {
            name: if implicit {
                "operator implicit".to_string()
            } else {
                "operator explicit".to_string()
            },
            kind: SymbolKind::ConversionOperator,
            containing_type: owner,
            is_static: true,
            ty: to,
            params: [from].into_iter().collect(),
        });
        self.conversions.push((from, to, id, implicit));
        id
    }

    // =========================================================================
    // Classification internals
    // =========================================================================

    fn derives_from(&self, derived: TypeId, base: TypeId) -> bool {
        let mut current = self.table.base_of(derived);
        while let Some(ty) = current {
            if ty == base {
                return true;
            }
            current = self.table.base_of(ty);
        }
        false
    }

    fn user_defined_conversion(&self, from: TypeId, to: TypeId) -> Option<Conversion> {
        for &(src, dst, op, implicit) in &self.conversions {
            if src == from && dst == to {
                let conv = Conversion::user_defined(op);
                return Some(if implicit { conv } else { conv.explicit_only() });
            }
        }
        None
    }
}

impl SemanticFacts for FactsHost {
    fn type_table(&self) -> &TypeTable {
        &self.table
    }

    fn symbol(&self, id: SymbolId) -> &SymbolInfo {
        &self.symbols[id.0 as usize]
    }

    fn resolve_name(&self, scope: TypeId, name: &str) -> Vec<SymbolId> {
        let mut found = Vec::new();
        let mut current = Some(scope);
        while let Some(ty) = current {
            if let Some(by_name) = self.members.get(&ty) {
                if let Some(ids) = by_name.get(name) {
                    found.extend_from_slice(ids);
                }
            }
            current = self.table.base_of(ty);
        }
        trace!(scope = ?scope, name, count = found.len(), "resolve_name");
        found
    }

    fn resolve_overload(&self, candidates: &[SymbolId], args: &[TypeId]) -> OverloadResolution {
        let mut applicable: Vec<(SymbolId, usize)> = Vec::new();
        for &id in candidates {
            let info = self.symbol(id);
            if info.params.len() != args.len() {
                continue;
            }
            let mut identity_count = 0usize;
            let mut ok = true;
            for (&arg, &param) in args.iter().zip(info.params.iter()) {
                let conv = self.classify_conversion(arg, param);
                if !conv.is_implicit() {
                    ok = false;
                    break;
                }
                if conv.is_identity() {
                    identity_count += 1;
                }
            }
            if ok {
                applicable.push((id, identity_count));
            }
        }
        trace!(candidates = candidates.len(), applicable = applicable.len(), "resolve_overload");
        match applicable.as_slice() {
            [] => OverloadResolution::NoMatch,
            [(single, _)] => OverloadResolution::Best(*single),
            _ => {
                let best_score = applicable.iter().map(|&(_, s)| s).max().unwrap_or(0);
                let mut best = applicable.iter().filter(|&&(_, s)| s == best_score);
                let first = best.next().map(|&(id, _)| id);
                let second = best.next().map(|&(id, _)| id);
                match (first, second) {
                    (Some(id), None) => OverloadResolution::Best(id),
                    (Some(a), Some(b)) => OverloadResolution::Ambiguous(a, b),
                    _ => OverloadResolution::NoMatch,
                }
            }
        }
    }

    fn classify_conversion(&self, from: TypeId, to: TypeId) -> Conversion {
        if from == to {
            return Conversion::identity();
        }
        // Suppress cascades from earlier failures.
        if from == TypeId::ERROR || to == TypeId::ERROR {
            return Conversion::identity();
        }
        // Dynamic converts both ways without a cast.
        if from == TypeId::DYNAMIC || to == TypeId::DYNAMIC {
            return Conversion::identity();
        }
        // Nominal rule: distinct delegate types never convert, signature
        // compatibility notwithstanding.
        if self.table.is_delegate(from) && self.table.is_delegate(to) {
            return Conversion::none();
        }
        // The null literal converts to any reference or nullable type.
        if from == TypeId::NULL {
            if self.table.is_reference_type(to) || self.table.nullable_underlying(to).is_some() {
                return Conversion::reference();
            }
            return Conversion::none();
        }
        if is_numeric(from) && is_numeric(to) {
            return if implicit_numeric(from, to) {
                Conversion::numeric()
            } else {
                Conversion::numeric().explicit_only()
            };
        }
        // Nullable wrapping and unwrapping.
        if let Some(underlying) = self.table.nullable_underlying(to) {
            if from == underlying {
                return Conversion::nullable();
            }
            if let Some(from_underlying) = self.table.nullable_underlying(from) {
                if implicit_numeric(from_underlying, underlying) {
                    return Conversion::nullable();
                }
                return Conversion::none();
            }
            if is_numeric(from) && is_numeric(underlying) && implicit_numeric(from, underlying) {
                return Conversion::nullable();
            }
        }
        if let Some(underlying) = self.table.nullable_underlying(from) {
            if to == underlying {
                return Conversion::nullable().explicit_only();
            }
        }
        if let Some(conv) = self.user_defined_conversion(from, to) {
            return conv;
        }
        // Reference conversions, boxing included.
        if to == TypeId::OBJECT && from != TypeId::VOID {
            return Conversion::reference();
        }
        if from == TypeId::OBJECT && self.table.is_reference_type(to) {
            return Conversion::reference().explicit_only();
        }
        if self.derives_from(from, to) {
            return Conversion::reference();
        }
        if self.derives_from(to, from) {
            return Conversion::reference().explicit_only();
        }
        Conversion::none()
    }

    fn lookup_operator(&self, ty: TypeId, op: OperatorKind) -> Option<SymbolId> {
        let mut current = Some(ty);
        while let Some(t) = current {
            if let Some(&id) = self.operators.get(&(t, op)) {
                trace!(ty = ?ty, declaring = ?t, op = ?op, "lookup_operator hit");
                return Some(id);
            }
            current = self.table.base_of(t);
        }
        None
    }
}
