//! Ambient state for one lowering pass.
//!
//! A `LoweringContext` carries the facts provider, options, the lexical
//! scope stack for locals, the enclosing member's shape (container type,
//! staticness, parameters, return type), and the diagnostic sink. One
//! context serves one lowering call; contexts share nothing, so unrelated
//! subtrees can be lowered on separate threads with separate contexts.

use opal_common::{Diagnostic, LoweringOptions, Span};
use opal_facts::{ConstValue, SemanticFacts, TypeId, TypeTable};
use rustc_hash::FxHashMap;

/// Facts about a local variable in scope.
#[derive(Clone, Debug)]
pub(crate) struct LocalInfo {
    pub ty: TypeId,
    /// Set for `const` locals; referenced constants propagate onto their
    /// `LocalReference` nodes.
    pub constant: Option<ConstValue>,
}

#[derive(Default)]
struct Scope {
    locals: FxHashMap<String, LocalInfo>,
}

/// State for one lowering pass over one syntax subtree.
pub struct LoweringContext<'a> {
    pub(crate) facts: &'a dyn SemanticFacts,
    pub(crate) options: LoweringOptions,
    pub(crate) diagnostics: Vec<Diagnostic>,
    scopes: Vec<Scope>,
    pub(crate) container: Option<TypeId>,
    pub(crate) container_is_static: bool,
    parameters: Vec<(String, TypeId)>,
    pub(crate) return_type: TypeId,
    /// Locals introduced by declaration patterns in the condition being
    /// lowered, drained into a scope by the enclosing statement.
    pub(crate) pending_pattern_locals: Vec<(String, TypeId)>,
}

impl<'a> LoweringContext<'a> {
    #[must_use]
    pub fn new(facts: &'a dyn SemanticFacts) -> Self {
        Self {
            facts,
            options: LoweringOptions::default(),
            diagnostics: Vec::new(),
            scopes: vec![Scope::default()],
            container: None,
            container_is_static: false,
            parameters: Vec::new(),
            return_type: TypeId::VOID,
            pending_pattern_locals: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: LoweringOptions) -> Self {
        self.options = options;
        self
    }

    /// Lower as if inside a member of `container`.
    #[must_use]
    pub fn in_container(mut self, container: TypeId, is_static: bool) -> Self {
        self.container = Some(container);
        self.container_is_static = is_static;
        self
    }

    /// Add a parameter of the enclosing member.
    #[must_use]
    pub fn with_parameter(mut self, name: &str, ty: TypeId) -> Self {
        self.parameters.push((name.to_string(), ty));
        self
    }

    /// Declared return type of the enclosing member; `void` by default.
    #[must_use]
    pub fn with_return_type(mut self, ty: TypeId) -> Self {
        self.return_type = ty;
        self
    }

    /// Pre-declare a local, for lowering fragments that reference
    /// surrounding declarations.
    pub fn declare_local(&mut self, name: &str, ty: TypeId) {
        self.insert_local(name, ty, None);
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // =========================================================================
    // Internals shared by the lowering modules
    // =========================================================================

    pub(crate) fn table(&self) -> &TypeTable {
        self.facts.type_table()
    }

    pub(crate) fn type_name(&self, ty: TypeId) -> String {
        self.table().display_name(ty)
    }

    pub(crate) fn error(&mut self, code: u32, span: Span, args: Vec<String>) {
        self.diagnostics.push(Diagnostic::error(code, span, args));
    }

    pub(crate) fn insert_local(&mut self, name: &str, ty: TypeId, constant: Option<ConstValue>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope
                .locals
                .insert(name.to_string(), LocalInfo { ty, constant });
        }
    }

    /// Innermost-scope-first local lookup.
    pub(crate) fn lookup_local(&self, name: &str) -> Option<&LocalInfo> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.locals.get(name))
    }

    pub(crate) fn lookup_parameter(&self, name: &str) -> Option<TypeId> {
        self.parameters
            .iter()
            .find(|(p, _)| p == name)
            .map(|&(_, ty)| ty)
    }

    /// Run `f` inside a fresh lexical scope.
    pub(crate) fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.push(Scope::default());
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Run `f` inside a fresh scope pre-seeded with `locals`.
    pub(crate) fn scoped_with<T>(
        &mut self,
        locals: &[(String, TypeId)],
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.scopes.push(Scope::default());
        for (name, ty) in locals {
            self.insert_local(name, *ty, None);
        }
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Run `f` with a temporarily replaced return type, for lambda bodies.
    pub(crate) fn with_return<T>(&mut self, ret: TypeId, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.return_type, ret);
        let result = f(self);
        self.return_type = saved;
        result
    }
}
