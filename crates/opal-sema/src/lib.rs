//! Semantic operation-tree construction.
//!
//! Lowers typed syntax into a uniform operation representation suitable
//! for analyzers: every expression and statement becomes an [`Operation`]
//! node carrying its type, constant value, validity, and implicitness,
//! with implicit conversions materialized as nodes and resolution failures
//! preserved as flagged best-effort shapes rather than dropped subtrees.
//!
//! Lowering is a pure, synchronous function of (syntax, ambient context,
//! facts provider); trees are immutable once built. [`describe`] renders
//! the canonical text form, [`validate`] checks the structural invariants.

// The operation node model
pub mod ops;
pub use ops::{BranchKind, ChildSlot, Operation, OperationData, OperatorInfo};

// Canonical tree printing
pub mod printer;
pub use printer::{describe, describe_with_source};

// Invariant checking
pub mod validate;
pub use validate::{InvariantViolation, validate};

// Ambient lowering state
mod context;
pub use context::LoweringContext;

// The engines
mod delegates;
mod expr;
mod statements;

use opal_common::Diagnostic;
use opal_facts::{SemanticFacts, TypeId};
use opal_syntax::{ExprSyntax, StmtSyntax};

/// Lower a free-standing expression, optionally against an ambient target
/// type such as the declared type of an initialized variable.
pub fn lower_expression(
    syntax: &ExprSyntax,
    target: Option<TypeId>,
    facts: &dyn SemanticFacts,
) -> (Operation, Vec<Diagnostic>) {
    let mut ctx = LoweringContext::new(facts);
    let op = ctx.lower_expression(syntax, target);
    let diagnostics = ctx.take_diagnostics();
    (op, diagnostics)
}

/// Lower a statement.
pub fn lower_statement(
    syntax: &StmtSyntax,
    facts: &dyn SemanticFacts,
) -> (Operation, Vec<Diagnostic>) {
    let mut ctx = LoweringContext::new(facts);
    let op = ctx.lower_statement(syntax);
    let diagnostics = ctx.take_diagnostics();
    (op, diagnostics)
}

impl LoweringContext<'_> {
    /// Lower an expression with this context's scopes and container.
    pub fn lower_expression(&mut self, syntax: &ExprSyntax, target: Option<TypeId>) -> Operation {
        let op = self.lower_with_target(syntax, target);
        self.pending_pattern_locals.clear();
        op
    }

    /// Lower a statement with this context's scopes and container.
    pub fn lower_statement(&mut self, syntax: &StmtSyntax) -> Operation {
        self.lower_stmt(syntax)
    }
}
