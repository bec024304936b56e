//! Typed syntax tree consumed by the opal lowering engine.
//!
//! Parsing is an external collaborator: callers hand the engine an
//! already-parsed syntax tree whose type annotations have been resolved to
//! `TypeId`s. This crate is purely the data model for that input, plus
//! terse builder shorthands so tests and embedders can construct trees
//! inline. A syntactic gap the upstream parser recovered from is an
//! explicit `Missing` node, never an absent child.

pub mod ast;
pub use ast::{
    ArgMode, ArgumentSyntax, BinaryOp, CatchSyntax, DeclarationGroupSyntax, DeclaratorSyntax,
    ExprKind, ExprSyntax, InterpolatedPart, LambdaBody, LambdaParam, PatternSyntax, StmtKind,
    StmtSyntax, UnaryOp,
};
