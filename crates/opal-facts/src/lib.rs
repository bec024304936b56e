//! Symbol and type facts provider for the opal semantic lowering core.
//!
//! The lowering engine treats name resolution, overload resolution,
//! conversion classification, and operator lookup as a pure query service.
//! This crate defines that service (`SemanticFacts`), the identifiers it
//! traffics in (`TypeId`, `SymbolId`), the data-driven built-in operator
//! tables, and an in-memory implementation (`FactsHost`) used by tests and
//! embedders that do not bring their own symbol table.

// Type identifiers, the type table, and compile-time constant values
pub mod types;
pub use types::{ConstValue, IntrinsicKind, MethodSig, TypeData, TypeId, TypeTable};

// Symbols and the query trait
pub mod provider;
pub use provider::{
    Conversion, ConversionFlags, OperatorKind, OverloadResolution, SemanticFacts, SymbolId,
    SymbolInfo, SymbolKind,
};

// Built-in operator tables (numeric promotion)
pub mod operators;
pub use operators::{
    BuiltinBinary, BuiltinUnary, NARROW_NUMERIC, binary_builtin, binary_promotion, is_numeric,
    unary_builtin,
};

// In-memory facts implementation
pub mod host;
pub use host::FactsHost;
