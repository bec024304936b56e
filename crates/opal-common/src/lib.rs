//! Common types and utilities for the opal semantic lowering core.
//!
//! This crate provides foundational types used across all opal crates:
//! - Source spans (`Span`)
//! - Structured diagnostics (`Diagnostic`, message templates, codes)
//! - Lowering configuration (`LoweringOptions`)

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Diagnostic records, codes, and message templates
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory};

// Lowering configuration
pub mod options;
pub use options::LoweringOptions;
