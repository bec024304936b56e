//! Diagnostic records, codes, and message templates.
//!
//! The lowering core emits structured diagnostic records only; message
//! formatting/localization belongs to downstream consumers. The template
//! table in `data.rs` exists so harnesses and tests can render a default
//! English message without owning a formatter.

use crate::span::Span;
use serde::Serialize;

// Diagnostic message templates and code constants
mod data;
pub use data::{DIAGNOSTIC_MESSAGES, diagnostic_codes};

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

/// A structured diagnostic record.
///
/// Immutable once emitted; sinks append records and never mutate them.
/// `message_args` are the ordered `{0}`, `{1}`, ... template arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub span: Span,
    pub message_args: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub fn error(code: u32, span: Span, args: impl IntoIterator<Item = String>) -> Self {
        Self {
            code,
            category: DiagnosticCategory::Error,
            span,
            message_args: args.into_iter().collect(),
        }
    }

    /// Render the default English message for this record, if the code is
    /// known to the template table.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        get_message_template(self.code).map(|template| {
            let args: Vec<&str> = self.message_args.iter().map(String::as_str).collect();
            format_message(template, &args)
        })
    }
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the message template for a diagnostic code.
///
/// Returns the template string with `{0}`, `{1}`, etc. placeholders.
/// Use `format_message()` to fill in the placeholders.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    get_diagnostic_message(code).map(|m| m.message)
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_constant_has_a_template() {
        for code in [
            diagnostic_codes::BAD_BINARY_OPS,
            diagnostic_codes::BAD_UNARY_OP,
            diagnostic_codes::NO_IMPLICIT_CONV,
            diagnostic_codes::NO_EXPLICIT_CONV,
            diagnostic_codes::NAME_NOT_IN_CONTEXT,
            diagnostic_codes::NO_SUCH_MEMBER,
            diagnostic_codes::OBJECT_REQUIRED,
            diagnostic_codes::AMBIGUOUS_CALL,
            diagnostic_codes::NO_OVERLOAD_MATCHES_DELEGATE,
            diagnostic_codes::CONST_NOT_CONSTANT,
            diagnostic_codes::METHOD_NAME_EXPECTED,
            diagnostic_codes::STATIC_MEMBER_VIA_INSTANCE,
            diagnostic_codes::ILLEGAL_STATEMENT,
            diagnostic_codes::IMPLICIT_CONV_NEEDS_CAST,
            diagnostic_codes::WRONG_RETURN_TYPE,
            diagnostic_codes::BAD_ARG_COUNT,
            diagnostic_codes::BAD_ARG_TYPE,
            diagnostic_codes::INVALID_EXPR_TERM,
            diagnostic_codes::BAD_DELEGATE_ARG_COUNT,
        ] {
            assert!(
                get_message_template(code).is_some(),
                "missing template for code {code}"
            );
        }
    }

    #[test]
    fn format_fills_placeholders_in_order() {
        let d = Diagnostic::error(
            diagnostic_codes::BAD_BINARY_OPS,
            Span::new(0, 5),
            ["+".to_string(), "C".to_string(), "bool".to_string()],
        );
        assert_eq!(
            d.message().unwrap(),
            "Operator '+' cannot be applied to operands of type 'C' and 'bool'"
        );
    }

    #[test]
    fn diagnostics_serialize_to_json() {
        let d = Diagnostic::error(
            diagnostic_codes::NAME_NOT_IN_CONTEXT,
            Span::new(2, 3),
            ["x".to_string()],
        );
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"code\":103"));
    }
}
