//! Diagnostic message data: templates and code constants.
//!
//! The code numbering follows the original compiler's numbering for the
//! conditions this core detects, so downstream tooling keyed on codes keeps
//! working. Only codes the lowering core actually emits are listed.

use super::{DiagnosticCategory, DiagnosticMessage};

/// Code constants for every diagnostic the lowering core emits.
pub mod diagnostic_codes {
    /// Operator '{0}' cannot be applied to operands of type '{1}' and '{2}'
    pub const BAD_BINARY_OPS: u32 = 19;
    /// Operator '{0}' cannot be applied to operand of type '{1}'
    pub const BAD_UNARY_OP: u32 = 23;
    /// Cannot implicitly convert type '{0}' to '{1}'
    pub const NO_IMPLICIT_CONV: u32 = 29;
    /// Cannot convert type '{0}' to '{1}'
    pub const NO_EXPLICIT_CONV: u32 = 30;
    /// The name '{0}' does not exist in the current context
    pub const NAME_NOT_IN_CONTEXT: u32 = 103;
    /// '{0}' does not contain a definition for '{1}'
    pub const NO_SUCH_MEMBER: u32 = 117;
    /// An object reference is required for the non-static member '{0}'
    pub const OBJECT_REQUIRED: u32 = 120;
    /// The call is ambiguous between '{0}' and '{1}'
    pub const AMBIGUOUS_CALL: u32 = 121;
    /// No overload for '{0}' matches delegate '{1}'
    pub const NO_OVERLOAD_MATCHES_DELEGATE: u32 = 123;
    /// The expression assigned to '{0}' must be constant
    pub const CONST_NOT_CONSTANT: u32 = 133;
    /// Method name expected
    pub const METHOD_NAME_EXPECTED: u32 = 149;
    /// Member '{0}' cannot be accessed with an instance reference
    pub const STATIC_MEMBER_VIA_INSTANCE: u32 = 176;
    /// Only assignment, call, increment, decrement, and new object
    /// expressions can be used as a statement
    pub const ILLEGAL_STATEMENT: u32 = 201;
    /// Cannot implicitly convert type '{0}' to '{1}'; an explicit
    /// conversion exists
    pub const IMPLICIT_CONV_NEEDS_CAST: u32 = 266;
    /// '{0}' has the wrong return type
    pub const WRONG_RETURN_TYPE: u32 = 407;
    /// No overload for method '{0}' takes {1} arguments
    pub const BAD_ARG_COUNT: u32 = 1501;
    /// Argument {0}: cannot convert from '{1}' to '{2}'
    pub const BAD_ARG_TYPE: u32 = 1503;
    /// Invalid expression term '{0}'
    pub const INVALID_EXPR_TERM: u32 = 1525;
    /// Delegate '{0}' does not take {1} arguments
    pub const BAD_DELEGATE_ARG_COUNT: u32 = 1593;
}

use diagnostic_codes as codes;

/// Default English templates, one entry per emitted code.
pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: codes::BAD_BINARY_OPS,
        category: DiagnosticCategory::Error,
        message: "Operator '{0}' cannot be applied to operands of type '{1}' and '{2}'",
    },
    DiagnosticMessage {
        code: codes::BAD_UNARY_OP,
        category: DiagnosticCategory::Error,
        message: "Operator '{0}' cannot be applied to operand of type '{1}'",
    },
    DiagnosticMessage {
        code: codes::NO_IMPLICIT_CONV,
        category: DiagnosticCategory::Error,
        message: "Cannot implicitly convert type '{0}' to '{1}'",
    },
    DiagnosticMessage {
        code: codes::NO_EXPLICIT_CONV,
        category: DiagnosticCategory::Error,
        message: "Cannot convert type '{0}' to '{1}'",
    },
    DiagnosticMessage {
        code: codes::NAME_NOT_IN_CONTEXT,
        category: DiagnosticCategory::Error,
        message: "The name '{0}' does not exist in the current context",
    },
    DiagnosticMessage {
        code: codes::NO_SUCH_MEMBER,
        category: DiagnosticCategory::Error,
        message: "'{0}' does not contain a definition for '{1}'",
    },
    DiagnosticMessage {
        code: codes::OBJECT_REQUIRED,
        category: DiagnosticCategory::Error,
        message: "An object reference is required for the non-static member '{0}'",
    },
    DiagnosticMessage {
        code: codes::AMBIGUOUS_CALL,
        category: DiagnosticCategory::Error,
        message: "The call is ambiguous between the following methods: '{0}' and '{1}'",
    },
    DiagnosticMessage {
        code: codes::NO_OVERLOAD_MATCHES_DELEGATE,
        category: DiagnosticCategory::Error,
        message: "No overload for '{0}' matches delegate '{1}'",
    },
    DiagnosticMessage {
        code: codes::CONST_NOT_CONSTANT,
        category: DiagnosticCategory::Error,
        message: "The expression being assigned to '{0}' must be constant",
    },
    DiagnosticMessage {
        code: codes::METHOD_NAME_EXPECTED,
        category: DiagnosticCategory::Error,
        message: "Method name expected",
    },
    DiagnosticMessage {
        code: codes::STATIC_MEMBER_VIA_INSTANCE,
        category: DiagnosticCategory::Error,
        message: "Member '{0}' cannot be accessed with an instance reference; qualify it with a type name instead",
    },
    DiagnosticMessage {
        code: codes::ILLEGAL_STATEMENT,
        category: DiagnosticCategory::Error,
        message: "Only assignment, call, increment, decrement, and new object expressions can be used as a statement",
    },
    DiagnosticMessage {
        code: codes::IMPLICIT_CONV_NEEDS_CAST,
        category: DiagnosticCategory::Error,
        message: "Cannot implicitly convert type '{0}' to '{1}'. An explicit conversion exists (are you missing a cast?)",
    },
    DiagnosticMessage {
        code: codes::WRONG_RETURN_TYPE,
        category: DiagnosticCategory::Error,
        message: "'{0}' has the wrong return type",
    },
    DiagnosticMessage {
        code: codes::BAD_ARG_COUNT,
        category: DiagnosticCategory::Error,
        message: "No overload for method '{0}' takes {1} arguments",
    },
    DiagnosticMessage {
        code: codes::BAD_ARG_TYPE,
        category: DiagnosticCategory::Error,
        message: "Argument {0}: cannot convert from '{1}' to '{2}'",
    },
    DiagnosticMessage {
        code: codes::INVALID_EXPR_TERM,
        category: DiagnosticCategory::Error,
        message: "Invalid expression term '{0}'",
    },
    DiagnosticMessage {
        code: codes::BAD_DELEGATE_ARG_COUNT,
        category: DiagnosticCategory::Error,
        message: "Delegate '{0}' does not take {1} arguments",
    },
];
