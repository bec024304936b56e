//! Syntax node definitions.
//!
//! Expression and statement nodes are enum trees with owned `Box`/`Vec`
//! children. Every node carries a `Span` into the original source; nodes
//! built programmatically default to the empty span.

use opal_common::Span;
use opal_facts::{ConstValue, TypeId};

// =============================================================================
// Operators and argument modes
// =============================================================================

/// Unary operator token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Minus,
    /// `!x`
    LogicalNot,
    /// `~x`
    BitwiseNot,
}

/// Binary operator token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
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
    /// `&&`
    ConditionalAnd,
    /// `||`
    ConditionalOr,
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
}

/// Argument passing mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArgMode {
    Value,
    Ref,
    Out,
}

/// One invocation or constructor argument.
#[derive(Clone, Debug)]
pub struct ArgumentSyntax {
    pub mode: ArgMode,
    pub value: ExprSyntax,
}

impl ArgumentSyntax {
    #[must_use]
    pub fn value(value: ExprSyntax) -> Self {
        Self {
            mode: ArgMode::Value,
            value,
        }
    }

    #[must_use]
    pub fn by_mode(mode: ArgMode, value: ExprSyntax) -> Self {
        Self { mode, value }
    }
}

// =============================================================================
// Expressions
// =============================================================================

/// A pattern on the right of `is`.
#[derive(Clone, Debug)]
pub enum PatternSyntax {
    /// `x is T`
    Type(TypeId),
    /// `x is T t` — introduces the local `t` into scope.
    Declaration { ty: TypeId, name: String },
}

/// Lambda parameter; the type is absent when the parameter is implicitly
/// typed from the target delegate.
#[derive(Clone, Debug)]
pub struct LambdaParam {
    pub name: String,
    pub ty: Option<TypeId>,
}

/// Lambda body: a bare expression or a statement block.
#[derive(Clone, Debug)]
pub enum LambdaBody {
    Expression(Box<ExprSyntax>),
    Block(Vec<StmtSyntax>),
}

/// One segment of an interpolated string.
#[derive(Clone, Debug)]
pub enum InterpolatedPart {
    Text(String),
    Interpolation(Box<ExprSyntax>),
}

/// An expression syntax node.
#[derive(Clone, Debug)]
pub struct ExprSyntax {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    /// Literal with its compile-time value: `42`, `"s"`, `true`, `null`
    Literal(ConstValue),

    /// Bare identifier: `x`, `M`
    Identifier(String),

    /// Member access: `receiver.member`
    MemberAccess {
        receiver: Box<ExprSyntax>,
        member: String,
    },

    /// Invocation: `callee(args)`
    Invocation {
        callee: Box<ExprSyntax>,
        args: Vec<ArgumentSyntax>,
    },

    /// Prefix unary: `+x`, `-x`, `!x`, `~x`
    Unary {
        op: UnaryOp,
        operand: Box<ExprSyntax>,
    },

    /// `++x`, `x--`, ...
    IncrementOrDecrement {
        target: Box<ExprSyntax>,
        is_increment: bool,
        is_postfix: bool,
    },

    /// Binary: `left op right`
    Binary {
        op: BinaryOp,
        left: Box<ExprSyntax>,
        right: Box<ExprSyntax>,
    },

    /// Simple assignment: `target = value`
    Assignment {
        target: Box<ExprSyntax>,
        value: Box<ExprSyntax>,
    },

    /// Compound assignment: `target op= value`; `+=`/`-=` on an event
    /// target binds the event accessors instead.
    CompoundAssignment {
        op: BinaryOp,
        target: Box<ExprSyntax>,
        value: Box<ExprSyntax>,
    },

    /// Explicit cast: `(T)operand`
    Cast {
        ty: TypeId,
        operand: Box<ExprSyntax>,
    },

    /// Object creation: `new T(args)`; delegate-typed `T` routes through
    /// delegate-creation binding.
    ObjectCreation {
        ty: TypeId,
        args: Vec<ArgumentSyntax>,
    },

    /// Lambda: `(params) => body`
    Lambda {
        params: Vec<LambdaParam>,
        body: LambdaBody,
    },

    /// `operand is pattern`
    IsPattern {
        operand: Box<ExprSyntax>,
        pattern: PatternSyntax,
    },

    /// Interpolated string: `$"a{x}b"`
    InterpolatedString { parts: Vec<InterpolatedPart> },

    /// A syntax slot the parser could not fill.
    Missing,
}

impl ExprSyntax {
    #[must_use]
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            span: Span::empty(),
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Printable syntax kind name.
    #[must_use]
    pub fn syntax_kind(&self) -> &'static str {
        match &self.kind {
            ExprKind::Literal(value) => match value {
                ConstValue::Bool(true) => "TrueLiteralExpression",
                ConstValue::Bool(false) => "FalseLiteralExpression",
                ConstValue::Int(_) | ConstValue::UInt(_) | ConstValue::Float(_) => {
                    "NumericLiteralExpression"
                }
                ConstValue::Char(_) => "CharacterLiteralExpression",
                ConstValue::Str(_) => "StringLiteralExpression",
                ConstValue::Null => "NullLiteralExpression",
            },
            ExprKind::Identifier(_) => "IdentifierName",
            ExprKind::MemberAccess { .. } => "SimpleMemberAccessExpression",
            ExprKind::Invocation { .. } => "InvocationExpression",
            ExprKind::Unary { .. } => "UnaryExpression",
            ExprKind::IncrementOrDecrement {
                is_increment,
                is_postfix,
                ..
            } => match (is_increment, is_postfix) {
                (true, false) => "PreIncrementExpression",
                (true, true) => "PostIncrementExpression",
                (false, false) => "PreDecrementExpression",
                (false, true) => "PostDecrementExpression",
            },
            ExprKind::Binary { .. } => "BinaryExpression",
            ExprKind::Assignment { .. } => "SimpleAssignmentExpression",
            ExprKind::CompoundAssignment { .. } => "CompoundAssignmentExpression",
            ExprKind::Cast { .. } => "CastExpression",
            ExprKind::ObjectCreation { .. } => "ObjectCreationExpression",
            ExprKind::Lambda { .. } => "LambdaExpression",
            ExprKind::IsPattern { .. } => "IsPatternExpression",
            ExprKind::InterpolatedString { .. } => "InterpolatedStringExpression",
            ExprKind::Missing => "MissingExpression",
        }
    }

    // =========================================================================
    // Builder shorthands
    // =========================================================================

    #[must_use]
    pub fn lit(value: ConstValue) -> Self {
        Self::new(ExprKind::Literal(value))
    }

    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::lit(ConstValue::Int(value))
    }

    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::lit(ConstValue::Bool(value))
    }

    #[must_use]
    pub fn string(value: &str) -> Self {
        Self::lit(ConstValue::Str(value.to_string()))
    }

    #[must_use]
    pub fn null() -> Self {
        Self::lit(ConstValue::Null)
    }

    #[must_use]
    pub fn ident(name: &str) -> Self {
        Self::new(ExprKind::Identifier(name.to_string()))
    }

    #[must_use]
    pub fn member(receiver: Self, member: &str) -> Self {
        Self::new(ExprKind::MemberAccess {
            receiver: Box::new(receiver),
            member: member.to_string(),
        })
    }

    #[must_use]
    pub fn invoke(callee: Self, args: Vec<ArgumentSyntax>) -> Self {
        Self::new(ExprKind::Invocation {
            callee: Box::new(callee),
            args,
        })
    }

    #[must_use]
    pub fn call(callee: Self, args: Vec<Self>) -> Self {
        Self::invoke(callee, args.into_iter().map(ArgumentSyntax::value).collect())
    }

    #[must_use]
    pub fn unary(op: UnaryOp, operand: Self) -> Self {
        Self::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    #[must_use]
    pub fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::new(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    #[must_use]
    pub fn assign(target: Self, value: Self) -> Self {
        Self::new(ExprKind::Assignment {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    #[must_use]
    pub fn compound_assign(op: BinaryOp, target: Self, value: Self) -> Self {
        Self::new(ExprKind::CompoundAssignment {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    #[must_use]
    pub fn cast(ty: TypeId, operand: Self) -> Self {
        Self::new(ExprKind::Cast {
            ty,
            operand: Box::new(operand),
        })
    }

    #[must_use]
    pub fn new_object(ty: TypeId, args: Vec<ArgumentSyntax>) -> Self {
        Self::new(ExprKind::ObjectCreation { ty, args })
    }

    #[must_use]
    pub fn lambda(params: Vec<LambdaParam>, body: LambdaBody) -> Self {
        Self::new(ExprKind::Lambda { params, body })
    }

    #[must_use]
    pub fn is_type(operand: Self, ty: TypeId) -> Self {
        Self::new(ExprKind::IsPattern {
            operand: Box::new(operand),
            pattern: PatternSyntax::Type(ty),
        })
    }

    #[must_use]
    pub fn is_declared(operand: Self, ty: TypeId, name: &str) -> Self {
        Self::new(ExprKind::IsPattern {
            operand: Box::new(operand),
            pattern: PatternSyntax::Declaration {
                ty,
                name: name.to_string(),
            },
        })
    }

    #[must_use]
    pub fn missing() -> Self {
        Self::new(ExprKind::Missing)
    }
}

// =============================================================================
// Statements
// =============================================================================

/// One declarator in a declaration group: `name = initializer`.
///
/// `initializer: None` is the legal no-initializer state; a parser-recovered
/// gap after `=` is `Some(ExprSyntax::missing())`.
#[derive(Clone, Debug)]
pub struct DeclaratorSyntax {
    pub name: String,
    pub span: Span,
    pub initializer: Option<ExprSyntax>,
}

impl DeclaratorSyntax {
    #[must_use]
    pub fn new(name: &str, initializer: Option<ExprSyntax>) -> Self {
        Self {
            name: name.to_string(),
            span: Span::empty(),
            initializer,
        }
    }
}

/// A comma-separated declaration group, shared by local declaration
/// statements and `using`/`fixed`/for-initializer positions.
#[derive(Clone, Debug)]
pub struct DeclarationGroupSyntax {
    pub is_const: bool,
    pub ty: TypeId,
    pub declarators: Vec<DeclaratorSyntax>,
}

/// One `catch` clause.
#[derive(Clone, Debug)]
pub struct CatchSyntax {
    pub exception_type: Option<TypeId>,
    pub local: Option<String>,
    pub body: Vec<StmtSyntax>,
}

/// A statement syntax node.
#[derive(Clone, Debug)]
pub struct StmtSyntax {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    /// `{ statements }`
    Block(Vec<StmtSyntax>),

    /// `expr;`
    Expression(Box<ExprSyntax>),

    /// `T a = 1, b;` / `const T a = 1;`
    LocalDeclaration(DeclarationGroupSyntax),

    /// `if (condition) then else alt`
    If {
        condition: Box<ExprSyntax>,
        then_branch: Box<StmtSyntax>,
        else_branch: Option<Box<StmtSyntax>>,
    },

    /// Top-tested loop: `while (condition) body`
    While {
        condition: Box<ExprSyntax>,
        body: Box<StmtSyntax>,
    },

    /// Bottom-tested loop: `do body while (condition);`
    Do {
        body: Box<StmtSyntax>,
        condition: Box<ExprSyntax>,
    },

    Break,
    Continue,

    /// `return;` / `return expr;`
    Return(Option<Box<ExprSyntax>>),

    /// `try { } catch (T t) { } finally { }`
    Try {
        body: Vec<StmtSyntax>,
        catches: Vec<CatchSyntax>,
        finally: Option<Vec<StmtSyntax>>,
    },

    /// `using (T x = e) body`
    Using {
        declaration: DeclarationGroupSyntax,
        body: Box<StmtSyntax>,
    },

    /// `fixed (T* p = e) body`
    Fixed {
        declaration: DeclarationGroupSyntax,
        body: Box<StmtSyntax>,
    },

    /// A statement slot the parser could not fill.
    Missing,
}

impl StmtSyntax {
    #[must_use]
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            span: Span::empty(),
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Printable syntax kind name.
    #[must_use]
    pub fn syntax_kind(&self) -> &'static str {
        match &self.kind {
            StmtKind::Block(_) => "Block",
            StmtKind::Expression(_) => "ExpressionStatement",
            StmtKind::LocalDeclaration(group) => {
                if group.is_const {
                    "ConstLocalDeclarationStatement"
                } else {
                    "LocalDeclarationStatement"
                }
            }
            StmtKind::If { .. } => "IfStatement",
            StmtKind::While { .. } => "WhileStatement",
            StmtKind::Do { .. } => "DoStatement",
            StmtKind::Break => "BreakStatement",
            StmtKind::Continue => "ContinueStatement",
            StmtKind::Return(_) => "ReturnStatement",
            StmtKind::Try { .. } => "TryStatement",
            StmtKind::Using { .. } => "UsingStatement",
            StmtKind::Fixed { .. } => "FixedStatement",
            StmtKind::Missing => "MissingStatement",
        }
    }

    // =========================================================================
    // Builder shorthands
    // =========================================================================

    #[must_use]
    pub fn block(statements: Vec<Self>) -> Self {
        Self::new(StmtKind::Block(statements))
    }

    #[must_use]
    pub fn expr(expression: ExprSyntax) -> Self {
        Self::new(StmtKind::Expression(Box::new(expression)))
    }

    #[must_use]
    pub fn declare(ty: TypeId, declarators: Vec<DeclaratorSyntax>) -> Self {
        Self::new(StmtKind::LocalDeclaration(DeclarationGroupSyntax {
            is_const: false,
            ty,
            declarators,
        }))
    }

    #[must_use]
    pub fn declare_const(ty: TypeId, declarators: Vec<DeclaratorSyntax>) -> Self {
        Self::new(StmtKind::LocalDeclaration(DeclarationGroupSyntax {
            is_const: true,
            ty,
            declarators,
        }))
    }

    #[must_use]
    pub fn if_stmt(condition: ExprSyntax, then_branch: Self, else_branch: Option<Self>) -> Self {
        Self::new(StmtKind::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    #[must_use]
    pub fn while_stmt(condition: ExprSyntax, body: Self) -> Self {
        Self::new(StmtKind::While {
            condition: Box::new(condition),
            body: Box::new(body),
        })
    }

    #[must_use]
    pub fn do_stmt(body: Self, condition: ExprSyntax) -> Self {
        Self::new(StmtKind::Do {
            body: Box::new(body),
            condition: Box::new(condition),
        })
    }

    #[must_use]
    pub fn ret(value: Option<ExprSyntax>) -> Self {
        Self::new(StmtKind::Return(value.map(Box::new)))
    }

    #[must_use]
    pub fn missing() -> Self {
        Self::new(StmtKind::Missing)
    }
}
