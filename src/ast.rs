//! Immutable AST produced by the parser.
//!
//! Nodes that contain token references borrow from the scanner's token
//! slice (`&'a Token<'a>`), so the whole tree is zero-copy with respect to
//! the source except for string literal contents.
//!
//! Variable references carry an [`ExprId`]: a stable integer identity
//! handed out by the parser at construction time, one per *node instance*.
//! The resolver keys its hop-count table by these ids, which makes the
//! table identity-keyed even though two occurrences of `x` are structurally
//! equal. Nothing else in the crate may mint ids.

use crate::token::Token;

/// Stable identity of a single variable-reference node (`Variable` or
/// `Assign`). Two syntactically identical expressions never share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

/// A literal constant appearing directly in the source. These are the
/// terminal leaves of the expression tree; the parser decodes the value at
/// parse time so literals carry no token reference.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, IEEE-754 `f64`. `"3"` parses as `3.0`.
    Number(f64),

    /// String literal without the surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal.
    Nil,
}

/// Expression node. Each allocated node is distinct; identity (via
/// [`ExprId`] on the variable-reference variants) is what the resolver's
/// output is keyed on, never structural equality.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Prefix unary operator: `!isReady`, `-42`.
    Unary {
        /// The operator token (`!` or `-`).
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Infix binary operator: `a + b`, `x <= y`.
    Binary {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Parenthesised sub-expression.
    Grouping(Box<Expr<'a>>),

    /// Variable read.
    Variable {
        id: ExprId,
        name: &'a Token<'a>,
    },

    /// Assignment expression: `name = value`.
    Assign {
        id: ExprId,
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    /// Short-circuiting `and` / `or`.
    Logical {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Call expression: `clock()`, `add(1, 2)`.
    Call {
        /// Expression evaluating to a callable value.
        callee: Box<Expr<'a>>,
        /// The closing `)` token, retained for runtime error locations.
        paren: &'a Token<'a>,
        /// Arguments in source order (may be empty).
        arguments: Vec<Expr<'a>>,
    },
}

/// A function declaration: shared between the `Stmt::Function` statement
/// that defines it and every closure value created from it (closures
/// borrow the declaration rather than cloning the body).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl<'a> {
    pub name: &'a Token<'a>,

    /// Parameter name tokens (arity ≤ 255, enforced by the parser).
    pub params: Vec<&'a Token<'a>>,

    /// Body statements, executed in a fresh scope per call.
    pub body: Vec<Stmt<'a>>,
}

/// Statement node. A program is the ordered `Vec<Stmt>` returned by the
/// parser. Note there is no `For` variant: `for` loops desugar at parse
/// time into an initializer block around a `While`.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    /// Stand-alone expression terminated by a semicolon.
    Expression(Expr<'a>),

    /// `print` statement.
    Print(Expr<'a>),

    /// Variable declaration: `var IDENT ("=" initializer)? ";"`.
    Var {
        name: &'a Token<'a>,
        initializer: Option<Expr<'a>>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt<'a>>),

    /// `if` / `else` conditional.
    If {
        condition: Expr<'a>,
        then_branch: Box<Stmt<'a>>,
        else_branch: Option<Box<Stmt<'a>>>,
    },

    /// `while` loop (also the desugared form of `for`).
    While {
        condition: Expr<'a>,
        body: Box<Stmt<'a>>,
    },

    /// Function declaration — becomes a first-class callable value.
    Function(FunctionDecl<'a>),

    /// `return` inside a function body.
    Return {
        /// The `return` keyword token (for error locations).
        keyword: &'a Token<'a>,

        /// Optional result expression; absent means `nil`.
        value: Option<Expr<'a>>,
    },
}
