use crate::token::Token;

/// Stable identity of a variable-like expression node, assigned by the parser
/// in creation order.  The resolver's distance table is keyed by this id, so
/// two syntactically identical references are still distinct keys.
pub type NodeId = usize;

/// A **literal constant** that appears directly in the source code.
///
/// These variants are the *terminal leaves* of the expression tree and
/// therefore do **not** retain a reference to the originating [`Token`]; the
/// parser copies (or converts) the value at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE-754 `f64`.
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal.
    Nil,
}

/// **Abstract-syntax-tree node** representing every kind of *expression* in
/// Lox.  The variant set is fixed by the grammar, so both the resolver and
/// the interpreter match on it exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Prefix unary operator expression, e.g. `!isReady` or `-42`.
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        /// Operand to which the operator is applied.
        right: Box<Expr>,
    },

    /// Infix arithmetic or comparison expression.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short-circuiting `and` / `or` expression.  Kept apart from `Binary`
    /// because the right operand may never be evaluated.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Parenthesised expression.
    Grouping(Box<Expr>),

    /// A variable reference.
    Variable {
        id: NodeId,
        name: Token,
    },

    /// Assignment to a previously declared variable.
    Assign {
        id: NodeId,
        name: Token,
        value: Box<Expr>,
    },

    /// Function or class invocation.  `paren` is the closing parenthesis,
    /// used to position arity/callability errors.
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// Property access `object.name`.
    Get {
        object: Box<Expr>,
        name: Token,
    },

    /// Property assignment `object.name = value`.
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method body.
    This {
        id: NodeId,
        keyword: Token,
    },

    /// Explicit superclass method access `super.method`.
    Super {
        id: NodeId,
        keyword: Token,
        method: Token,
    },
}
