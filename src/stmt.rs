use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Token;

/// A function or method declaration: name, parameters, body.
///
/// Shared via `Rc` because runtime function objects keep their declaration
/// alive past the statement that introduced them (closures returned from
/// functions, methods held by classes).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

/// Every kind of *statement* in Lox.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A bare expression evaluated for its side effects.
    Expression(Expr),

    /// `print expr;`
    Print(Expr),

    /// `var name = initializer;` — uninitialised variables get nil.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// `{ ... }` — executes in a fresh child scope.
    Block(Vec<Stmt>),

    /// `if (condition) then_branch else else_branch`
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while (condition) body`
    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    /// `fun name(params) { body }`
    Function(Rc<FunctionDecl>),

    /// `return value;` — `keyword` positions the static-placement error.
    Return {
        keyword: Token,
        value: Option<Expr>,
    },

    /// `class Name < Superclass { methods }` — `superclass` is always an
    /// `Expr::Variable` when present (enforced by the parser) so it takes
    /// part in ordinary variable resolution.
    Class {
        name: Token,
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
