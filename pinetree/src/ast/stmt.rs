//! Statement AST nodes

use super::{Expr, Spanned};
use serde::{Deserialize, Serialize};

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `var x = e;` or `Type x = e;`
    VarDecl {
        name: String,
        ty: Option<String>,
        value: Option<Spanned<Expr>>,
    },

    If {
        predicate: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
        else_body: Option<Box<Spanned<Stmt>>>,
    },

    While {
        predicate: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },

    For {
        init: Option<Box<Spanned<Stmt>>>,
        predicate: Option<Spanned<Expr>>,
        increment: Option<Spanned<Expr>>,
        body: Box<Spanned<Stmt>>,
    },

    Return(Option<Spanned<Expr>>),

    Try { body: Block, catch: CatchClause },

    Raise(Spanned<Expr>),

    /// `import a.b;`
    Import(String),

    /// Lexical scope `{ ... }`
    Block(Block),

    Expr(Spanned<Expr>),

    Empty,
}

/// A braced statement list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

impl Block {
    pub fn new(stmts: Vec<Spanned<Stmt>>) -> Self {
        Self { stmts }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub variable: Option<String>,
    pub body: Block,
}
