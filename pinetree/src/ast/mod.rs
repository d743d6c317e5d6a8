//! Abstract Syntax Tree definitions

mod expr;
mod span;
mod stmt;

pub use expr::*;
pub use span::*;
pub use stmt::*;

use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// A source document: top-level nodes in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub nodes: Vec<Spanned<Node>>,
}

/// Top-level node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Class(Rc<ClassDecl>),
    Method(Rc<MethodDecl>),
    Stmt(Stmt),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
}

/// Class declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub supertype: Option<String>,
    pub visibility: Visibility,
    pub fields: Vec<FieldDecl>,
    pub properties: Vec<Rc<PropertyDecl>>,
    pub methods: Vec<Rc<MethodDecl>>,
    pub constructors: Vec<Rc<ConstructorDecl>>,
    pub span: Span,
}

/// Field with optional initializer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub value: Option<Spanned<Expr>>,
}

/// `Type Name { get { ... } set { ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: String,
    pub visibility: Visibility,
    pub getter: Block,
    /// The setter body sees the incoming value as `value`
    pub setter: Option<Block>,
}

/// Method or top-level function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub return_type: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub params: Vec<Param>,
    pub preconditions: Vec<Precondition>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    pub visibility: Visibility,
    pub params: Vec<Param>,
    pub preconditions: Vec<Precondition>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

/// `requires (condition, "message")`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Precondition {
    pub condition: Spanned<Expr>,
    pub message: Option<String>,
}

impl Precondition {
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("Precondition failed.")
    }
}
