//! Expression AST nodes

use std::fmt;
use std::rc::Rc;

use super::{Block, Param, Spanned};
use serde::{Deserialize, Serialize};

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Constant literal
    Literal(Literal),

    /// Variable reference (also `this`)
    Ident(String),

    /// `+ - * / %`
    Arithmetic {
        left: Box<Spanned<Expr>>,
        op: ArithOp,
        right: Box<Spanned<Expr>>,
    },

    /// Comparisons and boolean connectives
    Logical {
        left: Box<Spanned<Expr>>,
        op: LogicOp,
        right: Box<Spanned<Expr>>,
    },

    /// `& | ^ << >>`
    Bitwise {
        left: Box<Spanned<Expr>>,
        op: BitOp,
        right: Box<Spanned<Expr>>,
    },

    /// Prefix or postfix unary operation
    Unary {
        op: UnaryOp,
        prefix: bool,
        operand: Box<Spanned<Expr>>,
    },

    /// Plain or compound assignment
    Assign {
        target: Box<Spanned<Expr>>,
        op: AssignOp,
        value: Box<Spanned<Expr>>,
    },

    /// Dotted reference chain: `root.a.b(x)[i]`
    Chain {
        root: Box<Spanned<Expr>>,
        segments: Vec<Spanned<Segment>>,
    },

    /// Call without an explicit receiver: `name(args)`
    Call(Call),

    /// `new Type(args)`
    New { ty: String, args: Vec<Spanned<Expr>> },

    /// `target[index]`
    Index {
        target: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },

    /// `new Type[size]`
    NewArray {
        element: String,
        size: Box<Spanned<Expr>>,
    },

    /// `(params) => body`
    Lambda(Rc<LambdaExpr>),
}

/// Literal constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
}

/// Method invocation by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub name: String,
    pub args: Vec<Spanned<Expr>>,
}

/// One step of a reference chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    Field(String),
    Call(Call),
    Index(Box<Spanned<Expr>>),
}

/// Lambda literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambdaExpr {
    /// Untyped parameters carry the wildcard type `var`
    pub params: Vec<Param>,
    pub body: LambdaBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LambdaBody {
    Expr(Box<Spanned<Expr>>),
    Block(Block),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOp {
    Equals,
    NotEquals,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitOp {
    And,
    Or,
    Xor,
    ShiftLeft,
    ShiftRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Increment,
    Decrement,
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl AssignOp {
    /// Arithmetic operator a compound assignment desugars to
    pub fn arith(self) -> Option<ArithOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(ArithOp::Add),
            AssignOp::Subtract => Some(ArithOp::Subtract),
            AssignOp::Multiply => Some(ArithOp::Multiply),
            AssignOp::Divide => Some(ArithOp::Divide),
        }
    }
}

impl LogicOp {
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            LogicOp::Less | LogicOp::Greater | LogicOp::LessEq | LogicOp::GreaterEq
        )
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithOp::Add => "+",
            ArithOp::Subtract => "-",
            ArithOp::Multiply => "*",
            ArithOp::Divide => "/",
            ArithOp::Modulo => "%",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogicOp::Equals => "==",
            LogicOp::NotEquals => "!=",
            LogicOp::Less => "<",
            LogicOp::Greater => ">",
            LogicOp::LessEq => "<=",
            LogicOp::GreaterEq => ">=",
            LogicOp::And => "&&",
            LogicOp::Or => "||",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for BitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BitOp::And => "&",
            BitOp::Or => "|",
            BitOp::Xor => "^",
            BitOp::ShiftLeft => "<<",
            BitOp::ShiftRight => ">>",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Increment => "++",
            UnaryOp::Decrement => "--",
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Subtract => "-=",
            AssignOp::Multiply => "*=",
            AssignOp::Divide => "/=",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_assign_desugars() {
        assert_eq!(AssignOp::Add.arith(), Some(ArithOp::Add));
        assert_eq!(AssignOp::Divide.arith(), Some(ArithOp::Divide));
        assert_eq!(AssignOp::Assign.arith(), None);
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(ArithOp::Modulo.to_string(), "%");
        assert_eq!(LogicOp::GreaterEq.to_string(), ">=");
        assert_eq!(BitOp::ShiftLeft.to_string(), "<<");
        assert_eq!(UnaryOp::Not.to_string(), "!");
        assert_eq!(AssignOp::Multiply.to_string(), "*=");
    }

    #[test]
    fn test_relational_ops() {
        assert!(LogicOp::Less.is_relational());
        assert!(!LogicOp::Equals.is_relational());
        assert!(!LogicOp::And.is_relational());
    }
}
