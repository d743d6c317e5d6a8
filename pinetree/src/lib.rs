//! PineTree Library
//!
//! An embeddable, class-based scripting language with a tree-walking runtime.

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;

pub use ast::Span;
pub use error::{CompileError, Result};
pub use interp::{Engine, EngineConfig, EngineError, HostObject, HostValue, Value};
