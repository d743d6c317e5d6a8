//! Tree-walking runtime for PineTree programs

mod callable;
mod class;
mod config;
mod engine;
mod env;
mod error;
mod expr;
mod host;
mod module;
mod ops;
mod stmt;
mod types;
mod value;

pub use callable::{Callable, NativeFn};
pub use class::{ClassDescriptor, Property};
pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, EngineError, ModuleResolver, parse_source};
pub use env::{EnvRef, Environment, Reference, Scope};
pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use host::{HostObject, HostValue};
pub use module::Module;
pub use ops::{
    access_array_index, evaluate_arithmetic, evaluate_bitwise, evaluate_logic, evaluate_unary,
    set_array_index,
};
pub use stmt::Completion;
pub use types::{Primitive, Type, arguments_match, create_primitive, resolve_type};
pub use value::{Array, Binding, Data, Kind, Member, Object, Value};
