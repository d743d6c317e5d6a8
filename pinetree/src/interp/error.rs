//! Runtime errors for the interpreter

use std::fmt;

use super::Value;

/// Runtime error during evaluation
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Kinds of runtime errors
#[derive(Debug, Clone)]
pub enum ErrorKind {
    /// Name or member path does not resolve
    UndefinedReference,
    /// No method overload matches name and argument types
    UnresolvedMethod,
    /// No constructor overload matches the argument types
    UnresolvedConstructor,
    /// Type name not registered in the module or primitive registry
    UnresolvedType,
    /// `if`/loop predicate or precondition did not produce a boolean
    NonBooleanPredicate,
    /// Precondition guard evaluated to false
    PreconditionFailed,
    /// `var` declaration of a name already visible in the frame
    AlreadyDefined,
    /// Value of the wrong kind for the operation
    TypeError,
    /// Integer division or remainder by zero
    DivisionByZero,
    /// Array or string index outside its bounds
    IndexOutOfBounds,
    /// Requested string or array size is too large
    AllocationFailed,
    /// Call depth exceeded the configured limit
    StackOverflow,
    /// `import` could not locate or load a module
    ImportFailed,
    /// Failure reported by a host function or host object
    Host,
    /// Error object thrown with `raise`
    Raised(Value),
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl RuntimeError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RuntimeError {
            kind,
            message: message.into(),
        }
    }

    pub fn undefined_reference(name: &str) -> Self {
        Self::new(ErrorKind::UndefinedReference, format!("undefined reference: {name}"))
    }

    pub fn no_object_at_path(path: &str) -> Self {
        Self::new(
            ErrorKind::UndefinedReference,
            format!("No object with given path: {path}"),
        )
    }

    pub fn unresolved_method(name: &str) -> Self {
        Self::new(ErrorKind::UnresolvedMethod, format!("Method not found: {name}"))
    }

    pub fn unresolved_constructor(type_name: &str) -> Self {
        Self::new(
            ErrorKind::UnresolvedConstructor,
            format!("Constructor not found for type: {type_name}"),
        )
    }

    pub fn unresolved_type(name: &str) -> Self {
        Self::new(ErrorKind::UnresolvedType, format!("Type not found: {name}"))
    }

    pub fn non_boolean_predicate() -> Self {
        Self::new(ErrorKind::NonBooleanPredicate, "Predicate must return a boolean!")
    }

    pub fn non_boolean_precondition() -> Self {
        Self::new(ErrorKind::NonBooleanPredicate, "Preconditions must return a boolean.")
    }

    pub fn precondition_failed(message: &str) -> Self {
        Self::new(ErrorKind::PreconditionFailed, message)
    }

    pub fn already_defined(name: &str) -> Self {
        Self::new(ErrorKind::AlreadyDefined, format!("{name} is already defined."))
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        Self::new(
            ErrorKind::TypeError,
            format!("type error: expected {expected}, got {got}"),
        )
    }

    pub fn conversion(value: &str, target: &str) -> Self {
        Self::new(
            ErrorKind::TypeError,
            format!("cannot convert '{value}' to {target}"),
        )
    }

    pub fn not_an_error_value(got: &str) -> Self {
        Self::new(
            ErrorKind::TypeError,
            format!("Error must be an instance of the Error class, got {got}"),
        )
    }

    pub fn division_by_zero() -> Self {
        Self::new(ErrorKind::DivisionByZero, "division by zero")
    }

    pub fn index_out_of_bounds(index: i64, len: usize) -> Self {
        Self::new(
            ErrorKind::IndexOutOfBounds,
            format!("index {index} out of bounds for length {len}"),
        )
    }

    pub fn allocation_failed(what: &str, size: i64) -> Self {
        Self::new(
            ErrorKind::AllocationFailed,
            format!("cannot allocate {what} of size {size}"),
        )
    }

    pub fn stack_overflow(limit: usize) -> Self {
        Self::new(
            ErrorKind::StackOverflow,
            format!("stack overflow: call depth exceeded {limit}"),
        )
    }

    pub fn import_failed(path: &str, reason: &str) -> Self {
        Self::new(ErrorKind::ImportFailed, format!("cannot import {path}: {reason}"))
    }

    pub fn host(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Host, message)
    }

    /// Wrap a raised error object; the message is taken from its `message` field
    pub fn raised(value: Value) -> Self {
        let message = value.error_message().unwrap_or_else(|| value.type_name().to_string());
        Self::new(ErrorKind::Raised(value), message)
    }

    /// Error object bound by `catch (e)`
    pub fn error_value(&self) -> Value {
        match &self.kind {
            ErrorKind::Raised(value) => value.clone(),
            _ => Value::error(&self.message),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
