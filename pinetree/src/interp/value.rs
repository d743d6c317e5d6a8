//! Runtime values and objects

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::callable::Callable;
use super::class::{ClassDescriptor, Property};
use super::host::HostObject;

/// Shared mutable slot a name or field resolves to
pub type Binding = Rc<RefCell<Value>>;

pub fn binding(value: Value) -> Binding {
    Rc::new(RefCell::new(value))
}

/// Runtime value: null or a reference to a runtime object
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Object(Rc<Object>),
}

/// Fixed dispatch tag of a runtime object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Int,
    Float,
    Bool,
    Str,
    Array,
    Function,
    Instance,
    Error,
    Host,
}

/// Backing data of a runtime object
pub enum Data {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Array(RefCell<Array>),
    Function(Callable),
    /// Instance of a user class
    Instance(Rc<ClassDescriptor>),
    /// Class-named holder of static members
    Static(Rc<ClassDescriptor>),
    /// Error object, optionally of a user subclass of `Error`
    Error(Option<Rc<ClassDescriptor>>),
    Host(Rc<RefCell<dyn HostObject>>),
}

/// Fixed-size homogeneous array
#[derive(Debug, Clone)]
pub struct Array {
    pub element: String,
    pub items: Vec<Value>,
}

impl Array {
    /// `object` and `var` arrays accept any value; null clears a slot
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(self.element.as_str(), "object" | "var")
            || value.is_null()
            || value.is_instance_of(&self.element)
    }
}

/// Entry of an object's field table
#[derive(Clone)]
pub enum Member {
    Field(Binding),
    Property(Rc<Property>),
}

/// Runtime object
pub struct Object {
    type_name: String,
    data: Data,
    fields: RefCell<HashMap<String, Member>>,
    methods: RefCell<HashMap<String, Vec<Callable>>>,
}

impl Object {
    pub fn new(type_name: impl Into<String>, data: Data) -> Self {
        Object {
            type_name: type_name.into(),
            data,
            fields: RefCell::new(HashMap::new()),
            methods: RefCell::new(HashMap::new()),
        }
    }

    pub fn kind(&self) -> Kind {
        match &self.data {
            Data::Int(_) => Kind::Int,
            Data::Float(_) => Kind::Float,
            Data::Bool(_) => Kind::Bool,
            Data::Str(_) => Kind::Str,
            Data::Array(_) => Kind::Array,
            Data::Function(_) => Kind::Function,
            Data::Instance(_) | Data::Static(_) => Kind::Instance,
            Data::Error(_) => Kind::Error,
            Data::Host(_) => Kind::Host,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Class this object was constructed from, if any
    pub fn class(&self) -> Option<&Rc<ClassDescriptor>> {
        match &self.data {
            Data::Instance(class) | Data::Static(class) | Data::Error(Some(class)) => Some(class),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<Member> {
        self.fields.borrow().get(name).cloned()
    }

    /// Install a field or property; later definitions shadow earlier ones
    pub(crate) fn define_member(&self, name: impl Into<String>, member: Member) {
        self.fields.borrow_mut().insert(name.into(), member);
    }

    pub(crate) fn define_field(&self, name: impl Into<String>, value: Value) {
        self.define_member(name, Member::Field(binding(value)));
    }

    /// Add an overload; it is tried before overloads bound earlier
    pub(crate) fn bind_method(&self, name: impl Into<String>, callable: Callable) {
        self.methods
            .borrow_mut()
            .entry(name.into())
            .or_default()
            .insert(0, callable);
    }

    pub fn methods(&self, name: &str) -> Vec<Callable> {
        self.methods.borrow().get(name).cloned().unwrap_or_default()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.borrow().contains_key(name)
    }

    pub fn array(&self) -> Option<Ref<'_, Array>> {
        match &self.data {
            Data::Array(array) => Some(array.borrow()),
            _ => None,
        }
    }
}

impl Value {
    fn object(type_name: &str, data: Data) -> Value {
        Value::Object(Rc::new(Object::new(type_name, data)))
    }

    pub fn int(n: i64) -> Value {
        Value::object("int", Data::Int(n))
    }

    pub fn float(n: f64) -> Value {
        Value::object("float", Data::Float(n))
    }

    pub fn bool(b: bool) -> Value {
        Value::object("boolean", Data::Bool(b))
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::object("string", Data::Str(s.into()))
    }

    /// Array of `size` null slots
    pub fn array(element: impl Into<String>, size: usize) -> Value {
        Value::array_from(element, vec![Value::Null; size])
    }

    pub fn array_from(element: impl Into<String>, items: Vec<Value>) -> Value {
        let array = Array {
            element: element.into(),
            items,
        };
        Value::object("array", Data::Array(RefCell::new(array)))
    }

    pub fn function(callable: Callable) -> Value {
        Value::object("function", Data::Function(callable))
    }

    /// Built-in `Error` object with a `message` field
    pub fn error(message: &str) -> Value {
        let object = Object::new("Error", Data::Error(None));
        object.define_field("message", Value::string(message));
        Value::Object(Rc::new(object))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&Rc<Object>> {
        match self {
            Value::Object(object) => Some(object),
            Value::Null => None,
        }
    }

    pub fn kind(&self) -> Option<Kind> {
        self.as_object().map(|o| o.kind())
    }

    pub fn data(&self) -> Option<&Data> {
        self.as_object().map(|o| o.data())
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Object(object) => object.type_name(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.data() {
            Some(Data::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self.data() {
            Some(Data::Float(n)) => Some(*n),
            Some(Data::Int(n)) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.data() {
            Some(Data::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.data() {
            Some(Data::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self.data() {
            Some(Data::Function(callable)) => Some(callable),
            _ => None,
        }
    }

    /// Text of the `message` field of an error object
    pub fn error_message(&self) -> Option<String> {
        let object = self.as_object()?;
        if object.kind() != Kind::Error {
            return None;
        }
        match object.field("message")? {
            Member::Field(slot) => Some(slot.borrow().to_string()),
            Member::Property(_) => None,
        }
    }

    /// Type name equals `name` or names an ancestor class
    pub fn is_instance_of(&self, name: &str) -> bool {
        let Some(object) = self.as_object() else {
            return false;
        };
        if object.type_name() == name {
            return true;
        }
        match &object.data {
            Data::Instance(class) => class.descends_from(name),
            Data::Error(class) => {
                name == "Error" || class.as_ref().is_some_and(|c| c.descends_from(name))
            }
            _ => false,
        }
    }

    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.data(), other.data()) {
            (Some(Data::Int(a)), Some(Data::Int(b))) => a == b,
            (Some(Data::Float(a)), Some(Data::Float(b))) => a == b || a.to_bits() == b.to_bits(),
            (Some(Data::Bool(a)), Some(Data::Bool(b))) => a == b,
            (Some(Data::Str(a)), Some(Data::Str(b))) => a == b,
            (Some(Data::Host(a)), Some(Data::Host(b))) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(object) = self.as_object() else {
            return write!(f, "null");
        };
        match &object.data {
            Data::Int(n) => write!(f, "{n}"),
            Data::Float(n) => write!(f, "{n}"),
            Data::Bool(b) => write!(f, "{b}"),
            Data::Str(s) => write!(f, "{s}"),
            Data::Array(array) => {
                let array = array.borrow();
                write!(f, "{}[{}]", array.element, array.items.len())
            }
            Data::Host(host) => write!(f, "{}", host.borrow().type_name()),
            Data::Function(_) | Data::Instance(_) | Data::Static(_) | Data::Error(_) => {
                write!(f, "{}", object.type_name)
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Object(object) => match object.kind() {
                Kind::Str => write!(f, "{:?}", self.to_string()),
                Kind::Int | Kind::Float | Kind::Bool => write!(f, "{self}"),
                _ => write!(f, "<{}>", object.type_name),
            },
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("kind", &self.kind())
            .field("type_name", &self.type_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_type_names() {
        assert_eq!(Value::int(1).type_name(), "int");
        assert_eq!(Value::float(1.0).type_name(), "float");
        assert_eq!(Value::bool(true).type_name(), "boolean");
        assert_eq!(Value::string("a").type_name(), "string");
        assert_eq!(Value::array("int", 2).type_name(), "array");
        assert_eq!(Value::Null.type_name(), "null");
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(Value::int(1).kind(), Some(Kind::Int));
        assert_eq!(Value::error("x").kind(), Some(Kind::Error));
        assert_eq!(Value::Null.kind(), None);
    }

    #[test]
    fn test_equality_by_value() {
        assert_eq!(Value::int(3), Value::int(3));
        assert_ne!(Value::int(3), Value::int(4));
        assert_eq!(Value::string("a"), Value::string("a"));
        assert_ne!(Value::int(1), Value::float(1.0));
        assert_ne!(Value::string("1"), Value::int(1));
    }

    #[test]
    fn test_null_equals_only_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Null, Value::int(0));
        assert_ne!(Value::string(""), Value::Null);
    }

    #[test]
    fn test_reflexive_nan() {
        let nan = Value::float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(Value::float(f64::NAN), Value::float(f64::NAN));
    }

    #[test]
    fn test_arrays_compare_by_identity() {
        let a = Value::array("int", 1);
        assert_eq!(a, a.clone());
        assert_ne!(a, Value::array("int", 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::int(-5).to_string(), "-5");
        assert_eq!(Value::float(2.5).to_string(), "2.5");
        assert_eq!(Value::float(2.0).to_string(), "2");
        assert_eq!(Value::bool(false).to_string(), "false");
        assert_eq!(Value::array("string", 3).to_string(), "string[3]");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_error_message_field() {
        let err = Value::error("boom");
        assert_eq!(err.error_message().as_deref(), Some("boom"));
        assert!(err.is_instance_of("Error"));
        assert_eq!(Value::int(1).error_message(), None);
    }

    #[test]
    fn test_array_accepts() {
        let array = Array {
            element: "int".to_string(),
            items: vec![],
        };
        assert!(array.accepts(&Value::int(1)));
        assert!(array.accepts(&Value::Null));
        assert!(!array.accepts(&Value::string("1")));
        let any = Array {
            element: "object".to_string(),
            items: vec![],
        };
        assert!(any.accepts(&Value::string("1")));
    }

    #[test]
    fn test_overloads_bound_later_come_first() {
        let object = Object::new("T", Data::Bool(true));
        object.bind_method("f", Callable::native("first", None, |_, _| Ok(Value::int(1))));
        object.bind_method("f", Callable::native("second", None, |_, _| Ok(Value::int(2))));
        let methods = object.methods("f");
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].name(), "second");
    }
}
