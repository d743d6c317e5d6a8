//! Host-binding layer: moving values between Rust code and scripts

use std::cell::RefCell;
use std::rc::Rc;

use super::value::{Data, Object, Value};

/// Rust object exposed to scripts.
///
/// Field reads, writes and method calls made by a script on the wrapped
/// object are forwarded here.
pub trait HostObject {
    /// Type name scripts observe
    fn type_name(&self) -> &str;

    /// Current value of a field, or `None` when there is no such field
    fn get_field(&self, _name: &str) -> Option<HostValue> {
        None
    }

    /// Store into a field; returns false when the field does not exist
    fn set_field(&mut self, _name: &str, _value: HostValue) -> bool {
        false
    }

    /// Call a method; `None` means there is no method with that name
    fn call_method(&mut self, name: &str, args: Vec<HostValue>) -> Option<Result<HostValue, String>>;
}

/// A value on the host side of the boundary
#[derive(Clone)]
pub enum HostValue {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Array(Vec<HostValue>),
    Object(Rc<RefCell<dyn HostObject>>),
    /// Script value with no native counterpart (instances, functions, errors)
    Script(Value),
}

impl HostValue {
    pub fn object(object: impl HostObject + 'static) -> HostValue {
        HostValue::Object(Rc::new(RefCell::new(object)))
    }

    /// Wrap as a runtime object
    pub fn into_value(self) -> Value {
        match self {
            HostValue::Null => Value::Null,
            HostValue::Int(n) => Value::int(n),
            HostValue::Float(n) => Value::float(n),
            HostValue::Bool(b) => Value::bool(b),
            HostValue::Str(s) => Value::string(s),
            HostValue::Array(items) => Value::array_from(
                "object",
                items.into_iter().map(HostValue::into_value).collect(),
            ),
            HostValue::Object(object) => {
                let type_name = object.borrow().type_name().to_string();
                Value::Object(Rc::new(Object::new(type_name, Data::Host(object))))
            }
            HostValue::Script(value) => value,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            HostValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Value {
    /// Unwrap to a host-native value
    pub fn to_host(&self) -> HostValue {
        self.to_host_within(&mut Vec::new())
    }

    /// An array that contains itself stays a script value at the repeat
    fn to_host_within(&self, open: &mut Vec<*const Object>) -> HostValue {
        match self.data() {
            None => HostValue::Null,
            Some(Data::Int(n)) => HostValue::Int(*n),
            Some(Data::Float(n)) => HostValue::Float(*n),
            Some(Data::Bool(b)) => HostValue::Bool(*b),
            Some(Data::Str(s)) => HostValue::Str(s.clone()),
            Some(Data::Array(array)) => {
                let Some(id) = self.as_object().map(Rc::as_ptr) else {
                    return HostValue::Null;
                };
                if open.contains(&id) {
                    return HostValue::Script(self.clone());
                }
                open.push(id);
                let items = array
                    .borrow()
                    .items
                    .iter()
                    .map(|item| item.to_host_within(open))
                    .collect();
                open.pop();
                HostValue::Array(items)
            }
            Some(Data::Host(object)) => HostValue::Object(object.clone()),
            Some(_) => HostValue::Script(self.clone()),
        }
    }
}

impl std::fmt::Debug for HostValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostValue::Null => write!(f, "Null"),
            HostValue::Int(n) => write!(f, "Int({n})"),
            HostValue::Float(n) => write!(f, "Float({n})"),
            HostValue::Bool(b) => write!(f, "Bool({b})"),
            HostValue::Str(s) => write!(f, "Str({s:?})"),
            HostValue::Array(items) => f.debug_tuple("Array").field(items).finish(),
            HostValue::Object(object) => write!(f, "Object({})", object.borrow().type_name()),
            HostValue::Script(value) => write!(f, "Script({value:?})"),
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Float(a), HostValue::Float(b)) => a == b,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::Array(a), HostValue::Array(b)) => a == b,
            (HostValue::Object(a), HostValue::Object(b)) => Rc::ptr_eq(a, b),
            (HostValue::Script(a), HostValue::Script(b)) => a == b,
            _ => false,
        }
    }
}

impl From<i64> for HostValue {
    fn from(n: i64) -> Self {
        HostValue::Int(n)
    }
}

impl From<i32> for HostValue {
    fn from(n: i32) -> Self {
        HostValue::Int(n as i64)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Float(n)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Str(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Str(s)
    }
}

impl<T: Into<HostValue>> From<Vec<T>> for HostValue {
    fn from(items: Vec<T>) -> Self {
        HostValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(HostValue::Null, Into::into)
    }
}

/// Keeps the script value's identity; use [`Value::to_host`] to unwrap
impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        HostValue::Script(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::ops::set_array_index;
    use crate::interp::value::Kind;

    struct Counter {
        count: i64,
    }

    impl HostObject for Counter {
        fn type_name(&self) -> &str {
            "Counter"
        }

        fn get_field(&self, name: &str) -> Option<HostValue> {
            (name == "count").then_some(HostValue::Int(self.count))
        }

        fn call_method(&mut self, name: &str, _args: Vec<HostValue>) -> Option<Result<HostValue, String>> {
            match name {
                "bump" => {
                    self.count += 1;
                    Some(Ok(HostValue::Int(self.count)))
                }
                _ => None,
            }
        }
    }

    #[test]
    fn test_primitives_cross_the_boundary() {
        assert_eq!(HostValue::from(5).into_value(), Value::int(5));
        assert_eq!(HostValue::from("hi").into_value(), Value::string("hi"));
        assert_eq!(Value::float(0.5).to_host(), HostValue::Float(0.5));
        assert_eq!(Value::Null.to_host(), HostValue::Null);
    }

    #[test]
    fn test_arrays_cross_the_boundary() {
        let value = HostValue::from(vec![1, 2, 3]).into_value();
        assert_eq!(value.to_string(), "object[3]");
        assert_eq!(
            value.to_host(),
            HostValue::Array(vec![HostValue::Int(1), HostValue::Int(2), HostValue::Int(3)])
        );
    }

    #[test]
    fn test_host_object_wraps_as_host_kind() {
        let value = HostValue::object(Counter { count: 0 }).into_value();
        assert_eq!(value.kind(), Some(Kind::Host));
        assert_eq!(value.type_name(), "Counter");
        assert!(matches!(value.to_host(), HostValue::Object(_)));
    }

    #[test]
    fn test_self_containing_array_stops_at_the_cycle() {
        let array = Value::array("object", 2);
        set_array_index(&array, &Value::int(0), array.clone()).unwrap();
        set_array_index(&array, &Value::int(1), Value::int(4)).unwrap();
        match array.to_host() {
            HostValue::Array(items) => {
                assert!(matches!(&items[0], HostValue::Script(inner) if inner.ptr_eq(&array)));
                assert_eq!(items[1], HostValue::Int(4));
            }
            other => panic!("expected an array, got {other:?}"),
        }
    }

    #[test]
    fn test_script_values_stay_opaque() {
        let err = Value::error("x");
        match err.to_host() {
            HostValue::Script(inner) => assert!(inner.ptr_eq(&err)),
            other => panic!("expected script value, got {other:?}"),
        }
    }
}
