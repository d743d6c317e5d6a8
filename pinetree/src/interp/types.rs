//! Type descriptors, cast compatibility and primitive conversion

use std::fmt;
use std::rc::Rc;

use super::class::ClassDescriptor;
use super::error::{InterpResult, RuntimeError};
use super::module::Module;
use super::ops::new_array;
use super::value::{Data, Value};

/// Built-in types, shared by every engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int,
    Float,
    Boolean,
    String,
    Function,
    Array,
    Error,
    /// Top type: every value casts to it
    Object,
    /// Wildcard for untyped lambda parameters
    Var,
}

impl Primitive {
    pub const ALL: [Primitive; 9] = [
        Primitive::Int,
        Primitive::Float,
        Primitive::Boolean,
        Primitive::String,
        Primitive::Function,
        Primitive::Array,
        Primitive::Error,
        Primitive::Object,
        Primitive::Var,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Boolean => "boolean",
            Primitive::String => "string",
            Primitive::Function => "function",
            Primitive::Array => "array",
            Primitive::Error => "Error",
            Primitive::Object => "object",
            Primitive::Var => "var",
        }
    }

    /// Primitive registry lookup
    pub fn lookup(name: &str) -> Option<Primitive> {
        if name == "bool" {
            return Some(Primitive::Boolean);
        }
        Primitive::ALL.into_iter().find(|p| p.name() == name)
    }

    fn casts_to(self, target: Primitive) -> bool {
        use Primitive::*;
        if self == target || matches!(target, Object | Var) {
            return true;
        }
        match self {
            Int | Float => matches!(target, Int | Float | String | Boolean),
            Boolean => matches!(target, String),
            String => matches!(target, Boolean | Int | Float),
            Var => true,
            Function | Array | Error | Object => false,
        }
    }
}

/// A named type: primitive or user class
#[derive(Debug, Clone)]
pub enum Type {
    Primitive(Primitive),
    Class(Rc<ClassDescriptor>),
}

impl Type {
    pub fn name(&self) -> &str {
        match self {
            Type::Primitive(p) => p.name(),
            Type::Class(class) => class.name(),
        }
    }

    /// Runtime type of a value; `None` for null and host objects
    pub fn of(value: &Value) -> Option<Type> {
        let ty = match value.data()? {
            Data::Int(_) => Type::Primitive(Primitive::Int),
            Data::Float(_) => Type::Primitive(Primitive::Float),
            Data::Bool(_) => Type::Primitive(Primitive::Boolean),
            Data::Str(_) => Type::Primitive(Primitive::String),
            Data::Array(_) => Type::Primitive(Primitive::Array),
            Data::Function(_) => Type::Primitive(Primitive::Function),
            Data::Instance(class) | Data::Error(Some(class)) => Type::Class(class.clone()),
            Data::Error(None) => Type::Primitive(Primitive::Error),
            Data::Static(_) => Type::Primitive(Primitive::Object),
            Data::Host(_) => return None,
        };
        Some(ty)
    }

    /// Whether a value of this type may be passed where `target` is expected
    pub fn can_cast_to(&self, target: &Type) -> bool {
        match (self, target) {
            (Type::Primitive(from), Type::Primitive(to)) => from.casts_to(*to),
            (Type::Class(class), Type::Primitive(to)) => match to {
                Primitive::Object | Primitive::Var => true,
                Primitive::Error => class.is_error(),
                _ => false,
            },
            (Type::Class(class), Type::Class(to)) => class.descends_from(to.name()),
            (Type::Primitive(from), Type::Class(_)) => *from == Primitive::Var,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Module types first (own, then imports), then primitives
pub fn resolve_type(module: Option<&Module>, name: &str) -> Option<Type> {
    module
        .and_then(|m| m.find_type(name))
        .map(Type::Class)
        .or_else(|| Primitive::lookup(name).map(Type::Primitive))
}

/// Arity matches and every non-null argument casts to its parameter
pub fn arguments_match(params: &[Option<Type>], args: &[Option<Type>]) -> bool {
    params.len() == args.len()
        && params.iter().zip(args).all(|(param, arg)| match (param, arg) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(param), Some(arg)) => arg.can_cast_to(param),
        })
}

/// Construct a primitive value from constructor arguments
pub fn create_primitive(primitive: Primitive, args: &[Value]) -> InterpResult<Value> {
    let first = args.first();
    match primitive {
        Primitive::Int => match first {
            None => Ok(Value::int(0)),
            Some(v) => to_int(v),
        },
        Primitive::Float => match first {
            None => Ok(Value::float(0.0)),
            Some(v) => to_float(v),
        },
        Primitive::Boolean => Ok(Value::bool(first.is_some_and(truthy_conversion))),
        Primitive::String => Ok(match first {
            None | Some(Value::Null) => Value::string(""),
            Some(v) if v.as_str().is_some() => v.clone(),
            Some(v) => Value::string(v.to_string()),
        }),
        Primitive::Error => Ok(Value::error(
            &first.map(|v| v.to_string()).unwrap_or_default(),
        )),
        Primitive::Array => match first.and_then(Value::as_int) {
            Some(size) if size >= 0 => new_array("object", size),
            _ => Err(RuntimeError::unresolved_constructor("array")),
        },
        Primitive::Function => match first {
            Some(v) if v.as_callable().is_some() => Ok(v.clone()),
            _ => Err(RuntimeError::unresolved_constructor("function")),
        },
        Primitive::Object | Primitive::Var => {
            Err(RuntimeError::unresolved_constructor(primitive.name()))
        }
    }
}

/// Convert an argument bound to a parameter of type `ty`
pub fn convert_argument(ty: &Type, value: Value) -> InterpResult<Value> {
    let Type::Primitive(primitive) = ty else {
        return Ok(value);
    };
    let already = match primitive {
        Primitive::Int => value.as_int().is_some(),
        Primitive::Float => matches!(value.data(), Some(Data::Float(_))),
        Primitive::Boolean => value.as_bool().is_some(),
        Primitive::String => value.as_str().is_some(),
        _ => true,
    };
    if already {
        Ok(value)
    } else {
        create_primitive(*primitive, &[value])
    }
}

fn to_int(value: &Value) -> InterpResult<Value> {
    match value.data() {
        None => Ok(Value::int(0)),
        Some(Data::Int(_)) => Ok(value.clone()),
        Some(Data::Float(n)) => Ok(Value::int(n.trunc() as i64)),
        Some(Data::Bool(b)) => Ok(Value::int(*b as i64)),
        Some(Data::Str(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::int)
            .map_err(|_| RuntimeError::conversion(s, "int")),
        Some(_) => Err(RuntimeError::conversion(&value.to_string(), "int")),
    }
}

fn to_float(value: &Value) -> InterpResult<Value> {
    match value.data() {
        None => Ok(Value::float(0.0)),
        Some(Data::Float(_)) => Ok(value.clone()),
        Some(Data::Int(n)) => Ok(Value::float(*n as f64)),
        Some(Data::Bool(b)) => Ok(Value::float(if *b { 1.0 } else { 0.0 })),
        Some(Data::Str(s)) => s
            .trim()
            .parse::<f64>()
            .map(Value::float)
            .map_err(|_| RuntimeError::conversion(s, "float")),
        Some(_) => Err(RuntimeError::conversion(&value.to_string(), "float")),
    }
}

fn truthy_conversion(value: &Value) -> bool {
    match value.data() {
        Some(Data::Bool(b)) => *b,
        Some(Data::Int(n)) => *n == 1,
        Some(Data::Float(n)) => *n == 1.0,
        Some(Data::Str(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prim(p: Primitive) -> Type {
        Type::Primitive(p)
    }

    #[test]
    fn test_primitive_lookup() {
        assert_eq!(Primitive::lookup("int"), Some(Primitive::Int));
        assert_eq!(Primitive::lookup("bool"), Some(Primitive::Boolean));
        assert_eq!(Primitive::lookup("Error"), Some(Primitive::Error));
        assert_eq!(Primitive::lookup("Point"), None);
    }

    #[test]
    fn test_numeric_cast_graph() {
        use Primitive::*;
        for from in [Int, Float] {
            for to in [Int, Float, String, Boolean, Object] {
                assert!(prim(from).can_cast_to(&prim(to)), "{from:?} -> {to:?}");
            }
            assert!(!prim(from).can_cast_to(&prim(Array)));
        }
    }

    #[test]
    fn test_boolean_and_string_casts() {
        use Primitive::*;
        assert!(prim(Boolean).can_cast_to(&prim(String)));
        assert!(!prim(Boolean).can_cast_to(&prim(Int)));
        assert!(prim(String).can_cast_to(&prim(Int)));
        assert!(!prim(Array).can_cast_to(&prim(String)));
        assert!(prim(Function).can_cast_to(&prim(Var)));
    }

    #[test]
    fn test_arguments_match_null_is_wildcard() {
        let params = vec![Some(prim(Primitive::Int)), Some(prim(Primitive::String))];
        assert!(arguments_match(&params, &[None, Some(prim(Primitive::Int))]));
        assert!(!arguments_match(&params, &[None]));
        assert!(!arguments_match(
            &params,
            &[Some(prim(Primitive::Array)), None]
        ));
    }

    #[test]
    fn test_unresolved_param_type_never_matches() {
        assert!(!arguments_match(&[None], &[Some(prim(Primitive::Int))]));
        assert!(arguments_match(&[None], &[None]));
    }

    #[test]
    fn test_create_int() {
        assert_eq!(create_primitive(Primitive::Int, &[]).unwrap(), Value::int(0));
        assert_eq!(
            create_primitive(Primitive::Int, &[Value::string(" 42 ")]).unwrap(),
            Value::int(42)
        );
        assert_eq!(
            create_primitive(Primitive::Int, &[Value::float(3.9)]).unwrap(),
            Value::int(3)
        );
        assert!(create_primitive(Primitive::Int, &[Value::string("x")]).is_err());
    }

    #[test]
    fn test_create_boolean() {
        assert_eq!(
            create_primitive(Primitive::Boolean, &[Value::int(1)]).unwrap(),
            Value::bool(true)
        );
        assert_eq!(
            create_primitive(Primitive::Boolean, &[Value::string("true")]).unwrap(),
            Value::bool(true)
        );
        assert_eq!(
            create_primitive(Primitive::Boolean, &[Value::int(2)]).unwrap(),
            Value::bool(false)
        );
    }

    #[test]
    fn test_create_string_and_error() {
        assert_eq!(
            create_primitive(Primitive::String, &[Value::float(1.5)]).unwrap(),
            Value::string("1.5")
        );
        let err = create_primitive(Primitive::Error, &[Value::string("bad")]).unwrap();
        assert_eq!(err.error_message().as_deref(), Some("bad"));
    }

    #[test]
    fn test_convert_argument() {
        let int = prim(Primitive::Int);
        assert_eq!(convert_argument(&int, Value::Null).unwrap(), Value::int(0));
        assert_eq!(
            convert_argument(&prim(Primitive::String), Value::int(7)).unwrap(),
            Value::string("7")
        );
        let array = Value::array("int", 1);
        assert!(convert_argument(&prim(Primitive::Array), array.clone())
            .unwrap()
            .ptr_eq(&array));
    }
}
