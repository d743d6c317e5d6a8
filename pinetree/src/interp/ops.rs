//! Operator semantics, dispatched on the kinds of both operands
//!
//! The left operand selects the rule; each rule inspects the right operand
//! for mixed-kind coercions. Unsupported combinations produce null.

use crate::ast::{ArithOp, BitOp, LogicOp, UnaryOp};

use super::error::{InterpResult, RuntimeError};
use super::value::{Data, Value};

/// `+ - * / %`
pub fn evaluate_arithmetic(op: ArithOp, left: &Value, right: &Value) -> InterpResult<Value> {
    let (Some(l), Some(r)) = (left.data(), right.data()) else {
        return Ok(Value::Null);
    };
    let value = match (l, r) {
        (Data::Int(a), Data::Int(b)) => int_arithmetic(op, *a, *b)?,
        (Data::Int(a), Data::Float(b)) => float_arithmetic(op, *a as f64, *b),
        (Data::Float(a), Data::Int(b)) => float_arithmetic(op, *a, *b as f64),
        (Data::Float(a), Data::Float(b)) => float_arithmetic(op, *a, *b),
        (Data::Int(_) | Data::Float(_), Data::Str(s)) => {
            let text = left.to_string();
            match op {
                ArithOp::Add => Value::string(format!("{text}{s}")),
                ArithOp::Subtract => Value::string(s.replace(&text, "")),
                ArithOp::Multiply => match left.as_int() {
                    Some(n) => Value::string(repeat(s, n)?),
                    None => Value::Null,
                },
                ArithOp::Divide | ArithOp::Modulo => Value::Null,
            }
        }
        (Data::Str(s), Data::Str(t)) => match op {
            ArithOp::Add => Value::string(format!("{s}{t}")),
            ArithOp::Subtract => Value::string(s.replace(t.as_str(), "")),
            _ => Value::Null,
        },
        (Data::Str(s), Data::Int(_) | Data::Float(_) | Data::Bool(_)) => {
            let text = right.to_string();
            match op {
                ArithOp::Add => Value::string(format!("{s}{text}")),
                ArithOp::Subtract => Value::string(s.replace(&text, "")),
                ArithOp::Multiply => match right.as_int() {
                    Some(n) => Value::string(repeat(s, n)?),
                    None => Value::Null,
                },
                ArithOp::Divide | ArithOp::Modulo => Value::Null,
            }
        }
        _ => Value::Null,
    };
    Ok(value)
}

/// Largest string length in bytes, or array size, a script may request
pub const MAX_ALLOCATION: usize = 1 << 24;

fn repeat(s: &str, times: i64) -> InterpResult<String> {
    if times <= 0 || s.is_empty() {
        return Ok(String::new());
    }
    let len = usize::try_from(times)
        .ok()
        .and_then(|n| s.len().checked_mul(n))
        .filter(|&len| len <= MAX_ALLOCATION)
        .ok_or_else(|| RuntimeError::allocation_failed("string", times))?;
    let mut out = String::new();
    out.try_reserve_exact(len)
        .map_err(|_| RuntimeError::allocation_failed("string", times))?;
    for _ in 0..times {
        out.push_str(s);
    }
    Ok(out)
}

/// `new T[size]`: a null-filled array of `size` slots
pub fn new_array(element: &str, size: i64) -> InterpResult<Value> {
    if size < 0 {
        return Err(RuntimeError::index_out_of_bounds(size, 0));
    }
    let len = usize::try_from(size)
        .ok()
        .filter(|&len| len <= MAX_ALLOCATION)
        .ok_or_else(|| RuntimeError::allocation_failed("array", size))?;
    let mut items = Vec::new();
    items
        .try_reserve_exact(len)
        .map_err(|_| RuntimeError::allocation_failed("array", size))?;
    items.resize(len, Value::Null);
    Ok(Value::array_from(element, items))
}

fn int_arithmetic(op: ArithOp, a: i64, b: i64) -> InterpResult<Value> {
    let n = match op {
        ArithOp::Add => a.wrapping_add(b),
        ArithOp::Subtract => a.wrapping_sub(b),
        ArithOp::Multiply => a.wrapping_mul(b),
        ArithOp::Divide | ArithOp::Modulo if b == 0 => {
            return Err(RuntimeError::division_by_zero());
        }
        ArithOp::Divide => a.wrapping_div(b),
        ArithOp::Modulo => a.wrapping_rem(b),
    };
    Ok(Value::int(n))
}

fn float_arithmetic(op: ArithOp, a: f64, b: f64) -> Value {
    Value::float(match op {
        ArithOp::Add => a + b,
        ArithOp::Subtract => a - b,
        ArithOp::Multiply => a * b,
        ArithOp::Divide => a / b,
        ArithOp::Modulo => a % b,
    })
}

/// Comparisons and boolean connectives; the result is a boolean or null
pub fn evaluate_logic(op: LogicOp, left: &Value, right: &Value) -> Value {
    match op {
        LogicOp::Equals => return Value::bool(left == right),
        LogicOp::NotEquals => return Value::bool(left != right),
        _ => {}
    }

    match (left.data(), right.data()) {
        (Some(Data::Bool(a)), Some(Data::Bool(b))) => match op {
            LogicOp::And => Value::bool(*a && *b),
            LogicOp::Or => Value::bool(*a || *b),
            _ => Value::Null,
        },
        (Some(Data::Int(a)), Some(Data::Int(b))) if op.is_relational() => {
            Value::bool(compare(op, a.cmp(b)))
        }
        _ if op.is_relational() => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => match a.partial_cmp(&b) {
                Some(ordering) => Value::bool(compare(op, ordering)),
                None => Value::bool(false),
            },
            _ => Value::Null,
        },
        _ => Value::Null,
    }
}

fn compare(op: LogicOp, ordering: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::*;
    match op {
        LogicOp::Less => ordering == Less,
        LogicOp::Greater => ordering == Greater,
        LogicOp::LessEq => ordering != Greater,
        LogicOp::GreaterEq => ordering != Less,
        _ => false,
    }
}

/// `& | ^ << >>` on integers, `& | ^` on booleans
pub fn evaluate_bitwise(op: BitOp, left: &Value, right: &Value) -> Value {
    match (left.data(), right.data()) {
        (Some(Data::Int(a)), Some(Data::Int(b))) => Value::int(match op {
            BitOp::And => a & b,
            BitOp::Or => a | b,
            BitOp::Xor => a ^ b,
            BitOp::ShiftLeft => a.wrapping_shl(*b as u32),
            BitOp::ShiftRight => a.wrapping_shr(*b as u32),
        }),
        (Some(Data::Bool(a)), Some(Data::Bool(b))) => match op {
            BitOp::And => Value::bool(a & b),
            BitOp::Or => Value::bool(a | b),
            BitOp::Xor => Value::bool(a ^ b),
            BitOp::ShiftLeft | BitOp::ShiftRight => Value::Null,
        },
        _ => Value::Null,
    }
}

/// Unary operators never write back; the caller stores increments.
///
/// For `++`/`--` the prefix form yields the value after the delta and the
/// postfix form the original operand.
pub fn evaluate_unary(op: UnaryOp, prefix: bool, operand: &Value) -> Value {
    match (op, operand.data()) {
        (UnaryOp::Not, Some(Data::Bool(b))) => Value::bool(!b),
        (UnaryOp::Negate, Some(Data::Int(n))) => Value::int(n.wrapping_neg()),
        (UnaryOp::Negate, Some(Data::Float(n))) => Value::float(-n),
        (UnaryOp::Increment | UnaryOp::Decrement, Some(Data::Int(n))) => {
            if !prefix {
                return operand.clone();
            }
            let delta = if op == UnaryOp::Increment { 1 } else { -1 };
            Value::int(n.wrapping_add(delta))
        }
        (UnaryOp::Increment | UnaryOp::Decrement, Some(Data::Float(n))) => {
            if !prefix {
                return operand.clone();
            }
            let delta = if op == UnaryOp::Increment { 1.0 } else { -1.0 };
            Value::float(n + delta)
        }
        _ => Value::Null,
    }
}

/// `container[index]` for arrays and strings; non-integer indexes give null
pub fn access_array_index(container: &Value, index: &Value) -> InterpResult<Value> {
    let Some(i) = index.as_int() else {
        return Ok(Value::Null);
    };
    match container.data() {
        Some(Data::Array(array)) => {
            let array = array.borrow();
            checked_index(i, array.items.len()).map(|i| array.items[i].clone())
        }
        Some(Data::Str(s)) => {
            let len = s.chars().count();
            let i = checked_index(i, len)?;
            Ok(s.chars().nth(i).map(|c| Value::string(c.to_string())).unwrap_or_default())
        }
        _ => Ok(Value::Null),
    }
}

/// Store into an array slot; values of a mismatched type are ignored
pub fn set_array_index(container: &Value, index: &Value, value: Value) -> InterpResult<()> {
    let (Some(Data::Array(array)), Some(i)) = (container.data(), index.as_int()) else {
        return Ok(());
    };
    let mut array = array.borrow_mut();
    let i = checked_index(i, array.items.len())?;
    if array.accepts(&value) {
        array.items[i] = value;
    }
    Ok(())
}

fn checked_index(index: i64, len: usize) -> InterpResult<usize> {
    if index < 0 || index as usize >= len {
        Err(RuntimeError::index_out_of_bounds(index, len))
    } else {
        Ok(index as usize)
    }
}
