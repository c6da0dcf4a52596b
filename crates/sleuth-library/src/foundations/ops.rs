//! Operations on values.
//!
//! Pure functions implementing the coercion-heavy operator semantics the
//! evaluated language expects. Anything that needs closure or reference
//! state (assignment, `delete`) lives in the interpreter instead.

use ecow::{EcoString, eco_format};

use crate::diag::StrResult;
use crate::foundations::{HostClass, Value};

/// Whether a value counts as true in a condition.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Bool(b) => *b,
        Value::Num(n) => *n != 0.0 && !n.is_nan(),
        Value::Str(s) => !s.is_empty(),
        Value::Object(_) | Value::Func(_) => true,
    }
}

/// Convert a value to a number.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Num(n) => *n,
        Value::Str(s) => str_to_number(s),
        Value::Object(_) | Value::Func(_) => match to_primitive(value) {
            Value::Str(s) => str_to_number(&s),
            other => to_number(&other),
        },
    }
}

fn str_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    match trimmed {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed.parse().unwrap_or(f64::NAN),
    }
}

/// Convert a value to a string.
pub fn to_string(value: &Value) -> EcoString {
    match value {
        Value::Undefined => "undefined".into(),
        Value::Null => "null".into(),
        Value::Bool(b) => eco_format!("{b}"),
        Value::Num(n) => format_num(*n),
        Value::Str(s) => s.clone(),
        Value::Object(object) => {
            if object.is(HostClass::RegExp) {
                eco_format!(
                    "/{}/{}",
                    to_string(&object.get("source")),
                    to_string(&object.get("flags")),
                )
            } else if let Some(items) = object.items() {
                let mut out = EcoString::new();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    if !item.is_nullish() {
                        out.push_str(&to_string(item));
                    }
                }
                out
            } else {
                "[object Object]".into()
            }
        }
        Value::Func(func) => match func.name() {
            Some(name) => eco_format!("function {name}() {{ ... }}"),
            None => "function () { ... }".into(),
        },
    }
}

/// Format a number the way the evaluated language prints it.
pub fn format_num(n: f64) -> EcoString {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else if n == n.trunc() && n.abs() < 9e18 {
        eco_format!("{}", n as i64)
    } else {
        eco_format!("{n}")
    }
}

/// Reduce objects and functions to a primitive value for coercion.
pub fn to_primitive(value: &Value) -> Value {
    match value {
        Value::Object(_) | Value::Func(_) => Value::Str(to_string(value)),
        other => other.clone(),
    }
}

/// Convert a value to a property key.
pub fn property_key(value: &Value) -> EcoString {
    to_string(value)
}

/// Convert a value to a 32-bit signed integer, for bitwise operators.
pub fn to_int32(value: &Value) -> i32 {
    to_uint32(value) as i32
}

/// Convert a value to a 32-bit unsigned integer, for `>>>`.
pub fn to_uint32(value: &Value) -> u32 {
    let n = to_number(value);
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    const TWO_32: f64 = 4294967296.0;
    let n = n.trunc() % TWO_32;
    let n = if n < 0.0 { n + TWO_32 } else { n };
    n as u32
}

/// Compute the sum of two values: concatenation when either side is
/// string-like, numeric addition otherwise.
pub fn add(lhs: &Value, rhs: &Value) -> Value {
    let (l, r) = (to_primitive(lhs), to_primitive(rhs));
    if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) {
        let mut out = to_string(&l);
        out.push_str(&to_string(&r));
        Value::Str(out)
    } else {
        Value::Num(to_number(&l) + to_number(&r))
    }
}

/// Compute the difference of two values.
pub fn sub(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(to_number(lhs) - to_number(rhs))
}

/// Compute the product of two values.
pub fn mul(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(to_number(lhs) * to_number(rhs))
}

/// Compute the quotient of two values. Division by zero follows the
/// evaluated language: it yields an infinity or NaN, never an error.
pub fn div(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(to_number(lhs) / to_number(rhs))
}

/// Compute the remainder of two values.
pub fn rem(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(to_number(lhs) % to_number(rhs))
}

/// Shift left.
pub fn shl(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(f64::from(to_int32(lhs) << (to_uint32(rhs) & 31)))
}

/// Shift right, sign-extending.
pub fn shr(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(f64::from(to_int32(lhs) >> (to_uint32(rhs) & 31)))
}

/// Shift right, zero-filling.
pub fn ushr(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(f64::from(to_uint32(lhs) >> (to_uint32(rhs) & 31)))
}

/// Bitwise and.
pub fn bitand(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(f64::from(to_int32(lhs) & to_int32(rhs)))
}

/// Bitwise or.
pub fn bitor(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(f64::from(to_int32(lhs) | to_int32(rhs)))
}

/// Bitwise xor.
pub fn bitxor(lhs: &Value, rhs: &Value) -> Value {
    Value::Num(f64::from(to_int32(lhs) ^ to_int32(rhs)))
}

/// Strict equality: no coercion, pointer identity for objects, and NaN
/// never equal to itself.
pub fn strict_eq(lhs: &Value, rhs: &Value) -> bool {
    lhs == rhs
}

/// Loose equality, with the classic coercions.
pub fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Num(_), Value::Num(_))
        | (Value::Str(_), Value::Str(_))
        | (Value::Bool(_), Value::Bool(_))
        | (Value::Object(_) | Value::Func(_), Value::Object(_) | Value::Func(_)) => {
            strict_eq(lhs, rhs)
        }
        (Value::Num(n), Value::Str(s)) | (Value::Str(s), Value::Num(n)) => {
            *n == str_to_number(s)
        }
        (Value::Bool(_), _) => loose_eq(&Value::Num(to_number(lhs)), rhs),
        (_, Value::Bool(_)) => loose_eq(lhs, &Value::Num(to_number(rhs))),
        (Value::Object(_) | Value::Func(_), Value::Num(_) | Value::Str(_)) => {
            loose_eq(&to_primitive(lhs), rhs)
        }
        (Value::Num(_) | Value::Str(_), Value::Object(_) | Value::Func(_)) => {
            loose_eq(lhs, &to_primitive(rhs))
        }
        _ => false,
    }
}

macro_rules! relation {
    ($name:ident, $op:tt) => {
        #[doc = concat!("The `", stringify!($op), "` relation.")]
        pub fn $name(lhs: &Value, rhs: &Value) -> Value {
            let (l, r) = (to_primitive(lhs), to_primitive(rhs));
            Value::Bool(match (&l, &r) {
                (Value::Str(a), Value::Str(b)) => a.as_str() $op b.as_str(),
                _ => to_number(&l) $op to_number(&r),
            })
        }
    };
}

relation!(lt, <);
relation!(leq, <=);
relation!(gt, >);
relation!(geq, >=);

/// The `in` operator: property presence on an object.
pub fn in_(lhs: &Value, rhs: &Value) -> StrResult<Value> {
    match rhs.as_object() {
        Some(object) => Ok(Value::Bool(object.has(&property_key(lhs)))),
        None => Err(eco_format!(
            "cannot use 'in' operator to search in {}",
            rhs.type_name()
        )),
    }
}

/// The `instanceof` operator. True when the right side is the constructor
/// that produced the object, or a host constructor whose class matches.
pub fn instanceof(lhs: &Value, rhs: &Value) -> StrResult<Value> {
    let Some(func) = rhs.as_func() else {
        return Err(eco_format!(
            "right-hand side of 'instanceof' is not callable"
        ));
    };
    let Some(object) = lhs.as_object() else {
        return Ok(Value::Bool(false));
    };
    let by_construct = object.construct().is_some_and(|c| &c == func);
    let by_class = func
        .construct_class()
        .is_some_and(|class| object.is(class));
    Ok(Value::Bool(by_construct || by_class))
}

/// Numeric negation.
pub fn neg(value: &Value) -> Value {
    Value::Num(-to_number(value))
}

/// Unary plus: plain numeric coercion.
pub fn pos(value: &Value) -> Value {
    Value::Num(to_number(value))
}

/// Logical not.
pub fn not(value: &Value) -> Value {
    Value::Bool(!truthy(value))
}

/// Bitwise not.
pub fn bitnot(value: &Value) -> Value {
    Value::Num(f64::from(!to_int32(value)))
}

/// The `typeof` operator.
pub fn type_of(value: &Value) -> Value {
    Value::Str(value.type_name().into())
}

/// Increment for update expressions.
pub fn incr(value: &Value) -> Value {
    Value::Num(to_number(value) + 1.0)
}

/// Decrement for update expressions.
pub fn decr(value: &Value) -> Value {
    Value::Num(to_number(value) - 1.0)
}
