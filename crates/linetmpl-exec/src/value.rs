//! Truthiness, printing and comparison of data values.
//!
//! Templates render against JSON values. Printing follows the conventions of
//! the `%v` verb: integers in decimal, floats in shortest form with an
//! exponent for very large or very small magnitudes, arrays as `[a b]` and
//! objects as `map[k:v]` with sorted keys.

use std::cmp::Ordering;
use std::fmt::Write;

use serde_json::{Number, Value};

/// Text printed by an action whose value is missing.
pub const NO_VALUE: &str = "<no value>";

/// A number split by representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Num {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl Num {
    pub(crate) fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self::from_number(n)),
            _ => None,
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            Self::Int(i)
        } else if let Some(u) = n.as_u64() {
            Self::Uint(u)
        } else {
            Self::Float(n.as_f64().unwrap_or(f64::NAN))
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Uint(u) => u as f64,
            Self::Float(f) => f,
        }
    }

    pub(crate) const fn as_int(self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(i),
            _ => None,
        }
    }
}

/// Build a JSON number from a float; non-finite values become null.
#[must_use]
pub fn float(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

/// Whether a value counts as true in `if`, `with`, `and`, `or` and `not`.
///
/// Null, `false`, zero, and empty strings, arrays and objects are false.
#[must_use]
pub fn is_true(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => match Num::from_number(n) {
            Num::Int(i) => i != 0,
            Num::Uint(u) => u != 0,
            Num::Float(f) => f != 0.0,
        },
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Type name used in diagnostics.
#[must_use]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(n) => match Num::from_number(n) {
            Num::Int(_) => "int",
            Num::Uint(_) => "uint64",
            Num::Float(_) => "float64",
        },
        Value::String(_) => "string",
        Value::Array(_) => "[]interface {}",
        Value::Object(_) => "map[string]interface {}",
    }
}

/// Text an action prints for its final value.
#[must_use]
pub fn to_output(value: &Value) -> String {
    match value {
        Value::Null => NO_VALUE.to_string(),
        other => format_value(other),
    }
}

/// Format a value the way the `%v` verb does.
#[must_use]
pub fn format_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("<nil>"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&format_number(Num::from_number(n))),
        Value::String(s) => out.push_str(s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push_str("map[");
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{key}:");
                write_value(out, &map[key]);
            }
            out.push(']');
        }
    }
}

pub(crate) fn format_number(n: Num) -> String {
    match n {
        Num::Int(i) => i.to_string(),
        Num::Uint(u) => u.to_string(),
        Num::Float(f) => format_float(f),
    }
}

/// Shortest representation of a float, switching to an exponent when the
/// decimal exponent is below -4 or at least 6.
#[must_use]
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let scientific = format!("{f:e}");
    let (mantissa, exp) = split_exponent(&scientific);
    if !(-4..6).contains(&exp) {
        return format!("{mantissa}{}", exponent_suffix(exp));
    }
    f.to_string()
}

/// Split Rust's `1.5e-7` form into mantissa and exponent.
pub(crate) fn split_exponent(scientific: &str) -> (&str, i32) {
    match scientific.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (scientific, 0),
    }
}

/// Exponent in the `e+06` / `e-07` form: explicit sign, at least two digits.
pub(crate) fn exponent_suffix(exp: i32) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    format!("e{sign}{:02}", exp.unsigned_abs())
}

/// Equality for `eq` and `ne`. Numbers compare by value across representations.
pub(crate) fn equal(a: &Value, b: &Value) -> Result<bool, String> {
    match (a, b) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, _) | (_, Value::Null) => Ok(false),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::String(x), Value::String(y)) => Ok(x == y),
        (Value::Number(_), Value::Number(_)) => Ok(compare_numbers(a, b) == Some(Ordering::Equal)),
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
            Err(format!("non-comparable type {}", type_name(a)))
        }
        _ => Err("incompatible types for comparison".to_string()),
    }
}

/// Ordering for `lt`, `le`, `gt` and `ge`.
pub(crate) fn compare(a: &Value, b: &Value) -> Result<Ordering, String> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Number(_), Value::Number(_)) => compare_numbers(a, b)
            .ok_or_else(|| "incompatible types for comparison".to_string()),
        (Value::Number(_) | Value::String(_), Value::Number(_) | Value::String(_)) => {
            Err("incompatible types for comparison".to_string())
        }
        (Value::Number(_) | Value::String(_), other) | (other, _) => {
            Err(format!("invalid type for comparison: {}", type_name(other)))
        }
    }
}

fn compare_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    let (x, y) = (Num::of(a)?, Num::of(b)?);
    match (x, y) {
        (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
        (Num::Uint(x), Num::Uint(y)) => Some(x.cmp(&y)),
        (Num::Int(x), Num::Uint(y)) => Some(if x < 0 { Ordering::Less } else { x.unsigned_abs().cmp(&y) }),
        (Num::Uint(x), Num::Int(y)) => Some(if y < 0 { Ordering::Greater } else { x.cmp(&y.unsigned_abs()) }),
        _ => x.as_f64().partial_cmp(&y.as_f64()),
    }
}
