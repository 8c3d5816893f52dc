//! Functions available to every template.

use std::cmp::Ordering;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::FuncError;
use crate::funcs::Func;
use crate::printf::sprintf;
use crate::value::{compare, equal, format_value, is_true, type_name, Num};

type Builtin = fn(&[Value]) -> Result<Value, FuncError>;

/// The builtin table, in a stable order.
pub(crate) static BUILTINS: Lazy<IndexMap<&'static str, Func>> = Lazy::new(|| {
    let table: [(&'static str, Builtin); 18] = [
        ("and", and),
        ("or", or),
        ("not", not),
        ("len", len),
        ("index", index),
        ("print", print),
        ("printf", printf),
        ("println", println),
        ("eq", eq),
        ("ne", ne),
        ("lt", lt),
        ("le", le),
        ("gt", gt),
        ("ge", ge),
        ("html", html),
        ("js", js),
        ("urlquery", urlquery),
        ("slice", slice),
    ];
    table
        .into_iter()
        .map(|(name, f)| (name, Arc::new(f) as Func))
        .collect()
});

/// Names of the builtin functions.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.keys().copied()
}

fn arity(name: &str, args: &[Value], want: usize) -> Result<(), FuncError> {
    if args.len() == want {
        Ok(())
    } else {
        Err(FuncError::new(format!(
            "wrong number of args for {name}: want {want} got {}",
            args.len()
        )))
    }
}

fn at_least(name: &str, args: &[Value], want: usize) -> Result<(), FuncError> {
    if args.len() >= want {
        Ok(())
    } else {
        Err(FuncError::new(format!(
            "wrong number of args for {name}: want at least {want} got {}",
            args.len()
        )))
    }
}

// ============================================================================
// Boolean
// ============================================================================

/// First false argument, or the last argument.
fn and(args: &[Value]) -> Result<Value, FuncError> {
    at_least("and", args, 1)?;
    let last = args.len() - 1;
    Ok(args
        .iter()
        .position(|arg| !is_true(arg))
        .map_or_else(|| args[last].clone(), |i| args[i].clone()))
}

/// First true argument, or the last argument.
fn or(args: &[Value]) -> Result<Value, FuncError> {
    at_least("or", args, 1)?;
    let last = args.len() - 1;
    Ok(args
        .iter()
        .position(is_true)
        .map_or_else(|| args[last].clone(), |i| args[i].clone()))
}

fn not(args: &[Value]) -> Result<Value, FuncError> {
    arity("not", args, 1)?;
    Ok(Value::Bool(!is_true(&args[0])))
}

// ============================================================================
// Collections
// ============================================================================

fn len(args: &[Value]) -> Result<Value, FuncError> {
    arity("len", args, 1)?;
    let n = match &args[0] {
        Value::String(s) => s.len(),
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        Value::Null => return Err(FuncError::new("len of nil pointer")),
        other => return Err(FuncError::new(format!("len of type {}", type_name(other)))),
    };
    Ok(Value::from(n))
}

fn index(args: &[Value]) -> Result<Value, FuncError> {
    at_least("index", args, 1)?;
    let mut item = args[0].clone();
    for key in &args[1..] {
        item = match (&item, key) {
            (Value::Array(items), _) => {
                let i = int_index(key, items.len())?;
                items[i].clone()
            }
            (Value::String(s), _) => {
                let i = int_index(key, s.len())?;
                Value::from(s.as_bytes()[i])
            }
            (Value::Object(map), Value::String(k)) => map.get(k).cloned().unwrap_or(Value::Null),
            (Value::Object(_), other) => {
                return Err(FuncError::new(format!(
                    "value has type {}; should be string",
                    type_name(other)
                )));
            }
            (Value::Null, _) => return Err(FuncError::new("index of untyped nil")),
            (other, _) => {
                return Err(FuncError::new(format!(
                    "can't index item of type {}",
                    type_name(other)
                )));
            }
        };
    }
    Ok(item)
}

/// Resolve an index argument against a length of `len`.
fn int_index(key: &Value, len: usize) -> Result<usize, FuncError> {
    let Some(i) = Num::of(key).and_then(Num::as_int) else {
        return Err(FuncError::new(format!(
            "cannot index slice/array with type {}",
            type_name(key)
        )));
    };
    usize::try_from(i)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| FuncError::new(format!("index out of range: {i}")))
}

/// `slice x 1 2` is `x[1:2]`.
fn slice(args: &[Value]) -> Result<Value, FuncError> {
    at_least("slice", args, 1)?;
    if args.len() > 3 {
        return Err(FuncError::new(format!("too many slice indexes: {}", args.len() - 1)));
    }
    let len = match &args[0] {
        Value::Array(a) => a.len(),
        Value::String(s) => s.len(),
        Value::Null => return Err(FuncError::new("slice of untyped nil")),
        other => {
            return Err(FuncError::new(format!("can't slice item of type {}", type_name(other))));
        }
    };
    let bound = |i: usize| -> Result<usize, FuncError> {
        match args.get(i) {
            None => Ok(if i == 1 { 0 } else { len }),
            Some(key) => int_index(key, len + 1),
        }
    };
    let (low, high) = (bound(1)?, bound(2)?);
    if low > high {
        return Err(FuncError::new(format!("invalid slice index: {low} > {high}")));
    }
    match &args[0] {
        Value::Array(a) => Ok(Value::Array(a[low..high].to_vec())),
        Value::String(s) => s
            .get(low..high)
            .map(Value::from)
            .ok_or_else(|| FuncError::new("slice splits a character")),
        _ => Ok(Value::Null),
    }
}

// ============================================================================
// Printing
// ============================================================================

/// Operands are joined with a space when neither side is a string.
pub(crate) fn sprint(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 && !matches!(arg, Value::String(_)) && !matches!(args[i - 1], Value::String(_)) {
            out.push(' ');
        }
        out.push_str(&format_value(arg));
    }
    out
}

fn print(args: &[Value]) -> Result<Value, FuncError> {
    Ok(Value::String(sprint(args)))
}

fn println(args: &[Value]) -> Result<Value, FuncError> {
    let mut out = args.iter().map(format_value).collect::<Vec<_>>().join(" ");
    out.push('\n');
    Ok(Value::String(out))
}

fn printf(args: &[Value]) -> Result<Value, FuncError> {
    at_least("printf", args, 1)?;
    let Value::String(format) = &args[0] else {
        return Err(FuncError::new(format!(
            "printf format has type {}; should be string",
            type_name(&args[0])
        )));
    };
    Ok(Value::String(sprintf(format, &args[1..])))
}

// ============================================================================
// Comparison
// ============================================================================

/// Whether the first argument equals any of the others.
fn eq(args: &[Value]) -> Result<Value, FuncError> {
    if args.len() < 2 {
        return Err(FuncError::new("missing argument for comparison"));
    }
    for other in &args[1..] {
        if equal(&args[0], other).map_err(FuncError::new)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn ne(args: &[Value]) -> Result<Value, FuncError> {
    arity("ne", args, 2)?;
    Ok(Value::Bool(!equal(&args[0], &args[1]).map_err(FuncError::new)?))
}

fn ordered(name: &str, args: &[Value], accept: fn(Ordering) -> bool) -> Result<Value, FuncError> {
    arity(name, args, 2)?;
    let ordering = compare(&args[0], &args[1]).map_err(FuncError::new)?;
    Ok(Value::Bool(accept(ordering)))
}

fn lt(args: &[Value]) -> Result<Value, FuncError> {
    ordered("lt", args, Ordering::is_lt)
}

fn le(args: &[Value]) -> Result<Value, FuncError> {
    ordered("le", args, Ordering::is_le)
}

fn gt(args: &[Value]) -> Result<Value, FuncError> {
    ordered("gt", args, Ordering::is_gt)
}

fn ge(args: &[Value]) -> Result<Value, FuncError> {
    ordered("ge", args, Ordering::is_ge)
}

// ============================================================================
// Escaping
// ============================================================================

/// The text to escape: a lone string as is, anything else as `print` would render it.
fn escape_input(args: &[Value]) -> String {
    match args {
        [Value::String(s)] => s.clone(),
        _ => sprint(args),
    }
}

fn html(args: &[Value]) -> Result<Value, FuncError> {
    let input = escape_input(args);
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\0' => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
    Ok(Value::String(out))
}

fn js(args: &[Value]) -> Result<Value, FuncError> {
    let input = escape_input(args);
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\u003C"),
            '>' => out.push_str("\\u003E"),
            '&' => out.push_str("\\u0026"),
            '=' => out.push_str("\\u003D"),
            c if u32::from(c) < 0x20 => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push(c),
        }
    }
    Ok(Value::String(out))
}

fn urlquery(args: &[Value]) -> Result<Value, FuncError> {
    let input = escape_input(args);
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(b));
            }
            b' ' => out.push('+'),
            b => out.push_str(&format!("%{b:02X}")),
        }
    }
    Ok(Value::String(out))
}
