//! `printf`-style formatting of data values.
//!
//! Supported verbs: `%v %s %q %d %t %f %F %e %g %x %X %o %b %c %%`, with the
//! `-`, `+`, `0`, ` ` and `#` flags, a width and a precision (either may be
//! `*`). Formatting never fails: mismatches are reported inline, e.g.
//! `%!d(string=abc)`, `%!s(MISSING)` or `%!(EXTRA int=1)`. Widths and
//! precisions above one million are rejected with `%!(BADWIDTH)` or
//! `%!(BADPREC)`.

use std::fmt::Write;
use std::iter::Peekable;
use std::str::Chars;

use serde_json::Value;

use crate::value::{exponent_suffix, format_float, format_value, split_exponent, type_name, Num};

#[derive(Debug, Default, Clone, Copy)]
struct Directive {
    minus: bool,
    plus: bool,
    zero: bool,
    space: bool,
    sharp: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Format `args` according to `format`.
#[must_use]
pub fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    let mut next_arg = 0;
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let mut spec = Directive::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.minus = true,
                '+' => spec.plus = true,
                '0' => spec.zero = true,
                ' ' => spec.space = true,
                '#' => spec.sharp = true,
                _ => break,
            }
            chars.next();
        }
        if chars.next_if_eq(&'*').is_some() {
            match star_count(args, &mut next_arg) {
                Some(n) => {
                    // A negative width pads on the right.
                    spec.minus |= n < 0;
                    spec.width = usize::try_from(n.unsigned_abs()).ok();
                }
                None => out.push_str("%!(BADWIDTH)"),
            }
        } else {
            spec.width = digits(&mut chars);
        }
        if chars.next_if_eq(&'.').is_some() {
            if chars.next_if_eq(&'*').is_some() {
                spec.precision = star_count(args, &mut next_arg)
                    .filter(|n| *n >= 0)
                    .and_then(|n| usize::try_from(n).ok());
                if spec.precision.is_none() {
                    out.push_str("%!(BADPREC)");
                }
            } else {
                spec.precision = Some(digits(&mut chars).unwrap_or(0));
            }
        }
        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        let Some(arg) = args.get(next_arg) else {
            let _ = write!(out, "%!{verb}(MISSING)");
            continue;
        };
        next_arg += 1;
        match format_arg(verb, &spec, arg) {
            Some(body) => pad(&mut out, &body, &spec, is_numeric(verb, arg)),
            None => out.push_str(&bad_verb(verb, arg)),
        }
    }
    if next_arg < args.len() {
        out.push_str("%!(EXTRA ");
        for (i, arg) in args[next_arg..].iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}={}", type_name(arg), format_value(arg));
        }
        out.push(')');
    }
    out
}

/// Widths and precisions beyond this are rejected.
const MAX_COUNT: i64 = 1_000_000;

/// Read a decimal count; `None` when absent or out of range.
fn digits(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let mut n: Option<i64> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        n = Some(n.unwrap_or(0).saturating_mul(10).saturating_add(i64::from(d)));
    }
    n.filter(|n| *n <= MAX_COUNT).and_then(|n| usize::try_from(n).ok())
}

/// Take a `*` count from the arguments; `None` when missing, not an integer
/// or out of range.
fn star_count(args: &[Value], next_arg: &mut usize) -> Option<i64> {
    let arg = args.get(*next_arg)?;
    *next_arg += 1;
    Num::of(arg)
        .and_then(Num::as_int)
        .filter(|n| (-MAX_COUNT..=MAX_COUNT).contains(n))
}

fn is_numeric(verb: char, arg: &Value) -> bool {
    matches!(arg, Value::Number(_)) && !matches!(verb, 'c' | 'q')
}

fn bad_verb(verb: char, arg: &Value) -> String {
    match arg {
        Value::Null => format!("%!{verb}(<nil>)"),
        _ => format!("%!{verb}({}={})", type_name(arg), format_value(arg)),
    }
}

/// Format one argument, or `None` when the verb does not apply to it.
fn format_arg(verb: char, spec: &Directive, arg: &Value) -> Option<String> {
    match (verb, arg) {
        ('v', Value::Number(_)) => format_number_verb('v', spec, Num::of(arg)?),
        ('v', _) => Some(format_value(arg)),
        ('s', Value::String(s)) => Some(truncate(s, spec.precision)),
        ('s', Value::Array(_) | Value::Object(_)) => Some(format_value(arg)),
        ('q', Value::String(s)) => Some(quote(s)),
        ('t', Value::Bool(b)) => Some(b.to_string()),
        ('x' | 'X', Value::String(s)) => {
            let hex: String = s.bytes().map(|b| format!("{b:02x}")).collect();
            Some(if verb == 'X' { hex.to_uppercase() } else { hex })
        }
        (_, Value::Number(_)) => format_number_verb(verb, spec, Num::of(arg)?),
        _ => None,
    }
}

fn format_number_verb(verb: char, spec: &Directive, n: Num) -> Option<String> {
    let body = match (verb, n) {
        ('v' | 'd', Num::Int(i)) => signed(spec, i < 0, i.unsigned_abs().to_string()),
        ('v' | 'd', Num::Uint(u)) => signed(spec, false, u.to_string()),
        ('x' | 'X' | 'o' | 'b', Num::Int(_) | Num::Uint(_)) => {
            let (negative, magnitude) = match n {
                Num::Int(i) => (i < 0, i.unsigned_abs()),
                Num::Uint(u) => (false, u),
                Num::Float(_) => return None,
            };
            let digits = match verb {
                'x' => format!("{magnitude:x}"),
                'X' => format!("{magnitude:X}"),
                'o' => format!("{magnitude:o}"),
                _ => format!("{magnitude:b}"),
            };
            let prefix = match (spec.sharp, verb) {
                (true, 'x') => "0x",
                (true, 'X') => "0X",
                (true, 'o') => "0",
                _ => "",
            };
            signed(spec, negative, format!("{prefix}{digits}"))
        }
        ('c', Num::Int(_) | Num::Uint(_)) => rune(n).to_string(),
        ('q', Num::Int(_) | Num::Uint(_)) => format!("'{}'", escape(rune(n), '\'')),
        ('v', Num::Float(f)) => signed(spec, f.is_sign_negative(), format_float(f.abs())),
        ('f' | 'F', _) => {
            let f = n.as_f64();
            let precision = spec.precision.unwrap_or(6);
            signed(spec, f.is_sign_negative(), format!("{:.precision$}", f.abs()))
        }
        ('e', _) => {
            let f = n.as_f64();
            signed(spec, f.is_sign_negative(), exponential(f.abs(), spec.precision.unwrap_or(6)))
        }
        ('g', _) => {
            let f = n.as_f64();
            let body = match spec.precision {
                Some(p) => general(f.abs(), p.max(1)),
                None => format_float(f.abs()),
            };
            signed(spec, f.is_sign_negative(), body)
        }
        _ => return None,
    };
    Some(body)
}

/// The character for a code point; invalid ones become U+FFFD.
fn rune(n: Num) -> char {
    let code = match n {
        Num::Int(i) => u32::try_from(i).ok(),
        Num::Uint(u) => u32::try_from(u).ok(),
        Num::Float(_) => None,
    };
    code.and_then(char::from_u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn signed(spec: &Directive, negative: bool, magnitude: String) -> String {
    if negative {
        format!("-{magnitude}")
    } else if spec.plus {
        format!("+{magnitude}")
    } else if spec.space {
        format!(" {magnitude}")
    } else {
        magnitude
    }
}

fn exponential(f: f64, precision: usize) -> String {
    let scientific = format!("{f:.precision$e}");
    let (mantissa, exp) = split_exponent(&scientific);
    format!("{mantissa}{}", exponent_suffix(exp))
}

/// `%g` with an explicit number of significant digits.
fn general(f: f64, precision: usize) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    let digits = precision - 1;
    let scientific = format!("{f:.digits$e}");
    let (mantissa, exp) = split_exponent(&scientific);
    let precision_exp = i32::try_from(precision).unwrap_or(i32::MAX);
    if exp < -4 || exp >= precision_exp {
        return format!("{}{}", trim_zeros(mantissa), exponent_suffix(exp));
    }
    let decimals = usize::try_from(precision_exp - 1 - exp).unwrap_or(0);
    trim_zeros(&format!("{f:.decimals$}")).to_string()
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn truncate(s: &str, precision: Option<usize>) -> String {
    match precision {
        Some(p) => s.chars().take(p).collect(),
        None => s.to_string(),
    }
}

fn pad(out: &mut String, body: &str, spec: &Directive, numeric: bool) {
    let len = body.chars().count();
    let Some(width) = spec.width.filter(|&w| w > len) else {
        out.push_str(body);
        return;
    };
    let fill = width - len;
    if spec.minus {
        out.push_str(body);
        out.extend(std::iter::repeat_n(' ', fill));
    } else if spec.zero && numeric {
        let sign_len = usize::from(body.starts_with(['-', '+', ' ']));
        out.push_str(&body[..sign_len]);
        out.extend(std::iter::repeat_n('0', fill));
        out.push_str(&body[sign_len..]);
    } else {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(body);
    }
}

/// Quote a string with double quotes and backslash escapes.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        out.push_str(&escape(c, '"'));
    }
    out.push('"');
    out
}

fn escape(c: char, quote: char) -> String {
    match c {
        '\x07' => "\\a".to_string(),
        '\x08' => "\\b".to_string(),
        '\x0C' => "\\f".to_string(),
        '\n' => "\\n".to_string(),
        '\r' => "\\r".to_string(),
        '\t' => "\\t".to_string(),
        '\x0B' => "\\v".to_string(),
        '\\' => "\\\\".to_string(),
        c if c == quote => format!("\\{c}"),
        c if c.is_control() => match u32::from(c) {
            n if n < 0x100 => format!("\\x{n:02x}"),
            n => format!("\\u{n:04x}"),
        },
        c => c.to_string(),
    }
}
