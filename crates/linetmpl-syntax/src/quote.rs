//! Interpretation of quoted string and character literals.

/// Unquote a double-quoted, back-quoted or single-quoted literal.
pub(crate) fn unquote(s: &str) -> Result<String, String> {
    let invalid = || format!("invalid syntax: {s}");
    let mut chars = s.chars();
    let (Some(open), Some(close)) = (chars.next(), chars.next_back()) else {
        return Err(invalid());
    };
    if open != close || s.len() < 2 {
        return Err(invalid());
    }
    let body = &s[1..s.len() - 1];
    match open {
        '`' => {
            if body.contains('`') {
                return Err(invalid());
            }
            Ok(body.replace('\r', ""))
        }
        '"' | '\'' => {
            let text = unescape(body, open).ok_or_else(invalid)?;
            if open == '\'' && text.chars().count() != 1 {
                return Err(invalid());
            }
            Ok(text)
        }
        _ => Err(invalid()),
    }
}

/// Unquote a single-quoted character constant.
pub(crate) fn unquote_char(s: &str) -> Result<char, String> {
    let text = unquote(s)?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if s.starts_with('\'') => Ok(c),
        _ => Err(format!("malformed character constant: {s}")),
    }
}

fn unescape(body: &str, quote: char) -> Option<String> {
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == quote || c == '\n' {
            return None;
        }
        if c != '\\' {
            let mut buf = [0; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let escaped = chars.next()?;
        let simple = match escaped {
            'a' => Some(0x07),
            'b' => Some(0x08),
            'f' => Some(0x0C),
            'n' => Some(b'\n'),
            'r' => Some(b'\r'),
            't' => Some(b'\t'),
            'v' => Some(0x0B),
            '\\' => Some(b'\\'),
            '"' | '\'' if escaped == quote => Some(escaped as u8),
            _ => None,
        };
        if let Some(b) = simple {
            out.push(b);
            continue;
        }
        match escaped {
            'x' => out.push(u8::try_from(hex_digits(&mut chars, 2)?).ok()?),
            'u' | 'U' => {
                let n = if escaped == 'u' { 4 } else { 8 };
                let c = char::from_u32(hex_digits(&mut chars, n)?)?;
                let mut buf = [0; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            '0'..='7' => {
                let mut value = escaped.to_digit(8)?;
                for _ in 0..2 {
                    value = value * 8 + chars.next()?.to_digit(8)?;
                }
                out.push(u8::try_from(value).ok()?);
            }
            _ => return None,
        }
    }
    String::from_utf8(out).ok()
}

fn hex_digits(chars: &mut std::str::Chars<'_>, n: usize) -> Option<u32> {
    let mut value = 0;
    for _ in 0..n {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}
