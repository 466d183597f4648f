//! Structural rendering of field values.
//!
//! Two flavours:
//! - [`inline`]: single line, depth 3, used inside per-kind log lines
//! - [`pretty`]: multi-line when long, depth 10, used by the generic renderer
//!
//! Strings are single-quoted with escapes, so neither flavour ever emits a
//! newline from inside a value.

use serde_json::{Map, Value};

/// Nesting levels rendered by [`inline`] before collapsing to `[Object]`.
pub const INLINE_DEPTH: usize = 3;

/// Nesting levels rendered by [`pretty`].
pub const PRETTY_DEPTH: usize = 10;

/// Containers shorter than this stay on one line in [`pretty`].
const BREAK_LENGTH: usize = 72;

/// Single-line, depth-limited rendering.
pub fn inline(value: &Value) -> String {
    let mut out = String::new();
    write_inline(value, 0, INLINE_DEPTH, &mut out);
    out
}

/// Multi-line rendering for structured payloads.
pub fn pretty(value: &Value) -> String {
    write_pretty(value, 0, "")
}

fn write_inline(value: &Value, level: usize, max_depth: usize, out: &mut String) {
    match value {
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Array(_) if level > max_depth => out.push_str("[Array]"),
        Value::Object(_) if level > max_depth => out.push_str("[Object]"),
        Value::Array(items) => {
            out.push_str("[ ");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_inline(item, level + 1, max_depth, out);
            }
            out.push_str(" ]");
        }
        Value::Object(map) => {
            out.push_str("{ ");
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&format_key(key));
                out.push_str(": ");
                write_inline(item, level + 1, max_depth, out);
            }
            out.push_str(" }");
        }
        scalar => out.push_str(&format_scalar(scalar)),
    }
}

fn write_pretty(value: &Value, level: usize, indent: &str) -> String {
    let mut flat = String::new();
    write_inline(value, level, PRETTY_DEPTH, &mut flat);
    if flat.len() + indent.len() <= BREAK_LENGTH || level > PRETTY_DEPTH {
        return flat;
    }

    let inner = format!("{}  ", indent);
    match value {
        Value::Array(items) if !items.is_empty() => {
            let lines: Vec<String> = items
                .iter()
                .map(|item| format!("{}{}", inner, write_pretty(item, level + 1, &inner)))
                .collect();
            format!("[\n{}\n{}]", lines.join(",\n"), indent)
        }
        Value::Object(map) if !map.is_empty() => pretty_object(map, level, indent, &inner),
        _ => flat,
    }
}

fn pretty_object(map: &Map<String, Value>, level: usize, indent: &str, inner: &str) -> String {
    let lines: Vec<String> = map
        .iter()
        .map(|(key, item)| {
            format!(
                "{}{}: {}",
                inner,
                format_key(key),
                write_pretty(item, level + 1, inner)
            )
        })
        .collect();
    format!("{{\n{}\n{}}}", lines.join(",\n"), indent)
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        // containers are handled by the callers
        other => other.to_string(),
    }
}

fn format_key(key: &str) -> String {
    let mut chars = key.chars();
    let identifier = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    if identifier {
        key.to_string()
    } else {
        quote(key)
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
