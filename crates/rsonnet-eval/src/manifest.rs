//! Manifestation: turning lazy values into JSON.
//!
//! Conversion forces everything it touches. Only visible (non-hidden)
//! object fields are emitted, sorted lexicographically by key. Numbers
//! keep their integer form when the underlying double is integral;
//! functions cannot be manifested.
//!
//! The JSON writers are hand-rolled so that `--indent`, `--ensure-ascii`,
//! and the `manifestJsonEx` separator parameters are all served by one
//! code path.

use serde_json::Value as Json;

use crate::error::{eval_err, EvalError, EvalResult};
use crate::thunk::Thunk;
use crate::value::{Object, ObjField, Value};
use crate::Evaluator;

/// Largest double that still identifies an exact integer.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0; // 2^53

/// Recursively forces `value` into a JSON tree.
///
/// # Errors
///
/// Any runtime error raised by forcing, plus manifestation errors for
/// functions and non-finite numbers.
pub fn to_json(ev: &Evaluator, value: &Value) -> EvalResult<Json> {
    match value {
        Value::Null => Ok(Json::Null),
        Value::Bool(b) => Ok(Json::Bool(*b)),
        Value::Num(n) => Ok(Json::Number(number_to_json(*n)?)),
        Value::Str(s) => Ok(Json::String(s.to_string())),
        Value::Arr(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items.iter() {
                let forced = item.force(ev)?;
                out.push(to_json(ev, &forced)?);
            }
            Ok(Json::Array(out))
        }
        Value::Obj(obj) => {
            let mut map = serde_json::Map::new();
            for name in obj.sorted_field_names(false) {
                let forced = obj.field_value(ev, &name)?;
                map.insert(name.to_string(), to_json(ev, &forced)?);
            }
            Ok(Json::Object(map))
        }
        Value::Func(_) => Err(EvalError::new("Cannot manifest function")),
    }
}

/// Converts a double to a JSON number, preserving integer form.
pub fn number_to_json(n: f64) -> EvalResult<serde_json::Number> {
    if !n.is_finite() {
        eval_err!("Cannot manifest a non-finite number");
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Ok(serde_json::Number::from(n as i64));
    }
    serde_json::Number::from_f64(n)
        .ok_or_else(|| EvalError::new("Cannot manifest a non-finite number"))
}

/// Converts a JSON tree back into a value (for `std.parseJson` and
/// native-callback results).
pub fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Num(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::str(s),
        Json::Array(items) => {
            let thunks = items
                .iter()
                .map(|item| Thunk::done(json_to_value(item)))
                .collect();
            Value::Arr(std::rc::Rc::new(thunks))
        }
        Json::Object(map) => {
            let obj = Object::new();
            for (key, item) in map {
                obj.insert(
                    std::rc::Rc::from(key.as_str()),
                    ObjField::visible(json_to_value(item)),
                );
            }
            Value::Obj(obj)
        }
    }
}

/// `std.toString` semantics: strings pass through unquoted, everything
/// else reads as its compact JSON form.
pub fn value_to_string(ev: &Evaluator, value: &Value) -> EvalResult<String> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Num(n) => Ok(number_to_json(*n)?.to_string()),
        _ => {
            let json = to_json(ev, value)?;
            Ok(write_json(&json, &WriteOptions::compact()))
        }
    }
}

/// Options for the JSON writer.
pub struct WriteOptions {
    /// Per-level indentation; `None` writes a single line.
    pub indent: Option<String>,
    /// Line separator used when `indent` is set.
    pub newline: String,
    /// Separator between a key and its value.
    pub key_val_sep: String,
    /// Separator between items on a single line.
    pub item_sep: String,
    /// Escape characters above U+007F.
    pub ensure_ascii: bool,
}

impl WriteOptions {
    /// Compact single-line output: `{"a":1,"b":[1,2]}`.
    pub fn compact() -> Self {
        Self {
            indent: None,
            newline: "\n".to_string(),
            key_val_sep: ":".to_string(),
            item_sep: ",".to_string(),
            ensure_ascii: false,
        }
    }

    /// Single-line output with spaces after separators, the default CLI
    /// form when no indent is requested.
    pub fn spaced() -> Self {
        Self {
            indent: None,
            newline: "\n".to_string(),
            key_val_sep: ": ".to_string(),
            item_sep: ", ".to_string(),
            ensure_ascii: false,
        }
    }

    /// Multi-line output indented by `width` spaces per level.
    pub fn indented(width: usize) -> Self {
        Self {
            indent: Some(" ".repeat(width)),
            newline: "\n".to_string(),
            key_val_sep: ": ".to_string(),
            item_sep: ",".to_string(),
            ensure_ascii: false,
        }
    }
}

/// Writes a JSON tree as text under the given options.
pub fn write_json(json: &Json, options: &WriteOptions) -> String {
    let mut out = String::new();
    write_value(json, options, 0, &mut out);
    out
}

fn write_value(json: &Json, options: &WriteOptions, level: usize, out: &mut String) {
    match json {
        Json::Null => out.push_str("null"),
        Json::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Json::Number(n) => out.push_str(&n.to_string()),
        Json::String(s) => write_string(s, options.ensure_ascii, out),
        Json::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(&options.item_sep);
                }
                open_line(options, level + 1, out);
                write_value(item, options, level + 1, out);
            }
            close_line(options, level, out);
            out.push(']');
        }
        Json::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push('{');
            for (index, (key, item)) in map.iter().enumerate() {
                if index > 0 {
                    out.push_str(&options.item_sep);
                }
                open_line(options, level + 1, out);
                write_string(key, options.ensure_ascii, out);
                out.push_str(&options.key_val_sep);
                write_value(item, options, level + 1, out);
            }
            close_line(options, level, out);
            out.push('}');
        }
    }
}

fn open_line(options: &WriteOptions, level: usize, out: &mut String) {
    if let Some(indent) = &options.indent {
        out.push_str(&options.newline);
        for _ in 0..level {
            out.push_str(indent);
        }
    }
}

fn close_line(options: &WriteOptions, level: usize, out: &mut String) {
    if let Some(indent) = &options.indent {
        out.push_str(&options.newline);
        for _ in 0..level {
            out.push_str(indent);
        }
    }
}

/// Writes a JSON string literal with escaping.
pub fn write_string(s: &str, ensure_ascii: bool, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c if ensure_ascii && !c.is_ascii() => {
                let code = c as u32;
                if code > 0xFFFF {
                    // Encode as a UTF-16 surrogate pair.
                    let code = code - 0x10000;
                    let high = 0xD800 + (code >> 10);
                    let low = 0xDC00 + (code & 0x3FF);
                    out.push_str(&format!("\\u{high:04x}\\u{low:04x}"));
                } else {
                    out.push_str(&format!("\\u{code:04x}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
