//! String builtins.
//!
//! Positions and lengths are in Unicode code points, matching the
//! language's string indexing.

use super::{builtin, int_arg, make_array, str_arg};
use crate::error::eval_err;
use crate::format;
use crate::value::{Builtin, Value};

pub(super) fn register(out: &mut Vec<Builtin>) {
    out.push(builtin("codepoint", &["str"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.codepoint argument")?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Value::Num(c as u32 as f64)),
            _ => eval_err!("std.codepoint requires a single-character string"),
        }
    }));

    out.push(builtin("char", &["n"], |ev, args| {
        let code = int_arg(ev, &args[0], "std.char argument")?;
        let c = u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| crate::error::EvalError::new(format!("Invalid codepoint: {code}")))?;
        Ok(Value::str(c.to_string()))
    }));

    out.push(builtin("substr", &["str", "from", "len"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.substr string")?;
        let from = int_arg(ev, &args[1], "std.substr from")?;
        let len = int_arg(ev, &args[2], "std.substr len")?;
        if from < 0 {
            eval_err!("std.substr from must not be negative, got {from}");
        }
        if len < 0 {
            eval_err!("std.substr len must not be negative, got {len}");
        }
        let taken: String = s
            .chars()
            .skip(from as usize)
            .take(len as usize)
            .collect();
        Ok(Value::str(taken))
    }));

    out.push(builtin("findSubstr", &["pat", "str"], |ev, args| {
        let pat = str_arg(ev, &args[0], "std.findSubstr pattern")?;
        let s = str_arg(ev, &args[1], "std.findSubstr string")?;
        if pat.is_empty() {
            return Ok(make_array(Vec::new()));
        }
        let chars: Vec<char> = s.chars().collect();
        let needle: Vec<char> = pat.chars().collect();
        let mut found = Vec::new();
        if needle.len() <= chars.len() {
            for i in 0..=(chars.len() - needle.len()) {
                if chars[i..i + needle.len()] == needle[..] {
                    found.push(Value::Num(i as f64));
                }
            }
        }
        Ok(make_array(found))
    }));

    out.push(builtin("startsWith", &["a", "b"], |ev, args| {
        let a = str_arg(ev, &args[0], "std.startsWith first argument")?;
        let b = str_arg(ev, &args[1], "std.startsWith second argument")?;
        Ok(Value::Bool(a.starts_with(b.as_ref())))
    }));

    out.push(builtin("endsWith", &["a", "b"], |ev, args| {
        let a = str_arg(ev, &args[0], "std.endsWith first argument")?;
        let b = str_arg(ev, &args[1], "std.endsWith second argument")?;
        Ok(Value::Bool(a.ends_with(b.as_ref())))
    }));

    out.push(builtin("stripChars", &["str", "chars"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.stripChars string")?;
        let chars = str_arg(ev, &args[1], "std.stripChars chars")?;
        let set: Vec<char> = chars.chars().collect();
        Ok(Value::str(
            s.trim_matches(|c| set.contains(&c)).to_string(),
        ))
    }));

    out.push(builtin("lstripChars", &["str", "chars"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.lstripChars string")?;
        let chars = str_arg(ev, &args[1], "std.lstripChars chars")?;
        let set: Vec<char> = chars.chars().collect();
        Ok(Value::str(
            s.trim_start_matches(|c| set.contains(&c)).to_string(),
        ))
    }));

    out.push(builtin("rstripChars", &["str", "chars"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.rstripChars string")?;
        let chars = str_arg(ev, &args[1], "std.rstripChars chars")?;
        let set: Vec<char> = chars.chars().collect();
        Ok(Value::str(
            s.trim_end_matches(|c| set.contains(&c)).to_string(),
        ))
    }));

    out.push(builtin("split", &["str", "c"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.split string")?;
        let sep = str_arg(ev, &args[1], "std.split separator")?;
        split_limit(&s, &sep, -1, false)
    }));

    out.push(builtin("splitLimit", &["str", "c", "maxsplits"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.splitLimit string")?;
        let sep = str_arg(ev, &args[1], "std.splitLimit separator")?;
        let maxsplits = int_arg(ev, &args[2], "std.splitLimit maxsplits")?;
        split_limit(&s, &sep, maxsplits, false)
    }));

    out.push(builtin(
        "splitLimitR",
        &["str", "c", "maxsplits"],
        |ev, args| {
            let s = str_arg(ev, &args[0], "std.splitLimitR string")?;
            let sep = str_arg(ev, &args[1], "std.splitLimitR separator")?;
            let maxsplits = int_arg(ev, &args[2], "std.splitLimitR maxsplits")?;
            split_limit(&s, &sep, maxsplits, true)
        },
    ));

    out.push(builtin("strReplace", &["str", "from", "to"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.strReplace string")?;
        let from = str_arg(ev, &args[1], "std.strReplace from")?;
        let to = str_arg(ev, &args[2], "std.strReplace to")?;
        if from.is_empty() {
            eval_err!("std.strReplace from string must not be empty");
        }
        Ok(Value::str(s.replace(from.as_ref(), to.as_ref())))
    }));

    out.push(builtin("isEmpty", &["str"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.isEmpty argument")?;
        Ok(Value::Bool(s.is_empty()))
    }));

    out.push(builtin("trim", &["str"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.trim argument")?;
        Ok(Value::str(s.trim().to_string()))
    }));

    out.push(builtin("equalsIgnoreCase", &["str1", "str2"], |ev, args| {
        let a = str_arg(ev, &args[0], "std.equalsIgnoreCase first argument")?;
        let b = str_arg(ev, &args[1], "std.equalsIgnoreCase second argument")?;
        Ok(Value::Bool(a.to_lowercase() == b.to_lowercase()))
    }));

    out.push(builtin("asciiUpper", &["str"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.asciiUpper argument")?;
        Ok(Value::str(s.to_ascii_uppercase()))
    }));

    out.push(builtin("asciiLower", &["str"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.asciiLower argument")?;
        Ok(Value::str(s.to_ascii_lowercase()))
    }));

    out.push(builtin("stringChars", &["str"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.stringChars argument")?;
        let chars = s
            .chars()
            .map(|c| Value::str(c.to_string()))
            .collect();
        Ok(make_array(chars))
    }));

    out.push(builtin("format", &["str", "vals"], |ev, args| {
        let template = str_arg(ev, &args[0], "std.format template")?;
        let vals = args[1].force(ev)?;
        format::format_value(ev, &template, &vals)
    }));

    out.push(builtin("escapeStringJson", &["str_"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.escapeStringJson argument")?;
        Ok(Value::str(escape_json(&s)))
    }));

    // Python string literals escape identically to JSON.
    out.push(builtin("escapeStringPython", &["str_"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.escapeStringPython argument")?;
        Ok(Value::str(escape_json(&s)))
    }));

    out.push(builtin("escapeStringBash", &["str_"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.escapeStringBash argument")?;
        let escaped = s.replace('\'', "'\"'\"'");
        Ok(Value::str(format!("'{escaped}'")))
    }));

    out.push(builtin("escapeStringDollars", &["str_"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.escapeStringDollars argument")?;
        Ok(Value::str(s.replace('$', "$$")))
    }));

    out.push(builtin("escapeStringXml", &["str_"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.escapeStringXml argument")?;
        let mut escaped = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '&' => escaped.push_str("&amp;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                c => escaped.push(c),
            }
        }
        Ok(Value::str(escaped))
    }));
}

/// Shared splitter; `maxsplits < 0` means unlimited, `from_right` splits
/// from the end of the string.
fn split_limit(
    s: &str,
    sep: &str,
    maxsplits: i64,
    from_right: bool,
) -> crate::error::EvalResult<Value> {
    if sep.is_empty() {
        eval_err!("Split separator must not be empty");
    }

    let pieces: Vec<&str> = if maxsplits < 0 {
        s.split(sep).collect()
    } else if from_right {
        let mut pieces: Vec<&str> = s.rsplitn(maxsplits as usize + 1, sep).collect();
        pieces.reverse();
        pieces
    } else {
        s.splitn(maxsplits as usize + 1, sep).collect()
    };

    Ok(make_array(pieces.into_iter().map(Value::str).collect()))
}

/// JSON string-literal escaping, quotes included.
fn escape_json(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    crate::manifest::write_string(s, false, &mut out);
    out
}
