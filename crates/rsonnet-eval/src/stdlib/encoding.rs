//! Parsing, encoding, and digest builtins.

use base64::Engine as _;
use sha1::Digest as _;

use super::{arr_arg, builtin, make_array, str_arg};
use crate::error::{eval_err, EvalResult};
use crate::manifest;
use crate::value::{Builtin, Value};
use crate::Evaluator;

pub(super) fn register(out: &mut Vec<Builtin>) {
    out.push(builtin("parseInt", &["str"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.parseInt argument")?;
        parse_radix(&s, 10, "parseInt")
    }));

    out.push(builtin("parseOctal", &["str"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.parseOctal argument")?;
        parse_radix(&s, 8, "parseOctal")
    }));

    out.push(builtin("parseHex", &["str"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.parseHex argument")?;
        parse_radix(&s, 16, "parseHex")
    }));

    out.push(builtin("parseJson", &["str"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.parseJson argument")?;
        let json: serde_json::Value = serde_json::from_str(&s)
            .map_err(|e| crate::error::EvalError::new(format!("Failed to parse JSON: {e}")))?;
        Ok(manifest::json_to_value(&json))
    }));

    out.push(builtin("encodeUTF8", &["str"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.encodeUTF8 argument")?;
        let bytes = s
            .as_bytes()
            .iter()
            .map(|b| Value::Num(f64::from(*b)))
            .collect();
        Ok(make_array(bytes))
    }));

    out.push(builtin("decodeUTF8", &["arr"], |ev, args| {
        let bytes = byte_array(ev, &args[0], "std.decodeUTF8")?;
        match String::from_utf8(bytes) {
            Ok(s) => Ok(Value::str(s)),
            Err(_) => eval_err!("std.decodeUTF8 input is not valid UTF-8"),
        }
    }));

    out.push(builtin("base64", &["input"], |ev, args| {
        let input = args[0].force(ev)?;
        let bytes = match &input {
            Value::Str(s) => s.as_bytes().to_vec(),
            Value::Arr(_) => byte_array(ev, &args[0], "std.base64")?,
            other => eval_err!(
                "std.base64 operates on strings and arrays of bytes, got {}",
                other.type_name()
            ),
        };
        Ok(Value::str(
            base64::engine::general_purpose::STANDARD.encode(bytes),
        ))
    }));

    out.push(builtin("base64Decode", &["str"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.base64Decode argument")?;
        let bytes = decode_base64(&s)?;
        match String::from_utf8(bytes) {
            Ok(s) => Ok(Value::str(s)),
            Err(_) => eval_err!("std.base64Decode result is not valid UTF-8"),
        }
    }));

    out.push(builtin("base64DecodeBytes", &["str"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.base64DecodeBytes argument")?;
        let bytes = decode_base64(&s)?;
        Ok(make_array(
            bytes.into_iter().map(|b| Value::Num(f64::from(b))).collect(),
        ))
    }));

    out.push(builtin("md5", &["s"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.md5 argument")?;
        Ok(Value::str(format!("{:x}", md5::compute(s.as_bytes()))))
    }));

    out.push(builtin("sha1", &["s"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.sha1 argument")?;
        let digest = sha1::Sha1::digest(s.as_bytes());
        Ok(Value::str(hex(&digest)))
    }));

    out.push(builtin("sha256", &["s"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.sha256 argument")?;
        let digest = sha2::Sha256::digest(s.as_bytes());
        Ok(Value::str(hex(&digest)))
    }));

    out.push(builtin("sha512", &["s"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.sha512 argument")?;
        let digest = sha2::Sha512::digest(s.as_bytes());
        Ok(Value::str(hex(&digest)))
    }));

    out.push(builtin("sha3", &["s"], |ev, args| {
        let s = str_arg(ev, &args[0], "std.sha3 argument")?;
        let digest = sha3::Sha3_512::digest(s.as_bytes());
        Ok(Value::str(hex(&digest)))
    }));
}

/// Parses a signed integer literal in the given radix.
fn parse_radix(s: &str, radix: u32, name: &str) -> EvalResult<Value> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if digits.is_empty() {
        eval_err!("std.{name}: invalid integer \"{s}\"");
    }
    let mut value: f64 = 0.0;
    for c in digits.chars() {
        let Some(digit) = c.to_digit(radix) else {
            eval_err!("std.{name}: invalid integer \"{s}\"");
        };
        value = value * f64::from(radix) + f64::from(digit);
    }
    Ok(Value::Num(if negative { -value } else { value }))
}

/// Forces an array argument into raw bytes.
fn byte_array(
    ev: &Evaluator,
    arg: &crate::thunk::Thunk,
    name: &str,
) -> EvalResult<Vec<u8>> {
    let items = arr_arg(ev, arg, "byte array argument")?;
    let mut bytes = Vec::with_capacity(items.len());
    for item in items.iter() {
        let n = item.force(ev)?.as_int("byte value")?;
        if !(0..=255).contains(&n) {
            eval_err!("{name} byte values must be in [0, 255], got {n}");
        }
        bytes.push(n as u8);
    }
    Ok(bytes)
}

fn decode_base64(s: &str) -> EvalResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(s.trim().as_bytes())
        .map_err(|e| crate::error::EvalError::new(format!("Invalid base64: {e}")))
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
