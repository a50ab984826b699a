//! The `%` string-formatting engine.
//!
//! A printf-style formatter supporting `%s %d %i %o %x %X %e %E %f %g %G
//! %c %%`, the flags `- + 0 #` and space, width, precision, and the
//! `%(name)…` mapping mode when the right operand is an object. Non-string
//! arguments to `%s` render by the same rules as JSON serialization.

use crate::error::{eval_err, EvalError, EvalResult};
use crate::manifest;
use crate::value::{Object, Value};
use crate::Evaluator;

/// Formats `fmt % value`, producing a string value.
///
/// An array operand supplies positional values, an object supplies
/// `%(name)` lookups, and anything else acts as a single positional
/// value.
pub fn format_value(ev: &Evaluator, fmt: &str, value: &Value) -> EvalResult<Value> {
    let mut args = Args::new(ev, value)?;
    let mut out = String::new();
    let mut chars = fmt.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let spec = Spec::parse(&mut chars)?;
        if spec.conversion == '%' {
            out.push('%');
            continue;
        }
        let arg = args.fetch(&spec)?;
        render(ev, &spec, &arg, &mut out)?;
    }

    args.finish()?;
    Ok(Value::str(out))
}

/// Argument source: positional values or a mapping object.
enum Args<'a> {
    Positional { values: Vec<Value>, next: usize },
    Mapping { ev: &'a Evaluator, object: Object },
}

impl<'a> Args<'a> {
    fn new(ev: &'a Evaluator, value: &Value) -> EvalResult<Self> {
        match value {
            Value::Obj(object) => Ok(Args::Mapping {
                ev,
                object: object.clone(),
            }),
            Value::Arr(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items.iter() {
                    values.push(item.force(ev)?);
                }
                Ok(Args::Positional { values, next: 0 })
            }
            other => Ok(Args::Positional {
                values: vec![other.clone()],
                next: 0,
            }),
        }
    }

    fn fetch(&mut self, spec: &Spec) -> EvalResult<Value> {
        match self {
            Args::Mapping { ev, object } => {
                let Some(key) = &spec.key else {
                    eval_err!("Format expected a mapping key like %(name)s");
                };
                object.field_value(ev, key)
            }
            Args::Positional { values, next } => {
                if spec.key.is_some() {
                    eval_err!("Format mapping keys require an object");
                }
                let Some(value) = values.get(*next) else {
                    eval_err!("Not enough values to format");
                };
                *next += 1;
                Ok(value.clone())
            }
        }
    }

    fn finish(&self) -> EvalResult<()> {
        if let Args::Positional { values, next } = self {
            if *next < values.len() {
                eval_err!("Too many values to format: {}, expected {next}", values.len());
            }
        }
        Ok(())
    }
}

/// One parsed `%…` conversion specification.
struct Spec {
    key: Option<String>,
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alt: bool,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: char,
}

impl Spec {
    fn parse(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> EvalResult<Spec> {
        let mut spec = Spec {
            key: None,
            left: false,
            plus: false,
            space: false,
            zero: false,
            alt: false,
            width: None,
            precision: None,
            conversion: '%',
        };

        if chars.peek() == Some(&'(') {
            chars.next();
            let mut key = String::new();
            loop {
                match chars.next() {
                    Some(')') => break,
                    Some(c) => key.push(c),
                    None => eval_err!("Truncated format key"),
                }
            }
            spec.key = Some(key);
        }

        loop {
            match chars.peek() {
                Some('-') => spec.left = true,
                Some('+') => spec.plus = true,
                Some(' ') => spec.space = true,
                Some('0') => spec.zero = true,
                Some('#') => spec.alt = true,
                _ => break,
            }
            chars.next();
        }

        let mut width = None;
        while let Some(c) = chars.peek() {
            let Some(digit) = c.to_digit(10) else { break };
            width = Some(width.unwrap_or(0) * 10 + digit as usize);
            chars.next();
        }
        spec.width = width;

        if chars.peek() == Some(&'.') {
            chars.next();
            let mut precision = 0usize;
            while let Some(c) = chars.peek() {
                let Some(digit) = c.to_digit(10) else { break };
                precision = precision * 10 + digit as usize;
                chars.next();
            }
            spec.precision = Some(precision);
        }

        match chars.next() {
            Some(c) => spec.conversion = c,
            None => eval_err!("Truncated format code"),
        }
        Ok(spec)
    }
}

fn render(ev: &Evaluator, spec: &Spec, arg: &Value, out: &mut String) -> EvalResult<()> {
    match spec.conversion {
        's' => {
            let mut text = manifest::value_to_string(ev, arg)?;
            if let Some(precision) = spec.precision {
                text = text.chars().take(precision).collect();
            }
            out.push_str(&pad_text(&text, spec));
            Ok(())
        }
        'd' | 'i' => {
            let n = arg.as_num("Format argument for %d")?;
            let magnitude = format!("{}", n.trunc().abs() as i64);
            out.push_str(&pad_number(&magnitude, n < 0.0, "", spec));
            Ok(())
        }
        'o' => {
            let n = arg.as_int("Format argument for %o")?;
            let magnitude = format!("{:o}", n.unsigned_abs());
            let prefix = if spec.alt { "0" } else { "" };
            out.push_str(&pad_number(&magnitude, n < 0, prefix, spec));
            Ok(())
        }
        'x' | 'X' => {
            let n = arg.as_int("Format argument for %x")?;
            let magnitude = if spec.conversion == 'x' {
                format!("{:x}", n.unsigned_abs())
            } else {
                format!("{:X}", n.unsigned_abs())
            };
            let prefix = match (spec.alt, spec.conversion) {
                (true, 'x') => "0x",
                (true, _) => "0X",
                (false, _) => "",
            };
            out.push_str(&pad_number(&magnitude, n < 0, prefix, spec));
            Ok(())
        }
        'e' | 'E' => {
            let n = arg.as_num("Format argument for %e")?;
            let precision = spec.precision.unwrap_or(6);
            let text = format_exponential(n.abs(), precision, spec.conversion == 'E', spec.alt);
            out.push_str(&pad_number(&text, n < 0.0, "", spec));
            Ok(())
        }
        'f' | 'F' => {
            let n = arg.as_num("Format argument for %f")?;
            let precision = spec.precision.unwrap_or(6);
            let mut text = format!("{:.*}", precision, n.abs());
            if precision == 0 && spec.alt {
                text.push('.');
            }
            out.push_str(&pad_number(&text, n < 0.0, "", spec));
            Ok(())
        }
        'g' | 'G' => {
            let n = arg.as_num("Format argument for %g")?;
            let text = format_general(n.abs(), spec);
            out.push_str(&pad_number(&text, n < 0.0, "", spec));
            Ok(())
        }
        'c' => {
            let text = match arg {
                Value::Num(n) => {
                    let code = arg.as_int("Format argument for %c")?;
                    let c = u32::try_from(code)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| {
                            EvalError::new(format!("Invalid codepoint for %c: {n}"))
                        })?;
                    c.to_string()
                }
                Value::Str(s) if s.chars().count() == 1 => s.to_string(),
                other => eval_err!(
                    "%c requires a codepoint or a 1-character string, got {}",
                    other.type_name()
                ),
            };
            out.push_str(&pad_text(&text, spec));
            Ok(())
        }
        c => eval_err!("Unrecognised format conversion: %{c}"),
    }
}

/// `%e` body without the sign: `d.ddddde+XX`.
fn format_exponential(magnitude: f64, precision: usize, upper: bool, alt: bool) -> String {
    let formatted = format!("{magnitude:.precision$e}");
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
    let mut mantissa = mantissa.to_string();
    if precision == 0 && alt {
        mantissa.push('.');
    }
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let e = if upper { 'E' } else { 'e' };
    format!("{mantissa}{e}{exponent:+03}")
}

/// `%g` body without the sign.
fn format_general(magnitude: f64, spec: &Spec) -> String {
    let p = spec.precision.unwrap_or(6).max(1);
    let exponent = if magnitude == 0.0 {
        0
    } else {
        magnitude.log10().floor() as i32
    };

    let mut text = if exponent < -4 || exponent >= p as i32 {
        format_exponential(magnitude, p - 1, spec.conversion == 'G', false)
    } else {
        let precision = (p as i32 - 1 - exponent).max(0) as usize;
        format!("{magnitude:.precision$}")
    };

    if !spec.alt && text.contains('.') {
        // Strip trailing zeros in the fractional part.
        if let Some(e_pos) = text.find(['e', 'E']) {
            let (mantissa, exp) = text.split_at(e_pos);
            let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
            text = format!("{mantissa}{exp}");
        } else {
            text = text
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string();
        }
    }
    text
}

/// Applies width and alignment to a non-numeric rendering.
fn pad_text(text: &str, spec: &Spec) -> String {
    let Some(width) = spec.width else {
        return text.to_string();
    };
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let pad = " ".repeat(width - len);
    if spec.left {
        format!("{text}{pad}")
    } else {
        format!("{pad}{text}")
    }
}

/// Applies sign, radix prefix, zero padding, and width to a numeric
/// rendering of `magnitude`.
fn pad_number(magnitude: &str, negative: bool, prefix: &str, spec: &Spec) -> String {
    let sign = if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    };

    let body_len = sign.len() + prefix.len() + magnitude.chars().count();
    let width = spec.width.unwrap_or(0);

    if body_len >= width {
        return format!("{sign}{prefix}{magnitude}");
    }
    let fill = width - body_len;
    if spec.left {
        format!("{sign}{prefix}{magnitude}{}", " ".repeat(fill))
    } else if spec.zero {
        format!("{sign}{prefix}{}{magnitude}", "0".repeat(fill))
    } else {
        format!("{}{sign}{prefix}{magnitude}", " ".repeat(fill))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use crate::Evaluator;
    use std::rc::Rc;

    fn fmt(template: &str, value: Value) -> String {
        let ev = Evaluator::new();
        let result = format_value(&ev, template, &value).unwrap();
        let Value::Str(s) = result else {
            panic!("expected string result");
        };
        s.to_string()
    }

    fn fmt_err(template: &str, value: Value) -> String {
        let ev = Evaluator::new();
        format_value(&ev, template, &value).unwrap_err().message
    }

    fn arr(values: Vec<Value>) -> Value {
        Value::Arr(Rc::new(
            values.into_iter().map(crate::thunk::Thunk::done).collect(),
        ))
    }

    #[test]
    fn test_plain_percent_s() {
        assert_eq!(fmt("hello %s", Value::str("world")), "hello world");
    }

    #[test]
    fn test_s_coerces_via_json() {
        assert_eq!(fmt("%s", Value::Num(1.0)), "1");
        assert_eq!(fmt("%s", Value::Bool(true)), "true");
        assert_eq!(fmt("%s", Value::Null), "null");
    }

    #[test]
    fn test_d_and_width() {
        assert_eq!(fmt("%d", Value::Num(42.0)), "42");
        assert_eq!(fmt("%5d", Value::Num(42.0)), "   42");
        assert_eq!(fmt("%-5d|", Value::Num(42.0)), "42   |");
        assert_eq!(fmt("%05d", Value::Num(-42.0)), "-0042");
        assert_eq!(fmt("%+d", Value::Num(42.0)), "+42");
    }

    #[test]
    fn test_hex_octal() {
        assert_eq!(fmt("%x", Value::Num(255.0)), "ff");
        assert_eq!(fmt("%X", Value::Num(255.0)), "FF");
        assert_eq!(fmt("%#x", Value::Num(255.0)), "0xff");
        assert_eq!(fmt("%o", Value::Num(8.0)), "10");
        assert_eq!(fmt("%#o", Value::Num(8.0)), "010");
    }

    #[test]
    fn test_float_forms() {
        assert_eq!(fmt("%f", Value::Num(2.5)), "2.500000");
        assert_eq!(fmt("%.2f", Value::Num(2.5)), "2.50");
        assert_eq!(fmt("%.0f", Value::Num(2.5)), "2");
        assert_eq!(fmt("%e", Value::Num(250.0)), "2.500000e+02");
        assert_eq!(fmt("%.1E", Value::Num(250.0)), "2.5E+02");
    }

    #[test]
    fn test_general_form() {
        assert_eq!(fmt("%g", Value::Num(100000.0)), "100000");
        assert_eq!(fmt("%g", Value::Num(1e7)), "1e+07");
        assert_eq!(fmt("%g", Value::Num(0.0001)), "0.0001");
        assert_eq!(fmt("%g", Value::Num(0.00001)), "1e-05");
    }

    #[test]
    fn test_c_conversion() {
        assert_eq!(fmt("%c", Value::Num(65.0)), "A");
        assert_eq!(fmt("%c", Value::str("z")), "z");
    }

    #[test]
    fn test_percent_literal() {
        assert_eq!(fmt("100%%", arr(vec![])), "100%");
    }

    #[test]
    fn test_positional_args() {
        assert_eq!(
            fmt("%s-%s", arr(vec![Value::str("a"), Value::str("b")])),
            "a-b"
        );
    }

    #[test]
    fn test_mapping_mode() {
        let obj = crate::value::Object::new();
        obj.insert(
            Rc::from("u"),
            crate::value::ObjField::visible(Value::str("a")),
        );
        obj.insert(
            Rc::from("h"),
            crate::value::ObjField::visible(Value::str("h")),
        );
        obj.insert(
            Rc::from("p"),
            crate::value::ObjField::visible(Value::Num(1.0)),
        );
        assert_eq!(
            fmt("%(u)s@%(h)s:%(p)s", Value::Obj(obj)),
            "a@h:1"
        );
    }

    #[test]
    fn test_not_enough_values() {
        assert_eq!(fmt_err("%s %s", Value::str("x")), "Not enough values to format");
    }

    #[test]
    fn test_too_many_values() {
        let err = fmt_err("%s", arr(vec![Value::str("a"), Value::str("b")]));
        assert!(err.starts_with("Too many values to format"));
    }

    #[test]
    fn test_precision_on_string() {
        assert_eq!(fmt("%.3s", Value::str("abcdef")), "abc");
    }

    #[test]
    fn test_truncated_spec() {
        let err = fmt_err("abc %", Value::str("x"));
        assert_eq!(err, "Truncated format code");
    }
}
