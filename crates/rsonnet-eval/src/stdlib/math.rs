//! Numeric builtins.

use super::{builtin, num_arg};
use crate::error::eval_err;
use crate::format;
use crate::value::{Builtin, Value};

pub(super) fn register(out: &mut Vec<Builtin>) {
    // std.mod doubles as the format operator when given a string.
    out.push(builtin("mod", &["a", "b"], |ev, args| {
        let a = args[0].force(ev)?;
        match &a {
            Value::Str(template) => {
                let b = args[1].force(ev)?;
                format::format_value(ev, template, &b)
            }
            _ => {
                let a = a.as_num("std.mod first argument")?;
                let b = num_arg(ev, &args[1], "std.mod second argument")?;
                if b == 0.0 {
                    eval_err!("Division by zero");
                }
                Ok(Value::Num(a % b))
            }
        }
    }));

    out.push(unary("abs", f64::abs));
    out.push(builtin("sign", &["n"], |ev, args| {
        let n = num_arg(ev, &args[0], "std.sign argument")?;
        let sign = if n > 0.0 {
            1.0
        } else if n < 0.0 {
            -1.0
        } else {
            0.0
        };
        Ok(Value::Num(sign))
    }));

    out.push(builtin("max", &["a", "b"], |ev, args| {
        let a = num_arg(ev, &args[0], "std.max first argument")?;
        let b = num_arg(ev, &args[1], "std.max second argument")?;
        Ok(Value::Num(a.max(b)))
    }));

    out.push(builtin("min", &["a", "b"], |ev, args| {
        let a = num_arg(ev, &args[0], "std.min first argument")?;
        let b = num_arg(ev, &args[1], "std.min second argument")?;
        Ok(Value::Num(a.min(b)))
    }));

    out.push(builtin("clamp", &["x", "minVal", "maxVal"], |ev, args| {
        let x = num_arg(ev, &args[0], "std.clamp value")?;
        let min_val = num_arg(ev, &args[1], "std.clamp minVal")?;
        let max_val = num_arg(ev, &args[2], "std.clamp maxVal")?;
        Ok(Value::Num(x.min(max_val).max(min_val)))
    }));

    out.push(builtin("pow", &["x", "n"], |ev, args| {
        let x = num_arg(ev, &args[0], "std.pow base")?;
        let n = num_arg(ev, &args[1], "std.pow exponent")?;
        Ok(Value::Num(x.powf(n)))
    }));

    out.push(unary("exp", f64::exp));
    out.push(builtin("log", &["x"], |ev, args| {
        let x = num_arg(ev, &args[0], "std.log argument")?;
        if x <= 0.0 {
            eval_err!("std.log argument must be positive, got {x}");
        }
        Ok(Value::Num(x.ln()))
    }));

    out.push(builtin("exponent", &["x"], |ev, args| {
        let x = num_arg(ev, &args[0], "std.exponent argument")?;
        Ok(Value::Num(frexp(x).1 as f64))
    }));

    out.push(builtin("mantissa", &["x"], |ev, args| {
        let x = num_arg(ev, &args[0], "std.mantissa argument")?;
        Ok(Value::Num(frexp(x).0))
    }));

    out.push(unary("floor", f64::floor));
    out.push(unary("ceil", f64::ceil));
    out.push(builtin("sqrt", &["x"], |ev, args| {
        let x = num_arg(ev, &args[0], "std.sqrt argument")?;
        if x < 0.0 {
            eval_err!("std.sqrt argument must not be negative, got {x}");
        }
        Ok(Value::Num(x.sqrt()))
    }));

    out.push(unary("sin", f64::sin));
    out.push(unary("cos", f64::cos));
    out.push(unary("tan", f64::tan));
    out.push(unary("asin", f64::asin));
    out.push(unary("acos", f64::acos));
    out.push(unary("atan", f64::atan));

    out.push(builtin("round", &["x"], |ev, args| {
        let x = num_arg(ev, &args[0], "std.round argument")?;
        Ok(Value::Num((x + 0.5).floor()))
    }));

    out.push(builtin("isEven", &["x"], |ev, args| {
        let x = num_arg(ev, &args[0], "std.isEven argument")?;
        Ok(Value::Bool(x % 2.0 == 0.0))
    }));

    out.push(builtin("isOdd", &["x"], |ev, args| {
        let x = num_arg(ev, &args[0], "std.isOdd argument")?;
        Ok(Value::Bool(x.abs() % 2.0 == 1.0))
    }));

    out.push(builtin("isInteger", &["x"], |ev, args| {
        let x = num_arg(ev, &args[0], "std.isInteger argument")?;
        Ok(Value::Bool(x.fract() == 0.0))
    }));

    out.push(builtin("isDecimal", &["x"], |ev, args| {
        let x = num_arg(ev, &args[0], "std.isDecimal argument")?;
        Ok(Value::Bool(x.fract() != 0.0))
    }));
}

/// One-argument numeric builtin over a `f64` method.
fn unary(name: &'static str, f: fn(f64) -> f64) -> Builtin {
    builtin(name, &["x"], move |ev, args| {
        let x = args[0].force(ev)?.as_num("argument")?;
        Ok(Value::Num(f(x)))
    })
}

/// Decomposes `x` into `(mantissa, exponent)` with `x = m * 2^e` and
/// `m` in `[0.5, 1)`.
fn frexp(x: f64) -> (f64, i32) {
    if x == 0.0 || !x.is_finite() {
        return (x, 0);
    }
    let bits = x.to_bits();
    let raw_exponent = ((bits >> 52) & 0x7FF) as i32;
    if raw_exponent == 0 {
        // Subnormal: scale into the normal range first.
        let scaled = x * 2f64.powi(64);
        let (m, e) = frexp(scaled);
        return (m, e - 64);
    }
    let exponent = raw_exponent - 1022;
    let mantissa_bits = (bits & !(0x7FFu64 << 52)) | (1022u64 << 52);
    (f64::from_bits(mantissa_bits), exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frexp() {
        let (m, e) = frexp(8.0);
        assert_eq!(m, 0.5);
        assert_eq!(e, 4);

        let (m, e) = frexp(0.75);
        assert_eq!(m, 0.75);
        assert_eq!(e, 0);

        let (m, e) = frexp(-3.0);
        assert_eq!(m, -0.75);
        assert_eq!(e, 2);

        assert_eq!(frexp(0.0), (0.0, 0));
    }

    #[test]
    fn test_frexp_reconstructs() {
        for x in [1.0, 2.5, 1e-12, 123456.789, -0.001] {
            let (m, e) = frexp(x);
            assert!((m.abs() >= 0.5 && m.abs() < 1.0) || x == 0.0);
            assert_eq!(m * 2f64.powi(e), x);
        }
    }
}
