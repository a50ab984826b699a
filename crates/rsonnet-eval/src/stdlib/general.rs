//! Core builtins: type inspection, length, conversion, tracing, and the
//! per-evaluator registries (`extVar`, `native`).

use super::{builtin, builtin_d, make_array, obj_arg, str_arg};
use crate::error::eval_err;
use crate::manifest;
use crate::value::{Builtin, FuncValue, ObjField, Object, Value, Visibility};

pub(super) fn register(out: &mut Vec<Builtin>) {
    out.push(builtin("type", &["x"], |ev, args| {
        let value = args[0].force(ev)?;
        Ok(Value::str(value.type_name()))
    }));

    out.push(builtin("length", &["x"], |ev, args| {
        let value = args[0].force(ev)?;
        let length = match &value {
            Value::Str(s) => s.chars().count(),
            Value::Arr(items) => items.len(),
            // Hidden fields count here, unlike in objectFields.
            Value::Obj(obj) => obj.len(),
            Value::Func(f) => match f.as_ref() {
                FuncValue::User { params, .. } => params.len(),
                FuncValue::Builtin(b) => b.params.len(),
                FuncValue::Native { .. } => 0,
            },
            other => eval_err!("Cannot get length of {}", other.type_name()),
        };
        Ok(Value::Num(length as f64))
    }));

    out.push(builtin_d(
        "get",
        &["o", "f", "default", "inc_hidden"],
        vec![Value::Null, Value::Bool(true)],
        |ev, args| {
            let obj = obj_arg(ev, &args[0], "std.get first argument")?;
            let name = str_arg(ev, &args[1], "std.get field name")?;
            let inc_hidden = args[3].force(ev)?.as_bool("std.get inc_hidden")?;
            match obj.get(&name) {
                Some(field) if inc_hidden || field.visibility != Visibility::Hidden => {
                    field.thunk.force(ev)
                }
                _ => args[2].force(ev),
            }
        },
    ));

    out.push(builtin("toString", &["a"], |ev, args| {
        let value = args[0].force(ev)?;
        Ok(Value::str(manifest::value_to_string(ev, &value)?))
    }));

    out.push(builtin("trace", &["str", "rest"], |ev, args| {
        let message = str_arg(ev, &args[0], "std.trace message")?;
        eprintln!("TRACE: {message}");
        args[1].force(ev)
    }));

    out.push(builtin("assertEqual", &["a", "b"], |ev, args| {
        let a = args[0].force(ev)?;
        let b = args[1].force(ev)?;
        if ev.equals(&a, &b)? {
            Ok(Value::Bool(true))
        } else {
            let a = manifest::value_to_string(ev, &a)?;
            let b = manifest::value_to_string(ev, &b)?;
            eval_err!("Assertion failed. {a} != {b}")
        }
    }));

    out.push(builtin("prune", &["a"], |ev, args| {
        let value = args[0].force(ev)?;
        prune(ev, &value)
    }));

    out.push(builtin("extVar", &["x"], |ev, args| {
        let name = str_arg(ev, &args[0], "std.extVar name")?;
        ev.ext_var(&name)
    }));

    out.push(builtin("native", &["name"], |ev, args| {
        let name = str_arg(ev, &args[0], "std.native name")?;
        ev.native_callback(&name)
    }));
}

/// Recursively drops `null`, empty arrays, and empty objects.
fn prune(ev: &crate::Evaluator, value: &Value) -> crate::error::EvalResult<Value> {
    match value {
        Value::Arr(items) => {
            let mut kept = Vec::new();
            for item in items.iter() {
                let forced = item.force(ev)?;
                let pruned = prune(ev, &forced)?;
                if !is_prunable(&pruned) {
                    kept.push(pruned);
                }
            }
            Ok(make_array(kept))
        }
        Value::Obj(obj) => {
            let result = Object::new();
            for name in obj.field_names(false) {
                let forced = obj.field_value(ev, &name)?;
                let pruned = prune(ev, &forced)?;
                if !is_prunable(&pruned) {
                    result.insert(name, ObjField::visible(pruned));
                }
            }
            Ok(Value::Obj(result))
        }
        other => Ok(other.clone()),
    }
}

fn is_prunable(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Arr(items) => items.is_empty(),
        Value::Obj(obj) => obj.field_names(false).is_empty(),
        _ => false,
    }
}
