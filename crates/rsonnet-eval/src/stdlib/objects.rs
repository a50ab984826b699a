//! Object inspection builtins.
//!
//! The plain variants see visible fields only; the `*All` variants
//! include hidden fields. Field listings are sorted lexicographically.

use std::rc::Rc;

use super::{builtin, make_array, obj_arg, str_arg};
use crate::thunk::Thunk;
use crate::value::{Builtin, ObjField, Object, Value};

pub(super) fn register(out: &mut Vec<Builtin>) {
    out.push(builtin("objectHas", &["o", "f"], |ev, args| {
        let obj = obj_arg(ev, &args[0], "std.objectHas first argument")?;
        let name = str_arg(ev, &args[1], "std.objectHas field name")?;
        Ok(Value::Bool(obj.has_visible(&name)))
    }));

    out.push(builtin("objectHasAll", &["o", "f"], |ev, args| {
        let obj = obj_arg(ev, &args[0], "std.objectHasAll first argument")?;
        let name = str_arg(ev, &args[1], "std.objectHasAll field name")?;
        Ok(Value::Bool(obj.has(&name)))
    }));

    out.push(builtin("objectFields", &["o"], |ev, args| {
        let obj = obj_arg(ev, &args[0], "std.objectFields argument")?;
        Ok(field_name_array(&obj, false))
    }));

    out.push(builtin("objectFieldsAll", &["o"], |ev, args| {
        let obj = obj_arg(ev, &args[0], "std.objectFieldsAll argument")?;
        Ok(field_name_array(&obj, true))
    }));

    out.push(builtin("objectValues", &["o"], |ev, args| {
        let obj = obj_arg(ev, &args[0], "std.objectValues argument")?;
        Ok(field_value_array(&obj, false))
    }));

    out.push(builtin("objectValuesAll", &["o"], |ev, args| {
        let obj = obj_arg(ev, &args[0], "std.objectValuesAll argument")?;
        Ok(field_value_array(&obj, true))
    }));

    out.push(builtin("objectKeysValues", &["o"], |ev, args| {
        let obj = obj_arg(ev, &args[0], "std.objectKeysValues argument")?;
        Ok(key_value_array(&obj, false))
    }));

    out.push(builtin("objectKeysValuesAll", &["o"], |ev, args| {
        let obj = obj_arg(ev, &args[0], "std.objectKeysValuesAll argument")?;
        Ok(key_value_array(&obj, true))
    }));

    out.push(builtin("objectRemoveKey", &["obj", "key"], |ev, args| {
        let obj = obj_arg(ev, &args[0], "std.objectRemoveKey first argument")?;
        let key = str_arg(ev, &args[1], "std.objectRemoveKey key")?;
        let result = Object::new();
        for (name, field) in obj.fields() {
            if name.as_ref() != key.as_ref() {
                result.insert(name, field);
            }
        }
        Ok(Value::Obj(result))
    }));

    out.push(builtin("mapWithKey", &["func", "obj"], |ev, args| {
        let func = args[0].force(ev)?;
        let obj = obj_arg(ev, &args[1], "std.mapWithKey second argument")?;
        let result = Object::new();
        for (name, field) in obj.fields() {
            let mapped = ev.call_function(
                &func,
                vec![
                    Thunk::done(Value::Str(name.clone())),
                    field.thunk.clone(),
                ],
            )?;
            result.insert(
                name,
                ObjField {
                    thunk: Thunk::done(mapped),
                    inherit: false,
                    visibility: field.visibility,
                },
            );
        }
        Ok(Value::Obj(result))
    }));
}

fn field_name_array(obj: &Object, include_hidden: bool) -> Value {
    let names = obj
        .sorted_field_names(include_hidden)
        .into_iter()
        .map(Value::Str)
        .collect();
    make_array(names)
}

fn field_value_array(obj: &Object, include_hidden: bool) -> Value {
    let thunks: Vec<Thunk> = obj
        .sorted_field_names(include_hidden)
        .into_iter()
        .filter_map(|name| obj.get(&name).map(|f| f.thunk))
        .collect();
    Value::Arr(Rc::new(thunks))
}

fn key_value_array(obj: &Object, include_hidden: bool) -> Value {
    let pairs: Vec<Value> = obj
        .sorted_field_names(include_hidden)
        .into_iter()
        .filter_map(|name| {
            obj.get(&name).map(|field| {
                let pair = Object::new();
                pair.insert(Rc::from("key"), ObjField::visible(Value::Str(name.clone())));
                pair.insert(
                    Rc::from("value"),
                    ObjField {
                        thunk: field.thunk,
                        inherit: false,
                        visibility: crate::value::Visibility::Visible,
                    },
                );
                Value::Obj(pair)
            })
        })
        .collect();
    make_array(pairs)
}
