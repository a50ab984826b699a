//! The standard library.
//!
//! `std` is an object whose fields are builtin function values, rebuilt
//! per evaluated file so `std.thisFile` can name it. All builtins are
//! strict: they force the arguments they consume. Fields are hidden, as
//! an object composed over `std` should not manifest the library.

mod arrays;
mod encoding;
mod general;
mod manifesting;
mod math;
mod objects;
mod sets;
mod strings;

use std::path::Path;
use std::rc::Rc;

use crate::error::EvalResult;
use crate::thunk::Thunk;
use crate::value::{Builtin, FuncValue, ObjField, Object, Value};
use crate::Evaluator;

/// Builds the `std` object for one file.
pub fn build(this_file: Option<&Path>) -> Object {
    let mut builtins = Vec::new();
    general::register(&mut builtins);
    objects::register(&mut builtins);
    arrays::register(&mut builtins);
    sets::register(&mut builtins);
    strings::register(&mut builtins);
    math::register(&mut builtins);
    encoding::register(&mut builtins);
    manifesting::register(&mut builtins);

    let obj = Object::new();
    for builtin in builtins {
        obj.insert(
            Rc::from(builtin.name),
            ObjField::hidden(Value::Func(Rc::new(FuncValue::Builtin(builtin)))),
        );
    }

    let this_file = match this_file {
        Some(path) => Value::str(path.to_string_lossy()),
        None => Value::Null,
    };
    obj.insert(Rc::from("thisFile"), ObjField::hidden(this_file));

    obj
}

/// Declares a builtin with only required parameters.
pub(crate) fn builtin(
    name: &'static str,
    params: &'static [&'static str],
    f: impl Fn(&Evaluator, &[Thunk]) -> EvalResult<Value> + 'static,
) -> Builtin {
    Builtin {
        name,
        params,
        defaults: Vec::new(),
        f: Box::new(f),
    }
}

/// Declares a builtin whose trailing parameters have default values.
pub(crate) fn builtin_d(
    name: &'static str,
    params: &'static [&'static str],
    defaults: Vec<Value>,
    f: impl Fn(&Evaluator, &[Thunk]) -> EvalResult<Value> + 'static,
) -> Builtin {
    Builtin {
        name,
        params,
        defaults,
        f: Box::new(f),
    }
}

// Forced-argument accessors shared by the category modules.

pub(crate) fn str_arg(ev: &Evaluator, t: &Thunk, what: &str) -> EvalResult<Rc<str>> {
    t.force(ev)?.as_str(what)
}

pub(crate) fn num_arg(ev: &Evaluator, t: &Thunk, what: &str) -> EvalResult<f64> {
    t.force(ev)?.as_num(what)
}

pub(crate) fn int_arg(ev: &Evaluator, t: &Thunk, what: &str) -> EvalResult<i64> {
    t.force(ev)?.as_int(what)
}

pub(crate) fn bool_arg(ev: &Evaluator, t: &Thunk, what: &str) -> EvalResult<bool> {
    t.force(ev)?.as_bool(what)
}

pub(crate) fn arr_arg(ev: &Evaluator, t: &Thunk, what: &str) -> EvalResult<Rc<Vec<Thunk>>> {
    t.force(ev)?.as_arr(what)
}

pub(crate) fn obj_arg(ev: &Evaluator, t: &Thunk, what: &str) -> EvalResult<Object> {
    t.force(ev)?.as_obj(what)
}

/// Wraps plain values into an array value.
pub(crate) fn make_array(values: Vec<Value>) -> Value {
    Value::Arr(Rc::new(values.into_iter().map(Thunk::done).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_has_core_builtins() {
        let std = build(None);
        for name in [
            "type",
            "length",
            "join",
            "map",
            "format",
            "manifestJson",
            "base64",
            "sha256",
            "extVar",
            "thisFile",
        ] {
            assert!(std.has(name), "std.{name} missing");
        }
    }

    #[test]
    fn test_std_fields_are_hidden() {
        let std = build(None);
        assert!(!std.has_visible("type"));
        assert_eq!(std.field_names(false).len(), 0);
    }

    #[test]
    fn test_this_file() {
        let std = build(Some(Path::new("/tmp/config.jsonnet")));
        let field = std.get("thisFile").unwrap();
        let ev = Evaluator::new();
        let value = field.thunk.force(&ev).unwrap();
        assert_eq!(value.as_str("thisFile").unwrap().as_ref(), "/tmp/config.jsonnet");
    }
}
