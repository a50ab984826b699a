//! Sorting and set builtins.
//!
//! Sets are represented as sorted, duplicate-free arrays; the set
//! operations assume their inputs are already in that form, as the
//! reference library does. All of them accept an optional `keyF`
//! projection, defaulting to the identity.

use std::cmp::Ordering;
use std::rc::Rc;

use super::{arr_arg, builtin_d};
use crate::error::{EvalError, EvalResult};
use crate::thunk::Thunk;
use crate::value::{Builtin, Value};
use crate::Evaluator;

pub(super) fn register(out: &mut Vec<Builtin>) {
    out.push(builtin_d(
        "sort",
        &["arr", "keyF"],
        vec![Value::Null],
        |ev, args| {
            let items = arr_arg(ev, &args[0], "std.sort first argument")?;
            let keyf = args[1].force(ev)?;
            let sorted = sort_thunks(ev, &items, &keyf)?;
            Ok(Value::Arr(Rc::new(sorted)))
        },
    ));

    out.push(builtin_d(
        "uniq",
        &["arr", "keyF"],
        vec![Value::Null],
        |ev, args| {
            let items = arr_arg(ev, &args[0], "std.uniq first argument")?;
            let keyf = args[1].force(ev)?;
            let unique = uniq_thunks(ev, &items, &keyf)?;
            Ok(Value::Arr(Rc::new(unique)))
        },
    ));

    out.push(builtin_d(
        "set",
        &["arr", "keyF"],
        vec![Value::Null],
        |ev, args| {
            let items = arr_arg(ev, &args[0], "std.set first argument")?;
            let keyf = args[1].force(ev)?;
            let sorted = sort_thunks(ev, &items, &keyf)?;
            let unique = uniq_thunks(ev, &sorted, &keyf)?;
            Ok(Value::Arr(Rc::new(unique)))
        },
    ));

    out.push(builtin_d(
        "setMember",
        &["x", "arr", "keyF"],
        vec![Value::Null],
        |ev, args| {
            let needle = args[0].clone();
            let items = arr_arg(ev, &args[1], "std.setMember second argument")?;
            let keyf = args[2].force(ev)?;
            let needle_key = project(ev, &keyf, &needle)?;
            for item in items.iter() {
                let key = project(ev, &keyf, item)?;
                if ev.equals(&key, &needle_key)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        },
    ));

    out.push(builtin_d(
        "setInter",
        &["a", "b", "keyF"],
        vec![Value::Null],
        |ev, args| {
            let a = arr_arg(ev, &args[0], "std.setInter first argument")?;
            let b = arr_arg(ev, &args[1], "std.setInter second argument")?;
            let keyf = args[2].force(ev)?;
            merge_sets(ev, &a, &b, &keyf, |in_a, in_b| in_a && in_b)
        },
    ));

    out.push(builtin_d(
        "setUnion",
        &["a", "b", "keyF"],
        vec![Value::Null],
        |ev, args| {
            let a = arr_arg(ev, &args[0], "std.setUnion first argument")?;
            let b = arr_arg(ev, &args[1], "std.setUnion second argument")?;
            let keyf = args[2].force(ev)?;
            merge_sets(ev, &a, &b, &keyf, |in_a, in_b| in_a || in_b)
        },
    ));

    out.push(builtin_d(
        "setDiff",
        &["a", "b", "keyF"],
        vec![Value::Null],
        |ev, args| {
            let a = arr_arg(ev, &args[0], "std.setDiff first argument")?;
            let b = arr_arg(ev, &args[1], "std.setDiff second argument")?;
            let keyf = args[2].force(ev)?;
            merge_sets(ev, &a, &b, &keyf, |in_a, in_b| in_a && !in_b)
        },
    ));
}

/// Applies `keyF` (or the identity) to one element.
fn project(ev: &Evaluator, keyf: &Value, item: &Thunk) -> EvalResult<Value> {
    match keyf {
        Value::Null => item.force(ev),
        func => ev.call_function(func, vec![item.clone()]),
    }
}

/// Stable sort by projected key.
fn sort_thunks(ev: &Evaluator, items: &[Thunk], keyf: &Value) -> EvalResult<Vec<Thunk>> {
    let mut keyed: Vec<(Value, Thunk)> = Vec::with_capacity(items.len());
    for item in items {
        keyed.push((project(ev, keyf, item)?, item.clone()));
    }

    // sort_by cannot fail, so the first comparison error is parked and
    // re-raised afterwards.
    let mut first_error: Option<EvalError> = None;
    keyed.sort_by(|a, b| match ev.compare_values(&a.0, &b.0) {
        Ok(ordering) => ordering,
        Err(err) => {
            first_error.get_or_insert(err);
            Ordering::Equal
        }
    });
    if let Some(err) = first_error {
        return Err(err);
    }

    Ok(keyed.into_iter().map(|(_, t)| t).collect())
}

/// Removes adjacent duplicates by projected key.
fn uniq_thunks(ev: &Evaluator, items: &[Thunk], keyf: &Value) -> EvalResult<Vec<Thunk>> {
    let mut out: Vec<Thunk> = Vec::new();
    let mut last_key: Option<Value> = None;
    for item in items {
        let key = project(ev, keyf, item)?;
        let duplicate = match &last_key {
            Some(last) => ev.equals(last, &key)?,
            None => false,
        };
        if !duplicate {
            out.push(item.clone());
        }
        last_key = Some(key);
    }
    Ok(out)
}

/// Merges two sorted sets, keeping elements selected by `keep`.
fn merge_sets(
    ev: &Evaluator,
    a: &[Thunk],
    b: &[Thunk],
    keyf: &Value,
    keep: impl Fn(bool, bool) -> bool,
) -> EvalResult<Value> {
    let mut out: Vec<Thunk> = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < a.len() || j < b.len() {
        if i >= a.len() {
            if keep(false, true) {
                out.push(b[j].clone());
            }
            j += 1;
            continue;
        }
        if j >= b.len() {
            if keep(true, false) {
                out.push(a[i].clone());
            }
            i += 1;
            continue;
        }
        let ka = project(ev, keyf, &a[i])?;
        let kb = project(ev, keyf, &b[j])?;
        match ev.compare_values(&ka, &kb)? {
            Ordering::Less => {
                if keep(true, false) {
                    out.push(a[i].clone());
                }
                i += 1;
            }
            Ordering::Greater => {
                if keep(false, true) {
                    out.push(b[j].clone());
                }
                j += 1;
            }
            Ordering::Equal => {
                if keep(true, true) {
                    out.push(a[i].clone());
                }
                i += 1;
                j += 1;
            }
        }
    }

    Ok(Value::Arr(Rc::new(out)))
}
