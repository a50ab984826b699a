//! Array builtins.
//!
//! `std.slice` implements the full three-part slice the parser lowers
//! `a[s:e:t]` into: omitted positions arrive as null, negative indices
//! count from the end, and a negative step walks backwards.

use std::rc::Rc;

use super::{arr_arg, int_arg, make_array};
use crate::error::{eval_err, EvalResult};
use crate::thunk::Thunk;
use crate::value::{Builtin, Value};
use crate::Evaluator;

pub(super) fn register(out: &mut Vec<Builtin>) {
    out.push(builtin_slice());

    out.push(super::builtin_d(
        "range",
        &["from", "to", "step"],
        vec![Value::Num(1.0)],
        |ev, args| {
            let from = int_arg(ev, &args[0], "std.range from")?;
            let to = int_arg(ev, &args[1], "std.range to")?;
            let step = int_arg(ev, &args[2], "std.range step")?;
            if step == 0 {
                eval_err!("std.range step cannot be zero");
            }
            let mut values = Vec::new();
            let mut i = from;
            if step > 0 {
                while i <= to {
                    values.push(Value::Num(i as f64));
                    i += step;
                }
            } else {
                while i >= to {
                    values.push(Value::Num(i as f64));
                    i += step;
                }
            }
            Ok(make_array(values))
        },
    ));

    out.push(super::builtin("repeat", &["what", "count"], |ev, args| {
        let count = int_arg(ev, &args[1], "std.repeat count")?;
        if count < 0 {
            eval_err!("std.repeat count must not be negative, got {count}");
        }
        let what = args[0].force(ev)?;
        match &what {
            Value::Str(s) => Ok(Value::str(s.repeat(count as usize))),
            Value::Arr(items) => {
                let mut repeated = Vec::with_capacity(items.len() * count as usize);
                for _ in 0..count {
                    repeated.extend(items.iter().cloned());
                }
                Ok(Value::Arr(Rc::new(repeated)))
            }
            other => eval_err!("std.repeat operates on strings and arrays, got {}", other.type_name()),
        }
    }));

    out.push(super::builtin("map", &["func", "arr"], |ev, args| {
        let func = args[0].force(ev)?;
        let items = arr_arg(ev, &args[1], "std.map second argument")?;
        let mut mapped = Vec::with_capacity(items.len());
        for item in items.iter() {
            mapped.push(ev.call_function(&func, vec![item.clone()])?);
        }
        Ok(make_array(mapped))
    }));

    out.push(super::builtin("mapWithIndex", &["func", "arr"], |ev, args| {
        let func = args[0].force(ev)?;
        let items = arr_arg(ev, &args[1], "std.mapWithIndex second argument")?;
        let mut mapped = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            mapped.push(ev.call_function(
                &func,
                vec![Thunk::done(Value::Num(index as f64)), item.clone()],
            )?);
        }
        Ok(make_array(mapped))
    }));

    out.push(super::builtin("filter", &["func", "arr"], |ev, args| {
        let func = args[0].force(ev)?;
        let items = arr_arg(ev, &args[1], "std.filter second argument")?;
        let mut kept = Vec::new();
        for item in items.iter() {
            if call_predicate(ev, &func, item)? {
                kept.push(item.clone());
            }
        }
        Ok(Value::Arr(Rc::new(kept)))
    }));

    out.push(super::builtin(
        "filterMap",
        &["filter_func", "map_func", "arr"],
        |ev, args| {
            let filter_func = args[0].force(ev)?;
            let map_func = args[1].force(ev)?;
            let items = arr_arg(ev, &args[2], "std.filterMap third argument")?;
            let mut mapped = Vec::new();
            for item in items.iter() {
                if call_predicate(ev, &filter_func, item)? {
                    mapped.push(ev.call_function(&map_func, vec![item.clone()])?);
                }
            }
            Ok(make_array(mapped))
        },
    ));

    out.push(super::builtin("flatMap", &["func", "arr"], |ev, args| {
        let func = args[0].force(ev)?;
        let items = arr_arg(ev, &args[1], "std.flatMap second argument")?;
        let mut flattened = Vec::new();
        for item in items.iter() {
            let mapped = ev.call_function(&func, vec![item.clone()])?;
            let mapped = mapped.as_arr("std.flatMap function result")?;
            flattened.extend(mapped.iter().cloned());
        }
        Ok(Value::Arr(Rc::new(flattened)))
    }));

    out.push(super::builtin("foldl", &["func", "arr", "init"], |ev, args| {
        let func = args[0].force(ev)?;
        let items = arr_arg(ev, &args[1], "std.foldl second argument")?;
        let mut acc = args[2].force(ev)?;
        for item in items.iter() {
            acc = ev.call_function(&func, vec![Thunk::done(acc), item.clone()])?;
        }
        Ok(acc)
    }));

    out.push(super::builtin("foldr", &["func", "arr", "init"], |ev, args| {
        let func = args[0].force(ev)?;
        let items = arr_arg(ev, &args[1], "std.foldr second argument")?;
        let mut acc = args[2].force(ev)?;
        for item in items.iter().rev() {
            acc = ev.call_function(&func, vec![item.clone(), Thunk::done(acc)])?;
        }
        Ok(acc)
    }));

    out.push(super::builtin("makeArray", &["sz", "func"], |ev, args| {
        let size = int_arg(ev, &args[0], "std.makeArray size")?;
        if size < 0 {
            eval_err!("std.makeArray size must not be negative, got {size}");
        }
        let func = args[1].force(ev)?;
        let mut values = Vec::with_capacity(size as usize);
        for i in 0..size {
            values.push(ev.call_function(&func, vec![Thunk::done(Value::Num(i as f64))])?);
        }
        Ok(make_array(values))
    }));

    out.push(super::builtin("member", &["arr", "x"], |ev, args| {
        let container = args[0].force(ev)?;
        let needle = args[1].force(ev)?;
        match &container {
            Value::Arr(items) => {
                for item in items.iter() {
                    let item = item.force(ev)?;
                    if ev.equals(&item, &needle)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Value::Str(s) => {
                let needle = needle.as_str("std.member needle for a string")?;
                Ok(Value::Bool(s.contains(needle.as_ref())))
            }
            other => eval_err!("std.member operates on arrays and strings, got {}", other.type_name()),
        }
    }));

    out.push(super::builtin("count", &["arr", "x"], |ev, args| {
        let items = arr_arg(ev, &args[0], "std.count first argument")?;
        let needle = args[1].force(ev)?;
        let mut count = 0;
        for item in items.iter() {
            let item = item.force(ev)?;
            if ev.equals(&item, &needle)? {
                count += 1;
            }
        }
        Ok(Value::Num(f64::from(count)))
    }));

    out.push(super::builtin("find", &["value", "arr"], |ev, args| {
        let needle = args[0].force(ev)?;
        let items = arr_arg(ev, &args[1], "std.find second argument")?;
        let mut indices = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let item = item.force(ev)?;
            if ev.equals(&item, &needle)? {
                indices.push(Value::Num(index as f64));
            }
        }
        Ok(make_array(indices))
    }));

    out.push(super::builtin("join", &["sep", "arr"], |ev, args| {
        let sep = args[0].force(ev)?;
        let items = arr_arg(ev, &args[1], "std.join second argument")?;
        match &sep {
            Value::Str(sep) => {
                let mut out = String::new();
                let mut first = true;
                for item in items.iter() {
                    let item = item.force(ev)?;
                    if matches!(item, Value::Null) {
                        continue;
                    }
                    let piece = item.as_str("std.join array element")?;
                    if !first {
                        out.push_str(sep);
                    }
                    first = false;
                    out.push_str(&piece);
                }
                Ok(Value::str(out))
            }
            Value::Arr(sep) => {
                let mut out: Vec<Thunk> = Vec::new();
                let mut first = true;
                for item in items.iter() {
                    let item = item.force(ev)?;
                    if matches!(item, Value::Null) {
                        continue;
                    }
                    let piece = item.as_arr("std.join array element")?;
                    if !first {
                        out.extend(sep.iter().cloned());
                    }
                    first = false;
                    out.extend(piece.iter().cloned());
                }
                Ok(Value::Arr(Rc::new(out)))
            }
            other => eval_err!(
                "std.join separator must be a string or an array, got {}",
                other.type_name()
            ),
        }
    }));

    out.push(super::builtin("lines", &["arr"], |ev, args| {
        let items = arr_arg(ev, &args[0], "std.lines argument")?;
        let mut out = String::new();
        for item in items.iter() {
            let item = item.force(ev)?;
            if matches!(item, Value::Null) {
                continue;
            }
            let line = item.as_str("std.lines array element")?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(Value::str(out))
    }));

    out.push(super::builtin("flattenArrays", &["arrs"], |ev, args| {
        let items = arr_arg(ev, &args[0], "std.flattenArrays argument")?;
        let mut flattened = Vec::new();
        for item in items.iter() {
            let inner = item.force(ev)?;
            let inner = inner.as_arr("std.flattenArrays element")?;
            flattened.extend(inner.iter().cloned());
        }
        Ok(Value::Arr(Rc::new(flattened)))
    }));

    out.push(super::builtin("flattenDeepArray", &["value"], |ev, args| {
        let value = args[0].force(ev)?;
        let mut flattened = Vec::new();
        flatten_deep(ev, &value, &mut flattened)?;
        Ok(make_array(flattened))
    }));

    out.push(super::builtin("reverse", &["arrs"], |ev, args| {
        let items = arr_arg(ev, &args[0], "std.reverse argument")?;
        let reversed: Vec<Thunk> = items.iter().rev().cloned().collect();
        Ok(Value::Arr(Rc::new(reversed)))
    }));

    out.push(super::builtin("all", &["arr"], |ev, args| {
        let items = arr_arg(ev, &args[0], "std.all argument")?;
        for item in items.iter() {
            if !item.force(ev)?.as_bool("std.all array element")? {
                return Ok(Value::Bool(false));
            }
        }
        Ok(Value::Bool(true))
    }));

    out.push(super::builtin("any", &["arr"], |ev, args| {
        let items = arr_arg(ev, &args[0], "std.any argument")?;
        for item in items.iter() {
            if item.force(ev)?.as_bool("std.any array element")? {
                return Ok(Value::Bool(true));
            }
        }
        Ok(Value::Bool(false))
    }));

    out.push(super::builtin("sum", &["arr"], |ev, args| {
        let items = arr_arg(ev, &args[0], "std.sum argument")?;
        let mut total = 0.0;
        for item in items.iter() {
            total += item.force(ev)?.as_num("std.sum array element")?;
        }
        Ok(Value::Num(total))
    }));

    out.push(super::builtin("avg", &["arr"], |ev, args| {
        let items = arr_arg(ev, &args[0], "std.avg argument")?;
        if items.is_empty() {
            eval_err!("Cannot calculate average of an empty array");
        }
        let mut total = 0.0;
        for item in items.iter() {
            total += item.force(ev)?.as_num("std.avg array element")?;
        }
        Ok(Value::Num(total / items.len() as f64))
    }));

    out.push(super::builtin("contains", &["arr", "elem"], |ev, args| {
        let items = arr_arg(ev, &args[0], "std.contains first argument")?;
        let needle = args[1].force(ev)?;
        for item in items.iter() {
            let item = item.force(ev)?;
            if ev.equals(&item, &needle)? {
                return Ok(Value::Bool(true));
            }
        }
        Ok(Value::Bool(false))
    }));

    out.push(super::builtin("remove", &["arr", "elem"], |ev, args| {
        let items = arr_arg(ev, &args[0], "std.remove first argument")?;
        let needle = args[1].force(ev)?;
        let mut kept = Vec::with_capacity(items.len());
        let mut removed = false;
        for item in items.iter() {
            if !removed {
                let forced = item.force(ev)?;
                if ev.equals(&forced, &needle)? {
                    removed = true;
                    continue;
                }
            }
            kept.push(item.clone());
        }
        Ok(Value::Arr(Rc::new(kept)))
    }));

    out.push(super::builtin("removeAt", &["arr", "idx"], |ev, args| {
        let items = arr_arg(ev, &args[0], "std.removeAt first argument")?;
        let index = int_arg(ev, &args[1], "std.removeAt index")?;
        let kept: Vec<Thunk> = items
            .iter()
            .enumerate()
            .filter(|(i, _)| *i as i64 != index)
            .map(|(_, t)| t.clone())
            .collect();
        Ok(Value::Arr(Rc::new(kept)))
    }));
}

fn builtin_slice() -> Builtin {
    super::builtin(
        "slice",
        &["indexable", "index", "end", "step"],
        |ev, args| {
            let target = args[0].force(ev)?;
            let start = args[1].force(ev)?;
            let end = args[2].force(ev)?;
            let step = args[3].force(ev)?;
            match &target {
                Value::Arr(items) => {
                    let picked = slice_indices(ev, items.len(), &start, &end, &step)?
                        .into_iter()
                        .map(|i| items[i].clone())
                        .collect();
                    Ok(Value::Arr(Rc::new(picked)))
                }
                Value::Str(s) => {
                    let chars: Vec<char> = s.chars().collect();
                    let picked: String = slice_indices(ev, chars.len(), &start, &end, &step)?
                        .into_iter()
                        .map(|i| chars[i])
                        .collect();
                    Ok(Value::str(picked))
                }
                other => eval_err!(
                    "std.slice operates on arrays and strings, got {}",
                    other.type_name()
                ),
            }
        },
    )
}

/// Resolves `[start:end:step]` into concrete element indices, with
/// Python slice semantics: omitted bounds default by step direction,
/// negative indices count from the end, and out-of-range bounds clamp.
fn slice_indices(
    _ev: &Evaluator,
    len: usize,
    start: &Value,
    end: &Value,
    step: &Value,
) -> EvalResult<Vec<usize>> {
    let len = len as i64;
    let step = match step {
        Value::Null => 1,
        other => other.as_int("std.slice step")?,
    };
    if step == 0 {
        eval_err!("std.slice step cannot be zero");
    }

    let normalize = |bound: &Value, default: i64, min: i64, max: i64| -> EvalResult<i64> {
        match bound {
            Value::Null => Ok(default),
            other => {
                let mut i = other.as_int("std.slice bound")?;
                if i < 0 {
                    i += len;
                }
                Ok(i.clamp(min, max))
            }
        }
    };

    let mut indices = Vec::new();
    if step > 0 {
        let start = normalize(start, 0, 0, len)?;
        let end = normalize(end, len, 0, len)?;
        let mut i = start;
        while i < end {
            indices.push(i as usize);
            i += step;
        }
    } else {
        let start = normalize(start, len - 1, -1, len - 1)?;
        let end = normalize(end, -1, -1, len - 1)?;
        let mut i = start;
        while i > end {
            indices.push(i as usize);
            i += step;
        }
    }
    Ok(indices)
}

fn call_predicate(ev: &Evaluator, func: &Value, item: &Thunk) -> EvalResult<bool> {
    ev.call_function(func, vec![item.clone()])?
        .as_bool("filter function result")
}

fn flatten_deep(ev: &Evaluator, value: &Value, out: &mut Vec<Value>) -> EvalResult<()> {
    match value {
        Value::Arr(items) => {
            for item in items.iter() {
                let forced = item.force(ev)?;
                flatten_deep(ev, &forced, out)?;
            }
            Ok(())
        }
        other => {
            out.push(other.clone());
            Ok(())
        }
    }
}
