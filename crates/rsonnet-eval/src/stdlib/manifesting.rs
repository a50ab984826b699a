//! Manifestation builtins: JSON variants, INI, and Python forms.

use serde_json::Value as Json;

use super::{builtin, builtin_d, obj_arg, str_arg};
use crate::error::{eval_err, EvalResult};
use crate::manifest::{self, WriteOptions};
use crate::value::{Builtin, Value};
use crate::Evaluator;

pub(super) fn register(out: &mut Vec<Builtin>) {
    out.push(builtin("manifestJson", &["value"], |ev, args| {
        let value = args[0].force(ev)?;
        let json = manifest::to_json(ev, &value)?;
        let options = WriteOptions {
            indent: Some("    ".to_string()),
            newline: "\n".to_string(),
            key_val_sep: ": ".to_string(),
            item_sep: ",".to_string(),
            ensure_ascii: false,
        };
        Ok(Value::str(manifest::write_json(&json, &options)))
    }));

    out.push(builtin_d(
        "manifestJsonEx",
        &["value", "indent", "newline", "key_val_sep"],
        vec![Value::str("\n"), Value::str(": ")],
        |ev, args| {
            let value = args[0].force(ev)?;
            let indent = str_arg(ev, &args[1], "std.manifestJsonEx indent")?;
            let newline = str_arg(ev, &args[2], "std.manifestJsonEx newline")?;
            let key_val_sep = str_arg(ev, &args[3], "std.manifestJsonEx key_val_sep")?;
            let json = manifest::to_json(ev, &value)?;
            let options = WriteOptions {
                indent: Some(indent.to_string()),
                newline: newline.to_string(),
                key_val_sep: key_val_sep.to_string(),
                item_sep: ",".to_string(),
                ensure_ascii: false,
            };
            Ok(Value::str(manifest::write_json(&json, &options)))
        },
    ));

    out.push(builtin("manifestJsonMinified", &["value"], |ev, args| {
        let value = args[0].force(ev)?;
        let json = manifest::to_json(ev, &value)?;
        Ok(Value::str(manifest::write_json(
            &json,
            &WriteOptions::compact(),
        )))
    }));

    out.push(builtin("manifestIni", &["ini"], |ev, args| {
        let ini = obj_arg(ev, &args[0], "std.manifestIni argument")?;
        let mut out = String::new();

        if ini.has("main") {
            let main = ini.field_value(ev, "main")?;
            let main = main.as_obj("std.manifestIni main")?;
            write_ini_body(ev, &main, &mut out)?;
        }

        if !ini.has("sections") {
            eval_err!("std.manifestIni argument must have a sections field");
        }
        let sections = ini.field_value(ev, "sections")?;
        let sections = sections.as_obj("std.manifestIni sections")?;
        for name in sections.sorted_field_names(false) {
            out.push_str(&format!("[{name}]\n"));
            let body = sections.field_value(ev, &name)?;
            let body = body.as_obj("std.manifestIni section")?;
            write_ini_body(ev, &body, &mut out)?;
        }

        Ok(Value::str(out))
    }));

    out.push(builtin("manifestPython", &["v"], |ev, args| {
        let value = args[0].force(ev)?;
        let json = manifest::to_json(ev, &value)?;
        Ok(Value::str(python_literal(&json)))
    }));

    out.push(builtin("manifestPythonVars", &["conf"], |ev, args| {
        let conf = obj_arg(ev, &args[0], "std.manifestPythonVars argument")?;
        let mut out = String::new();
        for name in conf.sorted_field_names(false) {
            let value = conf.field_value(ev, &name)?;
            let json = manifest::to_json(ev, &value)?;
            out.push_str(&format!("{name} = {}\n", python_literal(&json)));
        }
        Ok(Value::str(out))
    }));
}

/// Writes `key = value` lines for one INI section. Array values repeat
/// the key once per element.
fn write_ini_body(
    ev: &Evaluator,
    body: &crate::value::Object,
    out: &mut String,
) -> EvalResult<()> {
    for name in body.sorted_field_names(false) {
        let value = body.field_value(ev, &name)?;
        match &value {
            Value::Arr(items) => {
                for item in items.iter() {
                    let item = item.force(ev)?;
                    let text = manifest::value_to_string(ev, &item)?;
                    out.push_str(&format!("{name} = {text}\n"));
                }
            }
            other => {
                let text = manifest::value_to_string(ev, other)?;
                out.push_str(&format!("{name} = {text}\n"));
            }
        }
    }
    Ok(())
}

/// Renders a JSON tree as a Python literal.
fn python_literal(json: &Json) -> String {
    match json {
        Json::Null => "None".to_string(),
        Json::Bool(true) => "True".to_string(),
        Json::Bool(false) => "False".to_string(),
        Json::Number(n) => n.to_string(),
        Json::String(s) => {
            let mut out = String::new();
            manifest::write_string(s, false, &mut out);
            out
        }
        Json::Array(items) => {
            let parts: Vec<String> = items.iter().map(python_literal).collect();
            format!("[{}]", parts.join(", "))
        }
        Json::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| {
                    let mut key = String::new();
                    manifest::write_string(k, false, &mut key);
                    format!("{key}: {}", python_literal(v))
                })
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}
