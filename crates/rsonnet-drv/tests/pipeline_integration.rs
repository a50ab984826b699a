//! Full-pipeline integration tests: source text through lexer, parser,
//! evaluator, and manifestation.

use std::io::Write;

use rsonnet_drv::{loads, DriverError};

fn eval_json(source: &str) -> serde_json::Value {
    loads(source, vec![], vec![])
        .unwrap_or_else(|err| panic!("evaluation of {source:?} failed: {err}"))
}

fn eval_error(source: &str) -> String {
    match loads(source, vec![], vec![]) {
        Ok(json) => panic!("expected error for {source:?}, got {json}"),
        Err(DriverError::Runtime(message)) => message,
        Err(other) => panic!("expected runtime error for {source:?}, got {other:?}"),
    }
}

// =========================================================================
// Concrete end-to-end scenarios
// =========================================================================

#[test]
fn test_arithmetic_comparison() {
    assert_eq!(eval_json("1 + 2 * 3 > 4"), serde_json::json!(true));
}

#[test]
fn test_object_and_index() {
    assert_eq!(eval_json("{a: 1, b: '2' + 3}.b"), serde_json::json!("23"));
}

#[test]
fn test_composition_inherit_hidden() {
    assert_eq!(
        eval_json("{a: 1, b:: 2} + {b+::: 'b'}"),
        serde_json::json!({"a": 1, "b": "2b"})
    );
}

#[test]
fn test_self_dollar_nested() {
    assert_eq!(
        eval_json("{a: 1, b: {c: $.a + 1, d: self.c * 2}}"),
        serde_json::json!({"a": 1, "b": {"c": 2, "d": 4}})
    );
}

#[test]
fn test_double_nested_comprehension() {
    assert_eq!(
        eval_json("[i*j for i in [1,2,3] if i<3 for j in [1,2,3] if i!=j]"),
        serde_json::json!([2, 3, 2, 6])
    );
}

#[test]
fn test_function_defaults_named_args() {
    assert_eq!(
        eval_json("local inc(x, d=1)=x+d; inc(x=2, d=3)"),
        serde_json::json!(5)
    );
}

#[test]
fn test_super_during_composition() {
    assert_eq!(
        eval_json("{foo:{name:'foo'}} {foo+:{name:'prefix_'+super.name}}"),
        serde_json::json!({"foo": {"name": "prefix_foo"}})
    );
}

#[test]
fn test_error_laziness() {
    assert_eq!(eval_json("local a = error \"x\"; 42"), serde_json::json!(42));
    assert_eq!(
        eval_json("local foo(x)=42; foo(error \"x\")"),
        serde_json::json!(42)
    );
    assert_eq!(eval_error("local foo(x)=42; foo(error \"x\") tailstrict"), "x");
}

#[test]
fn test_percent_formatting() {
    assert_eq!(
        eval_json("\"%(u)s@%(h)s:%(p)s\" % {u:\"a\",h:\"h\",p:1}"),
        serde_json::json!("a@h:1")
    );
}

#[test]
fn test_stdlib_scenarios() {
    assert_eq!(
        eval_json("std.join(\"-\",[\"a\",\"b\",\"c\"])"),
        serde_json::json!("a-b-c")
    );
    assert_eq!(eval_json("std.length({a:1,b::2})"), serde_json::json!(2));
    assert_eq!(
        eval_json("std.objectFields({a:1,b::2})"),
        serde_json::json!(["a"])
    );
}

// =========================================================================
// Failure scenarios
// =========================================================================

#[test]
fn test_syntax_error_produces_messages() {
    let err = loads("{a:}", vec![], vec![]).unwrap_err();
    let DriverError::Syntax { errors } = err else {
        panic!("expected syntax error, got {err:?}");
    };
    assert!(!errors.is_empty());
}

#[test]
fn test_unknown_variable() {
    assert_eq!(
        eval_error("local x = {a: a}; local a = 1; x"),
        "Unknown variable: a"
    );
}

#[test]
fn test_division_by_zero() {
    assert_eq!(eval_error("1/0"), "Division by zero");
}

#[test]
fn test_assert_failure() {
    assert_eq!(eval_error("assert false : \"nope\"; {}"), "nope");
}

// =========================================================================
// Invariants
// =========================================================================

#[test]
fn test_json_roundtrip() {
    let source = r#"{"a": [1, 2.5, "s"], "b": {"c": null}}"#;
    let json = eval_json(source);
    let reparsed: serde_json::Value =
        serde_json::from_str(&serde_json::to_string(&json).unwrap()).unwrap();
    assert_eq!(json, reparsed);
}

#[test]
fn test_pure_json_idempotence() {
    let source = r#"{"a": [1, 2, 3], "b": true}"#;
    let expected: serde_json::Value = serde_json::from_str(source).unwrap();
    assert_eq!(eval_json(source), expected);
}

#[test]
fn test_laziness_in_objects() {
    // The hidden field raises when forced, but nothing forces it.
    assert_eq!(
        eval_json("{bad:: error 'untouched', ok: 1}"),
        serde_json::json!({"ok": 1})
    );
}

#[test]
fn test_recursion_cycle() {
    let message = eval_error("local a = a; a");
    assert!(message.contains("recursion"), "unexpected message: {message}");
}

// =========================================================================
// Imports
// =========================================================================

#[test]
fn test_import_relative() {
    let dir = tempfile::tempdir().unwrap();
    let lib = dir.path().join("lib.jsonnet");
    let mut f = std::fs::File::create(&lib).unwrap();
    writeln!(f, "{{ value: 41 }}").unwrap();

    let main = dir.path().join("main.jsonnet");
    let mut f = std::fs::File::create(&main).unwrap();
    writeln!(f, "(import 'lib.jsonnet').value + 1").unwrap();

    let json = rsonnet_drv::load(&main, vec![], vec![]).unwrap();
    assert_eq!(json, serde_json::json!(42));
}

#[test]
fn test_importstr_and_importbin() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.txt");
    std::fs::write(&data, "ab").unwrap();

    let main = dir.path().join("main.jsonnet");
    std::fs::write(
        &main,
        "{ text: importstr 'data.txt', bytes: importbin 'data.txt' }",
    )
    .unwrap();

    let json = rsonnet_drv::load(&main, vec![], vec![]).unwrap();
    assert_eq!(json, serde_json::json!({"bytes": [97, 98], "text": "ab"}));
}

#[test]
fn test_import_missing_file() {
    let err = loads("import 'no/such/file.jsonnet'", vec![], vec![]).unwrap_err();
    let DriverError::Runtime(message) = err else {
        panic!("expected runtime error, got {err:?}");
    };
    assert!(message.contains("Failed to import"));
}

#[test]
fn test_import_parse_failure() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.jsonnet");
    std::fs::write(&broken, "{a:}").unwrap();

    let main = dir.path().join("main.jsonnet");
    std::fs::write(&main, "import 'broken.jsonnet'").unwrap();

    let err = rsonnet_drv::load(&main, vec![], vec![]).unwrap_err();
    assert!(err.to_string().contains("Failed to parse import"));
}

#[test]
fn test_import_cycle_detected() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.jsonnet");
    let b = dir.path().join("b.jsonnet");
    std::fs::write(&a, "import 'b.jsonnet'").unwrap();
    std::fs::write(&b, "import 'a.jsonnet'").unwrap();

    let err = rsonnet_drv::load(&a, vec![], vec![]).unwrap_err();
    assert!(err.to_string().contains("Import cycle"));
}

#[test]
fn test_this_file() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("main.jsonnet");
    std::fs::write(&main, "std.thisFile").unwrap();

    let json = rsonnet_drv::load(&main, vec![], vec![]).unwrap();
    let text = json.as_str().unwrap();
    assert!(text.ends_with("main.jsonnet"));
}
