//! Edge-case parser tests.
//!
//! Inputs that have historically broken Jsonnet parsers: deeply chained
//! postfix operators, sugar interactions, and malformed programs that must
//! fail with accumulated messages rather than panics.

use rsonnet_lex::Lexer;

use crate::ast::{Arg, BinaryOp, CompSpec, Expr, Member, Number, UnaryOp};
use crate::Parser;

fn parse(source: &str) -> Expr {
    let mut parser = Parser::new(Lexer::new(source));
    let expr = parser.parse();
    assert!(
        parser.errors().is_empty(),
        "unexpected errors for {source:?}: {:?}",
        parser.errors()
    );
    expr.expect("expected an expression")
}

fn parse_fails(source: &str) -> Vec<String> {
    let mut parser = Parser::new(Lexer::new(source));
    let expr = parser.parse();
    assert!(expr.is_none(), "expected failure for {source:?}");
    let errors = parser.errors();
    assert!(!errors.is_empty(), "failure without message for {source:?}");
    errors
}

#[test]
fn test_full_precedence_tower() {
    // Everything at once; shape must honour the documented ordering.
    let expr = parse("1 | 2 ^ 3 & 4 == 5 < 6 << 7 + 8 * 9");
    let Expr::Binary { op, .. } = expr else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::BitOr);
}

#[test]
fn test_shift_binds_tighter_than_comparison() {
    let Expr::Binary { op, .. } = parse("1 << 2 < 3 << 4") else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Lt);
}

#[test]
fn test_equality_of_comparisons() {
    let Expr::Binary { op, left, right } = parse("1 < 2 == 3 < 4") else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Eq);
    assert!(matches!(*left, Expr::Binary { op: BinaryOp::Lt, .. }));
    assert!(matches!(*right, Expr::Binary { op: BinaryOp::Lt, .. }));
}

#[test]
fn test_unary_chains() {
    let Expr::Unary { op, operand } = parse("--1") else {
        panic!("expected unary");
    };
    assert_eq!(op, UnaryOp::Minus);
    assert!(matches!(
        *operand,
        Expr::Unary {
            op: UnaryOp::Minus,
            ..
        }
    ));
    assert!(matches!(parse("!~x"), Expr::Unary { op: UnaryOp::Not, .. }));
}

#[test]
fn test_postfix_chain_on_call() {
    // f(1).a[0] { b: 2 }
    let Expr::ApplyBrace { left, .. } = parse("f(1).a[0] { b: 2 }") else {
        panic!("expected apply brace");
    };
    let Expr::Binary { op, .. } = *left else {
        panic!("expected index");
    };
    assert_eq!(op, BinaryOp::Index);
}

#[test]
fn test_call_of_call() {
    let Expr::Apply { callee, .. } = parse("f(1)(2)") else {
        panic!("expected apply");
    };
    assert!(matches!(*callee, Expr::Apply { .. }));
}

#[test]
fn test_applybrace_chains() {
    let Expr::ApplyBrace { left, .. } = parse("a { x: 1 } { y: 2 }") else {
        panic!("expected apply brace");
    };
    assert!(matches!(*left, Expr::ApplyBrace { .. }));
}

#[test]
fn test_object_inside_arithmetic() {
    let Expr::Binary { op, .. } = parse("{ a: 1 } + { b: 2 }") else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Add);
}

#[test]
fn test_if_swallows_else_branch() {
    // 1 + if c then 2 else 3 parses the whole if as the right operand.
    let Expr::Binary { right, .. } = parse("1 + if c then 2 else 3") else {
        panic!("expected binary");
    };
    assert!(matches!(*right, Expr::If { .. }));
}

#[test]
fn test_local_in_object_value_position() {
    let members = match parse("{ a: local two = 2; two }") {
        Expr::Object(members) => members,
        other => panic!("expected object, got {other:?}"),
    };
    let Member::Field(field) = &members[0] else {
        panic!("expected field");
    };
    assert!(matches!(field.value, Expr::Local { .. }));
}

#[test]
fn test_nested_objects() {
    let Expr::Object(members) = parse("{ a: { b: { c: 1 } } }") else {
        panic!("expected object");
    };
    assert_eq!(members.len(), 1);
}

#[test]
fn test_slice_all_forms() {
    // Single colon with only start.
    let Expr::Apply { args, .. } = parse("a[1:]") else {
        panic!("expected slice call");
    };
    assert!(matches!(args[1].expr, Expr::Number(Number::Int(1))));
    assert_eq!(args[2].expr, Expr::Null);

    // Only end.
    let Expr::Apply { args, .. } = parse("a[:2]") else {
        panic!("expected slice call");
    };
    assert_eq!(args[1].expr, Expr::Null);
    assert!(matches!(args[2].expr, Expr::Number(Number::Int(2))));

    // All three.
    let Expr::Apply { args, .. } = parse("a[1:2:3]") else {
        panic!("expected slice call");
    };
    let values: Vec<&Arg> = args.iter().collect();
    assert_eq!(values.len(), 4);
}

#[test]
fn test_too_many_slice_colons() {
    parse_fails("a[1:2:3:4]");
}

#[test]
fn test_text_block_in_object() {
    let Expr::Object(members) = parse("{ text: |||\n  line\n||| }") else {
        panic!("expected object");
    };
    let Member::Field(field) = &members[0] else {
        panic!("expected field");
    };
    assert_eq!(field.value, Expr::Str("line\n".into()));
}

#[test]
fn test_comprehension_over_call() {
    let Expr::ArrayComp { forspec, .. } = parse("[x for x in std.range(1, 3)]") else {
        panic!("expected array comp");
    };
    assert!(matches!(*forspec.iterable, Expr::Apply { .. }));
}

#[test]
fn test_double_for_double_if() {
    let Expr::ArrayComp { compspecs, .. } =
        parse("[i * j for i in [1, 2, 3] if i < 3 for j in [1, 2, 3] if i != j]")
    else {
        panic!("expected array comp");
    };
    assert_eq!(compspecs.len(), 3);
    assert!(matches!(compspecs[1], CompSpec::For(_)));
}

#[test]
fn test_missing_value_reports() {
    let errors = parse_fails("{a:}");
    assert!(errors.iter().any(|e| e.contains("expected expression")));
}

#[test]
fn test_unclosed_object() {
    parse_fails("{a: 1");
}

#[test]
fn test_unclosed_array() {
    parse_fails("[1, 2");
}

#[test]
fn test_unclosed_paren() {
    parse_fails("(1 + 2");
}

#[test]
fn test_unclosed_call() {
    parse_fails("f(1,");
}

#[test]
fn test_lexer_error_surfaces_as_parse_error() {
    let errors = parse_fails("\"unterminated");
    assert!(errors.iter().any(|e| e.contains("unterminated")));
}

#[test]
fn test_illegal_character_reported_in_context() {
    let errors = parse_fails("1 + ?");
    assert!(errors.iter().any(|e| e.contains("unexpected character")));
}

#[test]
fn test_keyword_as_field_value() {
    let Expr::Object(members) = parse("{ a: null, b: true, c: false }") else {
        panic!("expected object");
    };
    assert_eq!(members.len(), 3);
}

#[test]
fn test_dollar_in_nested_object() {
    let expr = parse("{ a: 1, b: { c: $.a } }");
    assert!(matches!(expr, Expr::Object(_)));
}

#[test]
fn test_error_of_if() {
    let Expr::Error(inner) = parse("error if x then 'a' else 'b'") else {
        panic!("expected error expr");
    };
    assert!(matches!(*inner, Expr::If { .. }));
}

#[test]
fn test_import_requires_string_literal() {
    parse_fails("import foo");
}

#[test]
fn test_deep_nesting() {
    let mut source = String::new();
    for _ in 0..64 {
        source.push('(');
    }
    source.push('1');
    for _ in 0..64 {
        source.push(')');
    }
    assert_eq!(parse(&source), Expr::Number(Number::Int(1)));
}
