//! Object, array, and comprehension parsing.
//!
//! An object literal whose members are followed by a `for` clause is an
//! object comprehension; it must carry exactly one computed-key field and
//! may declare leading locals, nothing else.

use rsonnet_lex::TokenKind;

use crate::ast::{CompSpec, Expr, Field, FnDef, ForSpec, Member, Visibility};
use crate::{Parser, Precedence};

impl<'a> Parser<'a> {
    /// Parses an object literal or comprehension; the current token is `{`.
    pub(crate) fn parse_object(&mut self) -> Option<Expr> {
        let mut members = Vec::new();

        if self.peek_is(TokenKind::RBrace) {
            self.next_token();
            return Some(Expr::Object(members));
        }

        loop {
            self.next_token();
            if self.cur_is(TokenKind::For) {
                return self.parse_object_comp(members);
            }
            members.push(self.parse_member()?);

            if self.peek_is(TokenKind::Comma) {
                self.next_token();
                if self.peek_is(TokenKind::RBrace) {
                    self.next_token();
                    break;
                }
                continue;
            }
            if self.peek_is(TokenKind::For) {
                self.next_token();
                return self.parse_object_comp(members);
            }
            self.expect_peek(TokenKind::RBrace)?;
            break;
        }

        Some(Expr::Object(members))
    }

    /// Parses one object member: a field, an object-local, or an assert.
    fn parse_member(&mut self) -> Option<Member> {
        match self.cur().kind {
            TokenKind::Local => {
                self.expect_peek(TokenKind::Ident)?;
                Some(Member::Local(self.parse_bind()?))
            }
            TokenKind::Assert => Some(Member::Assert(self.parse_assert_spec()?)),
            TokenKind::Ident | TokenKind::Str | TokenKind::LBracket => {
                Some(Member::Field(self.parse_field()?))
            }
            kind => {
                self.error_at_cur(format!(
                    "expected field, local or assert in object, got {}",
                    kind.describe()
                ));
                None
            }
        }
    }

    /// Parses a field: `key [+] (:|::|:::) value` with optional method
    /// sugar `key(params)`.
    fn parse_field(&mut self) -> Option<Field> {
        let (key, computed) = match self.cur().kind {
            TokenKind::Ident | TokenKind::Str => (Expr::Str(self.cur().literal.clone()), false),
            TokenKind::LBracket => {
                self.next_token();
                let key = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenKind::RBracket)?;
                (key, true)
            }
            _ => unreachable!("caller checked the key token"),
        };

        let params = if self.peek_is(TokenKind::LParen) {
            self.next_token();
            Some(self.parse_params()?)
        } else {
            None
        };

        let inherit = if self.peek_is(TokenKind::Plus) {
            self.next_token();
            true
        } else {
            false
        };

        let visibility = match self.peek_kind() {
            TokenKind::Colon => Visibility::Visible,
            TokenKind::ColonColon => Visibility::Hidden,
            TokenKind::ColonColonColon => Visibility::ForceVisible,
            _ => {
                self.error_at_peek("field must be separated by ':', '::' or ':::'");
                return None;
            }
        };
        self.next_token();

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        let value = match params {
            Some(params) => Expr::Function(FnDef {
                params,
                body: Box::new(value),
            }),
            None => value,
        };

        Some(Field {
            key,
            computed,
            value,
            inherit,
            visibility,
        })
    }

    /// Finishes an object comprehension; the current token is `for` and
    /// `members` holds everything parsed before it.
    fn parse_object_comp(&mut self, members: Vec<Member>) -> Option<Expr> {
        let mut locals = Vec::new();
        let mut field: Option<Field> = None;

        for member in members {
            match member {
                Member::Local(bind) => locals.push(bind),
                Member::Field(f) if f.computed => {
                    if field.is_some() {
                        self.error_at_cur(
                            "object comprehension can only have one computed field",
                        );
                        return None;
                    }
                    field = Some(f);
                }
                Member::Field(_) => {
                    self.error_at_cur(
                        "object comprehension cannot have plain fields, only a computed one",
                    );
                    return None;
                }
                Member::Assert(_) => {
                    self.error_at_cur("object comprehension cannot have assert members");
                    return None;
                }
            }
        }

        let Some(field) = field else {
            self.error_at_cur("object comprehension requires a computed field");
            return None;
        };

        let forspec = self.parse_forspec()?;
        let compspecs = self.parse_comp_specs()?;
        self.expect_peek(TokenKind::RBrace)?;

        Some(Expr::ObjectComp {
            locals,
            key: Box::new(field.key),
            value: Box::new(field.value),
            forspec,
            compspecs,
        })
    }

    /// Parses an array literal or comprehension; the current token is `[`.
    pub(crate) fn parse_array(&mut self) -> Option<Expr> {
        if self.peek_is(TokenKind::RBracket) {
            self.next_token();
            return Some(Expr::Array(Vec::new()));
        }

        self.next_token();
        let first = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::For) {
            self.next_token();
            let forspec = self.parse_forspec()?;
            let compspecs = self.parse_comp_specs()?;
            self.expect_peek(TokenKind::RBracket)?;
            return Some(Expr::ArrayComp {
                expr: Box::new(first),
                forspec,
                compspecs,
            });
        }

        let mut elements = vec![first];
        loop {
            if self.peek_is(TokenKind::Comma) {
                self.next_token();
                if self.peek_is(TokenKind::RBracket) {
                    self.next_token();
                    break;
                }
                self.next_token();
                elements.push(self.parse_expression(Precedence::Lowest)?);
                continue;
            }
            self.expect_peek(TokenKind::RBracket)?;
            break;
        }

        Some(Expr::Array(elements))
    }

    /// Parses `for name in expr`; the current token is `for`.
    fn parse_forspec(&mut self) -> Option<ForSpec> {
        self.expect_peek(TokenKind::Ident)?;
        let var = self.cur().literal.clone();
        self.expect_peek(TokenKind::In)?;
        self.next_token();
        let iterable = self.parse_expression(Precedence::Lowest)?;
        Some(ForSpec { var, iterable: Box::new(iterable) })
    }

    /// Parses trailing `for` / `if` comprehension clauses.
    fn parse_comp_specs(&mut self) -> Option<Vec<CompSpec>> {
        let mut specs = Vec::new();
        loop {
            if self.peek_is(TokenKind::For) {
                self.next_token();
                specs.push(CompSpec::For(self.parse_forspec()?));
            } else if self.peek_is(TokenKind::If) {
                self.next_token();
                self.next_token();
                specs.push(CompSpec::If(self.parse_expression(Precedence::Lowest)?));
            } else {
                return Some(specs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Bind, Number};
    use rsonnet_lex::Lexer;

    fn parse(source: &str) -> Expr {
        let mut parser = Parser::new(Lexer::new(source));
        let expr = parser.parse();
        assert!(
            parser.errors().is_empty(),
            "unexpected errors: {:?}",
            parser.errors()
        );
        expr.expect("expected an expression")
    }

    fn parse_fails(source: &str) {
        let mut parser = Parser::new(Lexer::new(source));
        assert!(parser.parse().is_none(), "expected failure for {source:?}");
    }

    fn members(source: &str) -> Vec<Member> {
        match parse(source) {
            Expr::Object(members) => members,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_object() {
        assert!(members("{}").is_empty());
    }

    #[test]
    fn test_fields_and_visibility() {
        let members = members("{a: 1, b:: 2, c::: 3}");
        let field = |m: &Member| match m {
            Member::Field(f) => f.clone(),
            other => panic!("expected field, got {other:?}"),
        };
        assert_eq!(field(&members[0]).visibility, Visibility::Visible);
        assert_eq!(field(&members[1]).visibility, Visibility::Hidden);
        assert_eq!(field(&members[2]).visibility, Visibility::ForceVisible);
    }

    #[test]
    fn test_inherit_combines_with_visibility() {
        let members = members("{a+: 1, b+:: 2, c+::: 3}");
        for member in &members {
            let Member::Field(f) = member else {
                panic!("expected field");
            };
            assert!(f.inherit);
        }
        let Member::Field(f) = &members[2] else {
            panic!("expected field");
        };
        assert_eq!(f.visibility, Visibility::ForceVisible);
    }

    #[test]
    fn test_string_and_computed_keys() {
        let members = members("{'a': 1, [k]: 2}");
        let Member::Field(fixed) = &members[0] else {
            panic!("expected field");
        };
        assert!(!fixed.computed);
        assert_eq!(fixed.key, Expr::Str("a".into()));
        let Member::Field(computed) = &members[1] else {
            panic!("expected field");
        };
        assert!(computed.computed);
        assert_eq!(computed.key, Expr::Ident("k".into()));
    }

    #[test]
    fn test_method_sugar() {
        let members = members("{double(x): x * 2}");
        let Member::Field(f) = &members[0] else {
            panic!("expected field");
        };
        assert!(matches!(f.value, Expr::Function(_)));
    }

    #[test]
    fn test_object_local_and_assert() {
        let members = members("{local two = 2, a: two, assert self.a == 2 : 'bad'}");
        assert!(matches!(members[0], Member::Local(Bind { .. })));
        assert!(matches!(members[1], Member::Field(_)));
        assert!(matches!(members[2], Member::Assert(_)));
    }

    #[test]
    fn test_object_local_function_sugar() {
        let members = members("{local inc(x) = x + 1, a: inc(1)}");
        let Member::Local(bind) = &members[0] else {
            panic!("expected local");
        };
        assert!(matches!(bind.expr, Expr::Function(_)));
    }

    #[test]
    fn test_trailing_comma() {
        assert_eq!(members("{a: 1,}").len(), 1);
        let Expr::Array(elements) = parse("[1, 2,]") else {
            panic!("expected array");
        };
        assert_eq!(elements.len(), 2);
    }

    #[test]
    fn test_empty_array() {
        assert_eq!(parse("[]"), Expr::Array(vec![]));
    }

    #[test]
    fn test_array_comprehension() {
        let Expr::ArrayComp {
            forspec, compspecs, ..
        } = parse("[x * x for x in [1, 2, 3] if x != 2]")
        else {
            panic!("expected array comp");
        };
        assert_eq!(forspec.var, "x");
        assert_eq!(compspecs.len(), 1);
        assert!(matches!(compspecs[0], CompSpec::If(_)));
    }

    #[test]
    fn test_nested_comprehension_clauses() {
        let Expr::ArrayComp { compspecs, .. } =
            parse("[i * j for i in [1, 2] if i > 0 for j in [3, 4] if j > 3]")
        else {
            panic!("expected array comp");
        };
        assert_eq!(compspecs.len(), 3);
        assert!(matches!(compspecs[0], CompSpec::If(_)));
        assert!(matches!(compspecs[1], CompSpec::For(_)));
        assert!(matches!(compspecs[2], CompSpec::If(_)));
    }

    #[test]
    fn test_object_comprehension() {
        let Expr::ObjectComp {
            locals,
            forspec,
            compspecs,
            ..
        } = parse("{local pre = 'k', [pre + x]: x for x in ['a', 'b'] if x != 'b'}")
        else {
            panic!("expected object comp");
        };
        assert_eq!(locals.len(), 1);
        assert_eq!(forspec.var, "x");
        assert_eq!(compspecs.len(), 1);
    }

    #[test]
    fn test_object_comp_rejects_plain_fields() {
        parse_fails("{a: 1, [k]: 2 for k in ks}");
    }

    #[test]
    fn test_object_comp_requires_computed_field() {
        parse_fails("{for k in ks}");
    }

    #[test]
    fn test_object_comp_rejects_two_fields() {
        parse_fails("{[a]: 1, [b]: 2 for a in xs for b in ys}");
    }

    #[test]
    fn test_field_without_separator_fails() {
        parse_fails("{a 1}");
    }

    #[test]
    fn test_number_field_values() {
        let members = members("{a: 1.5}");
        let Member::Field(f) = &members[0] else {
            panic!("expected field");
        };
        assert_eq!(f.value, Expr::Number(Number::Float(1.5)));
    }
}
