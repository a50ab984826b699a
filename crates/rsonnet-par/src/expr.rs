//! Expression parsing (Pratt core).
//!
//! Every parse method follows the same convention: on entry the current
//! token is the first token of the construct, on exit it is the last.
//! Infix handlers are entered with the current token on the operator.

use rsonnet_lex::TokenKind;

use crate::ast::{Arg, AssertSpec, Bind, BinaryOp, Expr, FnDef, Number, Param, UnaryOp};
use crate::{binary_precedence, Parser, Precedence};

impl<'a> Parser<'a> {
    /// Parses an expression, consuming operators that bind tighter than
    /// `precedence`.
    pub(crate) fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;

        while precedence < binary_precedence(self.peek_kind()) {
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    /// Parses an atom or prefix-operator expression.
    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur().kind {
            TokenKind::Null => Some(Expr::Null),
            TokenKind::True => Some(Expr::True),
            TokenKind::False => Some(Expr::False),
            TokenKind::Number => self.parse_number(),
            TokenKind::Str => Some(Expr::Str(self.cur().literal.clone())),
            TokenKind::Ident => Some(Expr::Ident(self.cur().literal.clone())),
            TokenKind::SelfKw => Some(Expr::SelfRef),
            TokenKind::Dollar => Some(Expr::Dollar),
            TokenKind::Super => self.parse_super(),
            TokenKind::LParen => self.parse_grouped(),
            TokenKind::LBrace => self.parse_object(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::Local => self.parse_local(),
            TokenKind::If => self.parse_if(),
            TokenKind::Function => self.parse_function(),
            TokenKind::Assert => self.parse_assert_expression(),
            TokenKind::ErrorKw => self.parse_error_expression(),
            TokenKind::Import => self.parse_import(Expr::Import),
            TokenKind::Importstr => self.parse_import(Expr::Importstr),
            TokenKind::Importbin => self.parse_import(Expr::Importbin),
            TokenKind::Plus => self.parse_unary(UnaryOp::Plus),
            TokenKind::Minus => self.parse_unary(UnaryOp::Minus),
            TokenKind::Not => self.parse_unary(UnaryOp::Not),
            TokenKind::Tilde => self.parse_unary(UnaryOp::BitwiseNot),
            TokenKind::Illegal => {
                let literal = self.cur().literal.clone();
                self.error_at_cur(format!("unexpected character '{literal}'"));
                None
            }
            kind => {
                self.error_at_cur(format!("expected expression, got {}", kind.describe()));
                None
            }
        }
    }

    /// Parses an infix or postfix continuation of `left`; the current
    /// token is the operator.
    fn parse_infix(&mut self, left: Expr) -> Option<Expr> {
        match self.cur().kind {
            TokenKind::Dot => self.parse_field_access(left),
            TokenKind::LBracket => self.parse_index_or_slice(left),
            TokenKind::LParen => self.parse_call(left),
            TokenKind::LBrace => {
                let object = self.parse_object()?;
                Some(Expr::ApplyBrace {
                    left: Box::new(left),
                    right: Box::new(object),
                })
            }
            TokenKind::In => self.parse_in(left),
            kind => {
                let op = match kind {
                    TokenKind::Plus => BinaryOp::Add,
                    TokenKind::Minus => BinaryOp::Sub,
                    TokenKind::Star => BinaryOp::Mul,
                    TokenKind::Slash => BinaryOp::Div,
                    TokenKind::Percent => BinaryOp::Mod,
                    TokenKind::Amp => BinaryOp::BitAnd,
                    TokenKind::Pipe => BinaryOp::BitOr,
                    TokenKind::Caret => BinaryOp::BitXor,
                    TokenKind::Shl => BinaryOp::Shl,
                    TokenKind::Shr => BinaryOp::Shr,
                    TokenKind::AndAnd => BinaryOp::And,
                    TokenKind::OrOr => BinaryOp::Or,
                    TokenKind::EqEq => BinaryOp::Eq,
                    TokenKind::NotEq => BinaryOp::Ne,
                    TokenKind::Lt => BinaryOp::Lt,
                    TokenKind::Le => BinaryOp::Le,
                    TokenKind::Gt => BinaryOp::Gt,
                    TokenKind::Ge => BinaryOp::Ge,
                    _ => {
                        self.error_at_cur(format!("unknown binary operator {}", kind.describe()));
                        return None;
                    }
                };
                let precedence = binary_precedence(self.cur().kind);
                self.next_token();
                let right = self.parse_expression(precedence)?;
                Some(Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
        }
    }

    /// Parses a number literal; floats are any literal carrying a fraction
    /// or exponent, everything else is an int.
    fn parse_number(&mut self) -> Option<Expr> {
        let literal = &self.cur().literal;
        let number = if literal.contains(['.', 'e', 'E']) {
            literal.parse::<f64>().ok().map(Number::Float)
        } else {
            // Integers too large for i64 degrade to floats.
            match literal.parse::<i64>() {
                Ok(n) => Some(Number::Int(n)),
                Err(_) => literal.parse::<f64>().ok().map(Number::Float),
            }
        };
        match number {
            Some(n) => Some(Expr::Number(n)),
            None => {
                let literal = literal.clone();
                self.error_at_cur(format!("invalid number literal: {literal}"));
                None
            }
        }
    }

    /// `+x` `-x` `!x` `~x`
    fn parse_unary(&mut self, op: UnaryOp) -> Option<Expr> {
        self.next_token();
        let operand = self.parse_expression(Precedence::Unary)?;
        Some(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// `( expr )`
    fn parse_grouped(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        Some(expr)
    }

    /// `super.name` or `super[expr]`; bare `super` is a syntax error.
    fn parse_super(&mut self) -> Option<Expr> {
        if self.peek_is(TokenKind::Dot) {
            self.next_token();
            self.expect_peek(TokenKind::Ident)?;
            let name = self.cur().literal.clone();
            Some(Expr::Binary {
                op: BinaryOp::Index,
                left: Box::new(Expr::Super),
                right: Box::new(Expr::Str(name)),
            })
        } else if self.peek_is(TokenKind::LBracket) {
            self.next_token();
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(TokenKind::RBracket)?;
            Some(Expr::Binary {
                op: BinaryOp::Index,
                left: Box::new(Expr::Super),
                right: Box::new(key),
            })
        } else {
            self.error_at_peek("expected '.' or '[' after super");
            None
        }
    }

    /// `left.name` — lowered to an index with a string key.
    fn parse_field_access(&mut self, left: Expr) -> Option<Expr> {
        self.expect_peek(TokenKind::Ident)?;
        let name = self.cur().literal.clone();
        Some(Expr::Binary {
            op: BinaryOp::Index,
            left: Box::new(left),
            right: Box::new(Expr::Str(name)),
        })
    }

    /// `left[e]`, or a slice `left[s:e:t]` with any position omitted.
    ///
    /// Slices lower to `std.slice(left, s, e, t)` with nulls for the
    /// omitted positions; `left[::]` and `left[:]` degenerate to `left`.
    fn parse_index_or_slice(&mut self, left: Expr) -> Option<Expr> {
        let mut slots: [Option<Expr>; 3] = [None, None, None];
        let mut slot = 0usize;
        let mut saw_colon = false;

        loop {
            if self.peek_is(TokenKind::RBracket) {
                self.next_token();
                break;
            }
            if self.peek_is(TokenKind::Colon) {
                self.next_token();
                slot += 1;
                saw_colon = true;
                if slot > 2 {
                    self.error_at_cur("too many colons in slice");
                    return None;
                }
                continue;
            }
            if slots[slot].is_some() {
                self.error_at_peek("expected ':' or ']' in index");
                return None;
            }
            self.next_token();
            slots[slot] = Some(self.parse_expression(Precedence::Lowest)?);
        }

        let [start, end, step] = slots;

        if !saw_colon {
            let Some(index) = start else {
                self.error_at_cur("index requires an expression");
                return None;
            };
            return Some(Expr::Binary {
                op: BinaryOp::Index,
                left: Box::new(left),
                right: Box::new(index),
            });
        }

        if start.is_none() && end.is_none() && step.is_none() {
            // a[:], a[::] — nothing to slice.
            return Some(left);
        }

        Some(Expr::slice_call(left, start, end, step))
    }

    /// `callee(args…) [tailstrict]`; positional arguments must precede
    /// named ones.
    fn parse_call(&mut self, callee: Expr) -> Option<Expr> {
        let mut args: Vec<Arg> = Vec::new();

        if self.peek_is(TokenKind::RParen) {
            self.next_token();
        } else {
            loop {
                self.next_token();
                let arg = if self.cur_is(TokenKind::Ident) && self.peek_is(TokenKind::Eq) {
                    let name = self.cur().literal.clone();
                    self.next_token(); // '='
                    self.next_token();
                    let expr = self.parse_expression(Precedence::Lowest)?;
                    Arg {
                        name: Some(name),
                        expr,
                    }
                } else {
                    if args.iter().any(|a| a.name.is_some()) {
                        self.error_at_cur("positional argument after named argument");
                        return None;
                    }
                    Arg {
                        name: None,
                        expr: self.parse_expression(Precedence::Lowest)?,
                    }
                };
                args.push(arg);

                if self.peek_is(TokenKind::Comma) {
                    self.next_token();
                    if self.peek_is(TokenKind::RParen) {
                        self.next_token();
                        break;
                    }
                    continue;
                }
                self.expect_peek(TokenKind::RParen)?;
                break;
            }
        }

        let tailstrict = if self.peek_is(TokenKind::Tailstrict) {
            self.next_token();
            true
        } else {
            false
        };

        Some(Expr::Apply {
            callee: Box::new(callee),
            args,
            tailstrict,
        })
    }

    /// `left in right`; `right` may be `super`.
    fn parse_in(&mut self, left: Expr) -> Option<Expr> {
        self.next_token();
        let right = if self.cur_is(TokenKind::Super) {
            Expr::Super
        } else {
            self.parse_expression(Precedence::Comparison)?
        };
        Some(Expr::Binary {
            op: BinaryOp::In,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// `local b1, …, bn; body`
    fn parse_local(&mut self) -> Option<Expr> {
        let mut binds = Vec::new();
        loop {
            self.expect_peek(TokenKind::Ident)?;
            binds.push(self.parse_bind()?);
            if self.peek_is(TokenKind::Comma) {
                self.next_token();
                continue;
            }
            self.expect_peek(TokenKind::Semicolon)?;
            break;
        }
        self.next_token();
        let body = self.parse_expression(Precedence::Lowest)?;
        Some(Expr::Local {
            binds,
            body: Box::new(body),
        })
    }

    /// `name [(params)] = expr`; the current token is the name.
    ///
    /// `name(params) = body` desugars to `name = function(params) body`.
    pub(crate) fn parse_bind(&mut self) -> Option<Bind> {
        let name = self.cur().literal.clone();
        let params = if self.peek_is(TokenKind::LParen) {
            self.next_token();
            Some(self.parse_params()?)
        } else {
            None
        };
        self.expect_peek(TokenKind::Eq)?;
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        let expr = match params {
            Some(params) => Expr::Function(FnDef {
                params,
                body: Box::new(expr),
            }),
            None => expr,
        };
        Some(Bind { name, expr })
    }

    /// `( name [= default], … )`; the current token is `(`.
    pub(crate) fn parse_params(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();
        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some(params);
        }
        loop {
            self.expect_peek(TokenKind::Ident)?;
            let name = self.cur().literal.clone();
            let default = if self.peek_is(TokenKind::Eq) {
                self.next_token();
                self.next_token();
                Some(self.parse_expression(Precedence::Lowest)?)
            } else {
                None
            };
            params.push(Param { name, default });

            if self.peek_is(TokenKind::Comma) {
                self.next_token();
                if self.peek_is(TokenKind::RParen) {
                    self.next_token();
                    break;
                }
                continue;
            }
            self.expect_peek(TokenKind::RParen)?;
            break;
        }
        Some(params)
    }

    /// `if cond then a [else b]`
    fn parse_if(&mut self) -> Option<Expr> {
        self.next_token();
        let cond = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::Then)?;
        self.next_token();
        let then_branch = self.parse_expression(Precedence::Lowest)?;
        let else_branch = if self.peek_is(TokenKind::Else) {
            self.next_token();
            self.next_token();
            Some(Box::new(self.parse_expression(Precedence::Lowest)?))
        } else {
            None
        };
        Some(Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch,
        })
    }

    /// `function(params) body`
    fn parse_function(&mut self) -> Option<Expr> {
        self.expect_peek(TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.next_token();
        let body = self.parse_expression(Precedence::Lowest)?;
        Some(Expr::Function(FnDef {
            params,
            body: Box::new(body),
        }))
    }

    /// `assert cond [: message] ; body`
    fn parse_assert_expression(&mut self) -> Option<Expr> {
        let assert = self.parse_assert_spec()?;
        self.expect_peek(TokenKind::Semicolon)?;
        self.next_token();
        let body = self.parse_expression(Precedence::Lowest)?;
        Some(Expr::Assert {
            assert,
            body: Box::new(body),
        })
    }

    /// `assert cond [: message]` — shared by the expression form and
    /// object members. The current token is `assert`.
    pub(crate) fn parse_assert_spec(&mut self) -> Option<AssertSpec> {
        self.next_token();
        let cond = self.parse_expression(Precedence::Lowest)?;
        let message = if self.peek_is(TokenKind::Colon) {
            self.next_token();
            self.next_token();
            Some(Box::new(self.parse_expression(Precedence::Lowest)?))
        } else {
            None
        };
        Some(AssertSpec { cond: Box::new(cond), message })
    }

    /// `error expr`
    fn parse_error_expression(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        Some(Expr::Error(Box::new(expr)))
    }

    /// `import "path"` and friends; the path must be a string literal.
    fn parse_import(&mut self, build: fn(String) -> Expr) -> Option<Expr> {
        self.expect_peek(TokenKind::Str)?;
        Some(build(self.cur().literal.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn test_unary_binds_tighter_than_mul() {
        // -2 * 3 parses as (-2) * 3
        let Expr::Binary { op, left, .. } = parse("-2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Mul);
        assert!(matches!(
            *left,
            Expr::Unary {
                op: UnaryOp::Minus,
                ..
            }
        ));
    }

    #[test]
    fn test_index_chain() {
        // a.b[0] parses as (a.b)[0]
        let Expr::Binary { op, left, .. } = parse("a.b[0]") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Index);
        assert!(matches!(
            *left,
            Expr::Binary {
                op: BinaryOp::Index,
                ..
            }
        ));
    }

    #[test]
    fn test_slice_lowering() {
        let Expr::Apply { callee, args, .. } = parse("a[1:2]") else {
            panic!("expected apply");
        };
        let Expr::Binary { left, right, .. } = *callee else {
            panic!("expected index callee");
        };
        assert_eq!(*left, Expr::Ident("std".into()));
        assert_eq!(*right, Expr::Str("slice".into()));
        assert_eq!(args.len(), 4);
        assert_eq!(args[3].expr, Expr::Null);
    }

    #[test]
    fn test_slice_with_step() {
        let Expr::Apply { args, .. } = parse("a[::2]") else {
            panic!("expected apply");
        };
        assert_eq!(args[1].expr, Expr::Null);
        assert_eq!(args[2].expr, Expr::Null);
        assert!(matches!(args[3].expr, Expr::Number(Number::Int(2))));
    }

    #[test]
    fn test_degenerate_slice() {
        assert_eq!(parse("a[::]"), Expr::Ident("a".into()));
        assert_eq!(parse("a[:]"), Expr::Ident("a".into()));
    }

    #[test]
    fn test_call_with_named_args() {
        let Expr::Apply {
            args, tailstrict, ..
        } = parse("f(1, x=2)")
        else {
            panic!("expected apply");
        };
        assert!(!tailstrict);
        assert_eq!(args[0].name, None);
        assert_eq!(args[1].name.as_deref(), Some("x"));
    }

    #[test]
    fn test_tailstrict() {
        let Expr::Apply { tailstrict, .. } = parse("f(x) tailstrict") else {
            panic!("expected apply");
        };
        assert!(tailstrict);
    }

    #[test]
    fn test_positional_after_named_rejected() {
        parse_fails("f(x=1, 2)");
    }

    #[test]
    fn test_local_function_sugar() {
        let Expr::Local { binds, .. } = parse("local inc(x, d=1) = x + d; inc(2)") else {
            panic!("expected local");
        };
        let Expr::Function(FnDef { params, .. }) = &binds[0].expr else {
            panic!("expected function bind");
        };
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "x");
        assert!(params[1].default.is_some());
    }

    #[test]
    fn test_multi_binds() {
        let Expr::Local { binds, .. } = parse("local a = 1, b = a; b") else {
            panic!("expected local");
        };
        assert_eq!(binds.len(), 2);
    }

    #[test]
    fn test_if_without_else() {
        let Expr::If { else_branch, .. } = parse("if x then 1") else {
            panic!("expected if");
        };
        assert!(else_branch.is_none());
    }

    #[test]
    fn test_assert_expression() {
        let Expr::Assert { assert, body } = parse("assert x > 0 : 'bad'; x") else {
            panic!("expected assert");
        };
        assert!(assert.message.is_some());
        assert_eq!(*body, Expr::Ident("x".into()));
    }

    #[test]
    fn test_error_expression() {
        assert!(matches!(parse("error 'boom'"), Expr::Error(_)));
    }

    #[test]
    fn test_super_requires_access() {
        parse_fails("super");
    }

    #[test]
    fn test_super_field() {
        let Expr::Binary { op, left, right } = parse("super.name") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Index);
        assert_eq!(*left, Expr::Super);
        assert_eq!(*right, Expr::Str("name".into()));
    }

    #[test]
    fn test_in_super() {
        let Expr::Binary { op, right, .. } = parse("'k' in super") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::In);
        assert_eq!(*right, Expr::Super);
    }

    #[test]
    fn test_imports() {
        assert_eq!(
            parse("import 'lib.jsonnet'"),
            Expr::Import("lib.jsonnet".into())
        );
        assert_eq!(
            parse("importstr 'data.txt'"),
            Expr::Importstr("data.txt".into())
        );
        assert_eq!(
            parse("importbin 'blob.bin'"),
            Expr::Importbin("blob.bin".into())
        );
    }

    #[test]
    fn test_apply_brace() {
        let Expr::ApplyBrace { left, right } = parse("base { a: 1 }") else {
            panic!("expected apply brace");
        };
        assert_eq!(*left, Expr::Ident("base".into()));
        assert!(matches!(*right, Expr::Object(_)));
    }

    #[test]
    fn test_function_literal() {
        let Expr::Function(FnDef { params, .. }) = parse("function(a, b=2) a + b") else {
            panic!("expected function");
        };
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_huge_int_degrades_to_float() {
        let Expr::Number(n) = parse("99999999999999999999") else {
            panic!("expected number");
        };
        assert!(matches!(n, Number::Float(_)));
    }
}
