//! rsonnet-par - Pratt parser for Jsonnet.
//!
//! The parser holds the current and peek tokens, pulls from the lexer on
//! demand, and accumulates diagnostic strings instead of failing fast. A
//! parse is successful when [`Parser::parse`] returns `Some` AND
//! [`Parser::errors`] is empty; no partial tree is produced on failure.
//!
//! Expression parsing is precedence-climbing with the binding order
//! (lowest to highest): `||`, `&&`, `|`, `^`, `&`, equality, comparison
//! (including `in`), shifts, additive, multiplicative, unary, and finally
//! postfix index/call/brace application.

pub mod ast;

mod expr;
mod obj;

#[cfg(test)]
mod edge_cases;

pub use ast::Expr;

use rsonnet_lex::{Lexer, Token, TokenKind};
use rsonnet_util::{Handler, Span};

/// Operator precedence levels, lowest binds loosest.
///
/// The discriminant order is the comparison order used by the Pratt loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub(crate) enum Precedence {
    Lowest,
    /// `||`
    Or,
    /// `&&`
    And,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&`
    BitAnd,
    /// `==` `!=`
    Equality,
    /// `<` `<=` `>` `>=` `in`
    Comparison,
    /// `<<` `>>`
    Shift,
    /// `+` `-`
    Additive,
    /// `*` `/` `%`
    Multiplicative,
    /// Prefix `+` `-` `!` `~`
    Unary,
    /// `.` `[` `(` `{`
    Index,
}

/// Binding power of a token in infix position.
pub(crate) fn binary_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::OrOr => Precedence::Or,
        TokenKind::AndAnd => Precedence::And,
        TokenKind::Pipe => Precedence::BitOr,
        TokenKind::Caret => Precedence::BitXor,
        TokenKind::Amp => Precedence::BitAnd,
        TokenKind::EqEq | TokenKind::NotEq => Precedence::Equality,
        TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge | TokenKind::In => {
            Precedence::Comparison
        }
        TokenKind::Shl | TokenKind::Shr => Precedence::Shift,
        TokenKind::Plus | TokenKind::Minus => Precedence::Additive,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Multiplicative,
        TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen | TokenKind::LBrace => {
            Precedence::Index
        }
        _ => Precedence::Lowest,
    }
}

/// The Jsonnet parser.
///
/// # Example
///
/// ```
/// use rsonnet_lex::Lexer;
/// use rsonnet_par::Parser;
///
/// let mut parser = Parser::new(Lexer::new("1 + 2 * 3"));
/// let expr = parser.parse();
/// assert!(expr.is_some());
/// assert!(parser.errors().is_empty());
/// ```
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur_token: Token,
    peek_token: Token,
    handler: Handler,
}

impl<'a> Parser<'a> {
    /// Creates a parser over the given lexer.
    pub fn new(lexer: Lexer<'a>) -> Self {
        let mut parser = Self {
            lexer,
            cur_token: Token::eof(Span::DUMMY),
            peek_token: Token::eof(Span::DUMMY),
            handler: Handler::new(),
        };
        // Fill cur and peek.
        parser.next_token();
        parser.next_token();
        parser
    }

    /// Parses one complete Jsonnet expression.
    ///
    /// Returns `None` on any syntax error; the messages are available via
    /// [`Parser::errors`]. Trailing tokens after the expression are also a
    /// syntax error.
    pub fn parse(&mut self) -> Option<Expr> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.peek_is(TokenKind::Eof) {
            self.error_at_peek("unexpected token after expression");
            return None;
        }
        if self.handler.has_errors() {
            None
        } else {
            Some(expr)
        }
    }

    /// The accumulated syntax error messages, in source order.
    pub fn errors(&self) -> Vec<String> {
        self.handler.error_messages()
    }

    // =========================================================================
    // Token plumbing
    // =========================================================================

    /// Shifts the token window: peek becomes current.
    ///
    /// A lexer error is recorded once and the stream is then pinned at
    /// `Eof`, which unwinds any parse in progress.
    pub(crate) fn next_token(&mut self) {
        let next = match self.lexer.next_token() {
            Ok(token) => token,
            Err(err) => {
                // The lexer's message already carries its position.
                self.handler.error(err.to_string(), Span::DUMMY);
                Token::eof(self.cur_token.span)
            }
        };
        self.cur_token = std::mem::replace(&mut self.peek_token, next);
    }

    pub(crate) fn cur(&self) -> &Token {
        &self.cur_token
    }

    pub(crate) fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur_token.kind == kind
    }

    pub(crate) fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek_token.kind == kind
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek_token.kind
    }

    /// Advances when the peek token matches, records an error otherwise.
    pub(crate) fn expect_peek(&mut self, kind: TokenKind) -> Option<()> {
        if self.peek_is(kind) {
            self.next_token();
            Some(())
        } else {
            self.handler.error(
                format!(
                    "expected {}, got {}",
                    kind.describe(),
                    self.peek_token.kind.describe()
                ),
                self.peek_token.span,
            );
            None
        }
    }

    /// Records an error pointing at the current token.
    pub(crate) fn error_at_cur(&mut self, message: impl Into<String>) {
        self.handler.error(message, self.cur_token.span);
    }

    /// Records an error pointing at the peek token.
    pub(crate) fn error_at_peek(&mut self, message: impl Into<String>) {
        self.handler.error(message, self.peek_token.span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Number};

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

    fn parse_err(source: &str) -> Vec<String> {
        let mut parser = Parser::new(Lexer::new(source));
        let expr = parser.parse();
        assert!(expr.is_none(), "expected parse failure for {source:?}");
        assert!(!parser.errors().is_empty());
        parser.errors()
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse("null"), Expr::Null);
        assert_eq!(parse("true"), Expr::True);
        assert_eq!(parse("false"), Expr::False);
        assert_eq!(parse("42"), Expr::Number(Number::Int(42)));
        assert_eq!(parse("4.5"), Expr::Number(Number::Float(4.5)));
        assert_eq!(parse("1e3"), Expr::Number(Number::Float(1000.0)));
        assert_eq!(parse("'hi'"), Expr::Str("hi".into()));
    }

    #[test]
    fn test_precedence_mul_over_add() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let Expr::Binary { op, left, right } = parse("1 + 2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert_eq!(*left, Expr::Number(Number::Int(1)));
        assert!(matches!(
            *right,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_precedence_and_over_or() {
        // a && b || c parses as (a && b) || c
        let Expr::Binary { op, left, .. } = parse("a && b || c") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(
            *left,
            Expr::Binary {
                op: BinaryOp::And,
                ..
            }
        ));
    }

    #[test]
    fn test_left_associativity() {
        // 1 - 2 - 3 parses as (1 - 2) - 3
        let Expr::Binary { op, left, right } = parse("1 - 2 - 3") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Sub);
        assert_eq!(*right, Expr::Number(Number::Int(3)));
        assert!(matches!(
            *left,
            Expr::Binary {
                op: BinaryOp::Sub,
                ..
            }
        ));
    }

    #[test]
    fn test_grouping() {
        // (1 + 2) * 3
        let Expr::Binary { op, left, .. } = parse("(1 + 2) * 3") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Mul);
        assert!(matches!(
            *left,
            Expr::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn test_dot_lowering() {
        let Expr::Binary { op, left, right } = parse("a.b") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Index);
        assert_eq!(*left, Expr::Ident("a".into()));
        assert_eq!(*right, Expr::Str("b".into()));
    }

    #[test]
    fn test_comparison_in() {
        let Expr::Binary { op, .. } = parse("\"k\" in o") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::In);
    }

    #[test]
    fn test_syntax_error_reports() {
        let errors = parse_err("{a:}");
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        parse_err("1 2");
    }

    #[test]
    fn test_error_recovers_no_partial_ast() {
        let mut parser = Parser::new(Lexer::new("local x = ; x"));
        assert!(parser.parse().is_none());
        assert!(!parser.errors().is_empty());
    }
}
