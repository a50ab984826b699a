//! Abstract syntax tree for Jsonnet.
//!
//! Every node is immutable once built. The parser performs the standard
//! desugarings while constructing the tree, so the evaluator never sees
//! surface sugar:
//!
//! - `a.b` and `a[b]` both become [`BinaryOp::Index`] nodes;
//! - `a[s:e:t]` becomes a call to `std.slice`;
//! - `local f(x) = body` and field methods become [`Expr::Function`]
//!   values bound to plain names;
//! - `a { ... }` becomes [`Expr::ApplyBrace`].
//!
//! The tree serializes to JSON (for `--ast`) via serde.

use serde::Serialize;

/// A parsed number literal. The int/float distinction from the source
/// spelling is preserved so `1` and `1.0` manifest differently.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Number {
    /// Literal without fraction or exponent.
    Int(i64),
    /// Literal with a fraction or exponent.
    Float(f64),
}

impl Number {
    /// The numeric value as an f64.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(n) => *n as f64,
            Number::Float(f) => *f,
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Minus,
    /// `!x`
    Not,
    /// `~x`
    BitwiseNot,
}

/// Binary operators, including the lowered index operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `in`
    In,
    /// `a[b]` / `a.b` (lowered)
    Index,
}

/// Field visibility, selected by the `:` / `::` / `:::` separators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Visibility {
    /// `:` — appears in JSON output.
    Visible,
    /// `::` — suppressed in JSON output.
    Hidden,
    /// `:::` — stays visible through composition with a hidden field.
    ForceVisible,
}

/// A `name = expr` binding (in `local` or as an object-local).
///
/// `name(params) = body` is desugared before construction, so `expr` is a
/// [`Expr::Function`] in that case.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bind {
    /// Bound name.
    pub name: String,
    /// Bound expression.
    pub expr: Expr,
}

/// A function parameter with an optional default expression.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Default expression, evaluated lazily under the closure's context.
    pub default: Option<Expr>,
}

/// A function literal: parameters plus body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FnDef {
    /// Parameter list.
    pub params: Vec<Param>,
    /// Function body.
    pub body: Box<Expr>,
}

/// One call argument, positional (`name` is `None`) or named.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Arg {
    /// Argument name for `name = expr` arguments.
    pub name: Option<String>,
    /// Argument expression.
    pub expr: Expr,
}

/// A `for name in expr` clause.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForSpec {
    /// Loop variable.
    pub var: String,
    /// The iterated expression; must evaluate to an array.
    pub iterable: Box<Expr>,
}

/// A trailing comprehension clause: nested `for` or filtering `if`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum CompSpec {
    /// Nested iteration.
    For(ForSpec),
    /// Filter condition.
    If(Expr),
}

/// An `assert cond [: message]` clause, used both as an expression prefix
/// and as an object member.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssertSpec {
    /// The asserted condition.
    pub cond: Box<Expr>,
    /// Optional failure message.
    pub message: Option<Box<Expr>>,
}

/// An object field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Field {
    /// Key expression. Fixed names parse to [`Expr::Str`]; computed keys
    /// (`[expr]`) keep their expression. Must evaluate to a string, or to
    /// null to drop the field.
    pub key: Expr,
    /// True when the key was written `[expr]`.
    pub computed: bool,
    /// Field value. Methods desugar to [`Expr::Function`] here.
    pub value: Expr,
    /// The `+:` inherit bit.
    pub inherit: bool,
    /// Field visibility.
    pub visibility: Visibility,
}

/// An object literal member.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Member {
    /// A field.
    Field(Field),
    /// An object-scoped `local`.
    Local(Bind),
    /// An object-level assertion.
    Assert(AssertSpec),
}

/// A Jsonnet expression.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Expr {
    /// `null`
    Null,
    /// `true`
    True,
    /// `false`
    False,
    /// Number literal.
    Number(Number),
    /// String literal (decoded).
    Str(String),
    /// Variable reference.
    Ident(String),
    /// `self`
    SelfRef,
    /// `$`
    Dollar,
    /// `super`; only appears as the left side of an [`BinaryOp::Index`]
    /// node or the right side of [`BinaryOp::In`].
    Super,
    /// Array literal.
    Array(Vec<Expr>),
    /// Array comprehension.
    ArrayComp {
        /// The produced expression.
        expr: Box<Expr>,
        /// Leading `for` clause.
        forspec: ForSpec,
        /// Remaining `for` / `if` clauses.
        compspecs: Vec<CompSpec>,
    },
    /// Object literal.
    Object(Vec<Member>),
    /// Object comprehension. Carries exactly one computed-key field.
    ObjectComp {
        /// Object-scoped locals declared before the field.
        locals: Vec<Bind>,
        /// The computed key expression.
        key: Box<Expr>,
        /// The field value expression.
        value: Box<Expr>,
        /// Leading `for` clause.
        forspec: ForSpec,
        /// Remaining `for` / `if` clauses.
        compspecs: Vec<CompSpec>,
    },
    /// Unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// Binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// `if cond then a [else b]`; a missing else yields `null`.
    If {
        /// Condition; must evaluate to a boolean.
        cond: Box<Expr>,
        /// Then branch.
        then_branch: Box<Expr>,
        /// Optional else branch.
        else_branch: Option<Box<Expr>>,
    },
    /// `local b1, …, bn; body`.
    Local {
        /// The bindings; a group scopes recursively.
        binds: Vec<Bind>,
        /// Body expression.
        body: Box<Expr>,
    },
    /// Function literal.
    Function(FnDef),
    /// Function application.
    Apply {
        /// Callee expression.
        callee: Box<Expr>,
        /// Arguments, positional before named.
        args: Vec<Arg>,
        /// `tailstrict`: force arguments before the call.
        tailstrict: bool,
    },
    /// `left { fields… }` — composition sugar with `super` bound to
    /// `left` inside the right-hand object.
    ApplyBrace {
        /// Left operand.
        left: Box<Expr>,
        /// Right-hand object literal.
        right: Box<Expr>,
    },
    /// `error e`.
    Error(Box<Expr>),
    /// `assert cond [: message]; body`.
    Assert {
        /// The assertion.
        assert: AssertSpec,
        /// Expression evaluated when the assertion holds.
        body: Box<Expr>,
    },
    /// `import "path"`.
    Import(String),
    /// `importstr "path"`.
    Importstr(String),
    /// `importbin "path"`.
    Importbin(String),
}

impl Expr {
    /// Builds the `std.slice` lowering for `target[start:end:step]`.
    pub fn slice_call(target: Expr, start: Option<Expr>, end: Option<Expr>, step: Option<Expr>) -> Expr {
        let callee = Expr::Binary {
            op: BinaryOp::Index,
            left: Box::new(Expr::Ident("std".into())),
            right: Box::new(Expr::Str("slice".into())),
        };
        let arg = |slot: Option<Expr>| Arg {
            name: None,
            expr: slot.unwrap_or(Expr::Null),
        };
        Expr::Apply {
            callee: Box::new(callee),
            args: vec![
                Arg {
                    name: None,
                    expr: target,
                },
                arg(start),
                arg(end),
                arg(step),
            ],
            tailstrict: false,
        }
    }
}
