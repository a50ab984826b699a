//! The lazy value model.
//!
//! Values form a closed sum: null, booleans, IEEE-754 numbers, immutable
//! strings, arrays of thunks, objects, and functions. Arrays and object
//! fields hold [`Thunk`]s rather than values, which is what makes the
//! language lazy; anything that needs a concrete value forces the thunk.
//!
//! Objects are reference-counted with interior mutability so that field
//! thunks can refer back to the object they belong to (`self`, `$`)
//! while the object is still being built.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use rsonnet_par::ast::{Expr, Param};

use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::thunk::Thunk;
use crate::Evaluator;

pub use rsonnet_par::ast::Visibility;

/// A Jsonnet runtime value.
#[derive(Clone)]
pub enum Value {
    /// `null`
    Null,
    /// Booleans.
    Bool(bool),
    /// IEEE-754 double; integer-ness is recovered at manifestation.
    Num(f64),
    /// Immutable UTF-8 text.
    Str(Rc<str>),
    /// Ordered sequence of thunks; length is fixed.
    Arr(Rc<Vec<Thunk>>),
    /// An object.
    Obj(Object),
    /// A callable.
    Func(Rc<FuncValue>),
}

impl Value {
    /// Builds a string value.
    pub fn str(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    /// The `std.type` name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Arr(_) => "array",
            Value::Obj(_) => "object",
            Value::Func(_) => "function",
        }
    }

    /// Extracts a number, or raises a type error naming `what`.
    pub fn as_num(&self, what: &str) -> EvalResult<f64> {
        match self {
            Value::Num(n) => Ok(*n),
            other => Err(EvalError::new(format!(
                "{what} must be a number, not {}",
                other.type_name()
            ))),
        }
    }

    /// Extracts a boolean, or raises a type error naming `what`.
    pub fn as_bool(&self, what: &str) -> EvalResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(EvalError::new(format!(
                "{what} must be a boolean, not {}",
                other.type_name()
            ))),
        }
    }

    /// Extracts a string, or raises a type error naming `what`.
    pub fn as_str(&self, what: &str) -> EvalResult<Rc<str>> {
        match self {
            Value::Str(s) => Ok(s.clone()),
            other => Err(EvalError::new(format!(
                "{what} must be a string, not {}",
                other.type_name()
            ))),
        }
    }

    /// Extracts an array, or raises a type error naming `what`.
    pub fn as_arr(&self, what: &str) -> EvalResult<Rc<Vec<Thunk>>> {
        match self {
            Value::Arr(items) => Ok(items.clone()),
            other => Err(EvalError::new(format!(
                "{what} must be an array, not {}",
                other.type_name()
            ))),
        }
    }

    /// Extracts an object, or raises a type error naming `what`.
    pub fn as_obj(&self, what: &str) -> EvalResult<Object> {
        match self {
            Value::Obj(o) => Ok(o.clone()),
            other => Err(EvalError::new(format!(
                "{what} must be an object, not {}",
                other.type_name()
            ))),
        }
    }

    /// Extracts a number that must be an integer, for indexing and
    /// bitwise operators.
    pub fn as_int(&self, what: &str) -> EvalResult<i64> {
        let n = self.as_num(what)?;
        if n.fract() != 0.0 {
            return Err(EvalError::new(format!("{what} must be an integer, got {n}")));
        }
        Ok(n as i64)
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Arr(items) => write!(f, "<array[{}]>", items.len()),
            Value::Obj(o) => write!(f, "<object[{}]>", o.len()),
            Value::Func(_) => write!(f, "<function>"),
        }
    }
}

/// One object field: its deferred value, the `+:` bit, and visibility.
#[derive(Clone)]
pub struct ObjField {
    /// The field value, forced on access.
    pub thunk: Thunk,
    /// True for fields declared with `+:`.
    pub inherit: bool,
    /// Visibility flag.
    pub visibility: Visibility,
}

impl ObjField {
    /// A plain visible field holding an already-computed value.
    pub fn visible(value: Value) -> Self {
        Self {
            thunk: Thunk::done(value),
            inherit: false,
            visibility: Visibility::Visible,
        }
    }

    /// A hidden field holding an already-computed value.
    pub fn hidden(value: Value) -> Self {
        Self {
            thunk: Thunk::done(value),
            inherit: false,
            visibility: Visibility::Hidden,
        }
    }
}

/// An object value: an insertion-ordered map from field name to field.
///
/// The interior [`RefCell`] exists so the object can be created empty,
/// installed as `self` in a context, and only then populated; field
/// thunks capture that context and see the finished object when forced.
#[derive(Clone)]
pub struct Object(Rc<RefCell<IndexMap<Rc<str>, ObjField>>>);

impl Object {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(IndexMap::new())))
    }

    /// Creates an object from already-built fields.
    pub fn from_fields(fields: IndexMap<Rc<str>, ObjField>) -> Self {
        Self(Rc::new(RefCell::new(fields)))
    }

    /// True when both handles refer to the same object.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of fields, hidden ones included.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// True when the object has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// True when the object has the field, hidden ones included.
    pub fn has(&self, name: &str) -> bool {
        self.0.borrow().contains_key(name)
    }

    /// True when the object has the field and it is not hidden.
    pub fn has_visible(&self, name: &str) -> bool {
        self.0
            .borrow()
            .get(name)
            .is_some_and(|f| f.visibility != Visibility::Hidden)
    }

    /// Returns a field by name.
    pub fn get(&self, name: &str) -> Option<ObjField> {
        self.0.borrow().get(name).cloned()
    }

    /// Inserts a field, replacing any previous one with the same name.
    pub fn insert(&self, name: Rc<str>, field: ObjField) {
        self.0.borrow_mut().insert(name, field);
    }

    /// Field names in insertion order. `include_hidden` selects whether
    /// hidden fields are reported.
    pub fn field_names(&self, include_hidden: bool) -> Vec<Rc<str>> {
        self.0
            .borrow()
            .iter()
            .filter(|(_, f)| include_hidden || f.visibility != Visibility::Hidden)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Field names sorted lexicographically by Unicode code point.
    pub fn sorted_field_names(&self, include_hidden: bool) -> Vec<Rc<str>> {
        let mut names = self.field_names(include_hidden);
        names.sort();
        names
    }

    /// All `(name, field)` pairs in insertion order.
    pub fn fields(&self) -> Vec<(Rc<str>, ObjField)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, f)| (k.clone(), f.clone()))
            .collect()
    }

    /// Forces and returns the value of a field.
    pub fn field_value(&self, ev: &Evaluator, name: &str) -> EvalResult<Value> {
        match self.get(name) {
            Some(field) => field.thunk.force(ev),
            None => Err(EvalError::new(format!("Field does not exist: {name}"))),
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

/// A function parameter: name plus optional lazy default.
pub struct ParamSpec {
    /// Parameter name.
    pub name: Rc<str>,
    /// Default expression, shared with the defining AST.
    pub default: Option<Rc<Expr>>,
}

impl ParamSpec {
    /// Converts parser parameters into runtime specs.
    pub fn from_ast(params: &[Param]) -> Vec<ParamSpec> {
        params
            .iter()
            .map(|p| ParamSpec {
                name: Rc::from(p.name.as_str()),
                default: p.default.as_ref().map(|d| Rc::new(d.clone())),
            })
            .collect()
    }
}

/// Signature and implementation of a built-in function.
pub struct Builtin {
    /// Name used in error messages (`std.<name>`).
    pub name: &'static str,
    /// Parameter names; `defaults` supplies trailing optional values.
    pub params: &'static [&'static str],
    /// Default values for the trailing parameters, aligned to the end of
    /// `params`.
    pub defaults: Vec<Value>,
    /// The implementation. Receives one thunk per parameter.
    pub f: Box<dyn Fn(&Evaluator, &[Thunk]) -> EvalResult<Value>>,
}

/// A callable value.
pub enum FuncValue {
    /// A function literal closed over its defining context.
    User {
        /// Parameters in declaration order.
        params: Vec<ParamSpec>,
        /// The body, shared with the defining AST.
        body: Rc<Expr>,
        /// The captured lexical context.
        ctx: Context,
    },
    /// A standard-library builtin.
    Builtin(Builtin),
    /// A host callback registered through `std.native`. Accepts any
    /// number of positional arguments.
    Native {
        /// Registration name.
        name: String,
        /// The callback; values cross the boundary as JSON.
        cb: crate::NativeCallback,
    },
}
