//! rsonnet-eval - The lazy Jsonnet evaluator.
//!
//! Evaluation walks the AST under a lexical [`Context`] and produces
//! [`Value`]s. Laziness is carried by [`Thunk`]s: identifiers, field
//! accesses, and function arguments stay deferred until an operator, a
//! condition, or final manifestation forces them.
//!
//! The evaluator is strictly single-threaded. The only external effect is
//! the synchronous file read performed by `import`; everything else is
//! pure. A configurable depth guard bounds recursion in place of a real
//! call stack limit.

pub mod context;
pub mod error;
pub mod format;
pub mod manifest;
pub mod stdlib;
pub mod thunk;
pub mod value;

mod import;
mod object;
mod ops;


use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use rsonnet_par::ast::{Arg, Expr, FnDef};
use rsonnet_util::FxHashMap;

use context::Context;
use error::{eval_err, EvalError, EvalResult};
use thunk::Thunk;
use value::{Builtin, FuncValue, ParamSpec, Value};

/// A host callback reachable through `std.native`. Values cross the
/// boundary as JSON.
pub type NativeCallback = Rc<dyn Fn(&[serde_json::Value]) -> Result<serde_json::Value, String>>;

/// Default recursion limit, counted in nested `eval` entries.
pub const DEFAULT_MAX_DEPTH: usize = 500;

/// The Jsonnet evaluator.
///
/// One evaluator corresponds to one top-level invocation: it owns the
/// external-variable and native-callback registries, the import cache,
/// and the recursion guard.
///
/// # Example
///
/// ```
/// use rsonnet_eval::Evaluator;
/// use rsonnet_lex::Lexer;
/// use rsonnet_par::Parser;
///
/// let mut parser = Parser::new(Lexer::new("1 + 2 * 3"));
/// let ast = parser.parse().unwrap();
/// let ev = Evaluator::new();
/// let value = ev.evaluate(&ast).unwrap();
/// assert_eq!(value.as_num("result").unwrap(), 7.0);
/// ```
pub struct Evaluator {
    ext_vars: FxHashMap<String, String>,
    native: FxHashMap<String, NativeCallback>,
    max_depth: usize,
    depth: Cell<usize>,
    import_cache: RefCell<FxHashMap<PathBuf, Value>>,
    file_stack: RefCell<Vec<PathBuf>>,
}

impl Evaluator {
    /// Creates an evaluator with no external variables or callbacks.
    pub fn new() -> Self {
        Self {
            ext_vars: FxHashMap::default(),
            native: FxHashMap::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            depth: Cell::new(0),
            import_cache: RefCell::new(FxHashMap::default()),
            file_stack: RefCell::new(Vec::new()),
        }
    }

    /// Registers an external string variable for `std.extVar`.
    pub fn add_ext_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.ext_vars.insert(name.into(), value.into());
    }

    /// Registers a native callback for `std.native`.
    pub fn add_native(&mut self, name: impl Into<String>, cb: NativeCallback) {
        self.native.insert(name.into(), cb);
    }

    /// Replaces the recursion limit.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Evaluates a parsed program with no associated file.
    pub fn evaluate(&self, expr: &Expr) -> EvalResult<Value> {
        let ctx = self.root_context();
        self.eval(expr, &ctx)
    }

    /// Evaluates a parsed program read from `file`; relative imports
    /// resolve against the file's directory and `std.thisFile` names it.
    pub fn evaluate_in_file(&self, expr: &Expr, file: PathBuf) -> EvalResult<Value> {
        self.file_stack.borrow_mut().push(file);
        let result = self.evaluate(expr);
        self.file_stack.borrow_mut().pop();
        result
    }

    /// The file currently being evaluated, if any.
    pub(crate) fn current_file(&self) -> Option<PathBuf> {
        self.file_stack.borrow().last().cloned()
    }

    /// A fresh root context with `std` bound for the current file.
    fn root_context(&self) -> Context {
        let ctx = Context::new();
        let std_obj = stdlib::build(self.current_file().as_deref());
        ctx.bind(Rc::from("std"), Thunk::done(Value::Obj(std_obj)));
        ctx
    }

    /// Evaluates one expression under the given context.
    ///
    /// # Errors
    ///
    /// Any runtime failure, including "Max stack frames exceeded." when
    /// the depth guard trips.
    pub fn eval(&self, expr: &Expr, ctx: &Context) -> EvalResult<Value> {
        let depth = self.depth.get() + 1;
        if depth > self.max_depth {
            return Err(EvalError::new("Max stack frames exceeded."));
        }
        self.depth.set(depth);
        let result = self.eval_inner(expr, ctx);
        self.depth.set(self.depth.get() - 1);
        result
    }

    fn eval_inner(&self, expr: &Expr, ctx: &Context) -> EvalResult<Value> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::True => Ok(Value::Bool(true)),
            Expr::False => Ok(Value::Bool(false)),
            Expr::Number(n) => Ok(Value::Num(n.as_f64())),
            Expr::Str(s) => Ok(Value::str(s)),

            Expr::Ident(name) => match ctx.lookup(name) {
                Some(thunk) => thunk.force(self),
                None => Err(EvalError::new(format!("Unknown variable: {name}"))),
            },

            Expr::SelfRef => match ctx.this() {
                Some(obj) => Ok(Value::Obj(obj.clone())),
                None => Err(EvalError::new("Can't use self outside of an object.")),
            },

            Expr::Dollar => match ctx.dollar() {
                Some(obj) => Ok(Value::Obj(obj.clone())),
                None => Err(EvalError::new("No top-level object found.")),
            },

            Expr::Super => Err(EvalError::new(
                "Attempt to use super when there is no super class.",
            )),

            Expr::Array(elements) => {
                let thunks = elements
                    .iter()
                    .map(|e| Thunk::pending(Rc::new(e.clone()), ctx.clone()))
                    .collect();
                Ok(Value::Arr(Rc::new(thunks)))
            }

            Expr::ArrayComp {
                expr,
                forspec,
                compspecs,
            } => self.eval_array_comp(expr, forspec, compspecs, ctx),

            Expr::Object(members) => self.eval_object(members, ctx),

            Expr::ObjectComp {
                locals,
                key,
                value,
                forspec,
                compspecs,
            } => self.eval_object_comp(locals, key, value, forspec, compspecs, ctx),

            Expr::Unary { op, operand } => self.eval_unary(*op, operand, ctx),

            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right, ctx),

            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.eval(cond, ctx)?;
                let Value::Bool(cond) = cond else {
                    eval_err!("Condition must be a boolean, not {}", cond.type_name());
                };
                if cond {
                    self.eval(then_branch, ctx)
                } else {
                    match else_branch {
                        Some(else_branch) => self.eval(else_branch, ctx),
                        None => Ok(Value::Null),
                    }
                }
            }

            Expr::Local { binds, body } => {
                let ctx = ctx.child();
                for bind in binds {
                    ctx.bind(
                        Rc::from(bind.name.as_str()),
                        Thunk::pending(Rc::new(bind.expr.clone()), ctx.clone()),
                    );
                }
                self.eval(body, &ctx)
            }

            Expr::Function(def) => Ok(self.make_closure(def, ctx)),

            Expr::Apply {
                callee,
                args,
                tailstrict,
            } => self.eval_apply(callee, args, *tailstrict, ctx),

            Expr::ApplyBrace { left, right } => self.eval_apply_brace(left, right, ctx),

            Expr::Error(inner) => {
                let value = self.eval(inner, ctx)?;
                Err(EvalError::new(manifest::value_to_string(self, &value)?))
            }

            Expr::Assert { assert, body } => {
                self.check_assert(assert, ctx, "Assertion failed")?;
                self.eval(body, ctx)
            }

            Expr::Import(path) => self.eval_import(path),
            Expr::Importstr(path) => self.eval_importstr(path),
            Expr::Importbin(path) => self.eval_importbin(path),
        }
    }

    /// Builds a closure value from a function literal.
    fn make_closure(&self, def: &FnDef, ctx: &Context) -> Value {
        Value::Func(Rc::new(FuncValue::User {
            params: ParamSpec::from_ast(&def.params),
            body: Rc::new((*def.body).clone()),
            ctx: ctx.clone(),
        }))
    }

    /// Forces an `assert` condition, raising its message on failure.
    pub(crate) fn check_assert(
        &self,
        assert: &rsonnet_par::ast::AssertSpec,
        ctx: &Context,
        default_message: &str,
    ) -> EvalResult<()> {
        let cond = self.eval(&assert.cond, ctx)?;
        let Value::Bool(cond) = cond else {
            eval_err!(
                "Assert condition must be a boolean, not {}",
                cond.type_name()
            );
        };
        if cond {
            return Ok(());
        }
        let message = match &assert.message {
            Some(message) => {
                let value = self.eval(message, ctx)?;
                manifest::value_to_string(self, &value)?
            }
            None => default_message.to_string(),
        };
        Err(EvalError::new(message))
    }

    // =========================================================================
    // Function application
    // =========================================================================

    /// Evaluates `callee(args…)`.
    fn eval_apply(
        &self,
        callee: &Expr,
        args: &[Arg],
        tailstrict: bool,
        ctx: &Context,
    ) -> EvalResult<Value> {
        let callee = self.eval(callee, ctx)?;
        let Value::Func(func) = &callee else {
            eval_err!("Cannot call {}", callee.type_name());
        };

        // Arguments are thunks unless tailstrict forces them up front.
        let mut arg_thunks = Vec::with_capacity(args.len());
        for arg in args {
            let thunk = if tailstrict {
                Thunk::done(self.eval(&arg.expr, ctx)?)
            } else {
                Thunk::pending(Rc::new(arg.expr.clone()), ctx.clone())
            };
            arg_thunks.push((arg.name.as_deref(), thunk));
        }

        self.apply(func, &arg_thunks)
    }

    /// Applies a function value to already-wrapped arguments.
    pub(crate) fn apply(
        &self,
        func: &FuncValue,
        args: &[(Option<&str>, Thunk)],
    ) -> EvalResult<Value> {
        match func {
            FuncValue::User { params, body, ctx } => {
                let call_ctx = ctx.child();
                self.bind_args(
                    "function",
                    params,
                    args,
                    &call_ctx,
                    |name, default, call_ctx| match default {
                        Some(default) => Ok(Thunk::pending(default.clone(), call_ctx.clone())),
                        None => Err(EvalError::new(format!("Missing argument: {name}"))),
                    },
                )?;
                self.eval(body, &call_ctx)
            }
            FuncValue::Builtin(builtin) => {
                let thunks = self.bind_builtin_args(builtin, args)?;
                (builtin.f)(self, &thunks)
            }
            FuncValue::Native { name, cb } => {
                let mut json_args = Vec::with_capacity(args.len());
                for (arg_name, thunk) in args {
                    if arg_name.is_some() {
                        eval_err!("Native function {name} takes positional arguments only");
                    }
                    let value = thunk.force(self)?;
                    json_args.push(manifest::to_json(self, &value)?);
                }
                match cb(&json_args) {
                    Ok(json) => Ok(manifest::json_to_value(&json)),
                    Err(message) => Err(EvalError::new(message)),
                }
            }
        }
    }

    /// Calls a function with positional arguments; used by builtins that
    /// take functions (`std.map` and friends).
    pub(crate) fn call_function(&self, func: &Value, args: Vec<Thunk>) -> EvalResult<Value> {
        let Value::Func(func) = func else {
            eval_err!("Cannot call {}", func.type_name());
        };
        let args: Vec<(Option<&str>, Thunk)> = args.into_iter().map(|t| (None, t)).collect();
        self.apply(func, &args)
    }

    /// Binds call arguments to parameter names: positionals in order,
    /// then named ones, then defaults via `fill`.
    fn bind_args(
        &self,
        what: &str,
        params: &[ParamSpec],
        args: &[(Option<&str>, Thunk)],
        call_ctx: &Context,
        fill: impl Fn(&str, Option<&Rc<Expr>>, &Context) -> EvalResult<Thunk>,
    ) -> EvalResult<()> {
        let mut bound: Vec<Option<Thunk>> = vec![None; params.len()];

        let mut positional = 0usize;
        for (name, thunk) in args {
            match name {
                None => {
                    if positional >= params.len() {
                        eval_err!("Too many arguments, {what} expects {}", params.len());
                    }
                    bound[positional] = Some(thunk.clone());
                    positional += 1;
                }
                Some(name) => {
                    let Some(index) = params.iter().position(|p| p.name.as_ref() == *name) else {
                        eval_err!("Unknown named argument: {name}");
                    };
                    if bound[index].is_some() {
                        eval_err!("Duplicate argument: {name}");
                    }
                    bound[index] = Some(thunk.clone());
                }
            }
        }

        for (param, slot) in params.iter().zip(bound) {
            let thunk = match slot {
                Some(thunk) => thunk,
                None => fill(&param.name, param.default.as_ref(), call_ctx)?,
            };
            call_ctx.bind(param.name.clone(), thunk);
        }
        Ok(())
    }

    /// Binds builtin arguments into one thunk per declared parameter.
    fn bind_builtin_args(
        &self,
        builtin: &Builtin,
        args: &[(Option<&str>, Thunk)],
    ) -> EvalResult<Vec<Thunk>> {
        let params = builtin.params;
        let mut bound: Vec<Option<Thunk>> = vec![None; params.len()];

        let mut positional = 0usize;
        for (name, thunk) in args {
            match name {
                None => {
                    if positional >= params.len() {
                        eval_err!(
                            "Too many arguments, std.{} expects {}",
                            builtin.name,
                            params.len()
                        );
                    }
                    bound[positional] = Some(thunk.clone());
                    positional += 1;
                }
                Some(name) => {
                    let Some(index) = params.iter().position(|p| p == name) else {
                        eval_err!("std.{} has no parameter {name}", builtin.name);
                    };
                    if bound[index].is_some() {
                        eval_err!("Duplicate argument: {name}");
                    }
                    bound[index] = Some(thunk.clone());
                }
            }
        }

        let required = params.len() - builtin.defaults.len();
        let mut thunks = Vec::with_capacity(params.len());
        for (index, slot) in bound.into_iter().enumerate() {
            match slot {
                Some(thunk) => thunks.push(thunk),
                None if index >= required => {
                    let default = builtin.defaults[index - required].clone();
                    thunks.push(Thunk::done(default));
                }
                None => {
                    eval_err!("Missing argument: {} to std.{}", params[index], builtin.name)
                }
            }
        }
        Ok(thunks)
    }

    /// Looks up an external variable (`std.extVar`).
    pub(crate) fn ext_var(&self, name: &str) -> EvalResult<Value> {
        match self.ext_vars.get(name) {
            Some(value) => Ok(Value::str(value)),
            None => Err(EvalError::new(format!(
                "Undefined external variable: {name}"
            ))),
        }
    }

    /// Looks up a native callback (`std.native`).
    pub(crate) fn native_callback(&self, name: &str) -> EvalResult<Value> {
        match self.native.get(name) {
            Some(cb) => Ok(Value::Func(Rc::new(FuncValue::Native {
                name: name.to_string(),
                cb: cb.clone(),
            }))),
            None => Err(EvalError::new(format!("Undefined native callback: {name}"))),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
