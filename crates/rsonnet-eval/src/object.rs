//! Object construction, composition, and comprehensions.
//!
//! An object literal is built in three passes: locals become lazy
//! bindings in a context that already carries `self`/`$`, fields are
//! keyed (forced) and their values deferred, and finally object-level
//! asserts are checked. Composition (`+`, `{…}` sugar) merges field maps
//! and rebinds `super` in the right-hand side's deferred field bodies so
//! that inheritance resolves against the left-hand object.

use std::rc::Rc;

use rsonnet_par::ast::{Bind, CompSpec, Expr, ForSpec, Member, Visibility};

use crate::context::Context;
use crate::error::{eval_err, EvalResult};
use crate::thunk::Thunk;
use crate::value::{ObjField, Object, Value};
use crate::Evaluator;

impl Evaluator {
    /// Evaluates an object literal.
    pub(crate) fn eval_object(&self, members: &[Member], ctx: &Context) -> EvalResult<Value> {
        let obj = Object::new();
        let ctx = ctx.child().with_this(obj.clone());

        // Locals first: they are visible to keys, values, and asserts,
        // and may refer to each other and to self.
        for member in members {
            if let Member::Local(bind) = member {
                ctx.bind(
                    Rc::from(bind.name.as_str()),
                    Thunk::pending(Rc::new(bind.expr.clone()), ctx.clone()),
                );
            }
        }

        for member in members {
            if let Member::Field(field) = member {
                let key = self.eval(&field.key, &ctx)?;
                let key = match key {
                    Value::Null => continue,
                    Value::Str(key) => key,
                    other => eval_err!("Field name must be a string, not {}", other.type_name()),
                };
                if obj.has(&key) {
                    eval_err!("Duplicate field: {key}");
                }
                obj.insert(
                    key,
                    ObjField {
                        thunk: Thunk::pending(Rc::new(field.value.clone()), ctx.clone()),
                        inherit: field.inherit,
                        visibility: field.visibility,
                    },
                );
            }
        }

        // Asserts run once every field is in place, so conditions can
        // read self.
        for member in members {
            if let Member::Assert(assert) = member {
                self.check_assert(assert, &ctx, "Object assertion failed")?;
            }
        }

        Ok(Value::Obj(obj))
    }

    /// Evaluates `left { … }`: the right-hand literal sees `super = left`
    /// and the two objects compose.
    pub(crate) fn eval_apply_brace(
        &self,
        left: &Expr,
        right: &Expr,
        ctx: &Context,
    ) -> EvalResult<Value> {
        let left = self.eval(left, ctx)?;
        let Value::Obj(left) = left else {
            eval_err!(
                "Unsupported operand types for +: {} and object",
                left.type_name()
            );
        };
        let rctx = ctx.with_super(Some(left.clone()));
        let right = self.eval(right, &rctx)?;
        let Value::Obj(right) = right else {
            unreachable!("brace application right side is an object literal");
        };
        Ok(Value::Obj(self.compose_objects(&left, &right)))
    }

    /// Composes two objects: the union of fields with right-side
    /// overrides.
    ///
    /// Every right-hand field that is still deferred gets `super`
    /// rebound to `left`, which is what makes `super.x` in overrides
    /// resolve against the base object — and, through the recursive
    /// composition performed by `+:` fields, what makes `super` descend
    /// into nested objects.
    pub(crate) fn compose_objects(&self, left: &Object, right: &Object) -> Object {
        let result = Object::new();

        for (name, lf) in left.fields() {
            match right.get(&name) {
                None => result.insert(name, lf),
                Some(rf) => {
                    let rebound = rf.thunk.rebind_super(left.clone());
                    let thunk = if rf.inherit {
                        Thunk::pending_add(lf.thunk.clone(), rebound)
                    } else {
                        rebound
                    };
                    result.insert(
                        name,
                        ObjField {
                            thunk,
                            // The +: bit survives composition only when
                            // both sides carry it.
                            inherit: lf.inherit && rf.inherit,
                            visibility: merge_visibility(lf.visibility, rf.visibility),
                        },
                    );
                }
            }
        }

        for (name, rf) in right.fields() {
            if left.has(&name) {
                continue;
            }
            result.insert(
                name,
                ObjField {
                    thunk: rf.thunk.rebind_super(left.clone()),
                    inherit: rf.inherit,
                    visibility: rf.visibility,
                },
            );
        }

        result
    }

    /// Evaluates an array comprehension.
    pub(crate) fn eval_array_comp(
        &self,
        expr: &Expr,
        forspec: &ForSpec,
        compspecs: &[CompSpec],
        ctx: &Context,
    ) -> EvalResult<Value> {
        let specs = full_specs(forspec, compspecs);
        let expr = Rc::new(expr.clone());
        let mut thunks = Vec::new();
        self.run_comp(&specs, ctx, &mut |ictx| {
            thunks.push(Thunk::pending(expr.clone(), ictx.clone()));
            Ok(())
        })?;
        Ok(Value::Arr(Rc::new(thunks)))
    }

    /// Evaluates an object comprehension.
    pub(crate) fn eval_object_comp(
        &self,
        locals: &[Bind],
        key: &Expr,
        value: &Expr,
        forspec: &ForSpec,
        compspecs: &[CompSpec],
        ctx: &Context,
    ) -> EvalResult<Value> {
        let obj = Object::new();
        let ctx = ctx.child().with_this(obj.clone());

        let specs = full_specs(forspec, compspecs);
        let value = Rc::new(value.clone());

        self.run_comp(&specs, &ctx, &mut |ictx| {
            // Comprehension locals are installed per iteration so they
            // can use the loop variables.
            let fctx = ictx.child();
            for bind in locals {
                fctx.bind(
                    Rc::from(bind.name.as_str()),
                    Thunk::pending(Rc::new(bind.expr.clone()), fctx.clone()),
                );
            }
            let field_key = self.eval(key, &fctx)?;
            let field_key = match field_key {
                Value::Null => return Ok(()),
                Value::Str(k) => k,
                other => eval_err!("Field name must be a string, not {}", other.type_name()),
            };
            if obj.has(&field_key) {
                eval_err!("Duplicate field name: {field_key}");
            }
            obj.insert(
                field_key,
                ObjField {
                    thunk: Thunk::pending(value.clone(), fctx.clone()),
                    inherit: false,
                    visibility: Visibility::Visible,
                },
            );
            Ok(())
        })?;

        Ok(Value::Obj(obj))
    }

    /// Runs a comprehension clause list, calling `emit` once per binding
    /// combination that survives the filters.
    fn run_comp(
        &self,
        specs: &[CompSpec],
        ctx: &Context,
        emit: &mut dyn FnMut(&Context) -> EvalResult<()>,
    ) -> EvalResult<()> {
        let Some((first, rest)) = specs.split_first() else {
            return emit(ctx);
        };
        match first {
            CompSpec::For(forspec) => {
                let iterable = self.eval(&forspec.iterable, ctx)?;
                let Value::Arr(items) = iterable else {
                    eval_err!(
                        "Unexpected type {}, expected array",
                        iterable.type_name()
                    );
                };
                for item in items.iter() {
                    let cctx = ctx.child();
                    cctx.bind(Rc::from(forspec.var.as_str()), item.clone());
                    self.run_comp(rest, &cctx, emit)?;
                }
                Ok(())
            }
            CompSpec::If(cond) => {
                let cond = self.eval(cond, ctx)?;
                let Value::Bool(cond) = cond else {
                    eval_err!(
                        "Unexpected type {}, expected boolean",
                        cond.type_name()
                    );
                };
                if cond {
                    self.run_comp(rest, ctx, emit)?;
                }
                Ok(())
            }
        }
    }

}

/// Prepends the leading for-clause to the trailing clauses.
fn full_specs(forspec: &ForSpec, compspecs: &[CompSpec]) -> Vec<CompSpec> {
    let mut specs = Vec::with_capacity(compspecs.len() + 1);
    specs.push(CompSpec::For(forspec.clone()));
    specs.extend(compspecs.iter().cloned());
    specs
}

/// Visibility of a composed field.
///
/// Hidden is sticky in both directions unless the override forces
/// visibility with `:::`; a forced-visible base stays forced through a
/// plain `:` override.
fn merge_visibility(left: Visibility, right: Visibility) -> Visibility {
    match (left, right) {
        (_, Visibility::ForceVisible) => Visibility::ForceVisible,
        (Visibility::Hidden, _) => Visibility::Hidden,
        (_, Visibility::Hidden) => Visibility::Hidden,
        (Visibility::ForceVisible, Visibility::Visible) => Visibility::ForceVisible,
        (Visibility::Visible, Visibility::Visible) => Visibility::Visible,
    }
}
