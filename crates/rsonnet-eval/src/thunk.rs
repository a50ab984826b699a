//! Deferred computations.
//!
//! A thunk packages an expression with the context needed to evaluate it,
//! plus a memoization slot. Forcing evaluates once and caches; forcing a
//! thunk that is already being forced is the infinite-recursion error, and
//! a failed thunk re-raises its error on every later force.

use std::cell::RefCell;
use std::rc::Rc;

use rsonnet_par::ast::Expr;

use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use crate::Evaluator;

/// The memoization states.
enum State {
    /// Not yet evaluated.
    Pending {
        /// Expression to evaluate.
        expr: Rc<Expr>,
        /// Context to evaluate it in.
        ctx: Context,
    },
    /// Deferred `left + right`, produced by object composition for
    /// inherit (`+:`) fields.
    PendingAdd {
        /// The base object's field.
        left: Thunk,
        /// The overriding field.
        right: Thunk,
    },
    /// Evaluation is in progress; hitting this state again is a cycle.
    Forcing,
    /// Evaluated successfully.
    Done(Value),
    /// Evaluation failed; the error is replayed on each force.
    Failed(EvalError),
}

/// A shareable deferred computation with a memoized result.
#[derive(Clone)]
pub struct Thunk(Rc<RefCell<State>>);

impl Thunk {
    /// A thunk that will evaluate `expr` in `ctx` when first forced.
    pub fn pending(expr: Rc<Expr>, ctx: Context) -> Self {
        Self(Rc::new(RefCell::new(State::Pending { expr, ctx })))
    }

    /// A thunk over an already-computed value.
    pub fn done(value: Value) -> Self {
        Self(Rc::new(RefCell::new(State::Done(value))))
    }

    /// A thunk that adds two other thunks when forced; used for `+:`
    /// fields during object composition.
    pub fn pending_add(left: Thunk, right: Thunk) -> Self {
        Self(Rc::new(RefCell::new(State::PendingAdd { left, right })))
    }

    /// Returns a copy of this thunk with `super` rebound in its captured
    /// context, leaving this thunk untouched.
    ///
    /// Object composition uses this to make the right-hand side's field
    /// bodies resolve `super` against the left-hand object. Forced thunks
    /// are returned as-is: their value can no longer depend on `super`.
    pub fn rebind_super(&self, super_obj: crate::value::Object) -> Thunk {
        match &*self.0.borrow() {
            State::Pending { expr, ctx } => {
                Thunk::pending(expr.clone(), ctx.with_super(Some(super_obj)))
            }
            _ => self.clone(),
        }
    }

    /// Forces the thunk, memoizing the outcome.
    ///
    /// # Errors
    ///
    /// Re-raises a previous failure, raises the runtime error produced by
    /// evaluation, or reports infinite recursion when the thunk is
    /// already being forced.
    pub fn force(&self, ev: &Evaluator) -> EvalResult<Value> {
        // The state is moved out so evaluation can run without holding
        // the borrow; memoized outcomes are put straight back.
        let work = {
            let mut state = self.0.borrow_mut();
            match std::mem::replace(&mut *state, State::Forcing) {
                State::Done(value) => {
                    *state = State::Done(value.clone());
                    return Ok(value);
                }
                State::Failed(err) => {
                    *state = State::Failed(err.clone());
                    return Err(err);
                }
                State::Forcing => {
                    return Err(EvalError::new(
                        "Infinite recursion detected while evaluating a value",
                    ))
                }
                pending => pending,
            }
        };

        let result = match work {
            State::Pending { expr, ctx } => ev.eval(&expr, &ctx),
            State::PendingAdd { left, right } => {
                let lhs = left.force(ev);
                let rhs = right.force(ev);
                match (lhs, rhs) {
                    (Ok(l), Ok(r)) => ev.add_values(&l, &r),
                    (Err(e), _) | (_, Err(e)) => Err(e),
                }
            }
            State::Forcing | State::Done(_) | State::Failed(_) => {
                unreachable!("memoized states return above")
            }
        };

        let mut state = self.0.borrow_mut();
        match &result {
            Ok(value) => *state = State::Done(value.clone()),
            Err(err) => *state = State::Failed(err.clone()),
        }
        result
    }
}

impl std::fmt::Debug for Thunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &*self.0.borrow() {
            State::Pending { .. } => write!(f, "<pending>"),
            State::PendingAdd { .. } => write!(f, "<pending +>"),
            State::Forcing => write!(f, "<forcing>"),
            State::Done(value) => write!(f, "{value:?}"),
            State::Failed(err) => write!(f, "<failed: {err}>"),
        }
    }
}
