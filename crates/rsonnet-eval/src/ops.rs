//! Unary and binary operators.
//!
//! Operators force their operands. Dispatch is on the pair of value
//! tags; combinations outside the table raise type errors naming both
//! operand types. `&&` and `||` short-circuit, and `==` is structural
//! JSON equality (comparing functions is an error, mismatched types are
//! plain `false`).

use std::cmp::Ordering;
use std::rc::Rc;

use rsonnet_par::ast::{BinaryOp, Expr, UnaryOp};

use crate::context::Context;
use crate::error::{eval_err, EvalError, EvalResult};
use crate::format;
use crate::manifest;
use crate::value::Value;
use crate::Evaluator;

impl Evaluator {
    pub(crate) fn eval_unary(
        &self,
        op: UnaryOp,
        operand: &Expr,
        ctx: &Context,
    ) -> EvalResult<Value> {
        let value = self.eval(operand, ctx)?;
        match op {
            UnaryOp::Plus => Ok(Value::Num(value.as_num("Operand of unary +")?)),
            UnaryOp::Minus => Ok(Value::Num(-value.as_num("Operand of unary -")?)),
            UnaryOp::Not => Ok(Value::Bool(!value.as_bool("Operand of unary !")?)),
            UnaryOp::BitwiseNot => Ok(Value::Num(!value.as_int("Operand of unary ~")? as f64)),
        }
    }

    pub(crate) fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        ctx: &Context,
    ) -> EvalResult<Value> {
        // Short-circuit and index forms evaluate their own operands.
        match op {
            BinaryOp::And => {
                let l = self.eval(left, ctx)?.as_bool("Left operand of &&")?;
                if !l {
                    return Ok(Value::Bool(false));
                }
                let r = self.eval(right, ctx)?.as_bool("Right operand of &&")?;
                return Ok(Value::Bool(r));
            }
            BinaryOp::Or => {
                let l = self.eval(left, ctx)?.as_bool("Left operand of ||")?;
                if l {
                    return Ok(Value::Bool(true));
                }
                let r = self.eval(right, ctx)?.as_bool("Right operand of ||")?;
                return Ok(Value::Bool(r));
            }
            BinaryOp::Index => return self.eval_index(left, right, ctx),
            BinaryOp::In => return self.eval_in(left, right, ctx),
            _ => {}
        }

        let l = self.eval(left, ctx)?;
        let r = self.eval(right, ctx)?;

        match op {
            BinaryOp::Add => self.add_values(&l, &r),

            BinaryOp::Sub => {
                let (a, b) = self.numeric_operands(&l, &r, "-")?;
                Ok(Value::Num(a - b))
            }
            BinaryOp::Mul => {
                let (a, b) = self.numeric_operands(&l, &r, "*")?;
                Ok(Value::Num(a * b))
            }
            BinaryOp::Div => {
                let (a, b) = self.numeric_operands(&l, &r, "/")?;
                if b == 0.0 {
                    eval_err!("Division by zero");
                }
                Ok(Value::Num(a / b))
            }
            BinaryOp::Mod => match (&l, &r) {
                (Value::Str(fmt), _) => format::format_value(self, fmt, &r),
                _ => {
                    let (a, b) = self.numeric_operands(&l, &r, "%")?;
                    if b == 0.0 {
                        eval_err!("Division by zero");
                    }
                    Ok(Value::Num(a % b))
                }
            },

            BinaryOp::BitAnd => {
                let (a, b) = self.integer_operands(&l, &r, "&")?;
                Ok(Value::Num((a & b) as f64))
            }
            BinaryOp::BitOr => {
                let (a, b) = self.integer_operands(&l, &r, "|")?;
                Ok(Value::Num((a | b) as f64))
            }
            BinaryOp::BitXor => {
                let (a, b) = self.integer_operands(&l, &r, "^")?;
                Ok(Value::Num((a ^ b) as f64))
            }
            BinaryOp::Shl => {
                let (a, b) = self.integer_operands(&l, &r, "<<")?;
                if b < 0 {
                    eval_err!("Shift amount must not be negative, got {b}");
                }
                Ok(Value::Num(((a as i64) << (b as u32 % 64)) as f64))
            }
            BinaryOp::Shr => {
                let (a, b) = self.integer_operands(&l, &r, ">>")?;
                if b < 0 {
                    eval_err!("Shift amount must not be negative, got {b}");
                }
                Ok(Value::Num((a >> (b as u32 % 64)) as f64))
            }

            BinaryOp::Eq => Ok(Value::Bool(self.equals(&l, &r)?)),
            BinaryOp::Ne => Ok(Value::Bool(!self.equals(&l, &r)?)),

            BinaryOp::Lt => Ok(Value::Bool(self.compare_op(&l, &r, "<")? == Ordering::Less)),
            BinaryOp::Le => Ok(Value::Bool(
                self.compare_op(&l, &r, "<=")? != Ordering::Greater,
            )),
            BinaryOp::Gt => Ok(Value::Bool(
                self.compare_op(&l, &r, ">")? == Ordering::Greater,
            )),
            BinaryOp::Ge => Ok(Value::Bool(self.compare_op(&l, &r, ">=")? != Ordering::Less)),

            BinaryOp::And | BinaryOp::Or | BinaryOp::Index | BinaryOp::In => {
                unreachable!("handled above")
            }
        }
    }

    /// `a[b]`, with `super[b]` resolved against the context.
    fn eval_index(&self, left: &Expr, right: &Expr, ctx: &Context) -> EvalResult<Value> {
        if matches!(left, Expr::Super) {
            let Some(base) = ctx.super_obj() else {
                eval_err!("Attempt to use super when there is no super class.");
            };
            let key = self.eval(right, ctx)?;
            let key = key.as_str("Object index")?;
            return base.field_value(self, &key);
        }

        let target = self.eval(left, ctx)?;
        let key = self.eval(right, ctx)?;
        match (&target, &key) {
            (Value::Arr(items), Value::Num(_)) => {
                let index = key.as_int("Array index")?;
                if index < 0 || index as usize >= items.len() {
                    eval_err!("Index out of range, not within [0, {})", items.len());
                }
                items[index as usize].force(self)
            }
            (Value::Str(s), Value::Num(_)) => {
                let index = key.as_int("String index")?;
                let length = s.chars().count();
                if index < 0 || index as usize >= length {
                    eval_err!("Index out of range, not within [0, {length})");
                }
                match s.chars().nth(index as usize) {
                    Some(c) => Ok(Value::str(c.to_string())),
                    None => eval_err!("Index out of range, not within [0, {length})"),
                }
            }
            (Value::Obj(obj), Value::Str(name)) => obj.field_value(self, name),
            (Value::Obj(_), other) => {
                eval_err!("Unsupported type for index: {}, expected string", other.type_name())
            }
            (target, key) => eval_err!(
                "Unsupported operand types for index: {} and {}",
                target.type_name(),
                key.type_name()
            ),
        }
    }

    /// `a in b`; `b` may be `super`.
    fn eval_in(&self, left: &Expr, right: &Expr, ctx: &Context) -> EvalResult<Value> {
        let key = self.eval(left, ctx)?;

        if matches!(right, Expr::Super) {
            let Some(base) = ctx.super_obj() else {
                eval_err!("Attempt to use super when there is no super class.");
            };
            let key = key.as_str("Left operand of in")?;
            return Ok(Value::Bool(base.has(&key)));
        }

        let container = self.eval(right, ctx)?;
        match &container {
            Value::Obj(obj) => {
                let key = key.as_str("Left operand of in")?;
                Ok(Value::Bool(obj.has(&key)))
            }
            Value::Arr(items) => {
                for item in items.iter() {
                    let item = item.force(self)?;
                    if self.equals(&key, &item)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            other => eval_err!(
                "Unsupported operand types for in: {} and {}",
                key.type_name(),
                other.type_name()
            ),
        }
    }

    /// The `+` operator over every type combination it supports.
    ///
    /// Also reached by composition's deferred `+:` thunks.
    pub(crate) fn add_values(&self, l: &Value, r: &Value) -> EvalResult<Value> {
        match (l, r) {
            (Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
            (Value::Arr(a), Value::Arr(b)) => {
                let mut items = Vec::with_capacity(a.len() + b.len());
                items.extend(a.iter().cloned());
                items.extend(b.iter().cloned());
                Ok(Value::Arr(Rc::new(items)))
            }
            (Value::Obj(a), Value::Obj(b)) => Ok(Value::Obj(self.compose_objects(a, b))),
            (Value::Str(a), _) => {
                let b = manifest::value_to_string(self, r)?;
                Ok(Value::str(format!("{a}{b}")))
            }
            (_, Value::Str(b)) => {
                let a = manifest::value_to_string(self, l)?;
                Ok(Value::str(format!("{a}{b}")))
            }
            _ => eval_err!(
                "Unsupported operand types for +: {} and {}",
                l.type_name(),
                r.type_name()
            ),
        }
    }

    /// Structural equality; comparing functions is an error, mismatched
    /// types are `false`.
    pub(crate) fn equals(&self, l: &Value, r: &Value) -> EvalResult<bool> {
        match (l, r) {
            (Value::Func(_), _) | (_, Value::Func(_)) => {
                Err(EvalError::new("Cannot test equality of functions"))
            }
            (Value::Null, Value::Null) => Ok(true),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (Value::Num(a), Value::Num(b)) => Ok(a == b),
            (Value::Str(a), Value::Str(b)) => Ok(a == b),
            (Value::Arr(a), Value::Arr(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    let x = x.force(self)?;
                    let y = y.force(self)?;
                    if !self.equals(&x, &y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Obj(a), Value::Obj(b)) => {
                let a_names = a.sorted_field_names(false);
                let b_names = b.sorted_field_names(false);
                if a_names != b_names {
                    return Ok(false);
                }
                for name in &a_names {
                    let x = a.field_value(self, name)?;
                    let y = b.field_value(self, name)?;
                    if !self.equals(&x, &y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Ordering for `<` `<=` `>` `>=` and `std.sort`: numbers, strings,
    /// or arrays compared lexicographically.
    pub(crate) fn compare_values(&self, l: &Value, r: &Value) -> EvalResult<Ordering> {
        self.compare_op(l, r, "comparison")
    }

    fn compare_op(&self, l: &Value, r: &Value, op: &str) -> EvalResult<Ordering> {
        match (l, r) {
            (Value::Num(a), Value::Num(b)) => {
                a.partial_cmp(b)
                    .ok_or_else(|| EvalError::new("Cannot compare NaN"))
            }
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Arr(a), Value::Arr(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let x = x.force(self)?;
                    let y = y.force(self)?;
                    match self.compare_op(&x, &y, op)? {
                        Ordering::Equal => continue,
                        other => return Ok(other),
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => eval_err!(
                "Unsupported operand types for {op}: {} and {}",
                l.type_name(),
                r.type_name()
            ),
        }
    }

    fn numeric_operands(&self, l: &Value, r: &Value, op: &str) -> EvalResult<(f64, f64)> {
        match (l, r) {
            (Value::Num(a), Value::Num(b)) => Ok((*a, *b)),
            _ => eval_err!(
                "Unsupported operand types for {op}: {} and {}",
                l.type_name(),
                r.type_name()
            ),
        }
    }

    fn integer_operands(&self, l: &Value, r: &Value, op: &str) -> EvalResult<(i64, i64)> {
        let (a, b) = self.numeric_operands(l, r, op)?;
        if a.fract() != 0.0 || b.fract() != 0.0 {
            eval_err!("Operands of {op} must be integers, got {a} and {b}");
        }
        Ok((a as i64, b as i64))
    }
}
