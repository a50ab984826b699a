//! Lexical contexts.
//!
//! A context bundles the scope chain of lazy bindings with the three
//! object-relative anchors: `self` (`this`), `$` (`dollar`), and `super`.
//! Contexts are value-copied at each new scope; a callee never mutates a
//! caller's context. The scope maps themselves are shared through `Rc`,
//! which is what lets a group of `local` binds see each other: thunks
//! created for the group capture the context whose scope the binds are
//! then inserted into.

use std::cell::RefCell;
use std::rc::Rc;

use rsonnet_util::FxHashMap;

use crate::thunk::Thunk;
use crate::value::Object;

/// One scope level: bindings plus a parent link.
struct Scope {
    bindings: RefCell<FxHashMap<Rc<str>, Thunk>>,
    parent: Option<Rc<Scope>>,
}

/// The per-scope evaluation context.
#[derive(Clone)]
pub struct Context {
    scope: Rc<Scope>,
    this: Option<Object>,
    dollar: Option<Object>,
    super_: Option<Object>,
}

impl Context {
    /// Creates an empty root context.
    pub fn new() -> Self {
        Self {
            scope: Rc::new(Scope {
                bindings: RefCell::new(FxHashMap::default()),
                parent: None,
            }),
            this: None,
            dollar: None,
            super_: None,
        }
    }

    /// Returns a context with a fresh scope level on top of this one.
    ///
    /// Bindings inserted into the child are invisible to `self`.
    pub fn child(&self) -> Self {
        Self {
            scope: Rc::new(Scope {
                bindings: RefCell::new(FxHashMap::default()),
                parent: Some(self.scope.clone()),
            }),
            this: self.this.clone(),
            dollar: self.dollar.clone(),
            super_: self.super_.clone(),
        }
    }

    /// Inserts a binding into the topmost scope level.
    ///
    /// Thunks that captured this context (or a clone of it) observe the
    /// new binding, which is what makes recursive `local` groups work.
    pub fn bind(&self, name: Rc<str>, thunk: Thunk) {
        self.scope.bindings.borrow_mut().insert(name, thunk);
    }

    /// Looks up a name, walking the scope chain innermost-first.
    pub fn lookup(&self, name: &str) -> Option<Thunk> {
        let mut scope = Some(&self.scope);
        while let Some(s) = scope {
            if let Some(thunk) = s.bindings.borrow().get(name) {
                return Some(thunk.clone());
            }
            scope = s.parent.as_ref();
        }
        None
    }

    /// The innermost object being built, if any (`self`).
    pub fn this(&self) -> Option<&Object> {
        self.this.as_ref()
    }

    /// The outermost object of the current composition, if any (`$`).
    pub fn dollar(&self) -> Option<&Object> {
        self.dollar.as_ref()
    }

    /// The object `super` resolves against, if any.
    pub fn super_obj(&self) -> Option<&Object> {
        self.super_.as_ref()
    }

    /// Returns a copy with `this` set, and `dollar` defaulted to the same
    /// object when unset (the outermost object wins).
    pub fn with_this(&self, obj: Object) -> Self {
        let mut ctx = self.clone();
        ctx.dollar = Some(ctx.dollar.unwrap_or_else(|| obj.clone()));
        ctx.this = Some(obj);
        ctx
    }

    /// Returns a copy with `super` replaced.
    pub fn with_super(&self, super_obj: Option<Object>) -> Self {
        let mut ctx = self.clone();
        ctx.super_ = super_obj;
        ctx
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_lookup_walks_chain() {
        let root = Context::new();
        root.bind(Rc::from("a"), Thunk::done(Value::Num(1.0)));
        let child = root.child();
        child.bind(Rc::from("b"), Thunk::done(Value::Num(2.0)));

        assert!(child.lookup("a").is_some());
        assert!(child.lookup("b").is_some());
        assert!(root.lookup("b").is_none());
        assert!(child.lookup("c").is_none());
    }

    #[test]
    fn test_shadowing() {
        let root = Context::new();
        root.bind(Rc::from("x"), Thunk::done(Value::Num(1.0)));
        let child = root.child();
        child.bind(Rc::from("x"), Thunk::done(Value::Num(2.0)));

        // The child sees its own binding; cloning shares the scope.
        let clone = child.clone();
        assert!(clone.lookup("x").is_some());
    }

    #[test]
    fn test_late_binding_visible_to_clones() {
        let ctx = Context::new().child();
        let captured = ctx.clone();
        ctx.bind(Rc::from("late"), Thunk::done(Value::Null));
        assert!(captured.lookup("late").is_some());
    }

    #[test]
    fn test_with_this_defaults_dollar() {
        let ctx = Context::new();
        let obj = Object::new();
        let inner = ctx.with_this(obj.clone());
        assert!(inner.this().unwrap().ptr_eq(&obj));
        assert!(inner.dollar().unwrap().ptr_eq(&obj));

        // A nested object keeps the outer dollar.
        let nested = Object::new();
        let innermost = inner.with_this(nested.clone());
        assert!(innermost.this().unwrap().ptr_eq(&nested));
        assert!(innermost.dollar().unwrap().ptr_eq(&obj));
    }
}
