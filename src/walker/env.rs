use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::Rc,
};
use crate::util::Ident;
use super::Value;

struct Scope {
    bindings: HashMap<Ident, Value>,
    parent: Option<Env>,
}

/// A shared handle to one scope in a chain of scopes.
///
/// Blocks and calls create child scopes; closures keep the scope they were declared in alive
/// for as long as they are reachable.
#[derive(Clone)]
pub struct Env(Rc<RefCell<Scope>>);

impl Env {
    /// A scope with no parent.
    pub fn global() -> Self {
        Self(Rc::new(RefCell::new(Scope {
            bindings: HashMap::new(),
            parent: None,
        })))
    }

    pub fn child(parent: &Env) -> Self {
        Self(Rc::new(RefCell::new(Scope {
            bindings: HashMap::new(),
            parent: Some(parent.clone()),
        })))
    }

    /// Binds `name` in this scope, shadowing any outer binding.
    pub fn define(&self, name: Ident, value: Value) {
        self.0.borrow_mut().bindings.insert(name, value);
    }

    pub fn get(&self, name: Ident) -> Option<Value> {
        let scope = self.0.borrow();
        match scope.bindings.get(&name) {
            Some(value) => Some(value.clone()),
            None => scope.parent.as_ref()?.get(name),
        }
    }

    /// Overwrites the nearest existing binding of `name`. Returns `false` if there is none.
    pub fn assign(&self, name: Ident, value: Value) -> bool {
        let mut scope = self.0.borrow_mut();
        if let Some(slot) = scope.bindings.get_mut(&name) {
            *slot = value;
            return true;
        }
        match &scope.parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let scope = self.0.borrow();
        let mut names = scope.bindings
            .keys()
            .map(|name| name.as_str())
            .collect::<Vec<_>>();
        names.sort_unstable();
        f.debug_struct("Env")
            .field("bindings", &names)
            .field("parent", &scope.parent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::ident;

    #[test]
    fn lookup_walks_outward() {
        let global = Env::global();
        global.define(ident("a"), Value::from(1.0));
        let inner = Env::child(&Env::child(&global));
        assert_eq!(inner.get(ident("a")), Some(Value::from(1.0)));
        assert_eq!(inner.get(ident("b")), None);
    }

    #[test]
    fn define_shadows_assign_mutates() {
        let global = Env::global();
        global.define(ident("a"), Value::from(1.0));

        let inner = Env::child(&global);
        inner.define(ident("a"), Value::from(2.0));
        assert_eq!(inner.get(ident("a")), Some(Value::from(2.0)));
        assert_eq!(global.get(ident("a")), Some(Value::from(1.0)));

        let other = Env::child(&global);
        assert!(other.assign(ident("a"), Value::from(3.0)));
        assert_eq!(global.get(ident("a")), Some(Value::from(3.0)));
        assert_eq!(inner.get(ident("a")), Some(Value::from(2.0)));
    }

    #[test]
    fn assign_to_undefined_fails() {
        let env = Env::child(&Env::global());
        assert!(!env.assign(ident("missing"), Value::Nil));
        assert_eq!(env.get(ident("missing")), None);
    }

    #[test]
    fn children_share_parent() {
        let global = Env::global();
        let a = Env::child(&global);
        let b = Env::child(&global);
        global.define(ident("x"), Value::Nil);
        assert_eq!(a.get(ident("x")), b.get(ident("x")));
    }
}
