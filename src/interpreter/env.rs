use std::{cell::RefCell, rc::Rc};

use fnv::FnvHashMap;

use super::Value;

/// A chain of variable scopes. Cloning an environment shares it, which is how
/// closures keep the scope they were defined in alive after it has been left.
#[derive(Clone, Default)]
pub struct Environment(Rc<RefCell<Scope>>);

#[derive(Default)]
struct Scope {
    values: FnvHashMap<String, Value>,
    parent: Option<Environment>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty scope enclosed by this one.
    pub fn branch(&self) -> Environment {
        let child = Scope {
            parent: Some(self.clone()),
            ..Default::default()
        };

        Environment(Rc::new(RefCell::new(child)))
    }

    /// Binds `key` in this scope, replacing any existing binding.
    pub fn define<K: Into<String>>(&self, key: K, value: Value) {
        self.0.borrow_mut().values.insert(key.into(), value);
    }

    /// Looks `key` up in this scope, then in each enclosing scope in turn.
    pub fn get(&self, key: &str) -> Option<Value> {
        let scope = self.0.borrow();
        match scope.values.get(key) {
            Some(value) => Some(value.clone()),
            None => scope.parent.as_ref().and_then(|p| p.get(key)),
        }
    }

    /// Updates the nearest existing binding of `key`, returning `false` if
    /// there is none.
    pub fn assign(&self, key: &str, value: Value) -> bool {
        let mut scope = self.0.borrow_mut();
        if let Some(slot) = scope.values.get_mut(key) {
            *slot = value;
            return true;
        }

        match &scope.parent {
            Some(parent) => parent.assign(key, value),
            None => false,
        }
    }

    /// The environment exactly `depth` links outwards from this one.
    pub fn ancestor(&self, depth: usize) -> Option<Environment> {
        let mut env = self.clone();
        for _ in 0..depth {
            let parent = env.0.borrow().parent.clone()?;
            env = parent;
        }

        Some(env)
    }

    /// Reads `key` from the scope exactly `depth` links out, without searching
    /// any further.
    pub fn get_at(&self, depth: usize, key: &str) -> Option<Value> {
        let env = self.ancestor(depth)?;
        let scope = env.0.borrow();
        scope.values.get(key).cloned()
    }

    /// Updates `key` in the scope exactly `depth` links out, returning `false`
    /// if it is not bound there.
    pub fn assign_at(&self, depth: usize, key: &str, value: Value) -> bool {
        let env = match self.ancestor(depth) {
            Some(env) => env,
            None => return false,
        };

        let mut scope = env.0.borrow_mut();
        match scope.values.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// Environments routinely contain closures which capture them, so only the
// names are printed.
impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let scope = self.0.borrow();
        let mut names: Vec<&String> = scope.values.keys().collect();
        names.sort();

        f.debug_struct("Environment")
            .field("names", &names)
            .field("parent", &scope.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global() {
        let env = Environment::new();
        env.define("a", Value::Number(1.0));
        env.define("b", Value::Number(2.0));

        assert_eq!(env.get("a"), Some(Value::Number(1.0)));
        assert_eq!(env.get("b"), Some(Value::Number(2.0)));
        assert_eq!(env.get("c"), None);

        env.define("a", Value::Number(5.0));
        assert_eq!(env.get("a"), Some(Value::Number(5.0)), "redefinition is always permitted");
    }

    #[test]
    fn test_scoped() {
        let global = Environment::new();
        global.define("a", Value::Number(1.0));
        global.define("b", Value::Number(2.0));
        let env = global.branch();

        assert_eq!(env.get("a"), Some(Value::Number(1.0)));

        env.define("a", Value::Number(3.0));
        env.define("c", Value::Number(4.0));

        assert_eq!(global.get("a"), Some(Value::Number(1.0)));

        assert_eq!(env.get("a"), Some(Value::Number(3.0)));
        assert_eq!(env.get("b"), Some(Value::Number(2.0)));
        assert_eq!(env.get("c"), Some(Value::Number(4.0)));
        assert_eq!(env.get("d"), None);
    }

    #[test]
    fn test_assign() {
        let global = Environment::new();
        global.define("a", Value::Number(1.0));
        let env = global.branch();

        assert!(env.assign("a", Value::Number(2.0)));
        assert_eq!(global.get("a"), Some(Value::Number(2.0)));
        assert!(!env.assign("missing", Value::Nil));
    }

    #[test]
    fn test_fixed_depth_access() {
        let global = Environment::new();
        global.define("a", Value::String("global".to_string()));
        let middle = global.branch();
        middle.define("a", Value::String("middle".to_string()));
        let inner = middle.branch();

        assert_eq!(inner.get_at(1, "a"), Some(Value::String("middle".to_string())));
        assert_eq!(inner.get_at(2, "a"), Some(Value::String("global".to_string())));
        assert_eq!(inner.get_at(0, "a"), None, "depth lookups never search further out");
        assert_eq!(inner.get_at(3, "a"), None);

        assert!(inner.assign_at(2, "a", Value::Bool(true)));
        assert_eq!(global.get("a"), Some(Value::Bool(true)));
        assert_eq!(middle.get("a"), Some(Value::String("middle".to_string())));
        assert!(!inner.assign_at(0, "a", Value::Nil));
    }

    #[test]
    fn test_branches_outlive_their_creator() {
        let captured = {
            let scope = Environment::new().branch();
            scope.define("kept", Value::Number(1.0));
            scope.branch()
        };

        assert_eq!(captured.get_at(1, "kept"), Some(Value::Number(1.0)));
    }
}
