use std::{cell::RefCell, fmt::{Debug, Display}, rc::Rc};

use fnv::FnvHashMap;

use crate::LoxError;

use super::{Callable, Fun, Interpreter, Value};

pub struct Class {
    name: String,
    superclass: Option<Rc<Class>>,
    methods: FnvHashMap<String, Fun>,
}

impl Class {
    pub fn new<S: Into<String>>(name: S, superclass: Option<Rc<Class>>, methods: FnvHashMap<String, Fun>) -> Self {
        Self { name: name.into(), superclass, methods }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&Rc<Class>> {
        self.superclass.as_ref()
    }

    /// Finds a method on this class or, failing that, the nearest superclass
    /// which defines it.
    pub fn find_method(&self, name: &str) -> Option<&Fun> {
        self.methods
            .get(name)
            .or_else(|| self.superclass.as_ref().and_then(|superclass| superclass.find_method(name)))
    }
}

impl Callable for Rc<Class> {
    fn arity(&self) -> usize {
        self.find_method("init").map(|init| init.arity()).unwrap_or_default()
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, LoxError> {
        let instance = Instance::new(self.clone());

        if let Some(init) = self.find_method("init") {
            init.bind(instance.clone()).call(interpreter, args)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", &self.name)
    }
}

impl Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "<class {}>", &self.name)
    }
}

#[derive(Clone)]
pub struct Instance(Rc<RefCell<InstanceData>>);

struct InstanceData {
    class: Rc<Class>,
    fields: FnvHashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self(Rc::new(RefCell::new(InstanceData {
            class,
            fields: FnvHashMap::default(),
        })))
    }

    pub fn class(&self) -> Rc<Class> {
        self.0.borrow().class.clone()
    }

    /// Reads a field, or else a method bound to this instance. Fields shadow
    /// methods of the same name.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.0.borrow().fields.get(name) {
            return Some(value.clone());
        }

        let class = self.class();
        let method = class.find_method(name)?;
        Some(Value::Function(method.bind(self.clone())))
    }

    pub fn set<S: Into<String>>(&self, name: S, value: Value) {
        self.0.borrow_mut().fields.insert(name.into(), value);
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} instance", self.0.borrow().class.name())
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "<{} instance>", self.0.borrow().class.name())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::{ast::FunDecl, interpreter::env::Environment, Loc};

    use super::*;

    fn method(name: &str) -> Fun {
        let decl = FunDecl {
            loc: Loc::new(1),
            name: Some(crate::lexer::Token::synthetic(name)),
            params: Vec::new(),
            body: Vec::new(),
        };

        Fun::closure(Rc::new(decl), Environment::new())
    }

    fn class(name: &str, superclass: Option<Rc<Class>>, methods: &[(&str, &Fun)]) -> Rc<Class> {
        let methods = methods.iter().map(|(name, fun)| (name.to_string(), (*fun).clone())).collect();
        Rc::new(Class::new(name, superclass, methods))
    }

    #[test]
    fn methods_are_found_through_the_superclass_chain() {
        let a_greet = method("greet");
        let a_only = method("only");
        let b_greet = method("greet");

        let a = class("A", None, &[("greet", &a_greet), ("only", &a_only)]);
        let b = class("B", Some(a.clone()), &[("greet", &b_greet)]);
        let c = class("C", Some(b.clone()), &[]);

        assert_eq!(c.find_method("greet"), Some(&b_greet), "the nearest override wins");
        assert_eq!(c.find_method("only"), Some(&a_only));
        assert_eq!(c.find_method("missing"), None);
        assert_eq!(a.find_method("greet"), Some(&a_greet));
    }

    #[test]
    fn fields_shadow_methods() {
        let greet = method("greet");
        let instance = Instance::new(class("A", None, &[("greet", &greet)]));

        assert!(matches!(instance.get("greet"), Some(Value::Function(_))));
        assert_eq!(instance.get("missing"), None);

        instance.set("greet", Value::Number(1.0));
        assert_eq!(instance.get("greet"), Some(Value::Number(1.0)));
    }

    #[test]
    fn instances_have_their_own_fields() {
        let a = class("A", None, &[]);
        let first = Instance::new(a.clone());
        let second = Instance::new(a);

        first.set("x", Value::Bool(true));
        assert_eq!(second.get("x"), None);
        assert_eq!(first.to_string(), "A instance");
        assert_ne!(first, second);
    }

    #[test]
    fn class_arity_comes_from_init() {
        let decl = FunDecl {
            loc: Loc::new(1),
            name: Some(crate::lexer::Token::synthetic("init")),
            params: vec![crate::lexer::Token::synthetic("a"), crate::lexer::Token::synthetic("b")],
            body: Vec::new(),
        };
        let init = Fun::initializer(Rc::new(decl), Environment::new());

        let base = class("Base", None, &[("init", &init)]);
        let derived = class("Derived", Some(base.clone()), &[]);

        assert_eq!(base.arity(), 2);
        assert_eq!(derived.arity(), 2, "initializers are inherited");
        assert_eq!(class("Empty", None, &[]).arity(), 0);
    }
}
