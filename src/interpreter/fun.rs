use std::{fmt::{Debug, Display}, rc::Rc};

use crate::{ast::FunDecl, errors, LoxError};

use super::{env::Environment, inter::Flow, Instance, Interpreter, Value};

/// Anything which can be invoked with `(...)`.
pub trait Callable {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, LoxError>;
}

#[derive(Clone)]
pub enum Fun {
    Native(Rc<NativeFun>),
    Initializer(Closure),
    Closure(Closure),
}

impl Fun {
    pub fn native<T: Fn(&mut Interpreter, Vec<Value>) -> Result<Value, LoxError> + 'static, S: Into<String>>(name: S, arity: usize, fun: T) -> Self {
        Fun::Native(Rc::new(NativeFun::new(name, arity, fun)))
    }

    pub fn initializer(decl: Rc<FunDecl>, env: Environment) -> Self {
        Fun::Initializer(Closure::new(decl, env))
    }

    pub fn closure(decl: Rc<FunDecl>, env: Environment) -> Self {
        Fun::Closure(Closure::new(decl, env))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Fun::Native(fun) => Some(fun.name()),
            Fun::Initializer(closure) | Fun::Closure(closure) => closure.name(),
        }
    }

    /// Produces a copy of this function whose closure binds `this` to the
    /// given instance.
    pub fn bind(&self, this: Instance) -> Self {
        match self {
            Fun::Native(fun) => Fun::Native(fun.clone()),
            Fun::Initializer(closure) => Fun::Initializer(closure.bind(this)),
            Fun::Closure(closure) => Fun::Closure(closure.bind(this)),
        }
    }
}

impl Callable for Fun {
    fn arity(&self) -> usize {
        match self {
            Fun::Native(fun) => fun.arity(),
            Fun::Initializer(closure) | Fun::Closure(closure) => closure.arity(),
        }
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, LoxError> {
        match self {
            Fun::Native(fun) => fun.call(interpreter, args),
            Fun::Initializer(closure) => {
                closure.call(interpreter, args)?;

                closure.closure.get_at(0, "this").ok_or_else(|| errors::system(
                    "Failed to resolve `this` within the initializer function.",
                    "This is a bug in the interpreter, please report it with example code.",
                ))
            }
            Fun::Closure(closure) => closure.call(interpreter, args),
        }
    }
}

impl Display for Fun {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Fun::Native(_) => write!(f, "<native fn>"),
            _ => match self.name() {
                Some(name) => write!(f, "<fn {}>", name),
                None => write!(f, "<fn>"),
            },
        }
    }
}

impl Debug for Fun {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl PartialEq for Fun {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Fun::Native(fun1), Fun::Native(fun2)) => Rc::ptr_eq(fun1, fun2),
            (Fun::Initializer(closure1), Fun::Initializer(closure2)) => closure1 == closure2,
            (Fun::Closure(closure1), Fun::Closure(closure2)) => closure1 == closure2,
            _ => false,
        }
    }
}

pub struct NativeFun {
    pub name: String,
    pub arity: usize,
    #[allow(clippy::type_complexity)]
    pub fun: Box<dyn Fn(&mut Interpreter, Vec<Value>) -> Result<Value, LoxError>>,
}

impl NativeFun {
    pub fn new<T: Fn(&mut Interpreter, Vec<Value>) -> Result<Value, LoxError> + 'static, S: Into<String>>(name: S, arity: usize, fun: T) -> Self {
        Self { name: name.into(), arity, fun: Box::new(fun) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, LoxError> {
        (self.fun)(interpreter, args)
    }
}

/// A user defined function together with the environment it was defined in.
#[derive(Clone)]
pub struct Closure {
    pub decl: Rc<FunDecl>,
    pub closure: Environment,
}

impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.decl, &other.decl) && self.closure == other.closure
    }
}

impl Closure {
    pub fn new(decl: Rc<FunDecl>, env: Environment) -> Self {
        Self { decl, closure: env }
    }

    pub fn name(&self) -> Option<&str> {
        self.decl.name()
    }

    pub fn arity(&self) -> usize {
        self.decl.arity()
    }

    pub fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, LoxError> {
        // Parameters live in a scope enclosed by the definition site, not the
        // call site.
        let env = self.closure.branch();
        self.decl.params.iter().zip(args).for_each(|(param, value)| {
            env.define(param.lexeme(), value);
        });

        match interpreter.execute_block(&self.decl.body, env)? {
            Flow::Normal => Ok(Value::Nil),
            Flow::Return(value) => Ok(value),
            Flow::Break => Err(errors::system(
                "A `break` escaped from the body of a function.",
                "This is a bug in the interpreter, please report it with example code.",
            )),
        }
    }

    pub fn bind(&self, this: Instance) -> Self {
        let closure = self.closure.branch();
        closure.define("this", Value::Instance(this));

        Self::new(self.decl.clone(), closure)
    }
}
