mod class;
pub mod env;
mod eval;
mod fun;
mod inter;
mod value;

pub use class::{Class, Instance};
pub use fun::{Callable, Closure, Fun, NativeFun};
pub use inter::Interpreter;
pub use value::Value;

use crate::{ast::Stmt, LoxError};

/// Resolves and runs a program with a fresh interpreter writing to stdout.
pub fn interpret(stmts: &[Stmt]) -> Vec<LoxError> {
    Interpreter::default().interpret(stmts)
}
