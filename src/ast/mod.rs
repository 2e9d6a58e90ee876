mod expr;
mod parser;
pub mod printer;
mod stmt;
mod value;

pub use expr::{Expr, ExprId};
pub use parser::Parser;
pub use stmt::{ClassDecl, FunDecl, Stmt};
pub use value::Literal;
