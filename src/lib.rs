mod core;
pub mod analysis;
pub mod ast;
pub mod cmdline;
pub mod interpreter;
pub mod lexer;

pub use crate::core::errors::{self, ErrorKind, LoxError};
pub use crate::core::{CaptureOutput, Loc};
