use crate::{analysis::{self, Locals}, ast::Stmt, errors, LoxError, Loc};

use super::{env::Environment, Fun, Value};

/// How a statement finished executing. `Break` and `Return` unwind to the
/// nearest enclosing loop or function call respectively and are consumed
/// there.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Flow {
    Normal,
    Break,
    Return(Value),
}

pub struct Interpreter {
    pub(super) globals: Environment,
    pub(super) env: Environment,
    pub(super) locals: Locals,
    pub output: Box<dyn std::io::Write>,
}

impl Interpreter {
    /// Resolves and then runs a program, returning every resolution error or
    /// the runtime error which stopped it. Nothing runs if resolution fails.
    pub fn interpret(&mut self, stmts: &[Stmt]) -> Vec<LoxError> {
        match analysis::resolve(stmts) {
            Ok(locals) => self.resolve(locals),
            Err(errs) => return errs,
        }

        match self.execute_all(stmts) {
            Ok(()) => Vec::new(),
            Err(err) => vec![err],
        }
    }

    /// Adds the depths recorded by the resolver to those this interpreter
    /// already knows about.
    pub fn resolve(&mut self, locals: Locals) {
        self.locals.extend(locals);
    }

    /// Runs already resolved top-level statements, stopping at the first error.
    pub fn execute_all(&mut self, stmts: &[Stmt]) -> Result<(), LoxError> {
        for stmt in stmts {
            let flow = self.execute(stmt).map_err(|err| {
                tracing::debug!(error = %err, "execution halted");
                err
            })?;

            if flow != Flow::Normal {
                return Err(errors::system(
                    format!("A control flow signal ({:?}) escaped to the top level of the program.", flow),
                    "This is a bug in the interpreter, please report it with example code.",
                ));
            }
        }

        Ok(())
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Installs a native function as a global.
    pub fn define_native<T, S>(&mut self, name: S, arity: usize, fun: T)
    where
        T: Fn(&mut Interpreter, Vec<Value>) -> Result<Value, LoxError> + 'static,
        S: Into<String>,
    {
        let name = name.into();
        self.globals.define(name.clone(), Value::Function(Fun::native(name, arity, fun)));
    }

    pub fn with_output(self, output: Box<dyn std::io::Write>) -> Self {
        Self {
            output,
            ..self
        }
    }

    pub fn into_output(self) -> Box<dyn std::io::Write> {
        self.output
    }

    /// Runs `stmts` with `env` as the current environment, restoring the
    /// previous one afterwards however they finish.
    pub(crate) fn execute_block(&mut self, stmts: &[Stmt], env: Environment) -> Result<Flow, LoxError> {
        let previous = std::mem::replace(&mut self.env, env);

        let mut result = Ok(Flow::Normal);
        for stmt in stmts {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.env = previous;
        result
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        let globals = Environment::new();

        let mut interpreter = Self {
            env: globals.clone(),
            globals,
            locals: Locals::default(),
            output: Box::new(std::io::stdout()),
        };

        interpreter.define_native("clock", 0, |_, _| {
            let offset = std::time::SystemTime::now().duration_since(std::time::SystemTime::UNIX_EPOCH)
                .map_err(|_| errors::runtime(
                    Loc::Native,
                    "Failed to get current system time because the system time is currently set to a time earlier than 1970-01-01T00:00:00Z.",
                    "Make sure that you have set your system clock correctly."))?;

            Ok(Value::Number(offset.as_secs_f64()))
        });

        interpreter.define_native("assert", 2, |_, args| {
            if !args[0].is_truthy() {
                return Err(errors::runtime(
                    Loc::Native,
                    format!("Assertion failed: {}", args[1]),
                    "Check the condition passed to `assert`.",
                ));
            }

            Ok(Value::Nil)
        });

        interpreter
    }
}
