use std::rc::Rc;

use fnv::FnvHashMap;

use crate::{ast::{ClassDecl, Expr, ExprId, FunDecl, Stmt}, errors, lexer::Token, LoxError, Loc};

use super::Locals;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ClassKind {
    None,
    Class,
    Subclass,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum FunctionKind {
    None,
    Function,
    Initializer,
    Method,
}

/// What encloses the code currently being resolved. Passed down by value, so
/// a nested declaration can never leak its context into its siblings.
#[derive(Debug, Copy, Clone)]
struct Context {
    function: FunctionKind,
    class: ClassKind,
    in_loop: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            function: FunctionKind::None,
            class: ClassKind::None,
            in_loop: false,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum Status {
    Undeclared,
    /// Declared, but its initializer has not finished yet.
    Declared,
    Ready,
}

#[derive(Debug, Default)]
struct Scope(FnvHashMap<String, Status>);

impl Scope {
    fn status(&self, name: &str) -> Status {
        self.0.get(name).copied().unwrap_or(Status::Undeclared)
    }
}

/// Walks a program once, recording the lexical depth of every local variable
/// access and reporting misuse of declarations, `return`, `break`, `this` and
/// `super`.
#[derive(Debug, Default)]
pub struct Resolver {
    scopes: Vec<Scope>,
    locals: Locals,
    errs: Vec<LoxError>,
}

impl Resolver {
    pub fn resolve(&mut self, stmts: &[Stmt]) {
        self.resolve_stmts(stmts, Context::default());
    }

    pub fn has_errors(&self) -> bool {
        !self.errs.is_empty()
    }

    pub fn finish(self) -> Result<Locals, Vec<LoxError>> {
        if self.errs.is_empty() {
            Ok(self.locals)
        } else {
            Err(self.errs)
        }
    }

    fn error<D: Into<String>, A: Into<String>>(&mut self, loc: Loc, description: D, advice: A) {
        let err = errors::resolution(loc, description, advice);
        tracing::debug!(%loc, description = err.description(), "resolution error");
        self.errs.push(err);
    }

    fn begin_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let duplicate = match self.scopes.last_mut() {
            // Globals are never tracked.
            None => return,
            Some(scope) if scope.status(name.lexeme()) != Status::Undeclared => true,
            Some(scope) => {
                scope.0.insert(name.lexeme().to_string(), Status::Declared);
                false
            }
        };

        if duplicate {
            self.error(
                name.location(),
                format!("Already a variable named '{}' in this scope.", name.lexeme()),
                "Remove the `var` keyword to assign a new value to this variable, or rename it if you intended to maintain a separate instance.",
            );
        }
    }

    fn define(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.0.insert(name.to_string(), Status::Ready);
        }
    }

    fn resolve_local(&mut self, id: ExprId, name: &str) {
        let innermost = self.scopes.len();
        for (i, scope) in self.scopes.iter().enumerate().rev() {
            if scope.status(name) != Status::Undeclared {
                let depth = innermost - 1 - i;
                tracing::trace!(name, depth, "resolved local");
                self.locals.insert(id, depth);
                return;
            }
        }
    }

    fn resolve_stmts(&mut self, stmts: &[Stmt], ctx: Context) {
        for stmt in stmts {
            self.resolve_stmt(stmt, ctx);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt, ctx: Context) {
        match stmt {
            Stmt::Block(stmts) => {
                self.begin_scope();
                self.resolve_stmts(stmts, ctx);
                self.end_scope();
            }
            Stmt::Break(keyword) => {
                if !ctx.in_loop {
                    self.error(
                        keyword.location(),
                        "Can't use 'break' outside of a loop.",
                        "You can only use the `break` keyword within a `while` or `for` loop.",
                    );
                }
            }
            Stmt::Class(class) => self.resolve_class(class, ctx),
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr, ctx),
            Stmt::Fun(decl) => {
                if let Some(name) = &decl.name {
                    self.declare(name);
                    self.define(name.lexeme());
                }

                self.resolve_function(decl, FunctionKind::Function, ctx);
            }
            Stmt::If(cond, then_branch, else_branch) => {
                self.resolve_expr(cond, ctx);
                self.resolve_stmt(then_branch, ctx);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch, ctx);
                }
            }
            Stmt::Return(keyword, value) => {
                if ctx.function == FunctionKind::None {
                    self.error(
                        keyword.location(),
                        "Can't return from top-level code.",
                        "You can only use the `return` keyword within a function.",
                    );
                }

                if let Some(value) = value {
                    if ctx.function == FunctionKind::Initializer {
                        self.error(
                            keyword.location(),
                            "Can't return a value from an initializer.",
                            "Use a bare `return;` to leave an initializer early, it always produces the new instance.",
                        );
                    }

                    self.resolve_expr(value, ctx);
                }
            }
            Stmt::Var(name, init) => {
                self.declare(name);
                if let Some(init) = init {
                    self.resolve_expr(init, ctx);
                }
                self.define(name.lexeme());
            }
            Stmt::While(cond, body) => {
                self.resolve_expr(cond, ctx);
                self.resolve_stmt(body, Context { in_loop: true, ..ctx });
            }
        }
    }

    fn resolve_class(&mut self, class: &ClassDecl, ctx: Context) {
        self.declare(&class.name);
        self.define(class.name.lexeme());

        let kind = if let Some(superclass) = &class.superclass {
            match superclass {
                Expr::Var(_, name) if name.lexeme() == class.name.lexeme() => self.error(
                    name.location(),
                    "A class can't inherit from itself.",
                    "Remove the superclass, or inherit from a different class.",
                ),
                _ => self.resolve_expr(superclass, ctx),
            }

            self.begin_scope();
            self.define("super");
            ClassKind::Subclass
        } else {
            ClassKind::Class
        };

        self.begin_scope();
        self.define("this");

        let ctx = Context { class: kind, ..ctx };
        for method in class.methods.iter() {
            let kind = if method.name() == Some("init") {
                FunctionKind::Initializer
            } else {
                FunctionKind::Method
            };

            self.resolve_function(method, kind, ctx);
        }

        self.end_scope();

        if class.superclass.is_some() {
            self.end_scope();
        }
    }

    fn resolve_function(&mut self, decl: &Rc<FunDecl>, kind: FunctionKind, ctx: Context) {
        let ctx = Context {
            function: kind,
            class: ctx.class,
            in_loop: false,
        };

        self.begin_scope();
        for param in decl.params.iter() {
            self.declare(param);
            self.define(param.lexeme());
        }

        self.resolve_stmts(&decl.body, ctx);
        self.end_scope();
    }

    fn resolve_expr(&mut self, expr: &Expr, ctx: Context) {
        match expr {
            Expr::Assign(id, name, value) => {
                self.resolve_expr(value, ctx);
                self.resolve_local(*id, name.lexeme());
            }
            Expr::Binary(left, _, right) | Expr::Logical(left, _, right) => {
                self.resolve_expr(left, ctx);
                self.resolve_expr(right, ctx);
            }
            Expr::Call(callee, args, _) => {
                self.resolve_expr(callee, ctx);
                for arg in args {
                    self.resolve_expr(arg, ctx);
                }
            }
            Expr::Get(object, _) => self.resolve_expr(object, ctx),
            Expr::Fun(decl) => self.resolve_function(decl, FunctionKind::Function, ctx),
            Expr::Grouping(expr) | Expr::Unary(_, expr) => self.resolve_expr(expr, ctx),
            Expr::Literal(..) => {}
            Expr::Set(object, _, value) => {
                self.resolve_expr(value, ctx);
                self.resolve_expr(object, ctx);
            }
            Expr::Super(id, keyword, _) => {
                match ctx.class {
                    ClassKind::None => self.error(
                        keyword.location(),
                        "Can't use 'super' outside of a class.",
                        "You can only use `super` within the methods of a class which has a superclass.",
                    ),
                    ClassKind::Class => self.error(
                        keyword.location(),
                        "Can't use 'super' in a class with no superclass.",
                        "Declare a superclass with `class Name < Superclass`, or call the method on `this` instead.",
                    ),
                    ClassKind::Subclass => {}
                }

                self.resolve_local(*id, "super");
            }
            Expr::This(id, keyword) => {
                if ctx.class == ClassKind::None {
                    self.error(
                        keyword.location(),
                        "Can't use 'this' outside of a class.",
                        "You can only access `this` within a class method.",
                    );
                }

                self.resolve_local(*id, "this");
            }
            Expr::Var(id, name) => {
                let reading_own_initializer = self
                    .scopes
                    .last()
                    .map(|scope| scope.status(name.lexeme()) == Status::Declared)
                    .unwrap_or_default();

                if reading_own_initializer {
                    self.error(
                        name.location(),
                        "Can't read local variable in its own initializer.",
                        "Make sure you are not masking a variable with the same name and try using a different name for this variable if you are.",
                    );
                }

                self.resolve_local(*id, name.lexeme());
            }
        }
    }
}
