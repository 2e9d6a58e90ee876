use std::{io::Write, rc::Rc};

use fnv::FnvHashMap;

use crate::{
    ast::{ClassDecl, Expr, ExprId, FunDecl, Stmt},
    errors,
    lexer::{Token, TokenType},
    LoxError,
};

use super::{inter::Flow, Class, Fun, Interpreter, Value};

impl Interpreter {
    pub(crate) fn execute(&mut self, stmt: &Stmt) -> Result<Flow, LoxError> {
        match stmt {
            Stmt::Block(stmts) => {
                let env = self.env.branch();
                self.execute_block(stmts, env)
            }
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Class(decl) => {
                self.declare_class(decl)?;
                Ok(Flow::Normal)
            }
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Fun(decl) => {
                let name = declared_name(decl)?;
                self.env.define(name, Value::Function(Fun::closure(decl.clone(), self.env.clone())));
                Ok(Flow::Normal)
            }
            Stmt::If(cond, then_branch, else_branch) => {
                if self.evaluate(cond)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                Ok(Flow::Normal)
            }
            Stmt::Return(_, value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }
            Stmt::Var(name, init) => {
                let value = match init {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.env.define(name.lexeme(), value);
                Ok(Flow::Normal)
            }
            Stmt::While(cond, body) => {
                while self.evaluate(cond)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }

                Ok(Flow::Normal)
            }
        }
    }

    pub(crate) fn evaluate(&mut self, expr: &Expr) -> Result<Value, LoxError> {
        match expr {
            Expr::Assign(id, name, value) => {
                let value = self.evaluate(value)?;
                let assigned = match self.locals.get(id) {
                    Some(&depth) => self.env.assign_at(depth, name.lexeme(), value.clone()),
                    None => self.globals.assign(name.lexeme(), value.clone()),
                };

                if !assigned {
                    return Err(undefined_variable(name));
                }

                Ok(value)
            }
            Expr::Binary(left, op, right) => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(op, left, right)
            }
            Expr::Call(callee, args, paren) => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg)?);
                }

                let callable = callee.as_callable().ok_or_else(|| errors::runtime(
                    paren.location(),
                    "Can only call functions and classes.",
                    format!("A {} cannot be called, make sure you are calling the value you intended to.", callee.type_name()),
                ))?;

                if callable.arity() != values.len() {
                    return Err(errors::runtime(
                        paren.location(),
                        format!("Expected {} arguments but got {}.", callable.arity(), values.len()),
                        format!("Make sure that you are passing the right number of arguments to `{}`.", callee),
                    ));
                }

                tracing::trace!(callee = %callee, args = values.len(), "calling");
                callable.call(self, values).map_err(|err| err.at(paren.location()))
            }
            Expr::Get(object, name) => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name.lexeme()).ok_or_else(|| errors::runtime(
                    name.location(),
                    format!("Undefined property '{}'.", name.lexeme()),
                    format!("Make sure that '{}' is a field or method of `{}` before accessing it.", name.lexeme(), instance),
                )),
                other => Err(errors::runtime(
                    name.location(),
                    "Only instances have properties.",
                    format!("A {} has no properties, only class instances do.", other.type_name()),
                )),
            },
            Expr::Fun(decl) => Ok(Value::Function(Fun::closure(decl.clone(), self.env.clone()))),
            Expr::Grouping(expr) => self.evaluate(expr),
            Expr::Literal(_, value) => Ok(value.into()),
            Expr::Logical(left, op, right) => {
                let left = self.evaluate(left)?;

                match op.token_type() {
                    TokenType::Or if left.is_truthy() => Ok(left),
                    TokenType::And if !left.is_truthy() => Ok(left),
                    _ => self.evaluate(right),
                }
            }
            Expr::Set(object, name, value) => {
                let instance = match self.evaluate(object)? {
                    Value::Instance(instance) => instance,
                    other => return Err(errors::runtime(
                        name.location(),
                        "Only instances have fields.",
                        format!("A {} cannot hold fields, only class instances can.", other.type_name()),
                    )),
                };

                let value = self.evaluate(value)?;
                instance.set(name.lexeme(), value.clone());
                Ok(value)
            }
            Expr::Super(id, keyword, method) => self.super_method(*id, keyword, method),
            Expr::This(id, keyword) => self.look_up_variable(*id, keyword),
            Expr::Unary(op, right) => {
                let right = self.evaluate(right)?;

                match (op.token_type(), right) {
                    (TokenType::Bang, right) => Ok(Value::Bool(!right.is_truthy())),
                    (TokenType::Minus, Value::Number(n)) => Ok(Value::Number(-n)),
                    (TokenType::Minus, _) => Err(errors::runtime(
                        op.location(),
                        "Operand must be a number.",
                        "Only numbers can be negated.",
                    )),
                    (ty, _) => Err(unexpected_operator(op, ty)),
                }
            }
            Expr::Var(id, name) => self.look_up_variable(*id, name),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value, LoxError> {
        let value = match self.locals.get(&id) {
            Some(&depth) => self.env.get_at(depth, name.lexeme()),
            None => self.globals.get(name.lexeme()),
        };

        value.ok_or_else(|| undefined_variable(name))
    }

    fn super_method(&self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value, LoxError> {
        let depth = self.locals.get(&id).copied().ok_or_else(|| errors::system(
            format!("The use of `super` at {} was never resolved.", keyword.location()),
            "This is a bug in the interpreter, please report it with example code.",
        ))?;

        // The environment holding `this` is always the one directly inside
        // the environment holding `super`.
        let superclass = match self.env.get_at(depth, "super") {
            Some(Value::Class(class)) => class,
            _ => return Err(errors::system(
                format!("Failed to find the superclass referenced at {}.", keyword.location()),
                "This is a bug in the interpreter, please report it with example code.",
            )),
        };

        let instance = match depth.checked_sub(1).and_then(|depth| self.env.get_at(depth, "this")) {
            Some(Value::Instance(instance)) => instance,
            _ => return Err(errors::system(
                format!("Failed to find the instance bound to `super` at {}.", keyword.location()),
                "This is a bug in the interpreter, please report it with example code.",
            )),
        };

        match superclass.find_method(method.lexeme()) {
            Some(fun) => Ok(Value::Function(fun.bind(instance))),
            None => Err(errors::runtime(
                method.location(),
                format!("Undefined property '{}'.", method.lexeme()),
                format!("Make sure that `{}` or one of its superclasses defines '{}'.", superclass, method.lexeme()),
            )),
        }
    }

    fn declare_class(&mut self, decl: &ClassDecl) -> Result<(), LoxError> {
        let superclass = match &decl.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                other => return Err(errors::runtime(
                    expr.location(),
                    "Superclass must be a class.",
                    format!("`{}` is a {}, classes may only inherit from other classes.", other, other.type_name()),
                )),
            },
            None => None,
        };

        let env = match &superclass {
            Some(superclass) => {
                let env = self.env.branch();
                env.define("super", Value::Class(superclass.clone()));
                env
            }
            None => self.env.clone(),
        };

        let mut methods = FnvHashMap::default();
        for method in &decl.methods {
            let name = declared_name(method)?;
            let fun = if name == "init" {
                Fun::initializer(method.clone(), env.clone())
            } else {
                Fun::closure(method.clone(), env.clone())
            };

            methods.insert(name.to_string(), fun);
        }

        tracing::debug!(class = decl.name.lexeme(), methods = methods.len(), inherits = superclass.is_some(), "declaring class");

        let class = Class::new(decl.name.lexeme(), superclass, methods);
        self.env.define(decl.name.lexeme(), Value::Class(Rc::new(class)));
        Ok(())
    }
}

fn binary(op: &Token, left: Value, right: Value) -> Result<Value, LoxError> {
    match op.token_type() {
        TokenType::EqualEqual => Ok(Value::Bool(left == right)),
        TokenType::BangEqual => Ok(Value::Bool(left != right)),
        TokenType::Plus => match (left, right) {
            (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left + right)),
            (Value::String(left), Value::String(right)) => Ok(Value::String(left + &right)),
            _ => Err(errors::runtime(
                op.location(),
                "Operands must be two numbers or two strings.",
                "Convert both sides to the same type before adding them.",
            )),
        },
        ty => {
            let (left, right) = match (left, right) {
                (Value::Number(left), Value::Number(right)) => (left, right),
                _ => return Err(errors::runtime(
                    op.location(),
                    "Operands must be numbers.",
                    format!("The '{}' operator only works on numbers.", op.lexeme()),
                )),
            };

            match ty {
                TokenType::Minus => Ok(Value::Number(left - right)),
                TokenType::Star => Ok(Value::Number(left * right)),
                TokenType::Slash => Ok(Value::Number(left / right)),
                TokenType::Greater => Ok(Value::Bool(left > right)),
                TokenType::GreaterEqual => Ok(Value::Bool(left >= right)),
                TokenType::Less => Ok(Value::Bool(left < right)),
                TokenType::LessEqual => Ok(Value::Bool(left <= right)),
                ty => Err(unexpected_operator(op, ty)),
            }
        }
    }
}

fn declared_name(decl: &FunDecl) -> Result<&str, LoxError> {
    decl.name().ok_or_else(|| errors::system(
        format!("The function declared at {} has no name.", decl.loc),
        "This is a bug in the interpreter, please report it with example code.",
    ))
}

fn undefined_variable(name: &Token) -> LoxError {
    errors::runtime(
        name.location(),
        format!("Undefined variable '{}'.", name.lexeme()),
        format!("Declare '{}' with `var` before using it.", name.lexeme()),
    )
}

fn unexpected_operator(op: &Token, ty: TokenType) -> LoxError {
    errors::system(
        format!("Encountered an unexpected operator {:?} at {}.", ty, op.location()),
        "This is a bug in the interpreter, please report it with example code.",
    )
}

#[cfg(test)]
mod tests {
    use crate::{ast::Parser, lexer::Scanner, CaptureOutput, ErrorKind};

    use super::*;

    fn run(source: &str) -> (String, Vec<LoxError>) {
        let (tree, errs) = Parser::parse(Scanner::new(source).filter_map(|x| x.ok()));
        assert!(errs.is_empty(), "the program should parse: {:?}", errs);

        let output = CaptureOutput::new();
        let mut interpreter = Interpreter::default().with_output(Box::new(output.clone()));
        let errs = interpreter.interpret(&tree);
        (output.contents(), errs)
    }

    fn run_ok(source: &str) -> String {
        let (output, errs) = run(source);
        assert!(errs.is_empty(), "the program should run without errors: {:?}", errs);
        output
    }

    fn run_err(source: &str) -> LoxError {
        let (_, mut errs) = run(source);
        assert_eq!(errs.len(), 1, "the program should fail with exactly one error: {:?}", errs);
        errs.remove(0)
    }

    #[test]
    fn test_basic_math() {
        assert_eq!(run_ok("print 10 - 12 / (2 * 3);"), "8\n");
        assert_eq!(run_ok("print 1 / 4 + 0.5;"), "0.75\n");
        assert_eq!(run_ok("print \"con\" + \"cat\";"), "concat\n");
        assert_eq!(run_ok("print 3 >= 3 == !false;"), "true\n");
    }

    #[test]
    fn closures_capture_their_definition_scope() {
        let source = r#"
            var a = "global";
            {
                fun showA() {
                    print a;
                }

                showA();
                var a = "block";
                showA();
            }
        "#;

        assert_eq!(run_ok(source), "global\nglobal\n");
    }

    #[test]
    fn closures_keep_their_state() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    return i;
                }
                return count;
            }

            var first = makeCounter();
            var second = makeCounter();
            print first();
            print first();
            print second();
        "#;

        assert_eq!(run_ok(source), "1\n2\n1\n");
    }

    #[test]
    fn methods_can_be_overridden_and_reached_through_super() {
        let source = r#"
            class A {
                greet() { return "A"; }
            }

            class B < A {
                greet() { return "B then " + super.greet(); }
            }

            class C < B {}

            print A().greet();
            print B().greet();
            print C().greet();
        "#;

        assert_eq!(run_ok(source), "A\nB then A\nB then A\n");
    }

    #[test]
    fn initializers_return_this() {
        let source = r#"
            class Point {
                init(x, y) {
                    this.x = x;
                    this.y = y;
                    return;
                }
            }

            var p = Point(1, 2);
            print p.x + p.y;
            print p.init(3, 4) == p;
            print p.x;
            print p;
            print Point;
        "#;

        assert_eq!(run_ok(source), "3\ntrue\n3\nPoint instance\nPoint\n");
    }

    #[test]
    fn bound_methods_remember_their_instance() {
        let source = r#"
            class Box {
                init(value) { this.value = value; }
                get() { return this.value; }
            }

            var getter = Box("kept").get;
            print getter();
            print getter;
        "#;

        assert_eq!(run_ok(source), "kept\n<fn get>\n");
    }

    #[test]
    fn globals_can_be_referenced_before_they_are_declared() {
        let source = r#"
            fun early() { return later; }
            var later = "ok";
            print early();
        "#;

        assert_eq!(run_ok(source), "ok\n");
    }

    #[test]
    fn loops_and_break() {
        let source = r#"
            for (var i = 0; i < 10; i = i + 1) {
                if (i == 3) break;
                print i;
            }

            var n = 0;
            while (true) {
                n = n + 1;
                if (n > 4) break;
            }
            print n;
        "#;

        assert_eq!(run_ok(source), "0\n1\n2\n5\n");
    }

    #[test]
    fn return_unwinds_through_loops() {
        let source = r#"
            fun find() {
                while (true) {
                    for (var i = 0; ; i = i + 1) {
                        if (i == 2) return i;
                    }
                }
            }

            print find();
        "#;

        assert_eq!(run_ok(source), "2\n");
    }

    #[test]
    fn logical_operators_short_circuit() {
        let source = r#"
            fun loud(value) { print value; return value; }

            print loud(false) and loud("skipped");
            print loud(1) or loud("skipped");
            print nil or "fallback";
        "#;

        assert_eq!(run_ok(source), "false\nfalse\n1\n1\nfallback\n");
    }

    #[test]
    fn natives() {
        assert_eq!(run_ok("print clock() > 0;"), "true\n");
        assert_eq!(run_ok("print clock;"), "<native fn>\n");
        assert_eq!(run_ok("assert(1 == 1, \"fine\");"), "");

        let err = run_err("\n\nassert(1 == 2, \"numbers differ\");");
        assert!(err.is(ErrorKind::Runtime));
        assert_eq!(err.description(), "Assertion failed: numbers differ");
        assert_eq!(err.line(), Some(3), "native errors are reported at the call site");
    }

    #[test]
    fn calling_a_non_callable_is_a_runtime_error() {
        let err = run_err("print \"before\";\n\"text\"();");
        assert!(err.is(ErrorKind::Runtime));
        assert_eq!(err.description(), "Can only call functions and classes.");
        assert_eq!(err.line(), Some(2));

        let (output, _) = run("print \"before\";\n\"text\"();\nprint \"after\";");
        assert_eq!(output, "before\n", "execution stops at the first runtime error");
    }

    #[test]
    fn arity_is_checked() {
        let err = run_err("fun f(a, b) {}\nf(1);");
        assert_eq!(err.description(), "Expected 2 arguments but got 1.");

        let err = run_err("class A { init(a) {} }\nA();");
        assert_eq!(err.description(), "Expected 1 arguments but got 0.");
    }

    #[test]
    fn undefined_variables() {
        let err = run_err("x = 1;");
        assert_eq!(err.description(), "Undefined variable 'x'.");

        let err = run_err("print missing;");
        assert_eq!(err.description(), "Undefined variable 'missing'.");
    }

    #[test]
    fn operand_type_errors() {
        assert_eq!(run_err("print 1 + \"a\";").description(), "Operands must be two numbers or two strings.");
        assert_eq!(run_err("print 1 < \"a\";").description(), "Operands must be numbers.");
        assert_eq!(run_err("print -\"a\";").description(), "Operand must be a number.");
    }

    #[test]
    fn property_errors() {
        assert_eq!(run_err("var x = 1;\nprint x.y;").description(), "Only instances have properties.");
        assert_eq!(run_err("var x = 1;\nx.y = 2;").description(), "Only instances have fields.");
        assert_eq!(run_err("class A {}\nprint A().missing;").description(), "Undefined property 'missing'.");
        assert_eq!(run_err("var NotAClass = 1;\nclass B < NotAClass {}").description(), "Superclass must be a class.");
    }

    #[test]
    fn resolution_errors_prevent_execution() {
        let (output, errs) = run("print \"unreachable\";\n{ var a = 1; var a = 2; }");
        assert_eq!(output, "");
        assert_eq!(errs.len(), 1);
        assert!(errs[0].is(ErrorKind::Resolution));
        assert_eq!(errs[0].line(), Some(2));
    }

    #[test]
    fn anonymous_functions() {
        let source = r#"
            fun apply(f, x) { return f(x); }
            print apply(fun (n) { return n * 2; }, 21);
            print fun () {};
        "#;

        assert_eq!(run_ok(source), "42\n<fn>\n");
    }
}
