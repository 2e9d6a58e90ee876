use std::rc::Rc;

use crate::{errors, lexer::{Token, TokenType}, LoxError, Loc};

use super::{ClassDecl, Expr, ExprId, FunDecl, Literal, Stmt};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

// Implements a left-associative binary precedence level: `operand (op operand)*`.
macro_rules! rd_binary {
    ($name:ident := $operand:ident ( $($token:ident)|+ )* => $kind:ident) => {
        fn $name(&mut self) -> Result<Expr, LoxError> {
            let mut left = self.$operand()?;

            while let Some(op) = self.matches(&[$(TokenType::$token),+]) {
                let right = self.$operand()?;
                left = Expr::$kind(Box::new(left), op, Box::new(right));
            }

            Ok(left)
        }
    };
}

impl Parser {
    pub fn parse<T: IntoIterator<Item = Token>>(tokens: T) -> (Vec<Stmt>, Vec<LoxError>) {
        let mut parser = Self::new(tokens);
        let mut stmts = Vec::new();
        let mut errs = Vec::new();

        while !parser.is_at_end() {
            match parser.declaration() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    parser.synchronize();
                    errs.push(err);
                }
            }
        }

        (stmts, errs)
    }

    pub fn parse_expr<T: IntoIterator<Item = Token>>(tokens: T) -> Result<Expr, LoxError> {
        Self::new(tokens).expression()
    }

    fn new<T: IntoIterator<Item = Token>>(tokens: T) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
            current: 0,
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn check(&self, ty: TokenType) -> bool {
        self.tokens.get(self.current).map(|t| t.is(ty)).unwrap_or_default()
    }

    fn check_next(&self, ty: TokenType) -> bool {
        self.tokens.get(self.current + 1).map(|t| t.is(ty)).unwrap_or_default()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned();
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    fn matches(&mut self, ty: &[TokenType]) -> Option<Token> {
        if self.tokens.get(self.current).map(|t| t.is_one_of(ty)).unwrap_or_default() {
            self.advance()
        } else {
            None
        }
    }

    /// The location of the end of the input, which is the line of the last token.
    fn end_location(&self) -> Loc {
        self.tokens.last().map(|t| t.location()).unwrap_or_else(|| Loc::new(1))
    }

    fn consume(&mut self, ty: TokenType, msg: &str, advice: &str) -> Result<Token, LoxError> {
        match self.advance() {
            Some(token) if token.is(ty) => Ok(token),
            Some(token) => Err(errors::language(
                token.location(),
                format!("{}, but got {} instead.", msg, token),
                advice,
            )),
            None => Err(errors::language(
                self.end_location(),
                format!("{}, but reached the end of the file instead.", msg),
                advice,
            )),
        }
    }

    fn declaration(&mut self) -> Result<Stmt, LoxError> {
        if self.matches(&[TokenType::Class]).is_some() {
            return self.class_declaration();
        }

        // `fun` followed by a name declares a function, otherwise it starts an
        // anonymous function expression.
        if self.check(TokenType::Fun) && self.check_next(TokenType::Identifier) {
            self.advance();
            return Ok(Stmt::Fun(self.function("function")?));
        }

        if self.matches(&[TokenType::Var]).is_some() {
            return self.var_declaration();
        }

        self.statement()
    }

    fn class_declaration(&mut self) -> Result<Stmt, LoxError> {
        let name = self.consume(TokenType::Identifier, "Expected a class name after 'class'", "Provide a name for your class after the `class` keyword.")?;

        let superclass = if self.matches(&[TokenType::Less]).is_some() {
            let superclass = self.consume(TokenType::Identifier, "Expected a superclass name after '<'", "Provide the name of the class you wish to inherit from after the `<`.")?;
            Some(Expr::Var(ExprId::fresh(), superclass))
        } else {
            None
        };

        self.consume(TokenType::LeftBrace, "Expected an opening brace `{` before the class body", "Make sure you have an opening brace `{` after the class name.")?;

        let mut methods = Vec::new();
        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RightBrace, "Expected a closing brace `}` after the class body", "Make sure you have a closing brace `}` after the class body.")?;

        Ok(Stmt::Class(ClassDecl { name, superclass, methods }))
    }

    fn function(&mut self, kind: &str) -> Result<Rc<FunDecl>, LoxError> {
        let name = self.consume(
            TokenType::Identifier,
            &format!("Expected a {} name", kind),
            &format!("Provide a name for your {}.", kind),
        )?;

        self.function_body(name.location(), Some(name))
    }

    fn function_body(&mut self, loc: Loc, name: Option<Token>) -> Result<Rc<FunDecl>, LoxError> {
        self.consume(TokenType::LeftParen, "Expected an opening parenthesis `(` before the parameter list", "Make sure you have an opening parenthesis `(` before the function's parameters.")?;

        let mut params = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                params.push(self.consume(TokenType::Identifier, "Expected a parameter name", "Function parameters must be identifiers separated by commas.")?);
                if self.matches(&[TokenType::Comma]).is_none() {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "Expected a closing parenthesis `)` after the parameter list", "Make sure you have a closing parenthesis `)` after the function's parameters.")?;
        self.consume(TokenType::LeftBrace, "Expected an opening brace `{` before the function body", "Make sure you have an opening brace `{` before the function's body.")?;

        let body = self.block()?;

        Ok(Rc::new(FunDecl { loc, name, params, body }))
    }

    fn var_declaration(&mut self) -> Result<Stmt, LoxError> {
        let name = self.consume(TokenType::Identifier, "Expected an identifier to be provided after 'var'", "Provide a variable name after the `var` keyword.")?;

        let init = if self.matches(&[TokenType::Equal]).is_some() {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::Semicolon, "Expected ';' after variable declaration", "Make sure that you have a semicolon after the variable declaration.")?;

        Ok(Stmt::Var(name, init))
    }

    fn statement(&mut self) -> Result<Stmt, LoxError> {
        if let Some(token) = self.matches(&[
            TokenType::Break,
            TokenType::For,
            TokenType::If,
            TokenType::LeftBrace,
            TokenType::Print,
            TokenType::Return,
            TokenType::While,
        ]) {
            return match token.token_type() {
                TokenType::Break => {
                    self.consume(TokenType::Semicolon, "Expected ';' after 'break'", "Make sure that you have a semicolon after the `break` keyword.")?;
                    Ok(Stmt::Break(token))
                }
                TokenType::For => self.for_statement(),
                TokenType::If => self.if_statement(),
                TokenType::LeftBrace => Ok(Stmt::Block(self.block()?)),
                TokenType::Print => {
                    let expr = self.expression()?;
                    self.consume(TokenType::Semicolon, "Expected ';' after value", "Make sure that you have a semicolon at the end of your print statement.")?;
                    Ok(Stmt::Print(expr))
                }
                TokenType::Return => self.return_statement(token),
                _ => self.while_statement(),
            };
        }

        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expected ';' after expression", "Make sure that you have a semicolon at the end of your previous expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn return_statement(&mut self, keyword: Token) -> Result<Stmt, LoxError> {
        let value = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };

        self.consume(TokenType::Semicolon, "Expected ';' after return value", "Make sure that you have a semicolon at the end of your return statement.")?;

        Ok(Stmt::Return(keyword, value))
    }

    fn if_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(TokenType::LeftParen, "Expected an opening parenthesis `(` after the `if` keyword", "Make sure you have an opening parenthesis `(` after the `if` keyword.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expected a closing parenthesis `)` after the `if` keyword's condition", "Make sure you have a closing parenthesis `)` after the `if` keyword's condition.")?;

        let then_branch = self.statement()?;
        let else_branch = if self.matches(&[TokenType::Else]).is_some() {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If(condition, Box::new(then_branch), else_branch))
    }

    fn for_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(TokenType::LeftParen, "Expected an opening parenthesis `(` after the `for` keyword", "Make sure you have an opening parenthesis `(` after the `for` keyword.")?;

        let init = if self.matches(&[TokenType::Semicolon]).is_some() {
            None
        } else if self.matches(&[TokenType::Var]).is_some() {
            Some(self.var_declaration()?)
        } else {
            let expr = Stmt::Expression(self.expression()?);
            self.consume(TokenType::Semicolon, "Expected a semicolon after the initializer", "Make sure you have a semicolon after the initializer.")?;
            Some(expr)
        };

        let cond = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        let semicolon = self.consume(TokenType::Semicolon, "Expected a semicolon after the condition", "Make sure you have a semicolon after the condition.")?;

        let incr = if self.check(TokenType::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::RightParen, "Expected a closing parenthesis `)` after the `for` clauses", "Make sure you have a closing parenthesis `)` after the `for` keyword's clauses.")?;

        let mut body = self.statement()?;

        if let Some(incr) = incr {
            body = Stmt::Block(vec![body, Stmt::Expression(incr)]);
        }

        let cond = cond.unwrap_or_else(|| Expr::Literal(semicolon.location(), Literal::Bool(true)));
        body = Stmt::While(cond, Box::new(body));

        if let Some(init) = init {
            body = Stmt::Block(vec![init, body]);
        }

        Ok(body)
    }

    fn while_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(TokenType::LeftParen, "Expected an opening parenthesis `(` after the `while` keyword", "Make sure you have an opening parenthesis `(` after the `while` keyword.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expected a closing parenthesis `)` after the `while` keyword's condition", "Make sure you have a closing parenthesis `)` after the `while` keyword's condition.")?;

        let body = self.statement()?;

        Ok(Stmt::While(condition, Box::new(body)))
    }

    fn block(&mut self) -> Result<Vec<Stmt>, LoxError> {
        let mut stmts = Vec::new();

        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            stmts.push(self.declaration()?);
        }

        self.consume(TokenType::RightBrace, "Expected a closing brace `}` after the block", "Make sure you have a closing brace `}` after the block.")?;

        Ok(stmts)
    }

    fn expression(&mut self) -> Result<Expr, LoxError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, LoxError> {
        let expr = self.or()?;

        if let Some(equals) = self.matches(&[TokenType::Equal]) {
            let value = self.assignment()?;

            return match expr {
                Expr::Var(_, name) => Ok(Expr::Assign(ExprId::fresh(), name, Box::new(value))),
                Expr::Get(object, name) => Ok(Expr::Set(object, name, Box::new(value))),
                _ => Err(errors::language(
                    equals.location(),
                    "Invalid assignment target.",
                    "Make sure that you provide the name of a variable or an object's property to assign to.",
                )),
            };
        }

        Ok(expr)
    }

    rd_binary!(or := and (Or)* => Logical);

    rd_binary!(and := equality (And)* => Logical);

    rd_binary!(equality := comparison (BangEqual | EqualEqual)* => Binary);

    rd_binary!(comparison := term (Greater | GreaterEqual | Less | LessEqual)* => Binary);

    rd_binary!(term := factor (Minus | Plus)* => Binary);

    rd_binary!(factor := unary (Slash | Star)* => Binary);

    fn unary(&mut self) -> Result<Expr, LoxError> {
        if let Some(op) = self.matches(&[TokenType::Bang, TokenType::Minus]) {
            let right = self.unary()?;
            return Ok(Expr::Unary(op, Box::new(right)));
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.primary()?;

        loop {
            if self.matches(&[TokenType::LeftParen]).is_some() {
                let mut args = Vec::new();
                if !self.check(TokenType::RightParen) {
                    loop {
                        args.push(self.expression()?);
                        if self.matches(&[TokenType::Comma]).is_none() {
                            break;
                        }
                    }
                }

                let close = self.consume(TokenType::RightParen, "Expected a closing parenthesis `)` after the arguments", "Make sure you have a closing parenthesis `)` after the call's arguments.")?;
                expr = Expr::Call(Box::new(expr), args, close);
            } else if self.matches(&[TokenType::Dot]).is_some() {
                let name = self.consume(TokenType::Identifier, "Expected a property name after '.'", "Provide the name of the property or method you wish to access.")?;
                expr = Expr::Get(Box::new(expr), name);
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, LoxError> {
        let token = match self.advance() {
            Some(token) => token,
            None => return Err(errors::language(
                self.end_location(),
                "Reached the end of the input while waiting for an expression.",
                "Make sure that you have provided a valid expression.",
            )),
        };

        let loc = token.location();
        match token.token_type() {
            TokenType::False => Ok(Expr::Literal(loc, Literal::Bool(false))),
            TokenType::True => Ok(Expr::Literal(loc, Literal::Bool(true))),
            TokenType::Nil => Ok(Expr::Literal(loc, Literal::Nil)),
            TokenType::Number | TokenType::String => match token.literal() {
                Some(literal) => Ok(Expr::Literal(loc, literal.clone())),
                None => Err(errors::system(
                    format!("The literal {} was not given a value by the scanner.", token),
                    "This is a bug in the interpreter, please report it with example code.",
                )),
            },
            TokenType::Super => {
                self.consume(TokenType::Dot, "Expected '.' after 'super'", "You can only use `super` to access a superclass method, like `super.method()`.")?;
                let method = self.consume(TokenType::Identifier, "Expected a superclass method name", "Provide the name of the superclass method after `super.`.")?;
                Ok(Expr::Super(ExprId::fresh(), token, method))
            }
            TokenType::This => Ok(Expr::This(ExprId::fresh(), token)),
            TokenType::Identifier => Ok(Expr::Var(ExprId::fresh(), token)),
            TokenType::Fun => Ok(Expr::Fun(self.function_body(loc, None)?)),
            TokenType::LeftParen => {
                let expr = self.expression()?;
                self.consume(TokenType::RightParen, "Expected a closing parenthesis `)` after the expression", "Make sure you have a closing parenthesis `)` after the expression.")?;
                Ok(Expr::Grouping(Box::new(expr)))
            }
            _ => Err(errors::language(
                loc,
                format!("Encountered an unexpected token {} while waiting for an expression.", token),
                "Make sure that you are providing a value, variable, call or grouping at this location.",
            )),
        }
    }

    fn synchronize(&mut self) {
        while let Some(token) = self.advance() {
            // If we reach a semicolon, we can stop because the next token will be the start of a new statement
            if token.is(TokenType::Semicolon) {
                return;
            }

            // If the next token is the start of a new statement, we can stop
            let at_statement = self.tokens.get(self.current).map(|t| t.is_one_of(&[
                TokenType::Class,
                TokenType::Fun,
                TokenType::Var,
                TokenType::For,
                TokenType::If,
                TokenType::While,
                TokenType::Print,
                TokenType::Return,
            ])).unwrap_or_default();

            if at_statement {
                return;
            }
        }
    }
}
