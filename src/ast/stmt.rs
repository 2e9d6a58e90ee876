use std::rc::Rc;

use crate::{lexer::Token, Loc};

use super::Expr;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Vec<Stmt>),
    Break(Token),
    Class(ClassDecl),
    Expression(Expr),
    Fun(Rc<FunDecl>),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    Print(Expr),
    Return(Token, Option<Expr>),
    Var(Token, Option<Expr>),
    While(Expr, Box<Stmt>),
}

/// A named function, method or anonymous function literal.
#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub loc: Loc,
    pub name: Option<Token>,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

impl FunDecl {
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(|n| n.lexeme())
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Token,
    pub superclass: Option<Expr>,
    pub methods: Vec<Rc<FunDecl>>,
}
