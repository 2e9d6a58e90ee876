use std::{rc::Rc, sync::atomic::{AtomicUsize, Ordering}};

use crate::{lexer::Token, Loc};

use super::{FunDecl, Literal};

/// Identifies a single variable access site within a program.
///
/// Identities are handed out once, at parse time, and are unique for the
/// lifetime of the process; cloning a node keeps its identity. The resolver's
/// depth table is keyed by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        ExprId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Assign(ExprId, Token, Box<Expr>),
    Binary(Box<Expr>, Token, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>, Token),
    Get(Box<Expr>, Token),
    Fun(Rc<FunDecl>),
    Grouping(Box<Expr>),
    Literal(Loc, Literal),
    Logical(Box<Expr>, Token, Box<Expr>),
    Set(Box<Expr>, Token, Box<Expr>),
    /// `super.method`, holding the `super` keyword and the method name.
    Super(ExprId, Token, Token),
    This(ExprId, Token),
    Unary(Token, Box<Expr>),
    Var(ExprId, Token),
}

impl Expr {
    pub fn location(&self) -> Loc {
        match self {
            Expr::Assign(_, name, _) => name.location(),
            Expr::Binary(_, op, _) => op.location(),
            Expr::Call(_, _, close) => close.location(),
            Expr::Get(_, name) => name.location(),
            Expr::Fun(decl) => decl.loc,
            Expr::Grouping(expr) => expr.location(),
            Expr::Literal(loc, _) => *loc,
            Expr::Logical(_, op, _) => op.location(),
            Expr::Set(_, name, _) => name.location(),
            Expr::Super(_, keyword, _) => keyword.location(),
            Expr::This(_, keyword) => keyword.location(),
            Expr::Unary(op, _) => op.location(),
            Expr::Var(_, name) => name.location(),
        }
    }
}
