use super::{ClassDecl, Expr, FunDecl, Literal, Stmt};

/// Renders syntax trees as S-expressions.
pub struct AstPrinter {}

impl AstPrinter {
    pub fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Assign(_, ident, value) => format!("(= {} {})", ident.lexeme(), self.expr(value)),
            Expr::Binary(left, op, right) | Expr::Logical(left, op, right) => {
                format!("({} {} {})", op.lexeme(), self.expr(left), self.expr(right))
            }
            Expr::Call(callee, args, _) => {
                let mut s = format!("(call {}", self.expr(callee));
                for arg in args {
                    s.push(' ');
                    s.push_str(&self.expr(arg));
                }
                s.push(')');
                s
            }
            Expr::Get(obj, name) => format!("{}.{}", self.expr(obj), name.lexeme()),
            Expr::Fun(decl) => self.fun(decl),
            Expr::Grouping(expr) => format!("(group {})", self.expr(expr)),
            Expr::Literal(_, value) => match value {
                Literal::String(string) => format!("\"{}\"", string),
                other => other.to_string(),
            },
            Expr::Set(obj, name, value) => format!("(set {}.{} {})", self.expr(obj), name.lexeme(), self.expr(value)),
            Expr::Super(_, _, method) => format!("super.{}", method.lexeme()),
            Expr::This(..) => "this".to_string(),
            Expr::Unary(op, expr) => format!("({} {})", op.lexeme(), self.expr(expr)),
            Expr::Var(_, name) => name.lexeme().to_string(),
        }
    }

    pub fn stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Block(stmts) => self.block(stmts),
            Stmt::Break(_) => "(break)".to_string(),
            Stmt::Class(class) => self.class(class),
            Stmt::Expression(expr) => format!("({})", self.expr(expr)),
            Stmt::Fun(decl) => self.fun(decl),
            Stmt::If(cond, then_branch, else_branch) => {
                let mut result = format!("(if {} {}", self.expr(cond), self.stmt(then_branch));
                if let Some(else_branch) = else_branch {
                    result.push(' ');
                    result.push_str(&self.stmt(else_branch));
                }
                result.push(')');
                result
            }
            Stmt::Print(expr) => format!("(print {})", self.expr(expr)),
            Stmt::Return(_, expr) => match expr {
                Some(expr) => format!("(return {})", self.expr(expr)),
                None => "(return)".to_string(),
            },
            Stmt::Var(name, Some(init)) => format!("(var {} {})", name.lexeme(), self.expr(init)),
            Stmt::Var(name, None) => format!("(var {})", name.lexeme()),
            Stmt::While(cond, body) => format!("(while {} {})", self.expr(cond), self.stmt(body)),
        }
    }

    fn block(&self, stmts: &[Stmt]) -> String {
        let mut result = String::from("(block");
        for stmt in stmts {
            result.push(' ');
            result.push_str(&self.stmt(stmt));
        }
        result.push(')');
        result
    }

    fn class(&self, class: &ClassDecl) -> String {
        let mut result = format!("(class {}", class.name.lexeme());
        if let Some(superclass) = &class.superclass {
            result.push_str(" < ");
            result.push_str(&self.expr(superclass));
        }
        for method in &class.methods {
            result.push(' ');
            result.push_str(&self.fun(method));
        }
        result.push(')');
        result
    }

    fn fun(&self, decl: &FunDecl) -> String {
        let mut result = format!("(fun {}", decl.name().unwrap_or("@anonymous"));
        for param in &decl.params {
            result.push(' ');
            result.push_str(param.lexeme());
        }
        result.push(' ');
        result.push_str(&self.block(&decl.body));
        result.push(')');
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::{lexer::{Token, TokenType}, Loc};

    use super::*;

    #[test]
    fn test_ast_printer() {
        let loc = Loc::new(1);
        let expr = Expr::Binary(
            Box::new(Expr::Unary(
                Token::new(TokenType::Minus, "-", loc),
                Box::new(Expr::Literal(loc, Literal::Number(123.))),
            )),
            Token::new(TokenType::Star, "*", loc),
            Box::new(Expr::Grouping(Box::new(Expr::Literal(loc, Literal::Number(45.67))))),
        );

        assert_eq!(AstPrinter {}.expr(&expr), "(* (- 123) (group 45.67))");
    }
}
