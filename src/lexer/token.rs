use crate::{ast::Literal, Loc};

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    ty: TokenType,
    lexeme: String,
    literal: Option<Literal>,
    loc: Loc,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "'{}' at {}", self.lexeme, self.loc)
    }
}

impl Token {
    pub fn new<S: Into<String>>(ty: TokenType, lexeme: S, loc: Loc) -> Self {
        Self {
            ty,
            lexeme: lexeme.into(),
            literal: None,
            loc,
        }
    }

    pub fn with_literal(self, literal: Literal) -> Self {
        Self {
            literal: Some(literal),
            ..self
        }
    }

    /// An identifier which does not originate from source code, used for the
    /// implicit `this` and `super` bindings and for native globals.
    pub fn synthetic<S: Into<String>>(name: S) -> Self {
        Self::new(TokenType::Identifier, name, Loc::Native)
    }

    pub fn is(&self, ty: TokenType) -> bool {
        self.ty == ty
    }

    pub fn is_one_of(&self, ty: &[TokenType]) -> bool {
        ty.contains(&self.ty)
    }

    pub fn token_type(&self) -> TokenType {
        self.ty
    }

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn literal(&self) -> Option<&Literal> {
        self.literal.as_ref()
    }

    pub fn location(&self) -> Loc {
        self.loc
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenType {
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    Identifier,
    String,
    Number,

    And,
    Break,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,
}
