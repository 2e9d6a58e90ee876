use crate::{ast::Literal, errors, LoxError, Loc};

use super::{Token, TokenType};

#[derive(Debug)]
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    has_err: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            has_err: false,
        }
    }

    pub fn has_error(&self) -> bool {
        self.has_err
    }

    fn location(&self) -> Loc {
        Loc::new(self.line)
    }

    /// The byte offset of the next unread character.
    fn offset(&mut self) -> usize {
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.source.len())
    }

    fn match_char(&mut self, next: char) -> bool {
        if let Some((_, c)) = self.chars.peek() {
            if *c == next {
                self.chars.next();
                return true;
            }
        }

        false
    }

    fn advance_while_fn<F: Fn(char) -> bool>(&mut self, f: F) {
        while let Some((_, c)) = self.chars.peek() {
            if !f(*c) {
                break;
            }

            if *c == '\n' {
                self.line += 1;
            }

            self.chars.next();
        }
    }

    fn token(&mut self, ty: TokenType, start: usize, location: Loc) -> Token {
        let end = self.offset();
        Token::new(ty, &self.source[start..end], location)
    }

    fn read_token(&mut self) -> Option<Result<Token, LoxError>> {
        while let Some((start, char)) = self.chars.next() {
            let location = self.location();

            let ty = match char {
                ' ' | '\r' | '\t' => continue,
                '\n' => {
                    self.line += 1;
                    continue;
                }
                '(' => TokenType::LeftParen,
                ')' => TokenType::RightParen,
                '{' => TokenType::LeftBrace,
                '}' => TokenType::RightBrace,
                ',' => TokenType::Comma,
                '.' => TokenType::Dot,
                '-' => TokenType::Minus,
                '+' => TokenType::Plus,
                ';' => TokenType::Semicolon,
                '*' => TokenType::Star,

                '!' if self.match_char('=') => TokenType::BangEqual,
                '!' => TokenType::Bang,
                '=' if self.match_char('=') => TokenType::EqualEqual,
                '=' => TokenType::Equal,
                '>' if self.match_char('=') => TokenType::GreaterEqual,
                '>' => TokenType::Greater,
                '<' if self.match_char('=') => TokenType::LessEqual,
                '<' => TokenType::Less,

                '/' if self.match_char('/') => {
                    self.advance_while_fn(|c| c != '\n');
                    continue;
                }
                '/' if self.match_char('*') => {
                    self.skip_block_comment();
                    continue;
                }
                '/' => TokenType::Slash,

                '"' => return Some(self.read_string(start)),

                c if c.is_ascii_digit() => return Some(self.read_number(start)),
                c if c.is_alphabetic() || c == '_' => return Some(Ok(self.read_identifier(start))),

                c => {
                    self.has_err = true;
                    return Some(Err(errors::language(
                        location,
                        format!("We found an unexpected character '{}' where we were expecting one of: [whitespace, parenthesis, brace, operator, identifier, number, string, comment]", c),
                        "Make sure you have entered valid Lox code and have not accidentally closed a string.",
                    )));
                }
            };

            return Some(Ok(self.token(ty, start, location)));
        }

        None
    }

    fn skip_block_comment(&mut self) {
        let mut depth = 1;
        while let Some((_, c)) = self.chars.next() {
            match c {
                '\n' => self.line += 1,
                '/' if self.match_char('*') => depth += 1,
                '*' if self.match_char('/') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    fn read_string(&mut self, start: usize) -> Result<Token, LoxError> {
        let location = self.location();

        while let Some((end, c)) = self.chars.next() {
            match c {
                '\n' => self.line += 1,
                '"' => {
                    let value = self.source[start + 1..end].to_string();
                    return Ok(Token::new(TokenType::String, &self.source[start..end + 1], location)
                        .with_literal(Literal::String(value)));
                }
                _ => {}
            }
        }

        self.has_err = true;
        Err(errors::language(
            location,
            "Reached the end of the file without finding the closing quote for a string.",
            "Make sure that you have terminated your string with a '\"' character.",
        ))
    }

    fn read_number(&mut self, start: usize) -> Result<Token, LoxError> {
        let location = self.location();

        self.advance_while_fn(|c| c.is_ascii_digit());

        let mut ahead = self.chars.clone();
        if let (Some((_, '.')), Some((_, c))) = (ahead.next(), ahead.peek()) {
            if c.is_ascii_digit() {
                self.chars.next();
                self.advance_while_fn(|c| c.is_ascii_digit());
            }
        }

        let token = self.token(TokenType::Number, start, location);
        let value: f64 = token.lexeme().parse().map_err(|e| {
            self.has_err = true;
            errors::language(
                location,
                format!("Unable to parse number '{}': {}.", token.lexeme(), e),
                "Make sure you have provided a valid number within the bounds of a 64-bit floating point number.",
            )
        })?;

        Ok(token.with_literal(Literal::Number(value)))
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        let location = self.location();

        self.advance_while_fn(|c| c.is_alphanumeric() || c == '_');
        let end = self.offset();

        let ty = match &self.source[start..end] {
            "and" => TokenType::And,
            "break" => TokenType::Break,
            "class" => TokenType::Class,
            "else" => TokenType::Else,
            "false" => TokenType::False,
            "for" => TokenType::For,
            "fun" => TokenType::Fun,
            "if" => TokenType::If,
            "nil" => TokenType::Nil,
            "or" => TokenType::Or,
            "print" => TokenType::Print,
            "return" => TokenType::Return,
            "super" => TokenType::Super,
            "this" => TokenType::This,
            "true" => TokenType::True,
            "var" => TokenType::Var,
            "while" => TokenType::While,
            _ => TokenType::Identifier,
        };

        Token::new(ty, &self.source[start..end], location)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token, LoxError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_token(lexer: &mut Scanner) -> Token {
        lexer.next().expect("a token").expect("without an error")
    }

    #[test]
    fn test_basic_operators() {
        let mut lexer = Scanner::new("+ - * /");

        for ty in [TokenType::Plus, TokenType::Minus, TokenType::Star, TokenType::Slash] {
            let token = next_token(&mut lexer);
            assert!(token.is(ty), "expected {:?}, got {:?}", ty, token);
            assert_eq!(token.location(), Loc::new(1));
        }

        assert!(lexer.next().is_none(), "no more tokens");
    }

    #[test]
    fn test_basic_symbols() {
        let mut lexer = Scanner::new(r#"
// this is a comment
(( )){} // grouping stuff
!*+-/=<> <= == != >= // operators
"#);

        let tokens = [
            "(", "(", ")", ")", "{", "}",
            "!", "*", "+", "-", "/", "=", "<", ">", "<=", "==", "!=", ">=",
        ];

        for token in tokens {
            assert_eq!(next_token(&mut lexer).lexeme(), token);
        }

        assert!(lexer.next().is_none(), "no more tokens");
    }

    #[test]
    fn test_comments() {
        let mut lexer = Scanner::new(r#"
// single line comment
/* multi-line comment on a single line */
/*
* multi-line comment
* on multiple lines
*/
/*/* Nested multi-line comment! */*/
        "#);

        assert!(lexer.next().is_none(), "no more tokens");
    }

    #[test]
    fn test_strings() {
        let mut lexer = Scanner::new(" \"test\" \"multi\nline\" x");

        let token = next_token(&mut lexer);
        assert!(token.is(TokenType::String));
        assert_eq!(token.lexeme(), "\"test\"");
        assert_eq!(token.literal(), Some(&Literal::String("test".to_string())));

        let token = next_token(&mut lexer);
        assert_eq!(token.literal(), Some(&Literal::String("multi\nline".to_string())));
        assert_eq!(token.location(), Loc::new(1));

        assert_eq!(next_token(&mut lexer).location(), Loc::new(2));
        assert!(lexer.next().is_none(), "no more tokens");
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Scanner::new("\"never closed");
        let err = lexer.next().expect("a token").expect_err("an error");
        assert_eq!(err.line(), Some(1));
        assert!(lexer.has_error());
    }

    #[test]
    fn test_numbers() {
        let mut lexer = Scanner::new(r#" 123 12.34 12. "#);

        let numbers = [("123", 123.0), ("12.34", 12.34), ("12", 12.0)];
        for (lexeme, value) in numbers {
            let token = next_token(&mut lexer);
            assert!(token.is(TokenType::Number));
            assert_eq!(token.lexeme(), lexeme);
            assert_eq!(token.literal(), Some(&Literal::Number(value)));
        }

        assert!(next_token(&mut lexer).is(TokenType::Dot), "expected a dot token");
        assert!(lexer.next().is_none(), "no more tokens");
    }

    #[test]
    fn test_identifiers_and_keywords() {
        let mut lexer = Scanner::new(r#"
identifier _id a_b_c
and break class else false for fun if nil or print return super this true var while
"#);

        let identifiers = ["identifier", "_id", "a_b_c"];
        for identifier in identifiers {
            let token = next_token(&mut lexer);
            assert!(token.is(TokenType::Identifier));
            assert_eq!(token.lexeme(), identifier);
            assert_eq!(token.location(), Loc::new(2));
        }

        let keywords = ["and", "break", "class", "else", "false", "for", "fun", "if", "nil", "or", "print", "return", "super", "this", "true", "var", "while"];
        for keyword in keywords {
            let token = next_token(&mut lexer);
            assert!(!token.is(TokenType::Identifier), "{} should be a keyword", keyword);
            assert_eq!(token.lexeme(), keyword);
        }
    }

    #[test]
    fn test_unexpected_character() {
        let mut lexer = Scanner::new("var @ = 1;");

        assert!(next_token(&mut lexer).is(TokenType::Var));
        assert!(lexer.next().expect("a token").is_err());
        assert!(next_token(&mut lexer).is(TokenType::Equal), "scanning resumes after the bad character");
        assert!(lexer.has_error());
    }
}
