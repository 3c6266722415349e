//! XPath lexer.

/// XPath token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Slash,
    DoubleSlash,
    Dot,
    DoubleDot,
    At,
    Pipe,
    Plus,
    Minus,
    Star,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Mod,
    Div,

    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    DoubleColon,

    Number(f64),
    String(String),

    /// Name, possibly qualified ("item" or "ns:item").
    Name(String),
    /// node(), text(), comment(), processing-instruction()
    NodeType(String),
    /// Axis name followed by ::
    Axis(String),

    Eof,
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }

    /// True if the two-char operator matched and was consumed.
    fn eat(&mut self, second: char) -> bool {
        if self.peek() == Some(second) {
            self.advance(1);
            true
        } else {
            false
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let c = match self.peek() {
            Some(c) => c,
            None => return Token::Eof,
        };

        if c.is_ascii_digit() {
            return self.read_number();
        }
        if c == '"' || c == '\'' {
            return self.read_string();
        }
        if is_name_start_char(c) {
            return self.read_name_or_keyword();
        }

        self.advance(c.len_utf8());
        match c {
            '/' => {
                if self.eat('/') {
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '.' => {
                if self.eat('.') {
                    Token::DoubleDot
                } else if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos -= 1;
                    self.read_number()
                } else {
                    Token::Dot
                }
            }
            ':' => {
                if self.eat(':') {
                    Token::DoubleColon
                } else {
                    Token::Name(":".to_string())
                }
            }
            '!' => {
                if self.eat('=') {
                    Token::NotEq
                } else {
                    Token::Name("!".to_string())
                }
            }
            '<' => {
                if self.eat('=') {
                    Token::LtEq
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::GtEq
                } else {
                    Token::Gt
                }
            }
            '@' => Token::At,
            '|' => Token::Pipe,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '=' => Token::Eq,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            ',' => Token::Comma,
            other => Token::Name(other.to_string()),
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance(1);
            }
        }

        let value = self.input[start..self.pos].parse().unwrap_or(f64::NAN);
        Token::Number(value)
    }

    fn read_string(&mut self) -> Token {
        let quote = self.peek().unwrap_or('"');
        self.advance(1);

        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                break;
            }
            self.advance(c.len_utf8());
        }
        let value = self.input[start..self.pos].to_string();
        self.advance(1);

        Token::String(value)
    }

    fn read_ncname(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    fn read_name_or_keyword(&mut self) -> Token {
        let name = self.read_ncname();

        match name {
            "and" => return Token::And,
            "or" => return Token::Or,
            "mod" => return Token::Mod,
            "div" => return Token::Div,
            _ => {}
        }

        // axis::step
        self.skip_whitespace();
        if self.remaining().starts_with("::") {
            return Token::Axis(name.to_string());
        }

        // function call or node type test
        if self.peek() == Some('(') {
            return match name {
                "node" | "text" | "comment" | "processing-instruction" => {
                    Token::NodeType(name.to_string())
                }
                _ => Token::Name(name.to_string()),
            };
        }

        // Fold a qualified name into a single token; names are opaque
        // strings to the matcher.
        if self.peek() == Some(':') && self.peek_at(1) != Some(':') {
            self.advance(1);
            if self.peek() == Some('*') {
                self.advance(1);
                return Token::Name(format!("{name}:*"));
            }
            let local = self.read_ncname();
            return Token::Name(format!("{name}:{local}"));
        }

        Token::Name(name.to_string())
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if matches!(token, Token::Eof) {
                break;
            }
            tokens.push(token);
        }
        tokens
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let mut lexer = Lexer::new("/root/child");
        assert_eq!(lexer.next_token(), Token::Slash);
        assert_eq!(lexer.next_token(), Token::Name("root".to_string()));
        assert_eq!(lexer.next_token(), Token::Slash);
        assert_eq!(lexer.next_token(), Token::Name("child".to_string()));
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn test_descendant() {
        let mut lexer = Lexer::new("//item");
        assert_eq!(lexer.next_token(), Token::DoubleSlash);
        assert_eq!(lexer.next_token(), Token::Name("item".to_string()));
    }

    #[test]
    fn test_predicate() {
        let tokens = Lexer::new("item[@id='test']").tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::Name("item".to_string()),
                Token::LeftBracket,
                Token::At,
                Token::Name("id".to_string()),
                Token::Eq,
                Token::String("test".to_string()),
                Token::RightBracket,
            ]
        );
    }

    #[test]
    fn test_axis() {
        let mut lexer = Lexer::new("child::element");
        assert_eq!(lexer.next_token(), Token::Axis("child".to_string()));
        assert_eq!(lexer.next_token(), Token::DoubleColon);
        assert_eq!(lexer.next_token(), Token::Name("element".to_string()));
    }

    #[test]
    fn test_qualified_name_is_single_token() {
        let mut lexer = Lexer::new("ns:item");
        assert_eq!(lexer.next_token(), Token::Name("ns:item".to_string()));
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("position() = 1").tokenize();
        assert!(matches!(tokens.last(), Some(Token::Number(n)) if *n == 1.0));
        let tokens = Lexer::new("3.25").tokenize();
        assert!(matches!(tokens[0], Token::Number(n) if n == 3.25));
    }

    #[test]
    fn test_node_type_tokens() {
        let tokens = Lexer::new("text()").tokenize();
        assert_eq!(tokens[0], Token::NodeType("text".to_string()));
    }
}
