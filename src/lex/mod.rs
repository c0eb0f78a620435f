use std::fmt;
use crate::{
    error::ScanError,
    util::Line,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    Bang,
    BangEq,
    Eq,
    EqEq,
    Greater,
    GreaterEq,
    Less,
    LessEq,

    Ident,
    String,
    Number,

    And,
    Class,
    Else,
    Func,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    False,
    Var,
    While,

    Eof,
}

impl TokenKind {
    pub fn keyword(word: &str) -> Option<Self> {
        Some(match word {
            "and" => TokenKind::And,
            "class" => TokenKind::Class,
            "else" => TokenKind::Else,
            "func" => TokenKind::Func,
            "for" => TokenKind::For,
            "if" => TokenKind::If,
            "nil" => TokenKind::Nil,
            "or" => TokenKind::Or,
            "print" => TokenKind::Print,
            "return" => TokenKind::Return,
            "super" => TokenKind::Super,
            "this" => TokenKind::This,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "var" => TokenKind::Var,
            "while" => TokenKind::While,
            _ => return None,
        })
    }
}

/// The value carried by a string or number token.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Number(x) => write!(f, "{}", x),
            Literal::Str(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: Line,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, literal: Option<Literal>, line: Line) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            literal,
            line,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {:?}: {}", self.line, self.kind, self.lexeme)?;
        if let Some(literal) = &self.literal {
            write!(f, " ({})", literal)?;
        }
        Ok(())
    }
}

pub fn print_debug(tokens: &[Token]) {
    println!("--- Tokens ---");
    for token in tokens {
        println!("{}", token);
    }
}

struct Scanner {
    chars: Vec<char>,
    start: usize,
    current: usize,
    line: Line,
}

impl Scanner {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            start: 0,
            current: 0,
            line: Line::start(),
        }
    }

    fn at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.current).copied();
        if c.is_some() {
            self.current += 1;
        }
        c
    }

    /// Looks `n` characters past the current one without consuming anything.
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.get(self.current + n).copied()
    }

    fn peek(&self) -> Option<char> {
        self.peek_nth(0)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn text(&self, from: usize, until: usize) -> String {
        self.chars[from..until].iter().collect()
    }

    fn token(&self, kind: TokenKind, literal: Option<Literal>) -> Token {
        Token::new(kind, self.text(self.start, self.current), literal, self.line)
    }

    fn either(&mut self, next: char, double: TokenKind, single: TokenKind) -> Token {
        let kind = if self.eat(next) { double } else { single };
        self.token(kind, None)
    }

    fn scan_token(&mut self) -> Result<Option<Token>, ScanError> {
        let c = match self.advance() {
            Some(c) => c,
            None => return Ok(None),
        };

        let token = match c {
            '(' => self.token(TokenKind::LParen, None),
            ')' => self.token(TokenKind::RParen, None),
            '{' => self.token(TokenKind::LBrace, None),
            '}' => self.token(TokenKind::RBrace, None),
            ',' => self.token(TokenKind::Comma, None),
            '.' => self.token(TokenKind::Dot, None),
            '-' => self.token(TokenKind::Minus, None),
            '+' => self.token(TokenKind::Plus, None),
            ';' => self.token(TokenKind::Semicolon, None),
            '*' => self.token(TokenKind::Star, None),
            '!' => self.either('=', TokenKind::BangEq, TokenKind::Bang),
            '=' => self.either('=', TokenKind::EqEq, TokenKind::Eq),
            '<' => self.either('=', TokenKind::LessEq, TokenKind::Less),
            '>' => self.either('=', TokenKind::GreaterEq, TokenKind::Greater),
            '/' => if self.eat('/') {
                while self.peek().map_or(false, |c| c != '\n') {
                    self.current += 1;
                }
                return Ok(None);
            } else if self.eat('*') {
                self.block_comment();
                return Ok(None);
            } else {
                self.token(TokenKind::Slash, None)
            },
            ' ' | '\r' | '\t' => return Ok(None),
            '\n' => {
                self.line = self.line.next();
                return Ok(None);
            },
            '"' => self.string()?,
            c if c.is_ascii_digit() => self.number()?,
            c if is_ident_start(c) => self.ident(),
            c => return Err(ScanError::unexpected_char(c).at(self.line)),
        };

        Ok(Some(token))
    }

    /// Consumes a block comment whose opening `/*` has already been eaten. Nested comments must
    /// all be closed before the outer one ends; running out of input simply ends the comment.
    fn block_comment(&mut self) {
        let mut depth = 1usize;
        while depth > 0 && !self.at_end() {
            match (self.peek(), self.peek_nth(1)) {
                (Some('/'), Some('*')) => {
                    self.current += 2;
                    depth += 1;
                },
                (Some('*'), Some('/')) => {
                    self.current += 2;
                    depth -= 1;
                },
                (Some('\n'), _) => {
                    self.line = self.line.next();
                    self.current += 1;
                },
                _ => self.current += 1,
            }
        }
    }

    fn string(&mut self) -> Result<Token, ScanError> {
        let start_line = self.line;
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\n') => self.line = self.line.next(),
                Some(_) => {},
                None => return Err(ScanError::unterminated_string().at(start_line)),
            }
        }

        let contents = self.text(self.start + 1, self.current - 1);
        Ok(self.token(TokenKind::String, Some(Literal::Str(contents))))
    }

    fn number(&mut self) -> Result<Token, ScanError> {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.current += 1;
        }

        // Only take the '.' when a digit follows it.
        if self.peek() == Some('.') && self.peek_nth(1).map_or(false, |c| c.is_ascii_digit()) {
            self.current += 1;
            while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                self.current += 1;
            }
        }

        let text = self.text(self.start, self.current);
        let value = text
            .parse::<f64>()
            .map_err(|_| ScanError::invalid_number(text.clone()).at(self.line))?;
        Ok(self.token(TokenKind::Number, Some(Literal::Number(value))))
    }

    fn ident(&mut self) -> Token {
        while self.peek().map_or(false, is_ident_part) {
            self.current += 1;
        }

        let word = self.text(self.start, self.current);
        let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Ident);
        self.token(kind, None)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_part(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

/// Turns source text into tokens, always ending with a single end-of-input token.
pub fn scan(src: &str) -> Result<Vec<Token>, ScanError> {
    let mut scanner = Scanner::new(src);
    let mut tokens = Vec::new();

    while !scanner.at_end() {
        scanner.start = scanner.current;
        if let Some(token) = scanner.scan_token()? {
            tokens.push(token);
        }
    }

    tokens.push(Token::new(TokenKind::Eof, "", None, scanner.line));
    tracing::trace!(count = tokens.len(), "scanned tokens");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::error::ScanErrorKind;

    fn kinds(src: &str) -> Vec<TokenKind> {
        scan(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn tok(kind: TokenKind, lexeme: &str, literal: Option<Literal>, line: usize) -> Token {
        Token::new(kind, lexeme, literal, Line::from(line))
    }

    #[test]
    fn every_token_kind() {
        let src = "( ) { } , . - + ; / *
  ! != = == > >= < <=
  identifier \"string\" 1.234
  and class else func for if nil or print return super this true false var while
";
        let tokens = scan(src).unwrap();
        let expected = vec![
            tok(TokenKind::LParen, "(", None, 1),
            tok(TokenKind::RParen, ")", None, 1),
            tok(TokenKind::LBrace, "{", None, 1),
            tok(TokenKind::RBrace, "}", None, 1),
            tok(TokenKind::Comma, ",", None, 1),
            tok(TokenKind::Dot, ".", None, 1),
            tok(TokenKind::Minus, "-", None, 1),
            tok(TokenKind::Plus, "+", None, 1),
            tok(TokenKind::Semicolon, ";", None, 1),
            tok(TokenKind::Slash, "/", None, 1),
            tok(TokenKind::Star, "*", None, 1),
            tok(TokenKind::Bang, "!", None, 2),
            tok(TokenKind::BangEq, "!=", None, 2),
            tok(TokenKind::Eq, "=", None, 2),
            tok(TokenKind::EqEq, "==", None, 2),
            tok(TokenKind::Greater, ">", None, 2),
            tok(TokenKind::GreaterEq, ">=", None, 2),
            tok(TokenKind::Less, "<", None, 2),
            tok(TokenKind::LessEq, "<=", None, 2),
            tok(TokenKind::Ident, "identifier", None, 3),
            tok(TokenKind::String, "\"string\"", Some(Literal::Str("string".into())), 3),
            tok(TokenKind::Number, "1.234", Some(Literal::Number(1.234)), 3),
            tok(TokenKind::And, "and", None, 4),
            tok(TokenKind::Class, "class", None, 4),
            tok(TokenKind::Else, "else", None, 4),
            tok(TokenKind::Func, "func", None, 4),
            tok(TokenKind::For, "for", None, 4),
            tok(TokenKind::If, "if", None, 4),
            tok(TokenKind::Nil, "nil", None, 4),
            tok(TokenKind::Or, "or", None, 4),
            tok(TokenKind::Print, "print", None, 4),
            tok(TokenKind::Return, "return", None, 4),
            tok(TokenKind::Super, "super", None, 4),
            tok(TokenKind::This, "this", None, 4),
            tok(TokenKind::True, "true", None, 4),
            tok(TokenKind::False, "false", None, 4),
            tok(TokenKind::Var, "var", None, 4),
            tok(TokenKind::While, "while", None, 4),
            tok(TokenKind::Eof, "", None, 5),
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn arithmetic() {
        use TokenKind::*;
        assert_eq!(kinds("1 + 2 * 3 - 4"), vec![Number, Plus, Number, Star, Number, Minus, Number, Eof]);
    }

    #[test]
    fn eof_is_last_and_unique() {
        for src in ["", "   ", "var a = 1;", "// only a comment", "/* open"] {
            let tokens = scan(src).unwrap();
            let last = tokens.last().unwrap();
            assert!(last.is_eof());
            assert_eq!(last.lexeme, "");
            assert_eq!(tokens.iter().filter(|t| t.is_eof()).count(), 1);
        }
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        let tokens = scan("12.").unwrap();
        assert_eq!(tokens[0], tok(TokenKind::Number, "12", Some(Literal::Number(12.0)), 1));
        assert_eq!(tokens[1].kind, TokenKind::Dot);
        assert_eq!(kinds("1.x"), vec![TokenKind::Number, TokenKind::Dot, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn comments() {
        assert_eq!(kinds("1 // two\n3"), vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]);
        assert_eq!(kinds("1 /* a /* b */ still */ 2"), vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]);
        assert_eq!(kinds("1 /* a /* b */ 2"), vec![TokenKind::Number, TokenKind::Eof]);
        assert_eq!(kinds("a / b"), vec![TokenKind::Ident, TokenKind::Slash, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn lines_advance_inside_strings_and_comments() {
        let tokens = scan("\"a\nb\" /* x\n\n */ c\n").unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Str("a\nb".into())));
        assert_eq!(tokens[0].line, Line::from(2));
        assert_eq!(tokens[1], tok(TokenKind::Ident, "c", None, 4));
        assert_eq!(tokens[2].line, Line::from(5));
    }

    #[test]
    fn unterminated_string_reports_start_line() {
        let err = scan("\n\"abc\ndef").unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::UnterminatedString);
        assert_eq!(err.line, Line::from(2));
    }

    #[test]
    fn unexpected_char() {
        let err = scan("var a = 1;\n@").unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::UnexpectedChar('@'));
        assert_eq!(err.line, Line::from(2));
    }

    #[test]
    fn keywords_only_match_whole_words() {
        assert_eq!(kinds("orchid _var var1 nil"), vec![
            TokenKind::Ident,
            TokenKind::Ident,
            TokenKind::Ident,
            TokenKind::Nil,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn display() {
        let tokens = scan("x = 2.5;").unwrap();
        assert_eq!(tokens[0].to_string(), "[1] Ident: x");
        assert_eq!(tokens[2].to_string(), "[1] Number: 2.5 (2.5)");
    }
}
