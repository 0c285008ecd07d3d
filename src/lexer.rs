use std::fmt;

use crate::ast::{DatetimeLiteral, EqTest, Flag, NumberLiteral, Token, TokenKind};

/// Error raised on the first character run that starts no token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Byte offset of the offending run
    pub offset: usize,
    pub reason: String,
}

impl LexError {
    fn new(offset: usize, reason: impl Into<String>) -> Self {
        LexError {
            offset,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lex error at offset {}: {}", self.offset, self.reason)
    }
}

impl std::error::Error for LexError {}

/// Characters that may directly follow a number, date or column name.
/// Anything else glues the run into a bare pattern instead. Keywords only
/// need the next character to not extend the word.
fn is_boundary(ch: Option<char>) -> bool {
    match ch {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, ',' | '~' | '=' | '<' | '>'),
    }
}

fn is_field_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_field_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

pub struct Lexer {
    input: String,
    /// Byte position of the next unread character
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.to_string(),
            position: 0,
        }
    }

    fn rest(&self) -> &str {
        &self.input[self.position..]
    }

    fn current_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    fn char_at(&self, byte: usize) -> Option<char> {
        self.input.get(byte..).and_then(|s| s.chars().next())
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, &self.input[start..self.position], start)
    }

    /// Length in bytes of the identifier run starting at `byte`.
    fn identifier_len(&self, byte: usize) -> usize {
        self.input[byte..]
            .find(|c: char| !is_field_char(c))
            .unwrap_or(self.input.len() - byte)
    }

    fn read_quoted(&mut self, quote: char) -> Result<Token, LexError> {
        let start = self.position;
        self.advance(); // Consume opening quote
        let mut value = String::new();

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(self.token(TokenKind::QuotedString(value), start));
                }
                '\\' => match self.peek_char(1) {
                    Some(c) if c == quote || c == '\\' => {
                        value.push(c);
                        self.advance();
                        self.advance();
                    }
                    _ => {
                        value.push('\\');
                        self.advance();
                    }
                },
                _ => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::new(start, "unterminated string: missing closing quote"))
    }

    fn read_slashed(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        self.advance(); // Consume opening slash
        let mut pattern = String::new();

        while let Some(ch) = self.current_char() {
            match ch {
                '/' => {
                    self.advance();
                    return Ok(self.token(TokenKind::RegexSlashed(pattern), start));
                }
                '\\' => {
                    // Only `\/` is ours; every other escape belongs to the regex
                    match self.peek_char(1) {
                        Some('/') => pattern.push('/'),
                        Some(c) => {
                            pattern.push('\\');
                            pattern.push(c);
                        }
                        None => pattern.push('\\'),
                    }
                    self.advance();
                    self.advance();
                }
                _ => {
                    pattern.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::new(start, "unterminated regex: missing closing '/'"))
    }

    fn read_comparison(&mut self, first: char) -> Token {
        let start = self.position;
        self.advance();
        let or_equal = self.current_char() == Some('=');
        if or_equal {
            self.advance();
        }
        let op = match (first, or_equal) {
            ('<', false) => EqTest::LessThan,
            ('<', true) => EqTest::LessEqual,
            (_, false) => EqTest::GreaterThan,
            (_, true) => EqTest::GreaterEqual,
        };
        self.token(TokenKind::EqTest(op), start)
    }

    fn keyword(word: &str) -> Option<TokenKind> {
        match word.to_ascii_lowercase().as_str() {
            "select" => Some(TokenKind::Select),
            "order" | "sort" => Some(TokenKind::OrderBy),
            "where" => Some(TokenKind::Where),
            "top" => Some(TokenKind::Top),
            "and" => Some(TokenKind::And),
            other => Flag::from_keyword(other).map(TokenKind::Flag),
        }
    }

    /// Consumes a `by` directly after `order`/`sort`, if there is one.
    fn absorb_by(&mut self) {
        let saved = self.position;
        self.skip_whitespace();
        let len = self.identifier_len(self.position);
        let word = &self.input[self.position..self.position + len];
        if word.eq_ignore_ascii_case("by") {
            self.position += len;
        } else {
            self.position = saved;
        }
    }

    /// Keywords, dates, numbers, column names and bare patterns.
    fn read_word(&mut self, first: char) -> Result<Token, LexError> {
        let start = self.position;

        if is_field_start(first) {
            let len = self.identifier_len(start);
            let word = &self.input[start..start + len];
            if let Some(kind) = Self::keyword(word) {
                self.position += len;
                if kind == TokenKind::OrderBy {
                    self.absorb_by();
                }
                return Ok(self.token(kind, start));
            }
            if is_boundary(self.char_at(start + len)) {
                if word.eq_ignore_ascii_case("inf") {
                    self.position += len;
                    return Ok(self.token(TokenKind::Number(NumberLiteral::plain(f64::INFINITY)), start));
                }
                let name = word.to_ascii_lowercase();
                self.position += len;
                return Ok(self.token(TokenKind::FieldRef(name), start));
            }
            return Ok(self.read_unquoted());
        }

        if first == '-' {
            let word_len = self.identifier_len(start + 1);
            let word = &self.input[start + 1..start + 1 + word_len];
            if word.eq_ignore_ascii_case("inf") && is_boundary(self.char_at(start + 1 + word_len)) {
                self.position += 1 + word_len;
                return Ok(self.token(TokenKind::Number(NumberLiteral::plain(f64::NEG_INFINITY)), start));
            }
            if self.peek_char(1).is_some_and(is_field_start) {
                self.advance();
                return Ok(self.token(TokenKind::Not, start));
            }
        }

        if let Some(len) = DatetimeLiteral::scan(self.rest())
            && is_boundary(self.char_at(start + len))
        {
            let text = &self.input[start..start + len];
            let literal = DatetimeLiteral::parse(text)
                .ok_or_else(|| LexError::new(start, format!("invalid date/time '{}'", text)))?;
            self.position += len;
            return Ok(self.token(TokenKind::Datetime(literal), start));
        }

        if let Some(len) = NumberLiteral::scan(self.rest())
            && is_boundary(self.char_at(start + len))
        {
            let text = &self.input[start..start + len];
            let literal = NumberLiteral::parse(text)
                .ok_or_else(|| LexError::new(start, format!("invalid number '{}'", text)))?;
            self.position += len;
            return Ok(self.token(TokenKind::Number(literal), start));
        }

        Ok(self.read_unquoted())
    }

    fn read_unquoted(&mut self) -> Token {
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() || ch == ',' {
                break;
            }
            self.advance();
        }
        let text = self.input[start..self.position].to_string();
        self.token(TokenKind::RegexUnquoted(text), start)
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.position;

        match self.current_char() {
            None => Ok(self.token(TokenKind::Eof, start)),
            Some(',') => {
                self.advance();
                Ok(self.token(TokenKind::Comma, start))
            }
            Some(quote @ ('"' | '\'')) => self.read_quoted(quote),
            Some('/') => self.read_slashed(),
            Some('*') => {
                self.advance();
                Ok(self.token(TokenKind::Star, start))
            }
            Some('~') => {
                self.advance();
                Ok(self.token(TokenKind::Tilde, start))
            }
            Some('!') => {
                self.advance();
                Ok(self.token(TokenKind::Bang, start))
            }
            Some('=') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Ok(self.token(TokenKind::EqTest(EqTest::Equal), start))
                } else {
                    Err(LexError::new(start, "unexpected '=' (did you mean '=='?)"))
                }
            }
            Some(ch @ ('<' | '>')) => Ok(self.read_comparison(ch)),
            Some(ch) if ch.is_control() => Err(LexError::new(
                start,
                format!("unexpected character {:?}", ch),
            )),
            Some(ch) => self.read_word(ch),
        }
    }

    /// Reads the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("select ORDER where top and Recent");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Select);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::OrderBy);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Where);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Top);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::And);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Flag(Flag::Recent));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

#[test]
fn test_comparison_clause() {
    let mut lexer = Lexer::new("where size>=10");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Where);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::FieldRef("size".into()));
    let op = lexer.next_token().unwrap();
    assert_eq!(op.kind, TokenKind::EqTest(EqTest::GreaterEqual));
    assert_eq!(op.offset, 10);
    assert_eq!(
        lexer.next_token().unwrap().kind,
        TokenKind::Number(NumberLiteral::plain(10.0))
    );
}
