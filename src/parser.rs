use std::fmt;

use crate::{
    ast::{
        Clause, Comparison, FlagSet, Pattern, ProjectItem, Query, RegexTerm, RhsValue, SortKey,
        Token, TokenClass, TokenKind,
    },
    lexer::{LexError, Lexer},
};

/// Column matched by the bare `!pattern` form.
pub const DEFAULT_MATCH_FIELD: &str = "name";

const CLAUSE_START: &[TokenClass] = &[
    TokenClass::Top,
    TokenClass::Flag,
    TokenClass::FieldRef,
    TokenClass::Bang,
    TokenClass::Select,
    TokenClass::Where,
    TokenClass::OrderBy,
];

/// Error raised at the first token that cannot continue the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Byte offset of the offending token (input length at end of input)
    pub offset: usize,
    /// Token kinds that would have been accepted here
    pub expected: Vec<TokenClass>,
    /// Description of the token actually found
    pub found: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected: Vec<String> = self.expected.iter().map(|c| c.to_string()).collect();
        write!(
            f,
            "Parse error at offset {}: expected {}, found {}",
            self.offset,
            expected.join(" or "),
            self.found
        )
    }
}

impl std::error::Error for ParseError {}

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Tokenizes the whole input up front.
    pub fn new(lexer: Lexer) -> Result<Self, LexError> {
        Ok(Self::from_tokens(lexer.tokenize()?))
    }

    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map(|t| t.offset + t.text.len()).unwrap_or(0);
            tokens.push(Token::new(TokenKind::Eof, "", end));
        }
        Parser {
            tokens,
            position: 0,
        }
    }

    fn current_token(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek_token(&self) -> &Token {
        let next = (self.position + 1).min(self.tokens.len() - 1);
        &self.tokens[next]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.position].clone();
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn check(&self, class: TokenClass) -> bool {
        self.current_token().class() == class
    }

    fn error(&self, expected: &[TokenClass]) -> ParseError {
        let token = self.current_token();
        let found = match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("{} '{}'", token.class(), token.text),
        };
        ParseError {
            offset: token.offset,
            expected: expected.to_vec(),
            found,
        }
    }

    fn expect(&mut self, class: TokenClass) -> Result<Token, ParseError> {
        if self.check(class) {
            Ok(self.advance())
        } else {
            Err(self.error(&[class]))
        }
    }

    fn expect_field(&mut self) -> Result<String, ParseError> {
        match &self.current_token().kind {
            TokenKind::FieldRef(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(&[TokenClass::FieldRef])),
        }
    }

    /// Parse a complete query: one or more clauses up to end of input
    pub fn parse_query(&mut self) -> Result<Query, ParseError> {
        let mut clauses = vec![];

        while !self.check(TokenClass::Eof) {
            clauses.push(self.parse_clause()?);
        }

        if clauses.is_empty() {
            return Err(self.error(CLAUSE_START));
        }

        Ok(Query { clauses })
    }

    fn parse_clause(&mut self) -> Result<Clause, ParseError> {
        match self.current_token().kind {
            TokenKind::Top => self.parse_limit(),
            TokenKind::Flag(_) => Ok(self.parse_flags()),
            TokenKind::FieldRef(_) | TokenKind::Bang => self.parse_regex_filter(),
            TokenKind::Select => self.parse_select(),
            TokenKind::Where => self.parse_where(),
            TokenKind::OrderBy => self.parse_sort(),
            _ => Err(self.error(CLAUSE_START)),
        }
    }

    fn parse_limit(&mut self) -> Result<Clause, ParseError> {
        self.advance(); // consume top

        let token = self.current_token();
        let limit = match &token.kind {
            TokenKind::Number(_) if token.text.bytes().all(|b| b.is_ascii_digit()) => {
                token.text.parse::<u64>().ok()
            }
            _ => None,
        };

        match limit {
            Some(n) => {
                self.advance();
                Ok(Clause::Limit(n))
            }
            None => Err(self.error(&[TokenClass::Number])),
        }
    }

    /// Consecutive flag keywords always extend the current set; the clause
    /// ends at the first token that is not a flag.
    fn parse_flags(&mut self) -> Clause {
        let mut flags = FlagSet::new();
        while let TokenKind::Flag(flag) = self.current_token().kind {
            flags.insert(flag);
            self.advance();
        }
        Clause::FlagSet(flags)
    }

    fn parse_regex_filter(&mut self) -> Result<Clause, ParseError> {
        let mut terms = vec![self.parse_regex_term()?];

        while self.check(TokenClass::And) {
            self.advance();
            terms.push(self.parse_regex_term()?);
        }

        Ok(Clause::RegexFilter(terms))
    }

    fn parse_regex_term(&mut self) -> Result<RegexTerm, ParseError> {
        match &self.current_token().kind {
            TokenKind::FieldRef(name) => {
                let field = name.clone();
                self.advance();
                self.expect(TokenClass::Tilde)?;
                let pattern = self.parse_pattern()?;
                Ok(RegexTerm {
                    field,
                    pattern,
                    negate: false,
                })
            }
            TokenKind::Bang => {
                self.advance(); // consume !
                self.parse_negated_term()
            }
            _ => Err(self.error(&[TokenClass::FieldRef, TokenClass::Bang])),
        }
    }

    /// `!field~pattern` negates a full term; `!pattern` negates a match
    /// against the default column, with a bare word taken as the pattern.
    fn parse_negated_term(&mut self) -> Result<RegexTerm, ParseError> {
        let token = self.current_token().clone();
        let (field, pattern) = match token.kind {
            TokenKind::FieldRef(name) if self.peek_token().kind == TokenKind::Tilde => {
                self.advance();
                self.advance();
                (name, self.parse_pattern()?)
            }
            TokenKind::FieldRef(_) => {
                self.advance();
                (DEFAULT_MATCH_FIELD.to_string(), Pattern::Unquoted(token.text))
            }
            TokenKind::RegexUnquoted(text) => {
                self.advance();
                (DEFAULT_MATCH_FIELD.to_string(), Pattern::Unquoted(text))
            }
            TokenKind::RegexSlashed(text) => {
                self.advance();
                (DEFAULT_MATCH_FIELD.to_string(), Pattern::Slashed(text))
            }
            _ => {
                return Err(self.error(&[
                    TokenClass::FieldRef,
                    TokenClass::RegexUnquoted,
                    TokenClass::RegexSlashed,
                ]));
            }
        };

        Ok(RegexTerm {
            field,
            pattern,
            negate: true,
        })
    }

    fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        let token = self.current_token().clone();
        let pattern = match token.kind {
            TokenKind::FieldRef(name) => Pattern::Literal(name),
            TokenKind::RegexUnquoted(text) => Pattern::Unquoted(text),
            TokenKind::RegexSlashed(text) => Pattern::Slashed(text),
            // Words that happen to look like numbers or dates are still words
            TokenKind::Number(_) | TokenKind::Datetime(_) => Pattern::Unquoted(token.text),
            TokenKind::QuotedString(text) => Pattern::Unquoted(text),
            _ => {
                return Err(self.error(&[
                    TokenClass::FieldRef,
                    TokenClass::RegexUnquoted,
                    TokenClass::RegexSlashed,
                ]));
            }
        };
        self.advance();
        Ok(pattern)
    }

    fn parse_select(&mut self) -> Result<Clause, ParseError> {
        self.advance(); // consume select
        let mut items = vec![self.parse_select_item()?];

        while self.check(TokenClass::Comma) {
            self.advance();
            items.push(self.parse_select_item()?);
        }

        Ok(Clause::Projection(items))
    }

    fn parse_select_item(&mut self) -> Result<ProjectItem, ParseError> {
        match self.current_token().kind {
            TokenKind::Star => {
                self.advance();
                Ok(ProjectItem::All)
            }
            TokenKind::Not => {
                self.advance();
                Ok(ProjectItem::Exclude(self.expect_field()?))
            }
            TokenKind::FieldRef(_) => Ok(ProjectItem::Include(self.expect_field()?)),
            _ => Err(self.error(&[TokenClass::Star, TokenClass::Not, TokenClass::FieldRef])),
        }
    }

    fn parse_where(&mut self) -> Result<Clause, ParseError> {
        self.advance(); // consume where
        let mut comparisons = vec![self.parse_comparison()?];

        while self.check(TokenClass::And) {
            self.advance();
            comparisons.push(self.parse_comparison()?);
        }

        Ok(Clause::Filter(comparisons))
    }

    fn parse_comparison(&mut self) -> Result<Comparison, ParseError> {
        let field = self.expect_field()?;

        let op = match self.current_token().kind {
            TokenKind::EqTest(op) => op,
            _ => return Err(self.error(&[TokenClass::EqTest])),
        };
        self.advance();

        let rhs = match &self.current_token().kind {
            TokenKind::QuotedString(s) => RhsValue::Str(s.clone()),
            TokenKind::FieldRef(name) => RhsValue::Field(name.clone()),
            TokenKind::Number(n) => RhsValue::Number(*n),
            TokenKind::Datetime(dt) => RhsValue::Datetime(*dt),
            _ => {
                return Err(self.error(&[
                    TokenClass::QuotedString,
                    TokenClass::FieldRef,
                    TokenClass::Number,
                    TokenClass::Datetime,
                ]));
            }
        };
        self.advance();

        Ok(Comparison { field, op, rhs })
    }

    fn parse_sort(&mut self) -> Result<Clause, ParseError> {
        self.advance(); // consume order
        let mut keys = vec![self.parse_sort_item()?];

        while self.check(TokenClass::Comma) {
            self.advance();
            keys.push(self.parse_sort_item()?);
        }

        Ok(Clause::Sort(keys))
    }

    fn parse_sort_item(&mut self) -> Result<SortKey, ParseError> {
        match self.current_token().kind {
            TokenKind::Not => {
                self.advance();
                Ok(SortKey {
                    field: self.expect_field()?,
                    descending: true,
                })
            }
            TokenKind::FieldRef(_) => Ok(SortKey {
                field: self.expect_field()?,
                descending: false,
            }),
            _ => Err(self.error(&[TokenClass::Not, TokenClass::FieldRef])),
        }
    }
}
