use std::fmt;

use crate::ast::{DatetimeLiteral, EqTest, Flag, NumberLiteral};

/// A lexical token with the source text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact source slice, e.g. `"1MB"` including quotes
    pub text: String,
    /// Byte offset of the first character in the query string
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            offset,
        }
    }

    pub fn class(&self) -> TokenClass {
        self.kind.class()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Column name, lowercase-normalized
    ///
    /// # Examples
    /// ```text
    /// name
    /// size
    /// dup_group
    /// ```
    FieldRef(String),

    /// Number, with an optional exponent or trailing `%`
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -1.5
    /// 2e6
    /// 10%
    /// inf
    /// ```
    Number(NumberLiteral),

    /// String enclosed in single or double quotes
    ///
    /// # Examples
    /// ```text
    /// "1MB"
    /// 'report.docx'
    /// ```
    QuotedString(String),

    /// Regular expression enclosed in slashes
    ///
    /// # Examples
    /// ```text
    /// /^tmp/
    /// /\.rs$/
    /// ```
    RegexSlashed(String),

    /// Bare pattern word
    ///
    /// # Examples
    /// ```text
    /// foo.txt
    /// .*bak
    /// ```
    RegexUnquoted(String),

    /// Date or date-time
    ///
    /// # Examples
    /// ```text
    /// 2024-01-31
    /// 2024-01-31T08:00
    /// 2024-01-31 08:00:00+01:00
    /// ```
    Datetime(DatetimeLiteral),

    // Keywords
    /// `select`
    Select,
    /// `order` or `sort`, optionally followed by `by`
    OrderBy,
    /// `where`
    Where,
    /// `top`
    Top,
    /// `recent`, `verbose`, `duplicates` or `hardlinks`
    Flag(Flag),
    /// `and`
    And,

    // Punctuation
    /// `*` in a select list
    Star,
    /// `-` glued to a column name (`-size`)
    Not,
    /// `~` between a column and its pattern
    Tilde,
    /// `!` negated match
    Bang,
    /// `==`, `<`, `<=`, `>`, `>=`
    EqTest(EqTest),
    /// `,`
    Comma,

    /// End of input
    Eof,
}

impl TokenKind {
    pub fn class(&self) -> TokenClass {
        match self {
            TokenKind::FieldRef(_) => TokenClass::FieldRef,
            TokenKind::Number(_) => TokenClass::Number,
            TokenKind::QuotedString(_) => TokenClass::QuotedString,
            TokenKind::RegexSlashed(_) => TokenClass::RegexSlashed,
            TokenKind::RegexUnquoted(_) => TokenClass::RegexUnquoted,
            TokenKind::Datetime(_) => TokenClass::Datetime,
            TokenKind::Select => TokenClass::Select,
            TokenKind::OrderBy => TokenClass::OrderBy,
            TokenKind::Where => TokenClass::Where,
            TokenKind::Top => TokenClass::Top,
            TokenKind::Flag(_) => TokenClass::Flag,
            TokenKind::And => TokenClass::And,
            TokenKind::Star => TokenClass::Star,
            TokenKind::Not => TokenClass::Not,
            TokenKind::Tilde => TokenClass::Tilde,
            TokenKind::Bang => TokenClass::Bang,
            TokenKind::EqTest(_) => TokenClass::EqTest,
            TokenKind::Comma => TokenClass::Comma,
            TokenKind::Eof => TokenClass::Eof,
        }
    }
}

/// Token kinds without their values, used in parse diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenClass {
    FieldRef,
    Number,
    QuotedString,
    RegexSlashed,
    RegexUnquoted,
    Datetime,
    Select,
    OrderBy,
    Where,
    Top,
    Flag,
    And,
    Star,
    Not,
    Tilde,
    Bang,
    EqTest,
    Comma,
    Eof,
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenClass::FieldRef => "FIELD_REF",
            TokenClass::Number => "NUMBER",
            TokenClass::QuotedString => "QUOTED_STRING",
            TokenClass::RegexSlashed => "REGEX_SLASHED",
            TokenClass::RegexUnquoted => "REGEX_UNQUOTED",
            TokenClass::Datetime => "DATETIME",
            TokenClass::Select => "SELECT",
            TokenClass::OrderBy => "ORDER_BY",
            TokenClass::Where => "WHERE",
            TokenClass::Top => "TOP",
            TokenClass::Flag => "FLAG",
            TokenClass::And => "AND",
            TokenClass::Star => "STAR",
            TokenClass::Not => "NOT",
            TokenClass::Tilde => "TILDE",
            TokenClass::Bang => "BANG",
            TokenClass::EqTest => "EQ_TEST",
            TokenClass::Comma => "COMMA",
            TokenClass::Eof => "end of input",
        };
        f.write_str(name)
    }
}
