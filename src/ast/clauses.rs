use std::fmt;

use crate::ast::{DatetimeLiteral, EqTest, FlagSet, NumberLiteral};

/// One top-level unit of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Row limit
    ///
    /// # Example
    /// ```text
    /// top 10
    /// ```
    Limit(u64),

    /// Run of flag keywords
    ///
    /// # Example
    /// ```text
    /// duplicates verbose
    /// ```
    FlagSet(FlagSet),

    /// Pattern matches joined by `and`
    ///
    /// # Example
    /// ```text
    /// name~/^tmp/ and path~src
    /// ```
    RegexFilter(Vec<RegexTerm>),

    /// Output columns
    ///
    /// # Examples
    /// ```text
    /// select name,size
    /// select *
    /// select -hash,-node
    /// ```
    Projection(Vec<ProjectItem>),

    /// Typed comparisons joined by `and`
    ///
    /// # Example
    /// ```text
    /// where size>"1MB" and mtime>=2024-01-01
    /// ```
    Filter(Vec<Comparison>),

    /// Sort keys, primary first
    ///
    /// # Example
    /// ```text
    /// order -size,name
    /// ```
    Sort(Vec<SortKey>),
}

/// A single pattern match against one column.
#[derive(Debug, Clone, PartialEq)]
pub struct RegexTerm {
    pub field: String,
    pub pattern: Pattern,
    /// Written with a leading `!`
    pub negate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Another column whose value (in the same row) is the pattern text
    Literal(String),
    /// Bare word pattern
    Unquoted(String),
    /// `/.../` pattern
    Slashed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectItem {
    /// `*`
    All,
    /// `name`
    Include(String),
    /// `-name`
    Exclude(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub field: String,
    pub op: EqTest,
    pub rhs: RhsValue,
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum RhsValue {
    Str(String),
    Field(String),
    Datetime(DatetimeLiteral),
    Number(NumberLiteral),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(field) => f.write_str(field),
            // A bare word could read back as a column name, so both
            // pattern forms are written between slashes. `\/` and a trailing
            // backslash have no slashed spelling and go in quotes instead.
            Pattern::Unquoted(text) | Pattern::Slashed(text) => {
                if text.contains("\\/") || text.ends_with('\\') {
                    write_quoted(f, text)
                } else {
                    write!(f, "/{}/", text.replace('/', "\\/"))
                }
            }
        }
    }
}

/// Writes `text` as a double-quoted string the lexer reads back verbatim.
fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in text.chars() {
        if matches!(ch, '"' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{}", ch)?;
    }
    f.write_str("\"")
}

impl fmt::Display for RegexTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            f.write_str("!")?;
        }
        write!(f, "{}~{}", self.field, self.pattern)
    }
}

impl fmt::Display for ProjectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectItem::All => f.write_str("*"),
            ProjectItem::Include(field) => f.write_str(field),
            ProjectItem::Exclude(field) => write!(f, "-{}", field),
        }
    }
}

impl fmt::Display for RhsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RhsValue::Str(s) => write_quoted(f, s),
            RhsValue::Field(field) => f.write_str(field),
            RhsValue::Datetime(dt) => write!(f, "{}", dt),
            RhsValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, self.op, self.rhs)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            f.write_str("-")?;
        }
        f.write_str(&self.field)
    }
}
