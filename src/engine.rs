//! One-call entry points chaining lexer, parser, plan builder and evaluator.

use std::fmt;

use crate::{
    evaluator::{EvalConfig, EvalError, Evaluator, QueryResult},
    index::FileIndex,
    lexer::{LexError, Lexer},
    parser::{ParseError, Parser},
    plan::QueryPlan,
};

/// Any error a query can fail with, tagged by stage.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    Lex(LexError),
    Parse(ParseError),
    Eval(EvalError),
}

impl QueryError {
    /// Byte offset into the query text, for lex and parse errors.
    pub fn offset(&self) -> Option<usize> {
        match self {
            QueryError::Lex(e) => Some(e.offset),
            QueryError::Parse(e) => Some(e.offset),
            QueryError::Eval(_) => None,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Lex(e) => write!(f, "{}", e),
            QueryError::Parse(e) => write!(f, "{}", e),
            QueryError::Eval(e) => write!(f, "Evaluation error: {}", e),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Lex(e) => Some(e),
            QueryError::Parse(e) => Some(e),
            QueryError::Eval(e) => Some(e),
        }
    }
}

impl From<LexError> for QueryError {
    fn from(e: LexError) -> Self {
        QueryError::Lex(e)
    }
}

impl From<ParseError> for QueryError {
    fn from(e: ParseError) -> Self {
        QueryError::Parse(e)
    }
}

impl From<EvalError> for QueryError {
    fn from(e: EvalError) -> Self {
        QueryError::Eval(e)
    }
}

/// Parses query text straight to its plan.
///
/// # Examples
///
/// ```
/// use fdb_query::parse_query;
///
/// let plan = parse_query("top 5 where size>8 top 2").unwrap();
/// assert_eq!(plan.limit, Some(2));
/// assert_eq!(plan.where_filters.len(), 1);
/// ```
pub fn parse_query(text: &str) -> Result<QueryPlan, QueryError> {
    let mut parser = Parser::new(Lexer::new(text))?;
    let query = parser.parse_query()?;
    Ok(QueryPlan::build(query))
}

/// Parses and evaluates `text` against `index`.
pub fn run_query(
    text: &str,
    index: &dyn FileIndex,
    config: &EvalConfig,
) -> Result<QueryResult, QueryError> {
    let plan = parse_query(text)?;
    Ok(Evaluator::new(config).evaluate(&plan, index)?)
}
