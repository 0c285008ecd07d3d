//! CLI support for fdb-query
//!
//! Provides programmatic access to the `fdbq` command so other tools can
//! run queries over an index file without shelling out.

mod check;
mod convert;
mod docs;

pub use check::{CheckOptions, CheckResult, OutputFormat, execute_check};
pub use convert::{load_index, parse_baseline};
pub use docs::{HelpTopic, get_help_overview, get_help_topic};

use std::io;

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Query tokenizing error
    Lex(crate::LexError),
    /// Parser error
    Parse(crate::ParseError),
    /// Evaluation error
    Eval(crate::EvalError),
    /// Index rows that do not fit the schema
    Index(crate::IndexError),
    /// JSON parsing error
    Json(serde_json::Error),
    /// IO error
    Io(io::Error),
    /// Index JSON that is valid JSON but not an index
    BadIndex(String),
    /// Malformed command line value
    BadArgument(String),
    /// No input provided
    NoInput,
    /// Unknown help topic
    UnknownTopic(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Lex(e) => write!(f, "{}", e),
            CliError::Parse(e) => write!(f, "{}", e),
            CliError::Eval(e) => write!(f, "Evaluation error: {}", e),
            CliError::Index(e) => write!(f, "Invalid index: {}", e),
            CliError::Json(e) => write!(f, "Invalid JSON: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::BadIndex(msg) => write!(f, "Invalid index: {}", msg),
            CliError::BadArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::NoInput => write!(
                f,
                "No index provided. Use --index, set FDBQ_INDEX, or pipe JSON to stdin."
            ),
            CliError::UnknownTopic(t) => {
                write!(f, "Unknown topic: '{}'\nRun 'fdbq help-query' to see available topics.", t)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Lex(e) => Some(e),
            CliError::Parse(e) => Some(e),
            CliError::Eval(e) => Some(e),
            CliError::Index(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<crate::LexError> for CliError {
    fn from(e: crate::LexError) -> Self {
        CliError::Lex(e)
    }
}

impl From<crate::ParseError> for CliError {
    fn from(e: crate::ParseError) -> Self {
        CliError::Parse(e)
    }
}

impl From<crate::EvalError> for CliError {
    fn from(e: crate::EvalError) -> Self {
        CliError::Eval(e)
    }
}

impl From<crate::QueryError> for CliError {
    fn from(e: crate::QueryError) -> Self {
        match e {
            crate::QueryError::Lex(e) => CliError::Lex(e),
            crate::QueryError::Parse(e) => CliError::Parse(e),
            crate::QueryError::Eval(e) => CliError::Eval(e),
        }
    }
}

impl From<crate::IndexError> for CliError {
    fn from(e: crate::IndexError) -> Self {
        CliError::Index(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
