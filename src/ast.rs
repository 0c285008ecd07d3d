//! # fdb-query - Abstract Syntax Tree
//!
//! This module defines the tokens and clause tree of the fdb query language,
//! a compact language for filtering, sorting, and projecting an index of
//! local files (one row per file).
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[literals]** - Number and date/time literal values
//! - **[operators]** - Comparison operators and flag keywords
//! - **[clauses]** - Top-level clauses (filters, projection, sort, limit, flags)
//! - **[query]** - A parsed query: clauses in source order
//!
//! ## Quick Start
//!
//! ```text
//! select name,size where size>"1MB" top 10 order -mtime
//! ```
//!
//! This query keeps files larger than one megabyte, sorts them newest first,
//! and returns the `name` and `size` columns of the first ten.
//!
//! ## Core Concepts
//!
//! ### Clauses
//!
//! A query is a flat sequence of clauses, in any order:
//!
//! - **Regex filter** `name~/^tmp/`, `!bak` - match a column against a pattern
//! - **Where** `where size>100 and mtime>=2024-01-01` - typed comparisons
//! - **Select** `select name,size` or `select -hash` - choose output columns
//! - **Order** `order -size,name` - multi-key sort, `-` for descending
//! - **Top** `top 10` - keep the first rows only
//! - **Flags** `duplicates verbose` - named switches
//!
//! ### Repetition
//!
//! Any clause kind may appear more than once. The parser keeps every clause;
//! what repetition means is decided when the clauses are folded into a
//! [`QueryPlan`](crate::plan::QueryPlan).
//!
//! ## Examples
//!
//! ### Largest Python files
//!
//! ```text
//! name~/\.py$/ order -size top 5
//! ```
//!
//! ### Duplicate content, excluding backups
//!
//! ```text
//! duplicates !bak select -drive_model
//! ```
pub mod clauses;
pub mod literals;
pub mod operators;
pub mod query;
pub mod tokens;

pub use clauses::{Clause, Comparison, Pattern, ProjectItem, RegexTerm, RhsValue, SortKey};
pub use literals::{DatetimeLiteral, NumberLiteral, NumberUnit};
pub use operators::{EqTest, Flag, FlagSet};
pub use query::Query;
pub use tokens::{Token, TokenClass, TokenKind};
