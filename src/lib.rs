pub mod ast;
pub mod cli;
pub mod engine;
pub mod evaluator;
pub mod index;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod plan;
pub mod value;

pub use ast::{Clause, FlagSet, Query, Token};
pub use engine::{QueryError, parse_query, run_query};
pub use evaluator::{EvalConfig, EvalError, Evaluator, FlagColumns, QueryResult};
pub use index::{Column, ColumnType, FileIndex, IndexError, MemoryIndex};
pub use lexer::{LexError, Lexer};
pub use output::{to_json, to_json_pretty, to_table};
pub use parser::{ParseError, Parser};
pub use plan::QueryPlan;
pub use value::Value;
