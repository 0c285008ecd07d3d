//! Execute queries against a JSON file index

use std::time::Instant;

use log::{debug, info};

use super::{CliError, load_index};
use crate::{
    EvalConfig, Evaluator, FileIndex, Lexer, Parser, QueryPlan,
    output::{to_json, to_json_pretty, to_table},
};

/// How results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

/// Options for the query command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The query to execute
    pub query: String,
    /// Index JSON
    pub index: Option<String>,
    pub format: OutputFormat,
    /// Pretty-print JSON output
    pub pretty: bool,
    /// Print the merged plan instead of running it
    pub explain: bool,
    pub config: EvalConfig,
}

/// Result of a query command
#[derive(Debug)]
pub enum CheckResult {
    /// Canonical form of the merged plan
    Explained(String),
    /// Rendered result rows
    Success(String),
}

/// Parse, plan and run a query.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let started = Instant::now();
    let mut parser = Parser::new(Lexer::new(&options.query))?;
    let query = parser.parse_query()?;
    debug!(
        "parsed {} clause(s) in {:?}",
        query.clauses.len(),
        started.elapsed()
    );

    let plan = QueryPlan::build(query);
    if options.explain {
        return Ok(CheckResult::Explained(plan.to_string()));
    }

    let json = options.index.as_ref().ok_or(CliError::NoInput)?;
    let loading = Instant::now();
    let index = load_index(json)?;
    info!(
        "loaded index: {} rows, {} columns in {:?}",
        index.row_count(),
        index.columns().len(),
        loading.elapsed()
    );

    let evaluating = Instant::now();
    let result = Evaluator::new(&options.config).evaluate(&plan, &index)?;
    info!(
        "{} of {} rows matched, {} returned in {:?}",
        result.total_matched,
        result.scanned,
        result.rows.len(),
        evaluating.elapsed()
    );

    let output = match options.format {
        OutputFormat::Table => to_table(&result),
        OutputFormat::Json if options.pretty => to_json_pretty(&result),
        OutputFormat::Json => to_json(&result),
    };
    Ok(CheckResult::Success(output))
}
