//! Query language help for the fdbq CLI

use super::CliError;

/// Available help topics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Patterns,
    Where,
    Select,
    Order,
    Flags,
    Literals,
}

impl HelpTopic {
    /// Parse topic name from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "patterns" | "pattern" | "regex" | "match" => Some(Self::Patterns),
            "where" | "comparisons" | "compare" => Some(Self::Where),
            "select" | "columns" | "projection" => Some(Self::Select),
            "order" | "sort" | "top" => Some(Self::Order),
            "flags" | "flag" => Some(Self::Flags),
            "literals" | "types" | "values" => Some(Self::Literals),
            _ => None,
        }
    }
}

/// Get the help overview (topic listing)
pub fn get_help_overview() -> &'static str {
    r#"FDBQ QUERY LANGUAGE

A query is a flat list of clauses, in any order. Each clause narrows, sorts,
or shapes the rows of the file index (one row per file).

TOPICS

  patterns    Regex matches against a column: name~/^tmp/, !/bak/
  where       Typed comparisons: where size>"1MB" and mtime>=2024-01-01
  select      Output columns: select name,size or select -hash
  order       Sorting and limits: order -size,name top 10
  flags       Switches: recent, duplicates, hardlinks, verbose
  literals    Numbers, percentages, dates, and quoted strings

QUICK REFERENCE

  name~/\.rs$/                 Column matches pattern
  !name~/tmp/                  Column does not match
  where size>=100              Comparison (==, <, <=, >, >=)
  order -mtime                 Sort, newest first
  select name,path             Choose columns
  top 20                       First 20 rows
  duplicates                   Files sharing content

Run 'fdbq help-query <topic>' for details.
"#
}

/// Get help text for a specific topic
pub fn get_help_topic(name: &str) -> Result<&'static str, CliError> {
    match HelpTopic::from_name(name) {
        Some(HelpTopic::Patterns) => Ok(PATTERNS_HELP),
        Some(HelpTopic::Where) => Ok(WHERE_HELP),
        Some(HelpTopic::Select) => Ok(SELECT_HELP),
        Some(HelpTopic::Order) => Ok(ORDER_HELP),
        Some(HelpTopic::Flags) => Ok(FLAGS_HELP),
        Some(HelpTopic::Literals) => Ok(LITERALS_HELP),
        None => Err(CliError::UnknownTopic(name.to_string())),
    }
}

const PATTERNS_HELP: &str = r#"PATTERNS - Matching Columns Against Regexes

COLUMN MATCH
  column~pattern
    Keeps rows whose column value contains a match for the pattern. The
    match is unanchored; use ^ and $ to anchor.

    Examples:
      name~/\.log$/          Names ending in .log
      path~/src/             Paths containing "src"
      name~.bak              Bare pattern: names containing any char then "bak"
      name~stem              Name contains the value of the row's stem column

    Pattern forms:
      /.../                  Slashed regex; \/ for a literal slash
      text                   Bare pattern not shaped like a column name, read
                             up to whitespace or comma
      column                 A column name: that column's value is the pattern

NEGATION
  !column~pattern            Column does not match
  !text  or  !/re/           The name column does not match

COMBINING
  name~/^a/ and path~/docs/  Both must match
    Several match clauses in one query are all required.

NULLS
  A missing value never matches, so it always passes a negated match.
"#;

const WHERE_HELP: &str = r#"WHERE - Typed Comparisons

SYNTAX
  where column OP value [and column OP value]...
    OP is one of  ==  <  <=  >  >=
    All comparisons must hold. Repeated where clauses are combined.

RIGHT-HAND SIDES
  where size>1000            Number, against a number column
  where size>10%             Percentage of the column's baseline
  where mtime>=2024-01-01    Date or date-time, against a date column
  where name<"m"             Quoted string, compared as text
  where size>"1.5MB"         Quoted size, against a number column (1024-based)
  where ctime<mtime          Another column of the same row

    Comparing a number column with a date is an error. A row with a
    missing value on either side never passes.

BASELINES
  Percentages need a baseline for the column, from the index file or from
  --baseline size=500GB on the command line.
"#;

const SELECT_HELP: &str = r#"SELECT - Choosing Output Columns

  select *                   All columns in index order (the default)
  select name,size           Just these, in this order
  select name,*              name first, then everything else
  select -hash,-dir          All columns except these

    Included and excluded columns cannot be mixed. Only the last select
    clause of a query takes effect.
"#;

const ORDER_HELP: &str = r#"ORDER - Sorting and Limits

SORTING
  order size                 Ascending
  order -size                Descending
  order -size,name           By size, then name
  order by -mtime            'by' is optional; 'sort' is a synonym

    Equal rows keep index order. Missing values sort last in both
    directions. Only the last order clause takes effect.

LIMIT
  top 10
    Keeps the first 10 rows after sorting. With the verbose flag the table
    output reports how many rows matched before the limit.
"#;

const FLAGS_HELP: &str = r#"FLAGS - Named Switches

  recent                     Modified within the recent window (default 7 days,
                             --recent-days to change)
  duplicates                 Files whose content hash is shared with another file
  hardlinks                  Files with two or more hard links
  verbose                    Add a match summary to table output

    Flags can be written anywhere and repeated; they combine.
"#;

const LITERALS_HELP: &str = r#"LITERALS - Values in Queries

NUMBERS
  42   -3.5   .5   1e6   inf   -inf
  25%                        A percentage of the column's baseline

DATES
  2024-01-31
  2024-01-31T08:00:00
  2024-01-31T08:00:00+02:00
  2024-01-31T08:00:00Z
    Dates without an offset use --timezone (UTC by default).

STRINGS
  "double"   'single'
    A backslash escapes the quote character or another backslash.

COLUMN NAMES
  Letters, digits and underscores, not starting with a digit.
  Case-insensitive.
"#;

#[test]
fn test_every_topic_resolves() {
    for name in ["patterns", "where", "select", "order", "flags", "literals", "sort"] {
        assert!(get_help_topic(name).is_ok(), "{}", name);
    }
    assert!(get_help_topic("bogus").is_err());
}
