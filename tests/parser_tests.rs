// tests/parser_tests.rs

use fdb_query::ast::{
    Clause, Comparison, EqTest, Flag, FlagSet, NumberLiteral, Pattern, ProjectItem, Query,
    RegexTerm, RhsValue, SortKey, TokenClass,
};
use fdb_query::lexer::Lexer;
use fdb_query::parser::{ParseError, Parser};

fn parse(input: &str) -> Query {
    let mut parser = Parser::new(Lexer::new(input)).expect("lexes");
    parser
        .parse_query()
        .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", input, e))
}

fn parse_err(input: &str) -> ParseError {
    let mut parser = Parser::new(Lexer::new(input)).expect("lexes");
    parser.parse_query().expect_err("should not parse")
}

fn term(field: &str, pattern: Pattern, negate: bool) -> RegexTerm {
    RegexTerm {
        field: field.to_string(),
        pattern,
        negate,
    }
}

// ============================================================================
// Clause Kinds
// ============================================================================

#[test]
fn test_limit() {
    assert_eq!(parse("top 10").clauses, vec![Clause::Limit(10)]);
}

#[test]
fn test_limit_requires_whole_number() {
    for input in ["top 1.5", "top -3", "top 2e3", "top 10%", "top name"] {
        let err = parse_err(input);
        assert_eq!(err.offset, 4, "input {:?}", input);
        assert_eq!(err.expected, vec![TokenClass::Number]);
    }
}

#[test]
fn test_flags_are_greedy() {
    let query = parse("recent duplicates recent top 1");
    let flags: FlagSet = [Flag::Recent, Flag::Duplicates].into_iter().collect();
    assert_eq!(query.clauses, vec![Clause::FlagSet(flags), Clause::Limit(1)]);
}

#[test]
fn test_regex_terms() {
    let query = parse(r"name~/\.rs$/ and path~src_dir and size~10");
    assert_eq!(
        query.clauses,
        vec![Clause::RegexFilter(vec![
            term("name", Pattern::Slashed(r"\.rs$".to_string()), false),
            term("path", Pattern::Literal("src_dir".to_string()), false),
            term("size", Pattern::Unquoted("10".to_string()), false),
        ])]
    );
}

#[test]
fn test_negated_forms() {
    let query = parse("!path~/tmp/ !bak !.orig !/~$/");
    assert_eq!(
        query.clauses,
        vec![
            Clause::RegexFilter(vec![term("path", Pattern::Slashed("tmp".to_string()), true)]),
            Clause::RegexFilter(vec![term("name", Pattern::Unquoted("bak".to_string()), true)]),
            Clause::RegexFilter(vec![term("name", Pattern::Unquoted(".orig".to_string()), true)]),
            Clause::RegexFilter(vec![term("name", Pattern::Slashed("~$".to_string()), true)]),
        ]
    );
}

#[test]
fn test_quoted_pattern() {
    let query = parse(r#"name~"a b""#);
    assert_eq!(
        query.clauses,
        vec![Clause::RegexFilter(vec![term(
            "name",
            Pattern::Unquoted("a b".to_string()),
            false
        )])]
    );
}

#[test]
fn test_select() {
    assert_eq!(
        parse("select name,*,-size").clauses,
        vec![Clause::Projection(vec![
            ProjectItem::Include("name".to_string()),
            ProjectItem::All,
            ProjectItem::Exclude("size".to_string()),
        ])]
    );
}

#[test]
fn test_where() {
    let query = parse(r#"where size>=1e3 and name<"m" and ctime<mtime"#);
    assert_eq!(
        query.clauses,
        vec![Clause::Filter(vec![
            Comparison {
                field: "size".to_string(),
                op: EqTest::GreaterEqual,
                rhs: RhsValue::Number(NumberLiteral::parse("1e3").unwrap()),
            },
            Comparison {
                field: "name".to_string(),
                op: EqTest::LessThan,
                rhs: RhsValue::Str("m".to_string()),
            },
            Comparison {
                field: "ctime".to_string(),
                op: EqTest::LessThan,
                rhs: RhsValue::Field("mtime".to_string()),
            },
        ])]
    );
}

#[test]
fn test_where_datetime() {
    let query = parse("where mtime>=2024-01-01");
    let Clause::Filter(comparisons) = &query.clauses[0] else {
        panic!("expected a filter");
    };
    assert!(matches!(comparisons[0].rhs, RhsValue::Datetime(_)));
}

#[test]
fn test_order() {
    assert_eq!(
        parse("order by -size,name").clauses,
        vec![Clause::Sort(vec![
            SortKey {
                field: "size".to_string(),
                descending: true
            },
            SortKey {
                field: "name".to_string(),
                descending: false
            },
        ])]
    );
}

// ============================================================================
// Whole Queries
// ============================================================================

#[test]
fn test_clauses_keep_source_order() {
    let query = parse("top 3 name~a1 where size>1 select name top 5");
    let kinds: Vec<&str> = query
        .clauses
        .iter()
        .map(|c| match c {
            Clause::Limit(_) => "limit",
            Clause::FlagSet(_) => "flags",
            Clause::RegexFilter(_) => "regex",
            Clause::Projection(_) => "select",
            Clause::Filter(_) => "where",
            Clause::Sort(_) => "order",
        })
        .collect();
    assert_eq!(kinds, vec!["limit", "regex", "where", "select", "limit"]);
}

#[test]
fn test_deterministic() {
    let input = "duplicates name~/x/ where size>10% order -mtime select -hash top 7";
    assert_eq!(parse(input), parse(input));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_empty_query() {
    let err = parse_err("   ");
    assert_eq!(err.offset, 3);
    assert_eq!(err.found, "end of input");
    assert!(err.expected.contains(&TokenClass::Top));
}

#[test]
fn test_missing_rhs_at_end() {
    let err = parse_err("where size>");
    assert_eq!(err.offset, 11);
    assert_eq!(
        err.expected,
        vec![
            TokenClass::QuotedString,
            TokenClass::FieldRef,
            TokenClass::Number,
            TokenClass::Datetime
        ]
    );
    assert_eq!(
        err.to_string(),
        "Parse error at offset 11: expected QUOTED_STRING or FIELD_REF or NUMBER or DATETIME, found end of input"
    );
}

#[test]
fn test_missing_tilde() {
    let err = parse_err("name foo");
    assert_eq!(err.offset, 5);
    assert_eq!(err.expected, vec![TokenClass::Tilde]);
}

#[test]
fn test_stray_token() {
    let err = parse_err("top 1 ,");
    assert_eq!(err.offset, 6);
    assert!(err.found.contains("','"));
}

#[test]
fn test_dangling_and() {
    let err = parse_err("where size>1 and");
    assert_eq!(err.offset, 16);
    assert_eq!(err.expected, vec![TokenClass::FieldRef]);
}

#[test]
fn test_select_needs_items() {
    let err = parse_err("select");
    assert_eq!(err.offset, 6);
    assert_eq!(
        err.expected,
        vec![TokenClass::Star, TokenClass::Not, TokenClass::FieldRef]
    );
}

#[test]
fn test_from_tokens_appends_eof() {
    let mut tokens = Lexer::new("top 2").tokenize().unwrap();
    tokens.pop();
    let query = Parser::from_tokens(tokens).parse_query().unwrap();
    assert_eq!(query.clauses, vec![Clause::Limit(2)]);
}
