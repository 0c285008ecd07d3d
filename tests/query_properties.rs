// tests/query_properties.rs
//
// Whole-pipeline properties: query text in, rows out.

use fdb_query::lexer::Lexer;
use fdb_query::parser::Parser;
use fdb_query::{
    Column, ColumnType, EvalConfig, MemoryIndex, QueryError, QueryResult, Value, parse_query,
    run_query,
};

fn small_index() -> MemoryIndex {
    let mut index = MemoryIndex::new(vec![
        Column::new("name", ColumnType::String),
        Column::new("size", ColumnType::Number),
    ])
    .unwrap();
    for (name, size) in [("a", 10), ("b", 20), ("c", 5)] {
        index
            .push_row(vec![Value::String(name.to_string()), Value::Integer(size)])
            .unwrap();
    }
    index
}

/// Files with repeated sizes and content hashes, for stability and flags.
fn tmp_index() -> MemoryIndex {
    let mut index = MemoryIndex::new(vec![
        Column::new("name", ColumnType::String),
        Column::new("size", ColumnType::Number),
        Column::new("hash", ColumnType::String),
        Column::new("links", ColumnType::Number),
    ])
    .unwrap();
    let rows = [
        ("tmp1", 3, "x", 1),
        ("notes", 7, "y", 2),
        ("tmp2", 3, "x", 2),
        ("a_tmp", 3, "z", 1),
        ("tmpfile", 9, "y", 1),
        ("zeta", 7, "w", 1),
    ];
    for (name, size, hash, links) in rows {
        index
            .push_row(vec![
                Value::String(name.to_string()),
                Value::Integer(size),
                Value::String(hash.to_string()),
                Value::Integer(links),
            ])
            .unwrap();
    }
    index
}

fn run(query: &str, index: &MemoryIndex) -> QueryResult {
    run_query(query, index, &EvalConfig::default())
        .unwrap_or_else(|e| panic!("{:?} failed: {}", query, e))
}

fn first_column(result: &QueryResult) -> Vec<String> {
    result.rows.iter().map(|row| row[0].as_string()).collect()
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_is_deterministic() {
    for query in [
        "top 3",
        "recent verbose name~/^tmp/",
        "!bak where size>=10% and mtime<2024-01-01 order -size,name select -hash",
        "select *",
    ] {
        let once = Parser::new(Lexer::new(query)).unwrap().parse_query().unwrap();
        let twice = Parser::new(Lexer::new(query)).unwrap().parse_query().unwrap();
        assert_eq!(once, twice);
    }
}

#[test]
fn test_malformed_query_reports_end_offset() {
    let err = run_query("where size>", &small_index(), &EvalConfig::default()).unwrap_err();
    assert!(matches!(err, QueryError::Parse(_)));
    assert_eq!(err.offset(), Some(11));
}

// ============================================================================
// Merging
// ============================================================================

#[test]
fn test_flag_union_ignores_position_and_order() {
    let index = tmp_index();
    let variants = [
        "duplicates hardlinks",
        "hardlinks duplicates",
        "hardlinks top 10 duplicates hardlinks",
        "duplicates select name hardlinks duplicates",
    ];

    let expected = parse_query(variants[0]).unwrap().flags;
    let rows = first_column(&run(variants[0], &index));
    assert_eq!(rows, vec!["notes", "tmp2"]);

    for query in &variants[1..] {
        assert_eq!(parse_query(query).unwrap().flags, expected, "{}", query);
        assert_eq!(first_column(&run(query, &index)), rows, "{}", query);
    }
}

#[test]
fn test_where_clauses_equal_one_conjunction() {
    let index = tmp_index();
    let split = run("where size>3 where size<9 where name>\"m\"", &index);
    let joined = run("where size>3 and size<9 and name>\"m\"", &index);
    assert_eq!(split, joined);
    assert_eq!(first_column(&joined), vec!["notes", "zeta"]);
}

// ============================================================================
// Results
// ============================================================================

#[test]
fn test_sort_is_stable() {
    let result = run("order size select name", &tmp_index());
    assert_eq!(
        first_column(&result),
        vec!["tmp1", "tmp2", "a_tmp", "notes", "zeta", "tmpfile"]
    );

    let result = run("order -size select name", &tmp_index());
    assert_eq!(
        first_column(&result),
        vec!["tmpfile", "notes", "zeta", "tmp1", "tmp2", "a_tmp"]
    );
}

#[test]
fn test_select_star_returns_everything() {
    let index = small_index();
    let result = run("select *", &index);
    assert_eq!(result.columns, vec!["name", "size"]);
    assert_eq!(result.total_matched, 3);
    assert_eq!(
        result.rows,
        vec![
            vec![Value::String("a".into()), Value::Integer(10)],
            vec![Value::String("b".into()), Value::Integer(20)],
            vec![Value::String("c".into()), Value::Integer(5)],
        ]
    );
}

#[test]
fn test_select_minus_size() {
    let result = run("select -size", &small_index());
    assert_eq!(result.columns, vec!["name"]);
    assert_eq!(result.rows.len(), 3);
}

#[test]
fn test_keywords_need_no_trailing_space() {
    let index = small_index();
    assert_eq!(run("select*", &index), run("select *", &index));
    assert_eq!(
        first_column(&run("order-size select name", &index)),
        vec!["b", "a", "c"]
    );
}

#[test]
fn test_top_zero_counts_matches() {
    let result = run("top 0", &small_index());
    assert!(result.rows.is_empty());
    assert_eq!(result.total_matched, 3);
}

#[test]
fn test_worked_example() {
    let result = run("where size>8 order -size select name", &small_index());
    assert_eq!(result.columns, vec!["name"]);
    assert_eq!(
        result.rows,
        vec![
            vec![Value::String("b".into())],
            vec![Value::String("a".into())],
        ]
    );
    assert_eq!(result.total_matched, 2);
}

#[test]
fn test_prefix_match_and_its_complement() {
    let index = tmp_index();
    let matched = first_column(&run("name~/^tmp/ select name", &index));
    let excluded = first_column(&run("!name~/^tmp/ select name", &index));

    assert_eq!(matched, vec!["tmp1", "tmp2", "tmpfile"]);
    assert_eq!(excluded, vec!["notes", "a_tmp", "zeta"]);

    let mut all = matched.clone();
    all.extend(excluded.iter().cloned());
    all.sort();
    let mut every = first_column(&run("select name", &index));
    every.sort();
    assert_eq!(all, every);
}
