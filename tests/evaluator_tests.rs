// tests/evaluator_tests.rs

use chrono::{DateTime, Duration, FixedOffset, Utc};
use fdb_query::{
    Column, ColumnType, EvalConfig, EvalError, MemoryIndex, QueryError, QueryResult, Value,
    run_query,
};

fn at(text: &str) -> Value {
    Value::Datetime(
        DateTime::parse_from_rfc3339(text)
            .unwrap()
            .with_timezone(&Utc),
    )
}

fn s(text: &str) -> Value {
    Value::String(text.to_string())
}

/// Five files; `D.TXT` has no size, times or hash.
fn files() -> MemoryIndex {
    let mut index = MemoryIndex::new(vec![
        Column::new("name", ColumnType::String),
        Column::new("path", ColumnType::String),
        Column::new("size", ColumnType::Number),
        Column::new("mtime", ColumnType::Datetime),
        Column::new("ctime", ColumnType::Datetime),
        Column::new("hash", ColumnType::String),
        Column::new("links", ColumnType::Number),
    ])
    .unwrap();

    let rows = vec![
        vec![
            s("a.txt"),
            s("/home/u/a.txt"),
            Value::Integer(100),
            at("2024-03-01T00:00:00Z"),
            at("2024-01-01T00:00:00Z"),
            s("h1"),
            Value::Integer(1),
        ],
        vec![
            s("b.rs"),
            s("/home/u/src/b.rs"),
            Value::Integer(5000),
            at("2024-03-09T00:00:00Z"),
            at("2024-03-09T00:00:00Z"),
            s("h2"),
            Value::Integer(2),
        ],
        vec![
            s("c.txt"),
            s("/tmp/c.txt"),
            Value::Integer(100),
            at("2024-02-01T00:00:00Z"),
            Value::Null,
            s("h1"),
            Value::Integer(1),
        ],
        vec![
            s("D.TXT"),
            s("/tmp/D.TXT"),
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Integer(3),
        ],
        vec![
            s("e.log"),
            s("/var/e.log"),
            Value::Float(2048.0),
            at("2024-03-10T00:00:00Z"),
            at("2024-03-11T00:00:00Z"),
            s("h3"),
            Value::Integer(1),
        ],
    ];
    for row in rows {
        index.push_row(row).unwrap();
    }
    index.set_baseline("size", 10_000.0);
    index
}

fn config() -> EvalConfig {
    EvalConfig {
        now: Some(at("2024-03-10T12:00:00Z").as_datetime().unwrap()),
        ..EvalConfig::default()
    }
}

fn run(query: &str) -> QueryResult {
    run_with(query, &config())
}

fn run_with(query: &str, config: &EvalConfig) -> QueryResult {
    run_query(query, &files(), config).unwrap_or_else(|e| panic!("{:?} failed: {}", query, e))
}

fn eval_err(query: &str) -> EvalError {
    match run_query(query, &files(), &config()) {
        Err(QueryError::Eval(e)) => e,
        other => panic!("{:?}: expected an evaluation error, got {:?}", query, other),
    }
}

/// Names of the returned rows, from a result that includes `name`.
fn names(result: &QueryResult) -> Vec<String> {
    let column = result
        .columns
        .iter()
        .position(|c| c == "name")
        .expect("name column");
    result.rows.iter().map(|row| row[column].as_string()).collect()
}

// ============================================================================
// Projection
// ============================================================================

#[test]
fn test_select_all_keeps_schema_and_index_order() {
    let result = run("select *");
    assert_eq!(
        result.columns,
        vec!["name", "path", "size", "mtime", "ctime", "hash", "links"]
    );
    assert_eq!(names(&result), vec!["a.txt", "b.rs", "c.txt", "D.TXT", "e.log"]);
    assert_eq!(result.total_matched, 5);
    assert_eq!(result.scanned, 5);
}

#[test]
fn test_select_exclude() {
    let result = run("select -size,-hash");
    assert_eq!(result.columns, vec!["name", "path", "mtime", "ctime", "links"]);
}

#[test]
fn test_select_include_order() {
    let result = run("select size,name,size");
    assert_eq!(result.columns, vec!["size", "name"]);
    assert_eq!(result.rows[0], vec![Value::Integer(100), s("a.txt")]);
}

#[test]
fn test_select_star_expands_in_place() {
    let result = run("select links,*");
    assert_eq!(
        result.columns,
        vec!["links", "name", "path", "size", "mtime", "ctime", "hash"]
    );
}

#[test]
fn test_mixed_projection() {
    assert_eq!(eval_err("select name,-size"), EvalError::MixedProjection);
}

#[test]
fn test_last_select_wins() {
    assert_eq!(run("select name select path").columns, vec!["path"]);
}

// ============================================================================
// Flags
// ============================================================================

#[test]
fn test_duplicates() {
    assert_eq!(names(&run("duplicates")), vec!["a.txt", "c.txt"]);
}

#[test]
fn test_hardlinks() {
    assert_eq!(names(&run("hardlinks")), vec!["b.rs", "D.TXT"]);
}

#[test]
fn test_recent() {
    assert_eq!(names(&run("recent")), vec!["b.rs", "e.log"]);

    let wide = EvalConfig {
        recent_window: Duration::days(60),
        ..config()
    };
    assert_eq!(names(&run_with("recent", &wide)), vec!["a.txt", "b.rs", "c.txt", "e.log"]);
}

#[test]
fn test_verbose_keeps_rows() {
    let result = run("verbose");
    assert_eq!(result.rows.len(), 5);
    assert!(result.flags.contains(fdb_query::ast::Flag::Verbose));
}

#[test]
fn test_flags_combine() {
    assert!(run("duplicates hardlinks").rows.is_empty());
    assert_eq!(names(&run("recent hardlinks")), vec!["b.rs"]);
}

#[test]
fn test_flag_column_must_exist() {
    let index = MemoryIndex::new(vec![Column::new("name", ColumnType::String)]).unwrap();
    let err = run_query("duplicates", &index, &config()).unwrap_err();
    assert_eq!(err, QueryError::Eval(EvalError::UnknownColumn("hash".to_string())));
}

// ============================================================================
// Pattern Matches
// ============================================================================

#[test]
fn test_slashed_pattern() {
    assert_eq!(names(&run(r"name~/\.txt$/")), vec!["a.txt", "c.txt"]);
}

#[test]
fn test_case_insensitive() {
    let config = EvalConfig {
        case_insensitive: true,
        ..config()
    };
    assert_eq!(
        names(&run_with(r"name~/\.txt$/", &config)),
        vec!["a.txt", "c.txt", "D.TXT"]
    );
}

#[test]
fn test_unanchored_bare_pattern() {
    assert_eq!(names(&run("path~u/src")), vec!["b.rs"]);
}

#[test]
fn test_negation_is_complement() {
    let hit = names(&run(r"name~/\.txt$/"));
    let miss = names(&run(r"!/\.txt$/"));
    assert_eq!(miss, vec!["b.rs", "D.TXT", "e.log"]);
    assert!(hit.iter().all(|n| !miss.contains(n)));
    assert_eq!(hit.len() + miss.len(), 5);
}

#[test]
fn test_null_cell_never_matches() {
    assert_eq!(names(&run("hash~.")), vec!["a.txt", "b.rs", "c.txt", "e.log"]);
    assert_eq!(names(&run("!hash~.")), vec!["D.TXT"]);
}

#[test]
fn test_literal_pattern_uses_row_value() {
    assert_eq!(run("path~name").rows.len(), 5);
    assert_eq!(names(&run("name~hash")), Vec::<String>::new());
}

#[test]
fn test_all_terms_required() {
    assert_eq!(names(&run("path~/tmp/ and name~/^c/")), vec!["c.txt"]);
    assert_eq!(names(&run("path~/tmp/ name~/^c/")), vec!["c.txt"]);
}

#[test]
fn test_bad_pattern() {
    assert!(matches!(eval_err("name~/(/"), EvalError::BadPattern { .. }));
}

#[test]
fn test_bad_pattern_reported_before_comparisons() {
    assert!(matches!(
        eval_err("where size>2024-01-01 name~/(/"),
        EvalError::BadPattern { .. }
    ));
}

// ============================================================================
// Comparisons
// ============================================================================

#[test]
fn test_number_comparison() {
    assert_eq!(names(&run("where size>1000")), vec!["b.rs", "e.log"]);
    assert_eq!(names(&run("where size==100")), vec!["a.txt", "c.txt"]);
    assert_eq!(names(&run("where size<=2048")), vec!["a.txt", "c.txt", "e.log"]);
}

#[test]
fn test_size_string() {
    assert_eq!(names(&run(r#"where size>"1KB""#)), vec!["b.rs", "e.log"]);
    assert_eq!(names(&run(r#"where size=="2 KiB""#)), vec!["e.log"]);
}

#[test]
fn test_datetime_comparison() {
    assert_eq!(names(&run("where mtime>=2024-03-01")), vec!["a.txt", "b.rs", "e.log"]);
    assert_eq!(names(&run(r#"where mtime<"2024-02-15""#)), vec!["c.txt"]);
}

#[test]
fn test_naive_datetime_uses_configured_zone() {
    assert_eq!(names(&run("where mtime>2024-03-09T01:00")), vec!["e.log"]);

    let east = EvalConfig {
        timezone: FixedOffset::east_opt(2 * 3600).unwrap(),
        ..config()
    };
    assert_eq!(
        names(&run_with("where mtime>2024-03-09T01:00", &east)),
        vec!["b.rs", "e.log"]
    );
    // An explicit offset ignores the configured zone
    assert_eq!(
        names(&run_with("where mtime>2024-03-09T01:00Z", &east)),
        vec!["e.log"]
    );
}

#[test]
fn test_string_comparison() {
    assert_eq!(names(&run(r#"where name<"c""#)), vec!["a.txt", "b.rs", "D.TXT"]);
}

#[test]
fn test_field_comparison() {
    assert_eq!(names(&run("where ctime<mtime")), vec!["a.txt"]);
    assert_eq!(names(&run("where ctime==mtime")), vec!["b.rs"]);
}

/// Sizes next to free-text notes, compared column to column.
fn notes(cells: &[(Value, Value)]) -> MemoryIndex {
    let mut index = MemoryIndex::new(vec![
        Column::new("size", ColumnType::Number),
        Column::new("note", ColumnType::String),
    ])
    .unwrap();
    for (size, note) in cells {
        index.push_row(vec![size.clone(), note.clone()]).unwrap();
    }
    index
}

#[test]
fn test_field_comparison_reads_strings_as_sizes() {
    let index = notes(&[
        (Value::Integer(4096), s("2KB")),
        (Value::Integer(100), s("1KB")),
        (Value::Integer(7), Value::Null),
    ]);
    let result = run_query("where size>note", &index, &config()).unwrap();
    assert_eq!(result.rows, vec![vec![Value::Integer(4096), s("2KB")]]);
}

#[test]
fn test_field_comparison_with_unreadable_cell_fails() {
    let index = notes(&[
        (Value::Integer(10), s("abc")),
        (Value::Integer(20), s("xyz")),
    ]);
    let err = run_query("where size>note", &index, &config()).unwrap_err();
    assert!(
        matches!(err, QueryError::Eval(EvalError::TypeMismatch(_))),
        "got {:?}",
        err
    );

    // One bad cell is enough, even after rows that compared fine
    let index = notes(&[
        (Value::Integer(4096), s("2KB")),
        (Value::Integer(20), s("abc")),
    ]);
    assert!(matches!(
        run_query("where size>note", &index, &config()),
        Err(QueryError::Eval(EvalError::TypeMismatch(_)))
    ));
}

#[test]
fn test_negative_zero_equals_zero() {
    let index = notes(&[
        (Value::Integer(0), s("empty")),
        (Value::Float(-0.0), s("also empty")),
        (Value::Integer(1), s("one byte")),
    ]);
    let result = run_query("where size==-0", &index, &config()).unwrap();
    assert_eq!(result.total_matched, 2);
    let result = run_query("where size>0", &index, &config()).unwrap();
    assert_eq!(result.total_matched, 1);
}

#[test]
fn test_nan_cell_fails_every_comparison() {
    let index = notes(&[(Value::Float(f64::NAN), s("broken")), (Value::Integer(3), s("ok"))]);
    for query in ["where size>1", "where size<1", "where size==inf", "where size>-inf"] {
        let result = run_query(query, &index, &config()).unwrap();
        assert!(
            result.rows.iter().all(|row| row[1] != s("broken")),
            "query {:?}",
            query
        );
    }
}

#[test]
fn test_percent_baseline() {
    assert_eq!(names(&run("where size>10%")), vec!["b.rs", "e.log"]);

    let mut config = config();
    config.baselines.insert("size".to_string(), 40_000.0);
    assert_eq!(names(&run_with("where size>10%", &config)), vec!["b.rs"]);
}

#[test]
fn test_missing_baseline() {
    assert_eq!(
        eval_err("where links>50%"),
        EvalError::MissingBaseline("links".to_string())
    );
}

#[test]
fn test_null_makes_comparison_false() {
    let result = run("where size>=0");
    assert!(!names(&result).contains(&"D.TXT".to_string()));
    assert_eq!(result.total_matched, 4);
}

#[test]
fn test_type_mismatch() {
    for query in [
        "where name>10",
        "where size>2024-01-01",
        "where mtime>5",
        r#"where size>"lots""#,
        r#"where mtime>"yesterday""#,
        "where size<mtime",
    ] {
        assert!(
            matches!(eval_err(query), EvalError::TypeMismatch(_)),
            "query {:?}",
            query
        );
    }
}

#[test]
fn test_type_mismatch_even_without_rows() {
    let index = MemoryIndex::new(vec![Column::new("name", ColumnType::String)]).unwrap();
    let err = run_query("where name>10", &index, &config()).unwrap_err();
    assert!(matches!(err, QueryError::Eval(EvalError::TypeMismatch(_))));
}

#[test]
fn test_unknown_column() {
    assert_eq!(eval_err("where bogus>1"), EvalError::UnknownColumn("bogus".to_string()));
    assert_eq!(eval_err("order -bogus"), EvalError::UnknownColumn("bogus".to_string()));
    assert_eq!(eval_err("select name,bogus"), EvalError::UnknownColumn("bogus".to_string()));
    assert_eq!(eval_err("name~h9"), EvalError::UnknownColumn("h9".to_string()));
}

// ============================================================================
// Sort and Limit
// ============================================================================

#[test]
fn test_sort_descending_nulls_last() {
    assert_eq!(
        names(&run("order -size")),
        vec!["b.rs", "e.log", "a.txt", "c.txt", "D.TXT"]
    );
}

#[test]
fn test_sort_ascending_nulls_last() {
    assert_eq!(
        names(&run("order size")),
        vec!["a.txt", "c.txt", "e.log", "b.rs", "D.TXT"]
    );
}

#[test]
fn test_multi_key_sort() {
    assert_eq!(
        names(&run("order size,-name")),
        vec!["c.txt", "a.txt", "e.log", "b.rs", "D.TXT"]
    );
}

#[test]
fn test_limit_after_sort() {
    let result = run("top 2 order -mtime");
    assert_eq!(names(&result), vec!["e.log", "b.rs"]);
    assert_eq!(result.total_matched, 5);
}

#[test]
fn test_top_zero() {
    let result = run("where size>1000 top 0");
    assert!(result.rows.is_empty());
    assert_eq!(result.total_matched, 2);
    assert_eq!(result.columns.len(), 7);
}
