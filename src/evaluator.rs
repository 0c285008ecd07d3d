use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
};

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use regex::{Regex, RegexBuilder};
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    ast::{
        Comparison, DatetimeLiteral, EqTest, Flag, FlagSet, NumberLiteral, NumberUnit, Pattern,
        ProjectItem, RegexTerm, RhsValue, SortKey, literals::parse_size,
    },
    index::{ColumnType, FileIndex},
    plan::QueryPlan,
    value::Value,
};

/// Columns the filtering flags read.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagColumns {
    /// Modification time, for `recent`
    pub recent: String,
    /// Duplicate group id (rows sharing a value are duplicates), for `duplicates`
    pub duplicates: String,
    /// Hardlink count, for `hardlinks`
    pub hardlinks: String,
}

impl Default for FlagColumns {
    fn default() -> Self {
        FlagColumns {
            recent: "mtime".to_string(),
            duplicates: "hash".to_string(),
            hardlinks: "links".to_string(),
        }
    }
}

/// Everything an evaluation depends on besides the plan and the index.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// How far back `recent` reaches
    pub recent_window: Duration,
    /// Reference instant for `recent`; the wall clock when unset
    pub now: Option<DateTime<Utc>>,
    /// Zone for date/time literals written without an offset
    pub timezone: FixedOffset,
    pub flag_columns: FlagColumns,
    /// Per-column `%` baselines, taking precedence over the index's own
    pub baselines: HashMap<String, f64>,
    pub case_insensitive: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            recent_window: Duration::days(7),
            now: None,
            timezone: Utc.fix(),
            flag_columns: FlagColumns::default(),
            baselines: HashMap::new(),
            case_insensitive: false,
        }
    }
}

/// Errors that can occur during query evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A referenced column is not in the index schema
    UnknownColumn(String),

    /// Comparison operands that cannot be compared
    TypeMismatch(String),

    /// `select` mixes included and excluded columns
    MixedProjection,

    /// A pattern is not a valid regular expression
    BadPattern { pattern: String, message: String },

    /// A `%` number against a column with no baseline
    MissingBaseline(String),
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::UnknownColumn(name) => write!(f, "Unknown column: {}", name),
            EvalError::TypeMismatch(msg) => write!(f, "Type mismatch: {}", msg),
            EvalError::MixedProjection => {
                write!(f, "Cannot mix included and excluded columns in select")
            }
            EvalError::BadPattern { pattern, message } => {
                write!(f, "Invalid pattern /{}/: {}", pattern, message)
            }
            EvalError::MissingBaseline(column) => {
                write!(f, "No baseline for percentage comparison on column '{}'", column)
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// Rows produced by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Matching rows before `top` was applied
    pub total_matched: usize,
    /// Rows in the index
    pub scanned: usize,
    pub flags: FlagSet,
}

/// A comparison with its right-hand side resolved against the schema.
struct CompiledComparison<'p> {
    field: &'p str,
    op: EqTest,
    rhs: Operand<'p>,
}

enum Operand<'p> {
    Constant(Value),
    /// Another column, coerced per row to the left column's type
    Column(&'p str, ColumnType),
}

/// Runs query plans against a [`FileIndex`].
pub struct Evaluator<'c> {
    config: &'c EvalConfig,
}

impl<'c> Evaluator<'c> {
    pub fn new(config: &'c EvalConfig) -> Self {
        Evaluator { config }
    }

    /// Evaluates `plan`: flags, pattern matches and comparisons filter the
    /// rows, which are then sorted, projected and cut to the limit.
    pub fn evaluate(
        &self,
        plan: &QueryPlan,
        index: &dyn FileIndex,
    ) -> Result<QueryResult, EvalError> {
        self.check_schema(plan, index)?;
        let mut patterns = PatternCache::new(self.config.case_insensitive);
        for term in &plan.regex_filters {
            if let Pattern::Unquoted(text) | Pattern::Slashed(text) = &term.pattern {
                patterns.get(text)?;
            }
        }
        let comparisons = self.compile_comparisons(&plan.where_filters, index)?;

        let mut matched = self.flag_pass(&plan.flags, index);

        if !plan.regex_filters.is_empty() {
            let mut kept = Vec::with_capacity(matched.len());
            for row in matched {
                if self.regex_pass(&plan.regex_filters, index, row, &mut patterns)? {
                    kept.push(row);
                }
            }
            matched = kept;
        }

        if !comparisons.is_empty() {
            let mut kept = Vec::with_capacity(matched.len());
            'rows: for row in matched {
                for comparison in &comparisons {
                    if !self.test_comparison(comparison, index, row)? {
                        continue 'rows;
                    }
                }
                kept.push(row);
            }
            matched = kept;
        }

        if let Some(keys) = &plan.sort {
            matched = sort_rows(matched, keys, index);
        }

        let columns = project(plan.projection.as_deref(), index)?;

        let total_matched = matched.len();
        if let Some(limit) = plan.limit {
            matched.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        let rows = matched
            .into_iter()
            .map(|row| columns.iter().map(|column| index.get(row, column)).collect())
            .collect();

        Ok(QueryResult {
            columns,
            rows,
            total_matched,
            scanned: index.row_count(),
            flags: plan.flags.clone(),
        })
    }

    // ========================================
    // Schema
    // ========================================

    fn check_schema(&self, plan: &QueryPlan, index: &dyn FileIndex) -> Result<(), EvalError> {
        for field in plan.field_refs() {
            if !index.has_column(field) {
                return Err(EvalError::UnknownColumn(field.to_string()));
            }
        }

        let columns = &self.config.flag_columns;
        for flag in plan.flags.iter() {
            let (column, expected) = match flag {
                Flag::Recent => (&columns.recent, Some(ColumnType::Datetime)),
                Flag::Duplicates => (&columns.duplicates, None),
                Flag::Hardlinks => (&columns.hardlinks, Some(ColumnType::Number)),
                Flag::Verbose => continue,
            };
            let found = index
                .column_type(column)
                .ok_or_else(|| EvalError::UnknownColumn(column.clone()))?;
            if let Some(expected) = expected
                && found != expected
            {
                return Err(EvalError::TypeMismatch(format!(
                    "'{}' needs {} column '{}', found {}",
                    flag, expected, column, found
                )));
            }
        }

        Ok(())
    }

    // ========================================
    // Flags
    // ========================================

    fn flag_pass(&self, flags: &FlagSet, index: &dyn FileIndex) -> Vec<usize> {
        let mut rows: Vec<usize> = index.rows().collect();
        let columns = &self.config.flag_columns;

        if flags.contains(Flag::Duplicates) {
            let mut counts: HashMap<String, usize> = HashMap::new();
            for row in index.rows() {
                let group = index.get(row, &columns.duplicates);
                if !group.is_null() {
                    *counts.entry(group.as_string()).or_default() += 1;
                }
            }
            rows.retain(|&row| {
                let group = index.get(row, &columns.duplicates);
                !group.is_null() && counts.get(&group.as_string()).is_some_and(|&n| n >= 2)
            });
        }

        if flags.contains(Flag::Hardlinks) {
            rows.retain(|&row| {
                index
                    .get(row, &columns.hardlinks)
                    .as_float()
                    .is_some_and(|links| links >= 2.0)
            });
        }

        if flags.contains(Flag::Recent) {
            let now = self.config.now.unwrap_or_else(Utc::now);
            let cutoff = now
                .checked_sub_signed(self.config.recent_window)
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            rows.retain(|&row| {
                index
                    .get(row, &columns.recent)
                    .as_datetime()
                    .is_some_and(|mtime| mtime >= cutoff)
            });
        }

        rows
    }

    // ========================================
    // Pattern matches
    // ========================================

    fn regex_pass(
        &self,
        terms: &[RegexTerm],
        index: &dyn FileIndex,
        row: usize,
        patterns: &mut PatternCache,
    ) -> Result<bool, EvalError> {
        for term in terms {
            let cell = index.get(row, &term.field);
            let matched = if cell.is_null() {
                false
            } else {
                let text = match &term.pattern {
                    Pattern::Unquoted(text) | Pattern::Slashed(text) => Some(text.clone()),
                    Pattern::Literal(other) => match index.get(row, other) {
                        Value::Null => None,
                        value => Some(value.as_string()),
                    },
                };
                match text {
                    Some(text) => patterns.get(&text)?.is_match(&cell.as_string()),
                    None => false,
                }
            };

            if matched == term.negate {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // ========================================
    // Comparisons
    // ========================================

    fn compile_comparisons<'p>(
        &self,
        comparisons: &'p [Comparison],
        index: &dyn FileIndex,
    ) -> Result<Vec<CompiledComparison<'p>>, EvalError> {
        comparisons
            .iter()
            .map(|comparison| {
                let column_type = index
                    .column_type(&comparison.field)
                    .ok_or_else(|| EvalError::UnknownColumn(comparison.field.clone()))?;
                let rhs = self.compile_rhs(comparison, column_type, index)?;
                Ok(CompiledComparison {
                    field: &comparison.field,
                    op: comparison.op,
                    rhs,
                })
            })
            .collect()
    }

    fn compile_rhs<'p>(
        &self,
        comparison: &'p Comparison,
        column_type: ColumnType,
        index: &dyn FileIndex,
    ) -> Result<Operand<'p>, EvalError> {
        let field = &comparison.field;
        let mismatch = |what: &str| {
            EvalError::TypeMismatch(format!(
                "cannot compare {} column '{}' with {}",
                column_type, field, what
            ))
        };

        match (&comparison.rhs, column_type) {
            (RhsValue::Number(number), ColumnType::Number) => {
                let value = self.resolve_number(field, number, index)?;
                Ok(Operand::Constant(Value::Float(value)))
            }
            (RhsValue::Number(number), _) => Err(mismatch(&format!("number {}", number))),

            (RhsValue::Datetime(literal), ColumnType::Datetime) => literal
                .resolve(self.config.timezone)
                .map(|dt| Operand::Constant(Value::Datetime(dt)))
                .ok_or_else(|| mismatch(&format!("out-of-range date {}", literal))),
            (RhsValue::Datetime(literal), _) => Err(mismatch(&format!("date {}", literal))),

            (RhsValue::Str(text), ColumnType::String) => {
                Ok(Operand::Constant(Value::String(text.clone())))
            }
            (RhsValue::Str(text), ColumnType::Number) => parse_size(text)
                .map(|size| Operand::Constant(Value::Float(size)))
                .ok_or_else(|| mismatch(&format!("non-numeric string {:?}", text))),
            (RhsValue::Str(text), ColumnType::Datetime) => DatetimeLiteral::parse(text)
                .and_then(|literal| literal.resolve(self.config.timezone))
                .map(|dt| Operand::Constant(Value::Datetime(dt)))
                .ok_or_else(|| mismatch(&format!("non-date string {:?}", text))),

            (RhsValue::Field(other), _) => {
                let other_type = index
                    .column_type(other)
                    .ok_or_else(|| EvalError::UnknownColumn(other.clone()))?;
                match (column_type, other_type) {
                    (ColumnType::Number, ColumnType::Datetime)
                    | (ColumnType::Datetime, ColumnType::Number) => {
                        Err(mismatch(&format!("{} column '{}'", other_type, other)))
                    }
                    _ => Ok(Operand::Column(other, column_type)),
                }
            }
        }
    }

    /// Applies a `%` unit against the column's baseline.
    fn resolve_number(
        &self,
        field: &str,
        number: &NumberLiteral,
        index: &dyn FileIndex,
    ) -> Result<f64, EvalError> {
        if number.unit != NumberUnit::Percent {
            return Ok(number.value);
        }

        let baseline = self
            .config
            .baselines
            .get(field)
            .copied()
            .or_else(|| index.baseline(field))
            .ok_or_else(|| EvalError::MissingBaseline(field.to_string()))?;
        Ok(scale_percent(baseline, number.value))
    }

    /// A null on either side is false. A right-hand cell that cannot be
    /// read as the left column's type fails the whole query.
    fn test_comparison(
        &self,
        comparison: &CompiledComparison,
        index: &dyn FileIndex,
        row: usize,
    ) -> Result<bool, EvalError> {
        let left = index.get(row, comparison.field);
        if left.is_null() {
            return Ok(false);
        }

        let right = match &comparison.rhs {
            Operand::Constant(value) => value.clone(),
            Operand::Column(other, target) => {
                let cell = index.get(row, other);
                if cell.is_null() {
                    return Ok(false);
                }
                coerce(&cell, *target, self.config.timezone).ok_or_else(|| {
                    EvalError::TypeMismatch(format!(
                        "cannot compare {} column '{}' with {:?} from '{}' (row {})",
                        target,
                        comparison.field,
                        cell.as_string(),
                        other,
                        row
                    ))
                })?
            }
        };

        Ok(left
            .compare(&right)
            .is_some_and(|ordering| comparison.op.holds(ordering)))
    }
}

/// `baseline * percent / 100`, exact in decimal where both fit.
fn scale_percent(baseline: f64, percent: f64) -> f64 {
    if let Some(base) = Decimal::from_f64(baseline)
        && let Some(pct) = Decimal::from_f64(percent)
        && let Some(product) = base.checked_mul(pct)
        && let Some(scaled) = product.checked_div(Decimal::ONE_HUNDRED)
        && let Some(result) = scaled.to_f64()
    {
        return result;
    }
    baseline * percent / 100.0
}

/// Converts a cell of another column to `target` for comparison.
fn coerce(value: &Value, target: ColumnType, zone: FixedOffset) -> Option<Value> {
    match (target, value) {
        (ColumnType::String, value) => Some(Value::String(value.as_string())),
        (ColumnType::Number, Value::String(text)) => parse_size(text).map(Value::Float),
        (ColumnType::Datetime, Value::String(text)) => DatetimeLiteral::parse(text)
            .and_then(|literal| literal.resolve(zone))
            .map(Value::Datetime),
        (_, value) => Some(value.clone()),
    }
}

/// Compiled patterns of one evaluation, keyed by pattern text.
struct PatternCache {
    case_insensitive: bool,
    compiled: HashMap<String, Regex>,
}

impl PatternCache {
    fn new(case_insensitive: bool) -> Self {
        PatternCache {
            case_insensitive,
            compiled: HashMap::new(),
        }
    }

    fn get(&mut self, text: &str) -> Result<&Regex, EvalError> {
        if !self.compiled.contains_key(text) {
            let regex = RegexBuilder::new(text)
                .case_insensitive(self.case_insensitive)
                .build()
                .map_err(|e| EvalError::BadPattern {
                    pattern: text.to_string(),
                    message: e.to_string(),
                })?;
            self.compiled.insert(text.to_string(), regex);
        }
        self.compiled
            .get(text)
            .ok_or_else(|| EvalError::BadPattern {
                pattern: text.to_string(),
                message: "pattern cache miss".to_string(),
            })
    }
}

// ========================================
// Sort and projection
// ========================================

/// Stable multi-key sort. Nulls go last whichever the direction.
fn sort_rows(rows: Vec<usize>, keys: &[SortKey], index: &dyn FileIndex) -> Vec<usize> {
    let mut keyed: Vec<(usize, Vec<Value>)> = rows
        .into_iter()
        .map(|row| {
            let values = keys.iter().map(|key| index.get(row, &key.field)).collect();
            (row, values)
        })
        .collect();

    keyed.sort_by(|(_, a), (_, b)| {
        for (key, (x, y)) in keys.iter().zip(a.iter().zip(b)) {
            let ordering = match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let ordering = x.sort_order(y).unwrap_or(Ordering::Equal);
                    if key.descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    keyed.into_iter().map(|(row, _)| row).collect()
}

fn project(
    items: Option<&[ProjectItem]>,
    index: &dyn FileIndex,
) -> Result<Vec<String>, EvalError> {
    let all = move || index.columns().iter().map(|c| c.name.clone());
    let Some(items) = items else {
        return Ok(all().collect());
    };

    let includes = items.iter().any(|item| matches!(item, ProjectItem::Include(_)));
    let excludes = items.iter().any(|item| matches!(item, ProjectItem::Exclude(_)));

    if !includes {
        let excluded: HashSet<&str> = items
            .iter()
            .filter_map(|item| match item {
                ProjectItem::Exclude(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        return Ok(all().filter(|name| !excluded.contains(name.as_str())).collect());
    }

    if excludes {
        return Err(EvalError::MixedProjection);
    }

    let mut columns: Vec<String> = Vec::new();
    let mut push = |name: String| {
        if !columns.contains(&name) {
            columns.push(name);
        }
    };
    for item in items {
        match item {
            ProjectItem::All => all().for_each(&mut push),
            ProjectItem::Include(name) => push(name.clone()),
            ProjectItem::Exclude(_) => {}
        }
    }
    Ok(columns)
}

#[test]
fn test_scale_percent_is_exact() {
    assert_eq!(scale_percent(1000.0, 10.0), 100.0);
    assert_eq!(scale_percent(300.0, 33.0), 99.0);
}
