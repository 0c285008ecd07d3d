//! Folding a parsed [`Query`] into one effective [`QueryPlan`].
//!
//! The grammar lets every clause kind repeat in any order. This module is
//! the only place where repetition gets a meaning:
//!
//! | Clause     | Repeated clauses                                  |
//! |------------|---------------------------------------------------|
//! | `top`      | last one wins                                     |
//! | flags      | union                                             |
//! | `x~p`      | all terms AND-ed, flattened in source order       |
//! | `where`    | all comparisons AND-ed, flattened in source order |
//! | `select`   | last one wins, earlier ones are discarded         |
//! | `order`    | last one wins, its keys form one multi-key sort   |

use std::fmt;

use crate::ast::{
    Clause, Comparison, FlagSet, Pattern, ProjectItem, Query, RegexTerm, RhsValue, SortKey,
};

/// The canonical, de-duplicated form of a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPlan {
    pub limit: Option<u64>,
    pub flags: FlagSet,
    pub regex_filters: Vec<RegexTerm>,
    pub where_filters: Vec<Comparison>,
    /// `None` selects every column
    pub projection: Option<Vec<ProjectItem>>,
    /// `None` keeps index order
    pub sort: Option<Vec<SortKey>>,
}

impl QueryPlan {
    /// Builds the plan. Never fails: column names are only checked when the
    /// plan meets an index.
    pub fn build(query: Query) -> Self {
        let mut plan = QueryPlan::default();

        for clause in query.clauses {
            match clause {
                Clause::Limit(n) => plan.limit = Some(n),
                Clause::FlagSet(flags) => plan.flags.union_with(&flags),
                Clause::RegexFilter(terms) => plan.regex_filters.extend(terms),
                Clause::Filter(comparisons) => plan.where_filters.extend(comparisons),
                Clause::Projection(items) => plan.projection = Some(items),
                Clause::Sort(keys) => plan.sort = Some(keys),
            }
        }

        plan
    }

    /// Every column the plan names, in evaluation order.
    pub fn field_refs(&self) -> Vec<&str> {
        let mut fields = Vec::new();

        for term in &self.regex_filters {
            fields.push(term.field.as_str());
            if let Pattern::Literal(other) = &term.pattern {
                fields.push(other.as_str());
            }
        }

        for comparison in &self.where_filters {
            fields.push(comparison.field.as_str());
            if let RhsValue::Field(other) = &comparison.rhs {
                fields.push(other.as_str());
            }
        }

        for key in self.sort.iter().flatten() {
            fields.push(key.field.as_str());
        }

        for item in self.projection.iter().flatten() {
            match item {
                ProjectItem::All => {}
                ProjectItem::Include(field) | ProjectItem::Exclude(field) => {
                    fields.push(field.as_str())
                }
            }
        }

        fields
    }
}

impl From<Query> for QueryPlan {
    fn from(query: Query) -> Self {
        QueryPlan::build(query)
    }
}

fn join<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Renders the plan as a single canonical query that parses back to it.
impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if !self.flags.is_empty() {
            parts.push(self.flags.to_string());
        }
        if !self.regex_filters.is_empty() {
            parts.push(join(&self.regex_filters, " and "));
        }
        if !self.where_filters.is_empty() {
            parts.push(format!("where {}", join(&self.where_filters, " and ")));
        }
        if let Some(keys) = &self.sort {
            parts.push(format!("order {}", join(keys, ",")));
        }
        if let Some(items) = &self.projection {
            parts.push(format!("select {}", join(items, ",")));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("top {}", limit));
        }

        f.write_str(&parts.join(" "))
    }
}
