use crate::ast::Clause;

/// A parsed query.
///
/// Clauses are kept in source order, repeats included.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub clauses: Vec<Clause>,
}
