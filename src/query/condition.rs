//! Filter conditions
//!
//! A [`Condition`] is a small tagged expression: one column, one comparison
//! operator, one value. Multiple conditions always combine as a conjunction
//! (`AND`). This is deliberately not a general expression tree; equality,
//! greater-or-equal, LIKE and IN cover the supported query surface.

use crate::query::value::Value;
use crate::schema::quote_column;

/// Supported comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `=`
    Eq,
    /// `>=`
    Gte,
    /// `LIKE`
    Like,
    /// `IN (…)`
    In,
}

/// One column comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    column: String,
    op: Op,
    value: Value,
}

impl Condition {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: Op::Eq,
            value: value.into(),
        }
    }

    /// `column >= value`
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: Op::Gte,
            value: value.into(),
        }
    }

    /// `column LIKE pattern`
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: Op::Like,
            value: Value::Str(pattern.into()),
        }
    }

    /// `column IN (values…)`
    pub fn is_in<V: Into<Value>>(column: impl Into<String>, values: Vec<V>) -> Self {
        Self {
            column: column.into(),
            op: Op::In,
            value: Value::List(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Column this condition applies to (may be table-qualified).
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Comparison operator.
    pub fn op(&self) -> Op {
        self.op
    }

    /// Render the predicate with `?` placeholders.
    ///
    /// `IN` renders one placeholder per list element; an empty list renders a
    /// never-matching predicate instead of invalid SQL.
    pub(crate) fn sql(&self) -> String {
        let column = quote_column(&self.column);
        match self.op {
            Op::Eq => format!("{} = ?", column),
            Op::Gte => format!("{} >= ?", column),
            Op::Like => format!("{} LIKE ?", column),
            Op::In => {
                let len = match &self.value {
                    Value::List(items) => items.len(),
                    _ => 1,
                };
                if len == 0 {
                    "1 = 0".to_string()
                } else {
                    let placeholders = vec!["?"; len].join(", ");
                    format!("{} IN ({})", column, placeholders)
                }
            }
        }
    }

    /// Parameters for this predicate, flattened in placeholder order.
    pub(crate) fn params(&self) -> Vec<Value> {
        match &self.value {
            Value::List(items) => items.clone(),
            other => vec![other.clone()],
        }
    }
}

/// Render a `WHERE` clause for a conjunction of conditions.
///
/// Returns the clause (empty string for zero conditions, so a filter with no
/// conditions degenerates to an unrestricted select) and the bound parameters
/// in placeholder order.
pub(crate) fn where_clause(conditions: &[Condition]) -> (String, Vec<Value>) {
    if conditions.is_empty() {
        return (String::new(), Vec::new());
    }

    let predicates: Vec<String> = conditions.iter().map(|c| c.sql()).collect();
    let params = conditions.iter().flat_map(|c| c.params()).collect();
    (format!(" WHERE {}", predicates.join(" AND ")), params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_and_gte_rendering() {
        assert_eq!(Condition::eq("name", "Alice").sql(), "`name` = ?");
        assert_eq!(Condition::gte("age", 18).sql(), "`age` >= ?");
    }

    #[test]
    fn test_like_rendering() {
        let cond = Condition::like("name", "%Filter%");
        assert_eq!(cond.sql(), "`name` LIKE ?");
        assert_eq!(cond.params(), vec![Value::Str("%Filter%".to_string())]);
    }

    #[test]
    fn test_in_pluralizes_placeholders() {
        let cond = Condition::is_in("id", vec![1i64, 2, 3]);
        assert_eq!(cond.sql(), "`id` IN (?, ?, ?)");
        assert_eq!(
            cond.params(),
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn test_empty_in_never_matches() {
        let cond = Condition::is_in("id", Vec::<i64>::new());
        assert_eq!(cond.sql(), "1 = 0");
        assert!(cond.params().is_empty());
    }

    #[test]
    fn test_qualified_column_quoting() {
        assert_eq!(Condition::eq("users.id", 1).sql(), "`users`.`id` = ?");
    }

    #[test]
    fn test_where_clause_conjunction() {
        let (sql, params) = where_clause(&[
            Condition::eq("name", "Alice"),
            Condition::gte("id", 10),
        ]);
        assert_eq!(sql, " WHERE `name` = ? AND `id` >= ?");
        assert_eq!(
            params,
            vec![Value::Str("Alice".to_string()), Value::Int(10)]
        );
    }

    #[test]
    fn test_empty_where_clause() {
        let (sql, params) = where_clause(&[]);
        assert!(sql.is_empty());
        assert!(params.is_empty());
    }
}
