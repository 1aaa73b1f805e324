//! Filter predicates.
//!
//! A `QuerySet` accumulates filters as a conjunctive list. Each filter can be
//! evaluated directly against a [`Row`] (used by the in-memory store) or
//! rendered into a `sea_query::Condition` for SQL executors. `Filter::any`
//! groups alternatives with OR.

use crate::error::HatchError;
use crate::executor::Row;
use crate::query::select::Ident;
use crate::value::Value;
use regex::Regex;
use sea_query::{Condition, Expr, ExprTrait};
use std::cmp::Ordering;

/// Comparison operator of a [`Filter::Compare`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
        }
    }
}

/// A single predicate over one row
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    /// SQL `LIKE` with `%` and `_` wildcards, case-sensitive
    Like { column: String, pattern: String },
    Null { column: String, negated: bool },
    In { column: String, values: Vec<Value> },
    /// OR group; an empty group matches nothing
    Any(Vec<Filter>),
}

impl Filter {
    fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Filter::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ne, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gte, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lte, value)
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Filter::Null {
            column: column.into(),
            negated: false,
        }
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Filter::Null {
            column: column.into(),
            negated: true,
        }
    }

    pub fn is_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn any<I: IntoIterator<Item = Filter>>(filters: I) -> Self {
        Filter::Any(filters.into_iter().collect())
    }

    /// Compile into a matcher that can be applied to many rows.
    ///
    /// # Errors
    ///
    /// Returns `HatchError::QueryError` if a LIKE pattern cannot be compiled.
    pub fn compile(&self) -> Result<Matcher, HatchError> {
        Ok(match self {
            Filter::Compare { column, op, value } => Matcher::Compare {
                column: column.clone(),
                op: *op,
                value: value.clone(),
            },
            Filter::Like { column, pattern } => Matcher::Like {
                column: column.clone(),
                regex: like_regex(pattern)?,
            },
            Filter::Null { column, negated } => Matcher::Null {
                column: column.clone(),
                negated: *negated,
            },
            Filter::In { column, values } => Matcher::In {
                column: column.clone(),
                values: values.clone(),
            },
            Filter::Any(filters) => Matcher::Any(
                filters
                    .iter()
                    .map(Filter::compile)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        })
    }

    /// Render as a SQL condition
    pub fn to_condition(&self) -> Condition {
        match self {
            Filter::Compare { column, op, value } => {
                let col = Expr::col(Ident::new(column));
                let value = value.to_sea_value();
                let expr = match op {
                    CompareOp::Eq => col.eq(value),
                    CompareOp::Ne => col.ne(value),
                    CompareOp::Gt => col.gt(value),
                    CompareOp::Gte => col.gte(value),
                    CompareOp::Lt => col.lt(value),
                    CompareOp::Lte => col.lte(value),
                };
                Condition::all().add(expr)
            }
            Filter::Like { column, pattern } => {
                Condition::all().add(Expr::col(Ident::new(column)).like(pattern.as_str()))
            }
            Filter::Null { column, negated: false } => {
                Condition::all().add(Expr::col(Ident::new(column)).is_null())
            }
            Filter::Null { column, negated: true } => {
                Condition::all().add(Expr::col(Ident::new(column)).is_not_null())
            }
            Filter::In { column, values } => Condition::all().add(
                Expr::col(Ident::new(column)).is_in(values.iter().map(Value::to_sea_value)),
            ),
            Filter::Any(filters) if filters.is_empty() => {
                Condition::all().add(Expr::cust("1 = 0"))
            }
            Filter::Any(filters) => filters
                .iter()
                .fold(Condition::any(), |cond, f| cond.add(f.to_condition())),
        }
    }
}

static NULL: Value = Value::Null;

/// A compiled [`Filter`], ready to be evaluated against rows
#[derive(Debug, Clone)]
pub enum Matcher {
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    Like { column: String, regex: Regex },
    Null { column: String, negated: bool },
    In { column: String, values: Vec<Value> },
    Any(Vec<Matcher>),
}

impl Matcher {
    /// Evaluate with SQL semantics: comparisons involving NULL are false
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Matcher::Compare { column, op, value } => cell_of(row, column)
                .compare(value)
                .map(|ordering| op.accepts(ordering))
                .unwrap_or(false),
            Matcher::Like { column, regex } => match cell_of(row, column) {
                Value::Text(s) => regex.is_match(s),
                _ => false,
            },
            Matcher::Null { column, negated } => cell_of(row, column).is_null() != *negated,
            Matcher::In { column, values } => {
                let current = cell_of(row, column);
                values
                    .iter()
                    .any(|v| current.compare(v) == Some(Ordering::Equal))
            }
            Matcher::Any(matchers) => matchers.iter().any(|m| m.matches(row)),
        }
    }
}

fn cell_of<'r>(row: &'r Row, column: &str) -> &'r Value {
    row.value(column).unwrap_or(&NULL)
}

/// Translate a LIKE pattern into an anchored regex
fn like_regex(pattern: &str) -> Result<Regex, HatchError> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push_str("(?s)^");
    for ch in pattern.chars() {
        match ch {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr)
        .map_err(|e| HatchError::QueryError(format!("invalid LIKE pattern '{pattern}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Row {
        Row::new()
            .with("id", 7)
            .with("name", "Post-7")
            .with("body", Value::Null)
    }

    fn matches(filter: Filter, row: &Row) -> bool {
        filter.compile().unwrap().matches(row)
    }

    #[test]
    fn test_compare_operators() {
        let row = post();
        assert!(matches(Filter::eq("id", 7), &row));
        assert!(matches(Filter::ne("id", 8), &row));
        assert!(matches(Filter::gt("id", 6), &row));
        assert!(matches(Filter::gte("id", 7), &row));
        assert!(matches(Filter::lt("id", 8), &row));
        assert!(matches(Filter::lte("id", 7), &row));
        assert!(!matches(Filter::gt("id", 7), &row));
    }

    #[test]
    fn test_null_never_compares() {
        let row = post();
        assert!(!matches(Filter::eq("body", Value::Null), &row));
        assert!(!matches(Filter::ne("body", "x"), &row));
        assert!(matches(Filter::is_null("body"), &row));
        assert!(matches(Filter::is_not_null("name"), &row));
        // Missing columns behave like NULL
        assert!(matches(Filter::is_null("missing"), &row));
    }

    #[test]
    fn test_like_wildcards() {
        let row = post();
        assert!(matches(Filter::like("name", "Post-%"), &row));
        assert!(matches(Filter::like("name", "Post-_"), &row));
        assert!(!matches(Filter::like("name", "post-%"), &row));
        assert!(!matches(Filter::like("name", "Post-__"), &row));
        // Regex metacharacters in the pattern are literal
        assert!(!matches(Filter::like("name", "Post.7"), &row));
    }

    #[test]
    fn test_in_and_any() {
        let row = post();
        assert!(matches(Filter::is_in("id", [1, 7, 9]), &row));
        assert!(!matches(Filter::is_in("id", Vec::<i64>::new()), &row));
        assert!(matches(
            Filter::any([Filter::eq("id", 1), Filter::like("name", "%7")]),
            &row
        ));
        assert!(!matches(Filter::any([]), &row));
    }
}
