//! Select query descriptor and the `QuerySet` builder.
//!
//! `SelectQuery` is the plain description of a pending fetch that executors
//! receive. `QuerySet<M>` wraps it with a model type and the fluent refining
//! API. Refining never mutates: every method takes `&self` and returns a new
//! query, so several queries can be derived from one shared base.
//!
//! # Example
//!
//! ```rust
//! use hatchling::{Filter, QuerySet, Row};
//!
//! let base: QuerySet<Row> = QuerySet::for_table("posts");
//! let recent = base.filter(Filter::gt("id", 900)).order_by("-id").limit(10);
//!
//! assert!(base.query().filters().is_empty());
//! assert_eq!(recent.query().limit(), Some(10));
//! ```

use crate::model::Model;
use crate::query::filter::Filter;
use sea_query::{Asterisk, Expr, Iden, Order, Query, SelectStatement};
use std::fmt;
use std::marker::PhantomData;

/// Owned identifier for tables and columns
#[derive(Debug, Clone)]
pub(crate) struct Ident(String);

impl Ident {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Ident(name.into())
    }
}

impl Iden for Ident {
    fn unquoted(&self) -> &str {
        &self.0
    }
}

/// One ORDER BY term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

impl OrderBy {
    /// Parse `"col"` (ascending) or `"-col"` (descending)
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(column) => OrderBy {
                column: column.to_string(),
                descending: true,
            },
            None => OrderBy {
                column: raw.trim_start_matches('+').to_string(),
                descending: false,
            },
        }
    }
}

/// Description of a pending SELECT
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectQuery {
    table: String,
    filters: Vec<Filter>,
    orderings: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    fields: Vec<String>,
    related: Vec<String>,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Conjunctive filter list
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn orderings(&self) -> &[OrderBy] {
        &self.orderings
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Selected columns; empty means all
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Relations requested with `select_related`, passed through to executors
    pub fn related(&self) -> &[String] {
        &self.related
    }

    pub(crate) fn push_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub(crate) fn push_ordering(&mut self, order: OrderBy) {
        self.orderings.push(order);
    }

    pub(crate) fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    pub(crate) fn set_offset(&mut self, offset: u64) {
        self.offset = Some(offset);
    }

    /// Build the SELECT statement
    pub fn to_statement(&self) -> SelectStatement {
        let mut stmt = Query::select();
        if self.fields.is_empty() {
            stmt.column(Asterisk);
        } else {
            stmt.columns(self.fields.iter().map(Ident::new));
        }
        stmt.from(Ident::new(&self.table));
        for filter in &self.filters {
            stmt.cond_where(filter.to_condition());
        }
        for order in &self.orderings {
            let direction = if order.descending { Order::Desc } else { Order::Asc };
            stmt.order_by(Ident::new(&order.column), direction);
        }
        if let Some(limit) = self.limit {
            stmt.limit(limit);
        }
        if let Some(offset) = self.offset {
            stmt.offset(offset);
        }
        stmt
    }

    /// Build a `COUNT(*)` statement over the same filters.
    ///
    /// Ordering, limit and offset are left out: a LIMIT would otherwise cap the
    /// count at the page size.
    pub fn to_count_statement(&self) -> SelectStatement {
        let mut stmt = Query::select();
        stmt.expr(Expr::cust("COUNT(*)"))
            .from(Ident::new(&self.table));
        for filter in &self.filters {
            stmt.cond_where(filter.to_condition());
        }
        stmt
    }
}

/// Query builder for a model
///
/// Obtained from [`Model::find`]. Refining methods return a new `QuerySet`;
/// terminal methods (`all`, `execute`, `count`, `paginate`, ...) run it.
pub struct QuerySet<M> {
    pub(crate) query: SelectQuery,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for QuerySet<M> {
    fn clone(&self) -> Self {
        Self::from_query(self.query.clone())
    }
}

impl<M> fmt::Debug for QuerySet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet").field("query", &self.query).finish()
    }
}

impl<M: Model> QuerySet<M> {
    /// Unfiltered query over the model's table
    pub fn new() -> Self {
        Self::for_table(M::table_name())
    }
}

impl<M: Model> Default for QuerySet<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> QuerySet<M> {
    /// Unfiltered query over an arbitrary table
    pub fn for_table(table: impl Into<String>) -> Self {
        Self::from_query(SelectQuery::new(table))
    }

    pub fn from_query(query: SelectQuery) -> Self {
        Self {
            query,
            _model: PhantomData,
        }
    }

    pub fn query(&self) -> &SelectQuery {
        &self.query
    }

    fn refine(&self, apply: impl FnOnce(&mut SelectQuery)) -> Self {
        let mut query = self.query.clone();
        apply(&mut query);
        Self::from_query(query)
    }

    /// Add a filter; filters are AND-combined
    pub fn filter(&self, filter: Filter) -> Self {
        self.refine(|q| q.push_filter(filter))
    }

    /// Add several filters at once
    pub fn filter_all<I: IntoIterator<Item = Filter>>(&self, filters: I) -> Self {
        self.refine(|q| filters.into_iter().for_each(|f| q.push_filter(f)))
    }

    /// Add an ORDER BY term; prefix the column with `-` for descending
    pub fn order_by(&self, column: &str) -> Self {
        self.refine(|q| q.push_ordering(OrderBy::parse(column)))
    }

    /// Set (or override) the LIMIT
    pub fn limit(&self, limit: u64) -> Self {
        self.refine(|q| q.set_limit(limit))
    }

    /// Set (or override) the OFFSET
    pub fn offset(&self, offset: u64) -> Self {
        self.refine(|q| q.set_offset(offset))
    }

    /// Restrict the selected columns
    pub fn only<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.refine(|q| q.fields = fields.into_iter().map(Into::into).collect())
    }

    pub fn select_related(&self, relation: &str) -> Self {
        self.refine(|q| q.related.push(relation.to_string()))
    }

    /// Render the SELECT for inspection
    pub fn to_sql(&self, dialect: crate::query::Dialect) -> String {
        dialect.render(&self.query.to_statement())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Row;
    use crate::query::Dialect;

    fn posts() -> QuerySet<Row> {
        QuerySet::for_table("posts")
    }

    #[test]
    fn test_filter_returns_independent_copy() {
        let base = posts().filter(Filter::eq("published", true));
        let narrowed = base.filter(Filter::gt("id", 10));
        let other = base.filter(Filter::lt("id", 5));

        assert_eq!(base.query().filters().len(), 1);
        assert_eq!(narrowed.query().filters().len(), 2);
        assert_eq!(other.query().filters()[1], Filter::lt("id", 5));
        assert_eq!(narrowed.query().filters()[1], Filter::gt("id", 10));
    }

    #[test]
    fn test_limit_and_offset_override() {
        let q = posts().limit(5).offset(10).limit(2);
        assert_eq!(q.query().limit(), Some(2));
        assert_eq!(q.query().offset(), Some(10));
    }

    #[test]
    fn test_order_by_prefix() {
        let q = posts().order_by("-created_at").order_by("id");
        assert_eq!(
            q.query().orderings(),
            &[
                OrderBy { column: "created_at".into(), descending: true },
                OrderBy { column: "id".into(), descending: false },
            ]
        );
    }

    #[test]
    fn test_select_sql_contains_clauses() {
        let sql = posts()
            .filter(Filter::eq("name", "foo"))
            .order_by("-id")
            .limit(20)
            .offset(40)
            .to_sql(Dialect::Postgres);

        assert!(sql.starts_with("SELECT * FROM \"posts\""), "{sql}");
        assert!(sql.contains("WHERE \"name\" = 'foo'"), "{sql}");
        assert!(sql.contains("ORDER BY \"id\" DESC"), "{sql}");
        assert!(sql.contains("LIMIT 20"), "{sql}");
        assert!(sql.contains("OFFSET 40"), "{sql}");
    }

    #[test]
    fn test_only_selects_columns() {
        let sql = posts().only(["id", "name"]).to_sql(Dialect::Postgres);
        assert!(sql.starts_with("SELECT \"id\", \"name\" FROM \"posts\""), "{sql}");
    }

    #[test]
    fn test_count_statement_drops_paging() {
        let q = posts().filter(Filter::eq("id", 1)).order_by("id").limit(2).offset(4);
        let sql = Dialect::Postgres.render(&q.query().to_count_statement());
        assert!(sql.starts_with("SELECT COUNT(*) FROM \"posts\""), "{sql}");
        assert!(sql.contains("WHERE \"id\" = 1"), "{sql}");
        assert!(!sql.contains("LIMIT"), "{sql}");
        assert!(!sql.contains("ORDER BY"), "{sql}");
    }
}
