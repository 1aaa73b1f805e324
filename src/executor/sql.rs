//! SQL-backed executor.
//!
//! `SqlExecutor` renders every request with sea-query in the configured
//! [`Dialect`] and hands the parameterised statement to a [`SqlClient`]. The
//! client is the only piece that talks to a database server; plug a driver in
//! by implementing that trait.

use crate::error::HatchError;
use crate::executor::{Executor, Row};
use crate::query::{Dialect, SelectQuery};
use crate::schema::EntitySchema;
use crate::value::Value;
use sea_query::Values;

/// Driver connection able to run parameterised SQL
pub trait SqlClient {
    /// Run a statement returning rows
    fn query(&self, sql: &str, params: &Values) -> Result<Vec<Row>, HatchError>;

    /// Run a statement for its side effect, returning the affected row count
    fn execute(&self, sql: &str, params: &Values) -> Result<u64, HatchError>;
}

/// [`Executor`] on top of a [`SqlClient`]
#[derive(Debug)]
pub struct SqlExecutor<C> {
    client: C,
    dialect: Dialect,
}

impl<C: SqlClient> SqlExecutor<C> {
    pub fn new(client: C, dialect: Dialect) -> Self {
        Self { client, dialect }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn run_ddl(&self, sql: String) -> Result<(), HatchError> {
        log::debug!("executing: {sql}");
        self.client.execute(&sql, &Values(Vec::new()))?;
        Ok(())
    }
}

impl<C: SqlClient> Executor for SqlExecutor<C> {
    fn execute_select(&self, query: &SelectQuery) -> Result<Vec<Row>, HatchError> {
        let (sql, params) = self.dialect.build(&query.to_statement());
        log::debug!("executing: {sql} ({} param(s))", params.0.len());
        self.client.query(&sql, &params)
    }

    fn count(&self, query: &SelectQuery) -> Result<u64, HatchError> {
        let (sql, params) = self.dialect.build(&query.to_count_statement());
        log::debug!("executing: {sql} ({} param(s))", params.0.len());
        let rows = self.client.query(&sql, &params)?;
        let row = rows
            .first()
            .ok_or_else(|| HatchError::QueryError("COUNT returned no rows".to_string()))?;
        let cell = row
            .columns()
            .next()
            .and_then(|column| row.value(column))
            .ok_or_else(|| HatchError::QueryError("COUNT returned no columns".to_string()))?;
        match cell {
            Value::Int(n) if *n >= 0 => Ok(*n as u64),
            other => Err(HatchError::ParseError(format!(
                "COUNT returned unexpected value {other:?}"
            ))),
        }
    }

    fn create_table(&self, schema: &EntitySchema) -> Result<(), HatchError> {
        self.run_ddl(schema.create_table_sql(self.dialect))
    }

    fn drop_table(&self, schema: &EntitySchema) -> Result<(), HatchError> {
        self.run_ddl(schema.drop_table_sql(self.dialect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Filter, Paginate, QuerySet};
    use crate::schema::Column;
    use std::sync::{Arc, Mutex};

    /// Records every statement and answers with canned rows
    #[derive(Default, Clone)]
    struct MockClient {
        captured_sql: Arc<Mutex<Vec<String>>>,
        captured_param_counts: Arc<Mutex<Vec<usize>>>,
        rows: Vec<Row>,
        total: i64,
    }

    impl MockClient {
        fn returning(rows: Vec<Row>, total: i64) -> Self {
            Self {
                rows,
                total,
                ..Self::default()
            }
        }

        fn get_captured_sql(&self) -> Vec<String> {
            self.captured_sql.lock().unwrap().clone()
        }

        fn get_captured_param_counts(&self) -> Vec<usize> {
            self.captured_param_counts.lock().unwrap().clone()
        }
    }

    impl SqlClient for MockClient {
        fn query(&self, sql: &str, params: &Values) -> Result<Vec<Row>, HatchError> {
            self.captured_sql.lock().unwrap().push(sql.to_string());
            self.captured_param_counts.lock().unwrap().push(params.0.len());
            if sql.starts_with("SELECT COUNT(*)") {
                return Ok(vec![Row::new().with("count", self.total)]);
            }
            Ok(self.rows.clone())
        }

        fn execute(&self, sql: &str, params: &Values) -> Result<u64, HatchError> {
            self.captured_sql.lock().unwrap().push(sql.to_string());
            self.captured_param_counts.lock().unwrap().push(params.0.len());
            Ok(0)
        }
    }

    #[test]
    fn test_select_is_parameterised() {
        let client = MockClient::default();
        let executor = SqlExecutor::new(client.clone(), Dialect::Postgres);
        QuerySet::<Row>::for_table("users")
            .filter(Filter::eq("name", "foo"))
            .filter(Filter::gt("age", 18))
            .all(&executor)
            .unwrap();

        let sql = client.get_captured_sql();
        assert_eq!(sql.len(), 1);
        assert!(sql[0].contains("WHERE \"name\" = $1 AND \"age\" > $2"), "{}", sql[0]);
        assert_eq!(client.get_captured_param_counts(), vec![2]);
    }

    #[test]
    fn test_get_or_404_probes_two_rows() {
        let client = MockClient::returning(vec![Row::new().with("id", 1)], 1);
        let executor = SqlExecutor::new(client.clone(), Dialect::Sqlite);
        let row = QuerySet::<Row>::for_table("users")
            .get_or_404([Filter::eq("id", 1)], None)
            .fetch(&executor)
            .unwrap();
        assert!(row.is_some());
        assert!(client.get_captured_sql()[0].ends_with("LIMIT ?"), "{:?}", client.get_captured_sql());
    }

    #[test]
    fn test_paginate_issues_page_and_count() {
        let rows = (0..10).map(|id| Row::new().with("id", id)).collect();
        let client = MockClient::returning(rows, 45);
        let executor = SqlExecutor::new(client.clone(), Dialect::Postgres);
        let page = QuerySet::<Row>::for_table("posts")
            .order_by("id")
            .paginate(&executor, None, Paginate::new().page(2).per_page(10))
            .unwrap();

        assert_eq!(page.total, Some(45));
        assert_eq!(page.pages(), 5);
        let sql = client.get_captured_sql();
        assert_eq!(sql.len(), 2);
        assert!(sql[0].contains("LIMIT $1 OFFSET $2"), "{}", sql[0]);
        assert!(sql[1].starts_with("SELECT COUNT(*) FROM \"posts\""), "{}", sql[1]);
        assert!(!sql[1].contains("ORDER BY"), "{}", sql[1]);
    }

    #[test]
    fn test_count_rejects_non_integer() {
        struct Broken;
        impl SqlClient for Broken {
            fn query(&self, _: &str, _: &Values) -> Result<Vec<Row>, HatchError> {
                Ok(vec![Row::new().with("count", "many")])
            }
            fn execute(&self, _: &str, _: &Values) -> Result<u64, HatchError> {
                Ok(0)
            }
        }
        let executor = SqlExecutor::new(Broken, Dialect::Postgres);
        let err = executor.count(&SelectQuery::new("posts")).unwrap_err();
        assert!(matches!(err, HatchError::ParseError(_)));
    }

    #[test]
    fn test_ddl_goes_through_execute() {
        let client = MockClient::default();
        let executor = SqlExecutor::new(client.clone(), Dialect::Postgres);
        let schema = EntitySchema::new("posts").column(Column::primary_key("id"));
        executor.create_table(&schema).unwrap();
        executor.drop_table(&schema).unwrap();
        let sql = client.get_captured_sql();
        assert!(sql[0].starts_with("CREATE TABLE IF NOT EXISTS \"posts\""));
        assert_eq!(sql[1], "DROP TABLE IF EXISTS \"posts\"");
    }
}
