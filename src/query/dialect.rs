//! SQL dialect selection.

use crate::error::HatchError;
use sea_query::{
    MysqlQueryBuilder, PostgresQueryBuilder, SchemaStatementBuilder, SelectStatement,
    SqliteQueryBuilder, Values,
};

/// SQL flavour used when rendering statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Derive the dialect from a database URI scheme
    ///
    /// ```rust
    /// use hatchling::Dialect;
    ///
    /// assert_eq!(Dialect::from_uri("sqlite://:memory:").unwrap(), Dialect::Sqlite);
    /// assert_eq!(Dialect::from_uri("postgres://u:p@localhost/db").unwrap(), Dialect::Postgres);
    /// assert!(Dialect::from_uri("oracle://db").is_err());
    /// ```
    pub fn from_uri(uri: &str) -> Result<Self, HatchError> {
        let scheme = uri
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| HatchError::Config(format!("database uri '{uri}' has no scheme")))?;
        match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "asyncpg" | "psycopg" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(HatchError::Config(format!(
                "unsupported database scheme '{other}'"
            ))),
        }
    }

    /// Render with values inlined
    pub fn render(&self, stmt: &SelectStatement) -> String {
        match self {
            Dialect::Postgres => stmt.to_string(PostgresQueryBuilder),
            Dialect::MySql => stmt.to_string(MysqlQueryBuilder),
            Dialect::Sqlite => stmt.to_string(SqliteQueryBuilder),
        }
    }

    /// Render with placeholders plus the bound values
    pub fn build(&self, stmt: &SelectStatement) -> (String, Values) {
        match self {
            Dialect::Postgres => stmt.build(PostgresQueryBuilder),
            Dialect::MySql => stmt.build(MysqlQueryBuilder),
            Dialect::Sqlite => stmt.build(SqliteQueryBuilder),
        }
    }

    /// Render a DDL statement
    pub fn schema_sql<S: SchemaStatementBuilder>(&self, stmt: &S) -> String {
        match self {
            Dialect::Postgres => stmt.build(PostgresQueryBuilder),
            Dialect::MySql => stmt.build(MysqlQueryBuilder),
            Dialect::Sqlite => stmt.build(SqliteQueryBuilder),
        }
    }
}
