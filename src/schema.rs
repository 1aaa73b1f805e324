//! Explicit entity schemas.
//!
//! Each model describes its table with an [`EntitySchema`]. Schemas are
//! collected once at startup in a [`SchemaRegistry`] and used by
//! `Database::generate_schemas` and the `generate-schemas` CLI command.
//!
//! ```rust
//! use hatchling::{Column, ColumnKind, Dialect, EntitySchema};
//!
//! let schema = EntitySchema::new("posts")
//!     .column(Column::primary_key("id"))
//!     .column(Column::new("title", ColumnKind::String(255)))
//!     .column(Column::new("body", ColumnKind::Text).nullable());
//!
//! let sql = schema.create_table_sql(Dialect::Postgres);
//! assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"posts\""));
//! ```

use crate::model::Model;
use crate::query::select::Ident;
use crate::query::Dialect;
use sea_query::{ColumnDef, Table, TableCreateStatement, TableDropStatement};

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    BigInteger,
    Float,
    Boolean,
    /// Bounded string
    String(u32),
    Text,
    DateTime,
}

/// One column of an entity table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
}

impl Column {
    /// A NOT NULL column of the given kind
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            primary_key: false,
            auto_increment: false,
            unique: false,
        }
    }

    /// Auto-incrementing big integer primary key
    pub fn primary_key(name: impl Into<String>) -> Self {
        Self {
            primary_key: true,
            auto_increment: true,
            ..Self::new(name, ColumnKind::BigInteger)
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    fn to_column_def(&self) -> ColumnDef {
        let mut def = ColumnDef::new(Ident::new(&self.name));
        match self.kind {
            ColumnKind::Integer => def.integer(),
            ColumnKind::BigInteger => def.big_integer(),
            ColumnKind::Float => def.double(),
            ColumnKind::Boolean => def.boolean(),
            ColumnKind::String(len) => def.string_len(len),
            ColumnKind::Text => def.text(),
            ColumnKind::DateTime => def.timestamp(),
        };
        if self.nullable {
            def.null();
        } else {
            def.not_null();
        }
        if self.primary_key {
            def.primary_key();
        }
        if self.auto_increment {
            def.auto_increment();
        }
        if self.unique {
            def.unique_key();
        }
        def
    }
}

/// Table description of one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    table: String,
    columns: Vec<Column>,
}

impl EntitySchema {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key)
    }

    pub fn create_table_statement(&self) -> TableCreateStatement {
        let mut stmt = Table::create();
        stmt.table(Ident::new(&self.table)).if_not_exists();
        for column in &self.columns {
            let mut def = column.to_column_def();
            stmt.col(&mut def);
        }
        stmt
    }

    pub fn drop_table_statement(&self) -> TableDropStatement {
        let mut stmt = Table::drop();
        stmt.table(Ident::new(&self.table)).if_exists();
        stmt
    }

    pub fn create_table_sql(&self, dialect: Dialect) -> String {
        dialect.schema_sql(&self.create_table_statement())
    }

    pub fn drop_table_sql(&self, dialect: Dialect) -> String {
        dialect.schema_sql(&self.drop_table_statement())
    }
}

/// Schemas of all models known to the application
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<EntitySchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model; registering the same table twice keeps the first
    pub fn register<M: Model>(mut self) -> Self {
        self.add(M::schema());
        self
    }

    pub fn add(&mut self, schema: EntitySchema) {
        if self.get(schema.table()).is_some() {
            log::warn!("schema for table {} already registered", schema.table());
            return;
        }
        self.schemas.push(schema);
    }

    pub fn get(&self, table: &str) -> Option<&EntitySchema> {
        self.schemas.iter().find(|s| s.table() == table)
    }

    pub fn schemas(&self) -> &[EntitySchema] {
        &self.schemas
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// All CREATE TABLE statements, in registration order
    pub fn create_sql(&self, dialect: Dialect) -> Vec<String> {
        self.schemas
            .iter()
            .map(|s| s.create_table_sql(dialect))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posts() -> EntitySchema {
        EntitySchema::new("posts")
            .column(Column::primary_key("id"))
            .column(Column::new("title", ColumnKind::String(120)).unique())
            .column(Column::new("published_at", ColumnKind::DateTime).nullable())
    }

    #[test]
    fn test_create_table_sql_postgres() {
        let sql = posts().create_table_sql(Dialect::Postgres);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"posts\""), "{sql}");
        assert!(sql.contains("\"id\""), "{sql}");
        assert!(sql.contains("PRIMARY KEY"), "{sql}");
        assert!(sql.contains("\"title\" varchar(120)"), "{sql}");
        assert!(sql.contains("UNIQUE"), "{sql}");
    }

    #[test]
    fn test_drop_table_sql() {
        assert_eq!(
            posts().drop_table_sql(Dialect::Postgres),
            "DROP TABLE IF EXISTS \"posts\""
        );
        assert_eq!(posts().drop_table_sql(Dialect::MySql), "DROP TABLE IF EXISTS `posts`");
    }

    #[test]
    fn test_primary_key_lookup() {
        assert_eq!(posts().primary_key().map(|c| c.name.as_str()), Some("id"));
        assert!(EntitySchema::new("t").primary_key().is_none());
    }

    #[test]
    fn test_registry_ignores_duplicates() {
        let mut registry = SchemaRegistry::new();
        registry.add(posts());
        registry.add(EntitySchema::new("posts"));
        assert_eq!(registry.schemas().len(), 1);
        assert_eq!(registry.get("posts").unwrap().columns().len(), 3);
        assert_eq!(registry.create_sql(Dialect::Sqlite).len(), 1);
    }
}
