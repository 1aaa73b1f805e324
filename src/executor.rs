//! The `Executor` storage seam.
//!
//! Everything that actually touches storage goes through this trait: the query
//! layer hands it a [`SelectQuery`] descriptor and gets rows back. Drivers that
//! speak SQL plug in through [`sql::SqlExecutor`]; [`crate::MemoryStore`] is an
//! in-process implementation used by tests and the demo app.

pub mod sql;

use crate::error::HatchError;
use crate::query::SelectQuery;
use crate::schema::EntitySchema;
use crate::value::{Value, ValueType};
use serde::Serialize;
use std::collections::BTreeMap;

/// A materialised row: column name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    values: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    ///
    /// ```rust
    /// use hatchling::Row;
    ///
    /// let row = Row::new().with("id", 1).with("name", "Post-1");
    /// assert_eq!(row.get::<i64>("id").unwrap(), 1);
    /// ```
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    /// Raw value of a column, `None` if the row has no such column
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Typed value of a column
    ///
    /// # Errors
    ///
    /// Returns `HatchError::ParseError` if the column is missing or holds a
    /// value of another type.
    pub fn get<T: ValueType>(&self, column: &str) -> Result<T, HatchError> {
        let value = self
            .values
            .get(column)
            .ok_or_else(|| HatchError::ParseError(format!("missing column '{column}'")))?;
        T::from_value(value).ok_or_else(|| {
            HatchError::ParseError(format!("column '{column}' holds unexpected value {value:?}"))
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Keep only the named columns; an empty list keeps everything
    pub fn project(&self, fields: &[String]) -> Row {
        if fields.is_empty() {
            return self.clone();
        }
        let values = self
            .values
            .iter()
            .filter(|(k, _)| fields.iter().any(|f| f == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Row { values }
    }
}

/// Conversion from a storage row into a model
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, HatchError>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> Result<Self, HatchError> {
        Ok(row.clone())
    }
}

/// Trait for executing queries against storage
///
/// Implementations own connections, drivers and their concurrency; the query
/// layer only calls these four methods and propagates their errors unchanged.
pub trait Executor {
    /// Run a SELECT and return the matching rows
    ///
    /// Filters, ordering, limit and offset of `query` must all be honoured.
    fn execute_select(&self, query: &SelectQuery) -> Result<Vec<Row>, HatchError>;

    /// Count the rows matching the filters of `query`
    ///
    /// Ordering, limit and offset do not affect the count.
    fn count(&self, query: &SelectQuery) -> Result<u64, HatchError>;

    /// Create the table described by `schema` if it does not exist
    fn create_table(&self, schema: &EntitySchema) -> Result<(), HatchError>;

    /// Drop the table described by `schema` if it exists
    fn drop_table(&self, schema: &EntitySchema) -> Result<(), HatchError>;
}
