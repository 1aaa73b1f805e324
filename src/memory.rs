//! In-process executor.
//!
//! `MemoryStore` keeps tables as vectors of [`Row`]s behind a coroutine-aware
//! `may::sync::RwLock`, so it can be shared between request coroutines of the
//! web app. It evaluates filters with [`Matcher`], so its results follow the
//! same semantics a SQL executor would give.

use crate::error::HatchError;
use crate::executor::{Executor, Row};
use crate::query::{Matcher, OrderBy, SelectQuery};
use crate::schema::EntitySchema;
use may::sync::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.tables.read().unwrap_or_else(|p| p.into_inner());
        let mut names: Vec<&String> = tables.keys().collect();
        names.sort();
        f.debug_struct("MemoryStore").field("tables", &names).finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Append a row, creating the table on first use
    pub fn insert(&self, table: &str, row: Row) {
        let mut tables = self.tables.write().unwrap_or_else(|p| p.into_inner());
        tables.entry(table.to_string()).or_default().push(row);
    }

    /// Make sure `table` exists, even without rows
    pub fn create_empty(&self, table: &str) {
        let mut tables = self.tables.write().unwrap_or_else(|p| p.into_inner());
        tables.entry(table.to_string()).or_default();
    }

    pub fn has_table(&self, table: &str) -> bool {
        let tables = self.tables.read().unwrap_or_else(|p| p.into_inner());
        tables.contains_key(table)
    }

    /// Number of rows in `table`, 0 if it does not exist
    pub fn len(&self, table: &str) -> usize {
        let tables = self.tables.read().unwrap_or_else(|p| p.into_inner());
        tables.get(table).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    fn matching(&self, query: &SelectQuery) -> Result<Vec<Row>, HatchError> {
        let matchers = query
            .filters()
            .iter()
            .map(|f| f.compile())
            .collect::<Result<Vec<Matcher>, _>>()?;

        let tables = self.tables.read().unwrap_or_else(|p| p.into_inner());
        let rows = tables
            .get(query.table())
            .ok_or_else(|| HatchError::QueryError(format!("no such table: {}", query.table())))?;

        Ok(rows
            .iter()
            .filter(|row| matchers.iter().all(|m| m.matches(row)))
            .cloned()
            .collect())
    }
}

fn compare_rows(a: &Row, b: &Row, orderings: &[OrderBy]) -> Ordering {
    for order in orderings {
        let left = a.value(&order.column);
        let right = b.value(&order.column);
        // NULLs sort first ascending
        let ord = match (left, right) {
            (Some(l), Some(r)) if !l.is_null() && !r.is_null() => {
                l.compare(r).unwrap_or(Ordering::Equal)
            }
            (l, r) => {
                let l_null = l.is_none_or(|v| v.is_null());
                let r_null = r.is_none_or(|v| v.is_null());
                r_null.cmp(&l_null)
            }
        };
        let ord = if order.descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

impl Executor for MemoryStore {
    fn execute_select(&self, query: &SelectQuery) -> Result<Vec<Row>, HatchError> {
        let mut rows = self.matching(query)?;
        if !query.orderings().is_empty() {
            rows.sort_by(|a, b| compare_rows(a, b, query.orderings()));
        }
        let offset = query
            .offset()
            .map_or(0, |o| usize::try_from(o).unwrap_or(usize::MAX));
        let limit = query
            .limit()
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| row.project(query.fields()))
            .collect())
    }

    fn count(&self, query: &SelectQuery) -> Result<u64, HatchError> {
        Ok(self.matching(query)?.len() as u64)
    }

    fn create_table(&self, schema: &EntitySchema) -> Result<(), HatchError> {
        self.create_empty(schema.table());
        Ok(())
    }

    fn drop_table(&self, schema: &EntitySchema) -> Result<(), HatchError> {
        let mut tables = self.tables.write().unwrap_or_else(|p| p.into_inner());
        tables.remove(schema.table());
        Ok(())
    }
}
