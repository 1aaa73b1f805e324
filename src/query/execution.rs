//! Terminal operations for `QuerySet`.
//!
//! Nothing touches storage until one of these runs. Each call goes through
//! `run_select`/`run_count`, which time the executor round-trip, log it and
//! feed the metrics; executor errors are returned untouched.

use crate::error::HatchError;
use crate::executor::{Executor, FromRow, Row};
use crate::metrics;
use crate::query::select::{QuerySet, SelectQuery};
use std::marker::PhantomData;
use std::time::Instant;

/// Lazily converts fetched rows into models
///
/// Finite and single-pass: once drained it cannot be restarted; run the query
/// again for a fresh iterator.
pub struct ModelIter<M> {
    rows: std::vec::IntoIter<Row>,
    _model: PhantomData<fn() -> M>,
}

impl<M> ModelIter<M> {
    pub(crate) fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter(),
            _model: PhantomData,
        }
    }
}

impl<M: FromRow> Iterator for ModelIter<M> {
    type Item = Result<M, HatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|row| M::from_row(&row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<M: FromRow> ExactSizeIterator for ModelIter<M> {}

impl<M: FromRow> QuerySet<M> {
    /// Execute the query and iterate over the results
    ///
    /// # Example
    ///
    /// ```rust
    /// use hatchling::{Filter, MemoryStore, QuerySet, Row};
    ///
    /// let store = MemoryStore::new();
    /// store.insert("posts", Row::new().with("id", 1).with("name", "a"));
    /// store.insert("posts", Row::new().with("id", 2).with("name", "b"));
    ///
    /// let names: Vec<String> = QuerySet::<Row>::for_table("posts")
    ///     .filter(Filter::gt("id", 1))
    ///     .execute(&store)?
    ///     .map(|row| row?.get::<String>("name"))
    ///     .collect::<Result<_, _>>()?;
    /// assert_eq!(names, vec!["b".to_string()]);
    /// # Ok::<(), hatchling::HatchError>(())
    /// ```
    pub fn execute<Ex: Executor + ?Sized>(&self, executor: &Ex) -> Result<ModelIter<M>, HatchError> {
        let rows = run_select(executor, &self.query)?;
        Ok(ModelIter::new(rows))
    }

    /// Execute the query and collect all results
    pub fn all<Ex: Executor + ?Sized>(&self, executor: &Ex) -> Result<Vec<M>, HatchError> {
        self.execute(executor)?.collect()
    }

    /// Count matching rows, ignoring ordering, limit and offset
    pub fn count<Ex: Executor + ?Sized>(&self, executor: &Ex) -> Result<u64, HatchError> {
        run_count(executor, &self.query)
    }

    /// `true` if at least one row matches
    pub fn exists<Ex: Executor + ?Sized>(&self, executor: &Ex) -> Result<bool, HatchError> {
        let probe = self.limit(1);
        Ok(!run_select(executor, &probe.query)?.is_empty())
    }
}

pub(crate) fn run_select<Ex: Executor + ?Sized>(
    executor: &Ex,
    query: &SelectQuery,
) -> Result<Vec<Row>, HatchError> {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("hatchling.select", table = %query.table()).entered();

    let start = Instant::now();
    let rows = executor.execute_select(query)?;
    let elapsed = start.elapsed();
    metrics::record_query("select", elapsed);
    log::debug!(
        "select from {} returned {} row(s) in {:?} (limit={:?}, offset={:?})",
        query.table(),
        rows.len(),
        elapsed,
        query.limit(),
        query.offset()
    );
    Ok(rows)
}

pub(crate) fn run_count<Ex: Executor + ?Sized>(
    executor: &Ex,
    query: &SelectQuery,
) -> Result<u64, HatchError> {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("hatchling.count", table = %query.table()).entered();

    let start = Instant::now();
    let total = executor.count(query)?;
    metrics::record_query("count", start.elapsed());
    log::debug!("count on {} = {}", query.table(), total);
    Ok(total)
}
