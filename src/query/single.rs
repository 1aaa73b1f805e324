//! Single-result queries: `get`, `get_or_none`, `first` and the 404 family.
//!
//! A `QuerySetSingle` fetches at most two rows so that "exactly one" can be
//! told apart from "more than one" without scanning the whole result set.
//! What happens on zero rows depends on its [`OnMissing`] policy.

use crate::error::HatchError;
use crate::executor::{Executor, FromRow};
use crate::metrics;
use crate::query::execution::run_select;
use crate::query::filter::Filter;
use crate::query::select::{QuerySet, SelectQuery};
use std::fmt;
use std::marker::PhantomData;

/// Row limit used to detect multiple matches
pub const MULTIPLICITY_PROBE: u64 = 2;

/// What a single-result query does when nothing matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnMissing {
    /// Resolve to `Ok(None)`
    ReturnNone,
    /// Fail with [`HatchError::DoesNotExist`]
    DoesNotExist,
    /// Fail with [`HatchError::NotFound`] (answered with a 404)
    NotFound { description: Option<String> },
}

/// A query expected to match zero or one row
pub struct QuerySetSingle<M> {
    query: SelectQuery,
    on_missing: OnMissing,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for QuerySetSingle<M> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            on_missing: self.on_missing.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for QuerySetSingle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySetSingle")
            .field("query", &self.query)
            .field("on_missing", &self.on_missing)
            .finish()
    }
}

impl<M> QuerySetSingle<M> {
    fn new(mut query: SelectQuery, limit: u64, on_missing: OnMissing) -> Self {
        query.set_limit(limit);
        Self {
            query,
            on_missing,
            _model: PhantomData,
        }
    }

    pub fn query(&self) -> &SelectQuery {
        &self.query
    }

    pub fn on_missing(&self) -> &OnMissing {
        &self.on_missing
    }

    /// `true` when an empty result is answered with a 404
    pub fn raise_on_missing(&self) -> bool {
        matches!(self.on_missing, OnMissing::NotFound { .. })
    }

    pub fn not_found_description(&self) -> Option<&str> {
        match &self.on_missing {
            OnMissing::NotFound { description } => description.as_deref(),
            _ => None,
        }
    }
}

impl<M: FromRow> QuerySetSingle<M> {
    /// Execute the query
    ///
    /// # Errors
    ///
    /// - `MultipleResults` if more than one row matched
    /// - `NotFound` / `DoesNotExist` if nothing matched, depending on the policy
    /// - any executor error, unchanged
    pub fn fetch<Ex: Executor + ?Sized>(&self, executor: &Ex) -> Result<Option<M>, HatchError> {
        let mut rows = run_select(executor, &self.query)?.into_iter();
        match (rows.next(), rows.next()) {
            (Some(row), None) => M::from_row(&row).map(Some),
            (Some(_), Some(_)) => {
                log::warn!(
                    "query on {} expected one row but matched several",
                    self.query.table()
                );
                Err(HatchError::MultipleResults)
            }
            (None, _) => match &self.on_missing {
                OnMissing::ReturnNone => Ok(None),
                OnMissing::DoesNotExist => Err(HatchError::DoesNotExist),
                OnMissing::NotFound { description } => {
                    metrics::record_not_found();
                    Err(HatchError::NotFound {
                        description: description.clone(),
                    })
                }
            },
        }
    }

    /// Execute and require a model; an empty `ReturnNone` result becomes
    /// `DoesNotExist`
    pub fn one<Ex: Executor + ?Sized>(&self, executor: &Ex) -> Result<M, HatchError> {
        self.fetch(executor)?.ok_or(HatchError::DoesNotExist)
    }
}

impl<M> QuerySet<M> {
    fn single<I>(&self, filters: I, limit: u64, on_missing: OnMissing) -> QuerySetSingle<M>
    where
        I: IntoIterator<Item = Filter>,
    {
        QuerySetSingle::new(self.filter_all(filters).query, limit, on_missing)
    }

    /// Exactly one row matching `filters`, else `DoesNotExist`
    pub fn get<I: IntoIterator<Item = Filter>>(&self, filters: I) -> QuerySetSingle<M> {
        self.single(filters, MULTIPLICITY_PROBE, OnMissing::DoesNotExist)
    }

    /// Like [`get`](Self::get) but resolves to `None` when nothing matches
    pub fn get_or_none<I: IntoIterator<Item = Filter>>(&self, filters: I) -> QuerySetSingle<M> {
        self.single(filters, MULTIPLICITY_PROBE, OnMissing::ReturnNone)
    }

    /// The first row of the query, if any; never reports multiplicity
    pub fn first(&self) -> QuerySetSingle<M> {
        self.single([], 1, OnMissing::ReturnNone)
    }

    /// Exactly one row matching `filters`, else a 404
    ///
    /// ```rust
    /// use hatchling::{Filter, HatchError, MemoryStore, QuerySet, Row};
    ///
    /// let store = MemoryStore::new();
    /// store.insert("users", Row::new().with("username", "bar"));
    ///
    /// let err = QuerySet::<Row>::for_table("users")
    ///     .get_or_404([Filter::eq("username", "foo")], Some("username not found."))
    ///     .fetch(&store)
    ///     .unwrap_err();
    /// assert_eq!(err.status().0, 404);
    /// ```
    pub fn get_or_404<I: IntoIterator<Item = Filter>>(
        &self,
        filters: I,
        description: Option<&str>,
    ) -> QuerySetSingle<M> {
        self.single(
            filters,
            MULTIPLICITY_PROBE,
            OnMissing::NotFound {
                description: description.map(str::to_string),
            },
        )
    }

    /// Same contract as [`get_or_404`](Self::get_or_404).
    ///
    /// Despite the name this still fails with `MultipleResults` when more than
    /// one row matches; applications depend on that.
    pub fn first_or_404<I: IntoIterator<Item = Filter>>(
        &self,
        filters: I,
        description: Option<&str>,
    ) -> QuerySetSingle<M> {
        self.get_or_404(filters, description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Row;
    use crate::memory::MemoryStore;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert("users", Row::new().with("id", 1).with("username", "foo"));
        store.insert("users", Row::new().with("id", 2).with("username", "bar"));
        store.insert("users", Row::new().with("id", 3).with("username", "bar"));
        store
    }

    fn users() -> QuerySet<Row> {
        QuerySet::for_table("users")
    }

    #[test]
    fn test_get_or_404_configures_probe() {
        let q = users().get_or_404([Filter::eq("id", 1)], Some("missing"));
        assert_eq!(q.query().limit(), Some(MULTIPLICITY_PROBE));
        assert!(q.raise_on_missing());
        assert_eq!(q.not_found_description(), Some("missing"));
        assert_eq!(q.query().filters(), &[Filter::eq("id", 1)]);
    }

    #[test]
    fn test_get_or_404_outcomes() {
        let store = store();

        let found = users().get_or_404([Filter::eq("username", "foo")], None).fetch(&store);
        assert_eq!(found.unwrap().unwrap().get::<i64>("id").unwrap(), 1);

        let missing = users()
            .get_or_404([Filter::eq("username", "baz")], Some("username not found."))
            .fetch(&store)
            .unwrap_err();
        assert!(matches!(
            missing,
            HatchError::NotFound { description: Some(ref d) } if d == "username not found."
        ));

        let several = users().get_or_404([Filter::eq("username", "bar")], None).fetch(&store);
        assert!(matches!(several, Err(HatchError::MultipleResults)));
    }

    #[test]
    fn test_first_or_404_shares_multiplicity_check() {
        let store = store();
        let q = users().first_or_404([Filter::eq("username", "bar")], None);
        assert_eq!(q.query().limit(), Some(MULTIPLICITY_PROBE));
        assert!(matches!(q.fetch(&store), Err(HatchError::MultipleResults)));
    }

    #[test]
    fn test_missing_policies() {
        let store = store();
        let none = users().get_or_none([Filter::eq("id", 9)]).fetch(&store).unwrap();
        assert!(none.is_none());
        assert!(!users().get_or_none([]).raise_on_missing());

        let err = users().get([Filter::eq("id", 9)]).fetch(&store).unwrap_err();
        assert!(matches!(err, HatchError::DoesNotExist));
        assert_eq!(err.status().0, 500);

        let err = users().get_or_none([Filter::eq("id", 9)]).one(&store).unwrap_err();
        assert!(matches!(err, HatchError::DoesNotExist));
    }

    #[test]
    fn test_first_tolerates_many() {
        let store = store();
        let q = users().filter(Filter::eq("username", "bar")).order_by("-id").first();
        assert_eq!(q.query().limit(), Some(1));
        let row = q.one(&store).unwrap();
        assert_eq!(row.get::<i64>("id").unwrap(), 3);
    }

    #[test]
    fn test_source_query_untouched() {
        let base = users();
        let _ = base.get_or_404([Filter::eq("id", 1)], None);
        assert!(base.query().filters().is_empty());
        assert_eq!(base.query().limit(), None);
    }
}
