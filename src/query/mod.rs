//! Query building and execution.
//!
//! - **Filter**: predicates and their in-process matcher (`Filter`, `Matcher`)
//! - **Select**: the immutable query builder (`SelectQuery`, `QuerySet`)
//! - **Execution**: terminal operations (`execute`, `all`, `count`, `exists`)
//! - **Single**: existence queries (`get`, `get_or_404`, ...)
//! - **Pagination**: request-driven paging (`paginate`, `Pagination`)
//! - **Dialect**: SQL rendering through sea-query

pub mod dialect;
pub mod execution;
pub mod filter;
pub mod pagination;
pub mod select;
pub mod single;

pub use dialect::Dialect;
pub use execution::ModelIter;
pub use filter::{CompareOp, Filter, Matcher};
pub use pagination::{IterPages, PageWindow, Paginate, Pagination, DEFAULT_PAGE, DEFAULT_PER_PAGE};
pub use select::{OrderBy, QuerySet, SelectQuery};
pub use single::{OnMissing, QuerySetSingle, MULTIPLICITY_PROBE};
