//! # Hatchling
//!
//! Web-facing query helpers for coroutine services built on the `may` runtime:
//! immutable query sets, 404-raising lookups, request-driven pagination and a
//! small `may_minihttp` integration.
//!
//! Storage stays behind the [`Executor`] trait. [`MemoryStore`] runs queries
//! in-process; [`SqlExecutor`] renders them with sea-query for a driver-backed
//! [`SqlClient`].
//!
//! ```rust
//! use hatchling::{Filter, MemoryStore, Paginate, QuerySet, RequestArgs, Row};
//!
//! let store = MemoryStore::new();
//! for id in 1..=50 {
//!     store.insert("posts", Row::new().with("id", id).with("published", id % 2 == 0));
//! }
//!
//! let published = QuerySet::<Row>::for_table("posts")
//!     .filter(Filter::eq("published", true))
//!     .order_by("-id");
//!
//! let page = published.paginate(&store, Some(&RequestArgs::parse("per_page=10")), Paginate::new())?;
//! assert_eq!(page.total, Some(25));
//! assert_eq!(page.next_num(), Some(2));
//!
//! let latest = published.get_or_404([Filter::eq("id", 50)], None).one(&store)?;
//! assert_eq!(latest.get::<i64>("id")?, 50);
//! # Ok::<(), hatchling::HatchError>(())
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod executor;
pub mod memory;
pub mod metrics;
pub mod migration;
pub mod model;
pub mod query;
pub mod request;
pub mod schema;
pub mod value;
pub mod web;

pub use config::{DatabaseConfig, ServerConfig, Settings};
pub use database::{Database, Session, SharedExecutor};
pub use error::HatchError;
pub use executor::sql::{SqlClient, SqlExecutor};
pub use executor::{Executor, FromRow, Row};
pub use memory::MemoryStore;
pub use migration::project::ProjectConfig;
pub use model::Model;
pub use query::{
    CompareOp, Dialect, Filter, IterPages, ModelIter, OnMissing, OrderBy, PageWindow, Paginate,
    Pagination, QuerySet, QuerySetSingle, SelectQuery, MULTIPLICITY_PROBE,
};
pub use request::RequestArgs;
pub use schema::{Column, ColumnKind, EntitySchema, SchemaRegistry};
pub use value::{Value, ValueType};
pub use web::{App, Reply, RequestContext};
