//! Model trait: the entry point to the query API.
//!
//! A model names its table, describes its schema and knows how to build
//! itself from a [`Row`](crate::Row). Everything else comes for free through
//! provided methods.
//!
//! # Example
//!
//! ```rust
//! use hatchling::{
//!     Column, ColumnKind, EntitySchema, Filter, FromRow, HatchError, MemoryStore, Model, Row,
//! };
//!
//! struct Post {
//!     id: i64,
//!     title: String,
//! }
//!
//! impl FromRow for Post {
//!     fn from_row(row: &Row) -> Result<Self, HatchError> {
//!         Ok(Post { id: row.get("id")?, title: row.get("title")? })
//!     }
//! }
//!
//! impl Model for Post {
//!     fn table_name() -> &'static str {
//!         "posts"
//!     }
//!
//!     fn schema() -> EntitySchema {
//!         EntitySchema::new("posts")
//!             .column(Column::primary_key("id"))
//!             .column(Column::new("title", ColumnKind::Text))
//!     }
//! }
//!
//! let store = MemoryStore::new();
//! store.insert("posts", Row::new().with("id", 7).with("title", "Hello"));
//!
//! let post = Post::get_or_404([Filter::eq("id", 7)], None).fetch(&store)?.unwrap();
//! assert_eq!((post.id, post.title.as_str()), (7, "Hello"));
//! # Ok::<(), HatchError>(())
//! ```

use crate::error::HatchError;
use crate::executor::{Executor, FromRow};
use crate::query::{Filter, Paginate, Pagination, QuerySet, QuerySetSingle};
use crate::request::RequestArgs;
use crate::schema::EntitySchema;

pub trait Model: FromRow + Sized {
    /// Name of the backing table
    fn table_name() -> &'static str;

    /// Table description used for schema generation
    fn schema() -> EntitySchema;

    /// Unfiltered query over all rows
    fn find() -> QuerySet<Self> {
        QuerySet::new()
    }

    fn filter(filter: Filter) -> QuerySet<Self> {
        Self::find().filter(filter)
    }

    fn get_or_404<I: IntoIterator<Item = Filter>>(
        filters: I,
        description: Option<&str>,
    ) -> QuerySetSingle<Self> {
        Self::find().get_or_404(filters, description)
    }

    fn first_or_404<I: IntoIterator<Item = Filter>>(
        filters: I,
        description: Option<&str>,
    ) -> QuerySetSingle<Self> {
        Self::find().first_or_404(filters, description)
    }

    /// Paginate over all rows
    fn paginate<Ex: Executor + ?Sized>(
        executor: &Ex,
        request: Option<&RequestArgs>,
        options: Paginate,
    ) -> Result<Pagination<Self>, HatchError> {
        Self::find().paginate(executor, request, options)
    }
}
