//! Database handle and scoped sessions.
//!
//! [`Database`] owns the executor, the registered schemas and a coroutine
//! semaphore sized by `max_connections`. Work against storage happens through
//! a [`Session`], which holds one permit for as long as it lives and gives it
//! back when dropped.
//!
//! ```rust
//! use std::sync::Arc;
//! use hatchling::{Database, DatabaseConfig, MemoryStore, QuerySet, Row, SchemaRegistry};
//!
//! let db = Database::init(
//!     &DatabaseConfig::default(),
//!     SchemaRegistry::new(),
//!     Arc::new(MemoryStore::new()),
//! )?;
//! {
//!     let session = db.session()?;
//!     assert_eq!(db.active_sessions(), 1);
//!     let _ = QuerySet::<Row>::for_table("posts").count(&session);
//! }
//! assert_eq!(db.active_sessions(), 0);
//! db.close();
//! assert!(db.session().is_err());
//! # Ok::<(), hatchling::HatchError>(())
//! ```

use crate::config::DatabaseConfig;
use crate::error::HatchError;
use crate::executor::{Executor, Row};
use crate::query::{Dialect, SelectQuery};
use crate::schema::{EntitySchema, SchemaRegistry};
use may::sync::Semphore as Semaphore;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Executor shared between request coroutines
pub type SharedExecutor = Arc<dyn Executor + Send + Sync>;

struct Inner {
    executor: SharedExecutor,
    registry: SchemaRegistry,
    dialect: Dialect,
    permits: Semaphore,
    max_sessions: usize,
    pool_timeout: Duration,
    active: AtomicUsize,
    closed: AtomicBool,
}

/// Cheaply clonable handle to the configured storage
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.inner.dialect)
            .field("max_sessions", &self.inner.max_sessions)
            .field("active", &self.active_sessions())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Database {
    /// Set up the database and, when `generate_schemas` is configured,
    /// create the registered tables.
    pub fn init(
        config: &DatabaseConfig,
        registry: SchemaRegistry,
        executor: SharedExecutor,
    ) -> Result<Self, HatchError> {
        let dialect = config.dialect()?;
        let max_sessions = config.max_connections.max(1);
        log::info!(
            "Hatchling started, {} ({:?}), {} model(s) in {}",
            config.uri,
            dialect,
            registry.schemas().len(),
            config.app
        );

        let db = Database {
            inner: Arc::new(Inner {
                executor,
                registry,
                dialect,
                permits: Semaphore::new(max_sessions),
                max_sessions,
                pool_timeout: config.pool_timeout(),
                active: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
            }),
        };

        if config.generate_schemas {
            db.generate_schemas()?;
        }
        Ok(db)
    }

    pub fn dialect(&self) -> Dialect {
        self.inner.dialect
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.inner.registry
    }

    /// Create every registered table
    pub fn generate_schemas(&self) -> Result<(), HatchError> {
        for schema in self.inner.registry.schemas() {
            log::info!("generating schema for {}", schema.table());
            log::debug!("{}", schema.create_table_sql(self.inner.dialect));
            self.inner.executor.create_table(schema)?;
        }
        Ok(())
    }

    /// Drop every registered table, in reverse registration order
    pub fn remove_schemas(&self) -> Result<(), HatchError> {
        for schema in self.inner.registry.schemas().iter().rev() {
            log::info!("dropping table {}", schema.table());
            self.inner.executor.drop_table(schema)?;
        }
        Ok(())
    }

    /// Acquire a session, waiting at most `pool_timeout_seconds` for a free slot
    pub fn session(&self) -> Result<Session, HatchError> {
        if self.is_closed() {
            return Err(HatchError::Closed);
        }
        if !self.inner.permits.wait_timeout(self.inner.pool_timeout) {
            log::warn!(
                "no session available after {:?} ({} in use)",
                self.inner.pool_timeout,
                self.active_sessions()
            );
            return Err(HatchError::PoolTimeout(self.inner.pool_timeout));
        }
        if self.is_closed() {
            self.inner.permits.post();
            return Err(HatchError::Closed);
        }
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        Ok(Session {
            inner: Arc::clone(&self.inner),
        })
    }

    pub fn active_sessions(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Refuse new sessions; sessions already handed out stay usable
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            log::info!("database closed ({} session(s) still open)", self.active_sessions());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

/// Scoped access to storage, released on drop
pub struct Session {
    inner: Arc<Inner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("dialect", &self.inner.dialect).finish()
    }
}

impl Session {
    pub fn dialect(&self) -> Dialect {
        self.inner.dialect
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.inner.active.fetch_sub(1, Ordering::SeqCst);
        self.inner.permits.post();
        log::debug!("session released");
    }
}

impl Executor for Session {
    fn execute_select(&self, query: &SelectQuery) -> Result<Vec<Row>, HatchError> {
        self.inner.executor.execute_select(query)
    }

    fn count(&self, query: &SelectQuery) -> Result<u64, HatchError> {
        self.inner.executor.count(query)
    }

    fn create_table(&self, schema: &EntitySchema) -> Result<(), HatchError> {
        self.inner.executor.create_table(schema)
    }

    fn drop_table(&self, schema: &EntitySchema) -> Result<(), HatchError> {
        self.inner.executor.drop_table(schema)
    }
}
