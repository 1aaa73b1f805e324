//! Crate error type.
//!
//! `HatchError` covers the outcomes of existence lookups and pagination
//! (`NotFound`, `MultipleResults`, `DoesNotExist`) as well as failures surfaced
//! by the storage collaborator, configuration and the project bootstrap.
//! Storage errors are carried as-is and never translated.

use std::fmt;
use std::time::Duration;

/// Error returned by every fallible operation in the crate
#[derive(Debug)]
pub enum HatchError {
    /// No row where exactly one was required, or invalid pagination input.
    ///
    /// This is the only variant the web layer answers with a 404.
    NotFound {
        /// Human-readable explanation shown in the 404 body
        description: Option<String>,
    },
    /// More than one row matched a query expected to be unique
    MultipleResults,
    /// `get()` matched nothing
    DoesNotExist,
    /// Query could not be evaluated by the executor
    QueryError(String),
    /// Row parsing/conversion error
    ParseError(String),
    /// Error raised by a storage driver, propagated unchanged
    Storage(Box<dyn std::error::Error + Send + Sync>),
    /// Invalid or unreadable configuration
    Config(String),
    /// A CLI step was run out of order
    Usage(String),
    /// No session permit became available in time
    PoolTimeout(Duration),
    /// The database handle has been closed
    Closed,
    /// `prev()`/`next()` called on a pagination built without a query
    MissingSource,
    /// Filesystem error
    Io(std::io::Error),
}

impl HatchError {
    /// Shorthand for a `NotFound` without description
    pub fn not_found() -> Self {
        HatchError::NotFound { description: None }
    }

    /// Returns `true` for the 404 family
    pub fn is_not_found(&self) -> bool {
        matches!(self, HatchError::NotFound { .. })
    }

    /// HTTP status line for this error
    pub fn status(&self) -> (u16, &'static str) {
        match self {
            HatchError::NotFound { .. } => (404, "Not Found"),
            _ => (500, "Internal Server Error"),
        }
    }
}

impl fmt::Display for HatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HatchError::NotFound { description: Some(d) } => write!(f, "Not found: {d}"),
            HatchError::NotFound { description: None } => write!(
                f,
                "Not found: the requested URL was not found on the server"
            ),
            HatchError::MultipleResults => {
                write!(f, "Multiple objects returned, expected exactly one")
            }
            HatchError::DoesNotExist => write!(f, "Object does not exist"),
            HatchError::QueryError(s) => write!(f, "Query error: {s}"),
            HatchError::ParseError(s) => write!(f, "Parse error: {s}"),
            HatchError::Storage(e) => write!(f, "Storage error: {e}"),
            HatchError::Config(s) => write!(f, "Configuration error: {s}"),
            HatchError::Usage(s) => write!(f, "{s}"),
            HatchError::PoolTimeout(d) => {
                write!(f, "Timed out after {}s waiting for a session", d.as_secs())
            }
            HatchError::Closed => write!(f, "Database handle is closed"),
            HatchError::MissingSource => {
                write!(f, "a query object is required for this method to work")
            }
            HatchError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for HatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HatchError::Storage(e) => Some(e.as_ref()),
            HatchError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HatchError {
    fn from(err: std::io::Error) -> Self {
        HatchError::Io(err)
    }
}

impl From<config::ConfigError> for HatchError {
    fn from(err: config::ConfigError) -> Self {
        HatchError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for HatchError {
    fn from(err: toml::de::Error) -> Self {
        HatchError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for HatchError {
    fn from(err: toml::ser::Error) -> Self {
        HatchError::Config(err.to_string())
    }
}
