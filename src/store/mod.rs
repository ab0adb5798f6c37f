//! Backing store abstraction.
//!
//! A [`Store`] offers exactly two read-only operations: describe its
//! structure and run a [`ValidatedQuery`]. The only implementation shipped
//! here is [`SqliteStore`].
//!
//! # Example
//!
//! ```ignore
//! use asksql::store::{ExecutionLimits, SqliteStore, Store};
//!
//! let store = SqliteStore::open("./talk2data.db")?;
//! let schema = store.introspect()?;
//! let execution = store.execute(&validated, &ExecutionLimits::default())?;
//! ```

pub mod sample;
mod sqlite;

pub use sqlite::SqliteStore;

use std::time::Duration;

use serde::Serialize;

use crate::result::ResultSet;
use crate::sanitize::ValidatedQuery;
use crate::schema::SchemaDescription;

/// Default ceiling on materialized rows.
pub const DEFAULT_ROW_LIMIT: usize = 10_000;

/// Default ceiling on query run time (5 seconds).
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(5);

/// Errors raised by a store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The store cannot be reached or queried at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the query; carries its own diagnostic.
    #[error("query failed: {0}")]
    Execution(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Ceilings applied to one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Maximum rows materialized. Further rows are dropped.
    pub row_limit: usize,
    /// Maximum run time. `None` disables the check.
    pub time_limit: Option<Duration>,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            row_limit: DEFAULT_ROW_LIMIT,
            time_limit: Some(DEFAULT_TIME_LIMIT),
        }
    }
}

/// Why a result holds fewer rows than the query would produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "limit", content = "value", rename_all = "snake_case")]
pub enum Truncation {
    /// More than this many rows were available.
    RowLimit(usize),
    /// The query was interrupted after this long.
    TimeLimit(Duration),
}

impl std::fmt::Display for Truncation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Truncation::RowLimit(n) => write!(f, "result truncated to the first {} rows", n),
            Truncation::TimeLimit(d) => write!(
                f,
                "query interrupted after {} ms; partial result shown",
                d.as_millis()
            ),
        }
    }
}

/// A materialized result and, if a ceiling was hit, which one.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub result: ResultSet,
    pub truncation: Option<Truncation>,
}

/// A read-only relational store.
///
/// Implementations decide how a handle is shared; callers may assume one
/// `execute` call has exclusive use of it for its duration.
pub trait Store: Send + Sync {
    /// Describe every user-visible table and its columns.
    ///
    /// Tables without columns are returned as empty tables.
    fn introspect(&self) -> StoreResult<SchemaDescription>;

    /// Run a validated query under `limits`.
    ///
    /// Hitting a ceiling is not an error: the rows read so far are returned
    /// with [`Execution::truncation`] set.
    fn execute(&self, query: &ValidatedQuery, limits: &ExecutionLimits)
        -> StoreResult<Execution>;
}
