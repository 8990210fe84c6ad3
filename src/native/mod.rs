//! Native database client API
//!
//! The statement bridge drives a session-oriented SQL client through these
//! traits. Every call returns a [`NativeResult`]; the bridge never inspects
//! driver internals beyond what is exposed here.
//!
//! Statements come in two flavours with disjoint capabilities:
//! - [`PreparedStatement`]: SQL fixed at creation, positional parameters, re-executable
//! - [`PlainStatement`]: SQL supplied on every execution, no parameters
//!
//! Both share [`StatementControl`] for fetch size, max rows, cancellation,
//! result retrieval and close.

pub mod sqlite;

use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub use sqlite::SqliteDriver;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NativeError {
    #[error("{0}")]
    Database(String),

    #[error("statement execution was cancelled")]
    Cancelled,

    #[error("{0} is closed")]
    Closed(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no driver accepts url '{0}'")]
    UnsupportedUrl(String),
}

pub type NativeResult<T> = Result<T, NativeError>;

/// A strongly typed parameter ready to be bound
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i32),
    Long(i64),
    Short(i16),
    Float(f32),
    Double(f64),
    String(String),
    Boolean(bool),
    Time(NaiveTime),
    Date(NaiveDate),
}

/// A value read from a result row
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// Result column metadata as reported by the driver
#[derive(Debug, Clone, PartialEq)]
pub struct NativeColumn {
    pub name: String,
    pub declared_type: Option<String>,
}

impl NativeColumn {
    pub fn new(name: impl Into<String>, declared_type: Option<&str>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.map(str::to_string),
        }
    }
}

/// Entry point of a database client: turns a URL into a connection
pub trait NativeDriver: Send + Sync {
    fn accepts(&self, url: &str) -> bool;

    fn connect(
        &self,
        url: &str,
        properties: &HashMap<String, String>,
    ) -> NativeResult<Arc<dyn NativeConnection>>;
}

/// An open database session
pub trait NativeConnection: Send + Sync {
    /// Parse `sql` into a forward-only, read-only prepared statement
    fn prepare_statement(&self, sql: &str) -> NativeResult<Arc<dyn PreparedStatement>>;

    /// Create a forward-only, read-only statement that takes SQL per execution
    fn create_statement(&self) -> NativeResult<Arc<dyn PlainStatement>>;

    fn close(&self) -> NativeResult<()>;

    fn is_closed(&self) -> bool;
}

/// Capabilities shared by every statement kind
pub trait StatementControl: Send + Sync {
    /// Rows to pull from the database per round trip.
    ///
    /// Advisory only. The SQLite driver ignores it: a result is read in full
    /// (bounded by `max_rows`) before `execute` returns, and the connection
    /// lock is released at that point.
    fn set_fetch_size(&self, rows: i32) -> NativeResult<()>;

    fn fetch_size(&self) -> i32;

    fn set_max_rows(&self, rows: i32) -> NativeResult<()>;

    /// Row limit for result sets; 0 means unlimited
    fn max_rows(&self) -> i32;

    /// Rows changed by the last execution, -1 if it produced a result set
    fn update_count(&self) -> i64;

    /// Hand over the result set produced by the last execution, if any
    fn take_result_set(&self) -> Option<Box<dyn NativeResultSet>>;

    /// Advisory cancellation; a no-op when nothing is executing
    fn cancel(&self) -> NativeResult<()>;

    fn close(&self) -> NativeResult<()>;

    fn is_closed(&self) -> bool;
}

pub trait PlainStatement: StatementControl {
    /// Execute `sql`; `true` when a result set was produced
    fn execute(&self, sql: &str) -> NativeResult<bool>;

    fn as_control(&self) -> &dyn StatementControl;
}

pub trait PreparedStatement: StatementControl {
    /// Execute with the currently bound parameters; `true` when a result set was produced
    fn execute(&self) -> NativeResult<bool>;

    /// Bind `value` at the 1-based `index`
    fn bind(&self, index: u32, value: ParamValue) -> NativeResult<()>;

    fn parameter_count(&self) -> usize;

    fn as_control(&self) -> &dyn StatementControl;
}

/// Forward-only, read-only row stream
pub trait NativeResultSet: Send {
    fn columns(&self) -> &[NativeColumn];

    fn next_row(&mut self) -> NativeResult<Option<Vec<NativeValue>>>;

    fn close(&mut self) -> NativeResult<()>;
}
