use super::error::DriverError;
use super::types::{CellValue, ColumnDescriptor, Handle};
use serde::{Deserialize, Serialize};

/// Response from the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    /// Acknowledgement with no payload
    Ok,

    /// Error response
    Error { error: DriverError },

    /// Pong response (for Ping)
    Pong { timestamp: i64 },

    /// A newly registered connection or statement handle
    Handle { handle: Handle },

    /// Execution produced no result set
    Affected { records_affected: i64 },

    /// Execution produced a result set, registered under `result_set_id`
    ResultSet {
        result_set_id: Handle,
        has_rows: bool,
        columns: Vec<ColumnDescriptor>,
    },

    /// A chunk of rows read from a result set
    Rows {
        rows: Vec<Vec<CellValue>>,
        has_more: bool,
    },
}

impl Response {
    /// Create an acknowledgement response
    pub fn ok() -> Self {
        Response::Ok
    }

    /// Create a handle response
    pub fn handle(handle: Handle) -> Self {
        Response::Handle { handle }
    }

    /// Create an error response
    pub fn error(err: DriverError) -> Self {
        Response::Error { error: err }
    }

    /// Create a pong response
    pub fn pong() -> Self {
        Response::Pong {
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}
