use super::types::{Handle, ParameterType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Commands that can be sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Ping the server (keep-alive)
    Ping,

    // ==================== Connection Operations ====================
    /// Open a database connection
    OpenConnection {
        url: String,
        #[serde(default)]
        properties: HashMap<String, String>,
    },

    /// Close a database connection
    CloseConnection { connection_id: Handle },

    // ==================== Statement Operations ====================
    /// Prepare a parameterized statement
    PrepareStatement { connection_id: Handle, sql: String },

    /// Create a plain statement that takes its SQL at execution time
    CreateStatement { connection_id: Handle },

    /// Execute a statement
    ExecuteStatement {
        statement_id: Handle,
        /// -1 selects the statement's max rows
        fetch_size: i32,
        #[serde(default)]
        sql: Option<String>,
    },

    /// Request cancellation of the statement's running execution
    CancelStatement { statement_id: Handle },

    /// Close a statement and invalidate its handle
    CloseStatement { statement_id: Handle },

    /// Bind a parameter on a prepared statement
    SetParameter {
        statement_id: Handle,
        /// 1-based parameter position
        index: u32,
        #[serde(rename = "type")]
        parameter_type: ParameterType,
        value: String,
    },

    // ==================== Result Set Operations ====================
    /// Read the next chunk of rows
    ReadResultSet {
        result_set_id: Handle,
        #[serde(default)]
        chunk_size: u32,
    },

    /// Close a result set and invalidate its handle
    CloseResultSet { result_set_id: Handle },
}

impl Command {
    /// Short command name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::OpenConnection { .. } => "open_connection",
            Command::CloseConnection { .. } => "close_connection",
            Command::PrepareStatement { .. } => "prepare_statement",
            Command::CreateStatement { .. } => "create_statement",
            Command::ExecuteStatement { .. } => "execute_statement",
            Command::CancelStatement { .. } => "cancel_statement",
            Command::CloseStatement { .. } => "close_statement",
            Command::SetParameter { .. } => "set_parameter",
            Command::ReadResultSet { .. } => "read_result_set",
            Command::CloseResultSet { .. } => "close_result_set",
        }
    }
}
