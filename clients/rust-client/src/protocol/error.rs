use serde::{Deserialize, Serialize};

/// Driver protocol error types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DriverError {
    /// Unknown or already-removed handle
    InvalidHandle(String),
    /// Operation not legal for the object's current mode
    InvalidOperation(String),
    /// Native database failure (parse, constraint, connectivity, cancellation)
    ExecutionError(String),
    /// Parameter text could not be converted to its declared type
    MarshalError(String),
    /// Connection or I/O error
    ConnectionError(String),
    /// Protocol violation
    ProtocolError(String),
    /// Message too large
    MessageTooLarge,
    /// Server-side failure unrelated to the request
    InternalError(String),
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            DriverError::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            DriverError::ExecutionError(msg) => write!(f, "Execution error: {}", msg),
            DriverError::MarshalError(msg) => write!(f, "Marshal error: {}", msg),
            DriverError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            DriverError::ProtocolError(msg) => write!(f, "Protocol error: {}", msg),
            DriverError::MessageTooLarge => write!(f, "Message too large"),
            DriverError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DriverError {}
