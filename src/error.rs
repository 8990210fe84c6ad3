use crate::native::NativeError;
use crate::registry::ObjectKind;
use sqlbridge_client::protocol::{DriverError, Handle, ParameterType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("{kind} handle {handle} not found")]
    InvalidHandle { kind: ObjectKind, handle: Handle },

    #[error("{0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Execution(#[from] NativeError),

    #[error("cannot convert '{value}' to {parameter_type} for parameter {index}: {reason}")]
    Marshal {
        index: u32,
        parameter_type: ParameterType,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Internal(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    pub fn invalid_handle(kind: ObjectKind, handle: Handle) -> Self {
        BridgeError::InvalidHandle { kind, handle }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        BridgeError::InvalidOperation(message.into())
    }
}

impl From<BridgeError> for DriverError {
    fn from(err: BridgeError) -> Self {
        let message = err.to_string();
        match err {
            BridgeError::InvalidHandle { .. } => DriverError::InvalidHandle(message),
            BridgeError::InvalidOperation(_) => DriverError::InvalidOperation(message),
            BridgeError::Execution(_) => DriverError::ExecutionError(message),
            BridgeError::Marshal { .. } => DriverError::MarshalError(message),
            BridgeError::Internal(_) => DriverError::InternalError(message),
        }
    }
}
