//! Wire protocol definitions for the statement bridge
//!
//! Uses MessagePack for efficient binary serialization.

pub mod codec;
pub mod command;
pub mod error;
pub mod response;
pub mod types;

pub use codec::{
    decode_message, encode_command, encode_message, encode_response, DRIVER_MAGIC,
    MAX_MESSAGE_SIZE, MAX_ROWS_PAYLOAD,
};
pub use command::Command;
pub use error::DriverError;
pub use response::Response;
pub use types::{
    row_size_bound, CellValue, ColumnDescriptor, Handle, ParameterType, SqlType,
    FETCH_SIZE_DEFAULT,
};
