//! sqlbridge Rust Client
//!
//! Wire protocol and async TCP client for the sqlbridge statement server.
//! Every server-side object (connection, statement, result set) is addressed
//! by an opaque handle returned from the call that created it.
//!
//! # Example
//!
//! ```rust,no_run
//! use sqlbridge_client::{BridgeClientBuilder, ExecuteResult, ParameterType};
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sqlbridge_client::DriverError> {
//!     let mut client = BridgeClientBuilder::new("127.0.0.1:7420").build().await?;
//!
//!     let conn = client.open_connection("sqlite::memory:", HashMap::new()).await?;
//!     let stmt = client.prepare_statement(conn, "SELECT ? + 1").await?;
//!     client.set_parameter(stmt, 1, ParameterType::Int, "41").await?;
//!
//!     let result = client.execute_statement(stmt, -1, None).await?;
//!     if let ExecuteResult::Rows { result_set_id, .. } = result {
//!         let rows = client.read_all(result_set_id).await?;
//!         println!("{:?}", rows);
//!     }
//!
//!     client.close_statement(stmt).await?;
//!     client.close_connection(conn).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod protocol;

pub use client::{BridgeClient, BridgeClientBuilder, ExecuteResult, RowChunk};
pub use protocol::{
    CellValue, ColumnDescriptor, Command, DriverError, Handle, ParameterType, Response, SqlType,
};
