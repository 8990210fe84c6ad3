//! # sqlbridge
//!
//! Bridges a stateless request/response channel to a stateful SQL client.
//! Connections, statements and result cursors live in a process-wide
//! [`ObjectRegistry`] and are addressed by opaque integer handles, so a
//! client can prepare, bind, execute, page through results, cancel and close
//! across independent calls.

pub mod config;
pub mod cursor;
pub mod driver;
pub mod error;
pub mod marshal;
pub mod native;
pub mod registry;
pub mod service;

pub use config::BridgeConfig;
pub use cursor::ResultCursor;
pub use driver::{DriverHandler, DriverListener};
pub use error::{BridgeError, BridgeResult};
pub use native::{NativeDriver, NativeError, SqliteDriver};
pub use registry::{HandleTable, ObjectKind, ObjectRegistry, StatementEntry, StatementMode};
pub use service::{
    BridgeServices, ConnectionService, ExecuteOutcome, ResultSetService, StatementService,
};
