//! Driver server for the statement bridge
//!
//! Exposes the bridge services over a framed binary protocol so clients can
//! drive connections, statements and result sets through opaque handles.
//!
//! # Protocol Overview
//!
//! - **Magic Header**: `sqlbridge-v1\0` (13 bytes, sent once on connection)
//! - **Request Frame**: `[length: 4 bytes BE][msgpack payload]`
//! - **Response Frame**: `[length: 4 bytes BE][msgpack payload]`
//!
//! One TCP connection processes its commands in order; handles are shared by
//! all connections, so a cancel sent on one connection reaches a statement
//! executing on another.

pub use sqlbridge_client::protocol::{
    decode_message, encode_command, encode_response, Command, DriverError, Response,
    DRIVER_MAGIC, MAX_MESSAGE_SIZE,
};

pub mod handlers;
pub mod listener;

pub use handlers::spawn_driver_handler;
pub use handlers::DriverHandler;
pub use listener::DriverListener;
