//! Value marshaling between the wire and the native client
//!
//! Inbound: declared parameter type + text → typed native parameter.
//! Outbound: native column metadata and row values → wire descriptors and cells.

pub mod columns;
pub mod param;

pub use columns::{describe_columns, sql_type_for, to_cell, to_cells};
pub use param::to_param_value;
