use crate::native::{NativeConnection, PlainStatement, PreparedStatement, StatementControl};
use sqlbridge_client::protocol::Handle;
use std::sync::Arc;

/// A registered database session
pub struct ConnectionEntry {
    pub url: String,
    pub connection: Arc<dyn NativeConnection>,
}

impl ConnectionEntry {
    pub fn new(url: impl Into<String>, connection: Arc<dyn NativeConnection>) -> Self {
        Self {
            url: url.into(),
            connection,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementMode {
    Prepared,
    Plain,
}

/// A registered statement.
///
/// Prepared and plain statements have disjoint capabilities: only a prepared
/// statement binds parameters, only a plain one takes SQL at execution time.
pub enum StatementEntry {
    Prepared {
        connection_id: Handle,
        sql: String,
        statement: Arc<dyn PreparedStatement>,
    },
    Plain {
        connection_id: Handle,
        statement: Arc<dyn PlainStatement>,
    },
}

impl StatementEntry {
    pub fn mode(&self) -> StatementMode {
        match self {
            StatementEntry::Prepared { .. } => StatementMode::Prepared,
            StatementEntry::Plain { .. } => StatementMode::Plain,
        }
    }

    pub fn connection_id(&self) -> Handle {
        match self {
            StatementEntry::Prepared { connection_id, .. }
            | StatementEntry::Plain { connection_id, .. } => *connection_id,
        }
    }

    /// Capabilities common to both modes
    pub fn control(&self) -> &dyn StatementControl {
        match self {
            StatementEntry::Prepared { statement, .. } => statement.as_control(),
            StatementEntry::Plain { statement, .. } => statement.as_control(),
        }
    }
}
