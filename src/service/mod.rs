//! Call-level services over the handle registry
//!
//! Each service operation is synchronous and may block on the native client;
//! the driver runs them on blocking workers.

pub mod connection;
pub mod result_set;
pub mod statement;

pub use connection::{ConnectionResolver, ConnectionService};
pub use result_set::{ResultSetService, DEFAULT_CHUNK_SIZE};
pub use statement::{ExecuteOutcome, StatementService};

use crate::config::BridgeConfig;
use crate::native::{NativeDriver, SqliteDriver};
use crate::registry::ObjectRegistry;
use std::sync::Arc;

/// Every service sharing one registry
pub struct BridgeServices {
    pub registry: Arc<ObjectRegistry>,
    pub connections: Arc<ConnectionService>,
    pub statements: StatementService,
    pub result_sets: ResultSetService,
}

impl BridgeServices {
    pub fn new(drivers: Vec<Arc<dyn NativeDriver>>, config: &BridgeConfig) -> Self {
        let registry = Arc::new(ObjectRegistry::new());
        let connections = Arc::new(ConnectionService::new(
            registry.clone(),
            drivers,
            config.max_rows,
        ));
        let statements = StatementService::new(registry.clone(), connections.clone());
        let result_sets = ResultSetService::new(registry.clone(), config.chunk_size);

        Self {
            registry,
            connections,
            statements,
            result_sets,
        }
    }

    /// Services backed by the bundled SQLite driver
    pub fn with_sqlite(config: &BridgeConfig) -> Self {
        Self::new(vec![Arc::new(SqliteDriver::new())], config)
    }

    /// Close every native object still registered, then forget all handles.
    ///
    /// Cursors go first, then statements, then connections. Failures are
    /// logged and do not stop the sweep.
    pub fn shutdown(&self) {
        let (connections, statements, result_sets) = self.registry.counts();
        tracing::info!(
            "Closing {} result sets, {} statements, {} connections",
            result_sets,
            statements,
            connections
        );

        for (handle, cursor) in self.registry.result_sets().drain() {
            if let Err(e) = cursor.close() {
                tracing::warn!("Failed to close result set {}: {}", handle, e);
            }
        }
        for (handle, statement) in self.registry.statements().drain() {
            if let Err(e) = statement.control().close() {
                tracing::warn!("Failed to close statement {}: {}", handle, e);
            }
        }
        for (handle, entry) in self.registry.connections().drain() {
            if let Err(e) = entry.connection.close() {
                tracing::warn!("Failed to close connection {}: {}", handle, e);
            }
        }
        self.registry.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_shutdown_closes_everything() {
        let services = BridgeServices::with_sqlite(&BridgeConfig::default());
        let conn = services
            .connections
            .open_connection("sqlite::memory:", &HashMap::new())
            .unwrap();
        let stmt = services.statements.create_statement(conn).unwrap();
        let native = services.connections.get_connection(conn).unwrap();
        services
            .statements
            .execute_statement(stmt, -1, Some("SELECT 1 UNION ALL SELECT 2"))
            .unwrap();
        assert_eq!(services.registry.counts(), (1, 1, 1));

        services.shutdown();
        assert_eq!(services.registry.counts(), (0, 0, 0));
        assert!(native.is_closed());
    }
}
