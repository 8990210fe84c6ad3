use crate::error::{BridgeError, BridgeResult};
use crate::native::{NativeConnection, NativeDriver, NativeError};
use crate::registry::{ConnectionEntry, ObjectRegistry};
use sqlbridge_client::protocol::Handle;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves connection handles to live native connections
pub trait ConnectionResolver: Send + Sync {
    fn get_connection(&self, connection_id: Handle) -> BridgeResult<Arc<dyn NativeConnection>>;
}

/// Opens, resolves and closes database connections
pub struct ConnectionService {
    registry: Arc<ObjectRegistry>,
    drivers: Vec<Arc<dyn NativeDriver>>,
    default_max_rows: i32,
}

impl ConnectionService {
    pub fn new(
        registry: Arc<ObjectRegistry>,
        drivers: Vec<Arc<dyn NativeDriver>>,
        default_max_rows: i32,
    ) -> Self {
        Self {
            registry,
            drivers,
            default_max_rows,
        }
    }

    pub fn open_connection(
        &self,
        url: &str,
        properties: &HashMap<String, String>,
    ) -> BridgeResult<Handle> {
        let driver = self
            .drivers
            .iter()
            .find(|d| d.accepts(url))
            .ok_or_else(|| NativeError::UnsupportedUrl(url.to_string()))?;

        let connection = if self.default_max_rows > 0 && !properties.contains_key("max_rows") {
            let mut properties = properties.clone();
            properties.insert("max_rows".to_string(), self.default_max_rows.to_string());
            driver.connect(url, &properties)?
        } else {
            driver.connect(url, properties)?
        };

        let handle = self
            .registry
            .connections()
            .put(ConnectionEntry::new(url, connection));
        tracing::info!("Opened connection {} to {}", handle, url);
        Ok(handle)
    }

    /// Close the native connection, then drop its handle.
    ///
    /// The handle is removed even when the native close fails; the failure is
    /// reported afterwards. Statements created on the connection stay
    /// registered.
    pub fn close_connection(&self, connection_id: Handle) -> BridgeResult<()> {
        let entry = self.registry.connections().get(connection_id)?;
        let closed = entry.connection.close();
        self.registry.connections().remove(connection_id)?;

        if let Err(e) = closed {
            tracing::warn!(
                "Connection {} to {} closed with error: {}",
                connection_id,
                entry.url,
                e
            );
            return Err(BridgeError::Execution(e));
        }
        tracing::info!("Closed connection {} to {}", connection_id, entry.url);
        Ok(())
    }
}

impl ConnectionResolver for ConnectionService {
    fn get_connection(&self, connection_id: Handle) -> BridgeResult<Arc<dyn NativeConnection>> {
        let entry = self.registry.connections().get(connection_id)?;
        Ok(Arc::clone(&entry.connection))
    }
}
