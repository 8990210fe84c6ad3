use crate::error::{BridgeError, BridgeResult};
use crate::registry::ObjectRegistry;
use sqlbridge_client::protocol::{Handle, MAX_ROWS_PAYLOAD};
use sqlbridge_client::RowChunk;
use std::sync::Arc;

pub const DEFAULT_CHUNK_SIZE: u32 = 500;

/// Reads and closes registered result cursors
pub struct ResultSetService {
    registry: Arc<ObjectRegistry>,
    default_chunk_size: u32,
}

impl ResultSetService {
    pub fn new(registry: Arc<ObjectRegistry>, default_chunk_size: u32) -> Self {
        let default_chunk_size = if default_chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            default_chunk_size
        };
        Self {
            registry,
            default_chunk_size,
        }
    }

    pub fn default_chunk_size(&self) -> u32 {
        self.default_chunk_size
    }

    /// Read the next chunk of rows.
    ///
    /// A `chunk_size` of 0 reads the configured default. A chunk stops early
    /// when the next row would not fit in one response frame. Once the cursor
    /// has nothing left it is closed and its handle removed.
    pub fn read_result_set(
        &self,
        result_set_id: Handle,
        chunk_size: u32,
    ) -> BridgeResult<RowChunk> {
        let cursor = self.registry.result_sets().get(result_set_id)?;
        let chunk_size = if chunk_size == 0 {
            self.default_chunk_size
        } else {
            chunk_size
        };

        let (rows, has_more) = cursor.fetch(chunk_size as usize, MAX_ROWS_PAYLOAD)?;

        if !has_more {
            if let Err(e) = cursor.close() {
                tracing::warn!("Result set {} closed with error: {}", result_set_id, e);
            }
            if let Err(e) = self.registry.result_sets().remove(result_set_id) {
                tracing::debug!("Result set {} already removed: {}", result_set_id, e);
            }
            tracing::debug!(
                "Result set {} of statement {} exhausted",
                result_set_id,
                cursor.statement_id()
            );
        }

        Ok(RowChunk { rows, has_more })
    }

    /// Close the native result set, then drop its handle
    pub fn close_result_set(&self, result_set_id: Handle) -> BridgeResult<()> {
        let cursor = self.registry.result_sets().get(result_set_id)?;
        let closed = cursor.close();
        self.registry.result_sets().remove(result_set_id)?;

        if let Err(e) = closed {
            tracing::warn!("Result set {} closed with error: {}", result_set_id, e);
            return Err(BridgeError::Execution(e));
        }
        tracing::debug!("Closed result set {}", result_set_id);
        Ok(())
    }
}
