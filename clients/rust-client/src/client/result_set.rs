use super::BridgeClient;
use crate::protocol::{CellValue, Command, DriverError, Handle, Response};

/// Rows returned by one read, and whether the result set has more
#[derive(Debug, Clone, PartialEq)]
pub struct RowChunk {
    pub rows: Vec<Vec<CellValue>>,
    pub has_more: bool,
}

impl BridgeClient {
    /// Read up to `chunk_size` rows; 0 lets the server pick its default chunk.
    pub async fn read_result_set(
        &mut self,
        result_set_id: Handle,
        chunk_size: u32,
    ) -> Result<RowChunk, DriverError> {
        let response = self
            .send_command(Command::ReadResultSet {
                result_set_id,
                chunk_size,
            })
            .await?;

        match response {
            Response::Rows { rows, has_more } => Ok(RowChunk { rows, has_more }),
            Response::Error { error } => Err(error),
            other => Err(Self::unexpected(&other)),
        }
    }

    /// Drain a result set to the end
    pub async fn read_all(
        &mut self,
        result_set_id: Handle,
    ) -> Result<Vec<Vec<CellValue>>, DriverError> {
        let mut rows = Vec::new();
        loop {
            let chunk = self.read_result_set(result_set_id, 0).await?;
            rows.extend(chunk.rows);
            if !chunk.has_more {
                return Ok(rows);
            }
        }
    }

    pub async fn close_result_set(&mut self, result_set_id: Handle) -> Result<(), DriverError> {
        let response = self
            .send_command(Command::CloseResultSet { result_set_id })
            .await?;
        Self::expect_ok(response)
    }
}
