//! Connection handler for the driver protocol
//!
//! Decodes commands and runs them against the bridge services. Service calls
//! may block on the native client, so each one runs on a blocking worker and
//! never stalls other TCP connections.

use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::BridgeResult;
use crate::service::BridgeServices;

use sqlbridge_client::protocol::{
    decode_message, encode_response, Command, DriverError, Response, DRIVER_MAGIC,
    MAX_MESSAGE_SIZE,
};

pub mod connection;
pub mod result_set;
pub mod statement;

/// Handler for a single driver connection
pub struct DriverHandler {
    pub(crate) services: Arc<BridgeServices>,
}

impl DriverHandler {
    pub fn new(services: Arc<BridgeServices>) -> Self {
        Self { services }
    }

    /// Handle a driver connection until the peer disconnects
    pub async fn handle_connection(&mut self, mut stream: TcpStream, addr: String) {
        tracing::info!("Driver connection from {}", addr);

        let mut magic = [0u8; DRIVER_MAGIC.len()];
        if let Err(e) = stream.read_exact(&mut magic).await {
            tracing::debug!("Driver connection {} closed before handshake: {}", addr, e);
            return;
        }
        if magic != DRIVER_MAGIC {
            tracing::warn!("Rejecting {}: bad protocol header", addr);
            let resp = Response::error(DriverError::ProtocolError(
                "Invalid protocol header".to_string(),
            ));
            if let Err(e) = self.send_response(&mut stream, &resp).await {
                tracing::warn!("Failed to send error response: {}", e);
            }
            return;
        }

        loop {
            // Read message length (4 bytes, big-endian)
            let mut len_buf = [0u8; 4];
            match stream.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    tracing::debug!("Driver connection closed: {}", addr);
                    break;
                }
                Err(e) => {
                    tracing::warn!("Driver read error from {}: {}", addr, e);
                    break;
                }
            }

            let msg_len = u32::from_be_bytes(len_buf) as usize;

            if msg_len > MAX_MESSAGE_SIZE {
                let resp = Response::error(DriverError::MessageTooLarge);
                if let Err(e) = self.send_response(&mut stream, &resp).await {
                    tracing::warn!("Failed to send error response: {}", e);
                }
                break;
            }

            let mut payload = vec![0u8; msg_len];
            if let Err(e) = stream.read_exact(&mut payload).await {
                tracing::warn!("Driver read payload error from {}: {}", addr, e);
                break;
            }

            let command: Command = match decode_message(&payload) {
                Ok(cmd) => cmd,
                Err(e) => {
                    let resp = Response::error(e);
                    if let Err(e) = self.send_response(&mut stream, &resp).await {
                        tracing::warn!("Failed to send error response: {}", e);
                    }
                    continue;
                }
            };

            let response = self.execute_command(command).await;

            let data = match frame_response(&response) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Failed to encode response to {}: {}", addr, e);
                    break;
                }
            };

            if let Err(e) = self.write_frame(&mut stream, &data).await {
                tracing::warn!("Failed to send response to {}: {}", addr, e);
                break;
            }
        }
    }

    async fn send_response(
        &self,
        stream: &mut TcpStream,
        response: &Response,
    ) -> Result<(), DriverError> {
        let data = encode_response(response)?;
        self.write_frame(stream, &data).await
    }

    async fn write_frame(&self, stream: &mut TcpStream, data: &[u8]) -> Result<(), DriverError> {
        stream
            .write_all(data)
            .await
            .map_err(|e| DriverError::ConnectionError(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| DriverError::ConnectionError(e.to_string()))?;
        Ok(())
    }

    /// Execute a command and return a response
    pub async fn execute_command(&self, command: Command) -> Response {
        tracing::debug!("Driver command: {}", command.name());

        match command {
            Command::Ping => Response::pong(),

            // ==================== Connections ====================
            Command::OpenConnection { url, properties } => {
                connection::handle_open_connection(self, url, properties).await
            }

            Command::CloseConnection { connection_id } => {
                connection::handle_close_connection(self, connection_id).await
            }

            // ==================== Statements ====================
            Command::PrepareStatement { connection_id, sql } => {
                statement::handle_prepare_statement(self, connection_id, sql).await
            }

            Command::CreateStatement { connection_id } => {
                statement::handle_create_statement(self, connection_id).await
            }

            Command::SetParameter {
                statement_id,
                index,
                parameter_type,
                value,
            } => {
                statement::handle_set_parameter(self, statement_id, index, parameter_type, value)
                    .await
            }

            Command::ExecuteStatement {
                statement_id,
                fetch_size,
                sql,
            } => {
                statement::handle_execute_statement(self, statement_id, fetch_size, sql).await
            }

            Command::CancelStatement { statement_id } => {
                statement::handle_cancel_statement(self, statement_id).await
            }

            Command::CloseStatement { statement_id } => {
                statement::handle_close_statement(self, statement_id).await
            }

            // ==================== Result sets ====================
            Command::ReadResultSet {
                result_set_id,
                chunk_size,
            } => {
                result_set::handle_read_result_set(self, result_set_id, chunk_size).await
            }

            Command::CloseResultSet { result_set_id } => {
                result_set::handle_close_result_set(self, result_set_id).await
            }
        }
    }

    /// Run a service call on a blocking worker
    pub(crate) async fn run_blocking<T, F>(&self, call: F) -> Result<T, DriverError>
    where
        F: FnOnce(&BridgeServices) -> BridgeResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let services = self.services.clone();
        match tokio::task::spawn_blocking(move || call(&services)).await {
            Ok(result) => result.map_err(DriverError::from),
            Err(e) => {
                tracing::warn!("Driver worker failed: {}", e);
                Err(DriverError::InternalError(format!("Worker failed: {}", e)))
            }
        }
    }
}

/// Encode a response, replacing one that cannot be framed by its error
fn frame_response(response: &Response) -> Result<Vec<u8>, DriverError> {
    encode_response(response).or_else(|e| {
        tracing::warn!("Response could not be encoded: {}", e);
        encode_response(&Response::error(e))
    })
}

/// Spawn a handler for incoming driver connections
pub fn spawn_driver_handler(
    services: Arc<BridgeServices>,
) -> tokio::sync::mpsc::Sender<(TcpStream, String)> {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<(TcpStream, String)>(100);

    tokio::spawn(async move {
        while let Some((stream, addr)) = rx.recv().await {
            let services = services.clone();
            tokio::spawn(async move {
                let mut handler = DriverHandler::new(services);
                handler.handle_connection(stream, addr).await;
            });
        }
    });

    tx
}
