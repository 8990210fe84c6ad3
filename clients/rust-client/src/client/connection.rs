use super::BridgeClient;
use crate::protocol::{Command, DriverError, Handle};
use std::collections::HashMap;

impl BridgeClient {
    pub async fn open_connection(
        &mut self,
        url: &str,
        properties: HashMap<String, String>,
    ) -> Result<Handle, DriverError> {
        let response = self
            .send_command(Command::OpenConnection {
                url: url.to_string(),
                properties,
            })
            .await?;
        Self::expect_handle(response)
    }

    pub async fn close_connection(&mut self, connection_id: Handle) -> Result<(), DriverError> {
        let response = self
            .send_command(Command::CloseConnection { connection_id })
            .await?;
        Self::expect_ok(response)
    }
}
