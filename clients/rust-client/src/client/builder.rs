use super::BridgeClient;
use super::DriverError;
use std::collections::HashMap;
use std::time::Duration;

pub struct BridgeClientBuilder {
    addr: String,
    timeout_ms: Option<u64>,
    pool_size: Option<usize>,
}

impl BridgeClientBuilder {
    pub fn new(addr: &str) -> Self {
        Self {
            addr: addr.to_string(),
            timeout_ms: None,
            pool_size: None,
        }
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = Some(size);
        self
    }

    pub async fn build(self) -> Result<BridgeClient, DriverError> {
        let pool_size = self.pool_size.unwrap_or(4);
        let connect = BridgeClient::connect_with_pool(&self.addr, pool_size);

        match self.timeout_ms {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), connect)
                .await
                .map_err(|_| {
                    DriverError::ConnectionError(format!(
                        "Timed out after {}ms connecting to {}",
                        ms, self.addr
                    ))
                })?,
            None => connect.await,
        }
    }

    /// Build the client and open one database connection on it
    pub async fn build_and_open(
        self,
        url: &str,
        properties: HashMap<String, String>,
    ) -> Result<(BridgeClient, u64), DriverError> {
        let mut client = self.build().await?;
        let connection_id = client.open_connection(url, properties).await?;
        Ok((client, connection_id))
    }
}
