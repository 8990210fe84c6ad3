use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

use super::spawn_driver_handler;
use crate::service::BridgeServices;

/// Accepts driver connections and hands each one to its own handler task
pub struct DriverListener {
    listener: TcpListener,
    services: Arc<BridgeServices>,
}

impl DriverListener {
    pub async fn bind(addr: &str, services: Arc<BridgeServices>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, services })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` flips to true or its sender is dropped
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) {
        let driver_tx = spawn_driver_handler(self.services.clone());

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            tracing::debug!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                        }
                        if driver_tx.send((stream, addr.to_string())).await.is_err() {
                            tracing::error!("Driver handler channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to accept driver connection: {}", e);
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Driver listener stopped");
    }
}
