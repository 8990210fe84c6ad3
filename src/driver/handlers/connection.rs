use crate::driver::DriverHandler;
use sqlbridge_client::protocol::{Handle, Response};
use std::collections::HashMap;

pub async fn handle_open_connection(
    handler: &DriverHandler,
    url: String,
    properties: HashMap<String, String>,
) -> Response {
    match handler
        .run_blocking(move |s| s.connections.open_connection(&url, &properties))
        .await
    {
        Ok(handle) => Response::handle(handle),
        Err(e) => Response::error(e),
    }
}

pub async fn handle_close_connection(handler: &DriverHandler, connection_id: Handle) -> Response {
    match handler
        .run_blocking(move |s| s.connections.close_connection(connection_id))
        .await
    {
        Ok(()) => Response::ok(),
        Err(e) => Response::error(e),
    }
}
