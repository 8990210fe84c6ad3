use crate::driver::DriverHandler;
use sqlbridge_client::protocol::{Handle, Response};

pub async fn handle_read_result_set(
    handler: &DriverHandler,
    result_set_id: Handle,
    chunk_size: u32,
) -> Response {
    match handler
        .run_blocking(move |s| s.result_sets.read_result_set(result_set_id, chunk_size))
        .await
    {
        Ok(chunk) => Response::Rows {
            rows: chunk.rows,
            has_more: chunk.has_more,
        },
        Err(e) => Response::error(e),
    }
}

pub async fn handle_close_result_set(handler: &DriverHandler, result_set_id: Handle) -> Response {
    match handler
        .run_blocking(move |s| s.result_sets.close_result_set(result_set_id))
        .await
    {
        Ok(()) => Response::ok(),
        Err(e) => Response::error(e),
    }
}
