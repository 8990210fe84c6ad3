use crate::driver::DriverHandler;
use sqlbridge_client::protocol::{Handle, ParameterType, Response};

pub async fn handle_prepare_statement(
    handler: &DriverHandler,
    connection_id: Handle,
    sql: String,
) -> Response {
    match handler
        .run_blocking(move |s| s.statements.prepare_statement(connection_id, &sql))
        .await
    {
        Ok(handle) => Response::handle(handle),
        Err(e) => Response::error(e),
    }
}

pub async fn handle_create_statement(handler: &DriverHandler, connection_id: Handle) -> Response {
    match handler
        .run_blocking(move |s| s.statements.create_statement(connection_id))
        .await
    {
        Ok(handle) => Response::handle(handle),
        Err(e) => Response::error(e),
    }
}

pub async fn handle_set_parameter(
    handler: &DriverHandler,
    statement_id: Handle,
    index: u32,
    parameter_type: ParameterType,
    value: String,
) -> Response {
    match handler
        .run_blocking(move |s| {
            s.statements
                .set_parameter(statement_id, index, parameter_type, &value)
        })
        .await
    {
        Ok(()) => Response::ok(),
        Err(e) => Response::error(e),
    }
}

pub async fn handle_execute_statement(
    handler: &DriverHandler,
    statement_id: Handle,
    fetch_size: i32,
    sql: Option<String>,
) -> Response {
    match handler
        .run_blocking(move |s| {
            s.statements
                .execute_statement(statement_id, fetch_size, sql.as_deref())
        })
        .await
    {
        Ok(outcome) => outcome.into(),
        Err(e) => Response::error(e),
    }
}

pub async fn handle_cancel_statement(handler: &DriverHandler, statement_id: Handle) -> Response {
    match handler
        .run_blocking(move |s| s.statements.cancel_statement(statement_id))
        .await
    {
        Ok(()) => Response::ok(),
        Err(e) => Response::error(e),
    }
}

pub async fn handle_close_statement(handler: &DriverHandler, statement_id: Handle) -> Response {
    match handler
        .run_blocking(move |s| s.statements.close_statement(statement_id))
        .await
    {
        Ok(()) => Response::ok(),
        Err(e) => Response::error(e),
    }
}
