use super::BridgeClient;
use crate::protocol::{ColumnDescriptor, Command, DriverError, Handle, ParameterType, Response};

/// Outcome of executing a statement
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteResult {
    /// No result set; number of rows changed
    Affected(i64),
    /// A result set was registered on the server
    Rows {
        result_set_id: Handle,
        has_rows: bool,
        columns: Vec<ColumnDescriptor>,
    },
}

impl ExecuteResult {
    pub fn result_set_id(&self) -> Option<Handle> {
        match self {
            ExecuteResult::Rows { result_set_id, .. } => Some(*result_set_id),
            ExecuteResult::Affected(_) => None,
        }
    }
}

impl BridgeClient {
    pub async fn prepare_statement(
        &mut self,
        connection_id: Handle,
        sql: &str,
    ) -> Result<Handle, DriverError> {
        let response = self
            .send_command(Command::PrepareStatement {
                connection_id,
                sql: sql.to_string(),
            })
            .await?;
        Self::expect_handle(response)
    }

    pub async fn create_statement(&mut self, connection_id: Handle) -> Result<Handle, DriverError> {
        let response = self
            .send_command(Command::CreateStatement { connection_id })
            .await?;
        Self::expect_handle(response)
    }

    pub async fn set_parameter(
        &mut self,
        statement_id: Handle,
        index: u32,
        parameter_type: ParameterType,
        value: &str,
    ) -> Result<(), DriverError> {
        let response = self
            .send_command(Command::SetParameter {
                statement_id,
                index,
                parameter_type,
                value: value.to_string(),
            })
            .await?;
        Self::expect_ok(response)
    }

    pub async fn execute_statement(
        &mut self,
        statement_id: Handle,
        fetch_size: i32,
        sql: Option<&str>,
    ) -> Result<ExecuteResult, DriverError> {
        let response = self
            .send_command(Command::ExecuteStatement {
                statement_id,
                fetch_size,
                sql: sql.map(str::to_string),
            })
            .await?;

        match response {
            Response::Affected { records_affected } => {
                Ok(ExecuteResult::Affected(records_affected))
            }
            Response::ResultSet {
                result_set_id,
                has_rows,
                columns,
            } => Ok(ExecuteResult::Rows {
                result_set_id,
                has_rows,
                columns,
            }),
            Response::Error { error } => Err(error),
            other => Err(Self::unexpected(&other)),
        }
    }

    pub async fn cancel_statement(&mut self, statement_id: Handle) -> Result<(), DriverError> {
        let response = self
            .send_command(Command::CancelStatement { statement_id })
            .await?;
        Self::expect_ok(response)
    }

    pub async fn close_statement(&mut self, statement_id: Handle) -> Result<(), DriverError> {
        let response = self
            .send_command(Command::CloseStatement { statement_id })
            .await?;
        Self::expect_ok(response)
    }
}
