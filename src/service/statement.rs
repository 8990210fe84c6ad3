//! Statement execution protocol
//!
//! Drives a statement handle through prepare/create → bind → execute →
//! cancel → close. Every operation is a short sequence of registry lookups
//! and native calls; nothing is remembered between calls except what the
//! registry holds.

use super::connection::ConnectionResolver;
use crate::cursor::ResultCursor;
use crate::error::{BridgeError, BridgeResult};
use crate::marshal::to_param_value;
use crate::native::StatementControl;
use crate::registry::{ObjectRegistry, StatementEntry};
use sqlbridge_client::protocol::{
    ColumnDescriptor, Handle, ParameterType, Response, FETCH_SIZE_DEFAULT,
};
use std::sync::Arc;

/// Classified result of an execution
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutcome {
    /// No result set was produced
    Affected { records_affected: i64 },
    /// A result cursor was opened and registered
    Rows {
        result_set_id: Handle,
        has_rows: bool,
        columns: Vec<ColumnDescriptor>,
    },
}

impl From<ExecuteOutcome> for Response {
    fn from(outcome: ExecuteOutcome) -> Self {
        match outcome {
            ExecuteOutcome::Affected { records_affected } => {
                Response::Affected { records_affected }
            }
            ExecuteOutcome::Rows {
                result_set_id,
                has_rows,
                columns,
            } => Response::ResultSet {
                result_set_id,
                has_rows,
                columns,
            },
        }
    }
}

fn apply_fetch_size(control: &dyn StatementControl, requested: i32) -> BridgeResult<()> {
    let fetch_size = if requested == FETCH_SIZE_DEFAULT {
        control.max_rows()
    } else {
        requested
    };
    control.set_fetch_size(fetch_size)?;
    Ok(())
}

pub struct StatementService {
    registry: Arc<ObjectRegistry>,
    connections: Arc<dyn ConnectionResolver>,
}

impl StatementService {
    pub fn new(registry: Arc<ObjectRegistry>, connections: Arc<dyn ConnectionResolver>) -> Self {
        Self {
            registry,
            connections,
        }
    }

    pub fn prepare_statement(&self, connection_id: Handle, sql: &str) -> BridgeResult<Handle> {
        let connection = self.connections.get_connection(connection_id)?;
        let statement = connection.prepare_statement(sql)?;

        let handle = self.registry.statements().put(StatementEntry::Prepared {
            connection_id,
            sql: sql.to_string(),
            statement,
        });
        tracing::debug!("Prepared statement {} on connection {}", handle, connection_id);
        Ok(handle)
    }

    pub fn create_statement(&self, connection_id: Handle) -> BridgeResult<Handle> {
        let connection = self.connections.get_connection(connection_id)?;
        let statement = connection.create_statement()?;

        let handle = self.registry.statements().put(StatementEntry::Plain {
            connection_id,
            statement,
        });
        tracing::debug!("Created statement {} on connection {}", handle, connection_id);
        Ok(handle)
    }

    /// Bind `value` converted to `parameter_type` at the 1-based `index`
    pub fn set_parameter(
        &self,
        statement_id: Handle,
        index: u32,
        parameter_type: ParameterType,
        value: &str,
    ) -> BridgeResult<()> {
        let entry = self.registry.statements().get(statement_id)?;
        let statement = match entry.as_ref() {
            StatementEntry::Prepared { statement, .. } => statement,
            StatementEntry::Plain { .. } => {
                return Err(BridgeError::invalid_operation(format!(
                    "statement {} must be prepared to bind parameters",
                    statement_id
                )))
            }
        };

        let param = to_param_value(index, parameter_type, value)?;
        statement.bind(index, param)?;
        Ok(())
    }

    /// Execute the statement and register a result cursor if rows were produced.
    ///
    /// A `fetch_size` of -1 applies the statement's max rows as fetch size;
    /// any other value is passed to the driver as is. Prepared statements
    /// ignore `sql`; plain statements require it.
    pub fn execute_statement(
        &self,
        statement_id: Handle,
        fetch_size: i32,
        sql: Option<&str>,
    ) -> BridgeResult<ExecuteOutcome> {
        let entry = self.registry.statements().get(statement_id)?;
        let control = entry.control();

        let produced_rows = match entry.as_ref() {
            StatementEntry::Prepared {
                statement,
                sql: prepared_sql,
                ..
            } => {
                if sql.is_some() {
                    tracing::debug!("Ignoring sql for prepared statement {}", statement_id);
                }
                tracing::debug!("Executing statement {}: {}", statement_id, prepared_sql);
                apply_fetch_size(control, fetch_size)?;
                statement.execute()?
            }
            StatementEntry::Plain { statement, .. } => {
                let sql = sql.ok_or_else(|| {
                    BridgeError::invalid_operation(format!(
                        "sql is required to execute plain statement {}",
                        statement_id
                    ))
                })?;
                apply_fetch_size(control, fetch_size)?;
                statement.execute(sql)?
            }
        };

        if !produced_rows {
            let records_affected = control.update_count();
            tracing::debug!("Statement {} affected {} rows", statement_id, records_affected);
            return Ok(ExecuteOutcome::Affected { records_affected });
        }

        let result_set = control.take_result_set().ok_or_else(|| {
            BridgeError::Internal(format!(
                "statement {} reported a result set but none was available",
                statement_id
            ))
        })?;
        let cursor = ResultCursor::open(statement_id, result_set)?;
        let has_rows = cursor.has_rows();
        let columns = cursor.columns().to_vec();
        let result_set_id = self.registry.result_sets().put(cursor);

        tracing::debug!(
            "Statement {} opened result set {} ({} columns, has_rows={})",
            statement_id,
            result_set_id,
            columns.len(),
            has_rows
        );
        Ok(ExecuteOutcome::Rows {
            result_set_id,
            has_rows,
            columns,
        })
    }

    /// Ask the driver to abort whatever is running on the statement
    pub fn cancel_statement(&self, statement_id: Handle) -> BridgeResult<()> {
        let entry = self.registry.statements().get(statement_id)?;
        entry.control().cancel()?;
        tracing::debug!("Cancel requested for statement {}", statement_id);
        Ok(())
    }

    /// Close the native statement, then drop its handle.
    ///
    /// The handle is removed even when the native close fails; the failure is
    /// reported afterwards.
    pub fn close_statement(&self, statement_id: Handle) -> BridgeResult<()> {
        let entry = self.registry.statements().get(statement_id)?;
        let closed = entry.control().close();
        self.registry.statements().remove(statement_id)?;

        if let Err(e) = closed {
            tracing::warn!(
                "Statement {} of connection {} closed with error: {}",
                statement_id,
                entry.connection_id(),
                e
            );
            return Err(BridgeError::Execution(e));
        }
        tracing::debug!(
            "Closed statement {} of connection {}",
            statement_id,
            entry.connection_id()
        );
        Ok(())
    }
}
