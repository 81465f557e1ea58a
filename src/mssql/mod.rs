//! SQL Server backend, the full-featured server engine.
//!
//! - `client`: connection string parsing and TCP setup
//! - `query`: parameter binding and result extraction
//! - `connection`: session wrapper and routine introspection

pub mod client;
pub mod connection;
pub mod query;

use async_trait::async_trait;

pub use client::{MssqlClient, create_mssql_client};
pub use connection::{MssqlConnection, RETURN_VALUE_PARAMETER};
pub use query::{bind_query_params, build_result_sets};

use crate::config::ConnectorOptions;
use crate::driver::{BackendConnection, Driver, text_command};
use crate::error::SqlConnectorError;
use crate::placeholders::PlaceholderStyle;
use crate::statement::{BackendCommand, RoutineKind, StatementDescriptor};
use crate::types::{CommandType, DatabaseType};

/// Driver for SQL Server over TDS.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDriver;

#[async_trait]
impl Driver for MssqlDriver {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Mssql
    }

    async fn connect(
        &self,
        options: &ConnectorOptions,
    ) -> Result<Box<dyn BackendConnection>, SqlConnectorError> {
        tracing::debug!("opening SQL Server connection");
        let conn = MssqlConnection::connect(&options.connection_string).await?;
        Ok(Box::new(conn))
    }

    fn create_command(
        &self,
        statement: &StatementDescriptor,
    ) -> Result<BackendCommand, SqlConnectorError> {
        match statement.command_type {
            CommandType::Text => Ok(text_command(statement, PlaceholderStyle::Mssql)),
            CommandType::StoredProcedure => Ok(routine_command(statement)),
        }
    }
}

/// `EXEC p @a = @P1, ...` for procedures, `SELECT * FROM f(@P1, ...)` for table-valued
/// functions, `SELECT dbo.f(@P1, ...)` for scalar functions.
///
/// The return slot is never sent.
fn routine_command(statement: &StatementDescriptor) -> BackendCommand {
    let params = statement.argument_values();
    let placeholders = || {
        (1..=params.len())
            .map(|i| PlaceholderStyle::Mssql.render(i))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let sql = match statement.routine_kind {
        Some(RoutineKind::Function) => {
            format!("SELECT * FROM {}({})", statement.command_text, placeholders())
        }
        // scalar functions must be called schema-qualified
        Some(RoutineKind::ScalarFunction) => {
            let name = if statement.command_text.contains('.') {
                statement.command_text.clone()
            } else {
                format!("dbo.{}", statement.command_text)
            };
            format!("SELECT {name}({}) AS [value]", placeholders())
        }
        Some(RoutineKind::Procedure) | None => {
            let assignments = statement
                .arguments()
                .enumerate()
                .map(|(i, p)| format!("{} = {}", p.name, PlaceholderStyle::Mssql.render(i + 1)))
                .collect::<Vec<_>>();
            if assignments.is_empty() {
                format!("EXEC {}", statement.command_text)
            } else {
                format!("EXEC {} {}", statement.command_text, assignments.join(", "))
            }
        }
    };
    BackendCommand { sql, params }
}
