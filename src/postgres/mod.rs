//! Postgres backend, the lightweight server engine.
//!
//! - `params`: `RowValues` as `ToSql`
//! - `query`: result extraction
//! - `wire`: NUMERIC and UUID binary forms
//! - `connection`: client wrapper and routine introspection

pub mod connection;
pub mod params;
pub mod query;
pub mod wire;

use async_trait::async_trait;

pub use connection::PostgresConnection;
pub use params::Params as PostgresParams;
pub use query::build_result_set_from_statement;

use crate::config::ConnectorOptions;
use crate::driver::{BackendConnection, Driver, text_command};
use crate::error::SqlConnectorError;
use crate::placeholders::PlaceholderStyle;
use crate::statement::{BackendCommand, RoutineKind, StatementDescriptor};
use crate::types::{CommandType, DatabaseType};

/// Driver for Postgres servers, connected without TLS.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDriver;

#[async_trait]
impl Driver for PostgresDriver {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    async fn connect(
        &self,
        options: &ConnectorOptions,
    ) -> Result<Box<dyn BackendConnection>, SqlConnectorError> {
        tracing::debug!("opening postgres connection");
        let conn = PostgresConnection::connect(&options.connection_string).await?;
        Ok(Box::new(conn))
    }

    fn create_command(
        &self,
        statement: &StatementDescriptor,
    ) -> Result<BackendCommand, SqlConnectorError> {
        match statement.command_type {
            CommandType::Text => Ok(text_command(statement, PlaceholderStyle::Postgres)),
            CommandType::StoredProcedure => Ok(routine_command(statement)),
        }
    }
}

/// `SELECT * FROM f($1, ...)` for functions, `CALL p($1, ...)` for procedures.
fn routine_command(statement: &StatementDescriptor) -> BackendCommand {
    let params = statement.argument_values();
    let placeholders = (1..=params.len())
        .map(|i| PlaceholderStyle::Postgres.render(i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = match statement.routine_kind {
        Some(RoutineKind::Procedure) => format!("CALL {}({placeholders})", statement.command_text),
        _ => format!("SELECT * FROM {}({placeholders})", statement.command_text),
    };
    BackendCommand { sql, params }
}
