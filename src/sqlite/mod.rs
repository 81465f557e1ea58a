//! `SQLite` backend, the embedded engine.
//!
//! - `params`: `RowValues` to rusqlite value conversion
//! - `query`: result extraction
//! - `connection`: the blocking-pool connection wrapper

pub mod connection;
pub mod params;
pub mod query;

use async_trait::async_trait;

pub use connection::SqliteConnection;
pub use params::Params as SqliteParams;
pub use query::build_result_set;

use crate::config::ConnectorOptions;
use crate::driver::{BackendConnection, Driver, text_command};
use crate::error::SqlConnectorError;
use crate::placeholders::PlaceholderStyle;
use crate::statement::{BackendCommand, StatementDescriptor};
use crate::types::{CommandType, DatabaseType};

/// Driver for file or in-memory `SQLite` databases.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

#[async_trait]
impl Driver for SqliteDriver {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    async fn connect(
        &self,
        options: &ConnectorOptions,
    ) -> Result<Box<dyn BackendConnection>, SqlConnectorError> {
        tracing::debug!(path = %options.connection_string, wal = options.sqlite_wal, "opening sqlite database");
        let conn = SqliteConnection::open(&options.connection_string, options.sqlite_wal).await?;
        Ok(Box::new(conn))
    }

    fn create_command(
        &self,
        statement: &StatementDescriptor,
    ) -> Result<BackendCommand, SqlConnectorError> {
        match statement.command_type {
            CommandType::Text => Ok(text_command(statement, PlaceholderStyle::Sqlite)),
            CommandType::StoredProcedure => Err(SqlConnectorError::UnsupportedOperation(
                "sqlite cannot execute stored routines".into(),
            )),
        }
    }
}
