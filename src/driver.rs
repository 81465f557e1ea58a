//! Backend driver contract.
//!
//! One [`Driver`] exists per [`DatabaseType`]. It opens connections and renders prepared
//! statements into backend commands; the [`BackendConnection`] it returns executes them.

use async_trait::async_trait;

use crate::config::ConnectorOptions;
use crate::error::SqlConnectorError;
use crate::placeholders::{PlaceholderStyle, rewrite_placeholders};
use crate::results::ResultSet;
use crate::statement::{BackendCommand, RoutineSignature, StatementDescriptor};
use crate::types::DatabaseType;

/// Connection and command factory for one backend.
#[async_trait]
pub trait Driver: Send + Sync {
    fn database_type(&self) -> DatabaseType;

    /// Open a new connection described by `options`.
    ///
    /// # Errors
    /// Returns the driver's error if the connection string is invalid or the backend is unreachable.
    async fn connect(
        &self,
        options: &ConnectorOptions,
    ) -> Result<Box<dyn BackendConnection>, SqlConnectorError>;

    /// Render a bound statement into SQL the backend accepts, with values in placeholder order.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::UnsupportedOperation` when the backend cannot run the
    /// statement's command type.
    fn create_command(
        &self,
        statement: &StatementDescriptor,
    ) -> Result<BackendCommand, SqlConnectorError>;
}

/// A live connection to one backend.
///
/// Transactions are connection-scoped: after `begin`, every command on the connection runs in
/// the transaction until `commit` or `rollback`.
#[async_trait]
pub trait BackendConnection: Send {
    /// # Errors
    /// Returns the driver's error if the transaction cannot be started.
    async fn begin(&mut self) -> Result<(), SqlConnectorError>;

    /// # Errors
    /// Returns the driver's error if the commit fails.
    async fn commit(&mut self) -> Result<(), SqlConnectorError>;

    /// # Errors
    /// Returns the driver's error if the rollback fails.
    async fn rollback(&mut self) -> Result<(), SqlConnectorError>;

    /// Execute a command and return the affected row count.
    ///
    /// # Errors
    /// Returns the driver's error if execution fails.
    async fn execute(&mut self, command: &BackendCommand) -> Result<usize, SqlConnectorError>;

    /// Execute a command and materialize its first result set, schema included.
    ///
    /// # Errors
    /// Returns the driver's error if execution or row extraction fails.
    async fn query(&mut self, command: &BackendCommand) -> Result<ResultSet, SqlConnectorError>;

    /// Execute a command and materialize every result set it produces.
    ///
    /// # Errors
    /// Returns the driver's error if execution or row extraction fails.
    async fn query_multiple(
        &mut self,
        command: &BackendCommand,
    ) -> Result<Vec<ResultSet>, SqlConnectorError> {
        Ok(vec![self.query(command).await?])
    }

    /// Introspect the declared signature of a stored routine.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::UnsupportedOperation` on backends without stored routines,
    /// or the driver's error if the routine cannot be found.
    async fn derive_parameters(
        &mut self,
        routine: &str,
    ) -> Result<RoutineSignature, SqlConnectorError>;

    /// Close the connection. Calling it twice is a no-op.
    ///
    /// # Errors
    /// Returns the driver's error if the backend reports a failure while shutting down.
    async fn close(&mut self) -> Result<(), SqlConnectorError>;
}

/// Render a text statement: markers become `style` placeholders, values follow in order.
#[must_use]
pub fn text_command(statement: &StatementDescriptor, style: PlaceholderStyle) -> BackendCommand {
    BackendCommand {
        sql: rewrite_placeholders(&statement.command_text, style).into_owned(),
        params: statement.argument_values(),
    }
}
