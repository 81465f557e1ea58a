//! The async access-layer façade.

use std::fmt;
use std::sync::Arc;

use crate::config::ConnectorOptions;
use crate::driver::{BackendConnection, Driver};
use crate::engine::{self, TabularTarget};
use crate::error::SqlConnectorError;
use crate::mapper::{self, Entity, MappedCommand};
use crate::preparer;
use crate::projector::{self, FromRecord};
use crate::provider::{self, ProviderRegistry};
use crate::results::{DynamicRecord, ResultSet};
use crate::statement::BackendCommand;
use crate::tabular::{DataSet, DataTable};
use crate::transaction::{TransactionScope, TransactionState};
use crate::types::{CommandType, DatabaseType, RowValues};

/// Lifecycle of a connector's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unopened,
    Open,
    /// Closed explicitly; the next operation opens a fresh connection.
    Closed,
}

/// One connection to one backend, plus at most one transaction on it.
///
/// Every operation opens the connection on first use. Commands run in the active transaction
/// when there is one. Dropping the connector drops the connection, and the backend rolls back
/// any transaction left open.
///
/// ```rust,no_run
/// use sql_connector::prelude::*;
///
/// # async fn demo() -> Result<(), SqlConnectorError> {
/// let mut db = Connector::new(DatabaseType::Sqlite, ":memory:")?;
/// db.execute_non_query(CommandType::Text, "CREATE TABLE t (id INTEGER, name TEXT)", &[]).await?;
/// db.execute_non_query(
///     CommandType::Text,
///     "INSERT INTO t (id, name) VALUES (@id, @name)",
///     &[RowValues::Int(1), RowValues::Text("alice".into())],
/// )
/// .await?;
/// let json = db.json_query(CommandType::Text, "SELECT * FROM t", &[]).await?;
/// assert_eq!(json, r#"[{"id":1,"name":"alice"}]"#);
/// # Ok(())
/// # }
/// ```
pub struct Connector {
    options: ConnectorOptions,
    driver: Arc<dyn Driver>,
    connection: Option<Box<dyn BackendConnection>>,
    transaction: TransactionScope,
    state: ConnectionState,
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("database_type", &self.options.database_type)
            .field("state", &self.state)
            .field("transaction", &self.transaction.state())
            .finish_non_exhaustive()
    }
}

impl Connector {
    /// Connector for `database_type` using the drivers compiled into this build.
    ///
    /// No connection is made until the first operation.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConfigError` for an empty connection string or
    /// `SqlConnectorError::Unimplemented` if the backend's feature is disabled.
    pub fn new(
        database_type: DatabaseType,
        connection_string: impl Into<String>,
    ) -> Result<Self, SqlConnectorError> {
        Self::with_options(ConnectorOptions::new(database_type, connection_string))
    }

    /// # Errors
    /// See [`Connector::new`].
    pub fn with_options(options: ConnectorOptions) -> Result<Self, SqlConnectorError> {
        Self::with_registry(options, &ProviderRegistry::with_default_drivers())
    }

    /// Connector resolving its driver from `registry`.
    ///
    /// # Errors
    /// See [`Connector::new`].
    pub fn with_registry(
        options: ConnectorOptions,
        registry: &ProviderRegistry,
    ) -> Result<Self, SqlConnectorError> {
        options.validate()?;
        let driver = registry.resolve_driver(options.database_type)?;
        Ok(Self {
            options,
            driver,
            connection: None,
            transaction: TransactionScope::new(),
            state: ConnectionState::Unopened,
        })
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        self.options.database_type
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn transaction_state(&self) -> TransactionState {
        self.transaction.state()
    }

    /// Open the connection if it is not open already.
    ///
    /// # Errors
    /// Returns the driver's connection error.
    pub async fn open(&mut self) -> Result<(), SqlConnectorError> {
        if self.connection.is_none() {
            let conn = self.driver.connect(&self.options).await?;
            self.connection = Some(conn);
            self.state = ConnectionState::Open;
            tracing::debug!(database_type = %self.options.database_type, "connection opened");
        }
        Ok(())
    }

    /// Close the connection. Closing twice, or before opening, is a no-op.
    ///
    /// A transaction still active is rolled back by the backend; the connector then refuses
    /// new commands until `commit` or `rollback` acknowledges the loss.
    ///
    /// # Errors
    /// Returns the driver's error if shutdown fails; the connection is released regardless.
    pub async fn close(&mut self) -> Result<(), SqlConnectorError> {
        let Some(mut conn) = self.connection.take() else {
            return Ok(());
        };
        self.state = ConnectionState::Closed;
        self.transaction.connection_closed();
        tracing::debug!(database_type = %self.options.database_type, "closing connection");
        conn.close().await
    }

    /// Start a transaction, opening the connection first if needed. A no-op while one is
    /// already active.
    ///
    /// # Errors
    /// Returns the driver's error if the connection cannot be opened or BEGIN fails.
    pub async fn begin_transaction(&mut self) -> Result<(), SqlConnectorError> {
        self.open().await?;
        let conn = connection_mut(&mut self.connection)?;
        self.transaction.begin(conn).await?;
        Ok(())
    }

    /// Commit the active transaction; a no-op when there is none.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConnectionError` if the connection was closed while the
    /// transaction was active, or the driver's commit error.
    pub async fn commit(&mut self) -> Result<(), SqlConnectorError> {
        self.transaction
            .commit(connection_mut(&mut self.connection).ok())
            .await
    }

    /// Roll back the active transaction; a no-op when there is none.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConnectionError` if the connection was closed while the
    /// transaction was active, or the driver's rollback error.
    pub async fn rollback(&mut self) -> Result<(), SqlConnectorError> {
        self.transaction
            .rollback(connection_mut(&mut self.connection).ok())
            .await
    }

    /// Run a command and return the number of affected rows.
    ///
    /// # Errors
    /// Returns preparation errors (`ArityMismatch`, `UnsupportedOperation`) before anything
    /// runs, otherwise the driver's error.
    pub async fn execute_non_query(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<usize, SqlConnectorError> {
        let command = self
            .prepare_command(command_type, command_text, values)
            .await?;
        let conn = connection_mut(&mut self.connection)?;
        engine::execute_non_query(conn, &self.transaction, &command).await
    }

    /// First column of the first row, or `None` for an empty result.
    ///
    /// # Errors
    /// See [`Connector::execute_non_query`].
    pub async fn execute_scalar(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<Option<RowValues>, SqlConnectorError> {
        let command = self
            .prepare_command(command_type, command_text, values)
            .await?;
        let conn = connection_mut(&mut self.connection)?;
        engine::execute_scalar(conn, &self.transaction, &command).await
    }

    /// Every row projected onto `T` by column name.
    ///
    /// # Errors
    /// See [`Connector::execute_non_query`]; also `ConversionError` when a column cannot be
    /// coerced into its field.
    pub async fn query<T: FromRecord>(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<Vec<T>, SqlConnectorError> {
        let result_set = self.run_query(command_type, command_text, values).await?;
        projector::to_typed(&result_set)
    }

    /// The first row projected onto `T`, or `None` for an empty result.
    ///
    /// Extra rows are ignored.
    ///
    /// # Errors
    /// See [`Connector::query`].
    pub async fn single<T: FromRecord>(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<Option<T>, SqlConnectorError> {
        let result_set = self.run_query(command_type, command_text, values).await?;
        projector::to_typed_single(&result_set)
    }

    /// # Errors
    /// See [`Connector::execute_non_query`].
    pub async fn query_dynamic(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<Vec<DynamicRecord>, SqlConnectorError> {
        let result_set = self.run_query(command_type, command_text, values).await?;
        Ok(projector::to_dynamic(result_set))
    }

    /// # Errors
    /// See [`Connector::execute_non_query`].
    pub async fn single_dynamic(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<Option<DynamicRecord>, SqlConnectorError> {
        let result_set = self.run_query(command_type, command_text, values).await?;
        Ok(projector::to_dynamic(result_set).into_iter().next())
    }

    /// Rows as a JSON array of objects; the empty string when there are no rows.
    ///
    /// # Errors
    /// See [`Connector::execute_non_query`].
    pub async fn json_query(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<String, SqlConnectorError> {
        let result_set = self.run_query(command_type, command_text, values).await?;
        projector::to_json(&result_set)
    }

    /// The first row as a JSON object; the empty string when there are no rows.
    ///
    /// # Errors
    /// See [`Connector::execute_non_query`].
    pub async fn json_single(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<String, SqlConnectorError> {
        let result_set = self.run_query(command_type, command_text, values).await?;
        projector::to_json_single(&result_set)
    }

    /// Fill `data_set` with one table per result set. Returns the number of rows added.
    ///
    /// # Errors
    /// See [`Connector::execute_non_query`].
    pub async fn fill_data_set(
        &mut self,
        data_set: &mut DataSet,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<usize, SqlConnectorError> {
        self.fill(TabularTarget::Set(data_set), command_type, command_text, values)
            .await
    }

    /// Fill `table` from the first result set. Returns the number of rows added.
    ///
    /// # Errors
    /// See [`Connector::execute_non_query`].
    pub async fn fill_data_table(
        &mut self,
        table: &mut DataTable,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<usize, SqlConnectorError> {
        self.fill(TabularTarget::Table(table), command_type, command_text, values)
            .await
    }

    /// # Errors
    /// See [`Connector::execute_non_query`].
    pub async fn execute_data_set(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<DataSet, SqlConnectorError> {
        let mut data_set = DataSet::new();
        self.fill_data_set(&mut data_set, command_type, command_text, values)
            .await?;
        Ok(data_set)
    }

    /// # Errors
    /// See [`Connector::execute_non_query`].
    pub async fn execute_data_table(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<DataTable, SqlConnectorError> {
        let mut table = DataTable::new("Table");
        self.fill_data_table(&mut table, command_type, command_text, values)
            .await?;
        Ok(table)
    }

    /// Insert `entity` as a new row of its table.
    ///
    /// # Errors
    /// Returns `ConfigError` for an entity with no fields, otherwise see
    /// [`Connector::execute_non_query`].
    pub async fn insert<T: Entity>(&mut self, entity: &T) -> Result<usize, SqlConnectorError> {
        self.run_mapped(mapper::insert_command(entity)?).await
    }

    /// Update the row matching `entity`'s key columns.
    ///
    /// # Errors
    /// Returns `ConfigError` if the key columns are not mapped, otherwise see
    /// [`Connector::execute_non_query`].
    pub async fn update<T: Entity>(&mut self, entity: &T) -> Result<usize, SqlConnectorError> {
        self.run_mapped(mapper::update_command(entity)?).await
    }

    /// Delete the row matching `entity`'s key columns.
    ///
    /// # Errors
    /// Returns `ConfigError` if the key columns are not mapped, otherwise see
    /// [`Connector::execute_non_query`].
    pub async fn delete<T: Entity>(&mut self, entity: &T) -> Result<usize, SqlConnectorError> {
        self.run_mapped(mapper::delete_command(entity)?).await
    }

    /// Check the transaction, prepare, render, then open. Nothing runs on failure.
    ///
    /// Text commands are checked without touching the connection; stored routines open it
    /// first for introspection.
    async fn prepare_command(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<BackendCommand, SqlConnectorError> {
        self.transaction.ensure_usable()?;
        let database_type = self.options.database_type;
        let statement = match command_type {
            CommandType::Text => preparer::prepare_text(database_type, command_text, values)?,
            CommandType::StoredProcedure => {
                provider::ensure_routine_support(database_type, command_text)?;
                self.open().await?;
                let conn = connection_mut(&mut self.connection)?;
                preparer::prepare_routine(database_type, conn, command_text, values).await?
            }
        };
        let command = self.driver.create_command(&statement)?;
        self.open().await?;
        Ok(command)
    }

    async fn run_query(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<ResultSet, SqlConnectorError> {
        let command = self
            .prepare_command(command_type, command_text, values)
            .await?;
        let conn = connection_mut(&mut self.connection)?;
        engine::query(conn, &self.transaction, &command).await
    }

    async fn fill(
        &mut self,
        target: TabularTarget<'_>,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<usize, SqlConnectorError> {
        let command = self
            .prepare_command(command_type, command_text, values)
            .await?;
        let conn = connection_mut(&mut self.connection)?;
        engine::fill_tabular(conn, &self.transaction, &command, target).await
    }

    async fn run_mapped(&mut self, mapped: MappedCommand) -> Result<usize, SqlConnectorError> {
        self.execute_non_query(CommandType::Text, &mapped.sql, &mapped.values)
            .await
    }
}

fn connection_mut(
    connection: &mut Option<Box<dyn BackendConnection>>,
) -> Result<&mut dyn BackendConnection, SqlConnectorError> {
    match connection.as_deref_mut() {
        Some(conn) => Ok(conn),
        None => Err(not_open()),
    }
}

fn not_open() -> SqlConnectorError {
    SqlConnectorError::ConnectionError("connection is not open".into())
}
