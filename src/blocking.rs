//! Synchronous form of [`Connector`], for callers without an async runtime.

use tokio::runtime::{Builder, Runtime};

use crate::config::ConnectorOptions;
use crate::connector::{ConnectionState, Connector};
use crate::error::SqlConnectorError;
use crate::mapper::Entity;
use crate::projector::FromRecord;
use crate::results::DynamicRecord;
use crate::tabular::{DataSet, DataTable};
use crate::transaction::TransactionState;
use crate::types::{CommandType, DatabaseType, RowValues};

/// Blocking wrapper that drives a [`Connector`] on its own current-thread runtime.
///
/// Must not be used from inside an async context; the runtime would refuse to block.
///
/// ```rust,no_run
/// use sql_connector::prelude::*;
///
/// let mut db = BlockingConnector::new(DatabaseType::Sqlite, ":memory:")?;
/// let n = db.execute_scalar(CommandType::Text, "SELECT 1 AS n", &[])?;
/// assert_eq!(n, Some(RowValues::Int(1)));
/// # Ok::<(), SqlConnectorError>(())
/// ```
#[derive(Debug)]
pub struct BlockingConnector {
    // dropped before the runtime so backend tasks are still reachable
    inner: Connector,
    runtime: Runtime,
}

impl BlockingConnector {
    /// # Errors
    /// See [`Connector::new`]; also `ConfigError` if the runtime cannot be created.
    pub fn new(
        database_type: DatabaseType,
        connection_string: impl Into<String>,
    ) -> Result<Self, SqlConnectorError> {
        Self::from_connector(Connector::new(database_type, connection_string)?)
    }

    /// # Errors
    /// See [`BlockingConnector::new`].
    pub fn with_options(options: ConnectorOptions) -> Result<Self, SqlConnectorError> {
        Self::from_connector(Connector::with_options(options)?)
    }

    /// Wrap an existing (typically unopened) connector.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConfigError` if the runtime cannot be created.
    pub fn from_connector(inner: Connector) -> Result<Self, SqlConnectorError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SqlConnectorError::ConfigError(format!("failed to build runtime: {e}")))?;
        Ok(Self { inner, runtime })
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        self.inner.database_type()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    #[must_use]
    pub fn transaction_state(&self) -> TransactionState {
        self.inner.transaction_state()
    }

    /// # Errors
    /// See [`Connector::open`].
    pub fn open(&mut self) -> Result<(), SqlConnectorError> {
        self.runtime.block_on(self.inner.open())
    }

    /// # Errors
    /// See [`Connector::close`].
    pub fn close(&mut self) -> Result<(), SqlConnectorError> {
        self.runtime.block_on(self.inner.close())
    }

    /// # Errors
    /// See [`Connector::begin_transaction`].
    pub fn begin_transaction(&mut self) -> Result<(), SqlConnectorError> {
        self.runtime.block_on(self.inner.begin_transaction())
    }

    /// # Errors
    /// See [`Connector::commit`].
    pub fn commit(&mut self) -> Result<(), SqlConnectorError> {
        self.runtime.block_on(self.inner.commit())
    }

    /// # Errors
    /// See [`Connector::rollback`].
    pub fn rollback(&mut self) -> Result<(), SqlConnectorError> {
        self.runtime.block_on(self.inner.rollback())
    }

    /// # Errors
    /// See [`Connector::execute_non_query`].
    pub fn execute_non_query(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<usize, SqlConnectorError> {
        self.runtime
            .block_on(self.inner.execute_non_query(command_type, command_text, values))
    }

    /// # Errors
    /// See [`Connector::execute_scalar`].
    pub fn execute_scalar(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<Option<RowValues>, SqlConnectorError> {
        self.runtime
            .block_on(self.inner.execute_scalar(command_type, command_text, values))
    }

    /// # Errors
    /// See [`Connector::query`].
    pub fn query<T: FromRecord>(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<Vec<T>, SqlConnectorError> {
        self.runtime
            .block_on(self.inner.query(command_type, command_text, values))
    }

    /// # Errors
    /// See [`Connector::single`].
    pub fn single<T: FromRecord>(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<Option<T>, SqlConnectorError> {
        self.runtime
            .block_on(self.inner.single(command_type, command_text, values))
    }

    /// # Errors
    /// See [`Connector::query_dynamic`].
    pub fn query_dynamic(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<Vec<DynamicRecord>, SqlConnectorError> {
        self.runtime
            .block_on(self.inner.query_dynamic(command_type, command_text, values))
    }

    /// # Errors
    /// See [`Connector::single_dynamic`].
    pub fn single_dynamic(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<Option<DynamicRecord>, SqlConnectorError> {
        self.runtime
            .block_on(self.inner.single_dynamic(command_type, command_text, values))
    }

    /// # Errors
    /// See [`Connector::json_query`].
    pub fn json_query(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<String, SqlConnectorError> {
        self.runtime
            .block_on(self.inner.json_query(command_type, command_text, values))
    }

    /// # Errors
    /// See [`Connector::json_single`].
    pub fn json_single(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<String, SqlConnectorError> {
        self.runtime
            .block_on(self.inner.json_single(command_type, command_text, values))
    }

    /// # Errors
    /// See [`Connector::fill_data_set`].
    pub fn fill_data_set(
        &mut self,
        data_set: &mut DataSet,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<usize, SqlConnectorError> {
        self.runtime.block_on(
            self.inner
                .fill_data_set(data_set, command_type, command_text, values),
        )
    }

    /// # Errors
    /// See [`Connector::fill_data_table`].
    pub fn fill_data_table(
        &mut self,
        table: &mut DataTable,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<usize, SqlConnectorError> {
        self.runtime.block_on(
            self.inner
                .fill_data_table(table, command_type, command_text, values),
        )
    }

    /// # Errors
    /// See [`Connector::execute_data_set`].
    pub fn execute_data_set(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<DataSet, SqlConnectorError> {
        self.runtime
            .block_on(self.inner.execute_data_set(command_type, command_text, values))
    }

    /// # Errors
    /// See [`Connector::execute_data_table`].
    pub fn execute_data_table(
        &mut self,
        command_type: CommandType,
        command_text: &str,
        values: &[RowValues],
    ) -> Result<DataTable, SqlConnectorError> {
        self.runtime
            .block_on(self.inner.execute_data_table(command_type, command_text, values))
    }

    /// # Errors
    /// See [`Connector::insert`].
    pub fn insert<T: Entity>(&mut self, entity: &T) -> Result<usize, SqlConnectorError> {
        self.runtime.block_on(self.inner.insert(entity))
    }

    /// # Errors
    /// See [`Connector::update`].
    pub fn update<T: Entity>(&mut self, entity: &T) -> Result<usize, SqlConnectorError> {
        self.runtime.block_on(self.inner.update(entity))
    }

    /// # Errors
    /// See [`Connector::delete`].
    pub fn delete<T: Entity>(&mut self, entity: &T) -> Result<usize, SqlConnectorError> {
        self.runtime.block_on(self.inner.delete(entity))
    }
}
