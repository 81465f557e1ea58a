use crate::error::SqlConnectorError;
use crate::types::DatabaseType;

/// Options for opening a connector.
///
/// `connection_string` is passed to the selected driver in its native format: an ADO.NET
/// string for SQL Server, a libpq string or URL for Postgres, a file path (or `:memory:`) for
/// `SQLite`.
#[derive(Debug, Clone)]
pub struct ConnectorOptions {
    pub database_type: DatabaseType,
    pub connection_string: String,
    /// Switch `SQLite` databases to WAL journaling on open.
    pub sqlite_wal: bool,
}

impl ConnectorOptions {
    #[must_use]
    pub fn new(database_type: DatabaseType, connection_string: impl Into<String>) -> Self {
        Self {
            database_type,
            connection_string: connection_string.into(),
            sqlite_wal: false,
        }
    }

    #[must_use]
    pub fn with_sqlite_wal(mut self, sqlite_wal: bool) -> Self {
        self.sqlite_wal = sqlite_wal;
        self
    }

    /// Check the options before any connection attempt.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConfigError` if the connection string is empty.
    pub fn validate(&self) -> Result<(), SqlConnectorError> {
        if self.connection_string.trim().is_empty() {
            return Err(SqlConnectorError::ConfigError(
                "connection string is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for connector options.
///
/// ```rust
/// use sql_connector::prelude::*;
///
/// let opts = ConnectorOptionsBuilder::new(DatabaseType::Sqlite, ":memory:")
///     .sqlite_wal(false)
///     .finish();
/// assert_eq!(opts.database_type, DatabaseType::Sqlite);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectorOptionsBuilder {
    opts: ConnectorOptions,
}

impl ConnectorOptionsBuilder {
    #[must_use]
    pub fn new(database_type: DatabaseType, connection_string: impl Into<String>) -> Self {
        Self {
            opts: ConnectorOptions::new(database_type, connection_string),
        }
    }

    #[must_use]
    pub fn sqlite_wal(mut self, sqlite_wal: bool) -> Self {
        self.opts.sqlite_wal = sqlite_wal;
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectorOptions {
        self.opts
    }

    /// Build a [`Connector`](crate::Connector) with the default driver registry.
    ///
    /// # Errors
    /// Returns `SqlConnectorError` if the options are invalid or the backend is not compiled in.
    pub fn build(self) -> Result<crate::Connector, SqlConnectorError> {
        crate::Connector::with_options(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_connection_string_is_rejected() {
        let opts = ConnectorOptions::new(DatabaseType::Postgres, "  ");
        assert!(matches!(
            opts.validate(),
            Err(SqlConnectorError::ConfigError(_))
        ));
    }
}
