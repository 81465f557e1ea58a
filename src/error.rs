use thiserror::Error;

/// Errors from preparing, running, or projecting a command.
#[derive(Debug, Error)]
pub enum SqlConnectorError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "mssql")]
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    /// The number of supplied values does not match the derived parameter set.
    #[error("Parameter count mismatch: command expects {expected} value(s), {supplied} supplied")]
    ArityMismatch { expected: usize, supplied: usize },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Value conversion error: {0}")]
    ConversionError(String),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),
}
