use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::params_from_iter;
use tokio::sync::Mutex;

use super::params::Params;
use super::query::build_result_set;
use crate::driver::BackendConnection;
use crate::error::SqlConnectorError;
use crate::results::ResultSet;
use crate::statement::{BackendCommand, RoutineSignature};

pub(crate) type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// A single `SQLite` connection; rusqlite calls run on the blocking pool.
pub struct SqliteConnection {
    conn: Option<SharedSqliteConnection>,
}

impl SqliteConnection {
    /// Open the database at `path` (`:memory:` for a private in-memory database).
    ///
    /// # Errors
    /// Returns `SqlConnectorError::SqliteError` if the file cannot be opened or the WAL pragma
    /// fails.
    pub async fn open(path: &str, wal: bool) -> Result<Self, SqlConnectorError> {
        let path = path.to_string();
        let conn = tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&path)?;
            if wal {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            }
            Ok::<_, SqlConnectorError>(conn)
        })
        .await
        .map_err(|e| {
            SqlConnectorError::ConnectionError(format!("sqlite spawn_blocking join error: {e}"))
        })??;
        Ok(Self {
            conn: Some(Arc::new(Mutex::new(conn))),
        })
    }

    fn conn_handle(&self) -> Result<SharedSqliteConnection, SqlConnectorError> {
        self.conn
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| SqlConnectorError::ConnectionError("sqlite connection is closed".into()))
    }

    async fn execute_batch(&self, sql: &'static str) -> Result<(), SqlConnectorError> {
        run_blocking(self.conn_handle()?, move |conn| {
            conn.execute_batch(sql).map_err(SqlConnectorError::SqliteError)
        })
        .await
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("open", &self.conn.is_some())
            .finish()
    }
}

fn total_changes(conn: &rusqlite::Connection) -> Result<i64, SqlConnectorError> {
    Ok(conn.query_row("SELECT total_changes()", [], |row| row.get(0))?)
}

pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlConnectorError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlConnectorError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| {
        SqlConnectorError::ExecutionError(format!("sqlite spawn_blocking join error: {e}"))
    })?
}

#[async_trait]
impl BackendConnection for SqliteConnection {
    async fn begin(&mut self) -> Result<(), SqlConnectorError> {
        self.execute_batch("BEGIN").await
    }

    async fn commit(&mut self) -> Result<(), SqlConnectorError> {
        self.execute_batch("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), SqlConnectorError> {
        self.execute_batch("ROLLBACK").await
    }

    async fn execute(&mut self, command: &BackendCommand) -> Result<usize, SqlConnectorError> {
        let sql = command.sql.clone();
        let params = Params::convert(&command.params);
        run_blocking(self.conn_handle()?, move |conn| {
            let before = total_changes(conn)?;
            if params.is_empty() {
                // parameterless commands may hold several statements
                conn.execute_batch(&sql)?;
            } else {
                let mut stmt = conn.prepare(&sql)?;
                if stmt.column_count() > 0 {
                    let mut rows = stmt.query(params_from_iter(params.as_values().iter()))?;
                    while rows.next()?.is_some() {}
                } else {
                    stmt.execute(params_from_iter(params.as_values().iter()))?;
                }
            }
            // changes() is stale after DDL and SELECT
            let after = total_changes(conn)?;
            usize::try_from(after.saturating_sub(before)).map_err(|e| {
                SqlConnectorError::ExecutionError(format!("sqlite affected row count overflow: {e}"))
            })
        })
        .await
    }

    async fn query(&mut self, command: &BackendCommand) -> Result<ResultSet, SqlConnectorError> {
        let sql = command.sql.clone();
        let params = Params::convert(&command.params);
        run_blocking(self.conn_handle()?, move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            build_result_set(&mut stmt, params.as_values())
        })
        .await
    }

    async fn derive_parameters(
        &mut self,
        routine: &str,
    ) -> Result<RoutineSignature, SqlConnectorError> {
        Err(SqlConnectorError::UnsupportedOperation(format!(
            "sqlite has no stored routines; cannot derive parameters for '{routine}'"
        )))
    }

    async fn close(&mut self) -> Result<(), SqlConnectorError> {
        if let Some(handle) = self.conn.take() {
            // the last handle drops on the blocking pool, where sqlite3_close may wait on I/O
            run_blocking(handle, |_| Ok(())).await?;
            tracing::debug!("sqlite connection closed");
        }
        Ok(())
    }
}
