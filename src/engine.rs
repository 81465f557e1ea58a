//! Execution primitives over an open backend connection.
//!
//! Every primitive runs inside whatever transaction is active on the connection; the
//! `TransactionScope` is consulted only to refuse work on an orphaned transaction.

use crate::driver::BackendConnection;
use crate::error::SqlConnectorError;
use crate::results::ResultSet;
use crate::statement::BackendCommand;
use crate::tabular::{DataSet, DataTable};
use crate::transaction::TransactionScope;
use crate::types::RowValues;

/// Run a command and return the affected row count.
///
/// # Errors
/// Returns the driver's execution error unchanged.
pub async fn execute_non_query(
    conn: &mut dyn BackendConnection,
    tx: &TransactionScope,
    command: &BackendCommand,
) -> Result<usize, SqlConnectorError> {
    tx.ensure_usable()?;
    log_command("execute_non_query", tx, command);
    conn.execute(command).await
}

/// First column of the first row, or `None` when the result is empty.
///
/// # Errors
/// Returns the driver's execution error unchanged.
pub async fn execute_scalar(
    conn: &mut dyn BackendConnection,
    tx: &TransactionScope,
    command: &BackendCommand,
) -> Result<Option<RowValues>, SqlConnectorError> {
    let result_set = query(conn, tx, command).await?;
    Ok(result_set.scalar().cloned())
}

/// Run a command and materialize its rows.
///
/// # Errors
/// Returns the driver's execution error unchanged.
pub async fn query(
    conn: &mut dyn BackendConnection,
    tx: &TransactionScope,
    command: &BackendCommand,
) -> Result<ResultSet, SqlConnectorError> {
    tx.ensure_usable()?;
    log_command("query", tx, command);
    conn.query(command).await
}

/// Destination of a tabular fill.
pub enum TabularTarget<'a> {
    Set(&'a mut DataSet),
    Table(&'a mut DataTable),
}

/// Fill a data set (one table per result set) or a single table (first result set).
///
/// Schema is merged before rows are appended; both come from the same execution.
///
/// # Errors
/// Returns the driver's execution error unchanged.
pub async fn fill_tabular(
    conn: &mut dyn BackendConnection,
    tx: &TransactionScope,
    command: &BackendCommand,
    target: TabularTarget<'_>,
) -> Result<usize, SqlConnectorError> {
    tx.ensure_usable()?;
    log_command("fill_tabular", tx, command);
    match target {
        TabularTarget::Set(data_set) => {
            let result_sets = conn.query_multiple(command).await?;
            Ok(data_set.fill(&result_sets))
        }
        TabularTarget::Table(table) => {
            let result_set = conn.query(command).await?;
            table.fill_schema(result_set.columns());
            Ok(table.load(&result_set))
        }
    }
}

fn log_command(operation: &str, tx: &TransactionScope, command: &BackendCommand) {
    tracing::trace!(
        operation,
        in_transaction = tx.is_active(),
        params = command.params.len(),
        sql = %command.sql,
        "executing command"
    );
}
