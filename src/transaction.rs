use crate::driver::BackendConnection;
use crate::error::SqlConnectorError;

/// Transaction state of a connector's single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Inactive,
    Active,
    /// The connection closed while a transaction was active; the backend rolled it back.
    Orphaned,
}

/// At most one transaction per connection; nested begins flatten into the outer one.
#[derive(Debug, Default)]
pub struct TransactionScope {
    state: TransactionState,
}

impl TransactionScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Start a transaction unless one is already active.
    ///
    /// Returns `true` when a new backend transaction was started.
    ///
    /// # Errors
    /// Returns the driver's error if BEGIN fails; the scope stays inactive.
    pub async fn begin(
        &mut self,
        conn: &mut dyn BackendConnection,
    ) -> Result<bool, SqlConnectorError> {
        if self.is_active() {
            tracing::debug!("transaction already active; begin is a no-op");
            return Ok(false);
        }
        conn.begin().await?;
        self.state = TransactionState::Active;
        tracing::debug!("transaction started");
        Ok(true)
    }

    /// Commit the active transaction, if any.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConnectionError` if the transaction was orphaned by a close,
    /// or the driver's commit error. The scope is cleared either way.
    pub async fn commit(
        &mut self,
        conn: Option<&mut dyn BackendConnection>,
    ) -> Result<(), SqlConnectorError> {
        self.finish(conn, true).await
    }

    /// Roll back the active transaction, if any.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConnectionError` if the transaction was orphaned by a close,
    /// or the driver's rollback error. The scope is cleared either way.
    pub async fn rollback(
        &mut self,
        conn: Option<&mut dyn BackendConnection>,
    ) -> Result<(), SqlConnectorError> {
        self.finish(conn, false).await
    }

    /// Fail fast when statements would run outside the transaction the caller believes is open.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ExecutionError` while the scope is orphaned.
    pub fn ensure_usable(&self) -> Result<(), SqlConnectorError> {
        if self.state == TransactionState::Orphaned {
            return Err(SqlConnectorError::ExecutionError(
                "transaction was rolled back when its connection closed; commit or roll back before issuing new commands"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Record that the owning connection closed.
    pub(crate) fn connection_closed(&mut self) {
        if self.is_active() {
            tracing::debug!("connection closed with an active transaction");
            self.state = TransactionState::Orphaned;
        }
    }

    async fn finish(
        &mut self,
        conn: Option<&mut dyn BackendConnection>,
        commit: bool,
    ) -> Result<(), SqlConnectorError> {
        let verb = if commit { "commit" } else { "rollback" };
        match (self.state, conn) {
            (TransactionState::Inactive, _) => {
                tracing::debug!("no active transaction; {verb} is a no-op");
                Ok(())
            }
            (TransactionState::Active, Some(conn)) => {
                self.state = TransactionState::Inactive;
                if commit {
                    conn.commit().await?;
                } else {
                    conn.rollback().await?;
                }
                tracing::debug!("transaction {verb} complete");
                Ok(())
            }
            (TransactionState::Active | TransactionState::Orphaned, _) => {
                self.state = TransactionState::Inactive;
                Err(SqlConnectorError::ConnectionError(format!(
                    "cannot {verb}: the transaction's connection is closed"
                )))
            }
        }
    }
}
