//! Provider registry: which driver serves a backend, and what that backend can do.

use std::collections::HashMap;
use std::sync::Arc;

use crate::driver::{BackendConnection, Driver};
use crate::error::SqlConnectorError;
use crate::statement::RoutineSignature;
use crate::types::DatabaseType;

/// Backend-specific rules consulted by the command preparer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapabilities {
    /// The backend can introspect a stored routine's declared parameters.
    pub supports_routine_derivation: bool,
    /// Derived routine signatures carry an implicit return-value slot the caller may omit.
    pub implicit_return_parameter: bool,
}

impl DatabaseType {
    #[must_use]
    pub const fn capabilities(self) -> ProviderCapabilities {
        match self {
            DatabaseType::Mssql => ProviderCapabilities {
                supports_routine_derivation: true,
                implicit_return_parameter: true,
            },
            DatabaseType::Postgres => ProviderCapabilities {
                supports_routine_derivation: true,
                implicit_return_parameter: false,
            },
            DatabaseType::Sqlite => ProviderCapabilities {
                supports_routine_derivation: false,
                implicit_return_parameter: false,
            },
        }
    }
}

/// Maps each backend to its driver.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    drivers: HashMap<DatabaseType, Arc<dyn Driver>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("drivers", &self.drivers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    /// An empty registry; see [`ProviderRegistry::with_default_drivers`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every driver enabled in the current build.
    #[must_use]
    pub fn with_default_drivers() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "mssql")]
        registry.register(Arc::new(crate::mssql::MssqlDriver));
        #[cfg(feature = "postgres")]
        registry.register(Arc::new(crate::postgres::PostgresDriver));
        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(crate::sqlite::SqliteDriver));
        registry
    }

    /// Register (or replace) the driver for its database type.
    pub fn register(&mut self, driver: Arc<dyn Driver>) {
        self.drivers.insert(driver.database_type(), driver);
    }

    /// Look up the driver for `database_type`.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::Unimplemented` if no driver is registered for it.
    pub fn resolve_driver(
        &self,
        database_type: DatabaseType,
    ) -> Result<Arc<dyn Driver>, SqlConnectorError> {
        self.drivers.get(&database_type).cloned().ok_or_else(|| {
            SqlConnectorError::Unimplemented(format!(
                "no driver for {database_type} is enabled in the current build"
            ))
        })
    }
}

/// Ask the backend for a stored routine's declared parameters.
///
/// Backends without routine introspection are rejected before the connection is touched.
///
/// # Errors
/// Returns `SqlConnectorError::UnsupportedOperation` for backends without routine derivation,
/// or the driver's error if introspection fails.
pub async fn derive_parameters(
    database_type: DatabaseType,
    conn: &mut dyn BackendConnection,
    routine: &str,
) -> Result<RoutineSignature, SqlConnectorError> {
    ensure_routine_support(database_type, routine)?;
    conn.derive_parameters(routine).await
}

/// Reject stored-routine mode on backends that cannot introspect routines.
///
/// # Errors
/// Returns `SqlConnectorError::UnsupportedOperation` when `database_type` has no routine
/// derivation.
pub fn ensure_routine_support(
    database_type: DatabaseType,
    routine: &str,
) -> Result<(), SqlConnectorError> {
    if database_type.capabilities().supports_routine_derivation {
        return Ok(());
    }
    Err(SqlConnectorError::UnsupportedOperation(format!(
        "{database_type} has no stored routines; parameters cannot be derived for '{routine}'"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_table() {
        assert!(DatabaseType::Mssql.capabilities().implicit_return_parameter);
        assert!(!DatabaseType::Postgres.capabilities().implicit_return_parameter);
        assert!(DatabaseType::Postgres.capabilities().supports_routine_derivation);
        assert!(!DatabaseType::Sqlite.capabilities().supports_routine_derivation);
    }

    #[test]
    fn empty_registry_reports_unimplemented() {
        let registry = ProviderRegistry::new();
        assert!(matches!(
            registry.resolve_driver(DatabaseType::Sqlite),
            Err(SqlConnectorError::Unimplemented(_))
        ));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn default_registry_resolves_enabled_drivers() {
        let registry = ProviderRegistry::with_default_drivers();
        let driver = registry.resolve_driver(DatabaseType::Sqlite).unwrap();
        assert_eq!(driver.database_type(), DatabaseType::Sqlite);
    }
}
