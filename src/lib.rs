//! Provider-agnostic database access over SQL Server, Postgres, and `SQLite`.
//!
//! A [`Connector`] wraps one connection. Commands are literal SQL with `@name` markers or the
//! name of a stored routine; values are bound positionally and results come back as typed
//! records, dynamic records, JSON text, or tabular containers. [`BlockingConnector`] offers the
//! same operations without an async runtime.

pub mod blocking;
pub mod config;
pub mod connector;
pub mod driver;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod placeholders;
pub mod prelude;
pub mod preparer;
pub mod projector;
pub mod provider;
pub mod results;
pub mod statement;
pub mod tabular;
pub mod transaction;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use blocking::BlockingConnector;
pub use config::{ConnectorOptions, ConnectorOptionsBuilder};
pub use connector::{ConnectionState, Connector};
pub use error::SqlConnectorError;
pub use mapper::Entity;
pub use projector::{FromRecord, FromRowValue};
pub use provider::{ProviderCapabilities, ProviderRegistry};
pub use results::{ColumnInfo, DynamicRecord, ResultSet};
pub use tabular::{DataColumn, DataSet, DataTable};
pub use transaction::TransactionState;
pub use types::{CommandType, DatabaseType, RowValues};
