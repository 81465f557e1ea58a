//! Convenient imports for common functionality.

pub use crate::blocking::BlockingConnector;
pub use crate::config::{ConnectorOptions, ConnectorOptionsBuilder};
pub use crate::connector::{ConnectionState, Connector};
pub use crate::error::SqlConnectorError;
pub use crate::mapper::Entity;
pub use crate::projector::{FromRecord, FromRowValue};
pub use crate::provider::{ProviderCapabilities, ProviderRegistry};
pub use crate::results::{ColumnInfo, DynamicRecord, ResultSet};
pub use crate::tabular::{DataColumn, DataSet, DataTable};
pub use crate::transaction::TransactionState;
pub use crate::types::{CommandType, DatabaseType, RowValues};
pub use crate::{impl_entity, impl_from_record};
