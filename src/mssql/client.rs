use tiberius::{Client, Config, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::error::SqlConnectorError;

/// Type alias for SQL Server client
pub type MssqlClient = Client<Compat<TcpStream>>;

/// Connect using an ADO.NET-style connection string
/// (`server=tcp:host,1433;database=app;user=sa;password=...;TrustServerCertificate=true`).
///
/// # Errors
/// Returns `SqlConnectorError::ConfigError` for an unparsable string and
/// `SqlConnectorError::ConnectionError` if the server cannot be reached or rejects the login.
pub async fn create_mssql_client(connection_string: &str) -> Result<MssqlClient, SqlConnectorError> {
    let config = Config::from_ado_string(connection_string).map_err(|e| {
        SqlConnectorError::ConfigError(format!("invalid SQL Server connection string: {e}"))
    })?;

    let tcp = connect_tcp(&config).await?;
    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        // Azure SQL gateways redirect to the node that owns the database
        Err(tiberius::error::Error::Routing { host, port }) => {
            let mut config = config;
            config.host(&host);
            config.port(port);
            let tcp = connect_tcp(&config).await?;
            Client::connect(config, tcp.compat_write()).await.map_err(|e| {
                SqlConnectorError::ConnectionError(format!("SQL Server connection error: {e}"))
            })
        }
        Err(e) => Err(SqlConnectorError::ConnectionError(format!(
            "SQL Server connection error: {e}"
        ))),
    }
}

/// Named instances (`host\instance`) are resolved through the SQL Browser service.
async fn connect_tcp(config: &Config) -> Result<TcpStream, SqlConnectorError> {
    let tcp = TcpStream::connect_named(config)
        .await
        .map_err(|e| SqlConnectorError::ConnectionError(format!("TCP connection error: {e}")))?;
    tcp.set_nodelay(true)
        .map_err(|e| SqlConnectorError::ConnectionError(format!("TCP connection error: {e}")))?;
    Ok(tcp)
}
