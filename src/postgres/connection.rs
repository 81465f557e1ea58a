use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

use super::params::Params;
use super::query::build_result_set_from_statement;
use crate::driver::BackendConnection;
use crate::error::SqlConnectorError;
use crate::results::ResultSet;
use crate::statement::{
    BackendCommand, ParameterDescriptor, ParameterDirection, RoutineKind, RoutineSignature,
};

const ROUTINE_PARAMETERS_SQL: &str = "\
SELECT r.specific_name::text, r.routine_type::text, p.parameter_name::text, \
       p.parameter_mode::text, p.data_type::text \
FROM information_schema.routines r \
LEFT JOIN information_schema.parameters p \
       ON p.specific_schema = r.specific_schema AND p.specific_name = r.specific_name \
WHERE r.routine_name::text = $1::text \
  AND ($2::text IS NULL OR r.routine_schema::text = $2::text) \
ORDER BY r.specific_name, p.ordinal_position";

/// Catalog spelling of an identifier: unquoted names fold to lower case, quoted names keep
/// their case with `""` unescaped.
fn folded_identifier(ident: &str) -> String {
    let ident = ident.trim();
    match ident
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(quoted) => quoted.replace("\"\"", "\""),
        None => ident.to_lowercase(),
    }
}

/// A single Postgres client plus the task driving its socket.
pub struct PostgresConnection {
    client: Option<Client>,
    driver_task: Option<JoinHandle<()>>,
}

impl PostgresConnection {
    /// Connect with a libpq-style connection string or URL.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::PostgresError` if the string is invalid or the server is
    /// unreachable.
    pub async fn connect(connection_string: &str) -> Result<Self, SqlConnectorError> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;
        let driver_task = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "postgres connection error");
            }
        });
        Ok(Self {
            client: Some(client),
            driver_task: Some(driver_task),
        })
    }

    fn client(&self) -> Result<&Client, SqlConnectorError> {
        self.client.as_ref().ok_or_else(|| {
            SqlConnectorError::ConnectionError("postgres connection is closed".into())
        })
    }
}

#[async_trait]
impl BackendConnection for PostgresConnection {
    async fn begin(&mut self) -> Result<(), SqlConnectorError> {
        self.client()?.batch_execute("BEGIN").await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), SqlConnectorError> {
        self.client()?.batch_execute("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), SqlConnectorError> {
        self.client()?.batch_execute("ROLLBACK").await?;
        Ok(())
    }

    async fn execute(&mut self, command: &BackendCommand) -> Result<usize, SqlConnectorError> {
        let client = self.client()?;
        let rows = if command.params.is_empty() {
            // simple protocol: scripts with several statements report one count each
            client
                .simple_query(&command.sql)
                .await?
                .iter()
                .map(|msg| match msg {
                    SimpleQueryMessage::CommandComplete(n) => *n,
                    _ => 0,
                })
                .sum::<u64>()
        } else {
            let stmt = client.prepare(&command.sql).await?;
            let converted = Params::convert(&command.params);
            client.execute(&stmt, converted.as_refs()).await?
        };
        usize::try_from(rows).map_err(|e| {
            SqlConnectorError::ExecutionError(format!("Invalid rows affected count: {e}"))
        })
    }

    async fn query(&mut self, command: &BackendCommand) -> Result<ResultSet, SqlConnectorError> {
        let client = self.client()?;
        let stmt = client.prepare(&command.sql).await?;
        let converted = Params::convert(&command.params);
        let rows = client.query(&stmt, converted.as_refs()).await?;
        build_result_set_from_statement(&stmt, &rows)
    }

    async fn derive_parameters(
        &mut self,
        routine: &str,
    ) -> Result<RoutineSignature, SqlConnectorError> {
        let (schema, name) = match routine.rsplit_once('.') {
            Some((schema, name)) => (Some(folded_identifier(schema)), folded_identifier(name)),
            None => (None, folded_identifier(routine)),
        };
        let rows = self
            .client()?
            .query(ROUTINE_PARAMETERS_SQL, &[&name, &schema])
            .await?;

        let Some(first) = rows.first() else {
            return Err(SqlConnectorError::ExecutionError(format!(
                "stored routine '{routine}' was not found"
            )));
        };
        // overloads: the first specific routine wins
        let specific_name: String = first.try_get(0)?;
        let routine_type: String = first.try_get(1)?;
        let kind = if routine_type.eq_ignore_ascii_case("PROCEDURE") {
            RoutineKind::Procedure
        } else {
            RoutineKind::Function
        };

        let mut parameters = Vec::new();
        for row in &rows {
            let specific: String = row.try_get(0)?;
            if specific != specific_name {
                break;
            }
            let mode: Option<String> = row.try_get(3)?;
            let Some(mode) = mode else {
                // routine without parameters
                continue;
            };
            let direction = match mode.as_str() {
                "OUT" => ParameterDirection::Output,
                "INOUT" => ParameterDirection::InputOutput,
                _ => ParameterDirection::Input,
            };
            // function OUT parameters are result columns, not arguments
            if kind == RoutineKind::Function && direction == ParameterDirection::Output {
                continue;
            }
            let param_name: Option<String> = row.try_get(2)?;
            let data_type: Option<String> = row.try_get(4)?;
            let mut descriptor = ParameterDescriptor::input(
                param_name.unwrap_or_else(|| format!("${}", parameters.len() + 1)),
            )
            .with_direction(direction);
            if let Some(data_type) = data_type {
                descriptor = descriptor.with_type_name(data_type);
            }
            parameters.push(descriptor);
        }

        tracing::debug!(routine, parameters = parameters.len(), "derived postgres routine parameters");
        Ok(RoutineSignature { kind, parameters })
    }

    async fn close(&mut self) -> Result<(), SqlConnectorError> {
        // dropping the client ends the connection future
        if self.client.take().is_some() {
            tracing::debug!("postgres connection closed");
        }
        if let Some(task) = self.driver_task.take() {
            task.await.map_err(|e| {
                SqlConnectorError::ConnectionError(format!("postgres connection task failed: {e}"))
            })?;
        }
        Ok(())
    }
}

impl Drop for PostgresConnection {
    fn drop(&mut self) {
        if let Some(task) = self.driver_task.take() {
            task.abort();
        }
    }
}
