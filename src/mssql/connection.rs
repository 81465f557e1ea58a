use async_trait::async_trait;
use tiberius::Query;

use super::client::{MssqlClient, create_mssql_client};
use super::query::{bind_query_params, build_result_sets};
use crate::driver::BackendConnection;
use crate::error::SqlConnectorError;
use crate::results::ResultSet;
use crate::statement::{
    BackendCommand, ParameterDescriptor, ParameterDirection, RoutineKind, RoutineSignature,
};

/// Name of the implicit status slot every SQL Server routine carries.
pub const RETURN_VALUE_PARAMETER: &str = "@RETURN_VALUE";

const ROUTINE_TYPE_SQL: &str =
    "SELECT RTRIM(o.type) FROM sys.objects o WHERE o.object_id = OBJECT_ID(@P1)";

const ROUTINE_PARAMETERS_SQL: &str = "\
SELECT p.name, p.is_output, TYPE_NAME(p.user_type_id) \
FROM sys.parameters p \
WHERE p.object_id = OBJECT_ID(@P1) AND p.parameter_id > 0 \
ORDER BY p.parameter_id";

/// A single SQL Server session.
pub struct MssqlConnection {
    client: Option<MssqlClient>,
}

impl MssqlConnection {
    /// # Errors
    /// Returns the error from [`create_mssql_client`].
    pub async fn connect(connection_string: &str) -> Result<Self, SqlConnectorError> {
        Ok(Self {
            client: Some(create_mssql_client(connection_string).await?),
        })
    }

    fn client(&mut self) -> Result<&mut MssqlClient, SqlConnectorError> {
        self.client.as_mut().ok_or_else(|| {
            SqlConnectorError::ConnectionError("SQL Server connection is closed".into())
        })
    }

    /// Run a parameterless batch, draining any results.
    async fn simple(&mut self, sql: &str) -> Result<(), SqlConnectorError> {
        self.client()?.simple_query(sql).await?.into_results().await?;
        Ok(())
    }
}

#[async_trait]
impl BackendConnection for MssqlConnection {
    async fn begin(&mut self) -> Result<(), SqlConnectorError> {
        self.simple("BEGIN TRANSACTION").await
    }

    async fn commit(&mut self) -> Result<(), SqlConnectorError> {
        self.simple("COMMIT TRANSACTION").await
    }

    async fn rollback(&mut self) -> Result<(), SqlConnectorError> {
        self.simple("ROLLBACK TRANSACTION").await
    }

    async fn execute(&mut self, command: &BackendCommand) -> Result<usize, SqlConnectorError> {
        let client = self.client()?;
        let exec_result = bind_query_params(&command.sql, &command.params)
            .execute(client)
            .await?;
        let rows_affected: u64 = exec_result.rows_affected().iter().sum();
        usize::try_from(rows_affected).map_err(|e| {
            SqlConnectorError::ExecutionError(format!("Invalid rows affected count: {e}"))
        })
    }

    async fn query(&mut self, command: &BackendCommand) -> Result<ResultSet, SqlConnectorError> {
        let mut result_sets = self.query_multiple(command).await?;
        if result_sets.is_empty() {
            return Ok(ResultSet::default());
        }
        Ok(result_sets.swap_remove(0))
    }

    async fn query_multiple(
        &mut self,
        command: &BackendCommand,
    ) -> Result<Vec<ResultSet>, SqlConnectorError> {
        build_result_sets(self.client()?, &command.sql, &command.params).await
    }

    async fn derive_parameters(
        &mut self,
        routine: &str,
    ) -> Result<RoutineSignature, SqlConnectorError> {
        let client = self.client()?;

        let mut type_query = Query::new(ROUTINE_TYPE_SQL);
        type_query.bind(routine.to_string());
        let type_row = type_query.query(&mut *client).await?.into_row().await?;
        let Some(object_type) = type_row
            .as_ref()
            .and_then(|row| row.try_get::<&str, _>(0).ok().flatten())
            .map(str::to_string)
        else {
            return Err(SqlConnectorError::ExecutionError(format!(
                "stored routine '{routine}' was not found"
            )));
        };
        let kind = match object_type.as_str() {
            "P" | "PC" | "X" => RoutineKind::Procedure,
            "FN" | "FS" => RoutineKind::ScalarFunction,
            _ => RoutineKind::Function,
        };

        let mut params_query = Query::new(ROUTINE_PARAMETERS_SQL);
        params_query.bind(routine.to_string());
        let rows = params_query
            .query(&mut *client)
            .await?
            .into_first_result()
            .await?;

        let mut parameters = Vec::with_capacity(rows.len() + 1);
        parameters.push(
            ParameterDescriptor::input(RETURN_VALUE_PARAMETER)
                .with_direction(ParameterDirection::ReturnValue)
                .with_type_name("int"),
        );
        for row in &rows {
            let name: &str = row.try_get(0)?.unwrap_or_default();
            let is_output: bool = row.try_get(1)?.unwrap_or(false);
            let type_name: Option<&str> = row.try_get(2)?;
            let direction = if is_output {
                ParameterDirection::InputOutput
            } else {
                ParameterDirection::Input
            };
            let mut descriptor = ParameterDescriptor::input(name).with_direction(direction);
            if let Some(type_name) = type_name {
                descriptor = descriptor.with_type_name(type_name);
            }
            parameters.push(descriptor);
        }

        tracing::debug!(routine, parameters = parameters.len(), "derived SQL Server routine parameters");
        Ok(RoutineSignature { kind, parameters })
    }

    async fn close(&mut self) -> Result<(), SqlConnectorError> {
        if let Some(client) = self.client.take() {
            client.close().await?;
            tracing::debug!("SQL Server connection closed");
        }
        Ok(())
    }
}
