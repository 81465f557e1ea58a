//! Command preparation: parameter discovery, arity check, positional binding.

use crate::driver::BackendConnection;
use crate::error::SqlConnectorError;
use crate::placeholders::extract_parameter_names;
use crate::provider::{ProviderCapabilities, derive_parameters};
use crate::statement::{ParameterDescriptor, StatementDescriptor};
use crate::types::{CommandType, DatabaseType, RowValues};

/// Build a bound statement for one call.
///
/// Text commands take their parameters from the `@name` markers in `command_text`; stored
/// routines take them from the backend's declared signature. Nothing is executed; for stored
/// routines the connection is only used for introspection.
///
/// # Errors
/// Returns `SqlConnectorError::UnsupportedOperation` when routine derivation is unavailable,
/// `SqlConnectorError::ArityMismatch` when the value count does not fit the parameter set, or
/// the driver's error if introspection fails.
pub async fn prepare(
    database_type: DatabaseType,
    conn: &mut dyn BackendConnection,
    command_type: CommandType,
    command_text: &str,
    values: &[RowValues],
) -> Result<StatementDescriptor, SqlConnectorError> {
    match command_type {
        CommandType::Text => prepare_text(database_type, command_text, values),
        CommandType::StoredProcedure => {
            prepare_routine(database_type, conn, command_text, values).await
        }
    }
}

/// Bound statement for a literal-text command. Needs no connection.
///
/// # Errors
/// Returns `SqlConnectorError::ArityMismatch` when the value count differs from the number of
/// markers.
pub fn prepare_text(
    database_type: DatabaseType,
    command_text: &str,
    values: &[RowValues],
) -> Result<StatementDescriptor, SqlConnectorError> {
    let mut statement = describe_text(command_text);
    bind_values(database_type.capabilities(), &mut statement, values)?;
    log_prepared(database_type, &statement);
    Ok(statement)
}

/// Bound statement for a stored routine, using the signature the backend reports.
///
/// # Errors
/// See [`prepare`].
pub async fn prepare_routine(
    database_type: DatabaseType,
    conn: &mut dyn BackendConnection,
    routine: &str,
    values: &[RowValues],
) -> Result<StatementDescriptor, SqlConnectorError> {
    let signature = derive_parameters(database_type, conn, routine).await?;
    let mut statement = StatementDescriptor {
        command_type: CommandType::StoredProcedure,
        command_text: routine.to_string(),
        routine_kind: Some(signature.kind),
        parameters: signature.parameters,
    };
    bind_values(database_type.capabilities(), &mut statement, values)?;
    log_prepared(database_type, &statement);
    Ok(statement)
}

fn log_prepared(database_type: DatabaseType, statement: &StatementDescriptor) {
    tracing::trace!(
        database_type = %database_type,
        parameters = statement.parameters.len(),
        "prepared statement"
    );
}

/// Unbound descriptor for a literal-text command.
#[must_use]
pub fn describe_text(command_text: &str) -> StatementDescriptor {
    StatementDescriptor {
        command_type: CommandType::Text,
        command_text: command_text.to_string(),
        routine_kind: None,
        parameters: extract_parameter_names(command_text)
            .into_iter()
            .map(ParameterDescriptor::input)
            .collect(),
    }
}

/// Check arity and assign `values` to the statement's parameters by position.
///
/// The one permitted mismatch: a stored routine on a backend with an implicit return slot may
/// be called with one value fewer than it declares. The slot (the `ReturnValue` parameter, or
/// the first parameter when none is marked) is set to `0` and the values fill the remaining
/// parameters in order.
///
/// # Errors
/// Returns `SqlConnectorError::ArityMismatch` before any value is assigned.
pub fn bind_values(
    capabilities: ProviderCapabilities,
    statement: &mut StatementDescriptor,
    values: &[RowValues],
) -> Result<(), SqlConnectorError> {
    let expected = statement.parameters.len();
    let supplied = values.len();

    let return_slot = if expected == supplied {
        None
    } else if capabilities.implicit_return_parameter
        && statement.command_type == CommandType::StoredProcedure
        && expected == supplied + 1
    {
        Some(
            statement
                .parameters
                .iter()
                .position(ParameterDescriptor::is_return_value)
                .unwrap_or(0),
        )
    } else {
        return Err(SqlConnectorError::ArityMismatch { expected, supplied });
    };

    if let Some(slot) = return_slot {
        statement.parameters[slot].value = RowValues::Int(0);
    }

    let targets = statement
        .parameters
        .iter_mut()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != return_slot)
        .map(|(_, param)| param);
    for (param, value) in targets.zip(values) {
        param.value = value.clone();
    }

    Ok(())
}
