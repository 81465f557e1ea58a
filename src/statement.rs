use crate::types::{CommandType, RowValues};

/// Direction of a routine parameter as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterDirection {
    Input,
    Output,
    InputOutput,
    /// Implicit status slot of a SQL Server procedure (`@RETURN_VALUE`).
    ReturnValue,
}

/// One parameter of a prepared statement.
///
/// The layer never types a parameter itself; `type_name` is informational and only present
/// when the backend reported it during routine derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub direction: ParameterDirection,
    pub type_name: Option<String>,
    pub value: RowValues,
}

impl ParameterDescriptor {
    /// An unbound input parameter.
    #[must_use]
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: ParameterDirection::Input,
            type_name: None,
            value: RowValues::Null,
        }
    }

    #[must_use]
    pub fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn is_return_value(&self) -> bool {
        self.direction == ParameterDirection::ReturnValue
    }
}

/// How a stored routine is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    Procedure,
    /// Set-returning; selected from like a table.
    Function,
    /// Returns a single value; called inside a select list.
    ScalarFunction,
}

/// Declared signature of a stored routine, as introspected from the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineSignature {
    pub kind: RoutineKind,
    pub parameters: Vec<ParameterDescriptor>,
}

/// A command with its parameter set bound, built fresh for a single call.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementDescriptor {
    pub command_type: CommandType,
    pub command_text: String,
    pub routine_kind: Option<RoutineKind>,
    pub parameters: Vec<ParameterDescriptor>,
}

impl StatementDescriptor {
    /// Bound values of every parameter a backend should receive, in order.
    ///
    /// Return-value slots are never sent to the server.
    #[must_use]
    pub fn argument_values(&self) -> Vec<RowValues> {
        self.arguments().map(|p| p.value.clone()).collect()
    }

    /// Parameters a backend should receive, in order.
    pub fn arguments(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter().filter(|p| !p.is_return_value())
    }
}

/// Backend-ready command: SQL in the driver's own placeholder syntax plus ordered values.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCommand {
    pub sql: String,
    pub params: Vec<RowValues>,
}
