#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sql_connector::driver::{BackendConnection, Driver, text_command};
use sql_connector::placeholders::PlaceholderStyle;
use sql_connector::prelude::*;
use sql_connector::statement::{BackendCommand, RoutineSignature, StatementDescriptor};

/// Everything the fake backend was asked to do, in order.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }

    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }
}

/// In-memory driver that records calls instead of talking to a server.
pub struct FakeDriver {
    pub database_type: DatabaseType,
    pub signature: Option<RoutineSignature>,
    pub log: CallLog,
}

impl FakeDriver {
    pub fn new(database_type: DatabaseType) -> Self {
        Self {
            database_type,
            signature: None,
            log: CallLog::default(),
        }
    }

    pub fn with_signature(mut self, signature: RoutineSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// A connector wired to this driver only.
    pub fn connector(self) -> (Connector, CallLog) {
        let log = self.log.clone();
        let database_type = self.database_type;
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(self));
        let connector =
            Connector::with_registry(ConnectorOptions::new(database_type, "fake"), &registry)
                .unwrap();
        (connector, log)
    }
}

#[async_trait]
impl Driver for FakeDriver {
    fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    async fn connect(
        &self,
        _options: &ConnectorOptions,
    ) -> Result<Box<dyn BackendConnection>, SqlConnectorError> {
        self.log.push("connect".into());
        Ok(Box::new(FakeConnection {
            signature: self.signature.clone(),
            log: self.log.clone(),
        }))
    }

    fn create_command(
        &self,
        statement: &StatementDescriptor,
    ) -> Result<BackendCommand, SqlConnectorError> {
        match statement.command_type {
            CommandType::Text => Ok(text_command(statement, PlaceholderStyle::Mssql)),
            CommandType::StoredProcedure => Ok(BackendCommand {
                sql: format!("EXEC {}", statement.command_text),
                params: statement.argument_values(),
            }),
        }
    }
}

struct FakeConnection {
    signature: Option<RoutineSignature>,
    log: CallLog,
}

#[async_trait]
impl BackendConnection for FakeConnection {
    async fn begin(&mut self) -> Result<(), SqlConnectorError> {
        self.log.push("begin".into());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), SqlConnectorError> {
        self.log.push("commit".into());
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), SqlConnectorError> {
        self.log.push("rollback".into());
        Ok(())
    }

    async fn execute(&mut self, command: &BackendCommand) -> Result<usize, SqlConnectorError> {
        self.log
            .push(format!("execute {} {:?}", command.sql, command.params));
        Ok(1)
    }

    async fn query(&mut self, command: &BackendCommand) -> Result<ResultSet, SqlConnectorError> {
        self.log.push(format!("query {} {:?}", command.sql, command.params));
        let mut rs = ResultSet::default();
        rs.set_columns(vec![ColumnInfo::new("params", "int")]);
        rs.add_row_values(vec![RowValues::Int(command.params.len() as i64)]);
        Ok(rs)
    }

    async fn derive_parameters(
        &mut self,
        routine: &str,
    ) -> Result<RoutineSignature, SqlConnectorError> {
        self.log.push(format!("derive {routine}"));
        self.signature.clone().ok_or_else(|| {
            SqlConnectorError::ExecutionError(format!("stored routine '{routine}' was not found"))
        })
    }

    async fn close(&mut self) -> Result<(), SqlConnectorError> {
        self.log.push("close".into());
        Ok(())
    }
}
