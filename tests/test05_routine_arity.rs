mod common;

use common::FakeDriver;
use sql_connector::prelude::*;
use sql_connector::statement::{
    ParameterDescriptor, ParameterDirection, RoutineKind, RoutineSignature,
};

fn mssql_signature() -> RoutineSignature {
    RoutineSignature {
        kind: RoutineKind::Procedure,
        parameters: vec![
            ParameterDescriptor::input("@RETURN_VALUE")
                .with_direction(ParameterDirection::ReturnValue),
            ParameterDescriptor::input("@a"),
            ParameterDescriptor::input("@b"),
        ],
    }
}

fn plain_signature() -> RoutineSignature {
    RoutineSignature {
        kind: RoutineKind::Function,
        parameters: vec![ParameterDescriptor::input("a"), ParameterDescriptor::input("b")],
    }
}

#[test]
fn mssql_routine_may_omit_the_return_slot() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (mut db, log) = FakeDriver::new(DatabaseType::Mssql)
            .with_signature(mssql_signature())
            .connector();

        let affected = db
            .execute_non_query(
                CommandType::StoredProcedure,
                "dbo.usp_add",
                &[RowValues::Int(10), RowValues::Int(20)],
            )
            .await?;
        assert_eq!(affected, 1);
        assert_eq!(log.count("derive dbo.usp_add"), 1);
        assert!(
            log.entries()
                .contains(&"execute EXEC dbo.usp_add [Int(10), Int(20)]".to_string())
        );
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}

#[test]
fn mssql_routine_with_every_value_binds_positionally() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (mut db, log) = FakeDriver::new(DatabaseType::Mssql)
            .with_signature(mssql_signature())
            .connector();

        // three values for three parameters: the first lands in the return slot
        db.execute_non_query(
            CommandType::StoredProcedure,
            "dbo.usp_add",
            &[RowValues::Int(0), RowValues::Int(1), RowValues::Int(2)],
        )
        .await?;
        assert_eq!(log.count("execute"), 1);
        assert!(
            log.entries()
                .contains(&"execute EXEC dbo.usp_add [Int(1), Int(2)]".to_string())
        );
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}

#[test]
fn arity_mismatch_fails_before_execution() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (mut db, log) = FakeDriver::new(DatabaseType::Mssql)
            .with_signature(mssql_signature())
            .connector();

        let err = db
            .execute_non_query(CommandType::StoredProcedure, "dbo.usp_add", &[RowValues::Int(1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SqlConnectorError::ArityMismatch {
                expected: 3,
                supplied: 1
            }
        ));

        let err = db
            .execute_scalar(
                CommandType::Text,
                "SELECT @a + @b",
                &[RowValues::Int(1)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SqlConnectorError::ArityMismatch { .. }));

        assert_eq!(log.count("execute"), 0);
        assert_eq!(log.count("query"), 0);
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}

#[test]
fn leniency_is_limited_to_the_full_server() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (mut db, log) = FakeDriver::new(DatabaseType::Postgres)
            .with_signature(plain_signature())
            .connector();

        let err = db
            .query_dynamic(CommandType::StoredProcedure, "add_user", &[RowValues::Int(1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SqlConnectorError::ArityMismatch {
                expected: 2,
                supplied: 1
            }
        ));
        assert_eq!(log.count("query"), 0);

        let rows = db
            .query_dynamic(
                CommandType::StoredProcedure,
                "add_user",
                &[RowValues::Int(1), RowValues::Null],
            )
            .await?;
        assert_eq!(rows[0].get("params"), Some(&RowValues::Int(2)));
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}

#[test]
fn embedded_engine_never_derives() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (mut db, log) = FakeDriver::new(DatabaseType::Sqlite)
            .with_signature(plain_signature())
            .connector();

        let err = db
            .execute_non_query(
                CommandType::StoredProcedure,
                "anything",
                &[RowValues::Int(1), RowValues::Int(2)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SqlConnectorError::UnsupportedOperation(_)));
        assert_eq!(log.count("connect"), 0);
        assert_eq!(log.count("derive"), 0);
        assert_eq!(log.count("execute"), 0);
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}

#[test]
fn text_markers_bind_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (mut db, log) = FakeDriver::new(DatabaseType::Mssql).connector();

        db.execute_non_query(
            CommandType::Text,
            "UPDATE t SET a = @x WHERE b = @y AND c = '@not_a_param'",
            &[RowValues::Int(1), RowValues::Text("z".into())],
        )
        .await?;
        assert!(log.entries().contains(
            &"execute UPDATE t SET a = @P1 WHERE b = @P2 AND c = '@not_a_param' [Int(1), Text(\"z\")]"
                .to_string()
        ));
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}

#[test]
fn text_arity_mismatch_leaves_the_connection_alone() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (mut db, log) = FakeDriver::new(DatabaseType::Postgres).connector();

        let err = db
            .query_dynamic(CommandType::Text, "SELECT @a, @b", &[RowValues::Int(1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SqlConnectorError::ArityMismatch {
                expected: 2,
                supplied: 1
            }
        ));
        assert_eq!(log.count("connect"), 0);
        assert_eq!(db.state(), ConnectionState::Unopened);

        db.open().await?;
        db.close().await?;
        let err = db
            .execute_non_query(CommandType::Text, "DELETE FROM t WHERE id = @id", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SqlConnectorError::ArityMismatch { .. }));
        assert_eq!(log.count("connect"), 1);
        assert_eq!(db.state(), ConnectionState::Closed);
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}
