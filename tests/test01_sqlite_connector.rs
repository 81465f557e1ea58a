#![cfg(feature = "sqlite")]

use sql_connector::prelude::*;

#[test]
fn scalar_and_bound_markers() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut db = Connector::new(DatabaseType::Sqlite, ":memory:")?;
        assert_eq!(db.state(), ConnectionState::Unopened);

        let n = db
            .execute_scalar(CommandType::Text, "SELECT 1 AS n", &[])
            .await?;
        assert_eq!(n, Some(RowValues::Int(1)));
        assert_eq!(db.state(), ConnectionState::Open);

        db.execute_non_query(
            CommandType::Text,
            "CREATE TABLE pairs (x INTEGER, y TEXT, note TEXT)",
            &[],
        )
        .await?;
        let inserted = db
            .execute_non_query(
                CommandType::Text,
                "INSERT INTO pairs (x, y, note) VALUES (@x, @y, @note)",
                &[
                    RowValues::Int(5),
                    RowValues::Text("five".into()),
                    RowValues::Null,
                ],
            )
            .await?;
        assert_eq!(inserted, 1);

        // each occurrence takes its own value
        let y = db
            .execute_scalar(
                CommandType::Text,
                "SELECT y FROM pairs WHERE x = @x OR x = @x AND note IS NULL",
                &[RowValues::Int(4), RowValues::Int(5)],
            )
            .await?;
        assert_eq!(y, Some(RowValues::Text("five".into())));

        let missing = db
            .execute_scalar(
                CommandType::Text,
                "SELECT y FROM pairs WHERE x = @x",
                &[RowValues::Int(99)],
            )
            .await?;
        assert_eq!(missing, None);

        let literal = db
            .execute_scalar(CommandType::Text, "SELECT '@not_a_param'", &[])
            .await?;
        assert_eq!(literal, Some(RowValues::Text("@not_a_param".into())));
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}

#[test]
fn arity_and_routine_errors_run_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut db = Connector::new(DatabaseType::Sqlite, ":memory:")?;

        let err = db
            .execute_scalar(CommandType::Text, "SELECT @a + @b", &[RowValues::Int(1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SqlConnectorError::ArityMismatch {
                expected: 2,
                supplied: 1
            }
        ));

        let err = db
            .execute_non_query(CommandType::StoredProcedure, "anything", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SqlConnectorError::UnsupportedOperation(_)));

        // text mode still works on the same connector
        let two = db
            .execute_scalar(
                CommandType::Text,
                "SELECT @a + @b",
                &[RowValues::Int(1), RowValues::Int(1)],
            )
            .await?;
        assert_eq!(two, Some(RowValues::Int(2)));
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}

#[test]
fn file_database_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("reopen.db");
    let options = ConnectorOptionsBuilder::new(DatabaseType::Sqlite, path.to_string_lossy())
        .sqlite_wal(true)
        .finish();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut db = Connector::with_options(options)?;
        db.close().await?;
        assert_eq!(db.state(), ConnectionState::Unopened);

        db.open().await?;
        db.open().await?;
        db.execute_non_query(CommandType::Text, "CREATE TABLE t (id INTEGER)", &[])
            .await?;
        db.execute_non_query(
            CommandType::Text,
            "INSERT INTO t (id) VALUES (@id)",
            &[RowValues::Int(3)],
        )
        .await?;
        let mode = db
            .execute_scalar(CommandType::Text, "PRAGMA journal_mode", &[])
            .await?;
        assert_eq!(mode, Some(RowValues::Text("wal".into())));

        db.close().await?;
        db.close().await?;
        assert_eq!(db.state(), ConnectionState::Closed);

        let id = db
            .execute_scalar(CommandType::Text, "SELECT id FROM t", &[])
            .await?;
        assert_eq!(id, Some(RowValues::Int(3)));
        assert_eq!(db.state(), ConnectionState::Open);
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}

#[test]
fn values_round_trip_through_columns() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut db = Connector::new(DatabaseType::Sqlite, ":memory:")?;
        db.execute_non_query(
            CommandType::Text,
            "CREATE TABLE v (f REAL, b BLOB, flag INTEGER)",
            &[],
        )
        .await?;
        db.execute_non_query(
            CommandType::Text,
            "INSERT INTO v (f, b, flag) VALUES (@f, @b, @flag)",
            &[
                RowValues::Float(1.5),
                RowValues::Blob(vec![1, 2, 3]),
                RowValues::Bool(true),
            ],
        )
        .await?;

        let row = db
            .single_dynamic(CommandType::Text, "SELECT f, b, flag FROM v", &[])
            .await?
            .expect("one row");
        assert_eq!(row.get("f"), Some(&RowValues::Float(1.5)));
        assert_eq!(row.get("b"), Some(&RowValues::Blob(vec![1, 2, 3])));
        assert_eq!(row.get("flag"), Some(&RowValues::Int(1)));
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}

#[test]
fn affected_rows_count_only_the_command_itself() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut db = Connector::new(DatabaseType::Sqlite, ":memory:")?;
        db.execute_non_query(CommandType::Text, "CREATE TABLE t (id INTEGER)", &[])
            .await?;

        let inserted = db
            .execute_non_query(
                CommandType::Text,
                "INSERT INTO t (id) VALUES (@a), (@b), (@c)",
                &[RowValues::Int(1), RowValues::Int(2), RowValues::Int(3)],
            )
            .await?;
        assert_eq!(inserted, 3);

        let ddl = db
            .execute_non_query(CommandType::Text, "CREATE TABLE u (id INTEGER)", &[])
            .await?;
        assert_eq!(ddl, 0);

        let select = db
            .execute_non_query(
                CommandType::Text,
                "SELECT id FROM t WHERE id > @min",
                &[RowValues::Int(0)],
            )
            .await?;
        assert_eq!(select, 0);

        let updated = db
            .execute_non_query(
                CommandType::Text,
                "UPDATE t SET id = id + 10 WHERE id < @max",
                &[RowValues::Int(3)],
            )
            .await?;
        assert_eq!(updated, 2);
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}
