#![cfg(feature = "sqlite")]

use sql_connector::prelude::*;

#[derive(Debug, Default, PartialEq)]
struct Employee {
    id: i64,
    name: String,
    salary: f64,
    manager_id: Option<i64>,
    // never selected; keeps its default
    department: String,
}

impl_from_record!(Employee {
    id,
    name,
    salary,
    manager_id,
    department,
});

async fn seeded() -> Result<Connector, SqlConnectorError> {
    let mut db = Connector::new(DatabaseType::Sqlite, ":memory:")?;
    db.execute_non_query(
        CommandType::Text,
        "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, salary REAL, manager_id INTEGER)",
        &[],
    )
    .await?;
    for (id, name, salary, manager) in [
        (1, "Ada", 120.0, RowValues::Null),
        (2, "Brian", 95.5, RowValues::Int(1)),
    ] {
        db.execute_non_query(
            CommandType::Text,
            "INSERT INTO employees (id, name, salary, manager_id) VALUES (@id, @name, @salary, @manager)",
            &[
                RowValues::Int(id),
                RowValues::Text(name.into()),
                RowValues::Float(salary),
                manager,
            ],
        )
        .await?;
    }
    Ok(db)
}

#[test]
fn typed_rows_match_columns_by_name() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut db = seeded().await?;
        let staff: Vec<Employee> = db
            .query(
                CommandType::Text,
                "SELECT id, name, salary, manager_id, 'extra' AS unused FROM employees ORDER BY id",
                &[],
            )
            .await?;
        assert_eq!(staff.len(), 2);
        assert_eq!(
            staff[0],
            Employee {
                id: 1,
                name: "Ada".into(),
                salary: 120.0,
                manager_id: None,
                department: String::new(),
            }
        );
        assert_eq!(staff[1].manager_id, Some(1));

        let one: Option<Employee> = db
            .single(
                CommandType::Text,
                "SELECT id, name FROM employees WHERE id = @id",
                &[RowValues::Int(2)],
            )
            .await?;
        let one = one.expect("employee 2");
        assert_eq!(one.name, "Brian");
        assert_eq!(one.salary, 0.0);

        let none: Option<Employee> = db
            .single(
                CommandType::Text,
                "SELECT id FROM employees WHERE id = @id",
                &[RowValues::Int(42)],
            )
            .await?;
        assert!(none.is_none());
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}

#[test]
fn unconvertible_column_is_a_conversion_error() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut db = seeded().await?;
        let err = db
            .query::<Employee>(CommandType::Text, "SELECT name AS id FROM employees", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SqlConnectorError::ConversionError(_)));
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}

#[test]
fn json_matches_dynamic_records() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut db = seeded().await?;
        let sql = "SELECT id, name, manager_id FROM employees ORDER BY id";

        let json = db.json_query(CommandType::Text, sql, &[]).await?;
        let dynamic = db.query_dynamic(CommandType::Text, sql, &[]).await?;
        let parsed: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(parsed, serde_json::to_value(&dynamic)?);
        assert_eq!(parsed[0]["name"], "Ada");
        assert!(parsed[0]["manager_id"].is_null());
        assert_eq!(parsed[1]["manager_id"], 1);

        let single = db
            .json_single(CommandType::Text, sql, &[])
            .await?;
        let parsed: serde_json::Value = serde_json::from_str(&single)?;
        assert_eq!(parsed["id"], 1);

        let empty = "SELECT id FROM employees WHERE id < 0";
        assert_eq!(db.json_query(CommandType::Text, empty, &[]).await?, "");
        assert_eq!(db.json_single(CommandType::Text, empty, &[]).await?, "");
        assert!(db.query_dynamic(CommandType::Text, empty, &[]).await?.is_empty());
        assert!(db.single_dynamic(CommandType::Text, empty, &[]).await?.is_none());
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}
