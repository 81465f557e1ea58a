#![cfg(feature = "sqlite")]

use sql_connector::prelude::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct Book {
    id: i64,
    title: String,
    pages: Option<i64>,
}

impl_entity!(Book => "books", keys: [id], fields: { id, title, pages });
impl_from_record!(Book { id, title, pages });

#[test]
fn insert_update_delete_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut db = Connector::new(DatabaseType::Sqlite, ":memory:")?;
        db.execute_non_query(
            CommandType::Text,
            "CREATE TABLE books (id INTEGER PRIMARY KEY, title TEXT NOT NULL, pages INTEGER)",
            &[],
        )
        .await?;

        let mut book = Book {
            id: 1,
            title: "Dune".into(),
            pages: None,
        };
        assert_eq!(db.insert(&book).await?, 1);

        book.pages = Some(412);
        book.title = "Dune (2nd ed.)".into();
        assert_eq!(db.update(&book).await?, 1);

        let stored: Option<Book> = db
            .single(
                CommandType::Text,
                "SELECT id, title, pages FROM books WHERE id = @id",
                &[RowValues::Int(1)],
            )
            .await?;
        assert_eq!(stored, Some(book.clone()));

        let ghost = Book {
            id: 9,
            ..Book::default()
        };
        assert_eq!(db.update(&ghost).await?, 0);
        assert_eq!(db.delete(&ghost).await?, 0);

        assert_eq!(db.delete(&book).await?, 1);
        let left = db
            .execute_scalar(CommandType::Text, "SELECT COUNT(*) FROM books", &[])
            .await?;
        assert_eq!(left, Some(RowValues::Int(0)));
        Ok::<(), SqlConnectorError>(())
    })?;
    Ok(())
}
