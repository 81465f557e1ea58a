//! Entity mapping: INSERT, UPDATE, and DELETE built from a record's fields.
//!
//! Statements are plain text with one `@field` marker per value, so they go through the same
//! preparer and placeholder rewriting as any other text command.

use crate::error::SqlConnectorError;
use crate::types::RowValues;

/// A record that maps one-to-one onto a table row.
///
/// ```rust
/// use sql_connector::impl_entity;
///
/// struct Person {
///     id: i64,
///     name: String,
/// }
///
/// impl_entity!(Person => "people", keys: [id], fields: { id, name });
/// ```
pub trait Entity {
    fn table_name() -> &'static str;

    /// Columns identifying a row in UPDATE and DELETE.
    fn key_columns() -> &'static [&'static str] {
        &["id"]
    }

    /// Column name and current value of every mapped field.
    fn to_values(&self) -> Vec<(&'static str, RowValues)>;
}

/// Implement [`Entity`] for a struct whose fields convert into [`RowValues`].
#[macro_export]
macro_rules! impl_entity {
    ($ty:ty => $table:literal, keys: [$($key:ident),+ $(,)?], fields: { $($field:ident),+ $(,)? }) => {
        impl $crate::mapper::Entity for $ty {
            fn table_name() -> &'static str {
                $table
            }

            fn key_columns() -> &'static [&'static str] {
                &[$(stringify!($key)),+]
            }

            fn to_values(&self) -> ::std::vec::Vec<(&'static str, $crate::types::RowValues)> {
                vec![$(
                    (stringify!($field), $crate::types::RowValues::from(self.$field.clone())),
                )+]
            }
        }
    };
}

/// Text command plus the values for its markers, in marker order.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedCommand {
    pub sql: String,
    pub values: Vec<RowValues>,
}

/// `INSERT INTO table (a, b) VALUES (@a, @b)` over every mapped field.
///
/// # Errors
/// Returns `SqlConnectorError::ConfigError` if the entity maps no fields.
pub fn insert_command<T: Entity>(entity: &T) -> Result<MappedCommand, SqlConnectorError> {
    let fields = entity.to_values();
    if fields.is_empty() {
        return Err(no_fields::<T>());
    }
    let columns: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
    let markers: Vec<String> = columns.iter().map(|c| format!("@{c}")).collect();
    Ok(MappedCommand {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::table_name(),
            columns.join(", "),
            markers.join(", ")
        ),
        values: fields.into_iter().map(|(_, v)| v).collect(),
    })
}

/// `UPDATE table SET a = @a WHERE id = @id`: non-key fields are set, key fields filter.
///
/// # Errors
/// Returns `SqlConnectorError::ConfigError` if a key column is not a mapped field or there is
/// nothing to set.
pub fn update_command<T: Entity>(entity: &T) -> Result<MappedCommand, SqlConnectorError> {
    let fields = entity.to_values();
    let (keys, rest) = split_keys::<T>(fields)?;
    if rest.is_empty() {
        return Err(SqlConnectorError::ConfigError(format!(
            "{} has no non-key fields to update",
            T::table_name()
        )));
    }

    let set_clause = assignments(&rest, ", ");
    let where_clause = assignments(&keys, " AND ");
    Ok(MappedCommand {
        sql: format!(
            "UPDATE {} SET {set_clause} WHERE {where_clause}",
            T::table_name()
        ),
        values: rest.into_iter().chain(keys).map(|(_, v)| v).collect(),
    })
}

/// `DELETE FROM table WHERE id = @id`.
///
/// # Errors
/// Returns `SqlConnectorError::ConfigError` if a key column is not a mapped field.
pub fn delete_command<T: Entity>(entity: &T) -> Result<MappedCommand, SqlConnectorError> {
    let (keys, _) = split_keys::<T>(entity.to_values())?;
    Ok(MappedCommand {
        sql: format!(
            "DELETE FROM {} WHERE {}",
            T::table_name(),
            assignments(&keys, " AND ")
        ),
        values: keys.into_iter().map(|(_, v)| v).collect(),
    })
}

type Fields = Vec<(&'static str, RowValues)>;

fn split_keys<T: Entity>(fields: Fields) -> Result<(Fields, Fields), SqlConnectorError> {
    if fields.is_empty() {
        return Err(no_fields::<T>());
    }
    let key_columns = T::key_columns();
    if key_columns.is_empty() {
        return Err(SqlConnectorError::ConfigError(format!(
            "{} declares no key columns",
            T::table_name()
        )));
    }

    let (mut keys, rest): (Fields, Fields) = fields
        .into_iter()
        .partition(|(name, _)| key_columns.contains(name));
    // WHERE follows declared key order
    keys.sort_by_key(|(name, _)| key_columns.iter().position(|k| k == name));

    if let Some(missing) = key_columns
        .iter()
        .find(|k| !keys.iter().any(|(name, _)| name == *k))
    {
        return Err(SqlConnectorError::ConfigError(format!(
            "key column '{missing}' is not a mapped field of {}",
            T::table_name()
        )));
    }
    Ok((keys, rest))
}

fn assignments(fields: &[(&'static str, RowValues)], separator: &str) -> String {
    fields
        .iter()
        .map(|(name, _)| format!("{name} = @{name}"))
        .collect::<Vec<_>>()
        .join(separator)
}

fn no_fields<T: Entity>() -> SqlConnectorError {
    SqlConnectorError::ConfigError(format!("{} maps no fields", T::table_name()))
}
