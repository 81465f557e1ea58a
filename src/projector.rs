//! Row projection: typed records, dynamic records, JSON text.
//!
//! Typed projection is name-based. A record type starts from its `Default` value and each
//! field whose name matches a result column takes that column's value; unmatched fields keep
//! their defaults and unmatched columns are ignored. NULL leaves the default in place.

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::SqlConnectorError;
use crate::results::{DynamicRecord, ResultSet};
use crate::types::RowValues;

/// Coercion from a column value into a record field.
///
/// `Ok(None)` means "leave the field at its default" and is returned for NULL.
pub trait FromRowValue: Sized {
    /// # Errors
    /// Returns `SqlConnectorError::ConversionError` when the value cannot represent `Self`.
    fn from_row_value(value: &RowValues) -> Result<Option<Self>, SqlConnectorError>;
}

/// A record type that can be built from one result row.
///
/// Implement it with [`impl_from_record!`](crate::impl_from_record) for plain structs:
/// ```rust
/// use sql_connector::impl_from_record;
///
/// #[derive(Debug, Default)]
/// struct Person {
///     id: i64,
///     name: String,
///     nickname: Option<String>,
/// }
///
/// impl_from_record!(Person { id, name, nickname });
/// ```
pub trait FromRecord: Sized {
    /// # Errors
    /// Returns `SqlConnectorError::ConversionError` when a matched column cannot be coerced
    /// into its field.
    fn from_record(record: &DynamicRecord) -> Result<Self, SqlConnectorError>;
}

impl FromRecord for DynamicRecord {
    fn from_record(record: &DynamicRecord) -> Result<Self, SqlConnectorError> {
        Ok(record.clone())
    }
}

/// Assign the column named `column` to `slot` if the row has it and it is not NULL.
///
/// # Errors
/// Returns `SqlConnectorError::ConversionError` naming the column on a failed coercion.
#[doc(hidden)]
pub fn assign_field<T: FromRowValue>(
    record: &DynamicRecord,
    column: &str,
    slot: &mut T,
) -> Result<(), SqlConnectorError> {
    let Some(value) = record.get(column) else {
        return Ok(());
    };
    match T::from_row_value(value) {
        Ok(Some(converted)) => {
            *slot = converted;
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(SqlConnectorError::ConversionError(msg)) => Err(SqlConnectorError::ConversionError(
            format!("column '{column}': {msg}"),
        )),
        Err(e) => Err(e),
    }
}

/// Implement [`FromRecord`] for a struct with a `Default` impl, mapping each listed field
/// from the column of the same name.
#[macro_export]
macro_rules! impl_from_record {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::projector::FromRecord for $ty {
            fn from_record(
                record: &$crate::results::DynamicRecord,
            ) -> ::std::result::Result<Self, $crate::error::SqlConnectorError> {
                let mut out = <$ty as ::std::default::Default>::default();
                $(
                    $crate::projector::assign_field(record, stringify!($field), &mut out.$field)?;
                )*
                Ok(out)
            }
        }
    };
}

fn mismatch(expected: &str, value: &RowValues) -> SqlConnectorError {
    SqlConnectorError::ConversionError(format!("expected {expected}, found {}", value.kind()))
}

impl FromRowValue for i64 {
    fn from_row_value(value: &RowValues) -> Result<Option<Self>, SqlConnectorError> {
        match value {
            RowValues::Null => Ok(None),
            RowValues::Int(i) => Ok(Some(*i)),
            RowValues::Bool(b) => Ok(Some(i64::from(*b))),
            RowValues::Text(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| mismatch("integer", value)),
            other => Err(mismatch("integer", other)),
        }
    }
}

macro_rules! narrow_int {
    ($($ty:ty),*) => {
        $(
            impl FromRowValue for $ty {
                fn from_row_value(value: &RowValues) -> Result<Option<Self>, SqlConnectorError> {
                    match i64::from_row_value(value)? {
                        None => Ok(None),
                        Some(i) => <$ty>::try_from(i).map(Some).map_err(|_| {
                            SqlConnectorError::ConversionError(format!(
                                "{i} is out of range for {}",
                                stringify!($ty)
                            ))
                        }),
                    }
                }
            }
        )*
    };
}

narrow_int!(i32, i16, u32, u64, usize);

impl FromRowValue for f64 {
    fn from_row_value(value: &RowValues) -> Result<Option<Self>, SqlConnectorError> {
        match value {
            RowValues::Null => Ok(None),
            RowValues::Text(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| mismatch("float", value)),
            other => other.as_float().map(Some).ok_or_else(|| mismatch("float", other)),
        }
    }
}

impl FromRowValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_row_value(value: &RowValues) -> Result<Option<Self>, SqlConnectorError> {
        Ok(f64::from_row_value(value)?.map(|f| f as f32))
    }
}

impl FromRowValue for bool {
    fn from_row_value(value: &RowValues) -> Result<Option<Self>, SqlConnectorError> {
        match value {
            RowValues::Null => Ok(None),
            other => other
                .as_bool()
                .copied()
                .map(Some)
                .ok_or_else(|| mismatch("bool", other)),
        }
    }
}

impl FromRowValue for String {
    fn from_row_value(value: &RowValues) -> Result<Option<Self>, SqlConnectorError> {
        match value {
            RowValues::Null => Ok(None),
            RowValues::Text(s) => Ok(Some(s.clone())),
            RowValues::Int(i) => Ok(Some(i.to_string())),
            RowValues::Float(f) => Ok(Some(f.to_string())),
            RowValues::Bool(b) => Ok(Some(b.to_string())),
            RowValues::Timestamp(dt) => Ok(Some(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string())),
            RowValues::JSON(j) => Ok(Some(j.to_string())),
            RowValues::Blob(_) => Err(mismatch("text", value)),
        }
    }
}

impl FromRowValue for NaiveDateTime {
    fn from_row_value(value: &RowValues) -> Result<Option<Self>, SqlConnectorError> {
        match value {
            RowValues::Null => Ok(None),
            other => other
                .as_timestamp()
                .map(Some)
                .ok_or_else(|| mismatch("timestamp", other)),
        }
    }
}

impl FromRowValue for Vec<u8> {
    fn from_row_value(value: &RowValues) -> Result<Option<Self>, SqlConnectorError> {
        match value {
            RowValues::Null => Ok(None),
            RowValues::Blob(b) => Ok(Some(b.clone())),
            other => Err(mismatch("blob", other)),
        }
    }
}

impl FromRowValue for JsonValue {
    fn from_row_value(value: &RowValues) -> Result<Option<Self>, SqlConnectorError> {
        match value {
            RowValues::Null => Ok(None),
            RowValues::JSON(j) => Ok(Some(j.clone())),
            RowValues::Text(s) => serde_json::from_str(s).map(Some).map_err(Into::into),
            other => serde_json::to_value(other).map(Some).map_err(Into::into),
        }
    }
}

/// Raw passthrough; NULL is kept as `RowValues::Null`.
impl FromRowValue for RowValues {
    fn from_row_value(value: &RowValues) -> Result<Option<Self>, SqlConnectorError> {
        Ok(Some(value.clone()))
    }
}

/// NULL becomes `None` explicitly.
impl<T: FromRowValue> FromRowValue for Option<T> {
    fn from_row_value(value: &RowValues) -> Result<Option<Self>, SqlConnectorError> {
        if value.is_null() {
            return Ok(Some(None));
        }
        Ok(Some(T::from_row_value(value)?))
    }
}

/// Every row as `T`, in result order.
///
/// # Errors
/// Returns `SqlConnectorError::ConversionError` on the first row that cannot be projected.
pub fn to_typed<T: FromRecord>(result_set: &ResultSet) -> Result<Vec<T>, SqlConnectorError> {
    result_set.results.iter().map(T::from_record).collect()
}

/// The first row as `T`, or `None` for an empty result.
///
/// # Errors
/// Returns `SqlConnectorError::ConversionError` if the first row cannot be projected.
pub fn to_typed_single<T: FromRecord>(
    result_set: &ResultSet,
) -> Result<Option<T>, SqlConnectorError> {
    result_set.results.first().map(T::from_record).transpose()
}

#[must_use]
pub fn to_dynamic(result_set: ResultSet) -> Vec<DynamicRecord> {
    result_set.into_rows()
}

/// JSON array of row objects. An empty result yields the empty string, not `[]`.
///
/// # Errors
/// Returns `SqlConnectorError::JsonError` if serialization fails.
pub fn to_json(result_set: &ResultSet) -> Result<String, SqlConnectorError> {
    if result_set.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(&result_set.results)?)
}

/// JSON object for the first row, or the empty string for an empty result.
///
/// # Errors
/// Returns `SqlConnectorError::JsonError` if serialization fails.
pub fn to_json_single(result_set: &ResultSet) -> Result<String, SqlConnectorError> {
    match result_set.results.first() {
        Some(row) => Ok(serde_json::to_string(row)?),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ColumnInfo;

    #[derive(Debug, Default, PartialEq)]
    struct Item {
        id: i64,
        label: String,
        score: f64,
        note: Option<String>,
        untouched: i32,
    }

    crate::impl_from_record!(Item {
        id,
        label,
        score,
        note,
        untouched,
    });

    fn items() -> ResultSet {
        let mut rs = ResultSet::default();
        rs.set_columns(vec![
            ColumnInfo::new("id", "INTEGER"),
            ColumnInfo::new("label", "TEXT"),
            ColumnInfo::new("score", "REAL"),
            ColumnInfo::new("note", "TEXT"),
            ColumnInfo::new("extra", "TEXT"),
        ]);
        rs.add_row_values(vec![
            RowValues::Int(1),
            RowValues::Text("a".into()),
            RowValues::Int(3),
            RowValues::Null,
            RowValues::Text("ignored".into()),
        ]);
        rs.add_row_values(vec![
            RowValues::Int(2),
            RowValues::Null,
            RowValues::Float(0.5),
            RowValues::Text("n".into()),
            RowValues::Null,
        ]);
        rs
    }

    #[test]
    fn typed_projection_matches_by_name() {
        let rows: Vec<Item> = to_typed(&items()).unwrap();
        assert_eq!(
            rows[0],
            Item {
                id: 1,
                label: "a".into(),
                score: 3.0,
                note: None,
                untouched: 0,
            }
        );
        assert_eq!(rows[1].label, "");
        assert_eq!(rows[1].note.as_deref(), Some("n"));
    }

    #[test]
    fn single_of_empty_is_none() {
        let rs = ResultSet::default();
        assert!(to_typed_single::<Item>(&rs).unwrap().is_none());
        assert_eq!(to_json(&rs).unwrap(), "");
        assert_eq!(to_json_single(&rs).unwrap(), "");
    }

    #[test]
    fn conversion_error_names_the_column() {
        let mut rs = ResultSet::default();
        rs.set_columns(vec![ColumnInfo::new("id", "")]);
        rs.add_row_values(vec![RowValues::Blob(vec![1])]);
        let err = to_typed::<Item>(&rs).unwrap_err();
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn json_round_trips_through_dynamic_records() {
        let rs = items();
        let json = to_json(&rs).unwrap();
        let parsed: JsonValue = serde_json::from_str(&json).unwrap();
        let expected = serde_json::to_value(to_dynamic(rs)).unwrap();
        assert_eq!(parsed, expected);
        assert_eq!(parsed[0]["label"], "a");
        assert_eq!(parsed[1]["label"], JsonValue::Null);
    }
}
