use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures_util::TryStreamExt;
use tiberius::{ColumnData, FromSql, Query, QueryItem};

use super::client::MssqlClient;
use crate::error::SqlConnectorError;
use crate::results::{ColumnInfo, ResultSet};
use crate::types::RowValues;

/// Bind parameters directly to the query for SQL Server
/// Return a query builder with parameters already bound
pub fn bind_query_params<'a>(query: &'a str, params: &[RowValues]) -> Query<'a> {
    let mut query_builder = Query::new(query);

    for param in params {
        match param {
            RowValues::Int(i) => query_builder.bind(*i),
            RowValues::Float(f) => query_builder.bind(*f),
            RowValues::Text(s) => query_builder.bind(s.clone()),
            RowValues::Bool(b) => query_builder.bind(*b),
            RowValues::Timestamp(dt) => query_builder.bind(*dt),
            RowValues::Null => query_builder.bind(Option::<String>::None),
            RowValues::JSON(jsval) => query_builder.bind(jsval.to_string()),
            RowValues::Blob(bytes) => query_builder.bind(bytes.clone()),
        }
    }

    query_builder
}

/// Run a bound query and collect every result set it produces.
///
/// # Errors
/// Returns `SqlConnectorError::MssqlError` if execution fails, or a conversion error for a
/// column type with no mapping.
pub async fn build_result_sets(
    client: &mut MssqlClient,
    query: &str,
    params: &[RowValues],
) -> Result<Vec<ResultSet>, SqlConnectorError> {
    let mut stream = bind_query_params(query, params).query(client).await?;

    let mut result_sets: Vec<ResultSet> = Vec::new();
    while let Some(item) = stream.try_next().await? {
        match item {
            QueryItem::Metadata(meta) => {
                let mut result_set = ResultSet::with_capacity(10);
                result_set.set_columns(
                    meta.columns()
                        .iter()
                        .map(|col| ColumnInfo::new(col.name(), format!("{:?}", col.column_type())))
                        .collect(),
                );
                result_sets.push(result_set);
            }
            QueryItem::Row(row) => {
                let result_set = result_sets.last_mut().ok_or_else(|| {
                    SqlConnectorError::ExecutionError(
                        "SQL Server sent a row before its column metadata".into(),
                    )
                })?;
                let row_values = row
                    .into_iter()
                    .map(extract_value)
                    .collect::<Result<Vec<_>, _>>()?;
                result_set.add_row_values(row_values);
            }
        }
    }

    Ok(result_sets)
}

/// Convert one column of a SQL Server row.
///
/// # Errors
/// Returns `SqlConnectorError::ConversionError` for column types with no mapping.
#[allow(clippy::cast_precision_loss)]
pub fn extract_value(data: ColumnData<'static>) -> Result<RowValues, SqlConnectorError> {
    Ok(match data {
        ColumnData::U8(v) => v.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        ColumnData::I16(v) => v.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        ColumnData::I32(v) => v.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        ColumnData::I64(v) => v.map_or(RowValues::Null, RowValues::Int),
        ColumnData::F32(v) => v.map_or(RowValues::Null, |v| RowValues::Float(f64::from(v))),
        ColumnData::F64(v) => v.map_or(RowValues::Null, RowValues::Float),
        ColumnData::Bit(v) => v.map_or(RowValues::Null, RowValues::Bool),
        ColumnData::String(v) => v.map_or(RowValues::Null, |s| RowValues::Text(s.into_owned())),
        ColumnData::Guid(v) => v.map_or(RowValues::Null, |g| RowValues::Text(g.to_string())),
        ColumnData::Binary(v) => v.map_or(RowValues::Null, |b| RowValues::Blob(b.into_owned())),
        ColumnData::Numeric(v) => v.map_or(RowValues::Null, |n| {
            RowValues::Float(n.value() as f64 / 10_f64.powi(i32::from(n.scale())))
        }),
        ColumnData::Xml(v) => {
            v.map_or(RowValues::Null, |x| RowValues::Text(x.into_owned().into_string()))
        }
        other => temporal_value(&other)?,
    })
}

fn temporal_value(data: &ColumnData<'static>) -> Result<RowValues, SqlConnectorError> {
    let value = match data {
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(data)?.map(RowValues::Timestamp)
        }
        ColumnData::Date(_) => NaiveDate::from_sql(data)?
            .map(|d| RowValues::Timestamp(d.and_time(NaiveTime::MIN))),
        ColumnData::Time(_) => NaiveTime::from_sql(data)?.map(|t| RowValues::Text(t.to_string())),
        ColumnData::DateTimeOffset(_) => DateTime::<Utc>::from_sql(data)?
            .map(|dt| RowValues::Timestamp(dt.naive_utc())),
        other => {
            return Err(SqlConnectorError::ConversionError(format!(
                "unsupported SQL Server column data: {other:?}"
            )));
        }
    };
    Ok(value.unwrap_or(RowValues::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn converts_scalar_column_data() {
        assert_eq!(extract_value(ColumnData::I32(Some(5))).unwrap(), RowValues::Int(5));
        assert_eq!(extract_value(ColumnData::Bit(None)).unwrap(), RowValues::Null);
        assert_eq!(
            extract_value(ColumnData::String(Some(Cow::Borrowed("x")))).unwrap(),
            RowValues::Text("x".into())
        );
    }
}
