use std::collections::HashMap;
use std::sync::Arc;

use super::row::{DynamicRecord, build_column_index};
use crate::types::RowValues;

/// Name and backend-reported type of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Backend type name (`int4`, `INTEGER`, `Int4`...); empty when the backend reports none.
    pub type_name: String,
}

impl ColumnInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A fully materialized result: schema plus rows.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<DynamicRecord>,
    /// The number of rows read (for SELECT) or affected (for DML statements)
    pub rows_affected: usize,
    columns: Arc<Vec<ColumnInfo>>,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Set the schema shared by all rows. Must be called before rows are added.
    pub fn set_columns(&mut self, columns: Vec<ColumnInfo>) {
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        self.column_index = Arc::new(build_column_index(&names));
        self.column_names = Arc::new(names);
        self.columns = Arc::new(columns);
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> &Arc<Vec<String>> {
        &self.column_names
    }

    /// Add a row to the result set
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        self.results.push(DynamicRecord::with_index(
            Arc::clone(&self.column_names),
            Arc::clone(&self.column_index),
            row_values,
        ));
        self.rows_affected += 1;
    }

    /// First column of the first row.
    #[must_use]
    pub fn scalar(&self) -> Option<&RowValues> {
        self.results.first().and_then(|row| row.get_by_index(0))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Consume the set and return its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<DynamicRecord> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_share_the_schema() {
        let mut rs = ResultSet::with_capacity(2);
        rs.set_columns(vec![ColumnInfo::new("id", "INTEGER"), ColumnInfo::new("name", "TEXT")]);
        rs.add_row_values(vec![RowValues::Int(1), RowValues::Text("a".into())]);
        rs.add_row_values(vec![RowValues::Int(2), RowValues::Null]);

        assert_eq!(rs.rows_affected, 2);
        assert_eq!(rs.results[1].get("id"), Some(&RowValues::Int(2)));
        assert_eq!(rs.results[1].get("missing"), None);
        assert!(Arc::ptr_eq(&rs.results[0].column_names, &rs.results[1].column_names));
        assert_eq!(rs.scalar(), Some(&RowValues::Int(1)));
    }

    #[test]
    fn record_serializes_in_column_order() {
        let mut rs = ResultSet::default();
        rs.set_columns(vec![ColumnInfo::new("z", ""), ColumnInfo::new("a", "")]);
        rs.add_row_values(vec![RowValues::Int(1), RowValues::Bool(true)]);
        let json = serde_json::to_string(&rs.results[0]).unwrap();
        assert_eq!(json, r#"{"z":1,"a":true}"#);
    }
}
