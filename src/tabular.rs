//! Caller-owned tabular containers filled from result sets.

use crate::results::{ColumnInfo, ResultSet};
use crate::types::RowValues;

/// One column of a [`DataTable`] schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataColumn {
    pub name: String,
    pub type_name: String,
}

/// Schema plus rows. Row values are stored in schema column order.
///
/// With a primary key, loading refreshes the row whose key matches instead of appending a
/// duplicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    pub name: String,
    columns: Vec<DataColumn>,
    rows: Vec<Vec<RowValues>>,
    primary_key: Vec<String>,
}

impl DataTable {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Key rows on `columns`. The key applies once every named column is in the schema.
    #[must_use]
    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    #[must_use]
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    #[must_use]
    pub fn columns(&self) -> &[DataColumn] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<RowValues>] {
        &self.rows
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Value at `row` in the column called `column`.
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> Option<&RowValues> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Add every result column the table does not have yet; existing rows get NULL there.
    pub fn fill_schema(&mut self, columns: &[ColumnInfo]) {
        for column in columns {
            if self.column_index(&column.name).is_none() {
                self.columns.push(DataColumn {
                    name: column.name.clone(),
                    type_name: column.type_name.clone(),
                });
                for row in &mut self.rows {
                    row.push(RowValues::Null);
                }
            }
        }
    }

    /// Load the result rows, matching columns by name. Returns the number of rows added or
    /// refreshed.
    ///
    /// Table columns absent from the result are NULL in new rows; result columns absent from
    /// the table are dropped, so call [`DataTable::fill_schema`] first to keep them. When the
    /// primary key is in effect, a row whose non-NULL key matches an existing row overwrites
    /// that row's loaded columns.
    pub fn load(&mut self, result_set: &ResultSet) -> usize {
        let mapping: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|c| result_set.column_names().iter().position(|n| *n == c.name))
            .collect();
        let key: Option<Vec<usize>> = if self.primary_key.is_empty() {
            None
        } else {
            self.primary_key
                .iter()
                .map(|k| self.column_index(k))
                .collect()
        };

        for record in &result_set.results {
            let row: Vec<RowValues> = mapping
                .iter()
                .map(|src| {
                    src.and_then(|idx| record.get_by_index(idx))
                        .cloned()
                        .unwrap_or(RowValues::Null)
                })
                .collect();

            match key.as_deref().and_then(|key| self.find_by_key(key, &row)) {
                Some(pos) => {
                    let existing = &mut self.rows[pos];
                    for ((slot, value), src) in existing.iter_mut().zip(row).zip(&mapping) {
                        if src.is_some() {
                            *slot = value;
                        }
                    }
                }
                None => self.rows.push(row),
            }
        }
        result_set.results.len()
    }

    fn find_by_key(&self, key: &[usize], row: &[RowValues]) -> Option<usize> {
        if key.iter().any(|&k| row[k].is_null()) {
            return None;
        }
        self.rows
            .iter()
            .position(|existing| key.iter().all(|&k| existing[k] == row[k]))
    }
}

/// A collection of tables, one per result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    pub tables: Vec<DataTable>,
}

impl DataSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn table(&self, name: &str) -> Option<&DataTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Fill `Table`, `Table1`, `Table2`... from the result sets, creating missing tables and
    /// appending to existing ones. Returns the total number of rows added.
    pub fn fill(&mut self, result_sets: &[ResultSet]) -> usize {
        let mut added = 0;
        for (idx, result_set) in result_sets.iter().enumerate() {
            let name = if idx == 0 {
                "Table".to_string()
            } else {
                format!("Table{idx}")
            };
            let pos = match self.tables.iter().position(|t| t.name == name) {
                Some(pos) => pos,
                None => {
                    self.tables.push(DataTable::new(name));
                    self.tables.len() - 1
                }
            };
            let table = &mut self.tables[pos];
            table.fill_schema(result_set.columns());
            added += table.load(result_set);
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_set(columns: &[&str], rows: Vec<Vec<RowValues>>) -> ResultSet {
        let mut rs = ResultSet::default();
        rs.set_columns(columns.iter().map(|c| ColumnInfo::new(*c, "")).collect());
        for row in rows {
            rs.add_row_values(row);
        }
        rs
    }

    #[test]
    fn fill_merges_schema_and_appends() {
        let mut table = DataTable::new("people");
        let first = result_set(&["id"], vec![vec![RowValues::Int(1)]]);
        table.fill_schema(first.columns());
        table.load(&first);

        let second = result_set(
            &["name", "id"],
            vec![vec![RowValues::Text("b".into()), RowValues::Int(2)]],
        );
        table.fill_schema(second.columns());
        table.load(&second);

        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.value(0, "name"), Some(&RowValues::Null));
        assert_eq!(table.value(1, "id"), Some(&RowValues::Int(2)));
        assert_eq!(table.value(1, "name"), Some(&RowValues::Text("b".into())));
    }

    #[test]
    fn primary_key_refreshes_matching_rows() {
        let mut table = DataTable::new("stock").with_primary_key(&["sku"]);
        let first = result_set(
            &["sku", "qty"],
            vec![
                vec![RowValues::Text("a".into()), RowValues::Int(1)],
                vec![RowValues::Text("b".into()), RowValues::Int(2)],
            ],
        );
        table.fill_schema(first.columns());
        assert_eq!(table.load(&first), 2);

        let second = result_set(
            &["sku", "qty"],
            vec![
                vec![RowValues::Text("b".into()), RowValues::Int(20)],
                vec![RowValues::Text("c".into()), RowValues::Int(3)],
                vec![RowValues::Null, RowValues::Int(4)],
            ],
        );
        assert_eq!(table.load(&second), 3);

        assert_eq!(table.rows().len(), 4);
        assert_eq!(table.value(1, "qty"), Some(&RowValues::Int(20)));
        assert_eq!(table.value(2, "sku"), Some(&RowValues::Text("c".into())));
        assert_eq!(table.value(3, "sku"), Some(&RowValues::Null));
    }

    #[test]
    fn key_on_missing_column_appends() {
        let mut table = DataTable::new("t").with_primary_key(&["id"]);
        let rs = result_set(&["name"], vec![vec![RowValues::Text("x".into())]]);
        table.fill_schema(rs.columns());
        table.load(&rs);
        table.load(&rs);
        assert_eq!(table.rows().len(), 2);
    }

    #[test]
    fn data_set_names_tables_per_result() {
        let mut set = DataSet::new();
        let added = set.fill(&[
            result_set(&["a"], vec![vec![RowValues::Int(1)]]),
            result_set(&["b"], vec![]),
        ]);
        assert_eq!(added, 1);
        assert_eq!(set.tables.len(), 2);
        assert!(set.table("Table").is_some());
        assert_eq!(set.table("Table1").unwrap().columns()[0].name, "b");
    }
}
