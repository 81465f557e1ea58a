mod result_set;
mod row;

pub use result_set::{ColumnInfo, ResultSet};
pub use row::DynamicRecord;
