mod delete_by_key;
pub use delete_by_key::DeleteByKey;

mod get_by_key;
pub use get_by_key::GetByKey;

mod insert;
pub use insert::Insert;

mod query_by_columns;
pub use query_by_columns::{Condition, QueryByColumns};

mod update_by_key;
pub use update_by_key::UpdateByKey;

use crate::schema::db::TableId;

#[derive(Debug, Clone)]
pub enum Operation {
    /// Create a new row
    Insert(Insert),

    /// Delete rows identified by the given keys.
    DeleteByKey(DeleteByKey),

    /// Get one or more rows by the primary key
    GetByKey(GetByKey),

    /// Scan a table, filtering on column values
    QueryByColumns(QueryByColumns),

    /// Update rows by the primary key
    UpdateByKey(UpdateByKey),
}

impl Operation {
    /// The table the operation applies to
    pub fn table(&self) -> TableId {
        match self {
            Self::Insert(op) => op.table,
            Self::DeleteByKey(op) => op.table,
            Self::GetByKey(op) => op.table,
            Self::QueryByColumns(op) => op.table,
            Self::UpdateByKey(op) => op.table,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::DeleteByKey(_) => "delete_by_key",
            Self::GetByKey(_) => "get_by_key",
            Self::QueryByColumns(_) => "query_by_columns",
            Self::UpdateByKey(_) => "update_by_key",
        }
    }
}
