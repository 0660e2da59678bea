use super::*;

use crate::{schema::db::ColumnId, stmt};

#[derive(Debug, Clone)]
pub struct Insert {
    /// Table receiving the row
    pub table: TableId,

    /// Columns being set. Omitted columns are stored as null, or assigned
    /// when auto-incremented.
    pub columns: Vec<ColumnId>,

    /// One value per entry in `columns`
    pub values: stmt::ValueRecord,

    /// Columns of the stored row to return
    pub returning: Vec<ColumnId>,
}

impl From<Insert> for Operation {
    fn from(value: Insert) -> Self {
        Self::Insert(value)
    }
}
