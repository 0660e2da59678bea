use super::*;

use crate::{schema::db::ColumnId, stmt};

#[derive(Debug, Clone)]
pub struct UpdateByKey {
    /// Which table to update
    pub table: TableId,

    /// Which keys to update
    pub keys: Vec<stmt::ValueRecord>,

    /// Column assignments. Key columns cannot be assigned.
    pub assignments: Vec<(ColumnId, stmt::Value)>,
}

impl From<UpdateByKey> for Operation {
    fn from(value: UpdateByKey) -> Self {
        Self::UpdateByKey(value)
    }
}
