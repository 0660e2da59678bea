use super::*;
use crate::stmt;

#[derive(Debug, Clone)]
pub struct DeleteByKey {
    /// Which table to delete from
    pub table: TableId,

    /// Which keys to delete. Each record lists the key columns in primary key
    /// order.
    pub keys: Vec<stmt::ValueRecord>,
}

impl From<DeleteByKey> for Operation {
    fn from(value: DeleteByKey) -> Self {
        Self::DeleteByKey(value)
    }
}
