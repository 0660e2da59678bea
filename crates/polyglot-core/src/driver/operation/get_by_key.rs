use super::*;

use crate::{schema::db::ColumnId, stmt};

#[derive(Debug, Clone)]
pub struct GetByKey {
    /// Which table to get from
    pub table: TableId,

    /// Which columns to select
    pub select: Vec<ColumnId>,

    /// Which keys to fetch. Keys without a row are skipped.
    pub keys: Vec<stmt::ValueRecord>,
}

impl From<GetByKey> for Operation {
    fn from(value: GetByKey) -> Self {
        Self::GetByKey(value)
    }
}
