use super::{ColumnId, IndexId};

#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKey {
    /// Columns composing the primary key
    pub columns: Vec<ColumnId>,

    /// Primary key index
    pub index: IndexId,
}
