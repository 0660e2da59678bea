use super::{ColumnId, TableId};

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    /// Uniquely identifies the index within the schema
    pub id: IndexId,

    /// Index name is unique within the schema
    pub name: String,

    /// The table being indexed
    pub on: TableId,

    /// Columns included in the index.
    pub columns: Vec<ColumnId>,

    /// When `true`, indexed entries are unique
    pub unique: bool,

    /// When `true`, the index indexes the table's primary key columns.
    pub primary_key: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct IndexId {
    pub table: TableId,
    pub index: usize,
}

impl IndexId {
    pub(crate) fn placeholder() -> Self {
        Self {
            table: TableId::placeholder(),
            index: usize::MAX,
        }
    }
}

impl fmt::Debug for IndexId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "IndexId({}/{})", self.table.0, self.index)
    }
}
