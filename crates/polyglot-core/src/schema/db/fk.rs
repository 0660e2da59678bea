use super::{ColumnId, TableId};

/// A foreign key constraint between two tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    /// Referencing columns, all on the same table
    pub columns: Vec<ColumnId>,

    /// The referenced table
    pub references: TableId,

    /// Referenced columns, in the same order as `columns`
    pub referenced_columns: Vec<ColumnId>,

    pub on_delete: OnDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Deleting the referenced row deletes the referencing rows
    Cascade,

    /// Deleting a referenced row is rejected
    NoAction,
}

impl OnDelete {
    pub fn is_cascade(self) -> bool {
        matches!(self, Self::Cascade)
    }
}
