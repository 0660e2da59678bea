use crate::schema::db::ColumnId;

/// Maps a single primitive model field to its corresponding table column.
///
/// Only primitive fields have a `Field` mapping. Relation fields do not map
/// directly to columns and are represented as `None` in the parent
/// `Model::fields` vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The table column that stores this field's value.
    pub column: ColumnId,
}
