use super::Field;
use crate::schema::{
    app::{FieldId, ModelId},
    db::{ColumnId, TableId},
};

/// How one model is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// The model being mapped
    pub id: ModelId,

    /// Table holding the model's own fields. Single-table descendants share
    /// their parent's table.
    pub table: TableId,

    /// Per-field column mapping, indexed like the model's own fields.
    pub fields: Vec<Option<Field>>,

    /// Columns of `table` holding the record key, in the order of the chain
    /// root's primary key fields.
    pub key: Vec<ColumnId>,

    /// Discriminator column of the chain root's table, if the chain is
    /// polymorphic.
    pub discriminator: Option<ColumnId>,
}

impl Model {
    /// The column storing `field`, if it is a primitive field of this model.
    pub fn column(&self, field: impl Into<FieldId>) -> Option<ColumnId> {
        let field = field.into();
        debug_assert_eq!(field.model, self.id);
        self.fields
            .get(field.index)
            .and_then(Option::as_ref)
            .map(|field| field.column)
    }
}
