use super::{Field, FieldId, Schema};

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub fields: Vec<ForeignKeyField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyField {
    /// The field on the source model that is acting as the foreign key. For a
    /// model deeper in an inheritance chain this may be a field declared on
    /// one of its ancestors.
    pub source: FieldId,

    /// The field on the target model that this FK field maps to.
    pub target: FieldId,
}

impl ForeignKeyField {
    pub fn source<'a>(&self, schema: &'a Schema) -> &'a Field {
        schema.field(self.source)
    }

    pub fn target<'a>(&self, schema: &'a Schema) -> &'a Field {
        schema.field(self.target)
    }
}
