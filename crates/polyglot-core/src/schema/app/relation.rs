use super::{FieldId, FieldTy, ForeignKey, Model, ModelId, Schema};

#[derive(Debug, Clone, PartialEq)]
pub struct BelongsTo {
    /// Model that owns the relation
    pub target: ModelId,

    /// The `HasMany` association that pairs with this
    pub pair: Option<FieldId>,

    /// The foreign key is a set of primitive fields that match the target's
    /// primary key.
    pub foreign_key: ForeignKey,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HasMany {
    /// Associated model
    pub target: ModelId,

    /// The `BelongsTo` association that pairs with this
    pub pair: FieldId,

    /// When `true`, deleting the owner deletes every associated record first.
    pub cascade_delete: bool,
}

impl BelongsTo {
    pub fn target<'a>(&self, schema: &'a Schema) -> &'a Model {
        schema.model(self.target)
    }
}

impl HasMany {
    pub fn target<'a>(&self, schema: &'a Schema) -> &'a Model {
        schema.model(self.target)
    }

    pub fn pair<'a>(&self, schema: &'a Schema) -> &'a BelongsTo {
        schema.field(self.pair).ty.expect_belongs_to()
    }
}

impl From<BelongsTo> for FieldTy {
    fn from(value: BelongsTo) -> Self {
        Self::BelongsTo(value)
    }
}

impl From<HasMany> for FieldTy {
    fn from(value: HasMany) -> Self {
        Self::HasMany(value)
    }
}
