use super::{Field, FieldId, Inherits, Localization, Localize, Name, PrimaryKey};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Uniquely identifies the model within the schema
    pub id: ModelId,

    /// Name of the model
    pub name: Name,

    /// Fields declared by the model itself. Fields of ancestors are reached by
    /// walking the inheritance chain.
    pub fields: Vec<Field>,

    /// The primary key. Only the root of an inheritance chain declares one;
    /// descendants share the root's key.
    pub primary_key: Option<PrimaryKey>,

    /// If the schema specifies a table to map the model to, this is set.
    pub table_name: Option<String>,

    /// Structural parent, if the model is part of an inheritance chain
    pub inherits: Option<Inherits>,

    /// Field recording the concrete model of each record. Only set on the root
    /// of a polymorphic chain.
    pub discriminator: Option<FieldId>,

    /// Value stored in the discriminator for records of this model
    pub identity: String,

    /// Distinguishes declared entities from generated localized models
    pub kind: ModelKind,

    /// The localization directive, as declared
    pub localize: Option<Localize>,

    /// Set once the localization directive has been expanded
    pub localization: Option<Localization>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// A declared model
    Entity,

    /// A generated model holding per-locale copies of `owner`'s localizable
    /// fields
    Localized { owner: ModelId },
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub usize);

impl Model {
    /// Creates an entity model with no fields.
    pub fn new(id: ModelId, name: &str) -> Self {
        let name = Name::new(name);
        Self {
            id,
            identity: name.snake_case(),
            name,
            fields: vec![],
            primary_key: None,
            table_name: None,
            inherits: None,
            discriminator: None,
            kind: ModelKind::Entity,
            localize: None,
            localization: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.inherits.is_none()
    }

    pub fn is_localized_model(&self) -> bool {
        matches!(self.kind, ModelKind::Localized { .. })
    }

    /// For generated localized models, the entity they translate.
    pub fn owner(&self) -> Option<ModelId> {
        match self.kind {
            ModelKind::Localized { owner } => Some(owner),
            ModelKind::Entity => None,
        }
    }

    pub fn parent(&self) -> Option<ModelId> {
        self.inherits.as_ref().map(|inherits| inherits.parent)
    }

    pub fn field(&self, field: impl Into<FieldId>) -> &Field {
        let field_id = field.into();
        assert_eq!(self.id, field_id.model);
        &self.fields[field_id.index]
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name.app_name == name)
    }

    pub fn field_by_name_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields
            .iter_mut()
            .find(|field| field.name.app_name == name)
    }

    /// Iterate over the fields used for the model's primary key. Returns
    /// `None` when the key is inherited.
    pub fn primary_key_fields(&self) -> Option<impl ExactSizeIterator<Item = &'_ Field>> {
        self.primary_key
            .as_ref()
            .map(|pk| pk.fields.iter().map(|pk_field| &self.fields[pk_field.index]))
    }

    /// Appends a field, assigning its id.
    pub fn push_field(&mut self, mut field: Field) -> FieldId {
        let id = self.id.field(self.fields.len());
        field.id = id;
        self.fields.push(field);
        id
    }
}

impl ModelId {
    /// Create a `FieldId` representing the current model's field at index
    /// `index`.
    pub const fn field(self, index: usize) -> FieldId {
        FieldId { model: self, index }
    }

    pub(crate) const fn placeholder() -> Self {
        Self(usize::MAX)
    }
}

impl From<&Self> for ModelId {
    fn from(src: &Self) -> Self {
        *src
    }
}

impl From<&mut Self> for ModelId {
    fn from(src: &mut Self) -> Self {
        *src
    }
}

impl From<&Model> for ModelId {
    fn from(value: &Model) -> Self {
        value.id
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ModelId({})", self.0)
    }
}
