use super::{BelongsTo, HasMany, Model, ModelId, Schema};
use crate::{schema::db, stmt};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Uniquely identifies the field within the containing model.
    pub id: FieldId,

    /// The field name
    pub name: FieldName,

    /// Primitive or relation
    pub ty: FieldTy,

    /// True if the field can be null.
    pub nullable: bool,

    /// True if the field is part of the primary key
    pub primary_key: bool,

    /// True if the storage layer assigns the value on insert
    pub auto_increment: bool,

    /// Value written when an insert does not provide one
    pub default: Option<stmt::Value>,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FieldId {
    pub model: ModelId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldName {
    pub app_name: String,
    pub storage_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldPrimitive {
    /// The field's type
    pub ty: stmt::Type,

    /// Overrides the default storage type for the field's column
    pub storage_ty: Option<db::Type>,
}

#[derive(Clone, PartialEq)]
pub enum FieldTy {
    Primitive(FieldPrimitive),
    BelongsTo(BelongsTo),
    HasMany(HasMany),
}

impl Field {
    /// Creates a non-key primitive field.
    pub fn primitive(id: FieldId, name: impl Into<String>, ty: stmt::Type) -> Self {
        Self {
            id,
            name: FieldName::new(name),
            ty: FieldTy::Primitive(FieldPrimitive {
                ty,
                storage_ty: None,
            }),
            nullable: false,
            primary_key: false,
            auto_increment: false,
            default: None,
        }
    }

    pub fn is_relation(&self) -> bool {
        self.ty.is_relation()
    }

    /// Returns a fully qualified name for the field.
    pub fn full_name(&self, schema: &Schema) -> String {
        let model = schema.model(self.id.model);
        format!("{}::{}", model.name.upper_camel_case(), self.name.app_name)
    }

    /// If the field is a relation, return the relation's target ModelId.
    pub fn relation_target_id(&self) -> Option<ModelId> {
        match &self.ty {
            FieldTy::BelongsTo(belongs_to) => Some(belongs_to.target),
            FieldTy::HasMany(has_many) => Some(has_many.target),
            FieldTy::Primitive(_) => None,
        }
    }

    /// If the field is a relation, return the target of the relation.
    pub fn relation_target<'a>(&self, schema: &'a Schema) -> Option<&'a Model> {
        self.relation_target_id().map(|id| schema.model(id))
    }
}

impl FieldId {
    pub(crate) fn placeholder() -> Self {
        Self {
            model: ModelId::placeholder(),
            index: usize::MAX,
        }
    }

    pub(crate) fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }
}

impl fmt::Debug for FieldId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "FieldId({}/{})", self.model.0, self.index)
    }
}

impl From<&Self> for FieldId {
    fn from(src: &Self) -> Self {
        *src
    }
}

impl From<&Field> for FieldId {
    fn from(value: &Field) -> Self {
        value.id
    }
}

impl FieldName {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            storage_name: None,
        }
    }

    pub fn storage_name(&self) -> &str {
        self.storage_name.as_ref().unwrap_or(&self.app_name)
    }
}

impl FieldTy {
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(..))
    }

    pub fn as_primitive(&self) -> Option<&FieldPrimitive> {
        match self {
            Self::Primitive(primitive) => Some(primitive),
            _ => None,
        }
    }

    #[track_caller]
    pub fn expect_primitive(&self) -> &FieldPrimitive {
        match self {
            Self::Primitive(primitive) => primitive,
            _ => panic!("expected primitive, but was {self:?}"),
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, Self::BelongsTo(..) | Self::HasMany(..))
    }

    pub fn is_belongs_to(&self) -> bool {
        matches!(self, Self::BelongsTo(..))
    }

    pub fn as_belongs_to(&self) -> Option<&BelongsTo> {
        match self {
            Self::BelongsTo(belongs_to) => Some(belongs_to),
            _ => None,
        }
    }

    #[track_caller]
    pub fn expect_belongs_to(&self) -> &BelongsTo {
        match self {
            Self::BelongsTo(belongs_to) => belongs_to,
            _ => panic!("expected field to be `BelongsTo`, but was {self:?}"),
        }
    }

    #[track_caller]
    pub fn expect_belongs_to_mut(&mut self) -> &mut BelongsTo {
        match self {
            Self::BelongsTo(belongs_to) => belongs_to,
            _ => panic!("expected field to be `BelongsTo`, but was {self:?}"),
        }
    }

    pub fn is_has_many(&self) -> bool {
        matches!(self, Self::HasMany(..))
    }

    pub fn as_has_many(&self) -> Option<&HasMany> {
        match self {
            Self::HasMany(has_many) => Some(has_many),
            _ => None,
        }
    }

    #[track_caller]
    pub fn expect_has_many(&self) -> &HasMany {
        match self {
            Self::HasMany(has_many) => has_many,
            _ => panic!("expected field to be `HasMany`, but was {self:?}"),
        }
    }

    #[track_caller]
    pub fn expect_has_many_mut(&mut self) -> &mut HasMany {
        match self {
            Self::HasMany(has_many) => has_many,
            _ => panic!("expected field to be `HasMany`, but was {self:?}"),
        }
    }
}

impl fmt::Debug for FieldTy {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(ty) => ty.fmt(fmt),
            Self::BelongsTo(ty) => ty.fmt(fmt),
            Self::HasMany(ty) => ty.fmt(fmt),
        }
    }
}

impl From<FieldPrimitive> for FieldTy {
    fn from(value: FieldPrimitive) -> Self {
        Self::Primitive(value)
    }
}
