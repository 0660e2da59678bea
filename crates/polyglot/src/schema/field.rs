use super::{StorageType, Type};
use crate::stmt::Value;

/// A primitive field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub nullable: bool,
    pub default: Option<Value>,
    pub storage_name: Option<String>,
    pub storage_ty: Option<StorageType>,
}

impl Field {
    pub fn primitive(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            primary_key: false,
            auto_increment: false,
            nullable: false,
            default: None,
            storage_name: None,
            storage_ty: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// The storage layer assigns the value on insert.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Value written when an insert does not provide one.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Column name, when it differs from the field name.
    pub fn storage_name(mut self, name: impl Into<String>) -> Self {
        self.storage_name = Some(name.into());
        self
    }

    pub fn storage_ty(mut self, ty: StorageType) -> Self {
        self.storage_ty = Some(ty);
        self
    }
}
