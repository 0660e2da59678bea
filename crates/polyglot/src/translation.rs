use crate::{engine::Record, Entity};

use indexmap::IndexMap;
use polyglot_core::{
    schema::app::{Localization, ModelId},
    stmt::Value,
    Schema,
};

/// A stored translation of an entity into one locale.
///
/// Holds the localized values of every level of the owner's chain. Fields that
/// are not localized are read from the owner.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalizedRecord {
    model: ModelId,
    model_name: String,
    values: IndexMap<String, Value>,
    owner: Entity,
}

/// Result of looking up an entity in a locale.
#[derive(Debug, Clone, PartialEq)]
pub enum Translation<'a> {
    /// The entity itself; the locale was its default locale
    Default(&'a Entity),

    /// A stored translation
    Localized(LocalizedRecord),
}

impl LocalizedRecord {
    pub(crate) fn from_record(schema: &Schema, record: Record, owner: Entity) -> Self {
        Self {
            model: record.model,
            model_name: schema.app.model(record.model).name.upper_camel_case(),
            values: record.values,
            owner,
        }
    }

    /// The concrete localized model
    pub fn model_id(&self) -> ModelId {
        self.model
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn locale(&self) -> &str {
        self.values
            .get(Localization::LOCALE_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Snapshot of the owner taken when the translation was loaded.
    pub fn owner(&self) -> &Entity {
        &self.owner
    }

    /// Reads a field from the translation, falling back to the owner for
    /// fields that are not localized.
    ///
    /// A localized field the translation leaves unset reads as `Null`.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.values
            .get(name)
            .or_else(|| self.owner.get_field(name))
    }

    /// The translation's own fields, including its key and row type.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

impl Translation<'_> {
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Default(entity) => entity.get_field(name),
            Self::Localized(record) => record.get_field(name),
        }
    }

    pub fn locale(&self) -> &str {
        match self {
            Self::Default(entity) => entity.default_locale().unwrap_or_default(),
            Self::Localized(record) => record.locale(),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default(_))
    }

    pub fn as_localized(&self) -> Option<&LocalizedRecord> {
        match self {
            Self::Localized(record) => Some(record),
            Self::Default(_) => None,
        }
    }

    pub fn into_localized(self) -> Option<LocalizedRecord> {
        match self {
            Self::Localized(record) => Some(record),
            Self::Default(_) => None,
        }
    }

    /// The entity itself, for the default locale.
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Default(entity) => Some(entity),
            Self::Localized(_) => None,
        }
    }
}
