use crate::engine::Record;

use indexmap::IndexMap;
use polyglot_core::{
    schema::app::{Localization, ModelId},
    stmt::{Value, ValueRecord},
    Schema,
};

/// A stored record of a declared model.
///
/// Holds the values of every field along the model's inheritance chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    model: ModelId,
    model_name: String,
    key: ValueRecord,
    values: IndexMap<String, Value>,
}

impl Entity {
    pub(crate) fn from_record(schema: &Schema, record: Record) -> Self {
        Self {
            model: record.model,
            model_name: schema.app.model(record.model).name.upper_camel_case(),
            key: record.key,
            values: record.values,
        }
    }

    /// The concrete model of the record
    pub fn model_id(&self) -> ModelId {
        self.model
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// The primary key value. For composite keys, the first component.
    pub fn id(&self) -> &Value {
        &self.key[0]
    }

    pub fn key(&self) -> &ValueRecord {
        &self.key
    }

    /// Value of the named field, declared by the model or an ancestor.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Locale for which this entity's own fields are authoritative. `None` if
    /// the model is not localized.
    pub fn default_locale(&self) -> Option<&str> {
        self.values
            .get(Localization::DEFAULT_LOCALE_FIELD)
            .and_then(Value::as_str)
    }
}
