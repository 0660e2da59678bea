use super::{
    BelongsTo, Field, FieldId, FieldPrimitive, FieldTy, ForeignKey, ForeignKeyField, HasMany,
    Inherits, Model, ModelId, ModelKind, PrimaryKey,
};
use crate::{schema::db, stmt, Error, Result};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Locale whose values live on the entity itself unless configured otherwise.
pub const DEFAULT_LOCALE: &str = "en";

/// The localization directive attached to a model declaration.
///
/// Deserializes from configuration; absent keys fall back to no localized
/// fields and [`DEFAULT_LOCALE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Localize {
    /// Names of the model's own fields that get per-locale copies
    pub for_fields: Vec<String>,

    /// Locale for which the entity's own fields are authoritative
    pub default_locale: String,
}

/// The result of expanding a [`Localize`] directive on an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Localization {
    /// Localizable fields declared on the entity itself. Fields localized by
    /// ancestors are found on the ancestors' localizations.
    pub fields: Vec<FieldId>,

    /// Default locale for records inserted without one
    pub default_locale: String,

    /// The generated localized model
    pub model: ModelId,

    /// The entity's `HasMany` relation to its localized records
    pub relation: FieldId,

    /// The field storing each record's default locale. Declared on the first
    /// localized model of the chain.
    pub default_locale_field: FieldId,
}

impl Localization {
    /// Field on the entity holding the record's default locale
    pub const DEFAULT_LOCALE_FIELD: &'static str = "default_locale";

    /// Locale component of a localized record's key
    pub const LOCALE_FIELD: &'static str = "locale_id";

    /// Owner component of a localized record's key
    pub const OWNER_FIELD: &'static str = "translated_id";

    /// Discriminator of the root localized table
    pub const DISCRIMINATOR_FIELD: &'static str = "translated_type";

    /// Back-reference from a localized record to its owner
    pub const OWNER_RELATION: &'static str = "translated";

    /// Width of the discriminator column
    pub const DISCRIMINATOR_WIDTH: u64 = 40;

    /// Name of the relation from an entity to its localized records.
    ///
    /// Model names are normalized, so `audio_book` and `AudioBook` both give
    /// `AudioBook_localized_versions`.
    pub fn relation_name(entity: &Model) -> String {
        format!("{}_localized_versions", entity.name.upper_camel_case())
    }
}

impl Localize {
    pub fn for_fields<I>(fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            for_fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }
}

impl Default for Localize {
    fn default() -> Self {
        Self {
            for_fields: vec![],
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

/// Expands the localization directive of one model: derives its localized
/// model, wires the relation pair and records the result on the entity.
///
/// Ancestors must have been expanded already.
pub(super) struct ExpandLocalized<'a> {
    pub(super) models: &'a mut IndexMap<ModelId, Model>,
}

impl ExpandLocalized<'_> {
    pub(super) fn expand(&mut self, id: ModelId) -> Result<()> {
        let Some(localize) = self.models[&id].localize.clone() else {
            return Ok(());
        };

        let owner_pk = self.owner_primary_key(id)?;
        let fields = self.resolve_localized_fields(id, &localize)?;
        let ancestor = self.nearest_localized_ancestor(id);

        if ancestor.is_none() {
            self.check_table_not_localized_elsewhere(id)?;
        }

        let default_locale_field = match ancestor {
            Some(ancestor) => self.localization(ancestor).default_locale_field,
            None => self.default_locale_field(id, &localize.default_locale)?,
        };

        let shadow_id = ModelId(
            self.models
                .keys()
                .map(|id| id.0 + 1)
                .max()
                .unwrap_or_default(),
        );

        let mut shadow = self.shadow_model(shadow_id, id, &fields);

        let owner_source = match ancestor {
            Some(ancestor) => {
                let parent = self.localization(ancestor).model;
                let strategy = self.models[&id]
                    .inherits
                    .as_ref()
                    .map(|inherits| inherits.strategy)
                    .ok_or_else(|| {
                        Error::invalid_schema(format!(
                            "model `{}` has a localized ancestor but no parent",
                            self.models[&id].name.upper_camel_case()
                        ))
                    })?;

                shadow.inherits = Some(Inherits { parent, strategy });

                // Descendants share the key of the root localized model.
                let root = self.chain_root(parent);
                self.models[&root]
                    .primary_key
                    .as_ref()
                    .map(|pk| pk.fields[0])
                    .ok_or_else(|| Error::invalid_schema("localized root has no primary key"))?
            }
            None => {
                let owner_ty = self.models[&owner_pk.model].fields[owner_pk.index]
                    .ty
                    .expect_primitive()
                    .ty;
                Self::push_shadow_identity(&mut shadow, owner_ty)
            }
        };

        shadow.push_field(Field {
            ty: BelongsTo {
                target: id,
                pair: None,
                foreign_key: ForeignKey {
                    fields: vec![ForeignKeyField {
                        source: owner_source,
                        target: owner_pk,
                    }],
                },
            }
            .into(),
            ..Field::primitive(
                FieldId::placeholder(),
                Localization::OWNER_RELATION,
                stmt::Type::I64,
            )
        });

        let relation_name = Localization::relation_name(&self.models[&id]);
        let entity = self
            .models
            .get_mut(&id)
            .ok_or_else(|| Error::invalid_schema("localized model disappeared during expansion"))?;

        let relation = entity.push_field(Field {
            ty: HasMany {
                target: shadow_id,
                pair: FieldId::placeholder(),
                cascade_delete: true,
            }
            .into(),
            ..Field::primitive(FieldId::placeholder(), relation_name, stmt::Type::I64)
        });

        tracing::debug!(
            entity = %entity.name.upper_camel_case(),
            localized = %shadow.name.upper_camel_case(),
            fields = fields.len(),
            inherits = ?shadow.inherits.as_ref().map(|inherits| inherits.parent),
            "expanded localization"
        );

        entity.localization = Some(Localization {
            fields,
            default_locale: localize.default_locale,
            model: shadow_id,
            relation,
            default_locale_field,
        });

        self.models.insert(shadow_id, shadow);

        Ok(())
    }

    /// The entity's key, which must be a single field.
    fn owner_primary_key(&self, id: ModelId) -> Result<FieldId> {
        let root = self.chain_root(id);
        let pk_fields = self.models[&root]
            .primary_key
            .as_ref()
            .map(|pk| &pk.fields[..])
            .unwrap_or_default();

        match pk_fields {
            [pk_field] => Ok(*pk_field),
            _ => Err(Error::invalid_schema(format!(
                "model `{}` must have a single primary key field to be localized, found {}",
                self.models[&id].name.upper_camel_case(),
                pk_fields.len()
            ))),
        }
    }

    fn resolve_localized_fields(&self, id: ModelId, localize: &Localize) -> Result<Vec<FieldId>> {
        let model = &self.models[&id];
        let model_name = model.name.upper_camel_case();
        let mut fields = vec![];

        for name in &localize.for_fields {
            let Some(field) = model.field_by_name(name) else {
                return Err(Error::invalid_schema(format!(
                    "localized field `{name}` is not declared on `{model_name}`"
                )));
            };

            if !field.ty.is_primitive() || field.primary_key {
                return Err(Error::invalid_schema(format!(
                    "field `{model_name}::{name}` cannot be localized; only non-key primitive \
                     fields can"
                )));
            }

            if !fields.contains(&field.id) {
                fields.push(field.id);
            }
        }

        Ok(fields)
    }

    /// Reuses a declared `default_locale` string field or adds one.
    fn default_locale_field(&mut self, id: ModelId, default_locale: &str) -> Result<FieldId> {
        let model = self
            .models
            .get_mut(&id)
            .ok_or_else(|| Error::invalid_schema("unknown model"))?;
        let model_name = model.name.upper_camel_case();

        if let Some(field) = model.field_by_name_mut(Localization::DEFAULT_LOCALE_FIELD) {
            return match &field.ty {
                FieldTy::Primitive(primitive) if primitive.ty == stmt::Type::String => {
                    field
                        .default
                        .get_or_insert_with(|| stmt::Value::from(default_locale));
                    Ok(field.id)
                }
                _ => Err(Error::invalid_schema(format!(
                    "field `{model_name}::{}` must be a string to hold the default locale",
                    Localization::DEFAULT_LOCALE_FIELD
                ))),
            };
        }

        Ok(model.push_field(Field {
            default: Some(stmt::Value::from(default_locale)),
            ..Field::primitive(
                FieldId::placeholder(),
                Localization::DEFAULT_LOCALE_FIELD,
                stmt::Type::String,
            )
        }))
    }

    fn shadow_model(&self, shadow_id: ModelId, owner: ModelId, fields: &[FieldId]) -> Model {
        let entity = &self.models[&owner];
        let mut shadow = Model::new(
            shadow_id,
            &format!("{}Localized", entity.name.upper_camel_case()),
        );
        shadow.identity = format!("{}_localized", entity.name.snake_case());
        shadow.kind = ModelKind::Localized { owner };

        for field_id in fields {
            let source = &entity.fields[field_id.index];

            // Translations may leave any localized field unset.
            shadow.push_field(Field {
                id: FieldId::placeholder(),
                name: source.name.clone(),
                ty: source.ty.clone(),
                nullable: true,
                primary_key: false,
                auto_increment: false,
                default: None,
            });
        }

        shadow
    }

    /// Adds the owner key, locale and discriminator fields of a localized
    /// root model. Returns the owner key field.
    fn push_shadow_identity(shadow: &mut Model, owner_ty: stmt::Type) -> FieldId {
        let translated_id = shadow.push_field(Field {
            primary_key: true,
            ..Field::primitive(
                FieldId::placeholder(),
                Localization::OWNER_FIELD,
                owner_ty,
            )
        });

        let locale_id = shadow.push_field(Field {
            primary_key: true,
            ..Field::primitive(
                FieldId::placeholder(),
                Localization::LOCALE_FIELD,
                stmt::Type::String,
            )
        });

        let discriminator = shadow.push_field(Field {
            ty: FieldPrimitive {
                ty: stmt::Type::String,
                storage_ty: Some(db::Type::VarChar(Localization::DISCRIMINATOR_WIDTH)),
            }
            .into(),
            ..Field::primitive(
                FieldId::placeholder(),
                Localization::DISCRIMINATOR_FIELD,
                stmt::Type::String,
            )
        });

        shadow.primary_key = Some(PrimaryKey {
            fields: vec![translated_id, locale_id],
        });
        shadow.discriminator = Some(discriminator);

        translated_id
    }

    /// Models stored in the same table may only be localized through a
    /// common localized ancestor.
    fn check_table_not_localized_elsewhere(&self, id: ModelId) -> Result<()> {
        let table_owner = self.table_owner(id);

        let other = self.models.values().find(|model| {
            model.id != id
                && model.localization.is_some()
                && self.nearest_localized_ancestor(model.id).is_none()
                && self.table_owner(model.id) == table_owner
        });

        match other {
            Some(other) => Err(Error::invalid_schema(format!(
                "`{}` and `{}` are both stored in the table of `{}` and localized separately; \
                 single-table models must share a localized ancestor",
                other.name.upper_camel_case(),
                self.models[&id].name.upper_camel_case(),
                self.models[&table_owner].name.upper_camel_case(),
            ))),
            None => Ok(()),
        }
    }

    /// The model whose table stores the records of `id`.
    fn table_owner(&self, id: ModelId) -> ModelId {
        let mut curr = id;
        while let Some(inherits) = self.models.get(&curr).and_then(|m| m.inherits.as_ref()) {
            if !inherits.strategy.is_single() {
                break;
            }
            curr = inherits.parent;
        }
        curr
    }

    fn nearest_localized_ancestor(&self, id: ModelId) -> Option<ModelId> {
        let mut curr = self.models[&id].parent();

        while let Some(ancestor) = curr {
            let model = self.models.get(&ancestor)?;
            if model.localization.is_some() {
                return Some(ancestor);
            }
            curr = model.parent();
        }

        None
    }

    fn localization(&self, id: ModelId) -> &Localization {
        self.models[&id]
            .localization
            .as_ref()
            .expect("ancestors are expanded before their descendants")
    }

    fn chain_root(&self, id: ModelId) -> ModelId {
        let mut curr = id;
        while let Some(parent) = self.models.get(&curr).and_then(Model::parent) {
            curr = parent;
        }
        curr
    }
}
