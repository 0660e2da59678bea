use super::{
    localized::ExpandLocalized, Field, FieldId, FieldPrimitive, FieldTy, Localization, Model,
    ModelId, PrimaryKey,
};
use crate::{schema::db, stmt, Error, Result};

use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct Schema {
    pub models: IndexMap<ModelId, Model>,
}

#[derive(Default)]
struct Builder {
    models: IndexMap<ModelId, Model>,
}

impl Schema {
    /// Name of the discriminator added to the root of a polymorphic entity
    /// chain.
    pub const ROW_TYPE_FIELD: &'static str = "row_type";

    pub fn from_models(models: impl IntoIterator<Item = Model>) -> Result<Self> {
        Builder::from_models(models)
    }

    /// Get a field by ID
    pub fn field(&self, id: FieldId) -> &Field {
        self.model(id.model)
            .fields
            .get(id.index)
            .expect("invalid field ID")
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    /// Get a model by ID
    pub fn model(&self, id: impl Into<ModelId>) -> &Model {
        self.models.get(&id.into()).expect("invalid model ID")
    }

    /// Finds a model by name, in any casing.
    pub fn model_by_name(&self, name: &str) -> Option<&Model> {
        let name = super::Name::new(name);
        self.models().find(|model| model.name == name)
    }

    /// The models of `id`'s inheritance chain, root first.
    pub fn chain(&self, id: impl Into<ModelId>) -> Vec<&Model> {
        let mut chain = vec![self.model(id)];
        while let Some(parent) = chain[chain.len() - 1].parent() {
            chain.push(self.model(parent));
        }
        chain.reverse();
        chain
    }

    /// The root of `id`'s inheritance chain.
    pub fn root(&self, id: impl Into<ModelId>) -> &Model {
        let mut model = self.model(id);
        while let Some(parent) = model.parent() {
            model = self.model(parent);
        }
        model
    }

    /// Returns `true` if `id` is `ancestor` or inherits from it.
    pub fn is_a(&self, id: impl Into<ModelId>, ancestor: impl Into<ModelId>) -> bool {
        let ancestor = ancestor.into();
        self.chain(id).iter().any(|model| model.id == ancestor)
    }

    /// The primary key shared by every model of `id`'s chain.
    pub fn primary_key(&self, id: impl Into<ModelId>) -> &PrimaryKey {
        self.root(id)
            .primary_key
            .as_ref()
            .expect("chain roots have a primary key")
    }

    /// Every field of `id`'s chain, root first.
    pub fn fields(&self, id: impl Into<ModelId>) -> impl Iterator<Item = &Field> {
        self.chain(id)
            .into_iter()
            .flat_map(|model| model.fields.iter())
    }

    /// Finds a field by name on `id` or one of its ancestors. Fields declared
    /// further down the chain shadow the ones above.
    pub fn field_by_name(&self, id: impl Into<ModelId>, name: &str) -> Option<&Field> {
        self.chain(id)
            .into_iter()
            .rev()
            .find_map(|model| model.field_by_name(name))
    }

    /// The localization that applies to `id`: its own, or the nearest
    /// localized ancestor's.
    pub fn localization(&self, id: impl Into<ModelId>) -> Option<(&Model, &Localization)> {
        self.chain(id).into_iter().rev().find_map(|model| {
            model
                .localization
                .as_ref()
                .map(|localization| (model, localization))
        })
    }

    /// Every localizable field reachable from a localized model,
    /// root first.
    pub fn localized_fields(&self, id: impl Into<ModelId>) -> Vec<&Field> {
        self.chain(id)
            .into_iter()
            .filter_map(|model| {
                let owner = model.owner()?;
                let localization = self.model(owner).localization.as_ref()?;
                Some(
                    localization
                        .fields
                        .iter()
                        .map(|field_id| self.field(*field_id)),
                )
            })
            .flatten()
            .collect()
    }

    /// Resolves the concrete model of a record read from the root table of a
    /// polymorphic chain.
    pub fn model_by_identity(&self, root: impl Into<ModelId>, identity: &str) -> Option<&Model> {
        let root = self.model(root);
        std::iter::once(root)
            .chain(self.descendants(root.id))
            .find(|model| model.identity == identity)
    }

    /// Models inheriting from `id`, directly or not.
    pub fn descendants(&self, id: impl Into<ModelId>) -> impl Iterator<Item = &Model> {
        let id = id.into();
        self.models()
            .filter(move |model| model.id != id && self.is_a(model.id, id))
    }
}

impl Builder {
    fn from_models(models: impl IntoIterator<Item = Model>) -> Result<Schema> {
        let mut builder = Self::default();

        for model in models {
            let id = model.id;
            if builder.models.insert(id, model).is_some() {
                return Err(Error::invalid_schema(format!("duplicate model id {id:?}")));
            }
        }

        builder.process_models()?;
        builder.into_schema()
    }

    fn into_schema(self) -> Result<Schema> {
        Ok(Schema {
            models: self.models,
        })
    }

    fn process_models(&mut self) -> Result<()> {
        self.verify_inheritance()?;
        self.verify_primary_keys()?;
        self.verify_field_names()?;
        self.add_discriminators()?;

        // Localized models inherit from their ancestors' localized models, so
        // expansion runs from the roots of each chain downwards.
        let mut order: Vec<ModelId> = self.models.keys().copied().collect();
        order.sort_by_key(|id| self.depth(*id));

        for id in order {
            ExpandLocalized {
                models: &mut self.models,
            }
            .expand(id)?;
        }

        // All models have been discovered and initialized at some level, now do
        // the relation linking.
        self.link_relations()?;

        Ok(())
    }

    fn verify_inheritance(&self) -> Result<()> {
        for model in self.models.values() {
            let Some(inherits) = &model.inherits else {
                continue;
            };

            if !self.models.contains_key(&inherits.parent) {
                return Err(Error::invalid_schema(format!(
                    "model `{}` inherits from a model that was not registered with the schema",
                    model.name.upper_camel_case(),
                )));
            }

            // Walking up more steps than there are models means a cycle.
            let mut curr = Some(model.id);
            for _ in 0..=self.models.len() {
                curr = curr.and_then(|id| self.models[&id].parent());
            }

            if curr.is_some() {
                return Err(Error::invalid_schema(format!(
                    "model `{}` is part of an inheritance cycle",
                    model.name.upper_camel_case(),
                )));
            }
        }

        Ok(())
    }

    fn verify_primary_keys(&self) -> Result<()> {
        for model in self.models.values() {
            let model_name = model.name.upper_camel_case();
            let declares_key = model.fields.iter().any(|field| field.primary_key);

            if !model.is_root() {
                if declares_key || model.primary_key.is_some() {
                    return Err(Error::invalid_schema(format!(
                        "model `{model_name}` inherits its primary key and cannot declare one"
                    )));
                }
                continue;
            }

            let Some(primary_key) = &model.primary_key else {
                return Err(Error::invalid_schema(format!(
                    "model `{model_name}` has no primary key"
                )));
            };

            if primary_key.fields.is_empty() {
                return Err(Error::invalid_schema(format!(
                    "model `{model_name}` has no primary key"
                )));
            }

            for field_id in &primary_key.fields {
                let valid = field_id.model == model.id
                    && model
                        .fields
                        .get(field_id.index)
                        .is_some_and(|field| field.primary_key && field.ty.is_primitive());

                if !valid {
                    return Err(Error::invalid_schema(format!(
                        "primary key of `{model_name}` must consist of its own primitive key \
                         fields"
                    )));
                }
            }
        }

        Ok(())
    }

    fn verify_field_names(&self) -> Result<()> {
        for model in self.models.values() {
            for (index, field) in model.fields.iter().enumerate() {
                let name = &field.name.app_name;

                let duplicate = model.fields[..index]
                    .iter()
                    .any(|other| other.name.app_name == *name)
                    || self
                        .ancestors(model.id)
                        .any(|ancestor| ancestor.field_by_name(name).is_some());

                if duplicate {
                    return Err(Error::invalid_schema(format!(
                        "field `{}::{name}` is declared more than once in its inheritance chain",
                        model.name.upper_camel_case(),
                    )));
                }
            }
        }

        Ok(())
    }

    /// Roots with descendants record the concrete model of each row.
    fn add_discriminators(&mut self) -> Result<()> {
        let roots: Vec<ModelId> = self
            .models
            .values()
            .filter(|model| model.is_root() && model.discriminator.is_none())
            .filter(|model| {
                self.models
                    .values()
                    .any(|other| other.parent() == Some(model.id))
            })
            .map(|model| model.id)
            .collect();

        for id in roots {
            let model = &mut self.models[&id];

            if model.field_by_name(Schema::ROW_TYPE_FIELD).is_some() {
                return Err(Error::invalid_schema(format!(
                    "field `{}::{}` is reserved for polymorphic models",
                    model.name.upper_camel_case(),
                    Schema::ROW_TYPE_FIELD,
                )));
            }

            let field = model.push_field(Field {
                ty: FieldPrimitive {
                    ty: stmt::Type::String,
                    storage_ty: Some(db::Type::VarChar(Localization::DISCRIMINATOR_WIDTH)),
                }
                .into(),
                ..Field::primitive(
                    FieldId::placeholder(),
                    Schema::ROW_TYPE_FIELD,
                    stmt::Type::String,
                )
            });
            model.discriminator = Some(field);
        }

        Ok(())
    }

    /// Go through all relations and link them to their pairs
    fn link_relations(&mut self) -> Result<()> {
        // Because arbitrary models will be mutated throughout the linking
        // process, models cannot be iterated as that would hold a reference to
        // `self`. Instead, we use index based iteration.
        for curr in 0..self.models.len() {
            for index in 0..self.models[curr].fields.len() {
                let model = &self.models[curr];
                let src = model.id;
                let field = &model.fields[index];

                if let FieldTy::HasMany(has_many) = &field.ty {
                    let target = has_many.target;
                    let field_name = field.name.app_name.clone();
                    let pair = self.find_belongs_to_pair(src, target, &field_name)?;

                    self.models[curr].fields[index]
                        .ty
                        .expect_has_many_mut()
                        .pair = pair;

                    let pair_model = &mut self.models[&pair.model];
                    pair_model.fields[pair.index]
                        .ty
                        .expect_belongs_to_mut()
                        .pair = Some(src.field(index));
                }
            }
        }

        Ok(())
    }

    fn find_belongs_to_pair(
        &self,
        src: ModelId,
        target: ModelId,
        field_name: &str,
    ) -> Result<FieldId> {
        let src_model = &self.models[&src];

        let Some(target) = self.models.get(&target) else {
            return Err(Error::invalid_schema(format!(
                "field `{}::{}` references a model that was not registered with the schema",
                src_model.name.upper_camel_case(),
                field_name,
            )));
        };

        // Find all BelongsTo relations that reference the model
        let belongs_to: Vec<_> = target
            .fields
            .iter()
            .filter(|field| match &field.ty {
                FieldTy::BelongsTo(rel) => rel.target == src,
                _ => false,
            })
            .collect();

        match &belongs_to[..] {
            [field] => Ok(field.id),
            [] => Err(Error::invalid_schema(format!(
                "field `{}::{}` has no matching `BelongsTo` relation on the target model",
                src_model.name.upper_camel_case(),
                field_name,
            ))),
            _ => Err(Error::invalid_schema(format!(
                "model `{}` has more than one `BelongsTo` relation targeting `{}`",
                target.name.upper_camel_case(),
                src_model.name.upper_camel_case(),
            ))),
        }
    }

    fn ancestors(&self, id: ModelId) -> impl Iterator<Item = &Model> {
        let mut curr = self.models.get(&id).and_then(Model::parent);
        std::iter::from_fn(move || {
            let model = self.models.get(&curr?)?;
            curr = model.parent();
            Some(model)
        })
    }

    fn depth(&self, id: ModelId) -> usize {
        self.ancestors(id).count()
    }
}
