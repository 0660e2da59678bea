use super::Db;
use crate::{driver::Driver, engine::Engine, schema, Error, Result};

use polyglot_core::{
    schema::{
        self as core_schema,
        app::{self, FieldId, FieldName, FieldPrimitive, ModelId},
    },
    stmt,
};
use std::{collections::HashMap, sync::Arc};

#[derive(Debug, Default)]
pub struct Builder {
    /// Model declarations, in registration order
    models: Vec<schema::Model>,

    /// Schema builder
    core: core_schema::Builder,
}

impl Builder {
    pub fn register(&mut self, model: schema::Model) -> &mut Self {
        self.models.push(model);
        self
    }

    /// Set the table name prefix for all tables
    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.core.table_name_prefix(prefix);
        self
    }

    pub fn build_app_schema(&self) -> Result<app::Schema> {
        let mut ids = HashMap::new();

        for (index, model) in self.models.iter().enumerate() {
            if ids.insert(model.name.as_str(), ModelId(index)).is_some() {
                return Err(Error::invalid_schema(format!(
                    "model `{}` is registered more than once",
                    model.name
                )));
            }
        }

        let app_models = self
            .models
            .iter()
            .enumerate()
            .map(|(index, model)| Self::convert_schema_to_app(model, ModelId(index), &ids))
            .collect::<Result<Vec<_>>>()?;

        app::Schema::from_models(app_models)
    }

    /// Builds the schema and registers it with `driver`.
    pub async fn build(&mut self, mut driver: impl Driver) -> Result<Db> {
        let schema = self.core.build(self.build_app_schema()?)?;

        driver.register_schema(&schema.db).await?;

        tracing::debug!(
            models = schema.app.models.len(),
            tables = schema.db.tables.len(),
            "built schema"
        );

        Ok(Db {
            engine: Engine::new(Arc::new(schema), Arc::new(driver)),
        })
    }

    /// Builds the schema on top of the in-memory driver.
    #[cfg(feature = "memory")]
    pub async fn in_memory(&mut self) -> Result<Db> {
        self.build(crate::driver::Memory::new()).await
    }

    /// Convert a declared model to an `app::Model` with the assigned `ModelId`
    fn convert_schema_to_app(
        model: &schema::Model,
        model_id: ModelId,
        ids: &HashMap<&str, ModelId>,
    ) -> Result<app::Model> {
        let mut app_model = app::Model::new(model_id, &model.name);
        app_model.table_name = model.table_name.clone();
        app_model.localize = model.localize.clone();

        if let Some(parent) = &model.inherits {
            let Some(parent_id) = ids.get(parent.name.as_str()) else {
                return Err(Error::invalid_schema(format!(
                    "model `{}` inherits from `{}`, which is not registered",
                    model.name, parent.name
                )));
            };

            app_model.inherits = Some(app::Inherits {
                parent: *parent_id,
                strategy: parent.strategy,
            });
        }

        let mut primary_key = vec![];

        for field in &model.fields {
            if field.auto_increment && !field.ty.is_integer() {
                return Err(Error::invalid_schema(format!(
                    "field `{}::{}` is auto-incremented but is not an integer",
                    model.name, field.name
                )));
            }

            if let Some(default) = &field.default {
                if !field.ty.accepts(default) {
                    return Err(Error::invalid_schema(format!(
                        "default of `{}::{}` is not a {}",
                        model.name,
                        field.name,
                        field.ty.name()
                    )));
                }
            }

            let id = app_model.push_field(app::Field {
                id: FieldId {
                    model: model_id,
                    index: 0,
                },
                name: FieldName {
                    app_name: field.name.clone(),
                    storage_name: field.storage_name.clone(),
                },
                ty: FieldPrimitive {
                    ty: field.ty,
                    storage_ty: field.storage_ty.clone(),
                }
                .into(),
                nullable: field.nullable,
                primary_key: field.primary_key,
                auto_increment: field.auto_increment,
                default: field.default.clone(),
            });

            if field.primary_key {
                primary_key.push(id);
            }
        }

        if !primary_key.is_empty() {
            app_model.primary_key = Some(app::PrimaryKey {
                fields: primary_key,
            });
        }

        Ok(app_model)
    }
}

/// Resolves a model name to its id.
pub(crate) fn model_id(schema: &core_schema::Schema, name: &str) -> Result<ModelId> {
    schema
        .app
        .model_by_name(name)
        .map(|model| model.id)
        .ok_or_else(|| Error::invalid_statement(format!("unknown model `{name}`")))
}

/// Collects caller-provided field values.
pub(crate) fn collect_fields<I, K, V>(fields: I) -> indexmap::IndexMap<String, stmt::Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<stmt::Value>,
{
    fields
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}
