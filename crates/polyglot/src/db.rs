mod builder;
pub use builder::Builder;
pub(crate) use builder::{collect_fields, model_id};

use crate::{engine::Engine, Entity, Error, Result};

use polyglot_core::{
    schema::app::ModelId,
    stmt::{Value, ValueRecord},
    Schema,
};
use std::sync::Arc;

/// A database handle.
///
/// Holds the built schema registry and the driver. Cloning is cheap; clones
/// share both.
#[derive(Debug, Clone)]
pub struct Db {
    pub(crate) engine: Engine,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The schema this database was built with
    pub fn schema(&self) -> &Arc<Schema> {
        &self.engine.schema
    }

    /// Creates a record of the named model and returns it as stored.
    pub async fn insert<I, K, V>(&self, model: &str, fields: I) -> Result<Entity>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let id = self.entity_model(model)?;
        let record = self.engine.insert(id, collect_fields(fields)).await?;
        Ok(Entity::from_record(&self.engine.schema, record))
    }

    /// Loads a record by key. The result is an instance of the most derived
    /// model the record was created as.
    pub async fn get(&self, model: &str, key: impl Into<Value>) -> Result<Entity> {
        match self.find(model, key).await? {
            Some(entity) => Ok(entity),
            None => Err(Error::record_not_found(format!("no `{model}` with that key"))),
        }
    }

    /// Like [`Db::get`], but returns `None` when no record matches.
    pub async fn find(&self, model: &str, key: impl Into<Value>) -> Result<Option<Entity>> {
        let id = self.entity_model(model)?;
        let key = self.engine.key(id, key)?;
        self.find_by_key(id, key).await
    }

    /// Updates the entity's fields in storage and in place.
    pub async fn update<I, K, V>(&self, entity: &mut Entity, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.engine
            .update(entity.model_id(), entity.key(), collect_fields(fields))
            .await?;
        self.reload(entity).await
    }

    /// Deletes the entity along with its translations.
    pub async fn delete(&self, entity: Entity) -> Result<()> {
        self.engine
            .delete(entity.model_id(), entity.key().clone())
            .await
    }

    /// Drops every stored record. The schema stays registered.
    pub async fn reset_db(&self) -> Result<()> {
        self.engine.reset_db().await
    }

    pub(crate) async fn reload(&self, entity: &mut Entity) -> Result<()> {
        match self
            .find_by_key(entity.model_id(), entity.key().clone())
            .await?
        {
            Some(reloaded) => {
                *entity = reloaded;
                Ok(())
            }
            None => Err(Error::record_not_found(format!(
                "`{}` was deleted",
                entity.model_name()
            ))),
        }
    }

    async fn find_by_key(&self, id: ModelId, key: ValueRecord) -> Result<Option<Entity>> {
        let record = self.engine.get(id, key).await?;
        Ok(record.map(|record| Entity::from_record(&self.engine.schema, record)))
    }

    /// Resolves a declared model; generated localized models are only reached
    /// through their owners.
    fn entity_model(&self, name: &str) -> Result<ModelId> {
        let id = model_id(&self.engine.schema, name)?;

        if self.engine.schema.app.model(id).is_localized_model() {
            return Err(Error::invalid_statement(format!(
                "`{name}` is a localized model; use the localization helpers of its owner"
            )));
        }

        Ok(id)
    }
}
