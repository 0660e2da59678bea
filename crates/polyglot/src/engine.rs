mod delete;
mod insert;
mod load;
mod update;

use crate::{driver::Driver, Error, Result};

use indexmap::IndexMap;
use polyglot_core::{
    driver::{Operation, Response},
    schema::{
        app::{Field, ModelId},
        db::{ColumnId, TableId},
    },
    stmt::{Value, ValueRecord},
    Schema,
};
use std::sync::Arc;

/// Field values keyed by field name.
pub(crate) type Fields = IndexMap<String, Value>;

/// Lowers model-level operations to table-level driver operations.
#[derive(Debug, Clone)]
pub(crate) struct Engine {
    /// The schema being managed
    pub(crate) schema: Arc<Schema>,

    /// Handle to the database driver
    driver: Arc<dyn Driver>,
}

/// A record loaded from every table its model spans.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Record {
    /// The concrete model of the record
    pub(crate) model: ModelId,

    /// Primary key, in the order of the chain root's key fields
    pub(crate) key: ValueRecord,

    /// Values of every primitive field along the chain, root first
    pub(crate) values: Fields,
}

/// Condition on a field stored in the root table of a chain.
#[derive(Debug, Clone)]
pub(crate) enum Filter<'a> {
    Eq(&'a str, Value),
    In(&'a str, Vec<Value>),
}

/// What an assignment is for; inserts may set key fields, updates may not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assign {
    Insert,
    Update,
}

impl Engine {
    pub(crate) fn new(schema: Arc<Schema>, driver: Arc<dyn Driver>) -> Self {
        Self { schema, driver }
    }

    async fn exec(&self, op: impl Into<Operation>) -> Result<Response> {
        let op = op.into();

        tracing::debug!(
            op = op.name(),
            table = %self.schema.db.table(op.table()).name,
            "exec"
        );

        self.driver.exec(&self.schema.db, op).await
    }

    /// Reverts the tables already written by a write that failed part way,
    /// most recent first.
    async fn roll_back(&self, undo: Vec<Operation>) {
        for op in undo.into_iter().rev() {
            if let Err(err) = self.exec(op).await {
                tracing::warn!(%err, "failed to roll back a partial write");
            }
        }
    }

    pub(crate) async fn reset_db(&self) -> Result<()> {
        self.driver.reset_db(&self.schema.db).await
    }

    /// Checks that every assigned name is a writable primitive field of `id`.
    fn check_assignable(&self, id: ModelId, fields: &Fields, assign: Assign) -> Result<()> {
        let app = &self.schema.app;
        let model_name = app.model(id).name.upper_camel_case();
        let discriminator = app.root(id).discriminator;

        for name in fields.keys() {
            let Some(field) = app.field_by_name(id, name) else {
                return Err(Error::validation(format!(
                    "`{model_name}` has no field `{name}`"
                )));
            };

            if field.is_relation() {
                return Err(Error::validation(format!(
                    "relation `{model_name}::{name}` cannot be assigned"
                )));
            }

            if Some(field.id) == discriminator {
                return Err(Error::validation(format!(
                    "field `{model_name}::{name}` is managed by the database"
                )));
            }

            if assign == Assign::Update && field.primary_key {
                return Err(Error::validation(format!(
                    "key field `{model_name}::{name}` cannot be updated"
                )));
            }
        }

        Ok(())
    }

    /// Casts a value to the type of `field`.
    fn cast(&self, field: &Field, value: Value) -> Result<Value> {
        let ty = field.ty.expect_primitive().ty;
        ty.cast(value).map_err(|err| {
            err.context(polyglot_core::err!(
                "invalid value for `{}`",
                field.full_name(&self.schema.app)
            ))
        })
    }

    /// Every column of `table`, in order.
    fn all_columns(&self, table: TableId) -> Vec<ColumnId> {
        self.schema
            .db
            .table(table)
            .columns
            .iter()
            .map(|column| column.id)
            .collect()
    }

    /// Builds the key of `id` from a single value.
    pub(crate) fn key(&self, id: ModelId, value: impl Into<Value>) -> Result<ValueRecord> {
        let app = &self.schema.app;
        let pk = app.primary_key(id);

        let [field] = &pk.fields[..] else {
            return Err(Error::invalid_statement(format!(
                "`{}` has a composite primary key",
                app.model(id).name.upper_camel_case()
            )));
        };

        let value = self.cast(app.field(*field), value.into())?;
        Ok(ValueRecord::from_vec(vec![value]))
    }
}
