mod table;

use super::{app, db, mapping, Mapping, Schema};
use crate::Result;

use db::{Table, TableId};
use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct Builder {
    /// If set, prefix all table names with this string
    table_name_prefix: Option<String>,
}

/// Used to track state during the build process
struct BuildSchema<'a> {
    /// Build options
    builder: &'a Builder,

    /// Application schema being mapped
    app: &'a app::Schema,

    /// Maps table names to identifiers.
    table_lookup: IndexMap<String, TableId>,

    /// Tables as they are built
    tables: Vec<Table>,

    /// App-level to db-level schema mapping
    mapping: Mapping,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.table_name_prefix = Some(prefix.to_string());
        self
    }

    pub fn build(&self, app: app::Schema) -> Result<Schema> {
        let mut builder = BuildSchema {
            builder: self,
            app: &app,
            table_lookup: IndexMap::new(),
            tables: vec![],
            mapping: Mapping::default(),
        };

        // Localized tables are named after their owner's table, so entities
        // are mapped first. Within each group, parents come before children.
        let mut order: Vec<&app::Model> = app.models().collect();
        order.sort_by_key(|model| (model.is_localized_model(), app.chain(model.id).len()));

        for model in order {
            builder.map_model(model)?;
        }

        builder.build_foreign_keys()?;
        builder.build_primary_key_indices();

        let BuildSchema {
            tables, mapping, ..
        } = builder;

        let schema = Schema {
            app,
            db: Arc::new(db::Schema { tables }),
            mapping,
        };

        // Verify the schema structure
        schema.verify()?;

        Ok(schema)
    }
}
