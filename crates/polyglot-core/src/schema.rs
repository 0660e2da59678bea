pub mod app;

mod builder;
pub use builder::Builder;

pub mod db;

pub mod mapping;
use mapping::Mapping;

mod name;
pub use name::Name;

mod verify;

use app::ModelId;
use db::{Table, TableId};
use std::sync::Arc;

/// The complete schema: app-level models, the tables they are stored in, and
/// the mapping between the two.
///
/// Built once by [`Builder::build`] and immutable afterwards.
#[derive(Debug)]
pub struct Schema {
    /// Application-level schema
    pub app: app::Schema,

    /// Database-level schema
    pub db: Arc<db::Schema>,

    /// Maps the app-level schema to the db-level schema
    pub mapping: Mapping,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn mapping_for(&self, id: impl Into<ModelId>) -> &mapping::Model {
        self.mapping.model(id)
    }

    pub fn table_for(&self, id: impl Into<ModelId>) -> &Table {
        self.db.table(self.table_id_for(id))
    }

    pub fn table_id_for(&self, id: impl Into<ModelId>) -> TableId {
        self.mapping.model(id).table
    }

    /// Distinct tables a record of `id` spans, from the root of its
    /// inheritance chain down to the model itself.
    pub fn tables_for(&self, id: impl Into<ModelId>) -> Vec<TableId> {
        let mut tables: Vec<TableId> = vec![];

        for model in self.app.chain(id) {
            let table = self.table_id_for(model.id);
            if !tables.contains(&table) {
                tables.push(table);
            }
        }

        tables
    }
}
