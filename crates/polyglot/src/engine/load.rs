use super::{Engine, Filter, Record};
use crate::{Error, Result};

use indexmap::IndexMap;
use polyglot_core::{
    driver::operation::{Condition, GetByKey, QueryByColumns},
    schema::{
        app::{Field, ModelId},
        db::{ColumnId, TableId},
    },
    stmt::ValueRecord,
};

impl Engine {
    /// Loads the record of `id` with the given key. Returns `None` if no row
    /// exists or the row belongs to a model that is not `id` or one of its
    /// descendants.
    pub(crate) async fn get(&self, id: ModelId, key: ValueRecord) -> Result<Option<Record>> {
        let root = self.schema.app.root(id);
        let table = self.schema.table_id_for(root.id);

        let rows = self
            .exec(GetByKey {
                table,
                select: self.all_columns(table),
                keys: vec![key],
            })
            .await?
            .into_values()?;

        match rows.into_iter().next() {
            Some(row) => self.load_from_root_row(id, row).await,
            None => Ok(None),
        }
    }

    /// Loads every record of `id` whose root row matches `filter`, in storage
    /// order.
    pub(crate) async fn query(&self, id: ModelId, filter: Vec<Filter<'_>>) -> Result<Vec<Record>> {
        let schema = &self.schema;
        let root = schema.app.root(id);
        let table = schema.table_id_for(root.id);

        let filter = filter
            .into_iter()
            .map(|filter| match filter {
                Filter::Eq(name, value) => {
                    let (field, column) = self.filter_column(id, table, name)?;
                    Ok(Condition::Eq(column, self.cast(field, value)?))
                }
                Filter::In(name, values) => {
                    let (field, column) = self.filter_column(id, table, name)?;
                    let values = values
                        .into_iter()
                        .map(|value| self.cast(field, value))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(Condition::In(column, values))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = self
            .exec(QueryByColumns {
                table,
                select: self.all_columns(table),
                filter,
            })
            .await?
            .into_values()?;

        let mut records = vec![];

        for row in rows {
            if let Some(record) = self.load_from_root_row(id, row).await? {
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Completes a record from its row in the root table.
    async fn load_from_root_row(&self, id: ModelId, row: ValueRecord) -> Result<Option<Record>> {
        let schema = &self.schema;
        let app = &schema.app;
        let root = app.root(id);
        let root_mapping = schema.mapping_for(root.id);

        let concrete = match root_mapping.discriminator {
            Some(column) => {
                let identity = row[column.index].as_str().unwrap_or_default();

                match app.model_by_identity(root.id, identity) {
                    Some(model) => model.id,
                    None => {
                        return Err(Error::invalid_statement(format!(
                            "unknown row type `{identity}` in table `{}`",
                            schema.db.table(root_mapping.table).name
                        )))
                    }
                }
            }
            None => root.id,
        };

        if !app.is_a(concrete, id) {
            return Ok(None);
        }

        let root_table = schema.db.table(root_mapping.table);
        let key: ValueRecord = root_table
            .primary_key
            .columns
            .iter()
            .map(|column| row[column.index].clone())
            .collect();

        let mut rows: IndexMap<TableId, ValueRecord> = IndexMap::new();
        rows.insert(root_table.id, row);

        for table in schema.tables_for(concrete).into_iter().skip(1) {
            let joined = self
                .exec(GetByKey {
                    table,
                    select: self.all_columns(table),
                    keys: vec![key.clone()],
                })
                .await?
                .into_values()?;

            let Some(joined) = joined.into_iter().next() else {
                return Err(Error::record_not_found(format!(
                    "missing row in table `{}` for key {key:?}",
                    schema.db.table(table).name
                )));
            };

            rows.insert(table, joined);
        }

        let mut values = IndexMap::new();

        for level in app.chain(concrete) {
            let mapping = schema.mapping_for(level.id);
            let row = &rows[&mapping.table];

            for field in &level.fields {
                if let Some(column) = mapping.column(field.id) {
                    values.insert(field.name.app_name.clone(), row[column.index].clone());
                }
            }
        }

        Ok(Some(Record {
            model: concrete,
            key,
            values,
        }))
    }

    /// Resolves a filtered field to its column in the root table.
    fn filter_column(&self, id: ModelId, table: TableId, name: &str) -> Result<(&Field, ColumnId)> {
        let app = &self.schema.app;

        let resolved = app
            .field_by_name(id, name)
            .and_then(|field| {
                self.schema
                    .mapping_for(field.id.model)
                    .column(field.id)
                    .map(|column| (field, column))
            })
            .filter(|(_, column)| column.table == table);

        resolved.ok_or_else(|| {
            Error::invalid_statement(format!(
                "cannot filter `{}` on `{name}`",
                app.model(id).name.upper_camel_case()
            ))
        })
    }
}
