use super::{Assign, Engine, Fields};
use crate::{Error, Result};

use indexmap::IndexMap;
use polyglot_core::{
    driver::operation::{GetByKey, Operation, UpdateByKey},
    schema::{
        app::ModelId,
        db::{ColumnId, TableId},
    },
    stmt::{Value, ValueRecord},
};

impl Engine {
    /// Updates the record of `id` identified by `key`. Assignments are grouped
    /// into one update per table.
    pub(crate) async fn update(
        &self,
        id: ModelId,
        key: &ValueRecord,
        fields: Fields,
    ) -> Result<()> {
        let schema = &self.schema;
        let app = &schema.app;

        self.check_assignable(id, &fields, Assign::Update)?;

        let mut assignments: IndexMap<TableId, Vec<_>> = IndexMap::new();

        for (name, value) in fields {
            let Some(field) = app.field_by_name(id, &name) else {
                continue;
            };

            let Some(column) = schema.mapping_for(field.id.model).column(field.id) else {
                continue;
            };

            let value = self.cast(field, value)?;
            assignments
                .entry(column.table)
                .or_default()
                .push((column, value));
        }

        let not_found = || {
            Error::record_not_found(format!(
                "no `{}` with key {key:?}",
                app.model(id).name.upper_camel_case()
            ))
        };

        let mut undo: Vec<Operation> = vec![];

        for (table, assignments) in assignments {
            let Some(previous) = self.current_values(table, key, &assignments).await? else {
                self.roll_back(undo).await;
                return Err(not_found());
            };

            let updated = self
                .exec(UpdateByKey {
                    table,
                    keys: vec![key.clone()],
                    assignments,
                })
                .await
                .and_then(|response| response.into_count());

            match updated {
                Ok(0) => {
                    self.roll_back(undo).await;
                    return Err(not_found());
                }
                Ok(_) => undo.push(
                    UpdateByKey {
                        table,
                        keys: vec![key.clone()],
                        assignments: previous,
                    }
                    .into(),
                ),
                Err(err) => {
                    self.roll_back(undo).await;
                    return Err(err);
                }
            }
        }

        Ok(())
    }

    /// Reads the stored values of the assigned columns, `None` if the row is
    /// missing.
    async fn current_values(
        &self,
        table: TableId,
        key: &ValueRecord,
        assignments: &[(ColumnId, Value)],
    ) -> Result<Option<Vec<(ColumnId, Value)>>> {
        let select: Vec<ColumnId> = assignments.iter().map(|(column, _)| *column).collect();

        let row = self
            .exec(GetByKey {
                table,
                select: select.clone(),
                keys: vec![key.clone()],
            })
            .await?
            .into_values()?
            .into_iter()
            .next();

        Ok(row.map(|row| select.into_iter().zip(row.into_vec()).collect()))
    }
}
