use super::{Assign, Engine, Fields, Record};
use crate::{Error, Result};

use polyglot_core::{
    driver::operation::{DeleteByKey, Insert, Operation},
    schema::app::{Field, ModelId},
    stmt::{Value, ValueRecord},
};

impl Engine {
    /// Inserts a record of `id`, one row per table the model spans.
    pub(crate) async fn insert(&self, id: ModelId, mut fields: Fields) -> Result<Record> {
        let schema = &self.schema;
        let app = &schema.app;
        let model = app.model(id);

        self.check_assignable(id, &fields, Assign::Insert)?;

        for field in app.fields(id) {
            if !field.ty.is_primitive() {
                continue;
            }

            let name = &field.name.app_name;
            match fields.get_mut(name) {
                Some(value) => *value = self.cast(field, std::mem::take(value))?,
                None => {
                    if let Some(default) = self.default_value(id, field) {
                        fields.insert(name.clone(), default);
                    }
                }
            }
        }

        if let Some(discriminator) = app.root(id).discriminator {
            fields.insert(
                app.field(discriminator).name.app_name.clone(),
                Value::from(&model.identity),
            );
        }

        let mut key: Option<ValueRecord> = None;
        let mut undo: Vec<Operation> = vec![];

        for table_id in schema.tables_for(id) {
            let table = schema.db.table(table_id);
            let mut columns = vec![];
            let mut values = vec![];

            // Joined tables are keyed by the row inserted into the root table.
            if let Some(key) = &key {
                columns.extend(table.primary_key.columns.iter().copied());
                values.extend(key.iter().cloned());
            }

            for level in app.chain(id) {
                let mapping = schema.mapping_for(level.id);
                if mapping.table != table_id {
                    continue;
                }

                for field in &level.fields {
                    let (Some(column), Some(value)) =
                        (mapping.column(field.id), fields.get(&field.name.app_name))
                    else {
                        continue;
                    };

                    columns.push(column);
                    values.push(value.clone());
                }
            }

            let inserted = self
                .exec(Insert {
                    table: table_id,
                    columns,
                    values: ValueRecord::from_vec(values),
                    returning: table.primary_key.columns.clone(),
                })
                .await
                .and_then(|response| response.into_values());

            let rows = match inserted {
                Ok(rows) => rows,
                Err(err) => {
                    // A record is stored in all of its tables or in none.
                    self.roll_back(undo).await;
                    return Err(err);
                }
            };

            if key.is_none() {
                key = rows.into_iter().next();
            }

            if let Some(key) = &key {
                undo.push(
                    DeleteByKey {
                        table: table_id,
                        keys: vec![key.clone()],
                    }
                    .into(),
                );
            }
        }

        let Some(key) = key else {
            return Err(Error::invalid_statement(format!(
                "insert into `{}` returned no key",
                model.name.upper_camel_case()
            )));
        };

        self.get(id, key).await?.ok_or_else(|| {
            Error::record_not_found(format!(
                "`{}` disappeared after insert",
                model.name.upper_camel_case()
            ))
        })
    }

    /// The value stored when an insert leaves `field` unset.
    fn default_value(&self, id: ModelId, field: &Field) -> Option<Value> {
        // Each level of a chain may declare its own default locale.
        if let Some((_, localization)) = self.schema.app.localization(id) {
            if localization.default_locale_field == field.id {
                return Some(Value::from(&localization.default_locale));
            }
        }

        field.default.clone()
    }
}
