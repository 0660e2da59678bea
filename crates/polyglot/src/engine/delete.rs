use super::{Engine, Filter};
use crate::{Error, Result};

use polyglot_core::{
    driver::operation::DeleteByKey,
    schema::app::{FieldTy, ModelId},
    stmt::ValueRecord,
};

impl Engine {
    /// Deletes the record of `id` identified by `key`.
    ///
    /// Records reached through cascading `HasMany` relations are deleted
    /// first, then the record's own rows from the most derived table up to
    /// the root table.
    pub(crate) async fn delete(&self, id: ModelId, key: ValueRecord) -> Result<()> {
        let schema = &self.schema;
        let app = &schema.app;

        for level in app.chain(id).into_iter().rev() {
            for field in &level.fields {
                let FieldTy::HasMany(has_many) = &field.ty else {
                    continue;
                };

                if !has_many.cascade_delete {
                    continue;
                }

                let pair = has_many.pair(app);
                let pk = app.primary_key(id);
                let mut filter = vec![];

                for fk_field in &pair.foreign_key.fields {
                    let Some(position) = pk.fields.iter().position(|f| *f == fk_field.target)
                    else {
                        continue;
                    };

                    filter.push(Filter::Eq(
                        app.field(fk_field.source).name.app_name.as_str(),
                        key[position].clone(),
                    ));
                }

                for child in self.query(has_many.target, filter).await? {
                    Box::pin(self.delete(child.model, child.key)).await?;
                }
            }
        }

        let tables = schema.tables_for(id);

        for (i, table) in tables.iter().enumerate().rev() {
            let count = self
                .exec(DeleteByKey {
                    table: *table,
                    keys: vec![key.clone()],
                })
                .await?
                .into_count()?;

            if i == 0 && count == 0 {
                return Err(Error::record_not_found(format!(
                    "no `{}` with key {key:?}",
                    app.model(id).name.upper_camel_case()
                )));
            }
        }

        tracing::debug!(
            model = %app.model(id).name.upper_camel_case(),
            tables = tables.len(),
            "deleted record"
        );

        Ok(())
    }
}
