use super::{
    app::{FieldId, ModelId},
    db::{ColumnId, IndexId},
    Schema,
};
use crate::{Error, Result};

use std::collections::HashSet;

struct Verify<'a> {
    schema: &'a Schema,
}

impl Schema {
    pub(super) fn verify(&self) -> Result<()> {
        Verify { schema: self }.verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        debug_assert!(self.verify_ids_populated());

        self.verify_each_table_has_one_primary_key()?;
        self.verify_index_names_are_unique()?;
        self.verify_table_names_are_unique()?;
        self.verify_column_names_are_unique()?;
        self.verify_foreign_keys()?;
        self.verify_localizations()?;
        Ok(())
    }

    fn verify_ids_populated(&self) -> bool {
        for model in self.schema.app.models() {
            assert_ne!(model.id, ModelId::placeholder());

            for field in &model.fields {
                assert!(!field.id.is_placeholder());

                if let Some(has_many) = field.ty.as_has_many() {
                    assert_ne!(has_many.pair, FieldId::placeholder());
                }

                if let Some(belongs_to) = field.ty.as_belongs_to() {
                    assert_ne!(belongs_to.target, ModelId::placeholder());
                }
            }
        }

        for table in &self.schema.db.tables {
            assert_ne!(table.primary_key.index, IndexId::placeholder());

            for column in &table.columns {
                assert_ne!(column.id, ColumnId::placeholder());
            }
        }

        true
    }

    fn verify_each_table_has_one_primary_key(&self) -> Result<()> {
        for table in &self.schema.db.tables {
            let count = table.indices.iter().filter(|i| i.primary_key).count();

            if count != 1 || table.primary_key.columns.is_empty() {
                return Err(Error::invalid_schema(format!(
                    "table `{}` must have exactly one primary key",
                    table.name
                )));
            }
        }

        Ok(())
    }

    fn verify_index_names_are_unique(&self) -> Result<()> {
        let mut names = HashSet::new();

        for table in &self.schema.db.tables {
            for index in &table.indices {
                if !names.insert(&index.name) {
                    return Err(Error::invalid_schema(format!(
                        "duplicate index name `{}`",
                        index.name
                    )));
                }
            }
        }

        Ok(())
    }

    fn verify_table_names_are_unique(&self) -> Result<()> {
        let mut names = HashSet::new();

        for table in &self.schema.db.tables {
            if !names.insert(&table.name) {
                return Err(Error::invalid_schema(format!(
                    "duplicate table name `{}`",
                    table.name
                )));
            }
        }

        Ok(())
    }

    fn verify_column_names_are_unique(&self) -> Result<()> {
        for table in &self.schema.db.tables {
            let mut names = HashSet::new();

            for column in &table.columns {
                if !names.insert(&column.name) {
                    return Err(Error::invalid_schema(format!(
                        "duplicate column `{}` in table `{}`",
                        column.name, table.name
                    )));
                }
            }
        }

        Ok(())
    }

    fn verify_foreign_keys(&self) -> Result<()> {
        let tables = &self.schema.db.tables;

        for table in tables {
            for foreign_key in &table.foreign_keys {
                let valid = foreign_key.references.0 < tables.len()
                    && !foreign_key.columns.is_empty()
                    && foreign_key.columns.len() == foreign_key.referenced_columns.len()
                    && foreign_key.columns.iter().all(|c| c.table == table.id)
                    && foreign_key
                        .referenced_columns
                        .iter()
                        .all(|c| c.table == foreign_key.references);

                if !valid {
                    return Err(Error::invalid_schema(format!(
                        "invalid foreign key on table `{}`",
                        table.name
                    )));
                }
            }
        }

        Ok(())
    }

    fn verify_localizations(&self) -> Result<()> {
        let app = &self.schema.app;

        for model in app.models() {
            let Some(localization) = &model.localization else {
                continue;
            };

            let shadow = app.model(localization.model);
            let mapped = self.schema.mapping.models.contains_key(&shadow.id);

            if shadow.owner() != Some(model.id) || !mapped {
                return Err(Error::invalid_schema(format!(
                    "localized model of `{}` is missing",
                    model.name.upper_camel_case()
                )));
            }

            let relation = app.field(localization.relation);
            let targets_shadow = relation
                .ty
                .as_has_many()
                .is_some_and(|has_many| has_many.target == shadow.id);

            if !targets_shadow {
                return Err(Error::invalid_schema(format!(
                    "relation `{}` does not target the localized model",
                    relation.full_name(app)
                )));
            }
        }

        Ok(())
    }
}
