use super::BuildSchema;
use crate::{
    schema::{
        app::{self, Model},
        db::{self, ColumnId, ForeignKey, IndexId, OnDelete, Table, TableId},
        mapping, Name,
    },
    Error, Result,
};

impl BuildSchema<'_> {
    /// Creates or extends the table storing `model` and records its mapping.
    /// Ancestors and, for localized models, owners must be mapped already.
    pub(super) fn map_model(&mut self, model: &Model) -> Result<()> {
        let (table, key, discriminator, shared) = match &model.inherits {
            Some(inherits) if inherits.strategy.is_single() => {
                let parent = self.mapping.model(inherits.parent);
                (parent.table, parent.key.clone(), parent.discriminator, true)
            }
            Some(inherits) => {
                let parent = self.mapping.model(inherits.parent).clone();
                let table = self.create_table(model)?;
                let key = self.create_key_columns(table, &parent)?;
                (table, key, parent.discriminator, false)
            }
            None => (self.create_table(model)?, vec![], None, false),
        };

        let mut fields = Vec::with_capacity(model.fields.len());

        for field in &model.fields {
            let app::FieldTy::Primitive(primitive) = &field.ty else {
                // Relations do not have columns
                fields.push(None);
                continue;
            };

            let column = self.create_column(table, field, primitive, shared)?;
            fields.push(Some(mapping::Field { column }));
        }

        let column_of = |field: app::FieldId| {
            fields[field.index]
                .as_ref()
                .map(|field: &mapping::Field| field.column)
        };

        let (key, discriminator) = if model.is_root() {
            let key = model
                .primary_key
                .iter()
                .flat_map(|pk| &pk.fields)
                .filter_map(|field| column_of(*field))
                .collect::<Vec<_>>();

            let table = &mut self.tables[table.0];
            for column in &key {
                table.columns[column.index].primary_key = true;
            }
            table.primary_key.columns = key.clone();

            (key, model.discriminator.and_then(column_of))
        } else {
            (key, discriminator)
        };

        tracing::trace!(
            model = %model.name.upper_camel_case(),
            table = %self.tables[table.0].name,
            shared,
            "mapped model"
        );

        self.mapping.models.insert(
            model.id,
            mapping::Model {
                id: model.id,
                table,
                fields,
                key,
                discriminator,
            },
        );

        Ok(())
    }

    /// Adds foreign keys for joined tables and `BelongsTo` relations.
    pub(super) fn build_foreign_keys(&mut self) -> Result<()> {
        for model in self.app.models() {
            let mapping = self.mapping.model(model.id);

            // A joined table's key references its parent's key.
            if let Some(inherits) = &model.inherits {
                let parent = self.mapping.model(inherits.parent);

                if parent.table != mapping.table {
                    let foreign_key = ForeignKey {
                        columns: mapping.key.clone(),
                        references: parent.table,
                        referenced_columns: parent.key.clone(),
                        on_delete: OnDelete::Cascade,
                    };
                    self.tables[mapping.table.0].foreign_keys.push(foreign_key);
                }
            }

            // Tables shared with an ancestor hold rows of other models too, so
            // they only carry the ancestor's constraints.
            let owns_table = model
                .parent()
                .is_none_or(|parent| self.mapping.model(parent).table != mapping.table);

            if !owns_table {
                continue;
            }

            for field in &model.fields {
                let app::FieldTy::BelongsTo(belongs_to) = &field.ty else {
                    continue;
                };

                let target = self.mapping.model(belongs_to.target);
                let target_pk = self.app.primary_key(belongs_to.target);
                let mut columns = vec![];
                let mut referenced_columns = vec![];

                for fk_field in &belongs_to.foreign_key.fields {
                    let source = self.app.field(fk_field.source);
                    let Some(column) = self.tables[mapping.table.0]
                        .column_by_name(source.name.storage_name())
                        .map(|column| column.id)
                    else {
                        return Err(Error::invalid_schema(format!(
                            "foreign key field `{}` has no column in table `{}`",
                            source.full_name(self.app),
                            self.tables[mapping.table.0].name,
                        )));
                    };

                    let Some(position) = target_pk
                        .fields
                        .iter()
                        .position(|pk_field| *pk_field == fk_field.target)
                    else {
                        return Err(Error::invalid_schema(format!(
                            "relation `{}` must reference the primary key of its target",
                            field.full_name(self.app),
                        )));
                    };

                    columns.push(column);
                    referenced_columns.push(target.key[position]);
                }

                let cascade = belongs_to
                    .pair
                    .map(|pair| self.app.field(pair))
                    .and_then(|pair| pair.ty.as_has_many())
                    .is_some_and(|has_many| has_many.cascade_delete);

                let foreign_key = ForeignKey {
                    columns,
                    references: target.table,
                    referenced_columns,
                    on_delete: if cascade {
                        OnDelete::Cascade
                    } else {
                        OnDelete::NoAction
                    },
                };

                tracing::debug!(
                    table = %self.tables[mapping.table.0].name,
                    references = %self.tables[target.table.0].name,
                    on_delete = ?foreign_key.on_delete,
                    "foreign key"
                );

                self.tables[mapping.table.0].foreign_keys.push(foreign_key);
            }
        }

        Ok(())
    }

    pub(super) fn build_primary_key_indices(&mut self) {
        for table in &mut self.tables {
            let mut name = format!("index_{}_by", table.name);

            for (i, column) in table.primary_key.columns.iter().enumerate() {
                if i > 0 {
                    name.push_str("_and");
                }

                name.push('_');
                name.push_str(&table.columns[column.index].name);
            }

            let id = IndexId {
                table: table.id,
                index: table.indices.len(),
            };

            table.indices.push(db::Index {
                id,
                name,
                on: table.id,
                columns: table.primary_key.columns.clone(),
                unique: true,
                primary_key: true,
            });
            table.primary_key.index = id;
        }
    }

    fn create_table(&mut self, model: &Model) -> Result<TableId> {
        let name = match (model.owner(), &model.table_name) {
            (_, Some(table_name)) => self.prefix_table_name(table_name),
            (Some(owner), None) => {
                let owner = self.mapping.model(owner);
                format!("{}_localized", self.tables[owner.table.0].name)
            }
            (None, None) => self.table_name_from_model(&model.name),
        };

        if self.table_lookup.contains_key(&name) {
            return Err(Error::invalid_schema(format!(
                "table `{name}` is mapped more than once (while mapping `{}`)",
                model.name.upper_camel_case(),
            )));
        }

        if let Some(owner) = model.owner() {
            tracing::debug!(
                owner = %self.app.model(owner).name.upper_camel_case(),
                table = %name,
                "localized table"
            );
        }

        let id = self.register_table(&name);
        self.tables.push(Table::new(id, name));
        Ok(id)
    }

    /// Key columns of a joined table, mirroring its parent's key.
    fn create_key_columns(
        &mut self,
        table: TableId,
        parent: &mapping::Model,
    ) -> Result<Vec<ColumnId>> {
        let mut key = vec![];

        for parent_column in &parent.key {
            let source = self.tables[parent_column.table.0].columns[parent_column.index].clone();
            let column = self.push_column(
                table,
                db::Column {
                    id: ColumnId::placeholder(),
                    name: source.name,
                    ty: source.ty,
                    storage_ty: source.storage_ty,
                    nullable: false,
                    primary_key: true,
                    auto_increment: false,
                },
            )?;
            key.push(column);
        }

        self.tables[table.0].primary_key.columns = key.clone();
        Ok(key)
    }

    fn create_column(
        &mut self,
        table: TableId,
        field: &app::Field,
        primitive: &app::FieldPrimitive,
        shared: bool,
    ) -> Result<ColumnId> {
        let storage_ty = db::Type::from_app(primitive.ty, primitive.storage_ty.as_ref());

        self.push_column(
            table,
            db::Column {
                id: ColumnId::placeholder(),
                name: field.name.storage_name().to_owned(),
                ty: primitive.ty,
                storage_ty,
                // Rows of sibling models leave a shared table's child
                // columns empty.
                nullable: field.nullable || shared,
                primary_key: false,
                auto_increment: field.auto_increment,
            },
        )
    }

    fn push_column(&mut self, table: TableId, mut column: db::Column) -> Result<ColumnId> {
        let table = &mut self.tables[table.0];

        if table.column_by_name(&column.name).is_some() {
            return Err(Error::invalid_schema(format!(
                "duplicate column `{}` in table `{}`",
                column.name, table.name
            )));
        }

        column.id = ColumnId {
            table: table.id,
            index: table.columns.len(),
        };

        let id = column.id;
        table.columns.push(column);
        Ok(id)
    }

    fn register_table(&mut self, name: impl AsRef<str>) -> TableId {
        let id = TableId(self.table_lookup.len());
        self.table_lookup.insert(name.as_ref().to_string(), id);
        id
    }

    fn table_name_from_model(&self, model_name: &Name) -> String {
        let base = pluralizer::pluralize(&model_name.snake_case(), 2, false);
        self.prefix_table_name(&base)
    }

    fn prefix_table_name(&self, name: &str) -> String {
        if let Some(prefix) = &self.builder.table_name_prefix {
            format!("{prefix}{name}")
        } else {
            name.to_string()
        }
    }
}
