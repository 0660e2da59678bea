mod table;
use table::TableData;

use polyglot_core::{
    async_trait,
    driver::{
        operation::{DeleteByKey, GetByKey, Insert, Operation, QueryByColumns, UpdateByKey},
        Driver, Response,
    },
    err,
    schema::db::{ColumnId, OnDelete, Schema, Table, TableId},
    stmt::{self, ValueRecord},
    Error, Result,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// Stores rows in process memory.
///
/// Rows are kept per table in insertion order, keyed by primary key.
#[derive(Debug, Default)]
pub struct Memory {
    state: Mutex<Vec<TableData>>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<TableData>>> {
        self.state
            .lock()
            .map_err(|_| err!("memory driver state is poisoned"))
    }
}

#[async_trait]
impl Driver for Memory {
    async fn register_schema(&mut self, schema: &Schema) -> Result<()> {
        let mut tables = self.lock()?;
        *tables = schema.tables.iter().map(|_| TableData::default()).collect();

        tracing::debug!(tables = tables.len(), "registered schema");
        Ok(())
    }

    async fn exec(&self, schema: &Arc<Schema>, op: Operation) -> Result<Response> {
        let mut tables = self.lock()?;

        if tables.len() != schema.tables.len() || op.table().0 >= tables.len() {
            return Err(Error::invalid_statement(format!(
                "table {:?} is not registered with the driver",
                op.table()
            )));
        }

        tracing::trace!(
            op = op.name(),
            table = %schema.table(op.table()).name,
            "exec"
        );

        let mut exec = Exec {
            schema,
            tables: &mut tables,
        };

        match op {
            Operation::Insert(op) => exec.insert(op),
            Operation::GetByKey(op) => exec.get_by_key(op),
            Operation::QueryByColumns(op) => exec.query_by_columns(op),
            Operation::UpdateByKey(op) => exec.update_by_key(op),
            Operation::DeleteByKey(op) => exec.delete_by_key(op),
        }
    }

    async fn reset_db(&self, _schema: &Schema) -> Result<()> {
        for table in self.lock()?.iter_mut() {
            *table = TableData::default();
        }

        Ok(())
    }
}

struct Exec<'a> {
    schema: &'a Schema,
    tables: &'a mut Vec<TableData>,
}

impl Exec<'_> {
    fn insert(&mut self, op: Insert) -> Result<Response> {
        let table = self.schema.table(op.table);

        if op.columns.len() != op.values.len() {
            return Err(Error::invalid_statement(format!(
                "insert into `{}` has {} columns but {} values",
                table.name,
                op.columns.len(),
                op.values.len()
            )));
        }

        let mut row = vec![stmt::Value::Null; table.columns.len()];

        for (column, value) in op.columns.iter().zip(op.values) {
            row[column.index] = value;
        }

        let data = &self.tables[op.table.0];

        for column in &table.columns {
            let value = &mut row[column.id.index];

            if column.auto_increment && value.is_null() {
                *value = data.next_id(column.ty);
            }

            *value = check_column(table, column.id.index, std::mem::take(value))?;
        }

        let key = TableData::key_of(table, &row);

        if data.rows.contains_key(&key) {
            return Err(Error::condition_failed(format!(
                "duplicate key {} in table `{}`",
                display_key(&key),
                table.name
            )));
        }

        self.check_foreign_keys(table, &row)?;

        // Ids are only consumed by rows that are actually stored.
        let data = &mut self.tables[op.table.0];
        for column in table.columns.iter().filter(|column| column.auto_increment) {
            if let Some(id) = row[column.id.index].as_i64() {
                data.observe_id(id);
            }
        }

        let returning = project(&row, &op.returning);
        data.rows.insert(key, row);

        Ok(Response::values(vec![returning]))
    }

    fn get_by_key(&mut self, op: GetByKey) -> Result<Response> {
        let data = &self.tables[op.table.0];

        let rows = op
            .keys
            .iter()
            .filter_map(|key| data.rows.get(key))
            .map(|row| project(row, &op.select))
            .collect();

        Ok(Response::values(rows))
    }

    fn query_by_columns(&mut self, op: QueryByColumns) -> Result<Response> {
        let data = &self.tables[op.table.0];

        let rows = data
            .rows
            .values()
            .filter(|row| {
                op.filter
                    .iter()
                    .all(|condition| condition.matches(&row[condition.column().index]))
            })
            .map(|row| project(row, &op.select))
            .collect();

        Ok(Response::values(rows))
    }

    fn update_by_key(&mut self, op: UpdateByKey) -> Result<Response> {
        let table = self.schema.table(op.table);
        let mut assignments = Vec::with_capacity(op.assignments.len());

        for (column, value) in op.assignments {
            if table.column(column).primary_key {
                return Err(Error::invalid_statement(format!(
                    "cannot update key column `{}` of table `{}`",
                    table.column(column).name,
                    table.name
                )));
            }

            assignments.push((column, check_column(table, column.index, value)?));
        }

        let mut count = 0;

        for key in &op.keys {
            let Some(row) = self.tables[op.table.0].rows.get(key) else {
                continue;
            };

            let mut row = row.clone();
            for (column, value) in &assignments {
                row[column.index] = value.clone();
            }

            self.check_foreign_keys(table, &row)?;
            self.tables[op.table.0].rows.insert(key.clone(), row);
            count += 1;
        }

        Ok(Response::count(count))
    }

    fn delete_by_key(&mut self, op: DeleteByKey) -> Result<Response> {
        let mut plan = vec![];

        for key in op.keys {
            if self.tables[op.table.0].rows.contains_key(&key) {
                self.plan_delete(op.table, key, &mut plan)?;
            }
        }

        let count = plan.iter().filter(|(table, _)| *table == op.table).count();

        for (table, key) in plan {
            self.tables[table.0].rows.shift_remove(&key);
        }

        Ok(Response::count(count as u64))
    }

    /// Collects the row and everything that cascades from it. Fails without
    /// side effects if a referencing row blocks the delete.
    fn plan_delete(
        &self,
        table_id: TableId,
        key: ValueRecord,
        plan: &mut Vec<(TableId, ValueRecord)>,
    ) -> Result<()> {
        if plan.iter().any(|(t, k)| *t == table_id && *k == key) {
            return Ok(());
        }

        let Some(row) = self.tables[table_id.0].rows.get(&key) else {
            return Ok(());
        };

        let row = row.clone();
        plan.push((table_id, key));

        for (referencing, foreign_key) in self.schema.referencing(table_id) {
            let referenced = project(&row, &foreign_key.referenced_columns);

            let dependents: Vec<ValueRecord> = self.tables[referencing.id.0]
                .rows
                .iter()
                .filter(|(_, dependent)| project(dependent, &foreign_key.columns) == referenced)
                .map(|(key, _)| key.clone())
                .collect();

            for dependent in dependents {
                match foreign_key.on_delete {
                    OnDelete::Cascade => self.plan_delete(referencing.id, dependent, plan)?,
                    OnDelete::NoAction => {
                        if !plan.iter().any(|(t, k)| *t == referencing.id && *k == dependent) {
                            return Err(Error::condition_failed(format!(
                                "row {} of `{}` is still referenced by `{}`",
                                display_key(&referenced),
                                self.schema.table(table_id).name,
                                referencing.name
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn check_foreign_keys(&self, table: &Table, row: &[stmt::Value]) -> Result<()> {
        for foreign_key in &table.foreign_keys {
            let values = project(row, &foreign_key.columns);

            // Null references are not checked
            if values.iter().any(stmt::Value::is_null) {
                continue;
            }

            let referenced = self.schema.table(foreign_key.references);
            let found = self.tables[referenced.id.0]
                .rows
                .values()
                .any(|candidate| project(candidate, &foreign_key.referenced_columns) == values);

            if !found {
                return Err(Error::condition_failed(format!(
                    "`{}` references {} in `{}`, which does not exist",
                    table.name,
                    display_key(&values),
                    referenced.name
                )));
            }
        }

        Ok(())
    }
}

/// Casts the value to the column type and checks it can be stored.
fn check_column(table: &Table, index: usize, value: stmt::Value) -> Result<stmt::Value> {
    let column = &table.columns[index];

    let value = column.ty.cast(value).map_err(|err| {
        err.context(err!(
            "invalid value for column `{}.{}`",
            table.name,
            column.name
        ))
    })?;

    if value.is_null() && !column.nullable {
        return Err(Error::condition_failed(format!(
            "column `{}.{}` cannot be null",
            table.name, column.name
        )));
    }

    if !column.storage_ty.fits(&value) {
        return Err(Error::condition_failed(format!(
            "value too long for column `{}.{}` ({:?})",
            table.name, column.name, column.storage_ty
        )));
    }

    Ok(value)
}

fn project(row: &[stmt::Value], columns: &[ColumnId]) -> ValueRecord {
    columns
        .iter()
        .map(|column| row[column.index].clone())
        .collect()
}

fn display_key(key: &ValueRecord) -> String {
    let parts: Vec<String> = key.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}
