use indexmap::IndexMap;
use polyglot_core::{
    schema::db::Table,
    stmt::{self, ValueRecord},
};

/// Rows of one table, keyed by primary key in insertion order.
#[derive(Debug, Default)]
pub(crate) struct TableData {
    pub(crate) rows: IndexMap<ValueRecord, Vec<stmt::Value>>,

    /// Last value handed out by the auto-increment column
    last_id: i64,
}

impl TableData {
    pub(crate) fn key_of(table: &Table, row: &[stmt::Value]) -> ValueRecord {
        table
            .primary_key
            .columns
            .iter()
            .map(|column| row[column.index].clone())
            .collect()
    }

    /// The id the next stored row receives. Does not reserve it.
    pub(crate) fn next_id(&self, ty: stmt::Type) -> stmt::Value {
        let id = self.last_id + 1;

        match ty {
            stmt::Type::I32 => stmt::Value::I32(id as i32),
            _ => stmt::Value::I64(id),
        }
    }

    /// Records an id as used, whether generated or provided explicitly.
    pub(crate) fn observe_id(&mut self, id: i64) {
        self.last_id = self.last_id.max(id);
    }
}
