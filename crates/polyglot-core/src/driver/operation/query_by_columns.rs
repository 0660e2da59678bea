use super::*;

use crate::{schema::db::ColumnId, stmt};

/// Returns the rows of `table` matching every condition, in storage order.
#[derive(Debug, Clone)]
pub struct QueryByColumns {
    pub table: TableId,

    /// Which columns to select
    pub select: Vec<ColumnId>,

    /// Conjunction of conditions. Empty matches every row.
    pub filter: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The column equals the value
    Eq(ColumnId, stmt::Value),

    /// The column equals one of the values
    In(ColumnId, Vec<stmt::Value>),
}

impl Condition {
    pub fn column(&self) -> ColumnId {
        match self {
            Self::Eq(column, _) | Self::In(column, _) => *column,
        }
    }

    /// Returns `true` if `value`, read from `self.column()`, satisfies the
    /// condition. Null never matches.
    pub fn matches(&self, value: &stmt::Value) -> bool {
        if value.is_null() {
            return false;
        }

        match self {
            Self::Eq(_, expected) => value == expected,
            Self::In(_, expected) => expected.contains(value),
        }
    }
}

impl From<QueryByColumns> for Operation {
    fn from(value: QueryByColumns) -> Self {
        Self::QueryByColumns(value)
    }
}
