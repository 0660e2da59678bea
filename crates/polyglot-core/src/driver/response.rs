use crate::{stmt::ValueRecord, Error, Result};

#[derive(Debug)]
pub struct Response {
    pub rows: Rows,
}

#[derive(Debug)]
pub enum Rows {
    /// Number of rows impacted by the operation
    Count(u64),

    /// Operation result, one record per row
    Values(Vec<ValueRecord>),
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
        }
    }

    pub fn values(values: Vec<ValueRecord>) -> Self {
        Self {
            rows: Rows::Values(values),
        }
    }

    /// Returns the rows of a `Values` response.
    pub fn into_values(self) -> Result<Vec<ValueRecord>> {
        match self.rows {
            Rows::Values(values) => Ok(values),
            Rows::Count(_) => Err(Error::invalid_statement(
                "expected rows from the driver, got a count",
            )),
        }
    }

    /// Returns the count of a `Count` response.
    pub fn into_count(self) -> Result<u64> {
        match self.rows {
            Rows::Count(count) => Ok(count),
            Rows::Values(_) => Err(Error::invalid_statement(
                "expected a count from the driver, got rows",
            )),
        }
    }
}
