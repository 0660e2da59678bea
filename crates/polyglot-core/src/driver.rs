mod response;
pub use response::{Response, Rows};

pub mod operation;
pub use operation::Operation;

use crate::{async_trait, schema::db::Schema};

use std::{fmt::Debug, sync::Arc};

/// Storage backend executing table-level operations.
///
/// Drivers enforce the table constraints declared by the schema: unique
/// primary keys, non-null columns and foreign keys.
#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Register the schema with the driver.
    async fn register_schema(&mut self, schema: &Schema) -> crate::Result<()>;

    /// Execute a database operation
    async fn exec(&self, schema: &Arc<Schema>, op: Operation) -> crate::Result<Response>;

    /// Drops every stored row, keeping the registered schema.
    async fn reset_db(&self, schema: &Schema) -> crate::Result<()>;
}
