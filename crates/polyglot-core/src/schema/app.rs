//! Application-level schema

mod field;
pub use field::{Field, FieldId, FieldName, FieldPrimitive, FieldTy};

mod fk;
pub use fk::{ForeignKey, ForeignKeyField};

mod inheritance;
pub use inheritance::{Inheritance, Inherits};

mod localized;
pub use localized::{Localization, Localize, DEFAULT_LOCALE};

mod model;
pub use model::{Model, ModelId, ModelKind};

mod pk;
pub use pk::PrimaryKey;

mod relation;
pub use relation::{BelongsTo, HasMany};

mod schema;
pub use schema::Schema;

use super::Name;
