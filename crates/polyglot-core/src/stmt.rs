//! Values and types exchanged between the app-level models and storage.

mod ty;
pub use ty::Type;

mod value;
pub use value::Value;

mod value_record;
pub use value_record::ValueRecord;
