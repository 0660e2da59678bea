//! Declarative model descriptors.
//!
//! Models are declared by name and registered with [`crate::db::Builder`].
//! Parents are referenced by name and resolved when the database is built.

mod field;
pub use field::Field;

mod model;
pub use model::{Model, Parent};

pub use polyglot_core::{
    schema::{
        app::{Inheritance, Localize, DEFAULT_LOCALE},
        db::Type as StorageType,
    },
    stmt::Type,
};
