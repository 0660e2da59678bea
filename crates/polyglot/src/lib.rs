pub mod db;
pub use db::Db;

pub mod driver;

mod engine;

mod entity;
pub use entity::Entity;

mod localize;

pub mod schema;

mod translation;
pub use translation::{LocalizedRecord, Translation};

pub use polyglot_core::{stmt, Error, Result};

pub use polyglot_core::stmt::Value;
