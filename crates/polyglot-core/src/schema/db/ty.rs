use crate::stmt;

/// Database-level storage types.
///
/// `stmt::Type` is how a value is seen by the application; `db::Type` is how
/// the storage layer keeps it. Unless the field specifies a storage type,
/// [`Type::from_app`] picks the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// A boolean value
    Boolean,

    /// A signed integer of `n` bytes
    Integer(u8),

    /// Unconstrained text type
    Text,

    /// Text type with an explicit maximum length
    VarChar(u64),
}

impl Type {
    /// Maps an application-level type to a database-level storage type.
    pub fn from_app(ty: stmt::Type, hint: Option<&Type>) -> Type {
        match hint {
            Some(ty) => ty.clone(),
            None => match ty {
                stmt::Type::Bool => Type::Boolean,
                stmt::Type::I32 => Type::Integer(4),
                stmt::Type::I64 => Type::Integer(8),
                stmt::Type::String => Type::Text,
            },
        }
    }

    /// Returns `true` if `value` fits in a column of this type.
    pub fn fits(&self, value: &stmt::Value) -> bool {
        match (self, value) {
            (Type::VarChar(max), stmt::Value::String(value)) => {
                value.chars().count() as u64 <= *max
            }
            _ => true,
        }
    }
}
