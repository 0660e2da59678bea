use super::Value;

/// The type of a primitive field, from Polyglot's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// Boolean value
    Bool,

    /// Signed 32-bit integer
    I32,

    /// Signed 64-bit integer
    I64,

    /// String value
    String,
}

impl Type {
    pub fn is_integer(self) -> bool {
        matches!(self, Self::I32 | Self::I64)
    }

    /// Returns `true` if `value` can be stored in a field of this type.
    /// `Null` is accepted; nullability is checked separately.
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (Self::Bool, Value::Bool(_))
                | (Self::I32, Value::I32(_))
                | (Self::I64, Value::I64(_))
                | (Self::String, Value::String(_))
        )
    }

    /// Converts `value` to this type where the conversion is lossless.
    pub fn cast(self, value: Value) -> crate::Result<Value> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (Self::I64, Value::I32(v)) => Ok(Value::I64(v.into())),
            (Self::I32, Value::I64(v)) => match i32::try_from(v) {
                Ok(v) => Ok(Value::I32(v)),
                Err(_) => Err(crate::Error::type_conversion(Value::I64(v), "i32")),
            },
            (ty, value) if ty.accepts(&value) => Ok(value),
            (ty, value) => Err(crate::Error::type_conversion(value, ty.name())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::String => "String",
        }
    }
}
