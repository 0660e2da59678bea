use super::Error;

/// Error when a schema definition is invalid.
///
/// This occurs when:
/// - A localized model does not have exactly one primary key field
/// - A localized field name does not name a primitive field of the model
/// - A model inherits from a model that was not registered
/// - A schema has duplicate names (tables, columns, indices)
///
/// These errors are raised while the registry builds, before any data is
/// touched, and are not recoverable at runtime.
#[derive(Debug)]
pub(super) struct InvalidSchemaError {
    message: Box<str>,
}

impl std::error::Error for InvalidSchemaError {}

impl core::fmt::Display for InvalidSchemaError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid schema: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidSchema(InvalidSchemaError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid schema error.
    pub fn is_invalid_schema(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidSchema(_))
    }
}
