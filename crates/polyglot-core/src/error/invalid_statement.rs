use super::Error;

/// Error when an operation references schema elements that do not exist.
///
/// This occurs when:
/// - A write names a field the model does not have
/// - A model is referenced by a name that was never registered
/// - A localization helper is called on a model that is not localized
///
/// Unlike [`Error::invalid_schema`], these are raised at runtime.
#[derive(Debug)]
pub(super) struct InvalidStatementError {
    message: Box<str>,
}

impl std::error::Error for InvalidStatementError {}

impl core::fmt::Display for InvalidStatementError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid statement: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid statement error.
    pub fn invalid_statement(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidStatement(InvalidStatementError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid statement error.
    pub fn is_invalid_statement(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidStatement(_))
    }
}
