use super::Error;

/// Error when the storage layer refuses a write because a constraint does not
/// hold.
///
/// This occurs when:
/// - A row with the same primary key already exists (this is how a second
///   translation for the same owner and locale is rejected)
/// - A non-nullable column receives no value
/// - A foreign key references a row that does not exist
#[derive(Debug)]
pub(super) struct ConditionFailedError {
    context: Option<Box<str>>,
}

impl std::error::Error for ConditionFailedError {}

impl core::fmt::Display for ConditionFailedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("condition failed")?;
        if let Some(ref ctx) = self.context {
            write!(f, ": {}", ctx)?;
        }
        Ok(())
    }
}

impl Error {
    /// Creates a condition failed error.
    pub fn condition_failed(context: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::ConditionFailed(ConditionFailedError {
            context: Some(context.into().into()),
        }))
    }

    /// Returns `true` if this error is a condition failed error.
    pub fn is_condition_failed(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::ConditionFailed(_))
    }
}
