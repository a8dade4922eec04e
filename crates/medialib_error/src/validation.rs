//! Request payload validation errors.

use crate::errno;

/// Kinds of validation errors.
///
/// Each kind maps to a distinct code so callers can tell a bad name from a
/// bad path or a bad type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ValidationErrorKind {
    /// Display name is empty, too long or contains forbidden characters
    #[display("Invalid display name: {}", _0)]
    DisplayName(String),
    /// Relative path is malformed
    #[display("Invalid relative path: {}", _0)]
    RelativePath(String),
    /// Extension does not belong to the declared media type
    #[display("Media type does not match extension: {}", _0)]
    MediaTypeMismatch(String),
    /// A required value is missing or has the wrong type
    #[display("Missing or invalid value: {}", _0)]
    MissingValue(String),
}

/// Validation error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    /// The kind of error that occurred
    pub kind: ValidationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new validation error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Negative code reported to callers.
    pub fn errno(&self) -> i32 {
        match self.kind {
            ValidationErrorKind::DisplayName(_) => errno::E_INVALID_DISPLAY_NAME,
            ValidationErrorKind::RelativePath(_) => errno::E_INVALID_PATH,
            ValidationErrorKind::MediaTypeMismatch(_) => {
                errno::E_CHECK_MEDIATYPE_MATCH_EXTENSION_FAIL
            }
            ValidationErrorKind::MissingValue(_) => errno::E_INVALID_VALUES,
        }
    }
}
