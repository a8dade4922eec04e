//! Picture storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Encoding a picture buffer failed
    #[display("Failed to encode picture: {}", _0)]
    Encode(String),
    /// Writing the encoded file failed
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Writing EXIF metadata failed
    #[display("Failed to write exif: {}", _0)]
    Exif(String),
    /// Picture not found
    #[display("Picture not found: {}", _0)]
    NotFound(String),
}

/// Storage error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
