//! Top-level error wrapper types.

use crate::{
    CommandError, ConfigError, DatabaseError, StateError, StorageError, ValidationError, errno,
};

/// Union of every error area in the media library.
///
/// # Examples
///
/// ```
/// use medialib_error::{CommandError, CommandErrorKind, MediaLibraryError};
///
/// let err: MediaLibraryError =
///     CommandError::new(CommandErrorKind::InvalidUri("file:///x".into())).into();
/// assert!(format!("{}", err).contains("Command Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum MediaLibraryErrorKind {
    /// URI resolution error
    #[from(CommandError)]
    Command(CommandError),
    /// Payload validation error
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Relational store error
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Asset state error
    #[from(StateError)]
    State(StateError),
    /// Picture storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Media library error with kind discrimination.
///
/// # Examples
///
/// ```
/// use medialib_error::{MediaLibraryResult, StateError, StateErrorKind, errno};
///
/// fn open() -> MediaLibraryResult<()> {
///     Err(StateError::new(StateErrorKind::Pending("7".into())))?
/// }
///
/// assert_eq!(open().unwrap_err().errno(), errno::E_IS_PENDING);
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Media Library Error: {}", _0)]
pub struct MediaLibraryError(Box<MediaLibraryErrorKind>);

impl MediaLibraryError {
    /// Create a new error from a kind.
    pub fn new(kind: MediaLibraryErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MediaLibraryErrorKind {
        &self.0
    }

    /// Stable negative code returned across the dispatch boundary.
    pub fn errno(&self) -> i32 {
        match self.kind() {
            MediaLibraryErrorKind::Command(e) => e.errno(),
            MediaLibraryErrorKind::Validation(e) => e.errno(),
            MediaLibraryErrorKind::Database(_) => errno::E_HAS_DB_ERROR,
            MediaLibraryErrorKind::State(e) => e.errno(),
            MediaLibraryErrorKind::Storage(_) => errno::E_FILE_OPER_FAIL,
            MediaLibraryErrorKind::Config(_) => errno::E_CONFIG_INVALID,
        }
    }
}

impl<T> From<T> for MediaLibraryError
where
    T: Into<MediaLibraryErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for media library operations.
pub type MediaLibraryResult<T> = std::result::Result<T, MediaLibraryError>;
