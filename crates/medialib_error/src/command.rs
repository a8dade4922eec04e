//! URI resolution error types.

use crate::errno;

/// Kinds of command resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum CommandErrorKind {
    /// URI is outside the media authority or could not be parsed
    #[display("Invalid URI: {}", _0)]
    InvalidUri(String),
    /// Object/type pair does not resolve to a table
    #[display("No table for operation: {}", _0)]
    UnknownTable(String),
    /// Row id is not a valid file id
    #[display("Invalid file id: {}", _0)]
    InvalidFileId(String),
}

/// Command resolution error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Command Error: {} at line {} in {}", kind, line, file)]
pub struct CommandError {
    /// The kind of error that occurred
    pub kind: CommandErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CommandError {
    /// Create a new command error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CommandErrorKind) -> Self {
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
            CommandErrorKind::InvalidUri(_) | CommandErrorKind::UnknownTable(_) => {
                errno::E_INVALID_URI
            }
            CommandErrorKind::InvalidFileId(_) => errno::E_INVALID_FILEID,
        }
    }
}
