//! Asset state errors.

use crate::errno;

/// Kinds of state errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StateErrorKind {
    /// Asset is still open for write
    #[display("Asset is pending: {}", _0)]
    Pending(String),
    /// Photo is not tracked by the deferred pipeline
    #[display("Photo not in process: {}", _0)]
    NotInProcess(String),
}

/// State error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("State Error: {} at line {} in {}", kind, line, file)]
pub struct StateError {
    /// The kind of error that occurred
    pub kind: StateErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StateError {
    /// Create a new state error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StateErrorKind) -> Self {
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
            StateErrorKind::Pending(_) => errno::E_IS_PENDING,
            StateErrorKind::NotInProcess(_) => errno::E_NOT_IN_PROCESS,
        }
    }
}
