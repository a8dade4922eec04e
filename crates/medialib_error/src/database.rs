//! Relational store error types.

/// Kinds of database errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DatabaseErrorKind {
    /// Query failed
    #[display("Query failed: {}", _0)]
    Query(String),
    /// Insert failed
    #[display("Insert failed: {}", _0)]
    Insert(String),
    /// Update failed
    #[display("Update failed: {}", _0)]
    Update(String),
    /// Delete failed
    #[display("Delete failed: {}", _0)]
    Delete(String),
    /// Raw statement failed
    #[display("Execute failed: {}", _0)]
    Execute(String),
    /// Transaction was rolled back
    #[display("Transaction failed: {}", _0)]
    Transaction(String),
}

/// Database error with location tracking.
///
/// Every variant surfaces to callers as `E_HAS_DB_ERROR`.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Database Error: {} at line {} in {}", kind, line, file)]
pub struct DatabaseError {
    /// The kind of error that occurred
    pub kind: DatabaseErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DatabaseError {
    /// Create a new database error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DatabaseErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
