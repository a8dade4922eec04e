//! Error types for the media library data service.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Nothing crosses the URI dispatch boundary as a Rust error. Public entry
//! points convert through [`MediaLibraryError::errno`] into the negative codes
//! in [`errno`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod config;
mod database;
pub mod errno;
mod error;
mod state;
mod storage;
mod validation;

pub use command::{CommandError, CommandErrorKind};
pub use config::ConfigError;
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{MediaLibraryError, MediaLibraryErrorKind, MediaLibraryResult};
pub use state::{StateError, StateErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use validation::{ValidationError, ValidationErrorKind};
