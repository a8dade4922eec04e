//! Collaborator interfaces for the media library.
//!
//! The relational store, the deferred processing service and the image codec
//! live outside this workspace. The core talks to them only through these
//! traits and the [`ProcessingEvent`] messages.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod events;
mod traits;

pub use events::{ProcessedImage, ProcessingErrorKind, ProcessingEvent, SessionState};
pub use traits::{Database, DeferredProcessingSession, ImageCodec, UpdateStatement};
