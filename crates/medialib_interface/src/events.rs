//! Messages sent by the deferred processing service.

use derive_getters::Getters;
use medialib_core::Picture;

/// Why the deferred service gave up on a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProcessingErrorKind {
    /// Took too long; may succeed later
    #[display("timeout")]
    Timeout,
    /// Service busy; may succeed later
    #[display("busy")]
    Busy,
    /// The photo cannot be processed at all
    #[display("invalid")]
    Invalid,
    /// Generic failure; may succeed later
    #[display("failed")]
    Failed,
}

impl ProcessingErrorKind {
    /// Whether a later reconciliation may still succeed.
    pub fn is_retryable(self) -> bool {
        !matches!(self, ProcessingErrorKind::Invalid)
    }

    /// Result code reported to telemetry.
    pub fn code(self) -> i32 {
        match self {
            ProcessingErrorKind::Timeout => 1,
            ProcessingErrorKind::Busy => 2,
            ProcessingErrorKind::Invalid => 3,
            ProcessingErrorKind::Failed => 4,
        }
    }
}

/// Lifecycle of the deferred service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SessionState {
    /// Nothing queued
    #[display("idle")]
    Idle,
    /// Processing
    #[display("running")]
    Running,
    /// Paused by the system
    #[display("suspended")]
    Suspended,
}

/// Final image produced for a photo.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ProcessedImage {
    photo_id: String,
    picture: Option<Picture>,
    is_edited: bool,
}

impl ProcessedImage {
    /// A finished photo. `picture` is `None` when the service wrote the file itself.
    pub fn new(photo_id: impl Into<String>, picture: Option<Picture>, is_edited: bool) -> Self {
        Self {
            photo_id: photo_id.into(),
            picture,
            is_edited,
        }
    }
}

/// A completion message from the deferred service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingEvent {
    /// Processing finished
    ImageDone(ProcessedImage),
    /// Processing failed
    Error {
        /// Photo the failure belongs to
        photo_id: String,
        /// Failure kind
        kind: ProcessingErrorKind,
    },
    /// Service state changed
    StateChanged(SessionState),
}

impl ProcessingEvent {
    /// Photo the event is about, if any.
    pub fn photo_id(&self) -> Option<&str> {
        match self {
            ProcessingEvent::ImageDone(image) => Some(image.photo_id()),
            ProcessingEvent::Error { photo_id, .. } => Some(photo_id),
            ProcessingEvent::StateChanged(_) => None,
        }
    }
}
