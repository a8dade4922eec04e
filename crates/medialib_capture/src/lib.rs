//! Multi-stage photo capture for the media library.
//!
//! [`CaptureManager`] drives the lifecycle of a camera capture from the fast
//! low-quality save to the final image produced by the deferred processing
//! service:
//!
//! ```text
//! CreatedLow --process_image--> ProcessingRequested --ImageDone--> upgraded
//!      |                              |
//!      +--remove_image--> removed     +--last cancel--> cancelled
//! ```
//!
//! [`RequestTaskTracker`] holds the per-photo request counters that debounce
//! forwarding to the service, and [`dfx`] collects capture telemetry.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dfx;
mod manager;
mod tracker;

pub use dfx::MultiStagesCaptureDfx;
pub use manager::{CaptureManager, UNKNOWN_BUNDLE};
pub use tracker::{CapturePhase, RequestCountChange, RequestTaskTracker, RequestType};
