//! Short-lived picture cache for multi-stage photo capture.
//!
//! The camera hands over decoded pictures before the matching database row is
//! final. [`PictureCache`] holds them per image id in two independent tiers
//! (low and high quality) until they are flushed to disk through the
//! [`ImageCodec`](medialib_interface::ImageCodec) or expire.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;

pub use cache::{CachedPicture, PictureCache, PicturePair};
pub use config::{PictureCacheConfig, PictureCacheConfigBuilder};
