//! Decoded picture buffers handed around the capture pipeline.

use derive_getters::Getters;
use std::sync::Arc;

/// Quality tier of a cached picture.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::EnumIter,
    derive_more::Display,
)]
pub enum PictureTier {
    /// Fast capture output
    #[display("low_quality")]
    LowQuality,
    /// Deferred processing output
    #[display("high_quality")]
    HighQuality,
}

/// A decoded picture. Cloning shares the pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Picture {
    pixels: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl Picture {
    /// Wrap a decoded buffer.
    pub fn new(pixels: impl Into<Arc<[u8]>>, width: u32, height: u32) -> Self {
        Self {
            pixels: pixels.into(),
            width,
            height,
        }
    }

    /// Size of the pixel buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}
