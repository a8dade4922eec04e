//! Integer-coded enums stored in the media tables.

use serde::{Deserialize, Serialize};

/// Kind of asset stored in a row.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
pub enum MediaType {
    /// Generic file
    #[display("file")]
    File,
    /// Still image
    #[display("image")]
    Image,
    /// Video
    #[display("video")]
    Video,
    /// Audio
    #[display("audio")]
    Audio,
    /// Album row in the legacy files table
    #[display("album")]
    Album,
}

impl MediaType {
    /// Stored integer value.
    pub fn as_i32(self) -> i32 {
        match self {
            MediaType::File => 0,
            MediaType::Image => 1,
            MediaType::Video => 2,
            MediaType::Audio => 3,
            MediaType::Album => 8,
        }
    }

    /// Parse a stored integer value.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(MediaType::File),
            1 => Some(MediaType::Image),
            2 => Some(MediaType::Video),
            3 => Some(MediaType::Audio),
            8 => Some(MediaType::Album),
            _ => None,
        }
    }

    /// Media type implied by a file extension, case-insensitive.
    pub fn from_extension(extension: &str) -> MediaType {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "heic" | "heif" | "dng" | "raw"
            | "svg" | "ico" => MediaType::Image,
            "mp4" | "mov" | "3gp" | "3g2" | "mkv" | "ts" | "m4v" | "webm" | "avi" | "mpeg" => {
                MediaType::Video
            }
            "mp3" | "aac" | "m4a" | "wav" | "flac" | "ogg" | "amr" | "opus" | "wma" | "mid" => {
                MediaType::Audio
            }
            _ => MediaType::File,
        }
    }
}

/// Quality tier of a photo in the multi-stage pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum PhotoQuality {
    /// Final image after deferred processing
    #[display("full")]
    Full,
    /// Fast capture awaiting processing
    #[display("low")]
    Low,
}

impl PhotoQuality {
    /// Stored integer value.
    pub fn as_i32(self) -> i32 {
        match self {
            PhotoQuality::Full => 0,
            PhotoQuality::Low => 1,
        }
    }

    /// Parse a stored integer value.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(PhotoQuality::Full),
            1 => Some(PhotoQuality::Low),
            _ => None,
        }
    }
}

/// Cloud sync marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum DirtyType {
    /// In sync with the cloud
    #[display("synced")]
    Synced,
    /// New row awaiting upload
    #[display("new")]
    New,
    /// Metadata changed
    #[display("mdirty")]
    Mdirty,
    /// File content changed
    #[display("fdirty")]
    Fdirty,
    /// Deleted locally
    #[display("deleted")]
    Deleted,
    /// Upload failed, retry pending
    #[display("retry")]
    Retry,
}

impl DirtyType {
    /// Marker written for low-quality captures so they are never uploaded.
    pub const HOLD_UPLOAD: i32 = -1;

    /// Stored integer value.
    pub fn as_i32(self) -> i32 {
        match self {
            DirtyType::Synced => 0,
            DirtyType::New => 1,
            DirtyType::Mdirty => 2,
            DirtyType::Fdirty => 3,
            DirtyType::Deleted => 4,
            DirtyType::Retry => 5,
        }
    }
}

/// Photo subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum PhotoSubtype {
    /// Plain photo
    #[display("default")]
    Default,
    /// Screenshot
    #[display("screenshot")]
    Screenshot,
    /// Still image paired with a short video
    #[display("moving_photo")]
    MovingPhoto,
}

impl PhotoSubtype {
    /// Stored integer value.
    pub fn as_i32(self) -> i32 {
        match self {
            PhotoSubtype::Default => 0,
            PhotoSubtype::Screenshot => 1,
            PhotoSubtype::MovingPhoto => 3,
        }
    }
}

/// Delivery mode requested by a client waiting on a photo.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
pub enum DeliveryMode {
    /// Whatever is available now
    #[display("fast")]
    Fast,
    /// Wait for the processed image
    #[display("high_quality")]
    HighQuality,
    /// Processed image when it is cheap enough
    #[display("balance")]
    Balance,
}

impl DeliveryMode {
    /// Stored integer value.
    pub fn as_i32(self) -> i32 {
        match self {
            DeliveryMode::Fast => 0,
            DeliveryMode::HighQuality => 1,
            DeliveryMode::Balance => 2,
        }
    }

    /// Parse a stored integer value.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(DeliveryMode::Fast),
            1 => Some(DeliveryMode::HighQuality),
            2 => Some(DeliveryMode::Balance),
            _ => None,
        }
    }

    /// Whether this mode asks the deferred service to produce the final image.
    pub fn wants_processing(self) -> bool {
        matches!(self, DeliveryMode::HighQuality | DeliveryMode::Balance)
    }
}

/// Deferred processing type requested at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum DeferredProcType {
    /// Processed in the background when idle
    #[display("background")]
    Background,
    /// Processed offline by the camera service
    #[display("offline")]
    Offline,
}

impl DeferredProcType {
    /// Stored integer value.
    pub fn as_i32(self) -> i32 {
        match self {
            DeferredProcType::Background => 0,
            DeferredProcType::Offline => 1,
        }
    }

    /// Parse a stored integer value, defaulting to background.
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => DeferredProcType::Offline,
            _ => DeferredProcType::Background,
        }
    }
}
