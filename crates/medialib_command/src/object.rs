//! Logical resource kinds addressed by a URI.

use serde::{Deserialize, Serialize};

/// Resource kind selected by the first path segment after `/media`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationObject {
    /// Segment not recognized
    UnknownObject,
    // legacy file model
    /// Any asset in the legacy files table
    FilesystemAsset,
    /// Photo or video asset
    FilesystemPhoto,
    /// Audio asset
    FilesystemAudio,
    /// Media type directory
    FilesystemDir,
    /// Legacy album
    FilesystemAlbum,
    /// Smart album
    SmartAlbum,
    /// Smart album membership
    SmartAlbumMap,
    /// Assets of a smart album
    SmartAlbumAssets,
    /// Asset map view
    AssetMap,
    /// All distributed devices
    AllDevice,
    /// Online distributed devices
    ActiveDevice,
    /// Bundle permission grants
    BundlePermission,
    /// Thumbnail access
    Thumbnail,
    /// Volume usage statistics
    MediaVolume,
    // v9 user file manager
    /// Photo album (v9)
    PhotoAlbum,
    /// Photo album membership (v9)
    PhotoMap,
    /// Photos through user file manager
    UfmPhoto,
    /// Audios through user file manager
    UfmAudio,
    /// Albums through user file manager
    UfmAlbum,
    /// Album membership through user file manager
    UfmMap,
    // v10 photo access helper
    /// Photos through photo access helper
    PahPhoto,
    /// Albums through photo access helper
    PahAlbum,
    /// Album membership through photo access helper
    PahMap,
    /// Widget form bindings
    PahFormMap,
    /// Multi-stage capture control
    PahMultistagesCapture,
    /// Moving photo operations
    PahMovingPhoto,
    /// Batch thumbnail generation
    PahBatchThumbnailOperate,
    /// Cloud enhancement tasks
    PahCloudEnhancementOperate,
    /// App-scoped uri grants
    MediaAppUriPermission,
    /// Internal uri grant checks
    AppUriPermissionInner,
    /// Analysis albums (portraits, places, ...)
    AnalysisPhotoAlbum,
    /// Analysis album membership
    AnalysisPhotoMap,
    // media tool
    /// Photos through the media tool
    ToolPhoto,
    /// Audios through the media tool
    ToolAudio,
    /// Albums through the media tool
    ToolAlbum,
    // vision analysis
    /// OCR results
    VisionOcr,
    /// Image labels
    VisionLabel,
    /// Video labels
    VisionVideoLabel,
    /// Aesthetics scores
    VisionAesthetics,
    /// Per-photo analysis status
    VisionTotal,
    /// Detected faces
    VisionImageFace,
    /// Face clusters
    VisionFaceTag,
    /// Saliency detection
    VisionSaliency,
    /// Object detection
    VisionObject,
    /// Crop recommendation
    VisionRecommendation,
    /// Segmentation
    VisionSegmentation,
    /// Composition
    VisionComposition,
    /// Head detection
    VisionHead,
    /// Pose detection
    VisionPose,
    // geo and search
    /// Geo name dictionary
    GeoDictionary,
    /// Geo knowledge base
    GeoKnowledge,
    /// Photos with addresses
    GeoPhoto,
    /// Search index status
    SearchTotal,
    /// Search index construction progress
    IndexConstructionStatus,
    // highlights
    /// Highlight albums
    StoryAlbum,
    /// Highlight covers
    StoryCover,
    /// Highlight play info
    StoryPlay,
    /// User photography statistics
    UserPhotography,
    /// Anything that does not touch a table
    Miscellaneous,
}

impl OperationObject {
    /// Objects whose rows are photo or video assets.
    pub fn is_photo(self) -> bool {
        matches!(
            self,
            OperationObject::FilesystemPhoto
                | OperationObject::UfmPhoto
                | OperationObject::PahPhoto
                | OperationObject::ToolPhoto
        )
    }

    /// Objects whose rows are audio assets.
    pub fn is_audio(self) -> bool {
        matches!(
            self,
            OperationObject::FilesystemAudio | OperationObject::UfmAudio | OperationObject::ToolAudio
        )
    }

    /// Smart album tables never go through a distributed table name.
    pub fn is_distributable(self) -> bool {
        !matches!(
            self,
            OperationObject::SmartAlbum | OperationObject::SmartAlbumMap
        )
    }
}
