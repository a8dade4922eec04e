//! Verbs selected by the last URI path segment.

use serde::{Deserialize, Serialize};

/// Verb of a command.
///
/// `UnknownType` means generic CRUD whose table is determined by the object
/// alone.
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
pub enum OperationType {
    /// Segment not recognized
    UnknownType,
    /// Open a file descriptor
    Open,
    /// Close a file descriptor
    Close,
    /// Create
    Create,
    /// Delete
    Delete,
    /// Update
    Update,
    /// Query
    Query,
    /// Scan a path
    Scan,
    /// Delete everything through the media tool
    DeleteTool,
    /// Copy an asset
    Copy,
    /// Trash a directory
    Trash,
    /// Age out trashed smart album entries
    Aging,
    /// Insert a bundle permission
    InsertPermission,
    /// Add photos to an album
    AlbumAddPhotos,
    /// Remove photos from an album
    AlbumRemovePhotos,
    /// Recover trashed assets
    AlbumRecoverAssets,
    /// Permanently delete trashed assets
    AlbumDeleteAssets,
    /// Permanently delete through the compatibility path
    CompatAlbumDeleteAssets,
    /// Move photos to trash
    TrashPhoto,
    /// Set or clear the pending state
    UpdatePending,
    /// Set a user comment
    SetUserComment,
    /// Rebuild the search index
    Index,
    /// Rebuild the analysis index
    AnalysisIndex,
    /// Commit an edit
    CommitEdit,
    /// Revert an edit
    RevertEdit,
    /// Hide or unhide
    Hide,
    /// Query hidden albums
    QueryHidden,
    /// Reorder albums
    AlbumOrder,
    /// Bind a widget form
    OprnStoreFormId,
    /// Unbind a widget form
    OprnRemoveFormId,
    /// Portrait display level
    PortraitDisplayLevel,
    /// Mark a portrait as the owner
    PortraitIsMe,
    /// Rename a portrait album
    PortraitAlbumName,
    /// Merge portrait albums
    PortraitMergeAlbum,
    /// Remove an asset from a portrait album
    DismissAsset,
    /// Portrait album cover
    PortraitCoverUri,
    /// Commit a cached asset
    SubmitCache,
    /// Batch favorite update
    BatchUpdateFav,
    /// Batch user comment update
    BatchUpdateUserComment,
    /// Set photo quality
    SetPhotoQuality,
    /// Register a captured photo for deferred processing
    AddImage,
    /// Ask for a photo to be processed now
    ProcessImage,
    /// Write GPS coordinates
    SetLocation,
    /// Withdraw a process request
    CancelProcessImage,
    /// Save the low-quality capture
    AddLowQualityImage,
    /// Log moving photo playback
    LogMovingPhoto,
    /// Dismiss a group album
    Dismiss,
    /// Rename a group album
    GroupAlbumName,
    /// Group album cover
    GroupCoverUri,
    /// Add edit filters
    AddFilters,
    /// Drop a temporary camera photo
    DiscardCameraPhoto,
    /// Keep a temporary camera photo
    SaveCameraPhoto,
    /// Cancel processing and drop a photo from the pipeline
    RemoveMscTask,
    /// Start batch thumbnail generation
    StartGenerateThumbnails,
    /// Stop batch thumbnail generation
    StopGenerateThumbnails,
    /// Query by display name through the media tool
    ToolQueryByDisplayName,
    /// Scan without refreshing albums
    ScanWithoutAlbumUpdate,
    /// Submit cloud enhancement tasks
    EnhancementAdd,
    /// Prioritize a cloud enhancement task
    EnhancementPrioritize,
    /// Cancel a cloud enhancement task
    EnhancementCancel,
    /// Cancel every cloud enhancement task
    EnhancementCancelAll,
    /// Toggle cloud enhancement sync
    EnhancementSync,
}

impl OperationType {
    /// Verbs that are served by the multi-stage capture manager.
    pub fn is_multi_stages(self) -> bool {
        matches!(
            self,
            OperationType::AddImage
                | OperationType::ProcessImage
                | OperationType::SetLocation
                | OperationType::CancelProcessImage
                | OperationType::RemoveMscTask
                | OperationType::AddLowQualityImage
        )
    }
}
