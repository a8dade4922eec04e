//! Lookup tables from URI segments to objects, types and physical tables.
//!
//! The built-in tables are constructed once on first use and shared through an
//! `Arc`. Resolvers take the tables by injection, so tests can substitute
//! their own.

use crate::{OperationObject, OperationType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Physical table names.
pub mod table {
    /// Legacy files table, fallback for objects without a mapping
    pub const MEDIALIBRARY_TABLE: &str = "Files";
    /// Photos and videos
    pub const PHOTOS_TABLE: &str = "Photos";
    /// Audios
    pub const AUDIOS_TABLE: &str = "Audios";
    /// User and system photo albums
    pub const PHOTO_ALBUM_TABLE: &str = "PhotoAlbum";
    /// Photo album membership
    pub const PHOTO_MAP_TABLE: &str = "PhotoMap";
    /// Legacy album view
    pub const ALBUM_TABLE: &str = "Album";
    /// Media type directories
    pub const MEDIATYPE_DIRECTORY_TABLE: &str = "MediaTypeDirectory";
    /// Smart albums
    pub const SMARTALBUM_TABLE: &str = "SmartAlbum";
    /// Smart album membership
    pub const SMARTALBUM_MAP_TABLE: &str = "SmartMap";
    /// Smart album asset view
    pub const SMARTALBUMASSETS_TABLE: &str = "SmartAsset";
    /// Asset map view
    pub const ASSETMAP_TABLE: &str = "AssetMap";
    /// Distributed devices
    pub const DEVICE_TABLE: &str = "Device";
    /// Bundle permissions
    pub const BUNDLE_PERMISSION_TABLE: &str = "BundlePermission";
    /// Uri grants
    pub const URI_PERMISSION_TABLE: &str = "UriPermission";
    /// Analysis albums
    pub const ANALYSIS_ALBUM_TABLE: &str = "AnalysisAlbum";
    /// Analysis album membership
    pub const ANALYSIS_PHOTO_MAP_TABLE: &str = "AnalysisPhotoMap";
    /// Widget form bindings
    pub const FORM_MAP_TABLE: &str = "FormMap";
    /// OCR results
    pub const VISION_OCR_TABLE: &str = "tab_analysis_ocr";
    /// Image labels
    pub const VISION_LABEL_TABLE: &str = "tab_analysis_label";
    /// Video labels
    pub const VISION_VIDEO_LABEL_TABLE: &str = "tab_analysis_video_label";
    /// Aesthetics scores
    pub const VISION_AESTHETICS_TABLE: &str = "tab_analysis_aesthetics_score";
    /// Analysis status
    pub const VISION_TOTAL_TABLE: &str = "tab_analysis_total";
    /// Faces
    pub const VISION_IMAGE_FACE_TABLE: &str = "tab_analysis_image_face";
    /// Face clusters
    pub const VISION_FACE_TAG_TABLE: &str = "tab_analysis_face_tag";
    /// Saliency
    pub const VISION_SALIENCY_TABLE: &str = "tab_analysis_saliency_detect";
    /// Objects
    pub const VISION_OBJECT_TABLE: &str = "tab_analysis_object";
    /// Crop recommendations
    pub const VISION_RECOMMENDATION_TABLE: &str = "tab_analysis_recommendation";
    /// Segmentation
    pub const VISION_SEGMENTATION_TABLE: &str = "tab_analysis_segmentation";
    /// Composition
    pub const VISION_COMPOSITION_TABLE: &str = "tab_analysis_composition";
    /// Heads
    pub const VISION_HEAD_TABLE: &str = "tab_analysis_head";
    /// Poses
    pub const VISION_POSE_TABLE: &str = "tab_analysis_pose";
    /// Geo dictionary
    pub const GEO_DICTIONARY_TABLE: &str = "tab_analysis_geo_dictionary";
    /// Geo knowledge
    pub const GEO_KNOWLEDGE_TABLE: &str = "tab_analysis_geo_knowledge";
    /// Search index status
    pub const SEARCH_TOTAL_TABLE: &str = "tab_analysis_search_index";
    /// Highlight albums
    pub const HIGHLIGHT_ALBUM_TABLE: &str = "tab_highlight_album";
    /// Highlight covers
    pub const HIGHLIGHT_COVER_TABLE: &str = "tab_highlight_cover_info";
    /// Highlight play info
    pub const HIGHLIGHT_PLAY_TABLE: &str = "tab_highlight_play_info";
    /// User photography statistics
    pub const USER_PHOTOGRAPHY_TABLE: &str = "tab_user_photography_info";
}

/// Which table name set is in effect for objects with two historical layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableNameMode {
    /// Current layout
    #[default]
    Standard,
    /// Layout kept for apps built against the old album model
    Compatibility,
}

impl TableNameMode {
    /// Mode from the `[tables] compatibility` flag.
    pub fn from_compatibility(enabled: bool) -> Self {
        if enabled {
            TableNameMode::Compatibility
        } else {
            TableNameMode::Standard
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TableName {
    standard: String,
    compatibility: Option<String>,
}

impl TableName {
    fn pick(&self, mode: TableNameMode) -> &str {
        match (mode, &self.compatibility) {
            (TableNameMode::Compatibility, Some(compat)) => compat,
            _ => &self.standard,
        }
    }
}

static STANDARD: LazyLock<Arc<OperationTables>> =
    LazyLock::new(|| Arc::new(OperationTables::builtin()));

/// Segment and table lookup tables.
///
/// Object and type lookups are exact-key: two routes can never shadow each
/// other, because a segment either is a key or it is not.
///
/// # Example
///
/// ```
/// use medialib_command::{OperationObject, OperationTables, OperationType, TableNameMode};
///
/// let tables = OperationTables::standard();
/// let object = tables.resolve_object("phaccess_photo_operation");
/// let op_type = tables.resolve_type("create");
/// assert_eq!(object, OperationObject::PahPhoto);
/// assert_eq!(op_type, OperationType::Create);
/// assert_eq!(
///     tables.resolve_table_name(object, op_type, TableNameMode::Standard),
///     Some("Photos")
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct OperationTables {
    objects: HashMap<String, OperationObject>,
    types: HashMap<String, OperationType>,
    tables: HashMap<OperationObject, HashMap<OperationType, TableName>>,
}

impl OperationTables {
    /// Tables with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Shared built-in tables, constructed on first use.
    pub fn standard() -> Arc<OperationTables> {
        Arc::clone(&STANDARD)
    }

    /// Map a URI object segment to an object.
    pub fn register_object(&mut self, segment: &str, object: OperationObject) -> &mut Self {
        self.objects.insert(segment.to_string(), object);
        self
    }

    /// Map a URI verb segment to a type.
    pub fn register_type(&mut self, segment: &str, op_type: OperationType) -> &mut Self {
        self.types.insert(segment.to_string(), op_type);
        self
    }

    /// Map `(object, type)` to a table. `UnknownType` means any verb.
    pub fn register_table(
        &mut self,
        object: OperationObject,
        op_type: OperationType,
        table: &str,
    ) -> &mut Self {
        self.tables.entry(object).or_default().insert(
            op_type,
            TableName {
                standard: table.to_string(),
                compatibility: None,
            },
        );
        self
    }

    /// Map `(object, type)` to a table with a separate compatibility name.
    pub fn register_compat_table(
        &mut self,
        object: OperationObject,
        op_type: OperationType,
        standard: &str,
        compatibility: &str,
    ) -> &mut Self {
        self.tables.entry(object).or_default().insert(
            op_type,
            TableName {
                standard: standard.to_string(),
                compatibility: Some(compatibility.to_string()),
            },
        );
        self
    }

    /// Object for a URI segment, `UnknownObject` when absent.
    pub fn resolve_object(&self, segment: &str) -> OperationObject {
        self.objects
            .get(segment)
            .copied()
            .unwrap_or(OperationObject::UnknownObject)
    }

    /// Type for a URI segment, `UnknownType` when absent.
    pub fn resolve_type(&self, segment: &str) -> OperationType {
        self.types
            .get(segment)
            .copied()
            .unwrap_or(OperationType::UnknownType)
    }

    /// Table for `(object, type)`.
    ///
    /// Tries the specific type, then the object's `UnknownType` entry, then the
    /// legacy files table. `UnknownObject` has no table.
    pub fn resolve_table_name(
        &self,
        object: OperationObject,
        op_type: OperationType,
        mode: TableNameMode,
    ) -> Option<&str> {
        if object == OperationObject::UnknownObject {
            return None;
        }
        let Some(by_type) = self.tables.get(&object) else {
            return Some(table::MEDIALIBRARY_TABLE);
        };
        let name = by_type
            .get(&op_type)
            .or_else(|| by_type.get(&OperationType::UnknownType))
            .map(|name| name.pick(mode))
            .unwrap_or(table::MEDIALIBRARY_TABLE);
        Some(name)
    }

    /// Number of registered object segments.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Registered object segments.
    pub fn object_segments(&self) -> impl Iterator<Item = (&str, OperationObject)> {
        self.objects.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Registered verb segments.
    pub fn type_segments(&self) -> impl Iterator<Item = (&str, OperationType)> {
        self.types.iter().map(|(k, v)| (k.as_str(), *v))
    }

    fn builtin() -> Self {
        use OperationObject as O;
        use OperationType as T;
        use self::table::*;

        let mut tables = Self::empty();

        for (segment, object) in [
            ("file_operation", O::FilesystemAsset),
            ("photo_operation", O::FilesystemPhoto),
            ("audio_operation", O::FilesystemAudio),
            ("dir_operation", O::FilesystemDir),
            ("album_operation", O::FilesystemAlbum),
            ("albumsmart_operation", O::SmartAlbum),
            ("smartalbummap_operation", O::SmartAlbumMap),
            ("bundle_permission_insert_operation", O::BundlePermission),
            ("app_uri_permission_operation", O::MediaAppUriPermission),
            ("phaccess_granturipermission", O::AppUriPermissionInner),
            ("phaccess_checkuripermission", O::AppUriPermissionInner),
            ("MediaTypeDirectory", O::FilesystemDir),
            ("thumbnail", O::Thumbnail),
            ("SmartAlbum", O::SmartAlbum),
            ("SmartMap", O::SmartAlbumMap),
            ("SmartAsset", O::SmartAlbumAssets),
            ("AssetMap", O::AssetMap),
            ("query_all_device", O::AllDevice),
            ("query_active_device", O::ActiveDevice),
            ("query_album", O::FilesystemAlbum),
            ("query_media_volume", O::MediaVolume),
            ("photo_album_v10_operation", O::PhotoAlbum),
            ("photo_map_v10_operation", O::PhotoMap),
            ("userfilemgr_photo_operation", O::UfmPhoto),
            ("userfilemgr_audio_operation", O::UfmAudio),
            ("userfilemgr_photo_album_operation", O::UfmAlbum),
            ("userfilemgr_photo_map_operation", O::UfmMap),
            ("phaccess_photo_operation", O::PahPhoto),
            ("phaccess_album_operation", O::PahAlbum),
            ("phaccess_map_operation", O::PahMap),
            ("phaccess_store_form_operation", O::PahFormMap),
            ("phaccess_multistages_capture_operation", O::PahMultistagesCapture),
            ("moving_photo_operation", O::PahMovingPhoto),
            ("phaccess_batch_thumbnail_operation", O::PahBatchThumbnailOperate),
            ("phaccess_cloud_enhancement_operation", O::PahCloudEnhancementOperate),
            ("phaccess_ana_album_operation", O::AnalysisPhotoAlbum),
            ("phaccess_ana_map_operation", O::AnalysisPhotoMap),
            ("mediatool_photo_operation", O::ToolPhoto),
            ("mediatool_audio_operation", O::ToolAudio),
            ("mediatool_album_operation", O::ToolAlbum),
            ("phaccess_ana_ocr_operation", O::VisionOcr),
            ("phaccess_ana_label_operation", O::VisionLabel),
            ("phaccess_ana_video_label_operation", O::VisionVideoLabel),
            ("phaccess_ana_atts_operation", O::VisionAesthetics),
            ("phaccess_ana_total_operation", O::VisionTotal),
            ("phaccess_ana_face_operation", O::VisionImageFace),
            ("tab_analysis_image_face", O::VisionImageFace),
            ("phaccess_ana_face_tag_operation", O::VisionFaceTag),
            ("tab_analysis_face_tag", O::VisionFaceTag),
            ("phaccess_ana_sal_operation", O::VisionSaliency),
            ("phaccess_ana_object_operation", O::VisionObject),
            ("phaccess_ana_recommendation_operation", O::VisionRecommendation),
            ("phaccess_ana_segmentation_operation", O::VisionSegmentation),
            ("phaccess_ana_composition_operation", O::VisionComposition),
            ("phaccess_ana_head_operation", O::VisionHead),
            ("phaccess_ana_pose_operation", O::VisionPose),
            ("phaccess_geo_dictionary_operation", O::GeoDictionary),
            ("phaccess_geo_knowledge_operation", O::GeoKnowledge),
            ("phaccess_ana_address_operation", O::GeoPhoto),
            ("phaccess_geo_photos_operation", O::GeoPhoto),
            ("phaccess_search_total_operation", O::SearchTotal),
            ("phaccess_search_index_construction_operation", O::IndexConstructionStatus),
            ("tab_highlight_album", O::StoryAlbum),
            ("tab_highlight_cover_info", O::StoryCover),
            ("phaccess_highlight_cover_operation", O::StoryCover),
            ("tab_highlight_play_info", O::StoryPlay),
            ("phaccess_highlight_play_operation", O::StoryPlay),
            ("phaccess_user_photography_operation", O::UserPhotography),
            ("miscellaneous_operation", O::Miscellaneous),
        ] {
            tables.register_object(segment, object);
        }

        for (segment, op_type) in [
            ("open", T::Open),
            ("close_asset", T::Close),
            ("close", T::Close),
            ("create_asset", T::Create),
            ("create_album", T::Create),
            ("create", T::Create),
            ("create_component", T::Create),
            ("fms_create_dir", T::Create),
            ("create_smartalbum", T::Create),
            ("add_smartalbum_map", T::Create),
            ("delete_asset", T::Delete),
            ("delete_album", T::Delete),
            ("delete_dir", T::Delete),
            ("fms_delete_dir", T::Delete),
            ("delete_smartalbum", T::Delete),
            ("remove_smartalbum_map", T::Delete),
            ("delete", T::Delete),
            ("modify_asset", T::Update),
            ("modify_album", T::Update),
            ("modify_smartalbum", T::Update),
            ("update", T::Update),
            ("query_album", T::Query),
            ("get_album_capacity", T::Query),
            ("query_media_volume", T::Query),
            ("query", T::Query),
            ("boardcast", T::Scan),
            ("scan", T::Scan),
            ("delete_by_tool", T::DeleteTool),
            ("copy_asset", T::Copy),
            ("fms_trash_dir", T::Trash),
            ("ageing_smartalbum_map", T::Aging),
            ("bundle_permission_insert_operation", T::InsertPermission),
            ("add_photos", T::AlbumAddPhotos),
            ("remove_photos", T::AlbumRemovePhotos),
            ("recover_photos", T::AlbumRecoverAssets),
            ("delete_photos_permanently", T::AlbumDeleteAssets),
            ("compat_delete_photos_permanently", T::CompatAlbumDeleteAssets),
            ("trash", T::TrashPhoto),
            ("update_pending", T::UpdatePending),
            ("set_user_comment", T::SetUserComment),
            ("index", T::Index),
            ("analysis_index", T::AnalysisIndex),
            ("operation_commit_edit", T::CommitEdit),
            ("operation_revert_edit", T::RevertEdit),
            ("hide", T::Hide),
            ("query_hidden", T::QueryHidden),
            ("order_album", T::AlbumOrder),
            ("store_form_id", T::OprnStoreFormId),
            ("remove_form_id", T::OprnRemoveFormId),
            ("display_level", T::PortraitDisplayLevel),
            ("is_me", T::PortraitIsMe),
            ("album_name", T::PortraitAlbumName),
            ("merge_album", T::PortraitMergeAlbum),
            ("dismiss_asset", T::DismissAsset),
            ("cover_uri", T::PortraitCoverUri),
            ("operation_submit_cache", T::SubmitCache),
            ("batch_update_favorite", T::BatchUpdateFav),
            ("batch_update_user_comment", T::BatchUpdateUserComment),
            ("set_photo_quality", T::SetPhotoQuality),
            ("add_image", T::AddImage),
            ("process_image", T::ProcessImage),
            ("set_location", T::SetLocation),
            ("cancel_process_image", T::CancelProcessImage),
            ("add_lowquality_image", T::AddLowQualityImage),
            ("log_moving_photo", T::LogMovingPhoto),
            ("dismiss", T::Dismiss),
            ("group_album_name", T::GroupAlbumName),
            ("group_cover_uri", T::GroupCoverUri),
            ("add_filters", T::AddFilters),
            ("discard_camera_photo", T::DiscardCameraPhoto),
            ("save_camera_photo", T::SaveCameraPhoto),
            ("remove_msc_task", T::RemoveMscTask),
            ("start_generate_thumbnails", T::StartGenerateThumbnails),
            ("stop_generate_thumbnails", T::StopGenerateThumbnails),
            ("tool_query_by_display_name", T::ToolQueryByDisplayName),
            ("scan_without_album_update", T::ScanWithoutAlbumUpdate),
            ("enhancement_add", T::EnhancementAdd),
            ("enhancement_prioritize", T::EnhancementPrioritize),
            ("enhancement_cancel", T::EnhancementCancel),
            ("enhancement_cancel_all", T::EnhancementCancelAll),
            ("enhancement_sync", T::EnhancementSync),
        ] {
            tables.register_type(segment, op_type);
        }

        let any = T::UnknownType;
        for (object, name) in [
            (O::SmartAlbum, SMARTALBUM_TABLE),
            (O::SmartAlbumMap, SMARTALBUM_MAP_TABLE),
            (O::SmartAlbumAssets, SMARTALBUMASSETS_TABLE),
            (O::AssetMap, ASSETMAP_TABLE),
            (O::AllDevice, DEVICE_TABLE),
            (O::ActiveDevice, DEVICE_TABLE),
            (O::BundlePermission, BUNDLE_PERMISSION_TABLE),
            (O::FilesystemPhoto, PHOTOS_TABLE),
            (O::UfmPhoto, PHOTOS_TABLE),
            (O::PahPhoto, PHOTOS_TABLE),
            (O::ToolPhoto, PHOTOS_TABLE),
            (O::GeoPhoto, PHOTOS_TABLE),
            (O::PahMultistagesCapture, PHOTOS_TABLE),
            (O::PahMovingPhoto, PHOTOS_TABLE),
            (O::PahBatchThumbnailOperate, PHOTOS_TABLE),
            (O::PahCloudEnhancementOperate, PHOTOS_TABLE),
            (O::FilesystemAudio, AUDIOS_TABLE),
            (O::UfmAudio, AUDIOS_TABLE),
            (O::ToolAudio, AUDIOS_TABLE),
            (O::MediaAppUriPermission, URI_PERMISSION_TABLE),
            (O::AppUriPermissionInner, URI_PERMISSION_TABLE),
            (O::PhotoAlbum, PHOTO_ALBUM_TABLE),
            (O::UfmAlbum, PHOTO_ALBUM_TABLE),
            (O::PahAlbum, PHOTO_ALBUM_TABLE),
            (O::ToolAlbum, PHOTO_ALBUM_TABLE),
            (O::PhotoMap, PHOTO_MAP_TABLE),
            (O::UfmMap, PHOTO_MAP_TABLE),
            (O::PahMap, PHOTO_MAP_TABLE),
            (O::AnalysisPhotoAlbum, ANALYSIS_ALBUM_TABLE),
            (O::AnalysisPhotoMap, ANALYSIS_PHOTO_MAP_TABLE),
            (O::PahFormMap, FORM_MAP_TABLE),
            (O::VisionOcr, VISION_OCR_TABLE),
            (O::VisionLabel, VISION_LABEL_TABLE),
            (O::VisionVideoLabel, VISION_VIDEO_LABEL_TABLE),
            (O::VisionAesthetics, VISION_AESTHETICS_TABLE),
            (O::VisionTotal, VISION_TOTAL_TABLE),
            (O::VisionImageFace, VISION_IMAGE_FACE_TABLE),
            (O::VisionFaceTag, VISION_FACE_TAG_TABLE),
            (O::VisionSaliency, VISION_SALIENCY_TABLE),
            (O::VisionObject, VISION_OBJECT_TABLE),
            (O::VisionRecommendation, VISION_RECOMMENDATION_TABLE),
            (O::VisionSegmentation, VISION_SEGMENTATION_TABLE),
            (O::VisionComposition, VISION_COMPOSITION_TABLE),
            (O::VisionHead, VISION_HEAD_TABLE),
            (O::VisionPose, VISION_POSE_TABLE),
            (O::GeoDictionary, GEO_DICTIONARY_TABLE),
            (O::GeoKnowledge, GEO_KNOWLEDGE_TABLE),
            (O::SearchTotal, SEARCH_TOTAL_TABLE),
            (O::IndexConstructionStatus, SEARCH_TOTAL_TABLE),
            (O::StoryAlbum, HIGHLIGHT_ALBUM_TABLE),
            (O::StoryCover, HIGHLIGHT_COVER_TABLE),
            (O::StoryPlay, HIGHLIGHT_PLAY_TABLE),
            (O::UserPhotography, USER_PHOTOGRAPHY_TABLE),
        ] {
            tables.register_table(object, any, name);
        }

        tables
            .register_table(O::FilesystemDir, T::Query, MEDIATYPE_DIRECTORY_TABLE)
            .register_compat_table(
                O::FilesystemAlbum,
                T::Query,
                ALBUM_TABLE,
                PHOTO_ALBUM_TABLE,
            );

        tables
    }
}
