//! Column names of the media tables read and written by the service.

/// Row id of an asset.
pub const FILE_ID: &str = "file_id";
/// Absolute file path.
pub const DATA: &str = "data";
/// File name shown to users.
pub const DISPLAY_NAME: &str = "display_name";
/// Media name supplied on create.
pub const MEDIA_NAME: &str = "media_name";
/// Relative directory of a legacy asset.
pub const RELATIVE_PATH: &str = "relative_path";
/// [`MediaType`](crate::MediaType) of the asset.
pub const MEDIA_TYPE: &str = "media_type";
/// Creation time in milliseconds.
pub const DATE_ADDED: &str = "date_added";
/// Trash time in milliseconds, 0 when not trashed.
pub const DATE_TRASHED: &str = "date_trashed";
/// Pending time; non-zero while the asset is open for write.
pub const TIME_PENDING: &str = "time_pending";
/// Cloud sync marker, see [`DirtyType`](crate::DirtyType).
pub const DIRTY: &str = "dirty";
/// Deferred processing correlation id.
pub const PHOTO_ID: &str = "photo_id";
/// [`PhotoQuality`](crate::PhotoQuality) of the stored image.
pub const PHOTO_QUALITY: &str = "photo_quality";
/// [`DeferredProcType`](crate::DeferredProcType) requested at capture.
pub const DEFERRED_PROC_TYPE: &str = "deferred_proc_type";
/// Temporary camera asset flag.
pub const IS_TEMP: &str = "is_temp";
/// [`PhotoSubtype`](crate::PhotoSubtype) of the asset.
pub const SUBTYPE: &str = "subtype";
/// GPS latitude.
pub const LATITUDE: &str = "latitude";
/// GPS longitude.
pub const LONGITUDE: &str = "longitude";
/// Calling bundle name.
pub const OWNER_PACKAGE: &str = "owner_package";
