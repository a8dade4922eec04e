//! Negative integer error codes returned across the URI dispatch boundary.
//!
//! Callers of the data service receive either a non-negative row id / row
//! count or one of these codes.

/// Success.
pub const E_OK: i32 = 0;
/// Unspecified failure.
pub const E_FAIL: i32 = -1;
/// Any relational store failure.
pub const E_HAS_DB_ERROR: i32 = -222;

const E_MEDIA_BASE: i32 = -2000;

/// Missing or malformed values in the request payload.
pub const E_INVALID_VALUES: i32 = E_MEDIA_BASE - 1;
/// The URI does not address a known object or table.
pub const E_INVALID_URI: i32 = E_MEDIA_BASE - 2;
/// The row id segment or column is not a valid file id.
pub const E_INVALID_FILEID: i32 = E_MEDIA_BASE - 3;
/// Display name failed validation.
pub const E_INVALID_DISPLAY_NAME: i32 = E_MEDIA_BASE - 4;
/// Relative path failed validation.
pub const E_INVALID_PATH: i32 = E_MEDIA_BASE - 5;
/// File extension does not match the declared media type.
pub const E_CHECK_MEDIATYPE_MATCH_EXTENSION_FAIL: i32 = E_MEDIA_BASE - 6;
/// The asset is still open for write.
pub const E_IS_PENDING: i32 = E_MEDIA_BASE - 7;
/// The photo is not tracked by the deferred processing pipeline.
pub const E_NOT_IN_PROCESS: i32 = E_MEDIA_BASE - 8;
/// Encoding or writing a picture file failed.
pub const E_FILE_OPER_FAIL: i32 = E_MEDIA_BASE - 9;
/// Configuration could not be loaded.
pub const E_CONFIG_INVALID: i32 = E_MEDIA_BASE - 10;
