//! URI constants and shape parsing.

use serde::{Deserialize, Serialize};
use url::Url;

/// Root of every data-share media URI.
pub const MEDIALIBRARY_DATA_URI: &str = "datashare:///media";
/// Scheme of data-share URIs.
pub const DATASHARE_SCHEME: &str = "datashare";
/// First path segment of data-share media URIs.
pub const MEDIA_ROOT: &str = "media";
/// Prefix of photo asset URIs.
pub const PHOTO_URI_PREFIX: &str = "file://media/Photo/";
/// Prefix of audio asset URIs.
pub const AUDIO_URI_PREFIX: &str = "file://media/Audio/";
/// `save_picture` value asking to keep the low-quality capture.
pub const SAVE_LOW_QUALITY_PICTURE: &str = "add_lowquality_image";

/// Recognized query keys.
pub mod query_key {
    /// API generation of the caller
    pub const API_VERSION: &str = "api_version";
    /// Secondary user id
    pub const USER: &str = "user";
    /// Verb override when the path carries none
    pub const OPERATION: &str = "operation";
    /// Multi-stage capture save request
    pub const SAVE_PICTURE: &str = "save_picture";
    /// Distributed device id
    pub const NETWORK_ID: &str = "networkid";
    /// Thumbnail width
    pub const WIDTH: &str = "width";
    /// Thumbnail height
    pub const HEIGHT: &str = "height";
}

/// API generation of the calling app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApiVersion {
    /// Original file-model API
    #[default]
    Legacy,
    /// User file manager API
    V9,
    /// Photo access helper API
    V10,
}

impl ApiVersion {
    /// Parse the `api_version` query value. Unparsable values mean legacy.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.and_then(|v| v.trim().parse::<i32>().ok()) {
            Some(v) if v >= 10 => ApiVersion::V10,
            Some(9) => ApiVersion::V9,
            _ => ApiVersion::Legacy,
        }
    }
}

/// Asset kind of a `file://media/...` URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AssetKind {
    Photo,
    Audio,
}

/// Structural view of an inbound URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UriShape {
    /// `datashare:///media/<segments...>`; segments exclude the media root
    Media(Vec<String>),
    /// `file://media/{Photo,Audio}/<id>/...`
    Asset(AssetKind, Option<String>),
    /// Anything else
    Foreign,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedUri {
    pub(crate) shape: UriShape,
    pub(crate) query: Vec<(String, String)>,
}

pub(crate) fn is_row_id(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

pub(crate) fn parse(uri: &str) -> ParsedUri {
    let Ok(url) = Url::parse(uri) else {
        return ParsedUri {
            shape: UriShape::Foreign,
            query: Vec::new(),
        };
    };

    let query = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let segments: Vec<String> = url
        .path_segments()
        .map(|split| {
            split
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let shape = match (url.scheme(), url.host_str().unwrap_or("")) {
        (DATASHARE_SCHEME, "") if segments.first().map(String::as_str) == Some(MEDIA_ROOT) => {
            UriShape::Media(segments[1..].to_vec())
        }
        ("file", MEDIA_ROOT) => {
            let kind = match segments.first().map(String::as_str) {
                Some("Photo") => Some(AssetKind::Photo),
                Some("Audio") => Some(AssetKind::Audio),
                _ => None,
            };
            match kind {
                Some(kind) => {
                    let id = segments.get(1).filter(|s| is_row_id(s)).cloned();
                    UriShape::Asset(kind, id)
                }
                None => UriShape::Foreign,
            }
        }
        _ => UriShape::Foreign,
    };

    ParsedUri { shape, query }
}
