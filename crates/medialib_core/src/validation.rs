//! Asset validation run before any write reaches the database.

use crate::MediaType;
use medialib_error::{ValidationError, ValidationErrorKind};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

const DISPLAY_NAME_MAX: usize = 255;

static FORBIDDEN_NAME_CHARS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]"#).ok());

/// Reject empty, hidden, over-long or forbidden-character display names.
///
/// # Example
///
/// ```
/// use medialib_core::check_display_name;
///
/// assert!(check_display_name("IMG_0001.jpg").is_ok());
/// assert!(check_display_name(".hidden.jpg").is_err());
/// assert!(check_display_name("a:b.jpg").is_err());
/// ```
pub fn check_display_name(name: &str) -> Result<(), ValidationError> {
    let reject = |reason: &str| {
        debug!(name, reason, "Display name rejected");
        Err(ValidationError::new(ValidationErrorKind::DisplayName(
            format!("{} ({})", name, reason),
        )))
    };

    if name.trim().is_empty() {
        return reject("empty");
    }
    if name.len() > DISPLAY_NAME_MAX {
        return reject("too long");
    }
    if name.starts_with('.') {
        return reject("hidden");
    }
    let forbidden = match FORBIDDEN_NAME_CHARS.as_ref() {
        Some(re) => re.is_match(name),
        None => name.chars().any(|c| r#"\/:*?"<>|"#.contains(c)),
    };
    if forbidden {
        return reject("forbidden character");
    }
    Ok(())
}

/// Relative paths look like `Pictures/Camera/`: no leading slash, trailing
/// slash, no empty or parent segments.
pub fn check_relative_path(path: &str) -> Result<(), ValidationError> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || !path.ends_with('/')
        || path
            .trim_end_matches('/')
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if invalid {
        debug!(path, "Relative path rejected");
        return Err(ValidationError::new(ValidationErrorKind::RelativePath(
            path.to_string(),
        )));
    }
    Ok(())
}

/// Extension of a display name, without the dot.
pub fn extension_of(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

/// The display name's extension must belong to the declared media type.
pub fn check_media_type_matches_extension(
    name: &str,
    media_type: MediaType,
) -> Result<(), ValidationError> {
    let implied = extension_of(name)
        .map(MediaType::from_extension)
        .unwrap_or(MediaType::File);
    if implied != media_type {
        debug!(name, declared = %media_type, implied = %implied, "Media type mismatch");
        return Err(ValidationError::new(
            ValidationErrorKind::MediaTypeMismatch(format!(
                "{} is {}, declared {}",
                name, implied, media_type
            )),
        ));
    }
    Ok(())
}
