//! Tests for asset validation.

use medialib_core::{
    MediaType, check_display_name, check_media_type_matches_extension, check_relative_path,
    extension_of,
};
use medialib_error::{MediaLibraryError, errno};

#[test]
fn test_display_name_rules() {
    assert!(check_display_name("a.jpg").is_ok());
    assert!(check_display_name("holiday photo (1).heic").is_ok());

    for bad in ["", "   ", ".a.jpg", "a/b.jpg", "a\\b.jpg", "what?.jpg", "a|b.png"] {
        let err: MediaLibraryError = check_display_name(bad).unwrap_err().into();
        assert_eq!(err.errno(), errno::E_INVALID_DISPLAY_NAME, "{:?}", bad);
    }

    let long = format!("{}.jpg", "x".repeat(260));
    assert!(check_display_name(&long).is_err());
}

#[test]
fn test_relative_path_rules() {
    assert!(check_relative_path("Pictures/").is_ok());
    assert!(check_relative_path("Pictures/Camera/").is_ok());

    for bad in ["", "/Pictures/", "Pictures", "Pictures//Camera/", "Pictures/../"] {
        let err: MediaLibraryError = check_relative_path(bad).unwrap_err().into();
        assert_eq!(err.errno(), errno::E_INVALID_PATH, "{:?}", bad);
    }
}

#[test]
fn test_media_type_must_match_extension() {
    assert!(check_media_type_matches_extension("a.jpg", MediaType::Image).is_ok());
    assert!(check_media_type_matches_extension("clip.MP4", MediaType::Video).is_ok());
    assert!(check_media_type_matches_extension("song.flac", MediaType::Audio).is_ok());

    let err: MediaLibraryError = check_media_type_matches_extension("a.mp3", MediaType::Image)
        .unwrap_err()
        .into();
    assert_eq!(err.errno(), errno::E_CHECK_MEDIATYPE_MATCH_EXTENSION_FAIL);
}

#[test]
fn test_extension_of() {
    assert_eq!(extension_of("a.jpg"), Some("jpg"));
    assert_eq!(extension_of("archive.tar.gz"), Some("gz"));
    assert_eq!(extension_of("noext"), None);
    assert_eq!(extension_of(".jpg"), None);
    assert_eq!(extension_of("trailing."), None);
}
