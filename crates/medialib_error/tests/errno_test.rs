//! Tests for errno mapping across error areas.

use medialib_error::{
    CommandError, CommandErrorKind, ConfigError, DatabaseError, DatabaseErrorKind,
    MediaLibraryError, StateError, StateErrorKind, StorageError, StorageErrorKind,
    ValidationError, ValidationErrorKind, errno,
};

#[test]
fn test_database_errors_collapse_to_db_code() {
    for kind in [
        DatabaseErrorKind::Query("q".into()),
        DatabaseErrorKind::Update("u".into()),
        DatabaseErrorKind::Transaction("t".into()),
    ] {
        let err: MediaLibraryError = DatabaseError::new(kind).into();
        assert_eq!(err.errno(), errno::E_HAS_DB_ERROR);
    }
}

#[test]
fn test_validation_errors_have_distinct_codes() {
    let name: MediaLibraryError =
        ValidationError::new(ValidationErrorKind::DisplayName(".a".into())).into();
    let path: MediaLibraryError =
        ValidationError::new(ValidationErrorKind::RelativePath("/x".into())).into();
    let kind: MediaLibraryError =
        ValidationError::new(ValidationErrorKind::MediaTypeMismatch("a.mp3".into())).into();

    assert_eq!(name.errno(), errno::E_INVALID_DISPLAY_NAME);
    assert_eq!(path.errno(), errno::E_INVALID_PATH);
    assert_eq!(kind.errno(), errno::E_CHECK_MEDIATYPE_MATCH_EXTENSION_FAIL);
    assert_ne!(name.errno(), path.errno());
    assert_ne!(path.errno(), kind.errno());
}

#[test]
fn test_command_and_state_codes() {
    let uri: MediaLibraryError =
        CommandError::new(CommandErrorKind::UnknownTable("x".into())).into();
    let id: MediaLibraryError =
        CommandError::new(CommandErrorKind::InvalidFileId("abc".into())).into();
    let pending: MediaLibraryError = StateError::new(StateErrorKind::Pending("1".into())).into();

    assert_eq!(uri.errno(), errno::E_INVALID_URI);
    assert_eq!(id.errno(), errno::E_INVALID_FILEID);
    assert_eq!(pending.errno(), errno::E_IS_PENDING);
}

#[test]
fn test_every_code_is_negative() {
    let errors: Vec<MediaLibraryError> = vec![
        StorageError::new(StorageErrorKind::Encode("x".into())).into(),
        ConfigError::new("bad").into(),
        StateError::new(StateErrorKind::NotInProcess("p".into())).into(),
    ];
    for err in errors {
        assert!(err.errno() < 0, "{} should map to a negative code", err);
    }
}

#[test]
fn test_error_records_caller_location() {
    let err = ConfigError::new("missing");
    assert!(err.file.ends_with("errno_test.rs"));
    assert!(err.line > 0);
}
