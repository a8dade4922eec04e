//! Tests for request routing through the data manager.

use medialib::{
    Database, DeferredProcType, DeferredProcessingSession, DeliveryMode, ImageCodec, MediaLibraryConfig,
    MediaLibraryContext, MediaLibraryDataManager, MemoryDatabase, Picture, PictureTier,
    PhotoQuality, ProcessedImage, ProcessingEvent, RdbPredicates, StorageError, ValuesBucket,
    columns, errno,
};
use parking_lot::Mutex;
use std::sync::Arc;

const CREATE_PHOTO: &str = "datashare:///media/phaccess_photo_operation/create";

#[derive(Default)]
struct RecordingSession {
    calls: Mutex<Vec<String>>,
}

impl RecordingSession {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl DeferredProcessingSession for RecordingSession {
    fn begin_synchronize(&self) {
        self.calls.lock().push("begin".to_string());
    }

    fn end_synchronize(&self) {
        self.calls.lock().push("end".to_string());
    }

    fn add_image(&self, photo_id: &str, _proc_type: DeferredProcType, discardable: bool) {
        self.calls
            .lock()
            .push(format!("add {} {}", photo_id, discardable));
    }

    fn process_image(&self, _bundle: &str, photo_id: &str) {
        self.calls.lock().push(format!("process {}", photo_id));
    }

    fn cancel_process_image(&self, photo_id: &str) -> bool {
        self.calls.lock().push(format!("cancel {}", photo_id));
        true
    }

    fn remove_image(&self, photo_id: &str, restorable: bool) {
        self.calls
            .lock()
            .push(format!("remove {} {}", photo_id, restorable));
    }

    fn restore_image(&self, photo_id: &str) {
        self.calls.lock().push(format!("restore {}", photo_id));
    }
}

#[derive(Default)]
struct NullCodec;

impl ImageCodec for NullCodec {
    fn save_picture(
        &self,
        _image_id: &str,
        _picture: &Picture,
        _tier: PictureTier,
        _is_edited: bool,
    ) -> Result<(), StorageError> {
        Ok(())
    }

    fn write_gps(&self, _path: &str, _latitude: f64, _longitude: f64) -> Result<(), StorageError> {
        Ok(())
    }
}

struct Fixture {
    db: MemoryDatabase,
    session: Arc<RecordingSession>,
    context: MediaLibraryContext,
}

impl Fixture {
    fn manager(&self) -> &MediaLibraryDataManager {
        self.context.data_manager()
    }
}

fn fixture() -> Fixture {
    let db = MemoryDatabase::new();
    let session = Arc::new(RecordingSession::default());
    let context = MediaLibraryContext::new(
        MediaLibraryConfig::default(),
        Arc::new(db.clone()),
        session.clone(),
        Arc::new(NullCodec),
    );
    Fixture {
        db,
        session,
        context,
    }
}

fn photo(name: &str) -> ValuesBucket {
    let mut values = ValuesBucket::new();
    values.put_string(columns::MEDIA_NAME, name).put_int(columns::MEDIA_TYPE, 1);
    values
}

/// Insert a low-quality capture row that is no longer pending.
fn capture_row(f: &Fixture, file_id: i64, photo_id: &str) {
    let mut values = ValuesBucket::new();
    values
        .put_long(columns::FILE_ID, file_id)
        .put_string(columns::PHOTO_ID, photo_id)
        .put_int(columns::PHOTO_QUALITY, PhotoQuality::Low.as_i32())
        .put_int(columns::MEDIA_TYPE, 1)
        .put_long(columns::TIME_PENDING, 0);
    f.db.insert("Photos", &values).unwrap();
}

#[test]
fn test_create_photo_returns_row_id() {
    let f = fixture();
    let id = f.manager().insert(CREATE_PHOTO, &photo("a.jpg"));
    assert!(id > 0);

    let row = f.db.row("Photos", i64::from(id)).unwrap();
    assert_eq!(row.get_string(columns::DISPLAY_NAME), Some("a.jpg"));
    assert!(!row.contains(columns::MEDIA_NAME));
    assert!(row.get_long(columns::DATE_ADDED).unwrap() > 0);
    assert!(row.get_long(columns::TIME_PENDING).unwrap() > 0);

    let second = f.manager().insert(CREATE_PHOTO, &photo("b.jpg"));
    assert!(second > id);
}

#[test]
fn test_unknown_object_is_invalid_uri() {
    let f = fixture();
    let code = f
        .manager()
        .insert("datashare:///media/not_a_thing/create", &photo("a.jpg"));
    assert_eq!(code, errno::E_INVALID_URI);

    let result = f.manager().query(
        "https://example.com/elsewhere",
        &[],
        &RdbPredicates::default(),
    );
    assert_eq!(result.unwrap_err(), errno::E_INVALID_URI);
}

#[test]
fn test_create_validation_errnos() {
    let f = fixture();
    assert_eq!(
        f.manager().insert(CREATE_PHOTO, &photo(".hidden.jpg")),
        errno::E_INVALID_DISPLAY_NAME
    );
    assert_eq!(
        f.manager().insert(CREATE_PHOTO, &photo("song.mp3")),
        errno::E_CHECK_MEDIATYPE_MATCH_EXTENSION_FAIL
    );

    let mut values = photo("a.jpg");
    values.put_string(columns::RELATIVE_PATH, "/abs/");
    assert_eq!(f.manager().insert(CREATE_PHOTO, &values), errno::E_INVALID_PATH);

    let mut values = ValuesBucket::new();
    values.put_int(columns::MEDIA_TYPE, 1);
    assert_eq!(f.manager().insert(CREATE_PHOTO, &values), errno::E_INVALID_VALUES);

    assert_eq!(f.db.row_count("Photos"), 0);
}

#[test]
fn test_pending_asset_refuses_updates_until_released() {
    let f = fixture();
    let id = f.manager().insert(CREATE_PHOTO, &photo("a.jpg"));
    let uri = format!("datashare:///media/phaccess_photo_operation/{}", id);

    let mut title = ValuesBucket::new();
    title.put_string(columns::OWNER_PACKAGE, "com.example.gallery");
    assert_eq!(
        f.manager().update(&uri, &title, &RdbPredicates::default()),
        errno::E_IS_PENDING
    );

    let mut release = ValuesBucket::new();
    release.put_long(columns::TIME_PENDING, 0);
    let pending_uri = format!("{}?operation=update_pending", uri);
    assert_eq!(
        f.manager().update(&pending_uri, &release, &RdbPredicates::default()),
        1
    );

    assert_eq!(f.manager().update(&uri, &title, &RdbPredicates::default()), 1);
    let row = f.db.row("Photos", i64::from(id)).unwrap();
    assert_eq!(row.get_string(columns::OWNER_PACKAGE), Some("com.example.gallery"));
}

#[test]
fn test_caller_predicates_are_combined_with_uri_id() {
    let f = fixture();
    capture_row(&f, 1, "P1");
    capture_row(&f, 2, "P2");

    let mut predicates = RdbPredicates::default();
    predicates.equal_to(columns::PHOTO_QUALITY, PhotoQuality::Low.as_i32());
    let mut values = ValuesBucket::new();
    values.put_string(columns::OWNER_PACKAGE, "only one");

    let changed = f.manager().update(
        "datashare:///media/phaccess_photo_operation/2",
        &values,
        &predicates,
    );
    assert_eq!(changed, 1);
    assert!(f.db.row("Photos", 1).unwrap().get_string(columns::OWNER_PACKAGE).is_none());
}

#[test]
fn test_caller_or_predicate_stays_within_uri_row() {
    let f = fixture();
    capture_row(&f, 1, "P1");
    capture_row(&f, 2, "P2");
    capture_row(&f, 3, "P3");

    let mut predicates = RdbPredicates::default();
    predicates
        .equal_to(columns::FILE_ID, 2)
        .or()
        .equal_to(columns::MEDIA_TYPE, 1);
    let mut values = ValuesBucket::new();
    values.put_string(columns::DISPLAY_NAME, "renamed.jpg");

    let changed = f.manager().update(
        "datashare:///media/phaccess_photo_operation/1",
        &values,
        &predicates,
    );
    assert_eq!(changed, 1);
    let renamed: Vec<i64> = (1..=3)
        .filter(|id| {
            f.db.row("Photos", *id)
                .and_then(|row| row.get_string(columns::DISPLAY_NAME).map(str::to_string))
                .is_some()
        })
        .collect();
    assert_eq!(renamed, vec![1]);

    let removed = f
        .manager()
        .delete("datashare:///media/phaccess_photo_operation/3", &predicates);
    assert_eq!(removed, 1);
    assert_eq!(f.db.row_count("Photos"), 2);
    assert!(f.db.row("Photos", 3).is_none());
}

#[test]
fn test_trash_and_recover_follow_the_pipeline() {
    let f = fixture();
    capture_row(&f, 5, "P5");
    f.context
        .capture()
        .add_image(5, "P5", DeferredProcType::Background);

    let trash = "datashare:///media/phaccess_photo_operation/5?operation=trash";
    assert_eq!(
        f.manager()
            .update(trash, &ValuesBucket::new(), &RdbPredicates::default()),
        1
    );
    assert!(f.db.row("Photos", 5).unwrap().get_long(columns::DATE_TRASHED).unwrap() > 0);
    assert!(!f.context.capture().tracker().is_photo_in_process("P5"));
    assert!(f.session.calls().contains(&"remove P5 true".to_string()));

    let recover = "datashare:///media/phaccess_photo_operation/5?operation=recover_photos";
    assert_eq!(
        f.manager()
            .update(recover, &ValuesBucket::new(), &RdbPredicates::default()),
        1
    );
    assert_eq!(
        f.db.row("Photos", 5).unwrap().get_long(columns::DATE_TRASHED),
        Some(0)
    );
    assert!(f.context.capture().tracker().is_photo_in_process("P5"));
    assert!(f.session.calls().contains(&"restore P5".to_string()));
}

#[test]
fn test_delete_photo_drops_it_from_the_pipeline() {
    let f = fixture();
    capture_row(&f, 7, "P7");
    f.context
        .capture()
        .add_image(7, "P7", DeferredProcType::Background);

    let removed = f.manager().delete(
        "datashare:///media/phaccess_photo_operation/7",
        &RdbPredicates::default(),
    );
    assert_eq!(removed, 1);
    assert_eq!(f.db.row_count("Photos"), 0);
    assert!(!f.context.capture().tracker().is_photo_in_process("P7"));
    assert!(f.session.calls().contains(&"remove P7 false".to_string()));
}

#[test]
fn test_deleted_photo_leaves_nothing_for_reconciliation() {
    let f = fixture();
    let mut values = ValuesBucket::new();
    values
        .put_long(columns::FILE_ID, 7)
        .put_string(columns::PHOTO_ID, "F")
        .put_int(columns::PHOTO_QUALITY, PhotoQuality::Full.as_i32())
        .put_int(columns::MEDIA_TYPE, 1)
        .put_long(columns::TIME_PENDING, 0);
    f.db.insert("Photos", &values).unwrap();

    let removed = f.manager().delete(
        "datashare:///media/phaccess_photo_operation/7",
        &RdbPredicates::default(),
    );
    assert_eq!(removed, 1);
    assert_eq!(f.context.capture().pending_deletions(), 0);

    f.context.capture().sync_with_deferred_proc_session_internal();
    assert_eq!(f.context.capture().pending_deletions(), 0);
    assert_eq!(f.session.calls(), vec!["remove F false".to_string()]);
}

#[test]
fn test_query_projects_matching_rows() {
    let f = fixture();
    capture_row(&f, 1, "P1");
    capture_row(&f, 2, "P2");

    let result = f
        .manager()
        .query(
            "datashare:///media/phaccess_photo_operation/2",
            &[columns::PHOTO_ID.to_string()],
            &RdbPredicates::default(),
        )
        .unwrap();
    assert_eq!(result.row_count(), 1);
    let row = result.first().unwrap();
    assert_eq!(row.get_string(columns::PHOTO_ID), Some("P2"));
    assert!(!row.contains(columns::FILE_ID));
}

#[test]
fn test_multi_stage_requests_route_to_capture() {
    let f = fixture();
    capture_row(&f, 9, "P9");

    let mut values = ValuesBucket::new();
    values
        .put_int(columns::FILE_ID, 9)
        .put_string(columns::PHOTO_ID, "P9")
        .put_int(columns::PHOTO_QUALITY, PhotoQuality::Low.as_i32())
        .put_int(columns::DEFERRED_PROC_TYPE, DeferredProcType::Background.as_i32());
    let code = f.manager().insert(
        "datashare:///media/phaccess_multistages_capture_operation/9?operation=add_image",
        &values,
    );
    assert_eq!(code, errno::E_OK);
    assert!(f.context.capture().tracker().is_photo_in_process("P9"));

    let args = ["9".to_string(), DeliveryMode::HighQuality.as_i32().to_string()];
    let result = f
        .manager()
        .query(
            "datashare:///media/phaccess_multistages_capture_operation/process_image",
            &args,
            &RdbPredicates::default(),
        )
        .unwrap();
    assert!(result.is_empty());
    assert!(f.session.calls().contains(&"process P9".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_context_start_and_shutdown() {
    // Another test may already own the global subscriber.
    let _ = medialib::init_telemetry("debug");
    let f = fixture();
    capture_row(&f, 3, "P3");

    let tasks = f.context.start();
    let events = tasks.events();
    events
        .send(ProcessingEvent::ImageDone(ProcessedImage::new(
            "P3", None, false,
        )))
        .await
        .unwrap();
    drop(events);
    tasks.shutdown().await;

    // Start-up reconciliation registered the row before the completion arrived.
    assert!(f.session.calls().starts_with(&[
        "begin".to_string(),
        "add P3 false".to_string(),
        "end".to_string(),
    ]));
}
