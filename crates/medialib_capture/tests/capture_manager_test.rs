//! Tests for the multi-stage capture manager.

use medialib_cache::{PictureCache, PictureCacheConfig};
use medialib_capture::{CaptureManager, CapturePhase};
use medialib_command::MediaLibraryCommand;
use medialib_core::{
    DeferredProcType, DeliveryMode, DirtyType, MediaType, Picture, PictureTier, PhotoQuality,
    PhotoSubtype, ValuesBucket, columns,
};
use medialib_database::{FailPoint, MemoryDatabase};
use medialib_error::StorageError;
use medialib_interface::{
    Database, DeferredProcessingSession, ImageCodec, ProcessedImage, ProcessingErrorKind,
    ProcessingEvent,
};
use parking_lot::Mutex;
use std::sync::{Arc, Barrier};
use std::thread;

#[derive(Debug, Clone, PartialEq)]
enum SessionCall {
    Begin,
    End,
    Add(String, DeferredProcType, bool),
    Process(String, String),
    Cancel(String),
    Remove(String, bool),
    Restore(String),
}

#[derive(Default)]
struct RecordingSession {
    calls: Mutex<Vec<SessionCall>>,
}

impl RecordingSession {
    fn calls(&self) -> Vec<SessionCall> {
        self.calls.lock().clone()
    }

    fn count(&self, pred: impl Fn(&SessionCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }
}

impl DeferredProcessingSession for RecordingSession {
    fn begin_synchronize(&self) {
        self.calls.lock().push(SessionCall::Begin);
    }

    fn end_synchronize(&self) {
        self.calls.lock().push(SessionCall::End);
    }

    fn add_image(&self, photo_id: &str, proc_type: DeferredProcType, discardable: bool) {
        self.calls
            .lock()
            .push(SessionCall::Add(photo_id.to_string(), proc_type, discardable));
    }

    fn process_image(&self, bundle: &str, photo_id: &str) {
        self.calls
            .lock()
            .push(SessionCall::Process(bundle.to_string(), photo_id.to_string()));
    }

    fn cancel_process_image(&self, photo_id: &str) -> bool {
        self.calls.lock().push(SessionCall::Cancel(photo_id.to_string()));
        true
    }

    fn remove_image(&self, photo_id: &str, restorable: bool) {
        self.calls
            .lock()
            .push(SessionCall::Remove(photo_id.to_string(), restorable));
    }

    fn restore_image(&self, photo_id: &str) {
        self.calls.lock().push(SessionCall::Restore(photo_id.to_string()));
    }
}

#[derive(Default)]
struct RecordingCodec {
    saved: Mutex<Vec<(String, PictureTier)>>,
    gps: Mutex<Vec<String>>,
}

impl ImageCodec for RecordingCodec {
    fn save_picture(
        &self,
        image_id: &str,
        _picture: &Picture,
        tier: PictureTier,
        _is_edited: bool,
    ) -> Result<(), StorageError> {
        self.saved.lock().push((image_id.to_string(), tier));
        Ok(())
    }

    fn write_gps(&self, path: &str, _latitude: f64, _longitude: f64) -> Result<(), StorageError> {
        self.gps.lock().push(path.to_string());
        Ok(())
    }
}

struct Fixture {
    db: MemoryDatabase,
    session: Arc<RecordingSession>,
    codec: Arc<RecordingCodec>,
    manager: Arc<CaptureManager>,
}

fn fixture() -> Fixture {
    let db = MemoryDatabase::new();
    let session = Arc::new(RecordingSession::default());
    let codec = Arc::new(RecordingCodec::default());
    let cache = Arc::new(PictureCache::new(PictureCacheConfig::default(), codec.clone()));
    let manager = Arc::new(CaptureManager::new(
        Arc::new(db.clone()),
        session.clone(),
        codec.clone(),
        cache,
    ));
    Fixture {
        db,
        session,
        codec,
        manager,
    }
}

fn insert_low_photo(db: &MemoryDatabase, file_id: i64, photo_id: &str) {
    let mut values = ValuesBucket::new();
    values
        .put_long(columns::FILE_ID, file_id)
        .put_string(columns::PHOTO_ID, photo_id)
        .put_int(columns::PHOTO_QUALITY, PhotoQuality::Low.as_i32())
        .put_int(columns::MEDIA_TYPE, MediaType::Image.as_i32())
        .put_int(columns::DIRTY, DirtyType::HOLD_UPLOAD)
        .put_int(columns::IS_TEMP, 0)
        .put_int(columns::SUBTYPE, 0)
        .put_long(columns::DATE_TRASHED, 0)
        .put_int(columns::DEFERRED_PROC_TYPE, 1);
    db.insert("Photos", &values).unwrap();
}

fn picture() -> Picture {
    Picture::new(vec![7u8; 16], 4, 4)
}

#[test]
fn test_scenario_b_add_process_cancel() {
    let f = fixture();
    f.manager.add_image(5, "P1", DeferredProcType::Offline);
    f.manager
        .process_image(5, DeliveryMode::HighQuality.as_i32());
    assert_eq!(
        f.manager.tracker().phase("P1"),
        Some(CapturePhase::ProcessingRequested { requests: 1 })
    );

    assert!(f.manager.cancel_process_request("P1"));

    assert!(!f.manager.tracker().is_photo_in_process("P1"));
    assert_eq!(f.session.count(|c| matches!(c, SessionCall::Cancel(_))), 1);
    assert_eq!(f.session.count(|c| matches!(c, SessionCall::Process(..))), 1);
}

#[test]
fn test_scenario_c_reconciliation() {
    let f = fixture();
    insert_low_photo(&f.db, 1, "keep");
    insert_low_photo(&f.db, 2, "gone");
    f.manager.mark_deleted(2);

    f.manager.sync_with_deferred_proc_session_internal();

    assert_eq!(
        f.session.calls(),
        vec![
            SessionCall::Begin,
            SessionCall::Add("keep".to_string(), DeferredProcType::Offline, false),
            SessionCall::Remove("gone".to_string(), false),
            SessionCall::End,
        ]
    );
    assert!(f.manager.tracker().is_photo_in_process("keep"));
    assert!(!f.manager.tracker().is_photo_in_process("gone"));
}

#[test]
fn test_reconciliation_without_rows_skips_bracket() {
    let f = fixture();
    f.manager.sync_with_deferred_proc_session_internal();
    assert!(f.session.calls().is_empty());

    let f = fixture();
    insert_low_photo(&f.db, 1, "P");
    f.db.fail_next(FailPoint::Query);
    f.manager.sync_with_deferred_proc_session_internal();
    assert!(f.session.calls().is_empty());
}

#[test]
fn test_reconciliation_drops_ids_of_missing_rows() {
    let f = fixture();
    insert_low_photo(&f.db, 1, "keep");
    f.manager.mark_deleted(1);
    f.manager.mark_deleted(42);
    assert_eq!(f.manager.pending_deletions(), 2);

    f.manager.sync_with_deferred_proc_session_internal();

    assert_eq!(f.manager.pending_deletions(), 0);
    assert_eq!(
        f.session.count(|c| matches!(c, SessionCall::Remove(..))),
        1
    );

    // Nothing stored at all still clears the marks.
    let f = fixture();
    f.manager.mark_deleted(3);
    f.manager.sync_with_deferred_proc_session_internal();
    assert_eq!(f.manager.pending_deletions(), 0);
}

#[test]
fn test_failed_reconciliation_keeps_marks() {
    let f = fixture();
    insert_low_photo(&f.db, 1, "P");
    f.manager.mark_deleted(1);
    f.db.fail_next(FailPoint::Query);

    f.manager.sync_with_deferred_proc_session_internal();
    assert_eq!(f.manager.pending_deletions(), 1);

    f.manager.sync_with_deferred_proc_session_internal();
    assert_eq!(f.manager.pending_deletions(), 0);
    assert_eq!(
        f.session.calls(),
        vec![
            SessionCall::Begin,
            SessionCall::Remove("P".to_string(), false),
            SessionCall::End,
        ]
    );
}

#[test]
fn test_reconciliation_marks_trashed_rows_discardable() {
    let f = fixture();
    insert_low_photo(&f.db, 1, "P");
    let mut trashed = ValuesBucket::new();
    trashed.put_long(columns::DATE_TRASHED, 1_700_000_000_000);
    let mut predicates = medialib_core::RdbPredicates::new("Photos");
    predicates.equal_to(columns::FILE_ID, 1);
    f.db.update(&trashed, &predicates).unwrap();

    f.manager.sync_with_deferred_proc_session_internal();
    assert!(f
        .session
        .calls()
        .contains(&SessionCall::Add("P".to_string(), DeferredProcType::Offline, true)));
}

#[test]
fn test_concurrent_requests_forward_once() {
    let f = fixture();
    f.manager.add_image(5, "P1", DeferredProcType::Background);

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let manager = f.manager.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                manager.process_image(5, DeliveryMode::HighQuality.as_i32());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(f.session.count(|c| matches!(c, SessionCall::Process(..))), 1);

    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let manager = f.manager.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                manager.cancel_process_request("P1")
            })
        })
        .collect();
    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|accepted| *accepted)
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(f.session.count(|c| matches!(c, SessionCall::Cancel(_))), 1);
}

#[test]
fn test_fast_mode_is_counted_but_not_forwarded() {
    let f = fixture();
    f.manager.add_image(5, "P1", DeferredProcType::Background);
    f.manager.process_image(5, DeliveryMode::Fast.as_i32());

    assert_eq!(f.session.count(|c| matches!(c, SessionCall::Process(..))), 0);
    assert_eq!(
        f.manager.tracker().phase("P1"),
        Some(CapturePhase::ProcessingRequested { requests: 1 })
    );
}

#[test]
fn test_process_unknown_file_is_ignored() {
    let f = fixture();
    f.manager.process_image(99, DeliveryMode::HighQuality.as_i32());
    assert!(f.session.calls().is_empty());
}

#[test]
fn test_cancel_untracked_returns_false() {
    let f = fixture();
    assert!(!f.manager.cancel_process_request("nope"));
    assert!(f.session.calls().is_empty());
}

#[test]
fn test_quality_upgrade_releases_eligible_rows() {
    let f = fixture();
    insert_low_photo(&f.db, 1, "plain");
    insert_low_photo(&f.db, 2, "moving");
    let mut moving = ValuesBucket::new();
    moving.put_int(columns::SUBTYPE, PhotoSubtype::MovingPhoto.as_i32());
    let mut predicates = medialib_core::RdbPredicates::new("Photos");
    predicates.equal_to(columns::FILE_ID, 2);
    f.db.update(&moving, &predicates).unwrap();

    insert_low_photo(&f.db, 3, "synced");
    let mut synced = ValuesBucket::new();
    synced.put_int(columns::DIRTY, DirtyType::Synced.as_i32());
    let mut predicates = medialib_core::RdbPredicates::new("Photos");
    predicates.equal_to(columns::FILE_ID, 3);
    f.db.update(&synced, &predicates).unwrap();

    assert!(f.manager.update_picture_quality("plain"));
    assert!(f.manager.update_picture_quality("moving"));
    assert!(f.manager.update_picture_quality("synced"));

    let plain = f.db.row("Photos", 1).unwrap();
    assert_eq!(plain.get_int(columns::PHOTO_QUALITY), Some(0));
    assert_eq!(plain.get_int(columns::DIRTY), Some(DirtyType::New.as_i32()));

    let moving = f.db.row("Photos", 2).unwrap();
    assert_eq!(moving.get_int(columns::PHOTO_QUALITY), Some(0));
    assert_eq!(moving.get_int(columns::DIRTY), Some(DirtyType::HOLD_UPLOAD));

    // Release does not depend on the previous dirty state.
    let synced = f.db.row("Photos", 3).unwrap();
    assert_eq!(synced.get_int(columns::DIRTY), Some(DirtyType::New.as_i32()));
}

#[test]
fn test_failed_upgrade_is_not_applied() {
    let f = fixture();
    insert_low_photo(&f.db, 1, "P");
    f.db.fail_next(FailPoint::Batch);

    assert!(!f.manager.update_picture_quality("P"));
    assert_eq!(f.db.row("Photos", 1).unwrap().get_int(columns::PHOTO_QUALITY), Some(1));
}

#[test]
fn test_image_done_upgrades_and_forgets() {
    let f = fixture();
    insert_low_photo(&f.db, 1, "P");
    f.manager.add_image(1, "P", DeferredProcType::Background);

    f.manager.handle_event(ProcessingEvent::ImageDone(ProcessedImage::new(
        "P",
        Some(picture()),
        false,
    )));

    assert!(!f.manager.tracker().is_photo_in_process("P"));
    assert_eq!(f.db.row("Photos", 1).unwrap().get_int(columns::PHOTO_QUALITY), Some(0));
    assert_eq!(
        f.codec.saved.lock().clone(),
        vec![("P".to_string(), PictureTier::HighQuality)]
    );
    assert_eq!(f.manager.dfx().result().results().len(), 1);
}

#[test]
fn test_completion_after_removal_is_ignored() {
    let f = fixture();
    insert_low_photo(&f.db, 1, "P");
    f.manager.add_image(1, "P", DeferredProcType::Background);
    f.manager.remove_image("P", false);

    f.manager.handle_event(ProcessingEvent::ImageDone(ProcessedImage::new("P", None, false)));

    assert_eq!(f.db.row("Photos", 1).unwrap().get_int(columns::PHOTO_QUALITY), Some(1));
    assert!(f.manager.dfx().result().results().is_empty());
}

#[test]
fn test_error_events_by_kind() {
    let f = fixture();
    f.manager.add_image(1, "busy", DeferredProcType::Background);
    f.manager.add_image(2, "bad", DeferredProcType::Background);

    f.manager.handle_event(ProcessingEvent::Error {
        photo_id: "busy".to_string(),
        kind: ProcessingErrorKind::Busy,
    });
    f.manager.handle_event(ProcessingEvent::Error {
        photo_id: "bad".to_string(),
        kind: ProcessingErrorKind::Invalid,
    });

    assert!(f.manager.tracker().is_photo_in_process("busy"));
    assert!(!f.manager.tracker().is_photo_in_process("bad"));
    assert_eq!(f.manager.dfx().result().results().len(), 2);
}

#[test]
fn test_soft_remove_and_restore() {
    let f = fixture();
    f.manager.add_image(1, "P", DeferredProcType::Background);
    f.manager.remove_image("P", true);
    assert!(!f.manager.tracker().is_photo_in_process("P"));

    f.manager.restore_image("P");
    assert!(f.manager.tracker().is_photo_in_process("P"));
    assert_eq!(
        f.session.calls()[1..],
        [
            SessionCall::Remove("P".to_string(), true),
            SessionCall::Restore("P".to_string()),
        ]
    );
}

#[test]
fn test_cancel_request_and_remove_image() {
    let f = fixture();
    f.manager.add_image(3, "P", DeferredProcType::Background);
    f.manager.process_image(3, DeliveryMode::Balance.as_i32());

    f.manager.cancel_request_and_remove_image(3);

    assert!(!f.manager.tracker().is_photo_in_process("P"));
    assert_eq!(f.manager.tracker().get_processing_photo_id(3), "");
    assert_eq!(f.session.count(|c| matches!(c, SessionCall::Cancel(_))), 1);
    assert_eq!(f.session.count(|c| matches!(c, SessionCall::Remove(..))), 1);
}

#[test]
fn test_add_image_command_low_quality() {
    let f = fixture();
    insert_low_photo(&f.db, 4, "P");
    let mut values = ValuesBucket::new();
    values
        .put_string(columns::PHOTO_ID, "P")
        .put_int(columns::PHOTO_QUALITY, PhotoQuality::Low.as_i32())
        .put_int(columns::DIRTY, 0)
        .put_int(columns::FILE_ID, 4)
        .put_int(columns::DEFERRED_PROC_TYPE, 1);
    let mut cmd = MediaLibraryCommand::with_values(
        "datashare:///media/phaccess_multistages_capture_operation/add_image?save_picture=add_lowquality_image",
        values,
    );
    cmd.predicates_mut().equal_to(columns::FILE_ID, 4);
    f.manager
        .deal_low_quality_picture("P", picture(), false);

    f.manager.handle_multi_stages_operation(&cmd, &[]);

    assert_eq!(f.db.row("Photos", 4).unwrap().get_int(columns::DIRTY), Some(-1));
    assert!(f.manager.tracker().is_photo_in_process("P"));
    assert!(f.manager.dfx().total_time().is_timing("P"));
    assert_eq!(
        f.codec.saved.lock().clone(),
        vec![("P".to_string(), PictureTier::LowQuality)]
    );
}

#[test]
fn test_add_image_command_full_quality() {
    let f = fixture();
    insert_low_photo(&f.db, 4, "P");
    f.manager.deal_high_quality_picture("P", picture(), true);
    let mut values = ValuesBucket::new();
    values
        .put_string(columns::PHOTO_ID, "P")
        .put_int(columns::PHOTO_QUALITY, PhotoQuality::Full.as_i32());
    let mut cmd = MediaLibraryCommand::with_values(
        "datashare:///media/phaccess_multistages_capture_operation/add_image",
        values,
    );
    cmd.predicates_mut().equal_to(columns::FILE_ID, 4);

    f.manager.add_image_from_command(&cmd);

    assert!(!f.manager.tracker().is_photo_in_process("P"));
    let row = f.db.row("Photos", 4).unwrap();
    assert_eq!(row.get_int(columns::PHOTO_QUALITY), Some(0));
    assert_eq!(row.get_int(columns::DIRTY), Some(DirtyType::New.as_i32()));
    assert_eq!(
        f.codec.saved.lock().clone(),
        vec![("P".to_string(), PictureTier::HighQuality)]
    );
}

#[test]
fn test_low_quality_picture_first_writer_wins() {
    let f = fixture();
    assert!(f.manager.deal_low_quality_picture("P", picture(), false));
    assert!(!f
        .manager
        .deal_low_quality_picture("P", Picture::new(vec![1u8; 4], 2, 2), false));
    let cached = f.manager.cache().get("P", PictureTier::LowQuality).unwrap();
    assert_eq!(cached.pair().picture().byte_len(), 16);
}

#[test]
fn test_update_location() {
    let f = fixture();
    insert_low_photo(&f.db, 9, "P");
    let mut values = ValuesBucket::new();
    values
        .put_int(columns::FILE_ID, 9)
        .put_string(columns::DATA, "/storage/Photo/1/a.jpg")
        .put_double(columns::LATITUDE, 31.2)
        .put_double(columns::LONGITUDE, 121.5);

    f.manager.update_location(&values);

    assert_eq!(f.codec.gps.lock().clone(), vec!["/storage/Photo/1/a.jpg".to_string()]);
    let row = f.db.row("Photos", 9).unwrap();
    assert_eq!(row.get_double(columns::LATITUDE), Some(31.2));
    assert_eq!(row.get_double(columns::LONGITUDE), Some(121.5));
}

#[test]
fn test_dispatch_by_columns() {
    let f = fixture();
    f.manager.add_image(5, "P1", DeferredProcType::Background);
    let mut cmd = MediaLibraryCommand::new(
        "datashare:///media/phaccess_multistages_capture_operation/process_image",
    );
    cmd.set_bundle_name("com.example.gallery");

    let result = f
        .manager
        .handle_multi_stages_operation(&cmd, &["5".to_string(), "1".to_string()]);

    assert!(result.is_empty());
    assert!(f.session.calls().contains(&SessionCall::Process(
        "com.example.gallery".to_string(),
        "P1".to_string()
    )));

    let cancel = MediaLibraryCommand::new(
        "datashare:///media/phaccess_multistages_capture_operation/cancel_process_image",
    );
    f.manager
        .handle_multi_stages_operation(&cancel, &["P1".to_string()]);
    assert!(!f.manager.tracker().is_photo_in_process("P1"));
}

#[tokio::test]
async fn test_event_loop_applies_messages() {
    let f = fixture();
    insert_low_photo(&f.db, 1, "P");
    f.manager.add_image(1, "P", DeferredProcType::Background);

    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let handle = f.manager.spawn_event_loop(rx);
    tx.send(ProcessingEvent::ImageDone(ProcessedImage::new("P", None, false)))
        .await
        .unwrap();
    drop(tx);
    handle.await.unwrap();

    assert!(!f.manager.tracker().is_photo_in_process("P"));
    assert_eq!(f.db.row("Photos", 1).unwrap().get_int(columns::PHOTO_QUALITY), Some(0));
}

#[tokio::test]
async fn test_init_runs_reconciliation() {
    let f = fixture();
    insert_low_photo(&f.db, 1, "P");

    let handle = f.manager.init(true).unwrap();
    handle.await.unwrap();

    assert!(f.manager.tracker().is_photo_in_process("P"));
    assert!(f.manager.init(false).is_none());
}
