//! Multi-stage photo capture manager.
//!
//! A camera capture first lands as a low-quality row. The deferred processing
//! service later produces the final image, which replaces the low-quality
//! file and flips the row to full quality. Callers may ask for the final
//! image early (`process_image`) and withdraw the ask again
//! (`cancel_process_request`); the manager forwards only the first ask and
//! the last withdrawal.

use crate::dfx::{DEFAULT_REPORT_INTERVAL, MultiStagesCaptureDfx, TriggerType};
use crate::tracker::{RequestTaskTracker, RequestType};
use medialib_cache::{PictureCache, PicturePair};
use medialib_command::{MediaLibraryCommand, OperationType, SAVE_LOW_QUALITY_PICTURE, query_key, table};
use medialib_core::{
    DeferredProcType, DeliveryMode, DirtyType, MediaType, Picture, PictureTier, PhotoQuality,
    PhotoSubtype, RdbPredicates, ResultSet, ValuesBucket, columns,
};
use medialib_interface::{
    Database, DeferredProcessingSession, ImageCodec, ProcessedImage, ProcessingErrorKind,
    ProcessingEvent, UpdateStatement,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Bundle recorded when the caller is not known.
pub const UNKNOWN_BUNDLE: &str = "";

/// Coordinates the capture pipeline between the media tables, the picture
/// cache and the deferred processing service.
///
/// Shared as `Arc<CaptureManager>`; every method takes `&self`.
pub struct CaptureManager {
    db: Arc<dyn Database>,
    session: Arc<dyn DeferredProcessingSession>,
    codec: Arc<dyn ImageCodec>,
    cache: Arc<PictureCache>,
    tracker: RequestTaskTracker,
    dfx: MultiStagesCaptureDfx,
    deleted: Mutex<HashSet<i32>>,
}

impl std::fmt::Debug for CaptureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureManager")
            .field("tracker", &self.tracker)
            .field("cache", &self.cache)
            .field("deleted", &self.deleted.lock().len())
            .finish()
    }
}

impl CaptureManager {
    /// Create a manager with the default DFX report interval.
    pub fn new(
        db: Arc<dyn Database>,
        session: Arc<dyn DeferredProcessingSession>,
        codec: Arc<dyn ImageCodec>,
        cache: Arc<PictureCache>,
    ) -> Self {
        Self::with_report_interval(db, session, codec, cache, DEFAULT_REPORT_INTERVAL)
    }

    /// Create a manager whose DFX reporters aggregate over `report_interval`.
    pub fn with_report_interval(
        db: Arc<dyn Database>,
        session: Arc<dyn DeferredProcessingSession>,
        codec: Arc<dyn ImageCodec>,
        cache: Arc<PictureCache>,
        report_interval: Duration,
    ) -> Self {
        let dfx = MultiStagesCaptureDfx::new(db.clone(), report_interval);
        Self {
            db,
            session,
            codec,
            cache,
            tracker: RequestTaskTracker::new(),
            dfx,
            deleted: Mutex::new(HashSet::new()),
        }
    }

    /// Photos currently handed to the deferred service.
    pub fn tracker(&self) -> &RequestTaskTracker {
        &self.tracker
    }

    /// Capture telemetry.
    pub fn dfx(&self) -> &MultiStagesCaptureDfx {
        &self.dfx
    }

    /// Shared picture cache.
    pub fn cache(&self) -> &Arc<PictureCache> {
        &self.cache
    }

    /// Start-up hook: reconcile with the deferred service when asked to.
    pub fn init(self: &Arc<Self>, sync_on_start: bool) -> Option<JoinHandle<()>> {
        if !sync_on_start {
            debug!("Skipping start-up reconciliation");
            return None;
        }
        Some(self.sync_with_deferred_proc_session())
    }

    /// Dispatch a request on the multi-stage capture object.
    ///
    /// `columns` carries positional arguments: the file id (and delivery mode)
    /// for `ProcessImage`, the photo id for `CancelProcessImage`, the file id
    /// for `RemoveMscTask`. The result set is always empty.
    #[instrument(skip(self, cmd, columns), fields(op_type = ?cmd.op_type()))]
    pub fn handle_multi_stages_operation(
        &self,
        cmd: &MediaLibraryCommand,
        columns: &[String],
    ) -> ResultSet {
        match cmd.op_type() {
            OperationType::ProcessImage => {
                let file_id = columns.first().and_then(|c| c.parse::<i32>().ok());
                let mode = columns.get(1).and_then(|c| c.parse::<i32>().ok());
                match (file_id, mode) {
                    (Some(file_id), Some(mode)) => {
                        self.process_image_for_bundle(cmd.bundle_name(), file_id, mode)
                    }
                    _ => error!(?columns, "Invalid process image arguments"),
                }
            }
            OperationType::AddImage => self.add_image_from_command(cmd),
            OperationType::SetLocation => self.update_location(cmd.values()),
            OperationType::CancelProcessImage => match columns.first() {
                Some(photo_id) => {
                    info!(photo_id = %photo_id, "Cancel process request");
                    self.cancel_process_request(photo_id);
                }
                None => error!("Missing photo id"),
            },
            OperationType::RemoveMscTask => {
                match columns.first().and_then(|c| c.parse::<i32>().ok()) {
                    Some(file_id) => self.cancel_request_and_remove_image(file_id),
                    None => error!(?columns, "Invalid file id"),
                }
            }
            OperationType::AddLowQualityImage => self.save_low_quality_image_info(cmd),
            other => warn!(op_type = ?other, "Unsupported multi-stage operation"),
        }
        ResultSet::default()
    }

    /// Register a freshly captured low-quality photo.
    #[instrument(skip(self))]
    pub fn add_image(&self, file_id: i32, photo_id: &str, proc_type: DeferredProcType) {
        if photo_id.is_empty() {
            error!("Photo id is empty");
            return;
        }
        // A new capture cannot be in the trash.
        self.add_image_internal(file_id, photo_id, proc_type, false);
    }

    /// Track the photo and hand it to the deferred service.
    pub fn add_image_internal(
        &self,
        file_id: i32,
        photo_id: &str,
        proc_type: DeferredProcType,
        discardable: bool,
    ) {
        self.tracker
            .add_photo_in_progress(file_id, photo_id, discardable);
        self.session.add_image(photo_id, proc_type, discardable);
    }

    /// Persist the capture row of an `AddImage` command and register it.
    #[instrument(skip(self, cmd))]
    pub fn add_image_from_command(&self, cmd: &MediaLibraryCommand) {
        let values = cmd.values();
        let quality = values
            .get_int(columns::PHOTO_QUALITY)
            .and_then(PhotoQuality::from_i32)
            .unwrap_or(PhotoQuality::Low);
        let photo_id = values.get_string(columns::PHOTO_ID).unwrap_or_default();

        if let Err(e) = self.update_db_info(cmd, quality) {
            error!(error = ?e, photo_id, "Failed to update capture row");
        }

        if quality == PhotoQuality::Full {
            self.cache.save_picture_with_image_id(photo_id);
            self.update_picture_quality(photo_id);
            return;
        }

        let proc_type = values
            .get_int(columns::DEFERRED_PROC_TYPE)
            .map(DeferredProcType::from_i32)
            .unwrap_or(DeferredProcType::Background);
        let file_id = values
            .get_int(columns::FILE_ID)
            .or_else(|| cmd.file_id().and_then(|id| id.parse().ok()))
            .unwrap_or(0);
        self.add_image(file_id, photo_id, proc_type);
        self.dfx.total_time().add_start_time(photo_id);
        self.dfx.trigger_ratio().set_trigger(TriggerType::Auto);

        if cmd.query_param(query_key::SAVE_PICTURE) == Some(SAVE_LOW_QUALITY_PICTURE) {
            debug!("Saving last low-quality picture");
            self.save_low_quality_picture(photo_id);
        }
    }

    fn update_db_info(
        &self,
        cmd: &MediaLibraryCommand,
        quality: PhotoQuality,
    ) -> medialib_error::MediaLibraryResult<usize> {
        let mut values = cmd.values().clone();
        if quality == PhotoQuality::Low {
            // Low-quality files must never reach the cloud.
            values.put_int(columns::DIRTY, DirtyType::HOLD_UPLOAD);
        }
        let mut predicates = cmd.predicates().clone();
        predicates.set_table(table::PHOTOS_TABLE);
        self.db.update(&values, &predicates)
    }

    fn save_low_quality_image_info(&self, cmd: &MediaLibraryCommand) {
        match cmd.values().get_string(columns::PHOTO_ID) {
            Some(photo_id) => {
                self.save_low_quality_picture(photo_id);
            }
            None => warn!("Low-quality save without photo id"),
        }
    }

    /// Ask for the final image on behalf of an unknown caller.
    pub fn process_image(&self, file_id: i32, delivery_mode: i32) {
        self.process_image_for_bundle(UNKNOWN_BUNDLE, file_id, delivery_mode);
    }

    /// Ask for the final image of `file_id` on behalf of `bundle`.
    ///
    /// Only the request that takes the counter from 0 to 1 reaches the
    /// deferred service, and only for modes that want processing.
    #[instrument(skip(self))]
    pub fn process_image_for_bundle(&self, bundle: &str, file_id: i32, delivery_mode: i32) {
        let photo_id = self.tracker.get_processing_photo_id(file_id);
        if photo_id.is_empty() {
            error!("No photo in process for file");
            return;
        }
        let Some(mode) = DeliveryMode::from_i32(delivery_mode) else {
            error!(photo_id, "Invalid delivery mode");
            return;
        };

        self.dfx.trigger_ratio().set_trigger(TriggerType::ThirdPart);
        self.dfx.request_policy().set_policy(bundle, mode);
        self.dfx.first_visit().report(&photo_id);

        let Some(change) = self
            .tracker
            .update_photo_in_process_request_count(&photo_id, RequestType::Request)
        else {
            warn!(photo_id, "Photo left process before the request");
            return;
        };
        info!(
            photo_id,
            %mode,
            requests = change.current,
            "Process image requested"
        );
        if change.is_first_request() && mode.wants_processing() {
            self.session.process_image(bundle, &photo_id);
        }
    }

    /// Withdraw one request for the final image.
    ///
    /// Returns `false` when the photo is untracked or other requests remain.
    /// The last withdrawal forgets the photo and returns the deferred
    /// service's answer.
    #[instrument(skip(self))]
    pub fn cancel_process_request(&self, photo_id: &str) -> bool {
        let Some(change) = self.tracker.cancel_request(photo_id) else {
            error!("Photo id is empty or not in process");
            return false;
        };
        if !change.is_last_cancel() {
            info!(
                requests = change.current,
                "Keeping request, other callers still waiting"
            );
            return false;
        }
        self.dfx.total_time().remove_start_time(photo_id);
        let accepted = self.session.cancel_process_image(photo_id);
        info!(accepted, "Cancel forwarded");
        accepted
    }

    /// Drop the photo from the pipeline.
    #[instrument(skip(self))]
    pub fn remove_image(&self, photo_id: &str, restorable: bool) {
        if !self.tracker.is_photo_in_process(photo_id) {
            // Still forwarded so the service forgets it too.
            warn!("Photo id is empty or not in process");
        }
        self.tracker.remove_photo_in_progress(photo_id, restorable);
        if !restorable {
            self.dfx.total_time().remove_start_time(photo_id);
        }
        self.session.remove_image(photo_id, restorable);
    }

    /// Bring a trashed photo back into the pipeline.
    #[instrument(skip(self))]
    pub fn restore_image(&self, photo_id: &str) {
        if photo_id.is_empty() {
            debug!("Photo id is empty");
        }
        self.tracker.update_photo_in_progress(photo_id);
        self.session.restore_image(photo_id);
    }

    /// Cancel pending requests for `file_id` and drop it for good.
    #[instrument(skip(self))]
    pub fn cancel_request_and_remove_image(&self, file_id: i32) {
        let photo_id = self.tracker.get_processing_photo_id(file_id);
        if photo_id.is_empty() {
            warn!("No photo in process for file");
            return;
        }
        info!(photo_id, "Cancelling and removing");
        self.cancel_process_request(&photo_id);
        self.remove_image(&photo_id, false);
    }

    /// Flip the row to full quality and release eligible rows for upload.
    ///
    /// Both writes run in one transaction. Failures are logged, not retried.
    #[instrument(skip(self))]
    pub fn update_picture_quality(&self, photo_id: &str) -> bool {
        let mut quality = ValuesBucket::new();
        quality.put_int(columns::PHOTO_QUALITY, PhotoQuality::Full.as_i32());
        let mut by_photo = RdbPredicates::new(table::PHOTOS_TABLE);
        by_photo.equal_to(columns::PHOTO_ID, photo_id);

        let mut dirty = ValuesBucket::new();
        dirty.put_int(columns::DIRTY, DirtyType::New.as_i32());
        let mut eligible = by_photo.clone();
        eligible
            .equal_to(columns::IS_TEMP, 0)
            .not_equal_to(columns::SUBTYPE, PhotoSubtype::MovingPhoto.as_i32());

        let batch = [
            UpdateStatement::new(quality, by_photo),
            UpdateStatement::new(dirty, eligible),
        ];
        match self.db.update_batch(&batch) {
            Ok(changed) => {
                debug!(?changed, "Upgraded photo quality");
                true
            }
            Err(e) => {
                warn!(error = ?e, "Failed to upgrade photo quality");
                false
            }
        }
    }

    /// Write GPS coordinates into the file and the row.
    #[instrument(skip(self, values))]
    pub fn update_location(&self, values: &ValuesBucket) {
        let latitude = values.get_double(columns::LATITUDE).unwrap_or(0.0);
        let longitude = values.get_double(columns::LONGITUDE).unwrap_or(0.0);

        match values.get_string(columns::DATA) {
            Some(path) if !path.is_empty() => {
                if let Err(e) = self.codec.write_gps(path, latitude, longitude) {
                    error!(error = ?e, path, "Failed to write gps exif");
                }
            }
            _ => warn!("No file path, skipping exif"),
        }

        let file_id = values.get_int(columns::FILE_ID).unwrap_or(0);
        let mut predicates = RdbPredicates::new(table::PHOTOS_TABLE);
        predicates.equal_to(columns::FILE_ID, file_id);
        let mut location = ValuesBucket::new();
        location
            .put_double(columns::LATITUDE, latitude)
            .put_double(columns::LONGITUDE, longitude);
        if let Err(e) = self.db.update(&location, &predicates) {
            error!(error = ?e, file_id, "Failed to update location");
        }
    }

    /// Record a file whose row is still stored but whose photo must be
    /// removed from the deferred service at the next reconciliation.
    ///
    /// Ids whose row is gone by then are dropped.
    pub fn mark_deleted(&self, file_id: i32) {
        self.deleted.lock().insert(file_id);
    }

    /// Files marked deleted and not yet reconciled.
    pub fn pending_deletions(&self) -> usize {
        self.deleted.lock().len()
    }

    /// Reconcile with the deferred service on the blocking pool.
    pub fn sync_with_deferred_proc_session(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        info!("Scheduling deferred session reconciliation");
        tokio::task::spawn_blocking(move || manager.sync_with_deferred_proc_session_internal())
    }

    /// Re-register every pending low-quality photo with the deferred service.
    ///
    /// Files marked deleted since the last run are removed from the service
    /// instead.
    #[instrument(skip(self))]
    pub fn sync_with_deferred_proc_session_internal(&self) {
        let mut predicates = RdbPredicates::new(table::PHOTOS_TABLE);
        predicates
            .is_not_null(columns::PHOTO_ID)
            .greater_than(columns::PHOTO_QUALITY, 0)
            .equal_to(columns::MEDIA_TYPE, MediaType::Image.as_i32());
        let wanted = [
            columns::FILE_ID.to_string(),
            columns::PHOTO_ID.to_string(),
            columns::DATE_TRASHED.to_string(),
            columns::DEFERRED_PROC_TYPE.to_string(),
        ];

        // Ids marked from here on wait for the next run.
        let mut deleted = std::mem::take(&mut *self.deleted.lock());
        let rows = match self.db.query(&predicates, &wanted) {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => {
                info!(dropped = deleted.len(), "Nothing to reconcile");
                return;
            }
            Err(e) => {
                error!(error = ?e, "Reconciliation query failed");
                self.deleted.lock().extend(deleted);
                return;
            }
        };

        self.session.begin_synchronize();
        for row in rows.rows() {
            let file_id = row.get_int(columns::FILE_ID).unwrap_or(0);
            let photo_id = row.get_string(columns::PHOTO_ID).unwrap_or_default();
            if deleted.remove(&file_id) {
                info!(file_id, photo_id, "Removing deleted photo");
                self.session.remove_image(photo_id, false);
                continue;
            }
            let trashed = row.get_long(columns::DATE_TRASHED).unwrap_or(0) > 0;
            let proc_type = row
                .get_int(columns::DEFERRED_PROC_TYPE)
                .map(DeferredProcType::from_i32)
                .unwrap_or(DeferredProcType::Background);
            info!(file_id, photo_id, "Re-adding photo");
            self.add_image_internal(file_id, photo_id, proc_type, trashed);
        }
        self.session.end_synchronize();
        info!(
            rows = rows.row_count(),
            stale = deleted.len(),
            "Reconciliation finished"
        );
    }

    /// Cache a low-quality picture unless one is already cached.
    pub fn deal_low_quality_picture(&self, image_id: &str, picture: Picture, is_edited: bool) -> bool {
        let stored = self.cache.insert_if_absent(
            image_id,
            PicturePair::new(picture, is_edited),
            PictureTier::LowQuality,
        );
        debug!(image_id, stored, "Low-quality picture handed over");
        stored
    }

    /// Cache a high-quality picture, replacing any earlier one.
    pub fn deal_high_quality_picture(&self, image_id: &str, picture: Picture, is_edited: bool) {
        debug!(image_id, is_edited, "High-quality picture handed over");
        self.cache.insert_picture_data(
            image_id,
            PicturePair::new(picture, is_edited),
            PictureTier::HighQuality,
        );
    }

    /// Write the cached low-quality picture to disk.
    pub fn save_low_quality_picture(&self, image_id: &str) -> bool {
        info!(image_id, "Saving low-quality picture");
        self.cache.save_low_quality_picture(image_id)
    }

    /// Apply one completion message from the deferred service.
    ///
    /// Messages for photos no longer tracked are dropped; that membership
    /// check is what makes late completions after a removal harmless.
    #[instrument(skip(self, event), fields(photo_id = event.photo_id()))]
    pub fn handle_event(&self, event: ProcessingEvent) {
        match event {
            ProcessingEvent::ImageDone(image) => self.on_image_done(image),
            ProcessingEvent::Error { photo_id, kind } => self.on_error(&photo_id, kind),
            ProcessingEvent::StateChanged(state) => info!(%state, "Deferred session state changed"),
        }
    }

    fn on_image_done(&self, image: ProcessedImage) {
        let photo_id = image.photo_id().as_str();
        if !self.tracker.is_photo_in_process(photo_id) {
            debug!("Completion for untracked photo ignored");
            return;
        }
        if let Some(picture) = image.picture() {
            self.deal_high_quality_picture(photo_id, picture.clone(), *image.is_edited());
            self.cache.save_picture_with_image_id(photo_id);
        }
        self.update_picture_quality(photo_id);
        self.dfx.total_time().report(photo_id);
        self.dfx.result().report(photo_id, 0);
        self.tracker.remove_photo_in_progress(photo_id, false);
        info!("Photo upgraded to full quality");
    }

    fn on_error(&self, photo_id: &str, kind: ProcessingErrorKind) {
        if !self.tracker.is_photo_in_process(photo_id) {
            debug!("Error for untracked photo ignored");
            return;
        }
        self.dfx.result().report(photo_id, kind.code());
        if kind.is_retryable() {
            warn!(%kind, "Deferred processing failed, kept for reconciliation");
        } else {
            error!(%kind, "Deferred processing rejected photo");
            self.dfx.total_time().remove_start_time(photo_id);
            self.tracker.remove_photo_in_progress(photo_id, false);
        }
    }

    /// Drain completion messages on a dedicated blocking thread.
    ///
    /// The loop ends when every sender is dropped.
    pub fn spawn_event_loop(
        self: &Arc<Self>,
        mut rx: mpsc::Receiver<ProcessingEvent>,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            info!("Capture event loop started");
            while let Some(event) = rx.blocking_recv() {
                manager.handle_event(event);
            }
            info!("Capture event loop stopped");
        })
    }
}
