//! Request router behind the URI protocol.
//!
//! Every entry point returns plain integers (row id, row count or a negative
//! errno) or a result set; errors are converted at this boundary and never
//! cross it as Rust errors.

use chrono::Utc;
use medialib_capture::CaptureManager;
use medialib_command::{CommandResolver, MediaLibraryCommand, OperationObject, OperationType, table};
use medialib_core::{
    MediaType, RdbPredicates, ResultSet, ValuesBucket, check_display_name,
    check_media_type_matches_extension, check_relative_path, columns,
};
use medialib_error::{
    MediaLibraryResult, StateError, StateErrorKind, ValidationError, ValidationErrorKind, errno,
};
use medialib_interface::Database;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Routes insert, update, delete and query requests to the relational store
/// or the capture pipeline.
#[derive(Clone)]
pub struct MediaLibraryDataManager {
    resolver: CommandResolver,
    db: Arc<dyn Database>,
    capture: Arc<CaptureManager>,
}

impl std::fmt::Debug for MediaLibraryDataManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaLibraryDataManager")
            .field("resolver", &self.resolver)
            .field("capture", &self.capture)
            .finish()
    }
}

fn to_errno(result: MediaLibraryResult<i64>) -> i32 {
    match result {
        Ok(value) => i32::try_from(value).unwrap_or(errno::E_FAIL),
        Err(e) => {
            warn!(errno = e.errno(), error = %e, "Request failed");
            e.errno()
        }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl MediaLibraryDataManager {
    /// Router over the given resolver, store and capture pipeline.
    pub fn new(
        resolver: CommandResolver,
        db: Arc<dyn Database>,
        capture: Arc<CaptureManager>,
    ) -> Self {
        Self {
            resolver,
            db,
            capture,
        }
    }

    /// Parse `uri` and apply caller predicates within the URI's row id.
    fn command(
        &self,
        uri: &str,
        values: Option<&ValuesBucket>,
        predicates: Option<&RdbPredicates>,
    ) -> MediaLibraryCommand {
        let mut cmd = match values {
            Some(values) => self.resolver.parse_with_values(uri, values.clone()),
            None => self.resolver.parse(uri),
        };
        if let Some(predicates) = predicates.filter(|p| !p.is_empty()) {
            let mut merged = predicates.clone();
            if let Some(id) = cmd.file_id().map(str::to_string) {
                merged.restrict_to(columns::FILE_ID, id);
            }
            cmd.set_predicates(merged);
        }
        cmd
    }

    /// Insert a row. Returns the new row id or a negative errno.
    #[instrument(skip(self, values), fields(columns = values.len()))]
    pub fn insert(&self, uri: &str, values: &ValuesBucket) -> i32 {
        let mut cmd = self.command(uri, Some(values), None);
        if cmd.object() == OperationObject::PahMultistagesCapture {
            self.capture.handle_multi_stages_operation(&cmd, &[]);
            return errno::E_OK;
        }
        let object = cmd.object();
        if (object.is_photo() || object.is_audio()) && cmd.op_type() == OperationType::Create {
            return to_errno(self.create_asset(&mut cmd));
        }
        to_errno(self.generic_insert(&mut cmd))
    }

    fn generic_insert(&self, cmd: &mut MediaLibraryCommand) -> MediaLibraryResult<i64> {
        let table = self.resolver.table_name(cmd)?.to_string();
        self.db.insert(&table, cmd.values())
    }

    fn create_asset(&self, cmd: &mut MediaLibraryCommand) -> MediaLibraryResult<i64> {
        let table = self.resolver.table_name(cmd)?.to_string();
        let mut values = cmd.values().clone();

        let name = values
            .get_string(columns::DISPLAY_NAME)
            .or_else(|| values.get_string(columns::MEDIA_NAME))
            .map(str::to_string)
            .ok_or_else(|| {
                ValidationError::new(ValidationErrorKind::MissingValue(
                    columns::DISPLAY_NAME.to_string(),
                ))
            })?;
        check_display_name(&name)?;

        let media_type = match values.get_int(columns::MEDIA_TYPE) {
            Some(raw) => MediaType::from_i32(raw).ok_or_else(|| {
                ValidationError::new(ValidationErrorKind::MissingValue(format!(
                    "{} = {}",
                    columns::MEDIA_TYPE,
                    raw
                )))
            })?,
            None if cmd.object().is_audio() => MediaType::Audio,
            None => MediaType::Image,
        };
        check_media_type_matches_extension(&name, media_type)?;
        if let Some(path) = values.get_string(columns::RELATIVE_PATH) {
            check_relative_path(path)?;
        }

        let now = now_millis();
        values.remove(columns::MEDIA_NAME);
        values
            .put_string(columns::DISPLAY_NAME, name)
            .put_int(columns::MEDIA_TYPE, media_type.as_i32())
            .put_long(columns::DATE_ADDED, now)
            .put_long(columns::TIME_PENDING, now);
        let id = self.db.insert(&table, &values)?;
        debug!(table, id, "Created asset");
        Ok(id)
    }

    /// Update the matched rows. Returns the changed row count or a negative errno.
    #[instrument(skip(self, values, predicates), fields(columns = values.len()))]
    pub fn update(&self, uri: &str, values: &ValuesBucket, predicates: &RdbPredicates) -> i32 {
        let mut cmd = self.command(uri, Some(values), Some(predicates));
        if cmd.object() == OperationObject::PahMultistagesCapture {
            self.capture.handle_multi_stages_operation(&cmd, &[]);
            return errno::E_OK;
        }
        to_errno(self.route_update(&mut cmd).map(|n| n as i64))
    }

    fn route_update(&self, cmd: &mut MediaLibraryCommand) -> MediaLibraryResult<usize> {
        self.resolver.table_name(cmd)?;
        let object = cmd.object();
        if (object.is_photo() || object.is_audio()) && cmd.op_type() != OperationType::UpdatePending {
            self.check_not_pending(cmd)?;
        }

        match cmd.op_type() {
            OperationType::TrashPhoto => self.set_trashed(cmd, true),
            OperationType::AlbumRecoverAssets => self.set_trashed(cmd, false),
            _ => self.db.update(cmd.values(), cmd.predicates()),
        }
    }

    /// Refuse writes to a single asset that is still open for write.
    fn check_not_pending(&self, cmd: &MediaLibraryCommand) -> MediaLibraryResult<()> {
        let Some(file_id) = cmd.file_id() else {
            return Ok(());
        };
        let mut predicates = RdbPredicates::new(cmd.predicates().table());
        predicates.equal_to(columns::FILE_ID, file_id);
        let rows = self
            .db
            .query(&predicates, &[columns::TIME_PENDING.to_string()])?;
        let pending = rows
            .first()
            .and_then(|row| row.get_long(columns::TIME_PENDING))
            .is_some_and(|t| t != 0);
        if pending {
            return Err(StateError::new(StateErrorKind::Pending(file_id.to_string())).into());
        }
        Ok(())
    }

    /// Trash or recover photos, keeping the deferred pipeline in step.
    fn set_trashed(&self, cmd: &MediaLibraryCommand, trashed: bool) -> MediaLibraryResult<usize> {
        let mut predicates = cmd.predicates().clone();
        predicates.set_table(table::PHOTOS_TABLE);
        let photo_ids = self.photo_ids(&predicates)?;

        let mut values = cmd.values().clone();
        values.put_long(columns::DATE_TRASHED, if trashed { now_millis() } else { 0 });
        let changed = self.db.update(&values, &predicates)?;

        for photo_id in photo_ids {
            if trashed {
                self.capture.remove_image(&photo_id, true);
            } else {
                self.capture.restore_image(&photo_id);
            }
        }
        Ok(changed)
    }

    /// Photo ids of matched rows that carry one.
    fn photo_ids(&self, predicates: &RdbPredicates) -> MediaLibraryResult<Vec<String>> {
        let rows = self.db.query(predicates, &[columns::PHOTO_ID.to_string()])?;
        Ok(rows
            .rows()
            .iter()
            .filter_map(|row| row.get_string(columns::PHOTO_ID))
            .filter(|photo_id| !photo_id.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Delete the matched rows. Returns the removed row count or a negative errno.
    #[instrument(skip(self, predicates))]
    pub fn delete(&self, uri: &str, predicates: &RdbPredicates) -> i32 {
        let mut cmd = self.command(uri, None, Some(predicates));
        to_errno(self.route_delete(&mut cmd).map(|n| n as i64))
    }

    fn route_delete(&self, cmd: &mut MediaLibraryCommand) -> MediaLibraryResult<usize> {
        let table = self.resolver.table_name(cmd)?.to_string();
        if !cmd.object().is_photo() {
            return self.db.delete(cmd.predicates());
        }

        let photo_ids = self.photo_ids(cmd.predicates())?;
        let removed = self.db.delete(cmd.predicates())?;
        // Rows are gone, so reconciliation would never see them again.
        for photo_id in photo_ids {
            self.capture.remove_image(&photo_id, false);
        }
        debug!(table, removed, "Deleted photos");
        Ok(removed)
    }

    /// Query the matched rows, projected onto `columns`.
    #[instrument(skip(self, columns, predicates))]
    pub fn query(
        &self,
        uri: &str,
        columns: &[String],
        predicates: &RdbPredicates,
    ) -> Result<ResultSet, i32> {
        let mut cmd = self.command(uri, None, Some(predicates));
        if cmd.object() == OperationObject::PahMultistagesCapture {
            return Ok(self.capture.handle_multi_stages_operation(&cmd, columns));
        }
        self.route_query(&mut cmd, columns).map_err(|e| {
            warn!(errno = e.errno(), error = %e, "Query failed");
            e.errno()
        })
    }

    fn route_query(
        &self,
        cmd: &mut MediaLibraryCommand,
        columns: &[String],
    ) -> MediaLibraryResult<ResultSet> {
        self.resolver.table_name(cmd)?;
        self.db.query(cmd.predicates(), columns)
    }
}
