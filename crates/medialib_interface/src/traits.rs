//! Traits for the external collaborators of the media library.

use medialib_core::{DeferredProcType, Picture, PictureTier, RdbPredicates, ResultSet, ValuesBucket};
use medialib_error::{MediaLibraryResult, StorageError};

/// One statement of an atomic update batch.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Columns to write
    pub values: ValuesBucket,
    /// Rows to write, including the target table
    pub predicates: RdbPredicates,
}

impl UpdateStatement {
    /// Pair values with the rows they apply to.
    pub fn new(values: ValuesBucket, predicates: RdbPredicates) -> Self {
        Self { values, predicates }
    }
}

/// Relational store executing resolved commands.
///
/// Calls are synchronous and block the calling thread. Implementations must be
/// safe to share across request threads.
pub trait Database: Send + Sync {
    /// Insert a row into `table`, returning its row id.
    fn insert(&self, table: &str, values: &ValuesBucket) -> MediaLibraryResult<i64>;

    /// Update the matched rows, returning how many changed.
    fn update(&self, values: &ValuesBucket, predicates: &RdbPredicates) -> MediaLibraryResult<usize>;

    /// Delete the matched rows, returning how many were removed.
    fn delete(&self, predicates: &RdbPredicates) -> MediaLibraryResult<usize>;

    /// Query the matched rows, projected onto `columns` (all when empty).
    fn query(&self, predicates: &RdbPredicates, columns: &[String]) -> MediaLibraryResult<ResultSet>;

    /// Execute a raw statement.
    fn execute_sql(&self, sql: &str) -> MediaLibraryResult<()>;

    /// Apply every statement in one transaction. Either all apply or none do.
    fn update_batch(&self, statements: &[UpdateStatement]) -> MediaLibraryResult<Vec<usize>>;
}

/// The camera's deferred processing service.
///
/// Every call is fire-and-forget from the caller's point of view. Results
/// come back later as [`ProcessingEvent`](crate::ProcessingEvent) messages.
pub trait DeferredProcessingSession: Send + Sync {
    /// Open a reconciliation window.
    fn begin_synchronize(&self);

    /// Close a reconciliation window.
    fn end_synchronize(&self);

    /// Register a captured photo for deferred processing.
    fn add_image(&self, photo_id: &str, proc_type: DeferredProcType, discardable: bool);

    /// Ask for the photo to be processed now on behalf of `bundle`.
    fn process_image(&self, bundle: &str, photo_id: &str);

    /// Withdraw a process request. Returns whether the service accepted it.
    fn cancel_process_image(&self, photo_id: &str) -> bool;

    /// Drop the photo, optionally keeping it restorable.
    fn remove_image(&self, photo_id: &str, restorable: bool);

    /// Bring back a restorable photo.
    fn restore_image(&self, photo_id: &str);
}

/// Picture encoding and EXIF writing.
pub trait ImageCodec: Send + Sync {
    /// Encode `picture` and write it as the file of `image_id`.
    fn save_picture(
        &self,
        image_id: &str,
        picture: &Picture,
        tier: PictureTier,
        is_edited: bool,
    ) -> Result<(), StorageError>;

    /// Write GPS coordinates into the EXIF block of the file at `path`.
    fn write_gps(&self, path: &str, latitude: f64, longitude: f64) -> Result<(), StorageError>;
}
