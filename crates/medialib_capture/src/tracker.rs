//! Bookkeeping of photos handed to the deferred processing service.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Direction of a request counter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RequestType {
    /// A caller wants the final image
    #[display("request")]
    Request,
    /// A caller no longer wants it
    #[display("cancel_request")]
    CancelRequest,
}

/// Counter values around one request change, read under the tracker lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestCountChange {
    /// Counter before the change
    pub previous: u32,
    /// Counter after the change
    pub current: u32,
}

impl RequestCountChange {
    /// First caller asked for processing (0 → 1).
    pub fn is_first_request(&self) -> bool {
        self.previous == 0 && self.current == 1
    }

    /// Last caller withdrew (>0 → 0).
    pub fn is_last_cancel(&self) -> bool {
        self.previous > 0 && self.current == 0
    }
}

/// Where a tracked photo sits in the capture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    /// Low-quality image saved, nobody waiting for the final one
    CreatedLow,
    /// At least one caller is waiting for the final image
    ProcessingRequested {
        /// Number of outstanding requests
        requests: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PhotoInProgress {
    file_id: i32,
    discardable: bool,
    requests: u32,
}

#[derive(Debug, Default)]
struct TrackerState {
    in_process: HashMap<String, PhotoInProgress>,
    trashed: HashMap<String, PhotoInProgress>,
    file_to_photo: HashMap<i32, String>,
}

/// Tracks photos in deferred processing and their outstanding requests.
///
/// One lock guards membership and counters, so a counter change and the
/// membership test it depends on are always consistent.
#[derive(Debug, Default)]
pub struct RequestTaskTracker {
    state: Mutex<TrackerState>,
}

impl RequestTaskTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a photo.
    ///
    /// A photo already tracked keeps its counter. A trashed photo is brought
    /// back.
    #[instrument(skip(self))]
    pub fn add_photo_in_progress(&self, file_id: i32, photo_id: &str, discardable: bool) {
        let mut state = self.state.lock();
        let previous = state
            .in_process
            .remove(photo_id)
            .or_else(|| state.trashed.remove(photo_id));
        let requests = previous.map(|p| p.requests).unwrap_or(0);
        state.in_process.insert(
            photo_id.to_string(),
            PhotoInProgress {
                file_id,
                discardable,
                requests,
            },
        );
        state.file_to_photo.insert(file_id, photo_id.to_string());
        debug!(tracked = state.in_process.len(), "Tracking photo");
    }

    /// Whether the photo is tracked and not trashed.
    pub fn is_photo_in_process(&self, photo_id: &str) -> bool {
        self.state.lock().in_process.contains_key(photo_id)
    }

    /// Apply a request change. `None` when the photo is not tracked.
    ///
    /// Cancels never take the counter below zero.
    #[instrument(skip(self))]
    pub fn update_photo_in_process_request_count(
        &self,
        photo_id: &str,
        request: RequestType,
    ) -> Option<RequestCountChange> {
        let mut state = self.state.lock();
        let Some(photo) = state.in_process.get_mut(photo_id) else {
            warn!("Photo not in process");
            return None;
        };
        let previous = photo.requests;
        photo.requests = match request {
            RequestType::Request => previous.saturating_add(1),
            RequestType::CancelRequest => previous.saturating_sub(1),
        };
        let change = RequestCountChange {
            previous,
            current: photo.requests,
        };
        debug!(previous, current = change.current, "Request count changed");
        Some(change)
    }

    /// Withdraw one request, forgetting the photo when it was the last one.
    ///
    /// Decrement and removal happen under one lock, so a concurrent request
    /// either lands before the decrement or finds the photo untracked.
    #[instrument(skip(self))]
    pub fn cancel_request(&self, photo_id: &str) -> Option<RequestCountChange> {
        let mut state = self.state.lock();
        let photo = state.in_process.get_mut(photo_id)?;
        let previous = photo.requests;
        photo.requests = previous.saturating_sub(1);
        let change = RequestCountChange {
            previous,
            current: photo.requests,
        };
        if change.is_last_cancel() {
            if let Some(photo) = state.in_process.remove(photo_id)
                && state.file_to_photo.get(&photo.file_id).map(String::as_str) == Some(photo_id)
            {
                state.file_to_photo.remove(&photo.file_id);
            }
            info!("Last request cancelled, photo forgotten");
        }
        Some(change)
    }

    /// Stop tracking a photo. A restorable removal keeps it in the trash.
    #[instrument(skip(self))]
    pub fn remove_photo_in_progress(&self, photo_id: &str, restorable: bool) {
        let mut state = self.state.lock();
        let removed = state
            .in_process
            .remove(photo_id)
            .or_else(|| state.trashed.remove(photo_id));
        let Some(photo) = removed else {
            debug!("Photo was not tracked");
            return;
        };
        if restorable {
            state.trashed.insert(photo_id.to_string(), photo);
        } else if state.file_to_photo.get(&photo.file_id).map(String::as_str) == Some(photo_id) {
            state.file_to_photo.remove(&photo.file_id);
        }
        info!(restorable, "Removed photo from process");
    }

    /// Bring a trashed photo back into process.
    #[instrument(skip(self))]
    pub fn update_photo_in_progress(&self, photo_id: &str) {
        let mut state = self.state.lock();
        match state.trashed.remove(photo_id) {
            Some(photo) => {
                state.in_process.insert(photo_id.to_string(), photo);
                info!("Restored photo into process");
            }
            None => debug!("Photo not trashed"),
        }
    }

    /// Photo id tracked for `file_id`, or an empty string.
    pub fn get_processing_photo_id(&self, file_id: i32) -> String {
        self.state
            .lock()
            .file_to_photo
            .get(&file_id)
            .cloned()
            .unwrap_or_default()
    }

    /// File id of a tracked or trashed photo.
    pub fn file_id_of(&self, photo_id: &str) -> Option<i32> {
        let state = self.state.lock();
        state
            .in_process
            .get(photo_id)
            .or_else(|| state.trashed.get(photo_id))
            .map(|p| p.file_id)
    }

    /// Whether a tracked photo may be dropped silently.
    pub fn is_discardable(&self, photo_id: &str) -> Option<bool> {
        self.state.lock().in_process.get(photo_id).map(|p| p.discardable)
    }

    /// Pipeline phase of a tracked photo.
    pub fn phase(&self, photo_id: &str) -> Option<CapturePhase> {
        self.state.lock().in_process.get(photo_id).map(|p| match p.requests {
            0 => CapturePhase::CreatedLow,
            requests => CapturePhase::ProcessingRequested { requests },
        })
    }

    /// Number of photos in process.
    pub fn len(&self) -> usize {
        self.state.lock().in_process.len()
    }

    /// Whether no photo is in process.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_never_negative() {
        let tracker = RequestTaskTracker::new();
        tracker.add_photo_in_progress(1, "P", false);

        let change = tracker
            .update_photo_in_process_request_count("P", RequestType::CancelRequest)
            .unwrap();
        assert_eq!(change, RequestCountChange { previous: 0, current: 0 });
        assert!(!change.is_last_cancel());

        let change = tracker
            .update_photo_in_process_request_count("P", RequestType::Request)
            .unwrap();
        assert!(change.is_first_request());
    }

    #[test]
    fn test_untracked_photo_has_no_change() {
        let tracker = RequestTaskTracker::new();
        assert!(tracker
            .update_photo_in_process_request_count("nope", RequestType::Request)
            .is_none());
    }

    #[test]
    fn test_reregistration_keeps_counter() {
        let tracker = RequestTaskTracker::new();
        tracker.add_photo_in_progress(1, "P", false);
        tracker.update_photo_in_process_request_count("P", RequestType::Request);
        tracker.add_photo_in_progress(1, "P", true);
        assert_eq!(
            tracker.phase("P"),
            Some(CapturePhase::ProcessingRequested { requests: 1 })
        );
    }
}
