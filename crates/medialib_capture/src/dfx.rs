//! DFX telemetry for the multi-stage capture pipeline.
//!
//! Reporters only observe. They never influence capture behavior, and a
//! failing reporter is logged and ignored.

use chrono::Utc;
use derive_getters::Getters;
use medialib_core::{DeliveryMode, RdbPredicates, columns};
use medialib_command::table;
use medialib_interface::Database;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Default period between aggregated reports.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Who asked for the final image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TriggerType {
    /// The camera pipeline itself
    #[display("auto")]
    Auto,
    /// Another application
    #[display("third_part")]
    ThirdPart,
}

fn due(last_report: Option<Instant>, interval: Duration, now: Instant) -> bool {
    match last_report {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= interval,
    }
}

fn emit<T: Serialize>(event: &str, payload: &T) {
    match serde_json::to_string(payload) {
        Ok(json) => info!(event, payload = %json, "DFX report"),
        Err(e) => warn!(event, error = ?e, "Failed to serialize DFX report"),
    }
}

/// Trigger counters since the last report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TriggerCounts {
    /// Camera-triggered processing
    pub auto: u64,
    /// Third-party-triggered processing
    pub third_part: u64,
}

#[derive(Debug, Default)]
struct TriggerState {
    counts: TriggerCounts,
    last_report: Option<Instant>,
    reports: u64,
}

/// Ratio of camera-triggered to third-party-triggered processing.
#[derive(Debug)]
pub struct TriggerRatio {
    interval: Duration,
    state: Mutex<TriggerState>,
}

impl TriggerRatio {
    /// Reporter emitting every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: Mutex::new(TriggerState::default()),
        }
    }

    /// Count a trigger.
    pub fn set_trigger(&self, trigger: TriggerType) {
        self.set_trigger_at(trigger, Instant::now());
    }

    /// [`set_trigger`](Self::set_trigger) at a given instant.
    pub fn set_trigger_at(&self, trigger: TriggerType, now: Instant) {
        let mut state = self.state.lock();
        match trigger {
            TriggerType::Auto => state.counts.auto += 1,
            TriggerType::ThirdPart => state.counts.third_part += 1,
        }
        if due(state.last_report, self.interval, now) {
            emit("trigger_ratio", &state.counts);
            state.counts = TriggerCounts::default();
            state.last_report = Some(now);
            state.reports += 1;
        }
    }

    /// Counters accumulated since the last report.
    pub fn counts(&self) -> TriggerCounts {
        self.state.lock().counts
    }

    /// Number of reports emitted.
    pub fn reports(&self) -> u64 {
        self.state.lock().reports
    }
}

/// Per-bundle delivery mode counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PolicyCounts {
    /// High quality requests
    pub high_quality: u64,
    /// Balanced requests
    pub balance: u64,
    /// Fast requests
    pub emergency: u64,
}

#[derive(Debug, Default)]
struct PolicyState {
    counts: HashMap<String, PolicyCounts>,
    last_report: Option<Instant>,
    reports: u64,
}

/// Delivery modes requested by each calling bundle.
#[derive(Debug)]
pub struct RequestPolicy {
    interval: Duration,
    state: Mutex<PolicyState>,
}

impl RequestPolicy {
    /// Reporter emitting every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: Mutex::new(PolicyState::default()),
        }
    }

    /// Count a request from `bundle`.
    pub fn set_policy(&self, bundle: &str, mode: DeliveryMode) {
        self.set_policy_at(bundle, mode, Instant::now());
    }

    /// [`set_policy`](Self::set_policy) at a given instant.
    pub fn set_policy_at(&self, bundle: &str, mode: DeliveryMode, now: Instant) {
        let mut state = self.state.lock();
        let counts = state.counts.entry(bundle.to_string()).or_default();
        match mode {
            DeliveryMode::HighQuality => counts.high_quality += 1,
            DeliveryMode::Balance => counts.balance += 1,
            DeliveryMode::Fast => counts.emergency += 1,
        }
        if due(state.last_report, self.interval, now) {
            emit("request_policy", &state.counts);
            state.counts.clear();
            state.last_report = Some(now);
            state.reports += 1;
        }
    }

    /// Counters for `bundle` since the last report.
    pub fn counts(&self, bundle: &str) -> PolicyCounts {
        self.state
            .lock()
            .counts
            .get(bundle)
            .copied()
            .unwrap_or_default()
    }

    /// Number of reports emitted.
    pub fn reports(&self) -> u64 {
        self.state.lock().reports
    }
}

/// Time from capture to final image, per photo.
#[derive(Debug, Default)]
pub struct TotalTime {
    started: Mutex<HashMap<String, Instant>>,
}

impl TotalTime {
    /// Create an empty timer table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing `photo_id`.
    pub fn add_start_time(&self, photo_id: &str) {
        self.started
            .lock()
            .insert(photo_id.to_string(), Instant::now());
    }

    /// Report and stop timing. Unknown photos are ignored.
    pub fn report(&self, photo_id: &str) -> Option<Duration> {
        let start = self.started.lock().remove(photo_id)?;
        let elapsed = start.elapsed();
        info!(
            photo_id,
            total_time_ms = elapsed.as_millis() as u64,
            "DFX total time"
        );
        Some(elapsed)
    }

    /// Stop timing without reporting.
    pub fn remove_start_time(&self, photo_id: &str) {
        self.started.lock().remove(photo_id);
    }

    /// Whether `photo_id` is being timed.
    pub fn is_timing(&self, photo_id: &str) -> bool {
        self.started.lock().contains_key(photo_id)
    }
}

#[derive(Debug, Serialize)]
struct FirstVisitPayload<'a> {
    photo_id: &'a str,
    file_id: Option<i64>,
    since_capture_ms: Option<i64>,
}

/// Reports the first time a third party asks for a photo.
pub struct FirstVisit {
    db: Arc<dyn Database>,
    visited: Mutex<HashSet<String>>,
}

impl std::fmt::Debug for FirstVisit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirstVisit")
            .field("visited", &self.visited.lock().len())
            .finish()
    }
}

impl FirstVisit {
    /// Reporter reading capture times from `db`.
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            visited: Mutex::new(HashSet::new()),
        }
    }

    /// Report the first visit of `photo_id`. Returns whether a report was emitted.
    #[instrument(skip(self))]
    pub fn report(&self, photo_id: &str) -> bool {
        if photo_id.is_empty() {
            debug!("Empty photo id, skipping first visit");
            return false;
        }
        if self.visited.lock().contains(photo_id) {
            return false;
        }

        let mut predicates = RdbPredicates::new(table::PHOTOS_TABLE);
        predicates.equal_to(columns::PHOTO_ID, photo_id);
        let wanted = [columns::FILE_ID.to_string(), columns::DATE_ADDED.to_string()];
        let row = match self.db.query(&predicates, &wanted) {
            Ok(result) => result.first().cloned(),
            Err(e) => {
                warn!(error = ?e, "First visit lookup failed");
                return false;
            }
        };
        let Some(row) = row else {
            debug!("Photo not found, skipping first visit");
            return false;
        };

        if !self.visited.lock().insert(photo_id.to_string()) {
            return false;
        }
        let since_capture_ms = row
            .get_long(columns::DATE_ADDED)
            .map(|added| Utc::now().timestamp_millis() - added);
        emit(
            "first_visit",
            &FirstVisitPayload {
                photo_id,
                file_id: row.get_long(columns::FILE_ID),
                since_capture_ms,
            },
        );
        true
    }
}

/// Outcome of a deferred processing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct ProcessingResult {
    photo_id: String,
    result_code: i32,
}

/// Reports the outcome of every processed photo.
#[derive(Debug, Default)]
pub struct ResultReport {
    results: Mutex<Vec<ProcessingResult>>,
}

impl ResultReport {
    /// Create an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `result_code` for `photo_id`. Empty ids are ignored.
    pub fn report(&self, photo_id: &str, result_code: i32) {
        if photo_id.is_empty() {
            debug!("Empty photo id, skipping result report");
            return;
        }
        let result = ProcessingResult {
            photo_id: photo_id.to_string(),
            result_code,
        };
        emit("result", &result);
        self.results.lock().push(result);
    }

    /// Every reported result, oldest first.
    pub fn results(&self) -> Vec<ProcessingResult> {
        self.results.lock().clone()
    }
}

/// All capture reporters, shared by the capture manager.
#[derive(Debug, Getters)]
pub struct MultiStagesCaptureDfx {
    trigger_ratio: TriggerRatio,
    request_policy: RequestPolicy,
    total_time: TotalTime,
    first_visit: FirstVisit,
    result: ResultReport,
}

impl MultiStagesCaptureDfx {
    /// Reporters emitting aggregates every `report_interval`.
    pub fn new(db: Arc<dyn Database>, report_interval: Duration) -> Self {
        Self {
            trigger_ratio: TriggerRatio::new(report_interval),
            request_policy: RequestPolicy::new(report_interval),
            total_time: TotalTime::new(),
            first_visit: FirstVisit::new(db),
            result: ResultReport::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_ratio_reports_first_then_waits() {
        let ratio = TriggerRatio::new(DEFAULT_REPORT_INTERVAL);
        let t = Instant::now();

        ratio.set_trigger_at(TriggerType::Auto, t);
        assert_eq!(ratio.reports(), 1);
        assert_eq!(ratio.counts(), TriggerCounts::default());

        ratio.set_trigger_at(TriggerType::ThirdPart, t + Duration::from_secs(60));
        ratio.set_trigger_at(TriggerType::Auto, t + Duration::from_secs(120));
        assert_eq!(ratio.reports(), 1);
        assert_eq!(ratio.counts(), TriggerCounts { auto: 1, third_part: 1 });

        ratio.set_trigger_at(TriggerType::Auto, t + DEFAULT_REPORT_INTERVAL);
        assert_eq!(ratio.reports(), 2);
    }

    #[test]
    fn test_request_policy_counts_per_bundle() {
        let policy = RequestPolicy::new(DEFAULT_REPORT_INTERVAL);
        let t = Instant::now();
        policy.set_policy_at("com.a", DeliveryMode::Fast, t);
        policy.set_policy_at("com.a", DeliveryMode::HighQuality, t);
        policy.set_policy_at("com.b", DeliveryMode::Balance, t);

        assert_eq!(
            policy.counts("com.a"),
            PolicyCounts { high_quality: 1, balance: 0, emergency: 0 }
        );
        assert_eq!(policy.counts("com.b").balance, 1);
    }

    #[test]
    fn test_total_time_unknown_photo() {
        let total = TotalTime::new();
        assert!(total.report("nope").is_none());
        total.add_start_time("P");
        assert!(total.report("P").is_some());
        assert!(!total.is_timing("P"));
    }
}
