//! Two-tier picture cache with TTL expiry and bounded capacity.

use crate::PictureCacheConfig;
use derive_getters::Getters;
use medialib_core::{Picture, PictureTier};
use medialib_interface::ImageCodec;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// A picture handed over by the camera.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct PicturePair {
    picture: Picture,
    is_edited: bool,
}

impl PicturePair {
    /// Pair a picture with its edit flag.
    pub fn new(picture: Picture, is_edited: bool) -> Self {
        Self { picture, is_edited }
    }
}

/// A cached picture with its expiry.
#[derive(Debug, Clone, Getters)]
pub struct CachedPicture {
    image_id: String,
    pair: PicturePair,
    tier: PictureTier,
    inserted_at: Instant,
    expires_at: Instant,
}

impl CachedPicture {
    /// Whether the entry is past its TTL at `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry at `now`.
    pub fn time_remaining_at(&self, now: Instant) -> Option<Duration> {
        self.expires_at.checked_duration_since(now)
    }
}

#[derive(Debug, Default)]
struct Tiers {
    low: HashMap<String, CachedPicture>,
    high: HashMap<String, CachedPicture>,
}

impl Tiers {
    fn tier(&self, tier: PictureTier) -> &HashMap<String, CachedPicture> {
        match tier {
            PictureTier::LowQuality => &self.low,
            PictureTier::HighQuality => &self.high,
        }
    }

    fn tier_mut(&mut self, tier: PictureTier) -> &mut HashMap<String, CachedPicture> {
        match tier {
            PictureTier::LowQuality => &mut self.low,
            PictureTier::HighQuality => &mut self.high,
        }
    }
}

/// Cache of decoded pictures keyed by `(image_id, tier)`.
///
/// Entries live for the configured TTL. When a tier is full, the entry
/// closest to expiry makes room; an evicted high-quality picture is written to
/// disk first so the final image is never lost. Codec calls run after the
/// lock is released.
///
/// Every time-dependent method has an `*_at(now)` variant for deterministic
/// tests.
///
/// # Example
///
/// ```
/// use medialib_cache::{PictureCache, PictureCacheConfig, PicturePair};
/// use medialib_core::{Picture, PictureTier};
/// use medialib_error::StorageError;
/// use medialib_interface::ImageCodec;
/// use std::sync::Arc;
///
/// struct NullCodec;
///
/// impl ImageCodec for NullCodec {
///     fn save_picture(&self, _: &str, _: &Picture, _: PictureTier, _: bool) -> Result<(), StorageError> {
///         Ok(())
///     }
///     fn write_gps(&self, _: &str, _: f64, _: f64) -> Result<(), StorageError> {
///         Ok(())
///     }
/// }
///
/// let cache = PictureCache::new(PictureCacheConfig::default(), Arc::new(NullCodec));
/// let pair = PicturePair::new(Picture::new(vec![0u8; 4], 2, 2), false);
/// cache.insert_picture_data("img", pair, PictureTier::LowQuality);
///
/// assert!(cache.is_exist_picture_by_image_id("img"));
/// assert!(cache.save_low_quality_picture("img"));
/// assert!(!cache.is_exist_picture_by_image_id("img"));
/// ```
pub struct PictureCache {
    config: PictureCacheConfig,
    codec: Arc<dyn ImageCodec>,
    tiers: Mutex<Tiers>,
}

impl std::fmt::Debug for PictureCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tiers = self.tiers.lock();
        f.debug_struct("PictureCache")
            .field("config", &self.config)
            .field("low", &tiers.low.len())
            .field("high", &tiers.high.len())
            .finish()
    }
}

impl PictureCache {
    /// Create an empty cache that flushes through `codec`.
    pub fn new(config: PictureCacheConfig, codec: Arc<dyn ImageCodec>) -> Self {
        tracing::debug!(
            ttl_secs = config.ttl_secs(),
            max_high_quality = config.max_high_quality(),
            max_low_quality = config.max_low_quality(),
            enabled = config.enabled(),
            "Creating new PictureCache"
        );
        Self {
            config,
            codec,
            tiers: Mutex::new(Tiers::default()),
        }
    }

    /// Cache configuration.
    pub fn config(&self) -> &PictureCacheConfig {
        &self.config
    }

    fn capacity(&self, tier: PictureTier) -> usize {
        match tier {
            PictureTier::LowQuality => *self.config.max_low_quality(),
            PictureTier::HighQuality => *self.config.max_high_quality(),
        }
    }

    /// Insert a picture, replacing any entry for `image_id` in the same tier.
    pub fn insert_picture_data(&self, image_id: &str, pair: PicturePair, tier: PictureTier) {
        self.insert_picture_data_at(image_id, pair, tier, Instant::now());
    }

    /// [`insert_picture_data`](Self::insert_picture_data) at a given instant.
    #[tracing::instrument(skip(self, pair, now), fields(%tier))]
    pub fn insert_picture_data_at(
        &self,
        image_id: &str,
        pair: PicturePair,
        tier: PictureTier,
        now: Instant,
    ) {
        self.insert_inner(image_id, pair, tier, now, true);
    }

    /// Insert only when `image_id` has no live entry in `tier`.
    ///
    /// Returns whether the picture was stored.
    pub fn insert_if_absent(&self, image_id: &str, pair: PicturePair, tier: PictureTier) -> bool {
        self.insert_if_absent_at(image_id, pair, tier, Instant::now())
    }

    /// [`insert_if_absent`](Self::insert_if_absent) at a given instant.
    #[tracing::instrument(skip(self, pair, now), fields(%tier))]
    pub fn insert_if_absent_at(
        &self,
        image_id: &str,
        pair: PicturePair,
        tier: PictureTier,
        now: Instant,
    ) -> bool {
        self.insert_inner(image_id, pair, tier, now, false)
    }

    fn insert_inner(
        &self,
        image_id: &str,
        pair: PicturePair,
        tier: PictureTier,
        now: Instant,
        replace: bool,
    ) -> bool {
        if !self.config.enabled() {
            tracing::debug!("Cache disabled, skipping insert");
            return false;
        }

        let capacity = self.capacity(tier);
        let evicted = {
            let mut tiers = self.tiers.lock();
            let map = tiers.tier_mut(tier);

            let live = map.get(image_id).is_some_and(|e| !e.is_expired_at(now));
            if live && !replace {
                tracing::debug!("Picture already cached, keeping first");
                return false;
            }

            let mut evicted = None;
            if !map.contains_key(image_id) && map.len() >= capacity {
                let victim = map
                    .values()
                    .min_by_key(|e| e.expires_at)
                    .map(|e| e.image_id.clone());
                evicted = victim.and_then(|id| map.remove(&id));
            }

            map.insert(
                image_id.to_string(),
                CachedPicture {
                    image_id: image_id.to_string(),
                    pair,
                    tier,
                    inserted_at: now,
                    expires_at: now + self.config.ttl(),
                },
            );
            tracing::debug!(cache_size = map.len(), "Inserted picture into cache");
            evicted
        };

        if let Some(entry) = evicted {
            tracing::debug!(evicted = %entry.image_id, "Evicting picture closest to expiry");
            if entry.tier == PictureTier::HighQuality {
                self.flush(&entry);
            }
        }
        true
    }

    /// Whether a live low-quality picture is cached for `image_id`.
    pub fn is_exist_picture_by_image_id(&self, image_id: &str) -> bool {
        self.is_exist(image_id, PictureTier::LowQuality)
    }

    /// Whether a live picture is cached for `image_id` in `tier`.
    pub fn is_exist(&self, image_id: &str, tier: PictureTier) -> bool {
        self.is_exist_at(image_id, tier, Instant::now())
    }

    /// [`is_exist`](Self::is_exist) at a given instant.
    pub fn is_exist_at(&self, image_id: &str, tier: PictureTier, now: Instant) -> bool {
        self.get_at(image_id, tier, now).is_some()
    }

    /// Best available picture for `image_id`, high quality first.
    pub fn get_data_with_image_id(&self, image_id: &str) -> Option<CachedPicture> {
        self.get_data_with_image_id_at(image_id, Instant::now())
    }

    /// [`get_data_with_image_id`](Self::get_data_with_image_id) at a given instant.
    pub fn get_data_with_image_id_at(&self, image_id: &str, now: Instant) -> Option<CachedPicture> {
        self.get_at(image_id, PictureTier::HighQuality, now)
            .or_else(|| self.get_at(image_id, PictureTier::LowQuality, now))
    }

    /// Picture for `image_id` in `tier`, if cached and live.
    pub fn get(&self, image_id: &str, tier: PictureTier) -> Option<CachedPicture> {
        self.get_at(image_id, tier, Instant::now())
    }

    /// [`get`](Self::get) at a given instant.
    pub fn get_at(&self, image_id: &str, tier: PictureTier, now: Instant) -> Option<CachedPicture> {
        let tiers = self.tiers.lock();
        tiers
            .tier(tier)
            .get(image_id)
            .filter(|e| !e.is_expired_at(now))
            .cloned()
    }

    /// Write the cached low-quality picture to disk and drop it.
    ///
    /// Returns `false` when nothing is cached or the write fails.
    pub fn save_low_quality_picture(&self, image_id: &str) -> bool {
        self.save_tier(image_id, PictureTier::LowQuality)
    }

    /// Write the cached high-quality picture to disk and drop it.
    ///
    /// Returns `false` when nothing is cached or the write fails.
    pub fn save_picture_with_image_id(&self, image_id: &str) -> bool {
        self.save_tier(image_id, PictureTier::HighQuality)
    }

    #[tracing::instrument(skip(self), fields(%tier))]
    fn save_tier(&self, image_id: &str, tier: PictureTier) -> bool {
        let entry = self.tiers.lock().tier_mut(tier).remove(image_id);
        match entry {
            Some(entry) => self.flush(&entry),
            None => {
                tracing::warn!("No cached picture to save");
                false
            }
        }
    }

    fn flush(&self, entry: &CachedPicture) -> bool {
        match self.codec.save_picture(
            &entry.image_id,
            entry.pair.picture(),
            entry.tier,
            *entry.pair.is_edited(),
        ) {
            Ok(()) => {
                tracing::info!(
                    image_id = %entry.image_id,
                    tier = %entry.tier,
                    bytes = entry.pair.picture().byte_len(),
                    "Saved cached picture"
                );
                true
            }
            Err(e) => {
                tracing::error!(image_id = %entry.image_id, error = ?e, "Failed to save cached picture");
                false
            }
        }
    }

    /// Drop the entry for `image_id` in `tier` without writing it.
    pub fn delete_data_with_image_id(&self, image_id: &str, tier: PictureTier) -> bool {
        let removed = self.tiers.lock().tier_mut(tier).remove(image_id).is_some();
        tracing::debug!(image_id, %tier, removed, "Deleted cached picture");
        removed
    }

    /// Drop expired entries now.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    /// Drop entries expired at `now`, flushing high-quality ones first.
    pub fn sweep_expired_at(&self, now: Instant) -> usize {
        let (high, low_removed) = {
            let mut tiers = self.tiers.lock();
            let before = tiers.low.len();
            tiers.low.retain(|_, e| !e.is_expired_at(now));
            let low_removed = before - tiers.low.len();

            let expired: Vec<String> = tiers
                .high
                .values()
                .filter(|e| e.is_expired_at(now))
                .map(|e| e.image_id.clone())
                .collect();
            let high: Vec<CachedPicture> = expired
                .iter()
                .filter_map(|id| tiers.high.remove(id))
                .collect();
            (high, low_removed)
        };

        for entry in &high {
            self.flush(entry);
        }

        let removed = high.len() + low_removed;
        if removed > 0 {
            tracing::info!(
                removed,
                flushed = high.len(),
                remaining = self.len(),
                "Swept expired pictures"
            );
        }
        removed
    }

    /// Sweep expired entries every configured interval.
    ///
    /// The task ends once the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let period = self.config.sweep_interval();
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    tracing::debug!("Picture cache dropped, stopping sweeper");
                    break;
                };
                cache.sweep_expired();
            }
        })
    }

    /// Number of cached entries in `tier`, expired or not.
    pub fn tier_len(&self, tier: PictureTier) -> usize {
        self.tiers.lock().tier(tier).len()
    }

    /// Number of cached entries across both tiers.
    pub fn len(&self) -> usize {
        let tiers = self.tiers.lock();
        tiers.low.len() + tiers.high.len()
    }

    /// Whether both tiers are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry without writing.
    pub fn clear(&self) {
        let mut tiers = self.tiers.lock();
        let count = tiers.low.len() + tiers.high.len();
        tiers.low.clear();
        tiers.high.clear();
        tracing::info!(cleared = count, "Cleared picture cache");
    }
}
