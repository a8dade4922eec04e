//! Picture cache configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`PictureCache`](crate::PictureCache).
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct PictureCacheConfig {
    /// Lifetime of a cached picture (seconds)
    #[serde(default = "default_ttl_secs")]
    ttl_secs: u64,

    /// Capacity of the high-quality tier
    #[serde(default = "default_max_high_quality")]
    max_high_quality: usize,

    /// Capacity of the low-quality tier
    #[serde(default = "default_max_low_quality")]
    max_low_quality: usize,

    /// Period of the background sweep (seconds)
    #[serde(default = "default_sweep_interval_secs")]
    sweep_interval_secs: u64,

    /// Whether caching is enabled
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_ttl_secs() -> u64 {
    20
}

fn default_max_high_quality() -> usize {
    3
}

fn default_max_low_quality() -> usize {
    16
}

fn default_sweep_interval_secs() -> u64 {
    5
}

fn default_enabled() -> bool {
    true
}

impl PictureCacheConfig {
    /// TTL as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Sweep period as a duration, never zero.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for PictureCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_high_quality: default_max_high_quality(),
            max_low_quality: default_max_low_quality(),
            sweep_interval_secs: default_sweep_interval_secs(),
            enabled: default_enabled(),
        }
    }
}
