//! Configuration loading for the media library.
//!
//! Sources, later overriding earlier:
//! - Bundled defaults (include_str! from medialib.toml)
//! - `~/.config/medialib/medialib.toml`
//! - `./medialib.toml`

use config::{Config, File, FileFormat};
use derive_getters::Getters;
use medialib_cache::PictureCacheConfig;
use medialib_command::TableNameMode;
use medialib_error::{ConfigError, MediaLibraryError, MediaLibraryResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../medialib.toml");

/// Table name mapping selection.
#[derive(
    Debug,
    Clone,
    Default,
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
pub struct TablesConfig {
    /// Route filesystem album queries to the legacy `Album` table
    #[serde(default)]
    compatibility: bool,
}

impl TablesConfig {
    /// Runtime table mode.
    pub fn mode(&self) -> TableNameMode {
        TableNameMode::from_compatibility(self.compatibility)
    }
}

/// DFX reporting.
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
pub struct DfxConfig {
    /// Hours between aggregated reports
    #[serde(default = "default_report_interval_hours")]
    report_interval_hours: u64,
}

fn default_report_interval_hours() -> u64 {
    24
}

impl DfxConfig {
    /// Report interval as a duration.
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_hours * 60 * 60)
    }
}

impl Default for DfxConfig {
    fn default() -> Self {
        Self {
            report_interval_hours: default_report_interval_hours(),
        }
    }
}

/// Logging settings read from the config file.
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
pub struct ObservabilitySettings {
    /// Service name attached to spans
    #[serde(default = "default_service_name")]
    service_name: String,
    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    log_level: String,
    /// Emit JSON logs
    #[serde(default)]
    json_logs: bool,
}

fn default_service_name() -> String {
    "medialib".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

/// Capture pipeline settings.
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
pub struct CaptureConfig {
    /// Reconcile with the deferred service at start-up
    #[serde(default = "default_sync_on_start")]
    sync_on_start: bool,
    /// Capacity of the completion message queue
    #[serde(default = "default_event_queue")]
    event_queue: usize,
}

fn default_sync_on_start() -> bool {
    true
}

fn default_event_queue() -> usize {
    64
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sync_on_start: default_sync_on_start(),
            event_queue: default_event_queue(),
        }
    }
}

/// Top-level media library configuration.
///
/// # Example
///
/// ```no_run
/// use medialib::MediaLibraryConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = MediaLibraryConfig::load()?;
/// println!("Picture TTL: {}s", config.picture_cache().ttl_secs());
/// # Ok(())
/// # }
/// ```
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct MediaLibraryConfig {
    /// Table name mapping
    #[serde(default)]
    tables: TablesConfig,
    /// Picture cache limits
    #[serde(default)]
    picture_cache: PictureCacheConfig,
    /// DFX reporting
    #[serde(default)]
    dfx: DfxConfig,
    /// Logging
    #[serde(default)]
    observability: ObservabilitySettings,
    /// Capture pipeline
    #[serde(default)]
    capture: CaptureConfig,
}

fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> MediaLibraryResult<MediaLibraryConfig> {
    builder
        .build()
        .map_err(|e| {
            MediaLibraryError::from(ConfigError::new(format!(
                "Failed to build configuration: {}",
                e
            )))
        })?
        .try_deserialize()
        .map_err(|e| {
            MediaLibraryError::from(ConfigError::new(format!(
                "Failed to parse configuration: {}",
                e
            )))
        })
}

impl MediaLibraryConfig {
    /// Load with precedence: current dir > home dir > bundled defaults.
    ///
    /// Missing user files are skipped.
    #[instrument]
    pub fn load() -> MediaLibraryResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/medialib/medialib.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("medialib").required(false));
        build(builder)
    }

    /// Load bundled defaults overridden by one explicit file.
    ///
    /// # Errors
    ///
    /// Returns `E_CONFIG_INVALID` if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> MediaLibraryResult<Self> {
        debug!("Loading configuration from file");
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()));
        build(builder)
    }

    /// Bundled defaults only.
    pub fn bundled() -> MediaLibraryResult<Self> {
        build(Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml)))
    }
}
