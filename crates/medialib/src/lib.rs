//! Media library data service.
//!
//! A CRUD backend for photos, videos and audio exposed through a
//! `datashare:///media/...` URI protocol. Requests are classified into an
//! object and a verb, resolved to a table and routed either to the relational
//! store or to the multi-stage capture pipeline, which hands fast
//! low-quality captures to a deferred processing service and upgrades them
//! when the final image arrives.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use medialib::{MediaLibraryConfig, MediaLibraryContext, MemoryDatabase, ValuesBucket};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MediaLibraryConfig::load()?;
//!     medialib::init_observability_with_config(config.observability().into())?;
//!
//!     let ctx = MediaLibraryContext::new(config, Arc::new(MemoryDatabase::new()), session, codec);
//!     let tasks = ctx.start();
//!
//!     let mut values = ValuesBucket::new();
//!     values.put_string("media_name", "a.jpg").put_int("media_type", 1);
//!     let id = ctx
//!         .data_manager()
//!         .insert("datashare:///media/phaccess_photo_operation/create", &values);
//!     assert!(id > 0);
//!
//!     tasks.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `observability` - export spans through OpenTelemetry
//!
//! # Architecture
//!
//! - `medialib_error` - error kinds and negative errno codes
//! - `medialib_core` - value buckets, predicates, media enums, validation
//! - `medialib_interface` - collaborator traits
//! - `medialib_command` - URI parsing and table resolution
//! - `medialib_database` - in-memory relational store
//! - `medialib_cache` - picture cache
//! - `medialib_capture` - multi-stage capture manager
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod data_manager;
mod observability;

pub use config::{
    CaptureConfig, CaptureConfigBuilder, DfxConfig, DfxConfigBuilder, MediaLibraryConfig,
    ObservabilitySettings, ObservabilitySettingsBuilder, TablesConfig, TablesConfigBuilder,
};
pub use context::{BackgroundTasks, MediaLibraryContext};
pub use data_manager::MediaLibraryDataManager;
pub use observability::{
    ObservabilityConfig, init_observability, init_observability_with_config,
    shutdown_observability,
};

pub use medialib_cache::*;
pub use medialib_capture::*;
pub use medialib_command::*;
pub use medialib_core::*;
pub use medialib_database::*;
pub use medialib_error::*;
pub use medialib_interface::*;
