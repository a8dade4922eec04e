//! Core data types for the media library data service.
//!
//! This crate holds the payload types carried by commands (value buckets and
//! predicates), query results, the integer-coded enums stored in the media
//! tables, and asset validation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod columns;
mod media;
mod picture;
mod predicates;
mod result_set;
mod telemetry;
mod validation;
mod values;

pub use media::{DeferredProcType, DeliveryMode, DirtyType, MediaType, PhotoQuality, PhotoSubtype};
pub use picture::{Picture, PictureTier};
pub use predicates::{CompareOp, PredicateItem, RdbPredicates};
pub use result_set::ResultSet;
pub use telemetry::init_telemetry;
pub use validation::{
    check_display_name, check_media_type_matches_extension, check_relative_path, extension_of,
};
pub use values::{ValueObject, ValuesBucket};
