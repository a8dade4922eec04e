//! In-memory relational store for the media library.
//!
//! [`MemoryDatabase`] implements the [`Database`](medialib_interface::Database)
//! collaborator without a schema. It backs tests and local runs; a production
//! deployment plugs in its own store behind the same trait.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod memory;

pub use memory::{FailPoint, MemoryDatabase};
