//! Core data models for the upload service.
//!
//! The filesystem is the only store, so the models here are derived
//! metadata about directory entries, serialized as JSON via `serde`.

pub mod file;
