//! Represents a file accepted into the storage directory.

use serde::Serialize;

/// Metadata for a single stored file.
///
/// Produced by the storage layer after a successful upload. The struct is
/// never persisted anywhere; the directory entry itself is the record.
#[derive(Serialize, Clone, Debug)]
pub struct StoredFile {
    /// Sanitized filename the payload was stored under.
    pub filename: String,

    /// Size in bytes actually written to disk.
    pub size: u64,

    /// Full path of the file inside the storage directory.
    pub path: String,
}
