//! src/services/storage_service.rs
//!
//! StorageService — the upload-validation pipeline and directory listing,
//! backed by a single flat directory on local disk. This file intentionally
//! does **not** include any metadata store; the directory entries are the
//! only record of what has been uploaded.

use crate::models::file::StoredFile;
use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

/// Sole file extension admitted by the upload validator, compared
/// case-insensitively against the client's declared filename.
pub const ALLOWED_EXTENSION: &str = "zip";

/// Hard cap on a single upload payload.
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Only .zip files are allowed!")]
    ExtensionNotAllowed,
    #[error("invalid filename `{0}`")]
    InvalidFilename(String),
    #[error("File size too large. Max 100MB allowed.")]
    PayloadTooLarge,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// StorageService provides the two operations of the system:
/// - Store an uploaded file (validate extension, sanitize name, stream the
///   payload to disk under a size cap)
/// - List stored files matching the allow-listed extension
///
/// The storage root is injected rather than hard-coded so tests can run
/// against isolated temporary directories.
#[derive(Clone, Debug)]
pub struct StorageService {
    /// Flat directory on disk where accepted payloads are persisted.
    pub base_path: PathBuf,

    /// Upper bound in bytes for a single payload.
    pub max_upload_bytes: u64,
}

impl StorageService {
    /// Create a new StorageService rooted at `base_path`, with the default
    /// payload cap.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    /// Run the full upload pipeline for one payload.
    ///
    /// - Validates the extension of the *declared* name against the
    ///   allow-list, before any sanitization.
    /// - Strips the name down to its base component.
    /// - Streams bytes incrementally to a temporary file, counting as it
    ///   goes; crossing `max_upload_bytes` aborts the write and removes
    ///   the temporary file.
    /// - Flushes, fsyncs, and renames into the final location, replacing
    ///   any same-named file (last writer wins).
    pub async fn store_file<S>(&self, original_name: &str, stream: S) -> StorageResult<StoredFile>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        ensure_extension_allowed(original_name)?;
        let file_name = sanitize_file_name(original_name)?;

        let file_path = self.base_path.join(&file_name);
        let tmp_path = self.base_path.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: u64 = 0;
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(StorageError::Io(err));
                }
            };
            size_bytes += chunk.len() as u64;
            if size_bytes > self.max_upload_bytes {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::PayloadTooLarge);
            }
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Io(err));
            }
        }

        debug!("stored {} ({} bytes)", file_path.display(), size_bytes);

        Ok(StoredFile {
            filename: file_name,
            size: size_bytes,
            path: file_path.display().to_string(),
        })
    }

    /// List directory entries whose extension matches the allow-list.
    ///
    /// Single level, non-recursive. Names are returned sorted
    /// lexicographically (byte-wise) so the listing is deterministic
    /// across filesystems.
    pub async fn list_files(&self) -> StorageResult<Vec<String>> {
        let mut dir = fs::read_dir(&self.base_path).await?;
        let mut names = Vec::new();

        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if extension_matches(&name) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}

/// Accept only the allow-listed extension.
///
/// The extension of the client's original name is extracted and compared
/// case-insensitively; names with no extension at all (including bare
/// dotfiles like `.zip`) are rejected.
pub fn ensure_extension_allowed(name: &str) -> StorageResult<()> {
    if extension_matches(name) {
        Ok(())
    } else {
        Err(StorageError::ExtensionNotAllowed)
    }
}

/// Strip a client-supplied filename down to its base component.
///
/// Keeps only the substring after the last `/` or `\`, so the result can
/// never escape the storage directory when joined to it. Empty results,
/// the dot components, and names carrying control bytes are rejected
/// outright rather than written as odd hidden names.
pub fn sanitize_file_name(name: &str) -> StorageResult<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    if base.is_empty() || base == "." || base == ".." {
        return Err(StorageError::InvalidFilename(name.to_string()));
    }
    if base.bytes().any(|b| b.is_ascii_control()) {
        return Err(StorageError::InvalidFilename(name.to_string()));
    }
    Ok(base.to_string())
}

/// True when `name` has an extension equal to [`ALLOWED_EXTENSION`],
/// ignoring ASCII case.
fn extension_matches(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ALLOWED_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tempfile::tempdir;

    fn make_service() -> (tempfile::TempDir, StorageService) {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("storage");
        std::fs::create_dir_all(&root).expect("create storage root");
        let service = StorageService::new(root);
        (temp, service)
    }

    fn payload(chunks: &[&'static [u8]]) -> impl Stream<Item = io::Result<Bytes>> + Send {
        let items: Vec<io::Result<Bytes>> = chunks
            .iter()
            .map(|chunk| Ok(Bytes::from_static(chunk)))
            .collect();
        stream::iter(items)
    }

    #[test]
    fn sanitize_keeps_plain_names() {
        assert_eq!(sanitize_file_name("archive.zip").unwrap(), "archive.zip");
    }

    #[test]
    fn sanitize_strips_traversal_components() {
        assert_eq!(
            sanitize_file_name("../../etc/passed.zip").unwrap(),
            "passed.zip"
        );
        assert_eq!(
            sanitize_file_name("..\\..\\evil.zip").unwrap(),
            "evil.zip"
        );
        assert_eq!(sanitize_file_name("/abs/path/a.zip").unwrap(), "a.zip");
    }

    #[test]
    fn sanitize_rejects_empty_and_dot_names() {
        assert!(matches!(
            sanitize_file_name(""),
            Err(StorageError::InvalidFilename(_))
        ));
        assert!(matches!(
            sanitize_file_name("/"),
            Err(StorageError::InvalidFilename(_))
        ));
        assert!(matches!(
            sanitize_file_name(".."),
            Err(StorageError::InvalidFilename(_))
        ));
        assert!(matches!(
            sanitize_file_name("uploads/."),
            Err(StorageError::InvalidFilename(_))
        ));
    }

    #[test]
    fn sanitize_rejects_control_bytes() {
        assert!(matches!(
            sanitize_file_name("a\nb.zip"),
            Err(StorageError::InvalidFilename(_))
        ));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(ensure_extension_allowed("a.zip").is_ok());
        assert!(ensure_extension_allowed("a.ZIP").is_ok());
        assert!(ensure_extension_allowed("a.zIp").is_ok());
    }

    #[test]
    fn extension_check_rejects_everything_else() {
        assert!(matches!(
            ensure_extension_allowed("a.rar"),
            Err(StorageError::ExtensionNotAllowed)
        ));
        assert!(matches!(
            ensure_extension_allowed("archive"),
            Err(StorageError::ExtensionNotAllowed)
        ));
        // A bare dotfile has no extension in the `Path::extension` sense.
        assert!(matches!(
            ensure_extension_allowed(".zip"),
            Err(StorageError::ExtensionNotAllowed)
        ));
        assert!(matches!(
            ensure_extension_allowed("a.zip.rar"),
            Err(StorageError::ExtensionNotAllowed)
        ));
    }

    #[tokio::test]
    async fn store_file_writes_payload_and_reports_exact_size() {
        let (_temp, service) = make_service();
        let stored = service
            .store_file("archive.zip", payload(&[b"hello ", b"world"]))
            .await
            .expect("store file");

        assert_eq!(stored.filename, "archive.zip");
        assert_eq!(stored.size, 11);
        let on_disk = std::fs::read(&stored.path).expect("read stored file");
        assert_eq!(on_disk, b"hello world");
    }

    #[tokio::test]
    async fn store_file_overwrites_same_name() {
        let (_temp, service) = make_service();
        service
            .store_file("archive.zip", payload(&[b"first"]))
            .await
            .expect("first upload");
        let stored = service
            .store_file("archive.zip", payload(&[b"second payload"]))
            .await
            .expect("second upload");

        assert_eq!(stored.size, 14);
        let on_disk = std::fs::read(&stored.path).expect("read stored file");
        assert_eq!(on_disk, b"second payload");
        assert_eq!(service.list_files().await.expect("list"), vec!["archive.zip"]);
    }

    #[tokio::test]
    async fn store_file_keeps_traversal_names_inside_the_directory() {
        let (temp, service) = make_service();
        let stored = service
            .store_file("../../etc/passed.zip", payload(&[b"zipbytes"]))
            .await
            .expect("store file");

        assert_eq!(stored.filename, "passed.zip");
        assert!(temp.path().join("storage").join("passed.zip").is_file());
        assert!(!temp.path().join("etc").exists());
    }

    #[tokio::test]
    async fn store_file_rejects_oversized_payload_without_residue() {
        let (_temp, mut service) = make_service();
        service.max_upload_bytes = 8;

        let result = service
            .store_file("big.zip", payload(&[b"12345678", b"9"]))
            .await;
        assert!(matches!(result, Err(StorageError::PayloadTooLarge)));

        // Neither the target file nor any temp file survives the abort.
        let leftovers: Vec<_> = std::fs::read_dir(&service.base_path)
            .expect("read dir")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn store_file_cleans_up_after_stream_errors() {
        let (_temp, service) = make_service();
        let broken = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(ErrorKind::Other, "client went away")),
        ]);

        let result = service.store_file("broken.zip", broken).await;
        assert!(matches!(result, Err(StorageError::Io(_))));

        let leftovers: Vec<_> = std::fs::read_dir(&service.base_path)
            .expect("read dir")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn store_file_validates_extension_before_writing() {
        let (_temp, service) = make_service();
        let result = service.store_file("notes.txt", payload(&[b"text"])).await;
        assert!(matches!(result, Err(StorageError::ExtensionNotAllowed)));

        let leftovers: Vec<_> = std::fs::read_dir(&service.base_path)
            .expect("read dir")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn list_files_filters_by_extension_and_sorts() {
        let (_temp, service) = make_service();
        std::fs::write(service.base_path.join("a.zip"), b"a").expect("write a.zip");
        std::fs::write(service.base_path.join("B.ZIP"), b"b").expect("write B.ZIP");
        std::fs::write(service.base_path.join("notes.txt"), b"n").expect("write notes.txt");

        let files = service.list_files().await.expect("list files");
        assert_eq!(files, vec!["B.ZIP", "a.zip"]);
    }

    #[tokio::test]
    async fn list_files_fails_when_directory_is_unreadable() {
        let service = StorageService::new("./does-not-exist-zip-store-test");
        let result = service.list_files().await;
        assert!(matches!(result, Err(StorageError::Io(_))));
    }
}
