//! Download: hand the decoded document to a save surface.
//!
//! Saving goes through a transient reference, the way a browser hands a
//! `blob:` URL to its download manager:
//!
//! 1. wrap the bytes in a [`Blob`] tagged with its media type
//! 2. register it in the [`BlobRegistry`], receiving a [`BlobHandle`]
//! 3. ask the [`SaveSurface`] to save whatever the handle points at
//! 4. revoke the handle
//!
//! Step 4 is the handle's `Drop`, so it runs on every exit path: success,
//! error, or a panic unwinding through the save.

use crate::error::DownloadError;
use crate::pipeline::decode::ProcessedResult;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, trace};

/// Bytes plus the media type they should be saved as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Arc<[u8]>,
    pub media_type: String,
}

impl Blob {
    pub fn new(bytes: &[u8], media_type: impl Into<String>) -> Self {
        Self {
            bytes: Arc::from(bytes),
            media_type: media_type.into(),
        }
    }
}

/// Process-local table of live blob references.
#[derive(Debug, Default)]
pub struct BlobRegistry {
    next_id: AtomicU64,
    created: AtomicUsize,
    live: Mutex<HashMap<String, Blob>>,
}

impl BlobRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `blob` and return the handle that keeps it addressable.
    pub fn create(self: &Arc<Self>, blob: Blob) -> BlobHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let url = format!("blob:docx-filter/{id}");
        self.created.fetch_add(1, Ordering::SeqCst);
        self.table().insert(url.clone(), blob);
        trace!("Created {}", url);
        BlobHandle {
            registry: Arc::clone(self),
            url,
        }
    }

    /// Look up a live reference.
    pub fn resolve(&self, url: &str) -> Option<Blob> {
        self.table().get(url).cloned()
    }

    /// References created and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.table().len()
    }

    /// References ever created.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    fn revoke(&self, url: &str) {
        self.table().remove(url);
        trace!("Revoked {}", url);
    }

    // A panic while the lock is held cannot leave the map half-updated, so a
    // poisoned lock is still safe to use.
    fn table(&self) -> MutexGuard<'_, HashMap<String, Blob>> {
        self.live.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A live `blob:` reference. Revoked when dropped.
#[derive(Debug)]
pub struct BlobHandle {
    registry: Arc<BlobRegistry>,
    url: String,
}

impl BlobHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for BlobHandle {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}

/// The host's "save this file" action.
#[async_trait]
pub trait SaveSurface: Send + Sync {
    /// Save `blob` under `file_name`; return where it ended up.
    async fn save(&self, blob: Blob, file_name: &str) -> Result<PathBuf, DownloadError>;
}

/// Saves into a directory, atomically: temp file in the same directory, then
/// rename over the destination. A reader never sees a half-written document.
#[derive(Debug, Clone)]
pub struct DirectorySaveSurface {
    dir: PathBuf,
}

impl DirectorySaveSurface {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SaveSurface for DirectorySaveSurface {
    async fn save(&self, blob: Blob, file_name: &str) -> Result<PathBuf, DownloadError> {
        let dir = self.dir.clone();
        // Only the final component: a suggested name never escapes `dir`.
        let name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| DownloadError::SaveFailed {
                path: dir.join(file_name),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "file name has no final component",
                ),
            })?;
        let dest = dir.join(name);

        tokio::task::spawn_blocking(move || write_atomic(&dir, &dest, &blob.bytes).map(|_| dest))
            .await
            .map_err(|e| DownloadError::Interrupted(e.to_string()))?
    }
}

fn write_atomic(dir: &Path, dest: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    let fail = |source: std::io::Error| DownloadError::SaveFailed {
        path: dest.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(fail)?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".docx-filter-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(dest).map_err(|e| fail(e.error))?;
    Ok(())
}

/// What a successful download produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedDownload {
    pub path: PathBuf,
    pub bytes: usize,
    pub media_type: String,
}

/// Materialises a [`ProcessedResult`] through a [`SaveSurface`].
#[derive(Clone)]
pub struct DownloadEmitter {
    registry: Arc<BlobRegistry>,
    surface: Arc<dyn SaveSurface>,
}

impl std::fmt::Debug for DownloadEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadEmitter")
            .field("registry", &self.registry)
            .field("surface", &"<dyn SaveSurface>")
            .finish()
    }
}

impl DownloadEmitter {
    pub fn new(surface: Arc<dyn SaveSurface>) -> Self {
        Self {
            registry: BlobRegistry::new(),
            surface,
        }
    }

    /// Emitter saving into `dir` via [`DirectorySaveSurface`].
    pub fn to_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(DirectorySaveSurface::new(dir)))
    }

    pub fn registry(&self) -> &Arc<BlobRegistry> {
        &self.registry
    }

    /// Save `artifact` under its own file name and media type.
    ///
    /// # Errors
    /// - [`DownloadError::NoArtifact`] when `artifact` is `None`; no blob
    ///   reference is created
    /// - whatever the save surface reports
    pub async fn emit(
        &self,
        artifact: Option<&ProcessedResult>,
    ) -> Result<SavedDownload, DownloadError> {
        let artifact = artifact.ok_or(DownloadError::NoArtifact)?;

        let handle = self
            .registry
            .create(Blob::new(&artifact.document, artifact.media_type.clone()));
        debug!("Saving {} via {}", artifact.file_name, handle.url());

        let outcome = match self.registry.resolve(handle.url()) {
            Some(blob) => self.surface.save(blob, &artifact.file_name).await,
            None => Err(DownloadError::Interrupted(format!(
                "{} was revoked before saving",
                handle.url()
            ))),
        };
        drop(handle);

        let path = outcome?;
        info!("Saved {} bytes to {}", artifact.document.len(), path.display());
        Ok(SavedDownload {
            path,
            bytes: artifact.document.len(),
            media_type: artifact.media_type.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DOCX_MEDIA_TYPE, OUTPUT_FILE_NAME};

    fn artifact(bytes: &[u8]) -> ProcessedResult {
        ProcessedResult {
            html_content: "<p>ok</p>".into(),
            document: bytes.to_vec(),
            file_name: OUTPUT_FILE_NAME.into(),
            media_type: DOCX_MEDIA_TYPE.into(),
        }
    }

    struct FailingSurface;

    #[async_trait]
    impl SaveSurface for FailingSurface {
        async fn save(&self, _blob: Blob, file_name: &str) -> Result<PathBuf, DownloadError> {
            Err(DownloadError::SaveFailed {
                path: PathBuf::from(file_name),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
        }
    }

    struct PanickingSurface;

    #[async_trait]
    impl SaveSurface for PanickingSurface {
        async fn save(&self, _blob: Blob, _file_name: &str) -> Result<PathBuf, DownloadError> {
            panic!("save dialog crashed");
        }
    }

    /// Records the blob it was asked to save.
    #[derive(Default)]
    struct RecordingSurface {
        seen: Mutex<Vec<(Blob, String)>>,
    }

    #[async_trait]
    impl SaveSurface for RecordingSurface {
        async fn save(&self, blob: Blob, file_name: &str) -> Result<PathBuf, DownloadError> {
            self.seen.lock().unwrap().push((blob, file_name.to_string()));
            Ok(PathBuf::from(file_name))
        }
    }

    #[test]
    fn handle_is_revoked_on_drop() {
        let registry = BlobRegistry::new();
        let handle = registry.create(Blob::new(b"abc", "text/plain"));
        assert_eq!(registry.live_count(), 1);
        assert!(registry.resolve(handle.url()).is_some());

        let url = handle.url().to_string();
        drop(handle);
        assert_eq!(registry.live_count(), 0);
        assert!(registry.resolve(&url).is_none());
        assert_eq!(registry.created_count(), 1);
    }

    #[tokio::test]
    async fn no_artifact_creates_no_reference() {
        let emitter = DownloadEmitter::new(Arc::new(RecordingSurface::default()));
        let err = emitter.emit(None).await.unwrap_err();
        assert!(matches!(err, DownloadError::NoArtifact));
        assert_eq!(emitter.registry().created_count(), 0);
    }

    #[tokio::test]
    async fn surface_receives_tagged_blob_and_name() {
        let surface = Arc::new(RecordingSurface::default());
        let emitter = DownloadEmitter::new(surface.clone());

        let saved = emitter.emit(Some(&artifact(b"docx-bytes"))).await.unwrap();
        assert_eq!(saved.bytes, 10);
        assert_eq!(saved.media_type, DOCX_MEDIA_TYPE);

        let seen = surface.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(&*seen[0].0.bytes, b"docx-bytes");
        assert_eq!(seen[0].0.media_type, DOCX_MEDIA_TYPE);
        assert_eq!(seen[0].1, OUTPUT_FILE_NAME);
        assert_eq!(emitter.registry().live_count(), 0);
    }

    #[tokio::test]
    async fn reference_released_when_save_fails() {
        let emitter = DownloadEmitter::new(Arc::new(FailingSurface));
        let err = emitter.emit(Some(&artifact(b"x"))).await.unwrap_err();
        assert!(matches!(err, DownloadError::SaveFailed { .. }));
        assert_eq!(emitter.registry().created_count(), 1);
        assert_eq!(emitter.registry().live_count(), 0);
    }

    #[tokio::test]
    async fn reference_released_when_save_panics() {
        let emitter = Arc::new(DownloadEmitter::new(Arc::new(PanickingSurface)));
        let task_emitter = Arc::clone(&emitter);
        let joined = tokio::spawn(async move {
            let a = artifact(b"x");
            task_emitter.emit(Some(&a)).await
        })
        .await;

        assert!(joined.unwrap_err().is_panic());
        assert_eq!(emitter.registry().created_count(), 1);
        assert_eq!(emitter.registry().live_count(), 0);
    }

    #[tokio::test]
    async fn directory_surface_writes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = DownloadEmitter::to_dir(dir.path().join("nested"));

        let saved = emitter.emit(Some(&artifact(b"PK\x03\x04"))).await.unwrap();
        assert_eq!(saved.path, dir.path().join("nested").join(OUTPUT_FILE_NAME));
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"PK\x03\x04");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty(), "temp file must be renamed away");
    }

    #[tokio::test]
    async fn directory_surface_overwrites_previous_download() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = DownloadEmitter::to_dir(dir.path());

        emitter.emit(Some(&artifact(b"first"))).await.unwrap();
        let saved = emitter.emit(Some(&artifact(b"second"))).await.unwrap();
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn directory_surface_strips_path_components() {
        let dir = tempfile::tempdir().unwrap();
        let surface = DirectorySaveSurface::new(dir.path());
        let path = surface
            .save(Blob::new(b"x", DOCX_MEDIA_TYPE), "../escape.docx")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("escape.docx"));
    }
}
