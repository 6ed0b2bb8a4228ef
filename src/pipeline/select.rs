//! File selection: validate a user-chosen file before it may be submitted.
//!
//! The document itself is an opaque blob to this crate. The only check made
//! locally is the file-name suffix; everything else (is it really a Word
//! file? is it too large?) is the processing service's call.

use crate::config::{ACCEPTED_EXTENSION, DOCX_MEDIA_TYPE};
use crate::error::{DocxFilterError, ValidationError};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A file reference chosen by the user, not yet validated.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Read a candidate from the local file system.
    ///
    /// The candidate's name is the final path component; its declared media
    /// type is guessed from that name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, DocxFilterError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DocxFilterError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => DocxFilterError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => DocxFilterError::InputReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = media_type_for(&name).to_string();
        debug!("Read candidate {} ({} bytes)", path.display(), bytes.len());

        Ok(Self {
            name,
            bytes,
            media_type,
        })
    }
}

/// A validated input file. Only [`select`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    bytes: Arc<[u8]>,
    media_type: String,
}

impl SelectedFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Accept `candidate` iff its name ends with [`ACCEPTED_EXTENSION`].
///
/// The match is case-sensitive: `REPORT.DOCX` is rejected.
pub fn select(candidate: FileCandidate) -> Result<SelectedFile, ValidationError> {
    if !has_accepted_extension(&candidate.name) {
        return Err(ValidationError::InvalidExtension {
            name: candidate.name,
            expected: ACCEPTED_EXTENSION.to_string(),
        });
    }
    Ok(SelectedFile {
        name: candidate.name,
        bytes: Arc::from(candidate.bytes),
        media_type: candidate.media_type,
    })
}

pub fn has_accepted_extension(name: &str) -> bool {
    name.ends_with(ACCEPTED_EXTENSION)
}

/// Declared media type for a file name.
pub fn media_type_for(name: &str) -> &'static str {
    if has_accepted_extension(name) {
        DOCX_MEDIA_TYPE
    } else {
        "application/octet-stream"
    }
}

/// Holds at most one accepted file.
///
/// Selection is destructive: a rejected pick clears whatever was held before,
/// so a stale accepted file is never shown next to an error.
#[derive(Debug, Default)]
pub struct FileSelector {
    current: Option<Arc<SelectedFile>>,
}

impl FileSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, candidate: FileCandidate) -> Result<Arc<SelectedFile>, ValidationError> {
        self.current = None;
        let file = Arc::new(select(candidate)?);
        self.current = Some(Arc::clone(&file));
        Ok(file)
    }

    pub fn current(&self) -> Option<&Arc<SelectedFile>> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
