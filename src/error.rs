//! Error types for the docx-filter library.
//!
//! Each component owns a small error enum that names exactly the ways it can
//! fail:
//!
//! * [`ValidationError`] — local input problems (bad extension, no file).
//!   Never reaches the network.
//! * [`TransportError`] — the processing service could not be reached.
//! * [`ServiceError`] — the service answered with a non-success status.
//! * [`DecodeError`] — the service answered "success" but the body breaks the
//!   response contract.
//! * [`DownloadError`] — the decoded document could not be saved.
//!
//! [`DocxFilterError`] wraps all of them for callers that just want `?`.
//! Every kind is terminal for the current attempt: nothing here is retried.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docx-filter library.
#[derive(Debug, Error)]
pub enum DocxFilterError {
    // ── Component errors ─────────────────────────────────────────────────
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    // ── Workflow errors ──────────────────────────────────────────────────
    /// A submission is already in flight; the request was rejected at the
    /// boundary and the workflow state was not touched.
    #[error("A submission is already in progress; wait for it to finish")]
    SubmissionInFlight,

    /// The response arrived after the workflow was reset and was discarded.
    #[error("Submission was superseded by a reset and its response was discarded")]
    Superseded,

    // ── Input errors ─────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Input file exists but could not be read (a directory, an I/O fault).
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── I/O errors ───────────────────────────────────────────────────────
    /// Could not write the HTML preview file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Rejections produced before anything is sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The chosen file does not carry the accepted suffix.
    #[error("'{name}' is not a {expected} file. Please select a valid {expected} file.")]
    InvalidExtension { name: String, expected: String },

    /// Submit was requested with no file selected.
    #[error("Please select a .docx file first.")]
    NoFileSelected,
}

/// How a network exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, reset, or DNS failure.
    Connect,
    /// The configured request timeout elapsed.
    Timeout,
    /// The request could not be built (bad media type, bad URL).
    Request,
    /// Anything else reported by the HTTP stack, including body read errors.
    Other,
}

/// The processing service could not be reached.
///
/// `message` keeps the full cause chain of the underlying HTTP error so the
/// user sees e.g. "Connection refused" rather than a bare "error sending
/// request".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a reqwest error and flatten its source chain into one line.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_builder() {
            TransportErrorKind::Request
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, error_chain(err))
    }
}

/// The service answered with a non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub status: u16,
    pub message: String,
}

/// A success response whose body does not honour the response contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Body is not JSON, or `html_content` / `docx_base64` is missing.
    #[error("Malformed response from the processing service: {detail}")]
    MalformedResponse { detail: String },

    /// `docx_base64` is not canonical standard-alphabet base64.
    #[error("Document payload is not valid base64: {detail}")]
    InvalidBase64 { detail: String },
}

/// The decoded document could not be handed to the save surface.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Download requested before any successful submission.
    #[error("There is no processed document to download.")]
    NoArtifact,

    /// The save surface failed to write the file.
    #[error("Failed to save '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The background save task died before reporting back.
    #[error("Save task failed: {0}")]
    Interrupted(String),
}

/// Join an error and all of its sources with ": ".
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = cause.source();
    }
    msg
}
