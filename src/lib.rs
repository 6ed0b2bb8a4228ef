//! # docx-filter
//!
//! Client for a remote Word-document processing service: pick a `.docx`,
//! send it together with free-text filtering instructions, preview the HTML
//! the service renders, and save the processed document it sends back.
//!
//! ## Workflow
//!
//! ```text
//! .docx
//!  │
//!  ├─ 1. Select    extension check only; the document stays opaque
//!  ├─ 2. Submit    multipart POST {file, format_text}, one at a time
//!  ├─ 3. Decode    {html_content, docx_base64} → preview + bytes
//!  └─ 4. Download  bytes → documento_corregido.docx in the download dir
//! ```
//!
//! Every step's outcome lands in a single [`WorkflowState`] owned by the
//! [`SubmissionController`]; hosts render from [`WorkflowSnapshot`] and
//! listen for changes through a [`WorkflowObserver`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docx_filter::{process_to_dir, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .endpoint("http://localhost:5000/process-document")
//!         .download_dir("out")
//!         .build()?;
//!     let saved = process_to_dir("report.docx", "Remove personal data", &config).await?;
//!     eprintln!("saved {} bytes to {}", saved.bytes, saved.path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docx-filter` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! docx-filter = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod error;
pub mod observer;
pub mod pipeline;
pub mod process;
pub mod state;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder};
pub use controller::SubmissionController;
pub use error::{
    DecodeError, DocxFilterError, DownloadError, ServiceError, TransportError, TransportErrorKind,
    ValidationError,
};
pub use observer::{NoopObserver, SharedObserver, WorkflowObserver};
pub use pipeline::decode::ProcessedResult;
pub use pipeline::download::{
    Blob, BlobHandle, BlobRegistry, DirectorySaveSurface, DownloadEmitter, SaveSurface,
    SavedDownload,
};
pub use pipeline::select::{FileCandidate, SelectedFile};
pub use pipeline::transport::{HttpTransport, RawResponse, Transport};
pub use process::{process_bytes, process_file, process_file_sync, process_to_dir, write_preview};
pub use state::{
    Failure, FailureKind, FilterDirective, Phase, StatusKind, StatusLine, WorkflowSnapshot,
    WorkflowState,
};
