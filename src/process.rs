//! One-shot entry points: read a file, submit it, optionally save the result.
//!
//! These wrap a throwaway [`SubmissionController`] for callers that process
//! one document and exit, such as the CLI or a batch script. Hosts that keep
//! a workflow on screen should hold a controller themselves.

use crate::config::ClientConfig;
use crate::controller::SubmissionController;
use crate::error::DocxFilterError;
use crate::pipeline::decode::ProcessedResult;
use crate::pipeline::download::SavedDownload;
use crate::pipeline::select::FileCandidate;
use crate::state::FilterDirective;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Submit the `.docx` at `input` with `filter` and return the decoded result.
///
/// # Errors
/// - [`DocxFilterError::FileNotFound`] / [`DocxFilterError::PermissionDenied`]
///   / [`DocxFilterError::InputReadFailed`] when `input` cannot be read
/// - [`DocxFilterError::Validation`] when `input` is not a `.docx` file
/// - transport, service and decode failures from the exchange
pub async fn process_file(
    input: impl AsRef<Path>,
    filter: impl Into<FilterDirective>,
    config: &ClientConfig,
) -> Result<Arc<ProcessedResult>, DocxFilterError> {
    let candidate = FileCandidate::from_path(input.as_ref()).await?;
    process_candidate(candidate, filter.into(), config).await
}

/// Like [`process_file`] for a document that is already in memory.
pub async fn process_bytes(
    name: impl Into<String>,
    bytes: Vec<u8>,
    filter: impl Into<FilterDirective>,
    config: &ClientConfig,
) -> Result<Arc<ProcessedResult>, DocxFilterError> {
    let name = name.into();
    let media_type = crate::pipeline::select::media_type_for(&name);
    let candidate = FileCandidate::new(name, bytes, media_type);
    process_candidate(candidate, filter.into(), config).await
}

/// Submit `input` and save the processed document into
/// `config.download_dir`.
pub async fn process_to_dir(
    input: impl AsRef<Path>,
    filter: impl Into<FilterDirective>,
    config: &ClientConfig,
) -> Result<SavedDownload, DocxFilterError> {
    let controller = SubmissionController::from_config(config)?;
    controller.select(FileCandidate::from_path(input.as_ref()).await?)?;
    controller.set_filter(filter);
    controller.submit().await?;
    Ok(controller.download().await?)
}

/// Synchronous wrapper around [`process_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_file_sync(
    input: impl AsRef<Path>,
    filter: impl Into<FilterDirective>,
    config: &ClientConfig,
) -> Result<Arc<ProcessedResult>, DocxFilterError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocxFilterError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_file(input, filter, config))
}

/// Write the HTML preview of `result` to `path`.
///
/// Uses atomic write (temp file + rename) so a crash never leaves half a
/// preview behind.
pub async fn write_preview(
    result: &ProcessedResult,
    path: impl AsRef<Path>,
) -> Result<(), DocxFilterError> {
    let path = path.as_ref();
    let write_failed = |source| DocxFilterError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("html.tmp");
    tokio::fs::write(&tmp_path, &result.html_content)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_failed)?;

    info!("Wrote preview to {}", path.display());
    Ok(())
}

async fn process_candidate(
    candidate: FileCandidate,
    filter: FilterDirective,
    config: &ClientConfig,
) -> Result<Arc<ProcessedResult>, DocxFilterError> {
    let start = Instant::now();
    let controller = SubmissionController::from_config(config)?;
    controller.select(candidate)?;
    controller.set_filter(filter);
    let result = controller.submit().await?;
    info!("Done in {}ms", start.elapsed().as_millis());
    Ok(result)
}
