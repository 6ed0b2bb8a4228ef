//! End-to-end integration tests for docx-filter.
//!
//! These tests submit real `.docx` files from `./test_cases/` to a running
//! processing service. They are gated behind the `E2E_ENABLED` environment
//! variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! Point them at another service with `DOCX_FILTER_ENDPOINT`.

use docx_filter::config::{DEFAULT_ENDPOINT, OUTPUT_FILE_NAME};
use docx_filter::{
    process_file, process_to_dir, ClientConfig, DocxFilterError, FileCandidate, Phase,
    SubmissionController,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn endpoint() -> String {
    std::env::var("DOCX_FILTER_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string())
}

fn live_config(dir: &std::path::Path) -> ClientConfig {
    ClientConfig::builder()
        .endpoint(endpoint())
        .download_dir(dir)
        .request_timeout_secs(300)
        .build()
        .expect("valid config")
}

/// Skip this test if E2E_ENABLED is not set *or* no document at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// A `.docx` is a zip archive; anything else is not a Word document.
fn assert_looks_like_docx(bytes: &[u8], context: &str) {
    assert!(
        bytes.starts_with(b"PK\x03\x04"),
        "[{context}] Returned document is not a zip archive"
    );
    println!("[{context}] ✓  {} bytes, zip signature present", bytes.len());
}

// ── Live round trips ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unfiltered_round_trip() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.docx"));
    let dir = tempfile::tempdir().unwrap();

    let result = process_file(&path, "", &live_config(dir.path()))
        .await
        .expect("process_file() should succeed");

    assert!(!result.html_content.trim().is_empty(), "preview is empty");
    assert_looks_like_docx(&result.document, "unfiltered");
}

#[tokio::test]
async fn test_filtered_round_trip_is_saved() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.docx"));
    let dir = tempfile::tempdir().unwrap();

    let saved = process_to_dir(
        &path,
        "Remove every paragraph that mentions a date",
        &live_config(dir.path()),
    )
    .await
    .expect("process_to_dir() should succeed");

    assert_eq!(saved.path, dir.path().join(OUTPUT_FILE_NAME));
    let bytes = std::fs::read(&saved.path).unwrap();
    assert_eq!(bytes.len(), saved.bytes);
    assert_looks_like_docx(&bytes, "filtered");
}

#[tokio::test]
async fn test_service_rejects_non_document() {
    // The bytes are not a Word document, but the name passes the local check,
    // so only the service can reject it.
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let controller = SubmissionController::from_config(&live_config(dir.path())).unwrap();
    controller
        .select(FileCandidate::new(
            "garbage.docx",
            b"not a zip".to_vec(),
            docx_filter::config::DOCX_MEDIA_TYPE,
        ))
        .unwrap();

    match controller.submit().await {
        Err(DocxFilterError::Service(e)) => {
            println!("Service said ({}): {}", e.status, e.message);
            assert_eq!(controller.phase(), Phase::Failed);
        }
        other => panic!("expected a service rejection, got {other:?}"),
    }
}
