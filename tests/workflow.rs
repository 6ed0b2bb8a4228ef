//! Workflow integration tests against a local mock of the processing service.
//!
//! Each test drives a real `SubmissionController` over `HttpTransport`; the
//! service is played by a `mockito` server so no network access is needed.
//!
//! Run with:
//!   cargo test --test workflow

use base64::{engine::general_purpose::STANDARD, Engine as _};
use docx_filter::config::{DOCX_MEDIA_TYPE, OUTPUT_FILE_NAME};
use docx_filter::{
    ClientConfig, DocxFilterError, DownloadError, FailureKind, FileCandidate, Phase,
    SubmissionController, ValidationError,
};
use mockito::{Matcher, Server, ServerGuard};
use std::path::Path;

// ── Test helpers ─────────────────────────────────────────────────────────────

const PATH: &str = "/process-document";

fn docx(name: &str) -> FileCandidate {
    FileCandidate::new(name, b"PK\x03\x04fake-docx".to_vec(), DOCX_MEDIA_TYPE)
}

fn success_body(html: &str, doc: &[u8]) -> String {
    serde_json::json!({
        "html_content": html,
        "docx_base64": STANDARD.encode(doc),
    })
    .to_string()
}

fn controller_for(server: &ServerGuard, dir: &Path) -> SubmissionController {
    let config = ClientConfig::builder()
        .endpoint(format!("{}{PATH}", server.url()))
        .download_dir(dir)
        .request_timeout_secs(10)
        .build()
        .expect("valid config");
    SubmissionController::from_config(&config).expect("controller")
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn filtered_document_is_previewed_and_saved() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"filename="report.docx""#.into()),
            Matcher::Regex(r#"name="format_text"\r\n\r\nConfidential\r\n"#.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success_body("<p>ok</p>", &[0x50, 0x4B, 0x03, 0x04]))
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());

    controller.select(docx("report.docx")).unwrap();
    controller.set_filter("Confidential");
    let result = controller.submit().await.expect("submission succeeds");
    mock.assert_async().await;

    assert_eq!(result.html_content, "<p>ok</p>");
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Succeeded);
    assert_eq!(snapshot.preview_html.as_deref(), Some("<p>ok</p>"));
    assert!(snapshot.can_download);

    let saved = controller.download().await.expect("download succeeds");
    assert_eq!(saved.path, dir.path().join(OUTPUT_FILE_NAME));
    assert_eq!(saved.media_type, DOCX_MEDIA_TYPE);
    assert_eq!(std::fs::read(&saved.path).unwrap(), [0x50, 0x4B, 0x03, 0x04]);
}

#[tokio::test]
async fn empty_filter_is_forwarded_as_is() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_body(Matcher::Regex(r#"name="format_text"\r\n\r\n\r\n"#.into()))
        .with_status(200)
        .with_body(success_body("<p>unchanged</p>", b"doc"))
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());
    controller.select(docx("memo.docx")).unwrap();
    controller.submit().await.unwrap();
    mock.assert_async().await;
}

// ── Local rejection ──────────────────────────────────────────────────────────

#[tokio::test]
async fn non_docx_file_never_reaches_the_service() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", PATH).expect(0).create_async().await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());

    let err = controller.select(docx("report.txt")).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidExtension { .. }));
    assert_eq!(
        controller.state().failure().unwrap().kind,
        FailureKind::InvalidExtension
    );

    let err = controller.submit().await.unwrap_err();
    assert!(matches!(
        err,
        DocxFilterError::Validation(ValidationError::NoFileSelected)
    ));
    mock.assert_async().await;
}

// ── Service and decode failures ──────────────────────────────────────────────

#[tokio::test]
async fn service_rejection_shows_its_message() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", PATH)
        .with_status(413)
        .with_body(r#"{"error":"file too large"}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());
    controller.select(docx("big.docx")).unwrap();

    let err = controller.submit().await.unwrap_err();
    assert!(matches!(err, DocxFilterError::Service(ref e) if e.status == 413));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Failed);
    assert_eq!(snapshot.failure.unwrap().message, "file too large");
    assert!(snapshot.status.unwrap().is_error());
    assert!(snapshot.can_submit);
}

#[tokio::test]
async fn service_failure_without_message_is_unknown_error() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", PATH)
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());
    controller.select(docx("report.docx")).unwrap();
    assert!(controller.submit().await.is_err());

    assert_eq!(
        controller.state().failure().unwrap().message,
        "Unknown server error."
    );
}

#[tokio::test]
async fn success_without_document_is_a_decode_failure() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(r#"{"html_content":"x"}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());
    controller.select(docx("report.docx")).unwrap();

    let err = controller.submit().await.unwrap_err();
    assert!(matches!(err, DocxFilterError::Decode(_)));
    assert_eq!(
        controller.state().failure().unwrap().kind,
        FailureKind::Decode
    );
    assert!(!controller.snapshot().can_download);

    let err = controller.download().await.unwrap_err();
    assert!(matches!(err, DownloadError::NoArtifact));
    assert!(!dir.path().join(OUTPUT_FILE_NAME).exists());
}

#[tokio::test]
async fn corrupt_base64_is_a_decode_failure() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(r#"{"html_content":"<p>x</p>","docx_base64":"ab$d"}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());
    controller.select(docx("report.docx")).unwrap();

    assert!(matches!(
        controller.submit().await,
        Err(DocxFilterError::Decode(_))
    ));
    assert!(controller.snapshot().preview_html.is_none());
}

#[tokio::test]
async fn unreachable_service_is_a_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::builder()
        .endpoint(format!("http://{addr}{PATH}"))
        .download_dir(dir.path())
        .build()
        .unwrap();
    let controller = SubmissionController::from_config(&config).unwrap();
    controller.select(docx("report.docx")).unwrap();

    assert!(matches!(
        controller.submit().await,
        Err(DocxFilterError::Transport(_))
    ));
    assert_eq!(
        controller.state().failure().unwrap().kind,
        FailureKind::Transport
    );
}

// ── Download without a result ────────────────────────────────────────────────

#[tokio::test]
async fn download_before_processing_reports_nothing_to_save() {
    let server = Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());

    let err = controller.download().await.unwrap_err();
    assert!(matches!(err, DownloadError::NoArtifact));
    assert_eq!(controller.emitter().registry().created_count(), 0);
    assert!(controller.status().unwrap().is_error());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

// ── Resubmission ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_attempt_can_be_resubmitted() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", PATH)
        .match_body(Matcher::Regex(r#"name="format_text"\r\n\r\nfirst\r\n"#.into()))
        .with_status(500)
        .with_body(r#"{"error":"model overloaded"}"#)
        .expect(1)
        .create_async()
        .await;
    let succeeding = server
        .mock("POST", PATH)
        .match_body(Matcher::Regex(r#"name="format_text"\r\n\r\nsecond\r\n"#.into()))
        .with_status(200)
        .with_body(success_body("<p>second try</p>", b"doc"))
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());
    controller.select(docx("report.docx")).unwrap();

    controller.set_filter("first");
    assert!(controller.submit().await.is_err());
    assert_eq!(
        controller.state().failure().unwrap().message,
        "model overloaded"
    );

    controller.set_filter("second");
    let result = controller.submit().await.unwrap();
    assert_eq!(result.html_content, "<p>second try</p>");
    assert_eq!(controller.phase(), Phase::Succeeded);

    failing.assert_async().await;
    succeeding.assert_async().await;
}

// ── Blocking callers ─────────────────────────────────────────────────────────

#[test]
fn snapshot_is_available_from_sync_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::builder()
        .download_dir(dir.path())
        .build()
        .unwrap();
    let controller = SubmissionController::from_config(&config).unwrap();

    let err = tokio_test::block_on(controller.submit()).unwrap_err();
    assert!(matches!(err, DocxFilterError::Validation(_)));
    assert_eq!(controller.snapshot().phase, Phase::Failed);
}
