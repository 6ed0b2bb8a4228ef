//! Response decoding: service JSON → preview fragment + document bytes.
//!
//! The service returns the processed document as standard base64 inside a
//! JSON object, next to an HTML rendering of it:
//!
//! ```json
//! { "html_content": "<p>…</p>", "docx_base64": "UEsDBBQA…" }
//! ```
//!
//! The HTML is a trust boundary: it is passed through verbatim and never
//! parsed, sanitised or validated here. Rendering it safely is the preview
//! surface's job.

use crate::config::{DOCX_MEDIA_TYPE, OUTPUT_FILE_NAME};
use crate::error::DecodeError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The decoded output of one successful submission.
///
/// File name and media type are constants of this client; they are never
/// taken from the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedResult {
    /// Renderable markup, verbatim from the service.
    pub html_content: String,
    /// The processed document.
    #[serde(skip)]
    pub document: Vec<u8>,
    /// Suggested file name for saving.
    pub file_name: String,
    /// Media type of `document`.
    pub media_type: String,
}

impl ProcessedResult {
    pub fn document_len(&self) -> usize {
        self.document.len()
    }
}

#[derive(Deserialize)]
struct SuccessBody {
    html_content: String,
    docx_base64: String,
}

/// Decode a success-status response body.
///
/// # Errors
/// - [`DecodeError::MalformedResponse`] if the body is not a JSON object with
///   string fields `html_content` and `docx_base64`
/// - [`DecodeError::InvalidBase64`] if `docx_base64` is not canonical
///   standard-alphabet base64 (bad characters, bad padding)
pub fn decode(body: &[u8]) -> Result<ProcessedResult, DecodeError> {
    let parsed: SuccessBody =
        serde_json::from_slice(body).map_err(|e| DecodeError::MalformedResponse {
            detail: e.to_string(),
        })?;

    let document = decode_base64(&parsed.docx_base64)?;
    debug!(
        "Decoded response → {} bytes document, {} bytes preview",
        document.len(),
        parsed.html_content.len()
    );

    Ok(ProcessedResult {
        html_content: parsed.html_content,
        document,
        file_name: OUTPUT_FILE_NAME.to_string(),
        media_type: DOCX_MEDIA_TYPE.to_string(),
    })
}

/// Standard-alphabet base64 with canonical padding.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| DecodeError::InvalidBase64 {
            detail: e.to_string(),
        })
}
