//! Network exchange with the processing service.
//!
//! A [`Transport`] sends one multipart POST and hands back the raw status and
//! body. It never retries and never interprets a success body; classification
//! of failure bodies lives on [`RawResponse`] so every transport shares it.
//!
//! The request carries exactly two parts:
//!
//! | field         | content                                  |
//! |---------------|------------------------------------------|
//! | `file`        | document bytes, with file name and type  |
//! | `format_text` | the filter directive, possibly empty     |

use crate::config::{ClientConfig, FILE_FIELD, FILTER_FIELD};
use crate::error::{DocxFilterError, ServiceError, TransportError, TransportErrorKind};
use crate::pipeline::select::SelectedFile;
use crate::state::FilterDirective;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Message used when a failure body carries no usable `error` field.
pub const UNKNOWN_SERVICE_ERROR: &str = "Unknown server error.";

/// Status and body exactly as the service sent them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Deserialize)]
struct FailureBody {
    error: Option<String>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Return the body of a success response, or the service's complaint.
    ///
    /// A failure body is read as `{"error": "..."}`; a body that is not JSON,
    /// lacks the field, or carries an empty message yields
    /// [`UNKNOWN_SERVICE_ERROR`].
    pub fn into_success_body(self) -> Result<Vec<u8>, ServiceError> {
        if self.is_success() {
            return Ok(self.body);
        }
        let message = serde_json::from_slice::<FailureBody>(&self.body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNKNOWN_SERVICE_ERROR.to_string());
        Err(ServiceError {
            status: self.status,
            message,
        })
    }
}

/// The request/response boundary to the processing service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `file` and `filter`; resolve with whatever the service answered.
    ///
    /// Only network-level failures are errors. A 4xx/5xx answer is a normal
    /// [`RawResponse`].
    async fn submit(
        &self,
        file: &SelectedFile,
        filter: &FilterDirective,
    ) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] over HTTP(S) using reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, DocxFilterError> {
        let endpoint = reqwest::Url::parse(&config.endpoint)
            .map_err(|e| DocxFilterError::InvalidConfig(format!("endpoint: {e}")))?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| DocxFilterError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    fn build_form(file: &SelectedFile, filter: &FilterDirective) -> Result<Form, TransportError> {
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.media_type())
            .map_err(|e| {
                TransportError::new(
                    TransportErrorKind::Request,
                    format!("invalid media type '{}': {}", file.media_type(), e),
                )
            })?;

        Ok(Form::new()
            .part(FILE_FIELD, part)
            .text(FILTER_FIELD, filter.as_str().to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(
        &self,
        file: &SelectedFile,
        filter: &FilterDirective,
    ) -> Result<RawResponse, TransportError> {
        let form = Self::build_form(file, filter)?;

        info!(
            endpoint = %self.endpoint,
            file = file.name(),
            bytes = file.len(),
            filtered = !filter.is_empty(),
            "Submitting document"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                let err = TransportError::from_reqwest(&e);
                warn!("Request failed: {}", err);
                err
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        debug!("Service answered {} with {} bytes", status, body.len());
        Ok(RawResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}
