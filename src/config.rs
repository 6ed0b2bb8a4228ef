//! Configuration for talking to the processing service.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. Wire-level names (multipart field names, accepted
//! suffix, output file identity) are constants of this client and live here as
//! `pub const` items rather than config fields: the service contract fixes
//! them.

use crate::error::DocxFilterError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Development address of the processing service.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/process-document";

/// The only accepted input suffix (matched case-sensitively).
pub const ACCEPTED_EXTENSION: &str = ".docx";

/// Multipart field carrying the document bytes.
pub const FILE_FIELD: &str = "file";

/// Multipart field carrying the filter directive.
pub const FILTER_FIELD: &str = "format_text";

/// File name every processed document is saved under.
pub const OUTPUT_FILE_NAME: &str = "documento_corregido.docx";

/// Media type of Word-processing documents.
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Configuration for a [`crate::SubmissionController`].
///
/// Built via [`ClientConfig::builder()`] or using [`ClientConfig::default()`].
///
/// # Example
/// ```rust
/// use docx_filter::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .endpoint("https://docs.example.com/process-document")
///     .request_timeout_secs(90)
///     .download_dir("out")
///     .build()
///     .unwrap();
/// assert_eq!(config.request_timeout_secs, Some(90));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Full URL of the processing endpoint. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Per-request timeout in seconds. Default: `None`.
    ///
    /// With `None` a hung service keeps the workflow in `Submitting`
    /// indefinitely; the core itself never gives up on a request.
    pub request_timeout_secs: Option<u64>,

    /// Directory the default save surface writes downloads into. Default: `.`.
    pub download_dir: PathBuf,

    /// `User-Agent` header sent with every submission.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: None,
            download_dir: PathBuf::from("."),
            user_agent: format!("docx-filter/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, DocxFilterError> {
        let c = &self.config;
        let url = reqwest::Url::parse(&c.endpoint).map_err(|e| {
            DocxFilterError::InvalidConfig(format!("endpoint '{}' is not a URL: {}", c.endpoint, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(DocxFilterError::InvalidConfig(format!(
                "endpoint must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(DocxFilterError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
