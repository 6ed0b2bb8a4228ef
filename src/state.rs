//! Workflow state: one tagged value instead of scattered flags.
//!
//! A flag-per-concern design ("processing", "error", "success", "has
//! preview") can hold combinations that make no sense, such as error and
//! success at once. [`WorkflowState`] holds exactly one phase, and the result
//! of a successful submission lives *inside* `Succeeded` so it cannot outlive
//! it.

use crate::pipeline::decode::ProcessedResult;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Free-text instruction forwarded to the service as-is.
///
/// Empty means "no filtering". There is no other validity rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterDirective(String);

impl FilterDirective {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for FilterDirective {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FilterDirective {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Why the last attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoFile,
    InvalidExtension,
    Transport,
    Service,
    Decode,
}

/// Payload of [`WorkflowState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Where the submission lifecycle currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded(Arc<ProcessedResult>),
    Failed(Failure),
}

impl WorkflowState {
    pub fn phase(&self) -> Phase {
        match self {
            WorkflowState::Idle => Phase::Idle,
            WorkflowState::Validating => Phase::Validating,
            WorkflowState::Submitting => Phase::Submitting,
            WorkflowState::Succeeded(_) => Phase::Succeeded,
            WorkflowState::Failed(_) => Phase::Failed,
        }
    }

    /// True while a submission owns the controller.
    pub fn is_busy(&self) -> bool {
        matches!(self, WorkflowState::Validating | WorkflowState::Submitting)
    }

    pub fn result(&self) -> Option<&Arc<ProcessedResult>> {
        match self {
            WorkflowState::Succeeded(r) => Some(r),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            WorkflowState::Failed(f) => Some(f),
            _ => None,
        }
    }
}

/// Payload-free discriminant of [`WorkflowState`], cheap to copy into events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Validating => "validating",
            Phase::Submitting => "submitting",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// The single status message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub message: String,
}

impl StatusLine {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

/// Read-only view of the controller for hosts to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowSnapshot {
    pub file_name: Option<String>,
    pub filter: FilterDirective,
    pub phase: Phase,
    pub failure: Option<Failure>,
    pub status: Option<StatusLine>,
    pub preview_html: Option<String>,
    /// Size of the decoded document, when there is one.
    pub document_bytes: Option<usize>,
    pub can_submit: bool,
    pub can_download: bool,
}
