//! Observer trait for workflow events.
//!
//! Inject an [`Arc<dyn WorkflowObserver>`] via
//! [`crate::SubmissionController::with_observer`] to follow the workflow as
//! it moves: phase changes, status-line updates, and completed downloads.
//! A GUI would re-render on these; the CLI drives a spinner with them.
//!
//! Events are delivered after the controller has released its internal lock,
//! so an observer may call back into the controller (e.g. `snapshot()`).
//!
//! # Example
//!
//! ```rust
//! use docx_filter::{Phase, WorkflowObserver};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct PhaseLog(Mutex<Vec<Phase>>);
//!
//! impl WorkflowObserver for PhaseLog {
//!     fn on_phase_change(&self, _from: Phase, to: Phase) {
//!         self.0.lock().unwrap().push(to);
//!     }
//! }
//! ```

use crate::pipeline::download::SavedDownload;
use crate::state::{Phase, StatusLine};
use std::sync::Arc;

/// Called by the controller as the workflow progresses.
///
/// All methods have default no-op implementations so implementors only
/// override what they care about.
pub trait WorkflowObserver: Send + Sync {
    /// The lifecycle moved from `from` to `to`.
    fn on_phase_change(&self, from: Phase, to: Phase) {
        let _ = (from, to);
    }

    /// The status line changed; `None` means it was cleared.
    fn on_status(&self, status: Option<&StatusLine>) {
        let _ = status;
    }

    /// A request is about to leave for the service.
    ///
    /// # Arguments
    /// * `file_name` — name of the submitted document
    /// * `bytes`     — size of the submitted document
    fn on_submit_start(&self, file_name: &str, bytes: usize) {
        let _ = (file_name, bytes);
    }

    /// The processed document was saved.
    fn on_download(&self, saved: &SavedDownload) {
        let _ = saved;
    }
}

/// A no-op observer. This is the default when none is configured.
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {}

/// Convenience alias for the type stored in the controller.
pub type SharedObserver = Arc<dyn WorkflowObserver>;

/// An event captured for delivery once the controller's lock is released.
#[derive(Debug, Clone)]
pub(crate) enum Event {
    Phase(Phase, Phase),
    Status(Option<StatusLine>),
    SubmitStart(String, usize),
    Download(SavedDownload),
}

impl Event {
    pub(crate) fn deliver(&self, observer: &dyn WorkflowObserver) {
        match self {
            Event::Phase(from, to) => observer.on_phase_change(*from, *to),
            Event::Status(status) => observer.on_status(status.as_ref()),
            Event::SubmitStart(name, bytes) => observer.on_submit_start(name, *bytes),
            Event::Download(saved) => observer.on_download(saved),
        }
    }
}
