//! The submission workflow: select → submit → preview → download.
//!
//! [`SubmissionController`] owns the one [`WorkflowState`] value and is the
//! only thing that mutates it. Transitions:
//!
//! ```text
//!            submit (no file)
//!   Idle ─────────────────────────────▶ Failed(no file)
//!    │  submit (file)
//!    ▼
//!   Validating ──▶ Submitting ──┬─ 2xx + decodes ──────▶ Succeeded(result)
//!                               ├─ 2xx, bad body ──────▶ Failed(decode)
//!                               ├─ 4xx/5xx ────────────▶ Failed(server message)
//!                               └─ network failure ────▶ Failed(transport message)
//! ```
//!
//! `Succeeded` and `Failed` are never left on their own; only another user
//! action (submit, select, reset) moves the workflow on.
//!
//! ## One submission at a time
//!
//! The busy check and the move to `Submitting` happen under the same lock,
//! before the only `.await`, so a second `submit` racing the first always
//! sees the busy state and is rejected with
//! [`DocxFilterError::SubmissionInFlight`] without reaching the transport.
//! Each submission also takes a generation token; [`reset`] bumps it, and a
//! response that comes back under an old token is dropped instead of being
//! applied to a workflow that has moved on.
//!
//! [`reset`]: SubmissionController::reset

use crate::config::ClientConfig;
use crate::error::{DocxFilterError, DownloadError, ValidationError};
use crate::observer::{Event, NoopObserver, SharedObserver};
use crate::pipeline::decode::{self, ProcessedResult};
use crate::pipeline::download::{DownloadEmitter, SavedDownload};
use crate::pipeline::select::{FileCandidate, FileSelector, SelectedFile};
use crate::pipeline::transport::{HttpTransport, Transport};
use crate::state::{
    Failure, FailureKind, FilterDirective, Phase, StatusLine, WorkflowSnapshot, WorkflowState,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info, warn};

pub const MSG_PROCESSING: &str = "Processing, please wait...";
pub const MSG_PROCESSED: &str = "Processing complete!";
pub const MSG_DECODE_FAILED: &str =
    "The processing service returned a response that could not be read.";
pub const MSG_DOWNLOAD_STARTED: &str = "Download started! Check your download folder.";
pub const MSG_NOTHING_TO_DOWNLOAD: &str = "There is no document to download.";
pub const MSG_CANCELLED: &str = "Submission was cancelled before the service answered.";

#[derive(Debug, Default)]
struct Inner {
    selector: FileSelector,
    filter: FilterDirective,
    state: WorkflowState,
    status: Option<StatusLine>,
    generation: u64,
}

impl Inner {
    fn transition(&mut self, next: WorkflowState, events: &mut Vec<Event>) {
        let from = self.state.phase();
        self.state = next;
        let to = self.state.phase();
        if from != to {
            debug!("Workflow {} → {}", from, to);
            events.push(Event::Phase(from, to));
        }
    }

    fn set_status(&mut self, status: Option<StatusLine>, events: &mut Vec<Event>) {
        if self.status != status {
            self.status = status.clone();
            events.push(Event::Status(status));
        }
    }

    fn fail(&mut self, failure: Failure, events: &mut Vec<Event>) {
        let status = StatusLine::error(format!("Error: {}", failure.message));
        self.transition(WorkflowState::Failed(failure), events);
        self.set_status(Some(status), events);
    }
}

/// Drives one document through the processing service.
///
/// All methods take `&self`; share the controller behind an `Arc` when the
/// host needs to submit from one task and render from another.
pub struct SubmissionController {
    transport: Arc<dyn Transport>,
    emitter: DownloadEmitter,
    observer: SharedObserver,
    inner: Mutex<Inner>,
}

impl SubmissionController {
    pub fn new(transport: Arc<dyn Transport>, emitter: DownloadEmitter) -> Self {
        Self {
            transport,
            emitter,
            observer: Arc::new(NoopObserver),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// HTTP transport to `config.endpoint`, downloads into `config.download_dir`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, DocxFilterError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(
            Arc::new(transport),
            DownloadEmitter::to_dir(config.download_dir.clone()),
        ))
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn emitter(&self) -> &DownloadEmitter {
        &self.emitter
    }

    // ── User actions ─────────────────────────────────────────────────────

    /// Validate and hold `candidate`, replacing any previous file.
    ///
    /// Outside a submission, any selection (accepted or not) discards the
    /// previous result and status: an accepted file returns the workflow to
    /// `Idle`, a rejected one moves it to `Failed` with the rejection
    /// message. During a submission the lifecycle is left alone: the held
    /// file changes (a rejection clears it and reports on the status line)
    /// and the in-flight request still completes with the file it was sent
    /// with.
    pub fn select(&self, candidate: FileCandidate) -> Result<Arc<SelectedFile>, ValidationError> {
        let mut events = Vec::new();
        let selection = {
            let mut inner = self.lock();
            let selection = inner.selector.select(candidate);
            if inner.state.is_busy() {
                if let Err(e) = &selection {
                    warn!("Rejected selection during submission: {}", e);
                    inner.set_status(Some(StatusLine::error(e.to_string())), &mut events);
                }
            } else {
                match &selection {
                    Ok(file) => {
                        info!("Selected {} ({} bytes)", file.name(), file.len());
                        inner.transition(WorkflowState::Idle, &mut events);
                        inner.set_status(None, &mut events);
                    }
                    Err(e) => {
                        warn!("Rejected selection: {}", e);
                        inner.fail(
                            Failure::new(FailureKind::InvalidExtension, e.to_string()),
                            &mut events,
                        );
                    }
                }
            }
            selection
        };
        self.dispatch(events);
        selection
    }

    /// Replace the filter directive. Never changes the lifecycle state.
    pub fn set_filter(&self, text: impl Into<FilterDirective>) {
        self.lock().filter = text.into();
    }

    /// Submit the held file with the current filter directive.
    ///
    /// The outcome is always recorded in the workflow state; it is also
    /// returned so callers can use `?`.
    ///
    /// # Errors
    /// - [`DocxFilterError::SubmissionInFlight`]: rejected at the boundary,
    ///   state untouched
    /// - [`ValidationError::NoFileSelected`]: no network call made
    /// - transport, service or decode failures from the exchange
    /// - [`DocxFilterError::Superseded`]: the workflow was reset while the
    ///   request was in flight and the response was discarded
    ///
    /// # Cancellation
    /// Dropping the returned future mid-request (a `timeout`, a losing
    /// `select!` branch, an aborted task) fails the submission with
    /// [`MSG_CANCELLED`] so the controller accepts the next `submit`.
    pub async fn submit(&self) -> Result<Arc<ProcessedResult>, DocxFilterError> {
        let mut events = Vec::new();
        let prepared = {
            let mut inner = self.lock();
            if inner.state.is_busy() {
                debug!("Submit rejected: already {}", inner.state.phase());
                return Err(DocxFilterError::SubmissionInFlight);
            }

            inner.transition(WorkflowState::Validating, &mut events);
            match inner.selector.current().cloned() {
                None => {
                    let err = ValidationError::NoFileSelected;
                    inner.fail(Failure::new(FailureKind::NoFile, err.to_string()), &mut events);
                    Err(err)
                }
                Some(file) => {
                    inner.generation += 1;
                    inner.transition(WorkflowState::Submitting, &mut events);
                    inner.set_status(Some(StatusLine::info(MSG_PROCESSING)), &mut events);
                    events.push(Event::SubmitStart(file.name().to_string(), file.len()));
                    Ok((file, inner.filter.clone(), inner.generation))
                }
            }
        };
        self.dispatch(events);
        let (file, filter, generation) = prepared?;

        let guard = InFlight::new(self, generation);
        let outcome = self.exchange(&file, &filter).await;
        guard.disarm();

        let mut events = Vec::new();
        let applied = {
            let mut inner = self.lock();
            if inner.generation != generation {
                warn!(
                    "Discarding response of submission {} (workflow is at {})",
                    generation, inner.generation
                );
                Err(DocxFilterError::Superseded)
            } else {
                match outcome {
                    Ok(result) => {
                        let result = Arc::new(result);
                        inner.transition(WorkflowState::Succeeded(Arc::clone(&result)), &mut events);
                        inner.set_status(Some(StatusLine::success(MSG_PROCESSED)), &mut events);
                        Ok(result)
                    }
                    Err(err) => {
                        inner.fail(failure_for(&err), &mut events);
                        Err(err)
                    }
                }
            }
        };
        self.dispatch(events);
        applied
    }

    /// Save the current result through the download emitter.
    ///
    /// Never touches the lifecycle state; only the status line reports the
    /// outcome. While a submission is running the status line keeps its
    /// progress message.
    pub async fn download(&self) -> Result<SavedDownload, DownloadError> {
        let artifact = self.lock().state.result().cloned();
        let outcome = self.emitter.emit(artifact.as_deref()).await;

        let mut events = Vec::new();
        {
            let mut inner = self.lock();
            let status = match &outcome {
                Ok(_) => StatusLine::success(MSG_DOWNLOAD_STARTED),
                Err(DownloadError::NoArtifact) => StatusLine::error(MSG_NOTHING_TO_DOWNLOAD),
                Err(e) => StatusLine::error(format!("Error downloading the file: {e}")),
            };
            if inner.state.is_busy() {
                debug!("Download during submission: {}", status.message);
            } else {
                inner.set_status(Some(status), &mut events);
            }
        }
        if let Ok(saved) = &outcome {
            events.push(Event::Download(saved.clone()));
        }
        self.dispatch(events);
        outcome
    }

    /// Back to the initial state: no file, empty filter, no result, no status.
    ///
    /// A submission still in flight is orphaned; its response is discarded.
    pub fn reset(&self) {
        let mut events = Vec::new();
        {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.selector.clear();
            inner.filter = FilterDirective::default();
            inner.transition(WorkflowState::Idle, &mut events);
            inner.set_status(None, &mut events);
        }
        info!("Workflow reset");
        self.dispatch(events);
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn state(&self) -> WorkflowState {
        self.lock().state.clone()
    }

    pub fn phase(&self) -> Phase {
        self.lock().state.phase()
    }

    pub fn status(&self) -> Option<StatusLine> {
        self.lock().status.clone()
    }

    pub fn selected_file(&self) -> Option<Arc<SelectedFile>> {
        self.lock().selector.current().cloned()
    }

    pub fn filter(&self) -> FilterDirective {
        self.lock().filter.clone()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let inner = self.lock();
        let result = inner.state.result();
        WorkflowSnapshot {
            file_name: inner.selector.current().map(|f| f.name().to_string()),
            filter: inner.filter.clone(),
            phase: inner.state.phase(),
            failure: inner.state.failure().cloned(),
            status: inner.status.clone(),
            preview_html: result.map(|r| r.html_content.clone()),
            document_bytes: result.map(|r| r.document_len()),
            can_submit: !inner.state.is_busy(),
            can_download: result.is_some(),
        }
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    async fn exchange(
        &self,
        file: &SelectedFile,
        filter: &FilterDirective,
    ) -> Result<ProcessedResult, DocxFilterError> {
        let start = Instant::now();
        let raw = self.transport.submit(file, filter).await?;
        let status = raw.status;
        let body = raw.into_success_body()?;
        let result = decode::decode(&body)?;
        info!(
            "Processed {} in {}ms (HTTP {}, {} bytes back)",
            file.name(),
            start.elapsed().as_millis(),
            status,
            result.document_len()
        );
        Ok(result)
    }

    /// Fail the submission of `generation` if it still owns the workflow.
    fn abandon(&self, generation: u64) {
        let mut events = Vec::new();
        {
            let mut inner = self.lock();
            if inner.generation != generation || !inner.state.is_busy() {
                return;
            }
            warn!("Submission {} dropped before the service answered", generation);
            inner.generation += 1;
            inner.fail(Failure::new(FailureKind::Transport, MSG_CANCELLED), &mut events);
        }
        self.dispatch(events);
    }

    // Observers run outside the lock, so a poisoned lock can only come from
    // a panic between whole-field assignments; the data is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn dispatch(&self, events: Vec<Event>) {
        for event in &events {
            event.deliver(self.observer.as_ref());
        }
    }
}

/// Held across the exchange; fails the submission if the future is dropped
/// before the response is applied.
struct InFlight<'a> {
    controller: &'a SubmissionController,
    generation: u64,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(controller: &'a SubmissionController, generation: u64) -> Self {
        Self {
            controller,
            generation,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.abandon(self.generation);
        }
    }
}

/// The user-facing failure for an exchange error.
fn failure_for(err: &DocxFilterError) -> Failure {
    match err {
        DocxFilterError::Transport(e) => {
            warn!("Transport failure: {}", e);
            Failure::new(FailureKind::Transport, e.message.clone())
        }
        DocxFilterError::Service(e) => {
            warn!("Service answered {}: {}", e.status, e.message);
            Failure::new(FailureKind::Service, e.message.clone())
        }
        DocxFilterError::Decode(e) => {
            warn!("Undecodable response: {}", e);
            Failure::new(FailureKind::Decode, MSG_DECODE_FAILED)
        }
        other => Failure::new(FailureKind::Transport, other.to_string()),
    }
}
