//! One analysis session: candidate ownership, the uploading/analyzing
//! status machine, and the single-in-flight guarantee.

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use pagevoice_analysis::AnalysisClient;
use pagevoice_core::{AnalysisError, AnalysisOutcome, AnalysisStatus, ImageCandidate};
use pagevoice_media::{encode_candidate, validate_candidate, PreviewHandle};

/// UI-facing view of the session, published on every transition.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SessionSnapshot {
    pub status: AnalysisStatus,
    pub file_name: Option<String>,
    pub outcome: Option<AnalysisOutcome>,
    pub error: Option<String>,
}

#[derive(Default)]
struct SessionState {
    status: AnalysisStatus,
    candidate: Option<ImageCandidate>,
    preview: Option<PreviewHandle>,
    outcome: Option<AnalysisOutcome>,
    error: Option<String>,
}

impl SessionState {
    fn in_flight(&self) -> bool {
        matches!(self.status, AnalysisStatus::Uploading | AnalysisStatus::Analyzing)
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            file_name: self.candidate.as_ref().map(|c| c.file_name.clone()),
            outcome: self.outcome.clone(),
            error: self.error.clone(),
        }
    }
}

/// Drives validator, encoder, and analysis client for one session.
///
/// The lock is never held across a suspension point; the status field is
/// the re-entrancy guard, so a second trigger while one attempt is in
/// flight returns immediately without touching the provider.
pub struct RequestOrchestrator {
    client: AnalysisClient,
    state: Mutex<SessionState>,
    updates: watch::Sender<SessionSnapshot>,
}

impl RequestOrchestrator {
    pub fn new(client: AnalysisClient) -> Self {
        let (updates, _) = watch::channel(SessionSnapshot::default());
        Self {
            client,
            state: Mutex::new(SessionState::default()),
            updates,
        }
    }

    /// Observe session snapshots as they are published.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Attach (or replace) the candidate image. Rejected while an analysis
    /// attempt is in flight. Clears any prior outcome or error.
    pub async fn submit_image(&self, candidate: ImageCandidate) -> bool {
        let mut state = self.state.lock().await;
        if state.in_flight() {
            warn!("cannot replace the image while analysis is in flight");
            return false;
        }
        info!(file = %candidate.file_name, mime = %candidate.mime_type, "image selected");
        state.candidate = Some(candidate);
        state.preview = None; // superseded preview is released here
        state.outcome = None;
        state.error = None;
        state.status = AnalysisStatus::Idle;
        self.publish(&state);
        true
    }

    /// Run one full attempt: validate, encode, analyze. No-op when no
    /// candidate is attached or an attempt is already in flight. Every
    /// failure is terminal for the attempt; the session ends in `complete`
    /// or `error`, never anywhere else.
    pub async fn trigger_analysis(&self) {
        let candidate = {
            let mut state = self.state.lock().await;
            if state.in_flight() {
                debug!("analysis already in flight; ignoring trigger");
                return;
            }
            let Some(candidate) = state.candidate.clone() else {
                warn!("no image selected; ignoring trigger");
                return;
            };
            state.outcome = None;
            state.error = None;
            state.status = AnalysisStatus::Uploading;
            self.publish(&state);
            candidate
        };

        if let Err(e) = validate_candidate(&candidate) {
            self.fail(e).await;
            return;
        }

        let (encoded, preview) = match encode_candidate(&candidate).await {
            Ok(pair) => pair,
            Err(e) => {
                self.fail(e).await;
                return;
            }
        };

        {
            let mut state = self.state.lock().await;
            state.preview = Some(preview);
            state.status = AnalysisStatus::Analyzing;
            self.publish(&state);
        }

        let outcome = self.client.analyze(&encoded, &candidate.file_name).await;

        let mut state = self.state.lock().await;
        match &outcome {
            AnalysisOutcome::Success { content, .. } => {
                info!(len = content.len(), "analysis attempt complete");
                state.status = AnalysisStatus::Complete;
            }
            AnalysisOutcome::Failure { message, .. } => {
                warn!(%message, "analysis attempt failed");
                state.status = AnalysisStatus::Error;
                state.error = Some(message.clone());
            }
        }
        state.outcome = Some(outcome);
        self.publish(&state);
    }

    /// Discard candidate, preview, outcome, and error; back to idle.
    /// Valid from any state.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = SessionState::default();
        self.publish(&state);
    }

    async fn fail(&self, error: AnalysisError) {
        let mut state = self.state.lock().await;
        let message = error.to_string();
        warn!(%message, "analysis attempt failed before provider call");
        state.outcome = Some(AnalysisOutcome::Failure {
            code: error.code(),
            message: message.clone(),
        });
        state.error = Some(message);
        state.status = AnalysisStatus::Error;
        self.publish(&state);
    }

    fn publish(&self, state: &SessionState) {
        let _ = self.updates.send(state.snapshot());
    }
}
