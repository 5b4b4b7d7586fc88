//! Submission controller: validate, send one request, commit the outcome.
//!
//! The controller is the only component that talks to the backend. It owns
//! no state of its own: every step is a named transition on the shared
//! [`UiStore`], in this order:
//!
//! ```text
//! validate ──✗──▶ reject_input                 (no network call)
//!    │
//!    ▼
//! begin_submission ──▶ backend ──▶ extract ──▶ complete_submission
//!                                     │
//!                                     └──✗──▶ fail_submission
//! ```
//!
//! Neither step can fail past this boundary: validation, transport and
//! response problems all end up as store state plus a
//! [`SubmissionOutcome`] for the caller. No retries are attempted; a retry is
//! simply another `submit`.

use crate::config::ClientConfig;
use crate::error::{TransportError, ValidationError};
use crate::pipeline::backend::DiagramBackend;
use crate::pipeline::extract::interpret_reply;
use crate::pipeline::input::DocumentUpload;
use crate::store::{Commit, InputMode, SubmissionTicket, UiStore, UserInput};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// What happened to one `submit` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Input failed validation; the store never entered the in-flight state.
    Rejected(ValidationError),
    /// The diagram source was committed.
    Completed {
        ticket: SubmissionTicket,
        diagram_source: String,
    },
    /// The failure message was committed.
    Failed {
        ticket: SubmissionTicket,
        error: TransportError,
        message: String,
    },
    /// A newer submission started before this one resolved; its result was
    /// dropped without touching the store.
    Superseded { ticket: SubmissionTicket },
}

impl SubmissionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SubmissionOutcome::Completed { .. })
    }

    /// The message shown next to the controls, if any.
    pub fn error_message(&self) -> Option<String> {
        match self {
            SubmissionOutcome::Rejected(e) => Some(e.to_string()),
            SubmissionOutcome::Failed { message, .. } => Some(message.clone()),
            _ => None,
        }
    }
}

enum Request<'a> {
    Text(&'a str),
    Document(&'a DocumentUpload),
}

/// Drives submissions against a [`DiagramBackend`].
pub struct SubmissionController {
    store: Arc<UiStore>,
    backend: Arc<dyn DiagramBackend>,
    config: ClientConfig,
}

impl SubmissionController {
    pub fn new(store: Arc<UiStore>, backend: Arc<dyn DiagramBackend>, config: ClientConfig) -> Self {
        Self {
            store,
            backend,
            config,
        }
    }

    pub fn store(&self) -> &Arc<UiStore> {
        &self.store
    }

    /// Submit whatever the store currently holds for its active mode.
    pub async fn submit_current(&self) -> SubmissionOutcome {
        let snapshot = self.store.snapshot();
        self.submit(snapshot.mode, &snapshot.input).await
    }

    /// Validate `input` for `mode`, issue exactly one request, and commit the
    /// result to the store.
    pub async fn submit(&self, mode: InputMode, input: &UserInput) -> SubmissionOutcome {
        let request = match validate(mode, input) {
            Ok(request) => request,
            Err(e) => {
                info!("Rejected {} submission: {}", mode, e);
                self.store.reject_input(e.to_string());
                if let Some(ref obs) = self.config.observer {
                    obs.on_submit_error(None, &e.to_string());
                }
                return SubmissionOutcome::Rejected(e);
            }
        };

        let ticket = self.store.begin_submission();
        info!("Submission {} started ({} mode)", ticket, mode);
        if let Some(ref obs) = self.config.observer {
            obs.on_submit_start(ticket, mode);
        }

        let result = self
            .send(request)
            .await
            .and_then(|reply| interpret_reply(&reply, &self.config));

        match result {
            Ok(diagram_source) => {
                match self.store.complete_submission(ticket, diagram_source.clone()) {
                    Commit::Applied => {
                        info!(
                            "Submission {} completed ({} bytes of diagram source)",
                            ticket,
                            diagram_source.len()
                        );
                        if let Some(ref obs) = self.config.observer {
                            obs.on_submit_complete(ticket, diagram_source.len());
                        }
                        SubmissionOutcome::Completed {
                            ticket,
                            diagram_source,
                        }
                    }
                    Commit::Stale => self.superseded(ticket),
                }
            }
            Err(error) => {
                let message = error.user_message();
                match self.store.fail_submission(ticket, message.clone()) {
                    Commit::Applied => {
                        warn!("Submission {} failed: {}", ticket, message);
                        if let Some(ref obs) = self.config.observer {
                            obs.on_submit_error(Some(ticket), &message);
                        }
                        SubmissionOutcome::Failed {
                            ticket,
                            error,
                            message,
                        }
                    }
                    Commit::Stale => self.superseded(ticket),
                }
            }
        }
    }

    async fn send(&self, request: Request<'_>) -> Result<crate::pipeline::backend::BackendReply, TransportError> {
        let secs = self.config.request_timeout_secs;
        let call = async {
            match request {
                Request::Text(text) => self.backend.process_text(text).await,
                Request::Document(doc) => self.backend.process_document(doc).await,
            }
        };
        // Backends are expected to enforce their own timeout; this bounds
        // the ones that do not.
        tokio::time::timeout(Duration::from_secs(secs), call)
            .await
            .unwrap_or(Err(TransportError::Timeout { secs }))
    }

    fn superseded(&self, ticket: SubmissionTicket) -> SubmissionOutcome {
        info!("Submission {} superseded; response dropped", ticket);
        if let Some(ref obs) = self.config.observer {
            obs.on_submit_superseded(ticket);
        }
        SubmissionOutcome::Superseded { ticket }
    }
}

fn validate(mode: InputMode, input: &UserInput) -> Result<Request<'_>, ValidationError> {
    match mode {
        InputMode::Text if input.text.trim().is_empty() => Err(ValidationError::EmptyText),
        InputMode::Text => Ok(Request::Text(&input.text)),
        InputMode::Document => input
            .document
            .as_ref()
            .map(Request::Document)
            .ok_or(ValidationError::MissingDocument),
    }
}
