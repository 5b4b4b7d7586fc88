//! UI state store: the single source of truth for what is displayed.
//!
//! All mutation goes through the named transitions on [`UiStore`]. Readers
//! either take a [`UiSnapshot`] (a consistent clone of every field) or
//! subscribe to one of two `tokio::sync::watch` channels:
//!
//! * [`UiStore::subscribe`] fires on every transition;
//! * [`UiStore::subscribe_diagram`] fires only when the diagram source
//!   actually changes value, which is what the render loop listens to.
//!
//! ## Stale responses
//!
//! [`UiStore::begin_submission`] hands out a monotonically increasing
//! [`SubmissionTicket`]. `complete_submission` and `fail_submission` commit
//! only when their ticket is still the latest one and the store is in flight;
//! otherwise they return [`Commit::Stale`] and change nothing. The check and
//! the write happen under the same channel lock.

use crate::pipeline::input::DocumentUpload;
use serde::Serialize;
use std::fmt;
use tokio::sync::watch;
use tracing::debug;

/// Which input path is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Free text typed or pasted by the user. (default)
    #[default]
    Text,
    /// A PDF document uploaded as a file.
    Document,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::Text => f.write_str("text"),
            InputMode::Document => f.write_str("document"),
        }
    }
}

/// Lifecycle of the most recent submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

impl SubmissionState {
    /// Whether `self → next` is a legal transition.
    ///
    /// `InFlight → InFlight` is allowed: a newer submission supersedes the
    /// one in flight.
    pub fn can_transition_to(self, next: SubmissionState) -> bool {
        use SubmissionState::*;
        match next {
            InFlight => true,
            Succeeded | Failed => self == InFlight,
            Idle => false,
        }
    }
}

/// Sequence number of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SubmissionTicket(pub u64);

impl fmt::Display for SubmissionTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of committing a submission outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The outcome was written to the store.
    Applied,
    /// A newer submission exists (or none is in flight); nothing changed.
    Stale,
}

/// Both inputs, retained across mode switches.
///
/// Only the one selected by [`InputMode`] is used by a submission; switching
/// modes never clears the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserInput {
    pub text: String,
    pub document: Option<DocumentUpload>,
}

impl UserInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            document: None,
        }
    }

    pub fn document(document: DocumentUpload) -> Self {
        Self {
            text: String::new(),
            document: Some(document),
        }
    }
}

/// A consistent view of every store field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiSnapshot {
    pub mode: InputMode,
    pub input: UserInput,
    pub submission: SubmissionState,
    pub error_message: Option<String>,
    pub diagram_source: String,
    pub latest_ticket: Option<SubmissionTicket>,
}

impl UiSnapshot {
    /// Buttons show a loading state while this is true.
    pub fn is_loading(&self) -> bool {
        self.submission == SubmissionState::InFlight
    }
}

/// The UI state store.
pub struct UiStore {
    state: watch::Sender<UiSnapshot>,
    diagram: watch::Sender<String>,
}

impl Default for UiStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UiStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiStore")
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl UiStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(UiSnapshot::default());
        let (diagram, _) = watch::channel(String::new());
        Self { state, diagram }
    }

    // ── Reads ────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> UiSnapshot {
        self.state.borrow().clone()
    }

    pub fn diagram_source(&self) -> String {
        self.diagram.borrow().clone()
    }

    /// Receiver notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<UiSnapshot> {
        self.state.subscribe()
    }

    /// Receiver notified only when the diagram source changes value.
    ///
    /// The current value counts as seen; callers that must react to the
    /// initial value should read it with `borrow_and_update` first.
    pub fn subscribe_diagram(&self) -> watch::Receiver<String> {
        self.diagram.subscribe()
    }

    // ── Input transitions ────────────────────────────────────────────────

    pub fn set_mode(&self, mode: InputMode) {
        self.state.send_if_modified(|s| {
            if s.mode == mode {
                return false;
            }
            s.mode = mode;
            true
        });
    }

    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_modify(|s| s.input.text = text);
    }

    pub fn set_file(&self, document: Option<DocumentUpload>) {
        self.state.send_modify(|s| s.input.document = document);
    }

    /// Record a validation message without entering the in-flight state.
    pub fn reject_input(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|s| s.error_message = Some(message));
    }

    // ── Submission transitions ───────────────────────────────────────────

    /// Enter the in-flight state and return the new latest ticket.
    ///
    /// Any ticket handed out earlier becomes stale.
    pub fn begin_submission(&self) -> SubmissionTicket {
        let mut ticket = SubmissionTicket(0);
        self.state.send_modify(|s| {
            let next = s.latest_ticket.map_or(1, |t| t.0 + 1);
            ticket = SubmissionTicket(next);
            if s.submission == SubmissionState::InFlight {
                debug!("Submission {} supersedes one still in flight", ticket);
            }
            s.latest_ticket = Some(ticket);
            s.submission = SubmissionState::InFlight;
            s.error_message = None;
        });
        ticket
    }

    /// Commit a successful outcome: clear the error, mark succeeded, and
    /// replace the diagram source wholesale.
    pub fn complete_submission(
        &self,
        ticket: SubmissionTicket,
        diagram_text: impl Into<String>,
    ) -> Commit {
        let text = diagram_text.into();
        let mut commit = Commit::Stale;
        self.state.send_if_modified(|s| {
            if !self.is_current(s, ticket, SubmissionState::Succeeded) {
                return false;
            }
            s.submission = SubmissionState::Succeeded;
            s.error_message = None;
            s.diagram_source = text.clone();
            // Written under the state lock so a later ticket can never be
            // overtaken by this one.
            self.diagram.send_if_modified(|d| {
                if *d == text {
                    return false;
                }
                d.clone_from(&text);
                true
            });
            commit = Commit::Applied;
            true
        });
        if commit == Commit::Stale {
            debug!("Dropping stale completion for submission {}", ticket);
        }
        commit
    }

    /// Commit a failure: mark failed and surface `message`. The diagram
    /// source is left untouched.
    pub fn fail_submission(&self, ticket: SubmissionTicket, message: impl Into<String>) -> Commit {
        let message = message.into();
        let mut commit = Commit::Stale;
        self.state.send_if_modified(|s| {
            if !self.is_current(s, ticket, SubmissionState::Failed) {
                return false;
            }
            s.submission = SubmissionState::Failed;
            s.error_message = Some(message.clone());
            commit = Commit::Applied;
            true
        });
        if commit == Commit::Stale {
            debug!("Dropping stale failure for submission {}", ticket);
        }
        commit
    }

    fn is_current(&self, s: &UiSnapshot, ticket: SubmissionTicket, next: SubmissionState) -> bool {
        s.latest_ticket == Some(ticket) && s.submission.can_transition_to(next)
    }
}
