//! Observer trait for submission and render events.
//!
//! Inject an [`Arc<dyn SubmissionObserver>`] via
//! [`crate::config::ClientConfigBuilder::observer`] to receive events as the
//! controller and the render loop make progress. The CLI uses it to drive a
//! spinner; a GUI host could forward events to its own event loop.
//!
//! # Example
//!
//! ```rust
//! use doc2chart::{ClientConfig, SubmissionObserver, SubmissionTicket};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     completed: AtomicUsize,
//! }
//!
//! impl SubmissionObserver for CountingObserver {
//!     fn on_submit_complete(&self, _ticket: SubmissionTicket, diagram_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("diagram received ({diagram_len} bytes)");
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver { completed: AtomicUsize::new(0) });
//! let config = ClientConfig::builder()
//!     .observer(observer as Arc<dyn SubmissionObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::store::{InputMode, SubmissionTicket};
use std::sync::Arc;

/// Coarse classification of a render outcome, for observers that do not need
/// the artifact itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Placeholder,
    Artifact,
    Error,
}

/// Called by the controller and the render loop.
///
/// All methods default to no-ops so implementors only override what they
/// need. Callbacks may arrive from different tokio worker threads.
pub trait SubmissionObserver: Send + Sync {
    /// A valid submission entered the in-flight state.
    fn on_submit_start(&self, ticket: SubmissionTicket, mode: InputMode) {
        let _ = (ticket, mode);
    }

    /// The submission committed a new diagram source of `diagram_len` bytes.
    fn on_submit_complete(&self, ticket: SubmissionTicket, diagram_len: usize) {
        let _ = (ticket, diagram_len);
    }

    /// The submission committed an error message, or input was rejected
    /// (`ticket` is `None` for validation failures).
    fn on_submit_error(&self, ticket: Option<SubmissionTicket>, message: &str) {
        let _ = (ticket, message);
    }

    /// The response arrived after a newer submission started and was dropped.
    fn on_submit_superseded(&self, ticket: SubmissionTicket) {
        let _ = ticket;
    }

    /// The preview surface was replaced.
    fn on_render(&self, kind: RenderKind) {
        let _ = kind;
    }
}

/// A no-op observer; the default when none is configured.
pub struct NoopObserver;

impl SubmissionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ObserverRef = Arc<dyn SubmissionObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Tracking {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        superseded: AtomicUsize,
        renders: AtomicUsize,
    }

    impl SubmissionObserver for Tracking {
        fn on_submit_start(&self, _ticket: SubmissionTicket, _mode: InputMode) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn on_submit_complete(&self, _ticket: SubmissionTicket, _diagram_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
        fn on_submit_error(&self, _ticket: Option<SubmissionTicket>, _message: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        fn on_submit_superseded(&self, _ticket: SubmissionTicket) {
            self.superseded.fetch_add(1, Ordering::SeqCst);
        }
        fn on_render(&self, _kind: RenderKind) {
            self.renders.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o = NoopObserver;
        o.on_submit_start(SubmissionTicket(1), InputMode::Text);
        o.on_submit_complete(SubmissionTicket(1), 12);
        o.on_submit_error(None, "Please enter some text");
        o.on_submit_superseded(SubmissionTicket(1));
        o.on_render(RenderKind::Placeholder);
    }

    #[test]
    fn tracking_observer_receives_events() {
        let t = Tracking::default();
        t.on_submit_start(SubmissionTicket(1), InputMode::Document);
        t.on_submit_start(SubmissionTicket(2), InputMode::Document);
        t.on_submit_superseded(SubmissionTicket(1));
        t.on_submit_complete(SubmissionTicket(2), 40);
        t.on_render(RenderKind::Artifact);

        assert_eq!(t.starts.load(Ordering::SeqCst), 2);
        assert_eq!(t.superseded.load(Ordering::SeqCst), 1);
        assert_eq!(t.completes.load(Ordering::SeqCst), 1);
        assert_eq!(t.errors.load(Ordering::SeqCst), 0);
        assert_eq!(t.renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_observer_works() {
        let o: ObserverRef = Arc::new(NoopObserver);
        o.on_render(RenderKind::Error);
    }
}
