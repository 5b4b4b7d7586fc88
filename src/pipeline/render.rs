//! Diagram rendering: diagram source → displayable outcome.
//!
//! ## Threading
//!
//! Compilation is synchronous CPU-bound work behind [`DiagramCompiler`] and
//! runs on tokio's blocking pool. A panicking compiler surfaces as a
//! `JoinError` and is reported as a render error.
//!
//! ## Ids
//!
//! Every compile call gets a fresh `mermaid-<n>` id from a process-wide
//! counter. Re-rendering the same source never reuses marker or style ids.

use crate::engine::DiagramCompiler;
use crate::error::RenderError;
use crate::progress::RenderKind;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

static NEXT_RENDER_ID: AtomicU64 = AtomicU64::new(1);

fn next_render_id() -> String {
    format!("mermaid-{}", NEXT_RENDER_ID.fetch_add(1, Ordering::Relaxed))
}

/// What the preview surface should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderOutcome {
    /// Nothing to render yet.
    Placeholder,
    /// Compiled SVG markup.
    Artifact { id: String, svg: String },
    /// Compilation failed; shown inside the preview only.
    Error(RenderError),
}

impl RenderOutcome {
    pub fn kind(&self) -> RenderKind {
        match self {
            RenderOutcome::Placeholder => RenderKind::Placeholder,
            RenderOutcome::Artifact { .. } => RenderKind::Artifact,
            RenderOutcome::Error(_) => RenderKind::Error,
        }
    }

    pub fn is_artifact(&self) -> bool {
        matches!(self, RenderOutcome::Artifact { .. })
    }
}

/// Wraps a [`DiagramCompiler`] with the placeholder / error policy.
#[derive(Clone)]
pub struct DiagramRenderer {
    compiler: Arc<dyn DiagramCompiler>,
}

impl DiagramRenderer {
    pub fn new(compiler: Arc<dyn DiagramCompiler>) -> Self {
        Self { compiler }
    }

    /// Render `source`. Never fails: compile errors become
    /// [`RenderOutcome::Error`].
    ///
    /// Empty or whitespace-only source yields [`RenderOutcome::Placeholder`]
    /// without calling the compiler.
    pub async fn render(&self, source: &str) -> RenderOutcome {
        if source.trim().is_empty() {
            return RenderOutcome::Placeholder;
        }

        let id = next_render_id();
        let compiler = Arc::clone(&self.compiler);
        let task_id = id.clone();
        let src = source.to_string();

        let joined =
            tokio::task::spawn_blocking(move || compiler.compile(&task_id, &src)).await;

        match joined {
            Ok(Ok(svg)) => {
                debug!("Rendered {} → {} bytes of SVG", id, svg.len());
                RenderOutcome::Artifact { id, svg }
            }
            Ok(Err(e)) => {
                warn!("Render {} failed: {}", id, e);
                RenderOutcome::Error(RenderError {
                    id,
                    message: e.to_string(),
                })
            }
            Err(e) => {
                warn!("Render {} task failed: {}", id, e);
                RenderOutcome::Error(RenderError {
                    id,
                    message: format!("diagram compiler crashed: {e}"),
                })
            }
        }
    }
}
