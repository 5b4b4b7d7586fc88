//! # doc2chart
//!
//! Turn free text or a PDF into a diagram: submit it to a summarisation
//! backend, receive Mermaid source, render it to SVG.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text / PDF
//!  │
//!  ├─ 1. Validate   reject empty text or a missing document (no request)
//!  ├─ 2. Submit     one POST to /api/process-text or /api/process-pdf
//!  ├─ 3. Extract    mermaid_code, else raw_mermaid, else ""
//!  ├─ 4. Commit     store transition; stale responses are dropped
//!  ├─ 5. Render     source → SVG via mermaid-rs-renderer, placeholder or error block
//!  └─ 6. Preview    single surface, content replaced wholesale
//! ```
//!
//! Steps 1–4 run in the [`SubmissionController`]; steps 5–6 run in a task
//! spawned by [`Session`] that follows the store's diagram source. The
//! [`UiStore`] is the only shared state between the two.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2chart::{ClientConfig, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://localhost:5000")
//!         .build()?;
//!     let session = Session::connect(config)?;
//!     session.submit_text("Alice reports to Bob. Bob reports to Carol.").await;
//!     session.settled().await;
//!     println!("{}", session.preview().to_html());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2chart` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! doc2chart = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod preview;
pub mod progress;
pub mod session;
pub mod store;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder};
pub use controller::{SubmissionController, SubmissionOutcome};
pub use engine::{CompileError, DiagramCompiler, MermaidRsCompiler};
pub use error::{Doc2ChartError, RenderError, TransportError, ValidationError};
pub use pipeline::backend::{BackendReply, DiagramBackend, HttpBackend};
pub use pipeline::input::{resolve_document, DocumentUpload};
pub use pipeline::render::{DiagramRenderer, RenderOutcome};
pub use preview::PreviewSurface;
pub use progress::{NoopObserver, RenderKind, SubmissionObserver};
pub use session::Session;
pub use store::{InputMode, SubmissionState, SubmissionTicket, UiSnapshot, UiStore, UserInput};
pub use stream::{render_stream, RenderedFrame};
