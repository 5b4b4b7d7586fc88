//! Pipeline stages between a submit click and a replaced preview.
//!
//! Each submodule implements one step, so each can be tested on its own and
//! swapped (another transport, another engine) without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ backend ──▶ extract ──▶ (store) ──▶ render
//! (PDF)     (HTTP)      (fields)               (engine)
//! ```
//!
//! 1. [`input`]  : read a local path or download a URL into a validated
//!    PDF upload
//! 2. [`backend`]: one POST per submission; the only stage with network I/O
//! 3. [`extract`]: status + JSON body → diagram text or error message
//! 4. [`render`] : diagram text → placeholder, SVG artifact, or render error;
//!    compilation runs in `spawn_blocking`

pub mod backend;
pub mod extract;
pub mod input;
pub mod render;
