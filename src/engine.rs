//! Diagram compilation.
//!
//! The renderer treats compilation as a black box behind [`DiagramCompiler`]:
//! text in, SVG or [`CompileError`] out. [`MermaidRsCompiler`] is the stock
//! implementation, backed by the `mermaid-rs-renderer` crate.
//!
//! Around the crate call sit a few thin steps:
//!
//! * a surrounding ```` ```mermaid ```` Markdown fence is removed;
//! * the diagram header is checked, so text that is not Mermaid at all
//!   fails with `"No diagram type detected ..."` and never reaches the crate;
//! * the produced markup is namespaced by the render id. The root `<svg>`
//!   gets `id="<render id>"` and every inner id (markers, gradients) is
//!   prefixed with it, together with its `url(#…)` and `href="#…"`
//!   references. Two artifacts of the same diagram can then live in one page.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

pub use mermaid_rs_renderer::Theme;

/// Why a diagram description could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Nothing but whitespace and comments.
    #[error("Diagram source is empty")]
    Empty,

    /// The first statement is not a known diagram header.
    #[error("No diagram type detected matching given configuration for text: {snippet}")]
    NoDiagramType { snippet: String },

    /// The renderer rejected the diagram; its message verbatim.
    #[error("{message}")]
    Render { message: String },

    /// The renderer returned something that is not SVG.
    #[error("Renderer produced no <svg> element")]
    NoSvg,
}

/// Compiles diagram text into SVG markup.
///
/// Implementations must be pure apart from `id`: the same source must yield
/// the same markup once the id is factored out. `compile` may be called from
/// a blocking thread pool.
pub trait DiagramCompiler: Send + Sync {
    fn compile(&self, id: &str, source: &str) -> Result<String, CompileError>;
}

/// Mermaid compiler backed by `mermaid-rs-renderer`.
#[derive(Clone)]
pub struct MermaidRsCompiler {
    theme: Theme,
}

impl Default for MermaidRsCompiler {
    fn default() -> Self {
        Self {
            theme: Theme::modern(),
        }
    }
}

impl std::fmt::Debug for MermaidRsCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MermaidRsCompiler").finish_non_exhaustive()
    }
}

impl MermaidRsCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }
}

impl DiagramCompiler for MermaidRsCompiler {
    fn compile(&self, id: &str, source: &str) -> Result<String, CompileError> {
        let source = strip_fence(source);
        let kind = diagram_kind(source)?;
        debug!("Compiling {} as {}", id, kind);

        let opts = mermaid_rs_renderer::RenderOptions {
            theme: self.theme.clone(),
            layout: mermaid_rs_renderer::LayoutConfig::default(),
        };
        let svg = mermaid_rs_renderer::render_with_options(source, opts).map_err(|e| {
            CompileError::Render {
                message: e.to_string(),
            }
        })?;
        namespace_ids(id, &svg)
    }
}

// ── Header detection ─────────────────────────────────────────────────────────

static RE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[ \t]*(?:mermaid)?[ \t]*\r?\n(.*?)\r?\n?```\s*$").unwrap()
});

/// The diagram inside a surrounding ```` ``` ```` / ```` ```mermaid ```` fence,
/// or `source` unchanged.
pub fn strip_fence(source: &str) -> &str {
    RE_FENCE
        .captures(source)
        .and_then(|c| c.get(1))
        .map_or(source, |m| m.as_str())
}

/// Diagram keywords Mermaid recognises as the first statement.
const DIAGRAM_KEYWORDS: &[&str] = &[
    "graph",
    "flowchart",
    "flowchart-elk",
    "sequenceDiagram",
    "classDiagram",
    "classDiagram-v2",
    "stateDiagram",
    "stateDiagram-v2",
    "erDiagram",
    "journey",
    "gantt",
    "pie",
    "quadrantChart",
    "requirementDiagram",
    "gitGraph",
    "mindmap",
    "timeline",
    "sankey-beta",
    "xychart-beta",
    "block-beta",
    "packet-beta",
    "architecture-beta",
    "kanban",
    "radar-beta",
    "C4Context",
    "C4Container",
    "C4Component",
    "C4Dynamic",
    "C4Deployment",
];

/// The diagram keyword `source` starts with.
///
/// Blank lines, `%%` comments and directives, and a leading `---` front
/// matter block are skipped.
pub fn diagram_kind(source: &str) -> Result<&'static str, CompileError> {
    let mut lines = source.lines().map(str::trim).peekable();
    if lines.peek() == Some(&"---") {
        lines.next();
        for line in lines.by_ref() {
            if line == "---" {
                break;
            }
        }
    }

    let first = lines
        .find(|l| !l.is_empty() && !l.starts_with("%%"))
        .ok_or(CompileError::Empty)?;
    let word = first
        .split(|c: char| c.is_whitespace() || c == ';')
        .next()
        .unwrap_or_default();

    DIAGRAM_KEYWORDS
        .iter()
        .find(|k| **k == word)
        .copied()
        .ok_or_else(|| CompileError::NoDiagramType {
            snippet: snippet(source),
        })
}

fn snippet(source: &str) -> String {
    let trimmed = source.trim();
    match trimmed.char_indices().nth(80) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

// ── Id namespacing ───────────────────────────────────────────────────────────

static RE_ID_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(\s)id="([^"]*)""#).unwrap());
static RE_ID_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r##"(url\(#|href="#)([^")]+)"##).unwrap());

/// Give `svg` the root id `id` and prefix every inner id with it.
///
/// Anything before the root `<svg` (an XML prolog, whitespace) is dropped so
/// the markup can be inlined. References to ids the document does not define
/// are left alone.
pub fn namespace_ids(id: &str, svg: &str) -> Result<String, CompileError> {
    let start = svg.find("<svg").ok_or(CompileError::NoSvg)?;
    let svg = svg[start..].trim_end();
    let tag_end = svg.find('>').ok_or(CompileError::NoSvg)?;
    let (root, inner) = svg.split_at(tag_end + 1);

    let root_id = RE_ID_ATTR.captures(root).map(|c| c[2].to_string());
    let local: HashSet<&str> = RE_ID_ATTR
        .captures_iter(inner)
        .filter_map(|c| c.get(2))
        .map(|m| m.as_str())
        .collect();

    let root = RE_ID_ATTR.replace_all(root, "");
    let root = root.replacen("<svg", &format!("<svg id=\"{id}\""), 1);

    let renamed = RE_ID_ATTR.replace_all(inner, |c: &Captures| {
        format!("{}id=\"{id}-{}\"", &c[1], &c[2])
    });
    let renamed = RE_ID_REF.replace_all(&renamed, |c: &Captures| {
        let target = &c[2];
        if root_id.as_deref() == Some(target) {
            format!("{}{id}", &c[1])
        } else if local.contains(target) {
            format!("{}{id}-{target}", &c[1])
        } else {
            c[0].to_string()
        }
    });

    Ok(format!("{root}{renamed}"))
}
