//! The preview surface: one container whose whole content is replaced on
//! every render outcome.
//!
//! Nothing is ever appended. After any sequence of renders the surface holds
//! exactly one placeholder, artifact, or error block.

use crate::pipeline::render::RenderOutcome;
use crate::store::{SubmissionState, UiSnapshot};

/// Markup shown before any diagram exists.
pub const PLACEHOLDER_HTML: &str =
    "<div class=\"placeholder\">Diagram preview will appear here</div>";

const PAGE_STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem;color:#222}\
.controls{margin-bottom:1rem}\
.controls .error{color:#b00020}\
.preview{border:1px solid #ddd;border-radius:6px;padding:1rem;min-height:12rem}\
.placeholder{color:#888;text-align:center;padding:4rem 0}\
pre.error{color:#b00020;white-space:pre-wrap}\
details pre{background:#f6f8fa;padding:.5rem;overflow:auto}";

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSurface {
    content: RenderOutcome,
    source: Option<String>,
    replacements: u64,
}

impl Default for PreviewSurface {
    fn default() -> Self {
        Self {
            content: RenderOutcome::Placeholder,
            source: None,
            replacements: 0,
        }
    }
}

impl PreviewSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap the entire content for `outcome`.
    pub fn replace(&mut self, outcome: RenderOutcome) {
        self.content = outcome;
        self.replacements += 1;
    }

    /// Replace the content and remember which diagram source produced it.
    pub fn show(&mut self, source: String, outcome: RenderOutcome) {
        self.replace(outcome);
        self.source = Some(source);
    }

    pub fn current(&self) -> &RenderOutcome {
        &self.content
    }

    /// The diagram source behind the current content, once anything has been
    /// shown through [`show`](Self::show).
    pub fn rendered_source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// How many times the content has been replaced.
    pub fn replacements(&self) -> u64 {
        self.replacements
    }

    /// The container's inner markup.
    pub fn to_html(&self) -> String {
        match &self.content {
            RenderOutcome::Placeholder => PLACEHOLDER_HTML.to_string(),
            RenderOutcome::Artifact { svg, .. } => svg.clone(),
            RenderOutcome::Error(e) => {
                format!("<pre class=\"error\">{}</pre>", escape_xml(&e.to_string()))
            }
        }
    }

    /// A standalone HTML page: controls summary above the preview.
    pub fn render_page(&self, snapshot: &UiSnapshot) -> String {
        let status = match snapshot.submission {
            SubmissionState::Idle => "idle",
            SubmissionState::InFlight => "generating…",
            SubmissionState::Succeeded => "done",
            SubmissionState::Failed => "failed",
        };
        let mut page = String::with_capacity(2048);
        page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        page.push_str("<title>doc2chart</title>\n");
        page.push_str(&format!("<style>{PAGE_STYLE}</style>\n"));
        page.push_str("</head>\n<body>\n<section class=\"controls\">\n");
        page.push_str(&format!(
            "<p>Mode: <strong>{}</strong> · Status: {}</p>\n",
            snapshot.mode, status
        ));
        if let Some(ref message) = snapshot.error_message {
            page.push_str(&format!(
                "<p class=\"error\">{}</p>\n",
                escape_xml(message)
            ));
        }
        page.push_str("</section>\n<section class=\"preview\">\n");
        page.push_str(&self.to_html());
        page.push_str("\n</section>\n");
        if !snapshot.diagram_source.trim().is_empty() {
            page.push_str(&format!(
                "<details>\n<summary>Diagram source</summary>\n<pre>{}</pre>\n</details>\n",
                escape_xml(&snapshot.diagram_source)
            ));
        }
        page.push_str("</body>\n</html>\n");
        page
    }
}

fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
