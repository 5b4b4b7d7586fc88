//! CLI binary for doc2chart.
//!
//! A thin shim over the library crate: flags map onto `ClientConfig`, the
//! chosen input is submitted through a `Session`, and the settled preview is
//! printed or written to a file.

use anyhow::{Context, Result};
use clap::Parser;
use doc2chart::config::DEFAULT_BASE_URL;
use doc2chart::{
    resolve_document, ClientConfig, DocumentUpload, HttpBackend, InputMode, RenderKind,
    RenderOutcome, Session, SubmissionObserver, SubmissionOutcome, SubmissionTicket,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

// ── Spinner observer ─────────────────────────────────────────────────────────

/// Shows a spinner while the backend works, then a one-line verdict.
struct CliObserver {
    bar: ProgressBar,
    started: Instant,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("doc2chart");
        bar.set_message("Preparing…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            started: Instant::now(),
        })
    }

    fn elapsed(&self) -> String {
        dim(&format!("{:.1}s", self.started.elapsed().as_secs_f64()))
    }
}

impl SubmissionObserver for CliObserver {
    fn on_submit_start(&self, ticket: SubmissionTicket, mode: InputMode) {
        self.bar
            .set_message(format!("Generating diagram from {mode} (submission {ticket})…"));
    }

    fn on_submit_complete(&self, _ticket: SubmissionTicket, diagram_len: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Diagram received  {}  {}",
            green("✔"),
            dim(&format!("{diagram_len} chars")),
            self.elapsed()
        );
    }

    fn on_submit_error(&self, _ticket: Option<SubmissionTicket>, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}  {}", red("✘"), red(message), self.elapsed());
    }

    fn on_render(&self, kind: RenderKind) {
        if kind == RenderKind::Error {
            eprintln!("{} Diagram could not be rendered; see preview", yellow("⚠"));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise text, print the preview HTML
  doc2chart --text "Alice reports to Bob. Bob reports to Carol."

  # Summarise a text file, save a standalone HTML page
  doc2chart --text-file notes.txt -o chart.html

  # Summarise a PDF, save the bare SVG
  doc2chart --pdf report.pdf -o chart.svg

  # PDF from a URL, print only the diagram source
  doc2chart --pdf https://arxiv.org/pdf/1706.03762 --source-only

  # Structured output for scripts
  doc2chart --json --text "A calls B, B calls C" > result.json

  # Check that the backend is up
  doc2chart --health

OUTPUT:
  -o FILE.svg   bare SVG; fails if the diagram could not be rendered
  -o FILE.*     HTML page with status, preview, and diagram source
  (no -o)       preview markup on stdout

  Exit status is 1 when the input is rejected or the backend call fails.
  A diagram that fails to render is shown as an error block and exits 0.

ENVIRONMENT VARIABLES:
  DOC2CHART_BASE_URL          Backend base URL (default http://localhost:5000)
  DOC2CHART_TIMEOUT           Request timeout in seconds
  DOC2CHART_DOWNLOAD_TIMEOUT  Timeout for --pdf URLs in seconds
  DOC2CHART_PRIMARY_FIELD     Response field holding the diagram
  DOC2CHART_FALLBACK_FIELD    Field used when the primary one is absent
  RUST_LOG                    Overrides the log filter (e.g. doc2chart=debug)
"#;

/// Turn text or a PDF into a rendered diagram via a summarisation backend.
#[derive(Parser, Debug)]
#[command(
    name = "doc2chart",
    version,
    about = "Turn text or a PDF into a rendered diagram via a summarisation backend",
    long_about = "Submit free text or a PDF document to a summarisation backend, receive \
Mermaid source, and render it to SVG. The backend is any service exposing \
/api/process-text and /api/process-pdf.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Text to summarise.
    #[arg(long, group = "input")]
    text: Option<String>,

    /// Read the text to summarise from this file.
    #[arg(long, group = "input")]
    text_file: Option<PathBuf>,

    /// Local PDF file path or HTTP/HTTPS URL.
    #[arg(long, group = "input")]
    pdf: Option<String>,

    /// Write the preview to this file (.svg → bare SVG, otherwise HTML).
    #[arg(short, long, env = "DOC2CHART_OUTPUT")]
    output: Option<PathBuf>,

    /// Output a JSON report instead of markup.
    #[arg(long, env = "DOC2CHART_JSON", conflicts_with = "source_only")]
    json: bool,

    /// Output the diagram source instead of the rendered preview.
    #[arg(long)]
    source_only: bool,

    /// Query the backend's health endpoint and exit.
    #[arg(long, conflicts_with = "input")]
    health: bool,

    /// Backend base URL.
    #[arg(long, env = "DOC2CHART_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds.
    #[arg(long, env = "DOC2CHART_TIMEOUT", default_value_t = 120,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Download timeout for --pdf URLs in seconds.
    #[arg(long, env = "DOC2CHART_DOWNLOAD_TIMEOUT", default_value_t = 120,
          value_parser = clap::value_parser!(u64).range(1..))]
    download_timeout: u64,

    /// Response field holding the diagram source.
    #[arg(long, env = "DOC2CHART_PRIMARY_FIELD", default_value = "mermaid_code")]
    primary_field: String,

    /// Response field used when the primary one is absent.
    #[arg(long, env = "DOC2CHART_FALLBACK_FIELD", default_value = "raw_mermaid")]
    fallback_field: String,

    /// Disable the spinner.
    #[arg(long, env = "DOC2CHART_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2CHART_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2CHART_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep INFO logs out
    // of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.health;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = build_config(&cli)?;

    // ── Health check ─────────────────────────────────────────────────────
    if cli.health {
        let backend = HttpBackend::new(&config).context("Failed to create HTTP client")?;
        let body = backend.health().await.context("Health check failed")?;
        if !cli.quiet {
            eprintln!("{} {}", green("✔"), config.endpoint_url(&config.health_endpoint));
        }
        println!("{}", body.trim_end());
        return Ok(ExitCode::SUCCESS);
    }

    // ── Load input ───────────────────────────────────────────────────────
    let input = if let Some(ref pdf) = cli.pdf {
        let document = resolve_document(pdf, &config)
            .await
            .with_context(|| format!("Failed to load document '{pdf}'"))?;
        Input::Document(document)
    } else {
        let text = match (&cli.text, &cli.text_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read text from {path:?}"))?,
            (None, None) => String::new(),
        };
        Input::Text(text)
    };

    // ── Submit ───────────────────────────────────────────────────────────
    if show_progress {
        config.observer = Some(CliObserver::new() as Arc<dyn SubmissionObserver>);
    }
    let session = Session::connect(config).context("Failed to start session")?;
    let outcome = match input {
        Input::Text(text) => session.submit_text(text).await,
        Input::Document(document) => session.submit_document(Some(document)).await,
    };

    let rendered = session.settled().await;
    let snapshot = session.store().snapshot();

    // ── Output ───────────────────────────────────────────────────────────
    if cli.json {
        let report = json!({
            "mode": snapshot.mode,
            "submission": snapshot.submission,
            "ticket": snapshot.latest_ticket,
            "error": snapshot.error_message,
            "diagram_source": snapshot.diagram_source,
            "render": rendered,
        });
        let text = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        emit(&cli, &text).await?;
    } else if cli.source_only {
        emit(&cli, &snapshot.diagram_source).await?;
    } else if let Some(ref path) = cli.output {
        session
            .save_preview(path)
            .await
            .context("Failed to write preview")?;
        if !cli.quiet {
            eprintln!("{} Preview written to {}", green("✔"), path.display());
        }
    } else {
        emit(&cli, &session.preview().to_html()).await?;
    }

    // ── Exit status ──────────────────────────────────────────────────────
    match outcome {
        SubmissionOutcome::Completed { .. } => {
            if let (RenderOutcome::Error(e), false) = (&rendered, show_progress || cli.quiet) {
                eprintln!("{} {}", yellow("⚠"), e);
            }
            Ok(ExitCode::SUCCESS)
        }
        other => {
            // The spinner has already printed the message.
            if !show_progress {
                if let Some(message) = other.error_message() {
                    eprintln!("{}", red(&message));
                }
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

enum Input {
    Text(String),
    Document(DocumentUpload),
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    ClientConfig::builder()
        .base_url(&cli.base_url)
        .request_timeout_secs(cli.timeout)
        .download_timeout_secs(cli.download_timeout)
        .primary_field(&cli.primary_field)
        .fallback_field(&cli.fallback_field)
        .build()
        .context("Invalid configuration")
}

/// Write `contents` to `-o` when given, otherwise to stdout.
async fn emit(cli: &Cli, contents: &str) -> Result<()> {
    if let Some(ref path) = cli.output {
        tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("Failed to write {path:?}"))?;
        if !cli.quiet {
            eprintln!("{} Written to {}", green("✔"), path.display());
        }
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(contents.as_bytes())
        .context("Failed to write to stdout")?;
    if !contents.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
