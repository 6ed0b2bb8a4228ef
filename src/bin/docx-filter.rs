//! CLI binary for docx-filter.
//!
//! A thin shim over the library crate that maps CLI flags to `ClientConfig`,
//! drives one `SubmissionController` round trip and prints the results.

use anyhow::{Context, Result};
use clap::Parser;
use docx_filter::config::DEFAULT_ENDPOINT;
use docx_filter::{
    write_preview, ClientConfig, FileCandidate, Phase, SavedDownload, StatusKind, StatusLine,
    SubmissionController, WorkflowObserver,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a spinner while the request is out, one log line per
/// finished step.
struct CliSpinner {
    bar: ProgressBar,
}

impl CliSpinner {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl WorkflowObserver for CliSpinner {
    fn on_phase_change(&self, _from: Phase, to: Phase) {
        match to {
            Phase::Submitting => self.bar.set_prefix("Processing"),
            Phase::Succeeded | Phase::Failed => self.bar.finish_and_clear(),
            _ => {}
        }
    }

    fn on_status(&self, status: Option<&StatusLine>) {
        let Some(status) = status else { return };
        match status.kind {
            StatusKind::Info => self.bar.set_message(status.message.clone()),
            StatusKind::Success => eprintln!("{} {}", green("✔"), status.message),
            // Failures reach the user once, through the error `main` returns.
            StatusKind::Error => {}
        }
    }

    fn on_submit_start(&self, file_name: &str, bytes: usize) {
        self.bar.println(format!(
            "{} {}  {}",
            cyan("◆"),
            bold(&format!("Submitting {file_name}")),
            dim(&format!("{bytes} bytes"))
        ));
    }

    fn on_download(&self, saved: &SavedDownload) {
        eprintln!(
            "  {} {}  {}",
            green("✓"),
            saved.path.display(),
            dim(&format!("{} bytes", saved.bytes))
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process with no filter, save documento_corregido.docx in the current dir
  docx-filter report.docx

  # Remove everything about a topic
  docx-filter report.docx -f "Remove all paragraphs about salaries"

  # Write the HTML preview to a file and the document to out/
  docx-filter report.docx -f "Confidential" --preview preview.html -o out/

  # Preview only, no download
  docx-filter report.docx --no-download > preview.html

  # Another service instance
  docx-filter report.docx --endpoint http://10.0.0.5:5000/process-document

  # Machine-readable final state
  docx-filter report.docx --json

ENVIRONMENT VARIABLES:
  DOCX_FILTER_ENDPOINT    Processing service URL
  DOCX_FILTER_TEXT        Default filter instructions
  DOCX_FILTER_OUTPUT_DIR  Where the processed document is saved
  DOCX_FILTER_TIMEOUT     Request timeout in seconds
  RUST_LOG                Log filter (overrides -v / -q)
"#;

/// Submit Word documents to a filtering service and download the result.
#[derive(Parser, Debug)]
#[command(
    name = "docx-filter",
    version,
    about = "Submit a .docx to a document-processing service, preview the result and save it",
    long_about = "Upload a Word document (.docx) together with free-text filtering \
instructions to a document-processing service. The service's HTML rendering of the \
processed document is printed (or written with --preview) and the processed document \
is saved as documento_corregido.docx.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local .docx file to process.
    input: PathBuf,

    /// Filtering instructions sent to the service (empty = no filtering).
    #[arg(short, long, env = "DOCX_FILTER_TEXT", default_value = "")]
    filter: String,

    /// Processing service URL.
    #[arg(long, env = "DOCX_FILTER_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Directory the processed document is saved into.
    #[arg(short, long, env = "DOCX_FILTER_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Write the HTML preview to this file instead of stdout.
    #[arg(long, env = "DOCX_FILTER_PREVIEW")]
    preview: Option<PathBuf>,

    /// Do not save the processed document.
    #[arg(long)]
    no_download: bool,

    /// Request timeout in seconds (no timeout when unset).
    #[arg(long, env = "DOCX_FILTER_TIMEOUT")]
    timeout: Option<u64>,

    /// Print the final workflow snapshot as JSON instead of the preview.
    #[arg(long, env = "DOCX_FILTER_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DOCX_FILTER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCX_FILTER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCX_FILTER_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters, so INFO logs are
    // suppressed while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build controller ─────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let mut controller =
        SubmissionController::from_config(&config).context("Failed to set up HTTP client")?;
    if show_progress {
        controller = controller.with_observer(CliSpinner::new());
    }

    // ── Run workflow ─────────────────────────────────────────────────────
    let start = Instant::now();
    let outcome = run(&cli, &controller).await;

    if cli.json {
        let json = serde_json::to_string_pretty(&controller.snapshot())
            .context("Failed to serialise snapshot")?;
        println!("{json}");
    }
    let saved = outcome?;

    // Summary (the spinner already printed the per-step lines).
    if !cli.quiet && !cli.json {
        let target = match (&saved, &cli.preview) {
            (Some(s), _) => s.path.display().to_string(),
            (None, Some(p)) => p.display().to_string(),
            (None, None) => "stdout".to_string(),
        };
        eprintln!(
            "{}  {}  {}ms  →  {}",
            green("✔"),
            controller
                .selected_file()
                .map(|f| f.name().to_string())
                .unwrap_or_default(),
            start.elapsed().as_millis(),
            bold(&target),
        );
    }

    Ok(())
}

/// Select, submit, emit the preview and save the document.
async fn run(cli: &Cli, controller: &SubmissionController) -> Result<Option<SavedDownload>> {
    let candidate = FileCandidate::from_path(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    controller
        .select(candidate)
        .context("Document rejected")?;
    controller.set_filter(cli.filter.as_str());

    let result = controller.submit().await.context("Processing failed")?;

    if let Some(ref path) = cli.preview {
        write_preview(&result, path)
            .await
            .context("Failed to write preview")?;
    } else if !cli.json {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(result.html_content.as_bytes())
            .context("Failed to write to stdout")?;
        if !result.html_content.ends_with('\n') {
            handle
                .write_all(b"\n")
                .context("Failed to write to stdout")?;
        }
    }

    if cli.no_download {
        return Ok(None);
    }
    let saved = controller
        .download()
        .await
        .context("Failed to save the processed document")?;
    Ok(Some(saved))
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .endpoint(cli.endpoint.clone())
        .download_dir(cli.output_dir.clone());
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    builder.build().context("Invalid configuration")
}
