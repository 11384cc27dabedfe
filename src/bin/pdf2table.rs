//! CLI binary: batch table extraction from a directory of PDFs.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints one `Generated: <file>` line per PDF.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2table::{
    convert_dir, inspect, pipeline::input, BatchProgressCallback, ExtractionConfig, OutputFormat,
    PageSelection, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One bar over the whole batch, with a log line per finished document.
/// Documents may finish out of order when `--parallel` > 1.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Instant,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} PDFs  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Instant::now(),
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
    }

    fn on_document_start(&self, source: &Path) {
        self.bar.set_message(display_name(source));
    }

    fn on_document_complete(&self, source: &Path, _output: &Path, tables: usize) {
        self.bar.println(format!(
            "  {} {:<40} {}",
            green("✓"),
            display_name(source),
            dim(&format!("{tables} tables")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, source: &Path, error: &str) {
        // First line only; multi-line hints go to the summary.
        let first = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} {:<40} {}",
            red("✗"),
            display_name(source),
            red(first),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_documents.saturating_sub(success_count);
        let secs = self.started.elapsed().as_secs_f64();
        if failed == 0 {
            eprintln!(
                "{} {} PDFs processed in {:.1}s",
                green("✔"),
                bold(&success_count.to_string()),
                secs
            );
        } else {
            eprintln!(
                "{} {}/{} PDFs processed  ({} failed)",
                if success_count == 0 { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r####"EXAMPLES:
  # Pages 1-3 of every PDF in ./scans, JSON output
  pdf2table --input-dir scans --pages 1-3

  # Markdown tables, four PDFs at a time
  pdf2table -i scans -p 1,3,5-7 -f markdown -n 4

  # Every page, outputs in ./out
  pdf2table -i scans -p all -o out

  # Classify only (digital vs. scanned)
  pdf2table -i scans -p all --inspect-only

  # Vision LLM as the primary OCR engine, Tesseract as fallback
  OPENAI_API_KEY=sk-... pdf2table -i scans -p 1 --vlm-ocr

OUTPUT:
  <stem>_tables.json   array of {page, title?, headers, rows, metadata?}
  <stem>_tables.md     "### Page <n> — <title>" sections with GitHub tables

HOW TABLES ARE FOUND:
  Each PDF is classified from the text layer of its first selected page.
  Fewer than 20 characters of text means "scanned".
    digital  text segments are grouped into rows and aligned columns
    scanned  pages are rendered, OCR'd, and each line split on whitespace;
             the first line becomes the header row

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  OPENAI_API_KEY          Vision LLM key for --vlm-ocr (or ANTHROPIC_API_KEY, ...)
  RUST_LOG                Override log filtering (e.g. edgequake_pdf2table=debug)

SETUP:
  1. Install tesseract:   apt install tesseract-ocr   |  brew install tesseract
  2. Install pdfium:      https://github.com/bblanchon/pdfium-binaries/releases
  3. Extract:             pdf2table -i scans -p 1-3
"####;

/// Extract tables from every PDF in a directory.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2table",
    version,
    about = "Extract tables from scanned and digital PDFs into JSON or Markdown",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing the PDFs to process.
    #[arg(short, long, env = "PDF2TABLE_INPUT_DIR")]
    input_dir: PathBuf,

    /// Page selection: all, 5, 3-15, or 1,3,5-7.
    #[arg(short, long, env = "PDF2TABLE_PAGES")]
    pages: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "json")]
    format: FormatArg,

    /// Number of PDFs processed concurrently.
    #[arg(short = 'n', long, env = "PDF2TABLE_PARALLEL", default_value_t = 1,
          value_parser = clap::value_parser!(u16).range(1..))]
    parallel: u16,

    /// Directory receiving the output files.
    #[arg(short, long, env = "PDF2TABLE_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Rasterisation DPI for OCR (72–600).
    #[arg(long, env = "PDF2TABLE_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Tesseract language(s), e.g. eng or eng+deu.
    #[arg(long, env = "PDF2TABLE_LANG", default_value = "eng")]
    lang: String,

    /// Text-layer length below which a PDF counts as scanned.
    #[arg(long, default_value_t = 20)]
    scan_threshold: usize,

    /// Use a vision LLM as the primary OCR engine (Tesseract stays as fallback).
    #[arg(long, env = "PDF2TABLE_VLM_OCR")]
    vlm_ocr: bool,

    /// LLM provider for --vlm-ocr: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM model for --vlm-ocr (e.g. gpt-4.1-nano).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2TABLE_PASSWORD")]
    password: Option<String>,

    /// Classify each PDF (digital/scanned) without extracting.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2TABLE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2TABLE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and generated file names.
    #[arg(short, long, env = "PDF2TABLE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Json,
    Markdown,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", red("Error:"), e);
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` when at least one document failed.
async fn run() -> Result<bool> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; RUST_LOG still wins when set.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.inspect_only;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let pdfs = input::discover_pdfs(&cli.input_dir)
            .with_context(|| format!("Failed to list {}", cli.input_dir.display()))?;
        let mut all_ok = true;
        for pdf in pdfs {
            match inspect(&pdf, &config).await {
                Ok(report) => println!(
                    "{:<40} {:>4} pages  sampled p.{:<4} {:?}",
                    display_name(&report.source),
                    report.page_count,
                    report.sampled_page,
                    report.kind
                ),
                Err(e) => {
                    all_ok = false;
                    eprintln!("{} {}: {}", red("✗"), pdf.display(), e);
                }
            }
        }
        return Ok(all_ok);
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let outcomes = convert_dir(&cli.input_dir, &config)
        .await
        .context("Batch extraction failed")?;

    if outcomes.is_empty() && !cli.quiet {
        eprintln!("No PDF files found in {}", cli.input_dir.display());
    }

    let mut all_ok = true;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(path) => println!("Generated: {}", path.display()),
            Err(e) => {
                all_ok = false;
                if !show_progress {
                    eprintln!("Failed processing {}: {}", outcome.source.display(), e);
                }
            }
        }
    }
    Ok(all_ok)
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let pages: PageSelection = cli
        .pages
        .parse()
        .with_context(|| format!("Invalid --pages value '{}'", cli.pages))?;

    let mut builder = ExtractionConfig::builder()
        .pages(pages)
        .format(cli.format.into())
        .parallel(cli.parallel as usize)
        .output_dir(&cli.output_dir)
        .dpi(cli.dpi)
        .ocr_language(&cli.lang)
        .scan_threshold(cli.scan_threshold)
        .vlm_ocr(cli.vlm_ocr);

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
