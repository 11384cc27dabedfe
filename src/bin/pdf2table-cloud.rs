//! CLI binary: single-PDF table extraction through the remote conversion API.
//!
//! Uploads the PDF, has the service OCR it into a searchable PDF (saved as
//! `<stem>_searchable.pdf`), converts that to the JSON2 page tree and writes
//! the normalized tables to `parsed_tables.json`.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2table::config::{API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL};
use edgequake_pdf2table::{cloud, format, CloudConfig};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const USAGE: &str = "Usage: pdf2table-cloud <scanned.pdf>";

const AFTER_HELP: &str = r#"EXAMPLES:
  PDFCO_API_KEY=... pdf2table-cloud scanned.pdf
  pdf2table-cloud --api-key ... --output tables.json --searchable-dir out scanned.pdf

STEPS:
  1. Upload the PDF
  2. OCR it server-side into <stem>_searchable.pdf
  3. Download the searchable PDF
  4. Convert it to the JSON2 page tree
  5. Normalize every page into {page, headers, rows}

ENVIRONMENT VARIABLES:
  PDFCO_API_KEY           API key sent as x-api-key
  PDFCO_BASE_URL          Override the API base URL (default https://api.pdf.co/v1)
  RUST_LOG                Override log filtering
"#;

/// Extract tables from one scanned PDF through the remote conversion API.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2table-cloud",
    version,
    about = "Extract tables from a scanned PDF via a PDF.co-compatible API",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// The PDF to process (exactly one).
    inputs: Vec<PathBuf>,

    /// API key (x-api-key).
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Where to write the parsed tables.
    #[arg(short, long, default_value = "parsed_tables.json")]
    output: PathBuf,

    /// Directory receiving the downloaded searchable PDF.
    #[arg(long, default_value = ".")]
    searchable_dir: PathBuf,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let Some(input) = single_input(&cli.inputs) else {
        println!("{USAGE}");
        return ExitCode::FAILURE;
    };
    if !input.exists() {
        println!("Not found: {}", input.display());
        return ExitCode::FAILURE;
    }

    match run(&cli, input).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", red("Error:"), e);
            ExitCode::FAILURE
        }
    }
}

/// The input path, unless the positional argument count is not exactly one.
fn single_input(inputs: &[PathBuf]) -> Option<PathBuf> {
    match inputs {
        [one] => Some(one.clone()),
        _ => None,
    }
}

async fn run(cli: &Cli, input: PathBuf) -> Result<()> {
    let config = CloudConfig::from_key(cli.api_key.clone())?
        .with_base_url(&cli.base_url)
        .with_timeout_secs(cli.timeout)
        .with_searchable_dir(&cli.searchable_dir);

    let result = cloud::searchable_tables_with_steps(&input, &config, |step| {
        println!("{}. {}…", step.number(), step);
    })
    .await?;
    println!("   Saved: {}", result.searchable_pdf.display());

    let json = format::to_json(&result.tables)?;
    format::write_atomic(&cli.output, &json)
        .await
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    println!(
        "{} Parsed {} tables written to {}",
        green("✔"),
        result.tables.len(),
        bold(&cli.output.display().to_string())
    );
    Ok(())
}
