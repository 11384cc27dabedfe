//! # edgequake-pdf2table
//!
//! Extract tables from scanned and digital PDFs into JSON or Markdown.
//!
//! Two independent pipelines share one record type, [`TableRecord`]:
//!
//! ```text
//! Local batch (pdf2table)
//!  PDF dir ─┬─ discover *.pdf
//!           ├─ per PDF (parallel): open ─▶ classify first valid page
//!           │     ├─ digital: text-layer segments ─▶ aligned grid ─▶ records
//!           │     └─ scanned: rasterise ─▶ OCR chain ─▶ line split ─▶ records
//!           └─ <stem>_tables.json | <stem>_tables.md
//!
//! Remote (pdf2table-cloud)
//!  PDF ─▶ upload ─▶ server OCR ─▶ download searchable PDF
//!      ─▶ convert to JSON2 page tree ─▶ normalize ─▶ parsed_tables.json
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2table::{extract_tables, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .pages("1-3".parse()?)
//!         .build()?;
//!     let doc = extract_tables("invoice.pdf", &config).await?;
//!     for table in &doc.tables {
//!         println!("page {}: {:?}", table.page, table.headers);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2table` and `pdf2table-cloud` binaries |
//!
//! ## External tools
//!
//! * pdfium shared library (`PDFIUM_LIB_PATH`, working directory, or system)
//! * `tesseract` on `PATH` for scanned documents
//! * optionally a vision LLM (`--vlm-ocr`), auto-detected from
//!   `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` / ...
//! * `PDFCO_API_KEY` for the remote pipeline

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cloud;
pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cloud::{searchable_tables, CloudStep, CloudTables, PdfCoClient};
pub use config::{CloudConfig, ExtractionConfig, ExtractionConfigBuilder, OutputFormat, PageSelection};
pub use convert::{convert_dir, convert_dir_sync, convert_to_file, extract_tables, inspect};
pub use error::{FailureKind, Pdf2TableError};
pub use normalize::{normalize_page_tree, parse_page_tree};
pub use output::{
    DocumentInspection, DocumentKind, DocumentOutcome, DocumentTables, TableMetadata, TableRecord,
};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_dir_stream, DocumentStream};
