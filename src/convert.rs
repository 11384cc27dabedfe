//! Per-document extraction and the eager batch entry point.
//!
//! A document is handled in two phases. The pdfium phase (bind, open,
//! select pages, classify, then either read the text layer or rasterise)
//! runs inside `spawn_blocking`. The OCR phase runs on the async runtime,
//! because engines are subprocesses or network calls. Use
//! [`crate::stream::convert_dir_stream`] to consume outcomes as they land.

use crate::config::ExtractionConfig;
use crate::error::Pdf2TableError;
use crate::format;
use crate::output::{DocumentInspection, DocumentKind, DocumentOutcome, DocumentTables, TableRecord};
use crate::pipeline::{classify, digital, input, ocr::OcrChain, pdfium, render, scanned};
use crate::stream;
use futures::StreamExt;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// What the blocking phase hands back to the async side.
enum Prepared {
    Digital(Vec<TableRecord>),
    Scanned(Vec<(usize, DynamicImage)>),
}

/// Extract every table from one PDF, without writing anything.
///
/// # Errors
/// - input errors (`FileNotFound`, `NotAPdf`, ...) before pdfium is touched
/// - `NoValidPages` when the page selection misses the document entirely
/// - pdfium, rasterisation and OCR failures
pub async fn extract_tables(
    pdf: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<DocumentTables, Pdf2TableError> {
    let start = Instant::now();
    let pdf_path = input::resolve_local(pdf.as_ref())?;
    info!("Extracting tables: {}", pdf_path.display());

    let path = pdf_path.clone();
    let cfg = config.clone();
    let (kind, prepared) = tokio::task::spawn_blocking(move || prepare_blocking(&path, &cfg))
        .await
        .map_err(|e| Pdf2TableError::Internal(format!("pdfium task panicked: {}", e)))??;

    let tables = match prepared {
        Prepared::Digital(tables) => tables,
        Prepared::Scanned(images) => {
            let chain = OcrChain::from_config(config)?;
            debug!("OCR chain: {:?}", chain.engine_names());
            scanned::extract_tables(&images, &chain).await?
        }
    };

    info!(
        "{}: {} tables ({:?}) in {}ms",
        pdf_path.display(),
        tables.len(),
        kind,
        start.elapsed().as_millis()
    );

    Ok(DocumentTables {
        source: pdf_path,
        kind,
        tables,
    })
}

fn prepare_blocking(
    pdf_path: &Path,
    config: &ExtractionConfig,
) -> Result<(DocumentKind, Prepared), Pdf2TableError> {
    let pdfium = pdfium::bind_pdfium()?;
    let document = pdfium::open_document(&pdfium, pdf_path, config.password.as_deref())?;

    let pages = valid_pages(pdf_path, &document, config)?;
    let kind = classify::classify(&document, pages[0], config.scan_threshold)?;
    info!(
        "{}: {} selected pages, classified {:?}",
        pdf_path.display(),
        pages.len(),
        kind
    );

    let prepared = match kind {
        DocumentKind::Digital => Prepared::Digital(digital::extract_tables(
            &document,
            &pages,
            config.column_tolerance,
        )?),
        DocumentKind::Scanned => Prepared::Scanned(render::render_pages(
            &document,
            &pages,
            config.dpi,
            config.max_rendered_pixels,
        )?),
    };
    Ok((kind, prepared))
}

/// The selected pages that exist in `document`; never empty.
fn valid_pages(
    pdf_path: &Path,
    document: &pdfium_render::prelude::PdfDocument<'_>,
    config: &ExtractionConfig,
) -> Result<Vec<usize>, Pdf2TableError> {
    let total = document.pages().len() as usize;
    let pages = config.pages.to_pages(total);
    if pages.is_empty() {
        return Err(Pdf2TableError::NoValidPages {
            path: pdf_path.to_path_buf(),
            total,
        });
    }
    Ok(pages)
}

/// Extract one PDF and write `<stem>_tables.<ext>` into `config.output_dir`.
///
/// The write is atomic (temp file + rename). Returns the written path.
pub async fn convert_to_file(
    pdf: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<PathBuf, Pdf2TableError> {
    convert_document(pdf.as_ref(), config)
        .await
        .map(|(path, _)| path)
}

/// [`convert_to_file`], also reporting how many tables were written.
pub(crate) async fn convert_document(
    pdf: &Path,
    config: &ExtractionConfig,
) -> Result<(PathBuf, usize), Pdf2TableError> {
    let doc = extract_tables(pdf, config).await?;
    let contents = format::render(&doc.tables, config.format)?;

    let out_path = output_path(&doc.source, config);
    format::write_atomic(&out_path, &contents).await?;
    info!("Wrote {}", out_path.display());
    Ok((out_path, doc.tables.len()))
}

/// `<output_dir>/<stem>_tables.<json|md>`.
pub fn output_path(pdf: &Path, config: &ExtractionConfig) -> PathBuf {
    config.output_dir.join(format!(
        "{}_tables.{}",
        input::file_stem(pdf),
        config.format.extension()
    ))
}

/// Convert every PDF in `dir`, `config.parallel` at a time.
///
/// Per-document failures are reported in the returned outcomes and do not
/// stop the batch. Outcomes are sorted by source path.
///
/// # Errors
/// Only `InputDirNotFound` (or an unreadable directory) fails the call.
pub async fn convert_dir(
    dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<Vec<DocumentOutcome>, Pdf2TableError> {
    let mut outcomes: Vec<DocumentOutcome> = stream::convert_dir_stream(dir, config)?
        .collect()
        .await;
    outcomes.sort_by(|a, b| a.source.cmp(&b.source));

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    info!(
        "Batch complete: {}/{} documents succeeded",
        succeeded,
        outcomes.len()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(outcomes.len(), succeeded);
    }
    Ok(outcomes)
}

/// Synchronous wrapper around [`convert_dir`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_dir_sync(
    dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<Vec<DocumentOutcome>, Pdf2TableError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2TableError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_dir(dir, config))
}

/// Classify a PDF without extracting anything.
///
/// Honours `config.pages` (the sampled page is the first valid selected
/// page), `config.password` and `config.scan_threshold`. Needs no OCR
/// engine and no LLM provider.
pub async fn inspect(
    pdf: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<DocumentInspection, Pdf2TableError> {
    let pdf_path = input::resolve_local(pdf.as_ref())?;
    let cfg = config.clone();

    tokio::task::spawn_blocking(move || -> Result<DocumentInspection, Pdf2TableError> {
        let pdfium = pdfium::bind_pdfium()?;
        let document = pdfium::open_document(&pdfium, &pdf_path, cfg.password.as_deref())?;
        let pages = valid_pages(&pdf_path, &document, &cfg)?;
        let kind = classify::classify(&document, pages[0], cfg.scan_threshold)?;
        Ok(DocumentInspection {
            page_count: document.pages().len() as usize,
            sampled_page: pages[0],
            kind,
            source: pdf_path,
        })
    })
    .await
    .map_err(|e| Pdf2TableError::Internal(format!("pdfium task panicked: {}", e)))?
}
