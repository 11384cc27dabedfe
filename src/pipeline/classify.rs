//! Scanned-vs-digital classification from a single sampled page.
//!
//! A heuristic, not a guarantee: a digital PDF whose sampled page is an
//! image-only cover gets routed to OCR as a whole, with no retry.

use crate::error::Pdf2TableError;
use crate::output::DocumentKind;
use crate::pipeline::pdfium::{page_at, text_layer};
use pdfium_render::prelude::*;
use tracing::debug;

/// `true` when the trimmed text has fewer than `threshold` characters.
pub fn is_scanned_text(text: &str, threshold: usize) -> bool {
    text.trim().chars().count() < threshold
}

/// Classify `document` by the text layer of the 1-indexed `page_num`.
pub fn is_scanned(
    document: &PdfDocument<'_>,
    page_num: usize,
    threshold: usize,
) -> Result<bool, Pdf2TableError> {
    let page = page_at(document, page_num)?;
    let text = text_layer(page_num, page.text())
        .map(|t| t.all())
        .unwrap_or_default();
    let scanned = is_scanned_text(&text, threshold);
    debug!(
        "Page {}: {} text chars → {}",
        page_num,
        text.trim().chars().count(),
        if scanned { "scanned" } else { "digital" }
    );
    Ok(scanned)
}

/// [`is_scanned`] as a [`DocumentKind`].
pub fn classify(
    document: &PdfDocument<'_>,
    page_num: usize,
    threshold: usize,
) -> Result<DocumentKind, Pdf2TableError> {
    Ok(if is_scanned(document, page_num, threshold)? {
        DocumentKind::Scanned
    } else {
        DocumentKind::Digital
    })
}
