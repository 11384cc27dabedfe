//! Scanned-PDF table extraction: rasterised pages → OCR lines → records.
//!
//! OCR output carries no column geometry, so a line is split on whitespace
//! and the first line of the page is taken as the header row. Every later
//! line is truncated or padded to the header width.

use crate::error::Pdf2TableError;
use crate::output::{TableMetadata, TableRecord};
use crate::pipeline::ocr::OcrChain;
use image::DynamicImage;
use tracing::{debug, info};

/// OCR every rendered page, in page order, one record per page.
///
/// A page whose OCR fails in every engine fails the whole document.
pub async fn extract_tables(
    images: &[(usize, DynamicImage)],
    chain: &OcrChain,
) -> Result<Vec<TableRecord>, Pdf2TableError> {
    let mut tables = Vec::with_capacity(images.len());
    for (page_num, image) in images {
        let output = chain.recognize(*page_num, image).await?;
        info!(
            "Page {}: {} lines via {}",
            page_num,
            output.lines.len(),
            output.engine
        );
        tables.push(lines_to_record(*page_num, &output.lines, &output.engine));
    }
    Ok(tables)
}

/// Build a record from the recognised lines of one page.
pub fn lines_to_record(page: usize, lines: &[String], ocr_method: &str) -> TableRecord {
    let title = lines.first().cloned().unwrap_or_default();
    let headers: Vec<String> = lines
        .first()
        .map(|l| tokens(l))
        .unwrap_or_default();

    let width = headers.len();
    let rows: Vec<Vec<String>> = lines
        .iter()
        .skip(1)
        .map(|line| {
            let mut cells = tokens(line);
            cells.resize(width, String::new());
            cells
        })
        .collect();

    if width == 0 {
        debug!("Page {}: no header row recognised", page);
    }

    TableRecord {
        page,
        title: Some(title),
        headers,
        rows,
        metadata: Some(TableMetadata {
            ocr_method: Some(ocr_method.to_string()),
            ..Default::default()
        }),
    }
}

fn tokens(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
