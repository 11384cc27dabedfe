//! Output types: table records and per-document results.

use crate::error::Pdf2TableError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One page's table: a header row plus data rows of strings.
///
/// Records produced from the remote conversion API carry only `page`,
/// `headers` and `rows`, and their rows may be ragged. Records produced by
/// OCR additionally carry a `title` and have every row truncated or padded
/// to `headers.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    /// 1-indexed page number.
    pub page: usize,

    /// First recognised line of the page (OCR path only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Header cells. Empty when the page had no usable header row.
    pub headers: Vec<String>,

    /// Data rows.
    pub rows: Vec<Vec<String>>,

    /// How the table was produced (local extraction only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TableMetadata>,
}

impl TableRecord {
    /// A bare record, as produced by the page-tree normalizer.
    pub fn new(page: usize, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            page,
            title: None,
            headers,
            rows,
            metadata: None,
        }
    }
}

/// Extraction report attached to locally extracted tables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableMetadata {
    /// OCR engine that produced the lines (scanned path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_method: Option<String>,

    /// Percentage of empty cells in the grid (digital path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitespace: Option<f32>,

    /// 1-indexed position of the table on its page (digital path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
}

/// Whether a document carries a usable text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Text layer present: tables come from text positions.
    Digital,
    /// Little or no text layer: tables come from OCR.
    Scanned,
}

/// All tables extracted from one PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTables {
    /// The input PDF.
    pub source: PathBuf,
    /// Classifier verdict that picked the extraction strategy.
    pub kind: DocumentKind,
    /// Extracted tables, in page order.
    pub tables: Vec<TableRecord>,
}

/// Classification report produced by [`crate::convert::inspect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInspection {
    pub source: PathBuf,
    pub page_count: usize,
    /// 1-indexed page whose text layer was sampled.
    pub sampled_page: usize,
    pub kind: DocumentKind,
}

/// Result of one batch job.
#[derive(Debug)]
pub struct DocumentOutcome {
    /// The input PDF.
    pub source: PathBuf,
    /// Path of the written output file, or why the job failed.
    pub result: Result<PathBuf, Pdf2TableError>,
}

impl DocumentOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_record_serialises_three_fields() {
        let rec = TableRecord::new(1, vec!["A".into()], vec![vec!["1".into()]]);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"page": 1, "headers": ["A"], "rows": [["1"]]})
        );
    }

    #[test]
    fn ocr_record_keeps_title_and_method() {
        let rec = TableRecord {
            page: 2,
            title: Some("Invoice".into()),
            headers: vec![],
            rows: vec![],
            metadata: Some(TableMetadata {
                ocr_method: Some("tesseract".into()),
                ..Default::default()
            }),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["title"], "Invoice");
        assert_eq!(json["metadata"]["ocr_method"], "tesseract");
        assert!(json["metadata"].get("whitespace").is_none());
    }
}
