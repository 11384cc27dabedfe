//! Digital-PDF table extraction from the text layer.
//!
//! pdfium reports the text layer as segments, runs of characters sharing a
//! baseline and font, each with a bounding box. Tables in digital PDFs are
//! laid out by alignment, so the grid is recovered in three passes:
//!
//! 1. **Rows**: segments whose vertical extents overlap share a row.
//! 2. **Columns**: left edges across all multi-segment rows are clustered;
//!    each cluster is one column anchor.
//! 3. **Cells**: each segment lands in the rightmost anchor at or left of it;
//!    segments sharing a cell are joined with a space.
//!
//! Rows with fewer than two non-empty cells (titles, running prose, page
//! numbers) are not table rows and are dropped, as are columns left entirely
//! empty afterwards. Grid-line ("lattice") detection is out of scope.

use crate::error::Pdf2TableError;
use crate::output::{TableMetadata, TableRecord};
use crate::pipeline::pdfium::{page_at, text_layer};
use pdfium_render::prelude::*;
use tracing::debug;

/// A positioned run of text in PDF user space (y grows upwards).
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl TextBox {
    fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// Extract one table per listed page from the document's text layer.
///
/// Pages with no recoverable grid produce no record.
pub fn extract_tables(
    document: &PdfDocument<'_>,
    pages: &[usize],
    column_tolerance: f32,
) -> Result<Vec<TableRecord>, Pdf2TableError> {
    let mut tables = Vec::new();
    for &page_num in pages {
        let boxes = page_text_boxes(document, page_num)?;
        let grid = build_grid(&boxes, column_tolerance);
        match grid_to_record(page_num, grid) {
            Some(record) => tables.push(record),
            None => debug!("No valid data found on page {}", page_num),
        }
    }
    Ok(tables)
}

fn page_text_boxes(
    document: &PdfDocument<'_>,
    page_num: usize,
) -> Result<Vec<TextBox>, Pdf2TableError> {
    let page = page_at(document, page_num)?;
    let Some(text_page) = text_layer(page_num, page.text()) else {
        return Ok(Vec::new());
    };

    let boxes = text_page
        .segments()
        .iter()
        .filter_map(|segment| {
            let text = segment.text();
            if text.trim().is_empty() {
                return None;
            }
            let bounds = segment.bounds();
            Some(TextBox {
                text,
                left: bounds.left().value,
                right: bounds.right().value,
                top: bounds.top().value,
                bottom: bounds.bottom().value,
            })
        })
        .collect();
    Ok(boxes)
}

/// Group positioned text into a grid of cell strings, top row first.
pub fn build_grid(boxes: &[TextBox], column_tolerance: f32) -> Vec<Vec<String>> {
    let rows = group_rows(boxes);

    let mut lefts: Vec<f32> = rows
        .iter()
        .filter(|row| row.len() >= 2)
        .flat_map(|row| row.iter().map(|b| b.left))
        .collect();
    if lefts.is_empty() {
        return Vec::new();
    }
    lefts.sort_by(f32::total_cmp);
    let anchors = cluster_anchors(&lefts, column_tolerance);

    let mut grid: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![String::new(); anchors.len()];
            for b in row {
                let col = column_for(b.left, &anchors, column_tolerance);
                let text = b.text.trim();
                if cells[col].is_empty() {
                    cells[col] = text.to_string();
                } else {
                    cells[col].push(' ');
                    cells[col].push_str(text);
                }
            }
            cells
        })
        .filter(|cells| cells.iter().filter(|c| !c.is_empty()).count() >= 2)
        .collect();

    drop_empty_columns(&mut grid);
    grid
}

/// Rows ordered top to bottom, each ordered left to right.
fn group_rows(boxes: &[TextBox]) -> Vec<Vec<&TextBox>> {
    let mut sorted: Vec<&TextBox> = boxes.iter().collect();
    sorted.sort_by(|a, b| b.center_y().total_cmp(&a.center_y()));

    let mut rows: Vec<Vec<&TextBox>> = Vec::new();
    let mut band: Option<(f32, f32)> = None;
    for b in sorted {
        match band {
            Some((top, bottom)) if b.center_y() <= top && b.center_y() >= bottom => {
                if let Some(row) = rows.last_mut() {
                    row.push(b);
                }
            }
            _ => {
                rows.push(vec![b]);
                band = Some((b.top, b.bottom));
            }
        }
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.left.total_cmp(&b.left));
    }
    rows
}

fn cluster_anchors(sorted_lefts: &[f32], tolerance: f32) -> Vec<f32> {
    let mut anchors: Vec<f32> = Vec::new();
    let mut last = f32::NEG_INFINITY;
    for &x in sorted_lefts {
        if x - last > tolerance {
            anchors.push(x);
        }
        last = x;
    }
    anchors
}

fn column_for(left: f32, anchors: &[f32], tolerance: f32) -> usize {
    anchors
        .iter()
        .rposition(|&a| a <= left + tolerance)
        .unwrap_or(0)
}

fn drop_empty_columns(grid: &mut [Vec<String>]) {
    let Some(width) = grid.first().map(Vec::len) else {
        return;
    };
    let keep: Vec<bool> = (0..width)
        .map(|c| grid.iter().any(|row| !row[c].is_empty()))
        .collect();
    for row in grid.iter_mut() {
        let mut i = 0;
        row.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
    }
}

/// First grid row → cleaned headers, the rest → rows.
fn grid_to_record(page_num: usize, mut grid: Vec<Vec<String>>) -> Option<TableRecord> {
    if grid.is_empty() {
        return None;
    }

    let total_cells: usize = grid.iter().map(Vec::len).sum();
    let empty_cells = grid.iter().flatten().filter(|c| c.is_empty()).count();
    let whitespace = if total_cells == 0 {
        0.0
    } else {
        ((empty_cells as f32 / total_cells as f32) * 10000.0).round() / 100.0
    };

    let headers = grid
        .remove(0)
        .iter()
        .map(|h| h.trim().replace('\n', " ").replace(',', ""))
        .collect();
    let rows = grid
        .into_iter()
        .map(|row| row.into_iter().map(|c| c.replace('\n', "")).collect())
        .collect();

    Some(TableRecord {
        page: page_num,
        title: None,
        headers,
        rows,
        metadata: Some(TableMetadata {
            ocr_method: None,
            whitespace: Some(whitespace),
            order: Some(1),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tb(text: &str, left: f32, top: f32) -> TextBox {
        TextBox {
            text: text.to_string(),
            left,
            right: left + 8.0 * text.len() as f32,
            top,
            bottom: top - 10.0,
        }
    }

    #[test]
    fn grid_from_aligned_columns() {
        let boxes = vec![
            tb("Quarterly report", 50.0, 800.0),
            tb("Item", 50.0, 760.0),
            tb("Qty", 200.0, 760.0),
            tb("Price", 300.0, 761.0),
            tb("Apple", 50.0, 740.0),
            tb("3", 202.0, 740.0),
            tb("1.20", 301.0, 739.0),
            tb("Fig", 51.0, 720.0),
            tb("2.00", 300.0, 720.0),
        ];
        let grid = build_grid(&boxes, 12.0);
        assert_eq!(
            grid,
            vec![
                vec!["Item", "Qty", "Price"],
                vec!["Apple", "3", "1.20"],
                vec!["Fig", "", "2.00"],
            ]
        );
    }

    #[test]
    fn segments_in_one_cell_are_joined() {
        let boxes = vec![
            tb("Unit", 50.0, 700.0),
            tb("price", 52.0, 700.0),
            tb("Total", 200.0, 700.0),
        ];
        let grid = build_grid(&boxes, 12.0);
        assert_eq!(grid, vec![vec!["Unit price", "Total"]]);
    }

    #[test]
    fn prose_only_page_has_no_grid() {
        let boxes = vec![tb("Just a paragraph", 50.0, 700.0), tb("and another", 50.0, 680.0)];
        assert!(build_grid(&boxes, 12.0).is_empty());
        assert!(grid_to_record(1, Vec::new()).is_none());
    }

    #[test]
    fn record_cleans_headers_and_reports_whitespace() {
        let grid = vec![
            vec!["Net, total".to_string(), " Qty ".to_string()],
            vec!["1".to_string(), String::new()],
        ];
        let rec = grid_to_record(4, grid).unwrap();
        assert_eq!(rec.page, 4);
        assert_eq!(rec.headers, vec!["Net total", "Qty"]);
        assert_eq!(rec.rows, vec![vec!["1".to_string(), String::new()]]);
        let meta = rec.metadata.unwrap();
        assert_eq!(meta.whitespace, Some(25.0));
        assert_eq!(meta.order, Some(1));
    }

    #[test]
    fn anchors_cluster_within_tolerance() {
        let anchors = cluster_anchors(&[10.0, 14.0, 20.0, 90.0, 95.0], 12.0);
        assert_eq!(anchors, vec![10.0, 90.0]);
        assert_eq!(column_for(100.0, &anchors, 12.0), 1);
        assert_eq!(column_for(5.0, &anchors, 12.0), 0);
    }
}
