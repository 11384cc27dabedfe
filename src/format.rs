//! Output writers: table records → JSON or Markdown text, and atomic file writes.

use crate::config::OutputFormat;
use crate::error::Pdf2TableError;
use crate::output::TableRecord;
use serde::Serialize;
use std::path::Path;

/// Render records in the requested format.
pub fn render(records: &[TableRecord], format: OutputFormat) -> Result<String, Pdf2TableError> {
    match format {
        OutputFormat::Json => to_json(records),
        OutputFormat::Markdown => Ok(to_markdown(records)),
    }
}

/// Pretty-printed JSON array with 4-space indentation.
pub fn to_json(records: &[TableRecord]) -> Result<String, Pdf2TableError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records
        .serialize(&mut ser)
        .map_err(|e| Pdf2TableError::Internal(format!("JSON serialisation failed: {e}")))?;
    String::from_utf8(buf).map_err(|e| Pdf2TableError::Internal(e.to_string()))
}

/// One `### Page <n> — <title>` section per record, each followed by a
/// GitHub-flavored table.
pub fn to_markdown(records: &[TableRecord]) -> String {
    let mut md = String::new();
    for record in records {
        let title = record
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("Table");
        md.push_str(&format!("### Page {} — {}\n\n", record.page, title));
        let table = github_table(&record.headers, &record.rows);
        if !table.is_empty() {
            md.push_str(&table);
            md.push_str("\n\n");
        }
    }
    md
}

/// Render a width-aligned GitHub table. Rows are padded or truncated to the
/// header count; no headers means no table.
pub fn github_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let ncols = headers.len();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            (0..ncols)
                .map(|i| escape_cell(row.get(i).map(String::as_str).unwrap_or("")))
                .collect()
        })
        .collect();
    let head: Vec<String> = headers.iter().map(|h| escape_cell(h)).collect();

    let mut widths: Vec<usize> = head.iter().map(|h| h.chars().count().max(1)).collect();
    for row in &body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(body.len() + 2);
    lines.push(format_row(&head, &widths));
    lines.push(format!(
        "|{}|",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("|")
    ));
    for row in &body {
        lines.push(format_row(row, &widths));
    }
    lines.join("\n")
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| {
            let pad = w.saturating_sub(cell.chars().count());
            format!(" {}{} ", cell, " ".repeat(pad))
        })
        .collect();
    format!("|{}|", padded.join("|"))
}

/// Pipes would split the cell and newlines would end the row.
fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Write `contents` to `path` via a sibling temp file and rename, creating
/// parent directories as needed.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), Pdf2TableError> {
    let fail = |source: std::io::Error| Pdf2TableError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(fail)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TableRecord;

    fn s(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn json_uses_four_space_indent() {
        let json = to_json(&[TableRecord::new(1, s(&["A"]), vec![])]).unwrap();
        assert!(json.starts_with("[\n    {\n        \"page\": 1,"), "got:\n{json}");
    }

    #[test]
    fn empty_record_list_is_empty_array() {
        assert_eq!(to_json(&[]).unwrap(), "[]");
        assert_eq!(to_markdown(&[]), "");
    }

    #[test]
    fn github_table_aligns_and_pads() {
        let table = github_table(&s(&["Item", "Qty"]), &[s(&["Apple", "3"]), s(&["Fig"])]);
        let expected = "\
| Item  | Qty |
|-------|-----|
| Apple | 3   |
| Fig   |     |";
        assert_eq!(table, expected);
    }

    #[test]
    fn github_table_truncates_long_rows_and_escapes_pipes() {
        let table = github_table(&s(&["A"]), &[s(&["x|y", "dropped"])]);
        assert!(table.contains("x\\|y"));
        assert!(!table.contains("dropped"));
    }

    #[test]
    fn markdown_heading_uses_title_or_fallback() {
        let mut titled = TableRecord::new(3, s(&["A"]), vec![s(&["1"])]);
        titled.title = Some("Balance Sheet".into());
        let untitled = TableRecord::new(4, vec![], vec![]);
        let md = to_markdown(&[titled, untitled]);
        assert!(md.starts_with("### Page 3 — Balance Sheet\n\n| A |"));
        assert!(md.contains("### Page 4 — Table\n\n"));
    }

    #[tokio::test]
    async fn write_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        write_atomic(&path, "[]").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
        assert!(!dir.path().join("nested/out.json.tmp").exists());
    }
}
