//! Page-tree normalization: remote-API JSON → [`TableRecord`]s.
//!
//! The conversion API returns a loosely specified tree:
//!
//! ```text
//! { "document": { "page": [ { "index": 0,
//!                             "row": [ { "column": [ { "text": "A" },
//!                                                    { "text": { "text": "B" } } ] } ] } ] } }
//! ```
//!
//! Any node may be missing, empty, or of the wrong JSON type, and `page` is a
//! bare object rather than a one-element array for single-page documents.
//! Every level is read as "optional, possibly wrong-shaped"; a wrong shape is
//! treated exactly like an absent one and the node is skipped. Partial output
//! beats aborting a whole document over one unreadable page, so nothing below
//! the top-level object can produce an error.

use crate::error::Pdf2TableError;
use crate::output::TableRecord;
use serde_json::{Map, Value};
use tracing::debug;

/// Checked entry point: the body must be a JSON object.
///
/// A non-object body is a caller bug (the API contract guarantees an
/// object), not a data-shape problem, so it is the only case reported as an
/// error.
pub fn parse_page_tree(body: &Value) -> Result<Vec<TableRecord>, Pdf2TableError> {
    match body {
        Value::Object(map) => Ok(normalize_page_tree(map)),
        other => Err(Pdf2TableError::InvalidPageTree {
            found: json_type_name(other),
        }),
    }
}

/// Convert a page tree into one record per page that has at least one row.
///
/// Records come out in input order. The first row of each page becomes the
/// headers; header and row lengths are not reconciled.
pub fn normalize_page_tree(body: &Map<String, Value>) -> Vec<TableRecord> {
    let pages = body
        .get("document")
        .and_then(Value::as_object)
        .and_then(|doc| doc.get("page"));

    let pages: Vec<&Value> = match pages {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single @ Value::Object(_)) => vec![single],
        _ => return Vec::new(),
    };

    pages.into_iter().filter_map(normalize_page).collect()
}

fn normalize_page(entry: &Value) -> Option<TableRecord> {
    let page = entry.as_object()?;
    let page_num = page_number(page.get("index"));

    let rows = match page.get("row") {
        Some(Value::Array(rows)) if !rows.is_empty() => rows,
        _ => {
            debug!("Page {}: no rows, skipped", page_num);
            return None;
        }
    };

    let mut matrix: Vec<Vec<String>> = rows
        .iter()
        .filter_map(Value::as_object)
        .map(row_cells)
        .collect();

    if matrix.is_empty() {
        debug!("Page {}: no readable rows, skipped", page_num);
        return None;
    }

    let headers = matrix.remove(0);
    Some(TableRecord::new(page_num, headers, matrix))
}

fn row_cells(row: &Map<String, Value>) -> Vec<String> {
    match row.get("column") {
        Some(Value::Array(cells)) => cells
            .iter()
            .filter_map(Value::as_object)
            .map(cell_text)
            .collect(),
        _ => Vec::new(),
    }
}

/// A cell's `text`, unwrapping one level of `{ "text": ... }` indirection.
fn cell_text(cell: &Map<String, Value>) -> String {
    let text = match cell.get("text") {
        Some(Value::Object(inner)) => inner.get("text"),
        other => other,
    };
    coerce_to_string(text).trim().to_string()
}

/// Stringify a scalar; anything structured (or absent) becomes empty.
fn coerce_to_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        _ => String::new(),
    }
}

/// `index + 1`, where a missing or unreadable index counts as 0.
fn page_number(index: Option<&Value>) -> usize {
    let index: i64 = match index {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Bool(true)) => 1,
        _ => 0,
    };
    usize::try_from(index.max(0)).unwrap_or(0).saturating_add(1)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(v: Value) -> Vec<TableRecord> {
        parse_page_tree(&v).expect("object body")
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn worked_example() {
        let body = json!({"document":{"page":{"index":0,"row":[
            {"column":[{"text":"A"},{"text":"B"}]},
            {"column":[{"text":{"text":"1"}},{"text":"2"}]}
        ]}}});
        let out = normalize(body);
        assert_eq!(
            out,
            vec![TableRecord::new(1, strings(&["A", "B"]), vec![strings(&["1", "2"])])]
        );
    }

    #[test]
    fn single_page_object_equals_wrapped_array() {
        let page = json!({"index": 2, "row": [{"column": [{"text": "x"}]}]});
        let bare = normalize(json!({"document": {"page": page.clone()}}));
        let wrapped = normalize(json!({"document": {"page": [page]}}));
        assert_eq!(bare, wrapped);
        assert_eq!(bare[0].page, 3);
    }

    #[test]
    fn nested_text_is_trimmed() {
        let out = normalize(json!({"document":{"page":[{"index":0,"row":[
            {"column":[{"text":{"text":"  Net  "}}]}
        ]}]}}));
        assert_eq!(out[0].headers, strings(&["Net"]));
    }

    #[test]
    fn doubly_nested_text_degrades_to_empty() {
        let out = normalize(json!({"document":{"page":[{"row":[
            {"column":[{"text":{"text":{"text":"deep"}}}, {"text": "ok"}]}
        ]}]}}));
        assert_eq!(out[0].headers, strings(&["", "ok"]));
    }

    #[test]
    fn whitespace_only_and_missing_text_become_empty_cells() {
        let out = normalize(json!({"document":{"page":[{"row":[
            {"column":[{"text":"   "}, {}, {"text": 42}]}
        ]}]}}));
        assert_eq!(out[0].headers, strings(&["", "", "42"]));
    }

    #[test]
    fn empty_and_missing_rows_are_indistinguishable() {
        let empty = normalize(json!({"document":{"page":[{"index":0,"row":[]}]}}));
        let missing = normalize(json!({"document":{"page":[{"index":0}]}}));
        assert!(empty.is_empty());
        assert_eq!(empty, missing);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let out = normalize(json!({"document":{"page":[
            "not a page",
            {"index": 0, "row": "not a list"},
            {"index": 1, "row": [
                7,
                {"column": "not a list"},
                {"column": [3, {"text": "a"}, null]}
            ]},
            {"index": 2, "row": [{"column": [{"text": "b"}]}]}
        ]}}));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].page, 2);
        assert_eq!(out[0].headers, Vec::<String>::new());
        assert_eq!(out[0].rows, vec![strings(&["a"])]);
        assert_eq!(out[1].page, 3);
    }

    #[test]
    fn rows_of_only_junk_drop_the_page() {
        let out = normalize(json!({"document":{"page":[{"row":[1, "x", null]}]}}));
        assert!(out.is_empty());
    }

    #[test]
    fn ragged_rows_are_kept() {
        let out = normalize(json!({"document":{"page":[{"row":[
            {"column":[{"text":"A"},{"text":"B"}]},
            {"column":[{"text":"1"}]},
            {"column":[{"text":"1"},{"text":"2"},{"text":"3"}]}
        ]}]}}));
        assert_eq!(out[0].rows[0].len(), 1);
        assert_eq!(out[0].rows[1].len(), 3);
    }

    #[test]
    fn absent_or_unsupported_page_yields_nothing() {
        assert!(normalize(json!({})).is_empty());
        assert!(normalize(json!({"document": "x"})).is_empty());
        assert!(normalize(json!({"document": {}})).is_empty());
        assert!(normalize(json!({"document": {"page": "string"}})).is_empty());
        assert!(normalize(json!({"document": {"page": 5}})).is_empty());
    }

    #[test]
    fn index_coercion() {
        assert_eq!(page_number(None), 1);
        assert_eq!(page_number(Some(&json!(null))), 1);
        assert_eq!(page_number(Some(&json!("4"))), 5);
        assert_eq!(page_number(Some(&json!(2.9))), 3);
        assert_eq!(page_number(Some(&json!(-3))), 1);
        assert_eq!(page_number(Some(&json!("abc"))), 1);
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = parse_page_tree(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, Pdf2TableError::InvalidPageTree { found: "an array" }));
    }

    #[test]
    fn pages_keep_input_order() {
        let out = normalize(json!({"document":{"page":[
            {"index": 4, "row": [{"column": [{"text": "late"}]}]},
            {"index": 0, "row": [{"column": [{"text": "early"}]}]}
        ]}}));
        let pages: Vec<usize> = out.iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![5, 1]);
    }
}
