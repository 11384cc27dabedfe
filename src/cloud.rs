//! Remote conversion pipeline against a PDF.co-compatible REST API.
//!
//! ```text
//! upload ──▶ makesearchable ──▶ download ──▶ convert/to/json2 ──▶ normalize
//! (multipart)   (server OCR)    (<stem>_searchable.pdf)  (page tree)   (records)
//! ```
//!
//! Every step is one request with no retry. Whatever goes wrong (transport,
//! HTTP status, unparseable body, a truthy `error` flag in the envelope, or
//! local file I/O) surfaces as [`Pdf2TableError::OperationFailed`] tagged
//! with the step name and a [`FailureKind`].

use crate::config::CloudConfig;
use crate::error::{FailureKind, Pdf2TableError};
use crate::normalize;
use crate::output::TableRecord;
use crate::pipeline::input;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const OP_UPLOAD: &str = "Upload";
const OP_SEARCHABLE: &str = "MakeSearchable";
const OP_DOWNLOAD: &str = "Download";
const OP_CONVERT: &str = "Convert-to-JSON2";

/// Thin client over the four endpoints the pipeline needs.
pub struct PdfCoClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for PdfCoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfCoClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl PdfCoClient {
    pub fn new(config: &CloudConfig) -> Result<Self, Pdf2TableError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                Pdf2TableError::operation("HTTP client setup", FailureKind::Transport, e.to_string())
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Upload a local file; returns the temporary URL the API assigned it.
    pub async fn upload(&self, path: &Path) -> Result<String, Pdf2TableError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            Pdf2TableError::operation(
                OP_UPLOAD,
                FailureKind::Filesystem,
                format!("cannot read '{}': {e}", path.display()),
            )
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        debug!("Uploading {} ({} bytes)", file_name, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| {
                Pdf2TableError::operation(OP_UPLOAD, FailureKind::Transport, e.to_string())
            })?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("file/upload"))
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport(OP_UPLOAD, e))?;

        let envelope = read_envelope(OP_UPLOAD, response).await?;
        required_str(OP_UPLOAD, &envelope, "url")
    }

    /// Server-side OCR; returns the URL of the searchable PDF named `name`.
    pub async fn make_searchable(&self, url: &str, name: &str) -> Result<String, Pdf2TableError> {
        let envelope = self
            .post_json(OP_SEARCHABLE, "pdf/makesearchable", json!({ "url": url, "name": name }))
            .await?;
        required_str(OP_SEARCHABLE, &envelope, "url")
    }

    /// Fetch `url` and write the bytes to `dest`.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<(), Pdf2TableError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport(OP_DOWNLOAD, e))?;
        let response = check_status(OP_DOWNLOAD, response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport(OP_DOWNLOAD, e))?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| filesystem(OP_DOWNLOAD, dest, e))?;
        }
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| filesystem(OP_DOWNLOAD, dest, e))?;
        debug!("Downloaded {} bytes to {}", bytes.len(), dest.display());
        Ok(())
    }

    /// Convert the PDF at `url` to the JSON2 page tree (inline).
    pub async fn convert_to_json2(&self, url: &str) -> Result<Value, Pdf2TableError> {
        let mut envelope = self
            .post_json(OP_CONVERT, "pdf/convert/to/json2", json!({ "url": url, "inline": true }))
            .await?;
        match envelope.remove("body") {
            // Some deployments return the tree as a JSON-encoded string.
            Some(Value::String(s)) => serde_json::from_str(&s).map_err(|e| {
                Pdf2TableError::operation(
                    OP_CONVERT,
                    FailureKind::MalformedResponse,
                    format!("body is not valid JSON: {e}"),
                )
            }),
            Some(body) => Ok(body),
            None => Err(Pdf2TableError::operation(
                OP_CONVERT,
                FailureKind::MalformedResponse,
                "response has no 'body' field",
            )),
        }
    }

    async fn post_json(
        &self,
        operation: &str,
        path: &str,
        payload: Value,
    ) -> Result<Map<String, Value>, Pdf2TableError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .header("x-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport(operation, e))?;
        read_envelope(operation, response).await
    }
}

/// Steps of [`searchable_tables`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudStep {
    Upload,
    MakeSearchable,
    Download,
    Convert,
    Parse,
}

impl CloudStep {
    /// 1-based position in the pipeline.
    pub fn number(self) -> usize {
        match self {
            CloudStep::Upload => 1,
            CloudStep::MakeSearchable => 2,
            CloudStep::Download => 3,
            CloudStep::Convert => 4,
            CloudStep::Parse => 5,
        }
    }
}

impl fmt::Display for CloudStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloudStep::Upload => "Uploading",
            CloudStep::MakeSearchable => "OCR to searchable PDF",
            CloudStep::Download => "Downloading searchable PDF",
            CloudStep::Convert => "Extracting tables via JSON2",
            CloudStep::Parse => "Parsing tables",
        };
        f.write_str(s)
    }
}

/// Result of the remote pipeline.
#[derive(Debug, Clone)]
pub struct CloudTables {
    pub tables: Vec<TableRecord>,
    /// Where the searchable PDF was saved.
    pub searchable_pdf: PathBuf,
}

/// Run the full remote pipeline for one PDF.
pub async fn searchable_tables(
    input: impl AsRef<Path>,
    config: &CloudConfig,
) -> Result<CloudTables, Pdf2TableError> {
    searchable_tables_with_steps(input, config, |_| {}).await
}

/// [`searchable_tables`], calling `on_step` as each step begins.
pub async fn searchable_tables_with_steps(
    input: impl AsRef<Path>,
    config: &CloudConfig,
    on_step: impl Fn(CloudStep),
) -> Result<CloudTables, Pdf2TableError> {
    let input = input.as_ref();
    let client = PdfCoClient::new(config)?;

    on_step(CloudStep::Upload);
    let uploaded = client.upload(input).await?;
    info!("Uploaded {}", input.display());

    let searchable_name = format!("{}_searchable.pdf", input::file_stem(input));
    on_step(CloudStep::MakeSearchable);
    let searchable_url = client.make_searchable(&uploaded, &searchable_name).await?;

    on_step(CloudStep::Download);
    let searchable_pdf = config.searchable_dir.join(&searchable_name);
    client.download(&searchable_url, &searchable_pdf).await?;
    info!("Saved {}", searchable_pdf.display());

    on_step(CloudStep::Convert);
    let body = client.convert_to_json2(&searchable_url).await?;

    on_step(CloudStep::Parse);
    let tables = normalize::parse_page_tree(&body)?;
    info!("Parsed {} tables", tables.len());

    Ok(CloudTables {
        tables,
        searchable_pdf,
    })
}

// ── Envelope handling ────────────────────────────────────────────────────

async fn check_status(operation: &str, response: Response) -> Result<Response, Pdf2TableError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(Pdf2TableError::operation(
        operation,
        FailureKind::HttpStatus(status.as_u16()),
        format!("{status}: {}", text.trim()),
    ))
}

async fn read_envelope(
    operation: &str,
    response: Response,
) -> Result<Map<String, Value>, Pdf2TableError> {
    let response = check_status(operation, response).await?;
    let value: Value = response.json().await.map_err(|e| {
        Pdf2TableError::operation(operation, FailureKind::MalformedResponse, e.to_string())
    })?;
    check_envelope(operation, value)
}

/// Validate a decoded response envelope: it must be an object whose `error`
/// field, if present, is falsy.
pub fn check_envelope(operation: &str, value: Value) -> Result<Map<String, Value>, Pdf2TableError> {
    let Value::Object(map) = value else {
        return Err(Pdf2TableError::operation(
            operation,
            FailureKind::MalformedResponse,
            "response is not a JSON object",
        ));
    };

    if map.get("error").is_some_and(is_truthy) {
        let message = match map.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        return Err(Pdf2TableError::operation(operation, FailureKind::Api, message));
    }
    Ok(map)
}

/// Truthiness of a JSON value: `null`, `false`, zero and empty
/// strings/arrays/objects are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn required_str(
    operation: &str,
    envelope: &Map<String, Value>,
    key: &str,
) -> Result<String, Pdf2TableError> {
    envelope
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            Pdf2TableError::operation(
                operation,
                FailureKind::MalformedResponse,
                format!("response has no string '{key}' field"),
            )
        })
}

fn transport(operation: &str, e: reqwest::Error) -> Pdf2TableError {
    Pdf2TableError::operation(operation, FailureKind::Transport, e.to_string())
}

fn filesystem(operation: &str, path: &Path, e: std::io::Error) -> Pdf2TableError {
    Pdf2TableError::operation(
        operation,
        FailureKind::Filesystem,
        format!("'{}': {e}", path.display()),
    )
}
