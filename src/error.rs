//! Error types for the edgequake-pdf2table library.
//!
//! A single fatal error type, [`Pdf2TableError`], covers every failure the
//! library can report. Remote-API failures of any flavour (network, HTTP
//! status, unparseable body, API-level `error` flag, local file I/O around the
//! API calls) are folded into one uniform [`Pdf2TableError::OperationFailed`]
//! variant carrying a human-readable message and a [`FailureKind`] tag.
//!
//! Malformed *data* coming back from the conversion API is never an error:
//! the normalizer silently skips pages it cannot read. See
//! [`crate::normalize`].

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2table library.
#[derive(Debug, Error)]
pub enum Pdf2TableError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The batch input directory does not exist or is not a directory.
    #[error("Input directory not found: '{path}'")]
    InputDirNotFound { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// None of the selected pages exist in the document.
    #[error("No valid pages to process in '{path}' (document has {total} pages)")]
    NoValidPages { path: PathBuf, total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Every OCR engine in the chain failed on a page.
    #[error("OCR failed for page {page}: {detail}")]
    OcrFailed { page: usize, detail: String },

    // ── Remote API errors ─────────────────────────────────────────────────
    /// A remote-API step failed. `kind` says how; `message` says why.
    #[error("{operation} failed ({kind}): {message}")]
    OperationFailed {
        operation: String,
        kind: FailureKind,
        message: String,
    },

    /// The top-level conversion body was not a JSON object.
    #[error("Page tree must be a JSON object, got {found}")]
    InvalidPageTree { found: &'static str },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The vision-LLM OCR provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another PDF in the same batch already maps to this output file.
    #[error("Output '{output}' for '{path}' collides with '{first}'; rename one of them")]
    DuplicateOutput {
        path: PathBuf,
        output: PathBuf,
        first: PathBuf,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or CLI validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The remote-API key is not set.
    #[error("API key missing: set the {var} environment variable (or pass --api-key).")]
    MissingApiKey { var: &'static str },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform or set PDFIUM_LIB_PATH=/path/to/libpdfium.\n\
Pre-built libraries: https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2TableError {
    /// Shorthand for an [`Pdf2TableError::OperationFailed`].
    pub fn operation(
        operation: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Pdf2TableError::OperationFailed {
            operation: operation.into(),
            kind,
            message: message.into(),
        }
    }
}

/// How a remote-API operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection, TLS, or timeout failure before a response arrived.
    Transport,
    /// The server answered with a non-2xx status.
    HttpStatus(u16),
    /// The response body was not the JSON shape we expected.
    MalformedResponse,
    /// The response carried a truthy `error` flag.
    Api,
    /// Reading the input or writing a downloaded file failed.
    Filesystem,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transport => f.write_str("transport"),
            FailureKind::HttpStatus(code) => write!(f, "HTTP {code}"),
            FailureKind::MalformedResponse => f.write_str("malformed response"),
            FailureKind::Api => f.write_str("api error"),
            FailureKind::Filesystem => f.write_str("filesystem"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_failed_display() {
        let e = Pdf2TableError::operation("Upload", FailureKind::Api, "quota exceeded");
        assert_eq!(e.to_string(), "Upload failed (api error): quota exceeded");
    }

    #[test]
    fn http_status_kind_display() {
        let e = Pdf2TableError::operation("MakeSearchable", FailureKind::HttpStatus(502), "bad gateway");
        assert!(e.to_string().contains("HTTP 502"));
    }

    #[test]
    fn no_valid_pages_display() {
        let e = Pdf2TableError::NoValidPages {
            path: PathBuf::from("report.pdf"),
            total: 4,
        };
        let msg = e.to_string();
        assert!(msg.contains("report.pdf"), "got: {msg}");
        assert!(msg.contains("4 pages"), "got: {msg}");
    }

    #[test]
    fn missing_api_key_names_variable() {
        let e = Pdf2TableError::MissingApiKey { var: "PDFCO_API_KEY" };
        assert!(e.to_string().contains("PDFCO_API_KEY"));
    }
}
