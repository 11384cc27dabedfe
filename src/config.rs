//! Configuration types for table extraction.
//!
//! Local extraction (digital text layer or OCR) is controlled through
//! [`ExtractionConfig`], built via its [`ExtractionConfigBuilder`]. The
//! remote conversion pipeline has its own, much smaller [`CloudConfig`].
//!
//! Page selections follow the CLI grammar: a comma list of 1-indexed page
//! numbers and/or `start-end` ranges, whose union is processed.

use crate::error::Pdf2TableError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Environment variable holding the remote-API key.
pub const API_KEY_ENV: &str = "PDFCO_API_KEY";

/// Environment variable overriding the remote-API base URL.
pub const BASE_URL_ENV: &str = "PDFCO_BASE_URL";

/// Default remote-API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.pdf.co/v1";

/// Pages whose trimmed text layer is shorter than this are treated as scanned.
pub const SCANNED_TEXT_THRESHOLD: usize = 20;

/// Configuration for local (pdfium + OCR) table extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2table::{ExtractionConfig, OutputFormat, PageSelection};
///
/// let config = ExtractionConfig::builder()
///     .pages("1-3,5".parse::<PageSelection>().unwrap())
///     .format(OutputFormat::Markdown)
///     .parallel(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Pages to extract. Default: all pages.
    pub pages: PageSelection,

    /// Output file format. Default: JSON.
    pub format: OutputFormat,

    /// Number of documents processed concurrently by the batch driver. Default: 1.
    pub parallel: usize,

    /// Directory that receives `<stem>_tables.{json,md}`. Default: current directory.
    pub output_dir: PathBuf,

    /// Rasterisation DPI for OCR. Range: 72–600. Default: 300.
    ///
    /// OCR engines want glyphs at least ~20 px tall; 300 DPI gets body text
    /// there on letter-sized scans.
    pub dpi: u32,

    /// Cap on the longest edge of a rasterised page, in pixels. Default: 5000.
    pub max_rendered_pixels: u32,

    /// Text-layer length below which a document counts as scanned. Default: 20.
    pub scan_threshold: usize,

    /// Horizontal distance (PDF points) within which left edges share a column. Default: 12.0.
    pub column_tolerance: f32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Tesseract language code(s), e.g. `eng` or `eng+deu`. Default: `eng`.
    pub ocr_language: String,

    /// Tesseract page segmentation mode. Default: 6 (a single uniform block).
    pub tesseract_psm: u8,

    /// Use a vision LLM as the primary OCR engine, Tesseract as fallback. Default: false.
    pub vlm_ocr: bool,

    /// Vision LLM provider name (e.g. "openai", "ollama"). Auto-detected if None.
    pub provider_name: Option<String>,

    /// Vision LLM model identifier.
    pub model: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Optional progress callback for the batch driver.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pages: PageSelection::default(),
            format: OutputFormat::default(),
            parallel: 1,
            output_dir: PathBuf::from("."),
            dpi: 300,
            max_rendered_pixels: 5000,
            scan_threshold: SCANNED_TEXT_THRESHOLD,
            column_tolerance: 12.0,
            password: None,
            ocr_language: "eng".to_string(),
            tesseract_psm: 6,
            vlm_ocr: false,
            provider_name: None,
            model: None,
            provider: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("pages", &self.pages)
            .field("format", &self.format)
            .field("parallel", &self.parallel)
            .field("output_dir", &self.output_dir)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("scan_threshold", &self.scan_threshold)
            .field("column_tolerance", &self.column_tolerance)
            .field("ocr_language", &self.ocr_language)
            .field("tesseract_psm", &self.tesseract_psm)
            .field("vlm_ocr", &self.vlm_ocr)
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn parallel(mut self, n: usize) -> Self {
        self.config.parallel = n.max(1);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn scan_threshold(mut self, chars: usize) -> Self {
        self.config.scan_threshold = chars;
        self
    }

    pub fn column_tolerance(mut self, points: f32) -> Self {
        self.config.column_tolerance = points;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_psm(mut self, psm: u8) -> Self {
        self.config.tesseract_psm = psm;
        self
    }

    pub fn vlm_ocr(mut self, v: bool) -> Self {
        self.config.vlm_ocr = v;
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Pdf2TableError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(Pdf2TableError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.parallel == 0 {
            return Err(Pdf2TableError::InvalidConfig(
                "Parallel job count must be ≥ 1".into(),
            ));
        }
        if !(c.column_tolerance > 0.0) {
            return Err(Pdf2TableError::InvalidConfig(format!(
                "Column tolerance must be positive, got {}",
                c.column_tolerance
            )));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(Pdf2TableError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Configuration for the remote conversion pipeline.
#[derive(Clone)]
pub struct CloudConfig {
    /// API key sent as `x-api-key`.
    pub api_key: String,

    /// API base URL without trailing slash. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Per-request timeout in seconds. Default: 300.
    ///
    /// OCR of a long scan runs server-side inside the request.
    pub timeout_secs: u64,

    /// Directory receiving `<stem>_searchable.pdf`. Default: current directory.
    pub searchable_dir: PathBuf,
}

impl fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("searchable_dir", &self.searchable_dir)
            .finish()
    }
}

impl CloudConfig {
    /// Create a config for the given key with default endpoint and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 300,
            searchable_dir: PathBuf::from("."),
        }
    }

    /// Read the API key (and optional base URL) from the environment.
    ///
    /// Fails fast with [`Pdf2TableError::MissingApiKey`] when the key is unset
    /// or blank.
    pub fn from_env() -> Result<Self, Pdf2TableError> {
        let key = std::env::var(API_KEY_ENV).unwrap_or_default();
        let mut config = Self::from_key(Some(key))?;
        if let Ok(base) = std::env::var(BASE_URL_ENV) {
            if !base.trim().is_empty() {
                config = config.with_base_url(base);
            }
        }
        Ok(config)
    }

    /// Validate an optional key, e.g. from a CLI flag.
    pub fn from_key(key: Option<String>) -> Result<Self, Pdf2TableError> {
        match key {
            Some(k) if !k.trim().is_empty() => Ok(Self::new(k.trim())),
            _ => Err(Pdf2TableError::MissingApiKey { var: API_KEY_ENV }),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_searchable_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.searchable_dir = dir.into();
        self
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Output file format for extracted tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON array of table records. (default)
    #[default]
    Json,
    /// One GitHub-flavored table per record, under a `### Page` heading.
    Markdown,
}

impl OutputFormat {
    /// File extension used for output files.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
        }
    }
}

/// Specifies which pages of the PDF to extract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, sorted, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into sorted, deduplicated 1-indexed pages that
    /// exist in a document of `total_pages` pages.
    pub fn to_pages(&self, total_pages: usize) -> Vec<usize> {
        let in_doc = |p: &usize| *p >= 1 && *p <= total_pages;
        let mut pages: Vec<usize> = match self {
            PageSelection::All => (1..=total_pages).collect(),
            PageSelection::Single(p) => Some(*p).into_iter().filter(in_doc).collect(),
            PageSelection::Range(start, end) => {
                ((*start).max(1)..=(*end).min(total_pages)).collect()
            }
            PageSelection::Set(pages) => pages.iter().copied().filter(in_doc).collect(),
        };
        pages.sort_unstable();
        pages.dedup();
        pages
    }
}

static RE_PAGE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*-\s*(\d+)$").expect("valid page-range regex"));

impl FromStr for PageSelection {
    type Err = Pdf2TableError;

    /// Parse `all`, `5`, `3-15`, or any comma list mixing both (`1-3,5`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "all" {
            return Ok(PageSelection::All);
        }
        if s.is_empty() {
            return Err(Pdf2TableError::InvalidConfig("Empty page selection".into()));
        }

        let mut parts: Vec<PageSelection> = Vec::new();
        for token in s.split(',').map(str::trim) {
            if let Some(caps) = RE_PAGE_RANGE.captures(token) {
                let start = parse_page_number(&caps[1])?;
                let end = parse_page_number(&caps[2])?;
                if start > end {
                    return Err(Pdf2TableError::InvalidConfig(format!(
                        "Invalid page range '{token}': start must be <= end"
                    )));
                }
                parts.push(PageSelection::Range(start, end));
            } else {
                parts.push(PageSelection::Single(parse_page_number(token)?));
            }
        }

        if parts.len() == 1 {
            return Ok(parts.remove(0));
        }

        let union: BTreeSet<usize> = parts
            .iter()
            .flat_map(|p| match p {
                PageSelection::Single(n) => vec![*n],
                PageSelection::Range(a, b) => (*a..=*b).collect(),
                _ => Vec::new(),
            })
            .collect();
        Ok(PageSelection::Set(union.into_iter().collect()))
    }
}

fn parse_page_number(token: &str) -> Result<usize, Pdf2TableError> {
    let page: usize = token
        .trim()
        .parse()
        .map_err(|_| Pdf2TableError::InvalidConfig(format!("Invalid page number: '{token}'")))?;
    if page < 1 {
        return Err(Pdf2TableError::InvalidConfig(format!(
            "Pages are 1-indexed, minimum is 1 (got {page})"
        )));
    }
    Ok(page)
}
