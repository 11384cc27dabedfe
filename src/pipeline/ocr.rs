//! OCR engines and the fallback chain that drives them.
//!
//! An [`OcrEngine`] turns one rasterised page into trimmed, non-empty text
//! lines. [`OcrChain`] tries its engines in order: the first one that yields
//! any line wins and its name is reported as the record's `ocr_method`.
//! An engine that errors is logged and skipped; only when every engine
//! errored does the chain fail.

use crate::config::ExtractionConfig;
use crate::error::Pdf2TableError;
use crate::pipeline::encode;
use crate::prompts::OCR_SYSTEM_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use image::DynamicImage;
use std::io::Write;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, warn};

/// A text recogniser for a single page image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short identifier recorded in table metadata.
    fn name(&self) -> &str;

    /// Recognise the page, returning trimmed non-empty lines in reading order.
    async fn recognize_lines(&self, image: &DynamicImage) -> Result<Vec<String>, Pdf2TableError>;
}

/// Lines recognised on a page and the engine that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub engine: String,
    pub lines: Vec<String>,
}

/// Split raw OCR text into trimmed, non-empty lines.
pub fn clean_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Tesseract ────────────────────────────────────────────────────────────

/// Runs the `tesseract` binary on a temporary PNG.
pub struct TesseractEngine {
    binary: String,
    language: String,
    psm: u8,
}

impl TesseractEngine {
    pub fn new(language: impl Into<String>, psm: u8) -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: language.into(),
            psm,
        }
    }

    /// Use a tesseract binary other than the one on `PATH`.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize_lines(&self, image: &DynamicImage) -> Result<Vec<String>, Pdf2TableError> {
        let png = encode::encode_png(image)
            .map_err(|e| Pdf2TableError::Internal(format!("PNG encoding failed: {e}")))?;

        let mut input = tempfile::Builder::new()
            .prefix("pdf2table-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| Pdf2TableError::Internal(format!("tempfile: {e}")))?;
        input
            .write_all(&png)
            .map_err(|e| Pdf2TableError::Internal(format!("tempfile write: {e}")))?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string())
            .output()
            .await
            .map_err(|e| Pdf2TableError::Internal(format!("Failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            return Err(Pdf2TableError::Internal(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let lines = clean_lines(&String::from_utf8_lossy(&output.stdout));
        debug!("tesseract recognised {} lines", lines.len());
        Ok(lines)
    }
}

// ── Vision LLM ───────────────────────────────────────────────────────────

/// Transcribes the page with a vision-capable LLM.
pub struct VisionLlmEngine {
    provider: Arc<dyn LLMProvider>,
    max_tokens: usize,
}

impl VisionLlmEngine {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            max_tokens: 4096,
        }
    }
}

#[async_trait]
impl OcrEngine for VisionLlmEngine {
    fn name(&self) -> &str {
        "vision-llm"
    }

    async fn recognize_lines(&self, image: &DynamicImage) -> Result<Vec<String>, Pdf2TableError> {
        let image_data = encode::encode_page(image)
            .map_err(|e| Pdf2TableError::Internal(format!("PNG encoding failed: {e}")))?;

        let messages = vec![
            ChatMessage::system(OCR_SYSTEM_PROMPT),
            ChatMessage::user_with_images("", vec![image_data]),
        ];
        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| Pdf2TableError::Internal(format!("Vision LLM call failed: {e}")))?;

        debug!(
            "vision-llm: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(clean_lines(&response.content))
    }
}

/// Resolve the vision-LLM provider, most specific first: a pre-built
/// provider, a named provider, then auto-detection from the environment.
pub fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, Pdf2TableError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
        return ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            Pdf2TableError::ProviderNotConfigured {
                provider: name.clone(),
                hint: format!("{e}"),
            }
        });
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2TableError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;
    Ok(llm_provider)
}

// ── Chain ────────────────────────────────────────────────────────────────

/// Ordered list of engines; later engines are fallbacks.
#[derive(Clone)]
pub struct OcrChain {
    engines: Vec<Arc<dyn OcrEngine>>,
}

impl OcrChain {
    pub fn new(engines: Vec<Arc<dyn OcrEngine>>) -> Self {
        Self { engines }
    }

    /// Tesseract alone, or the vision LLM backed by Tesseract when
    /// `config.vlm_ocr` is set.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, Pdf2TableError> {
        let tesseract: Arc<dyn OcrEngine> = Arc::new(TesseractEngine::new(
            config.ocr_language.clone(),
            config.tesseract_psm,
        ));
        let engines = if config.vlm_ocr {
            let vlm: Arc<dyn OcrEngine> = Arc::new(VisionLlmEngine::new(resolve_provider(config)?));
            vec![vlm, tesseract]
        } else {
            vec![tesseract]
        };
        Ok(Self::new(engines))
    }

    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// Recognise one page. `page_num` is only used for error reporting.
    ///
    /// If every engine succeeds with no lines, the last engine's empty
    /// result is returned.
    pub async fn recognize(
        &self,
        page_num: usize,
        image: &DynamicImage,
    ) -> Result<OcrOutput, Pdf2TableError> {
        let mut last_empty: Option<OcrOutput> = None;
        let mut last_err: Option<String> = None;

        for engine in &self.engines {
            match engine.recognize_lines(image).await {
                Ok(lines) if !lines.is_empty() => {
                    return Ok(OcrOutput {
                        engine: engine.name().to_string(),
                        lines,
                    });
                }
                Ok(lines) => {
                    debug!("Page {}: {} found no text", page_num, engine.name());
                    last_empty = Some(OcrOutput {
                        engine: engine.name().to_string(),
                        lines,
                    });
                }
                Err(e) => {
                    warn!("Page {}: {} failed: {}", page_num, engine.name(), e);
                    last_err = Some(format!("{}: {}", engine.name(), e));
                }
            }
        }

        match (last_empty, last_err) {
            (Some(empty), _) => Ok(empty),
            (None, Some(detail)) => Err(Pdf2TableError::OcrFailed {
                page: page_num,
                detail,
            }),
            (None, None) => Err(Pdf2TableError::OcrFailed {
                page: page_num,
                detail: "no OCR engine configured".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    struct Fixed {
        name: &'static str,
        result: Result<Vec<&'static str>, &'static str>,
    }

    #[async_trait]
    impl OcrEngine for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn recognize_lines(&self, _image: &DynamicImage) -> Result<Vec<String>, Pdf2TableError> {
            match &self.result {
                Ok(lines) => Ok(lines.iter().map(|l| l.to_string()).collect()),
                Err(msg) => Err(Pdf2TableError::Internal(msg.to_string())),
            }
        }
    }

    fn engine(name: &'static str, result: Result<Vec<&'static str>, &'static str>) -> Arc<dyn OcrEngine> {
        Arc::new(Fixed { name, result })
    }

    fn blank() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255])))
    }

    #[test]
    fn clean_lines_drops_blanks() {
        assert_eq!(clean_lines("  a b \n\n \t\nc\r\n"), vec!["a b", "c"]);
    }

    #[tokio::test]
    async fn primary_wins_when_it_finds_text() {
        let chain = OcrChain::new(vec![
            engine("primary", Ok(vec!["Name Qty"])),
            engine("fallback", Ok(vec!["other"])),
        ]);
        let out = chain.recognize(1, &blank()).await.unwrap();
        assert_eq!(out.engine, "primary");
        assert_eq!(out.lines, vec!["Name Qty"]);
    }

    #[tokio::test]
    async fn empty_primary_falls_back() {
        let chain = OcrChain::new(vec![
            engine("primary", Ok(vec![])),
            engine("fallback", Ok(vec!["found"])),
        ]);
        let out = chain.recognize(1, &blank()).await.unwrap();
        assert_eq!(out.engine, "fallback");
    }

    #[tokio::test]
    async fn erroring_primary_falls_back() {
        let chain = OcrChain::new(vec![
            engine("primary", Err("model offline")),
            engine("fallback", Ok(vec!["found"])),
        ]);
        assert_eq!(chain.recognize(1, &blank()).await.unwrap().engine, "fallback");
    }

    #[tokio::test]
    async fn all_empty_is_an_empty_success() {
        let chain = OcrChain::new(vec![engine("a", Err("boom")), engine("b", Ok(vec![]))]);
        let out = chain.recognize(1, &blank()).await.unwrap();
        assert_eq!(out.engine, "b");
        assert!(out.lines.is_empty());
    }

    #[tokio::test]
    async fn all_errors_fail_with_last_detail() {
        let chain = OcrChain::new(vec![engine("a", Err("first")), engine("b", Err("second"))]);
        let err = chain.recognize(7, &blank()).await.unwrap_err();
        match err {
            Pdf2TableError::OcrFailed { page, detail } => {
                assert_eq!(page, 7);
                assert!(detail.contains("second"), "got: {detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn default_chain_is_tesseract_only() {
        let chain = OcrChain::from_config(&ExtractionConfig::default()).unwrap();
        assert_eq!(chain.engine_names(), vec!["tesseract"]);
    }
}
