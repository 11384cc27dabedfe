//! Streaming batch API: emit one outcome per PDF as it completes.
//!
//! Documents run `parallel` at a time and arrive in completion order, not
//! directory order. A failed document yields an `Err` outcome and the rest
//! of the batch carries on; nothing cancels siblings.

use crate::config::ExtractionConfig;
use crate::convert;
use crate::error::Pdf2TableError;
use crate::output::DocumentOutcome;
use crate::pipeline::input;
use crate::progress::{NoopProgressCallback, ProgressCallback};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{info, warn};

/// A boxed stream of per-document outcomes.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentOutcome> + Send>>;

/// Discover the PDFs in `dir` and convert them as a stream.
///
/// Fires `on_batch_start` immediately; `on_batch_complete` is left to the
/// caller, who sees the stream end ([`convert::convert_dir`] fires it).
///
/// # Errors
/// `InputDirNotFound` when `dir` is not a directory.
pub fn convert_dir_stream(
    dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<DocumentStream, Pdf2TableError> {
    let pdfs = input::discover_pdfs(dir.as_ref())?;
    info!("Found {} PDFs in {}", pdfs.len(), dir.as_ref().display());
    Ok(convert_files_stream(pdfs, config))
}

/// Convert an explicit list of PDFs as a stream.
///
/// Two inputs that map to the same output file (`x.pdf` and `x.PDF`, or
/// equal stems in different directories) are never both converted: the
/// later one fails with `DuplicateOutput` without being opened.
pub fn convert_files_stream(pdfs: Vec<PathBuf>, config: &ExtractionConfig) -> DocumentStream {
    let callback: ProgressCallback = config
        .progress_callback
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback));
    callback.on_batch_start(pdfs.len());

    let jobs = claim_outputs(pdfs, config);
    let concurrency = config.parallel.max(1);
    let config = config.clone();

    let s = stream::iter(jobs.into_iter().map(move |(pdf, collision)| {
        let cfg = config.clone();
        let cb = Arc::clone(&callback);
        async move {
            cb.on_document_start(&pdf);
            let converted = match collision {
                Some(err) => Err(err),
                None => convert::convert_document(&pdf, &cfg).await,
            };
            let result = match converted {
                Ok((out_path, tables)) => {
                    cb.on_document_complete(&pdf, &out_path, tables);
                    Ok(out_path)
                }
                Err(e) => {
                    warn!("Failed processing {}: {}", pdf.display(), e);
                    cb.on_document_error(&pdf, &e.to_string());
                    Err(e)
                }
            };
            DocumentOutcome { source: pdf, result }
        }
    }))
    .buffer_unordered(concurrency);

    Box::pin(s)
}

/// Pair each PDF with the error it gets if an earlier PDF already owns its
/// output path.
fn claim_outputs(
    pdfs: Vec<PathBuf>,
    config: &ExtractionConfig,
) -> Vec<(PathBuf, Option<Pdf2TableError>)> {
    let mut owners: HashMap<PathBuf, PathBuf> = HashMap::new();
    pdfs.into_iter()
        .map(|pdf| {
            let output = convert::output_path(&pdf, config);
            let collision = match owners.get(&output) {
                Some(first) => Some(Pdf2TableError::DuplicateOutput {
                    path: pdf.clone(),
                    output,
                    first: first.clone(),
                }),
                None => {
                    owners.insert(output, pdf.clone());
                    None
                }
            };
            (pdf, collision)
        })
        .collect()
}
