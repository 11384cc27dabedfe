//! pdfium binding and document loading.
//!
//! Every job binds its own [`Pdfium`] instance and opens its own document, so
//! no pdfium handle is ever shared between concurrently running jobs. All
//! callers run inside `spawn_blocking`.

use crate::error::Pdf2TableError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::fmt::Debug;
use tracing::{debug, warn};

/// Environment variable naming a pdfium shared library (file or directory).
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to pdfium: `PDFIUM_LIB_PATH` first, then the working directory,
/// then the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2TableError> {
    let bindings = match std::env::var(PDFIUM_LIB_ENV) {
        Ok(p) if !p.trim().is_empty() => {
            let path = PathBuf::from(p.trim());
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| Pdf2TableError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

/// Open a PDF, translating pdfium's load failures into typed errors.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2TableError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2TableError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2TableError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Pdf2TableError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// A page's text layer, or `None` (logged) when pdfium cannot load it.
///
/// Callers treat a missing text layer as an empty one, which classifies
/// the page as scanned or drops it from digital extraction.
pub fn text_layer<T, E: Debug>(page_num: usize, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Page {}: text layer unavailable, treating as empty: {:?}", page_num, e);
            None
        }
    }
}

/// Fetch a page by 1-indexed number.
pub fn page_at<'a>(
    document: &PdfDocument<'a>,
    page_num: usize,
) -> Result<PdfPage<'a>, Pdf2TableError> {
    let index = u16::try_from(page_num.saturating_sub(1)).map_err(|_| {
        Pdf2TableError::RasterisationFailed {
            page: page_num,
            detail: "page index exceeds pdfium's u16 range".into(),
        }
    })?;
    document
        .pages()
        .get(index)
        .map_err(|e| Pdf2TableError::RasterisationFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })
}
