//! PDF rasterisation: render selected pages to `DynamicImage` for OCR.
//!
//! Pages are scaled by `dpi / 72` (PDF user space is 72 points per inch)
//! and the longest edge is capped at `max_rendered_pixels`, so an A0 poster
//! at 300 DPI cannot exhaust memory.

use crate::error::Pdf2TableError;
use crate::pipeline::pdfium::page_at;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

/// Rasterise the listed 1-indexed pages of an open document.
///
/// Blocking; call from `spawn_blocking`.
pub fn render_pages(
    document: &PdfDocument<'_>,
    pages: &[usize],
    dpi: u32,
    max_pixels: u32,
) -> Result<Vec<(usize, DynamicImage)>, Pdf2TableError> {
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / 72.0)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::with_capacity(pages.len());
    for &page_num in pages {
        let page = page_at(document, page_num)?;
        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            Pdf2TableError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );
        results.push((page_num, image));
    }

    Ok(results)
}
