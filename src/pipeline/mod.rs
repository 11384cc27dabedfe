//! Pipeline stages for local table extraction.
//!
//! ```text
//! input ──▶ pdfium ──▶ classify ─┬─▶ digital                      (text layer)
//!                                └─▶ render ──▶ ocr ──▶ scanned    (raster)
//! ```
//!
//! 1. [`input`]    validate the PDF path, discover PDFs in a directory
//! 2. [`pdfium`]   bind the library and open the document
//! 3. [`classify`] decide digital vs. scanned from one sampled page
//! 4. [`digital`]  rebuild table grids from positioned text segments
//! 5. [`render`]   rasterise pages for OCR
//! 6. [`encode`]   PNG / base64 for the OCR engines
//! 7. [`ocr`]      Tesseract and vision-LLM engines behind a fallback chain
//! 8. [`scanned`]  turn OCR lines into records
//!
//! Stages 2 to 5 touch pdfium and run inside `spawn_blocking`.

pub mod classify;
pub mod digital;
pub mod encode;
pub mod input;
pub mod ocr;
pub mod pdfium;
pub mod render;
pub mod scanned;
