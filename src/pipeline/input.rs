//! Input resolution: validate PDF paths and discover PDFs in a directory.
//!
//! We validate the PDF magic bytes (`%PDF`) up front so callers get a
//! meaningful error rather than a pdfium failure deep inside a worker.

use crate::error::Pdf2TableError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable, and starts with `%PDF`.
pub fn resolve_local(path: &Path) -> Result<PathBuf, Pdf2TableError> {
    if !path.is_file() {
        return Err(Pdf2TableError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2TableError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2TableError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Pdf2TableError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path.to_path_buf())
}

/// List the `*.pdf` files (any extension case) directly inside `dir`,
/// sorted by file name.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>, Pdf2TableError> {
    if !dir.is_dir() {
        return Err(Pdf2TableError::InputDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| {
        Pdf2TableError::Internal(format!("Failed to read directory '{}': {e}", dir.display()))
    })?;

    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && has_pdf_extension(p))
        .collect();
    pdfs.sort();

    debug!("Found {} PDFs in {}", pdfs.len(), dir.display());
    Ok(pdfs)
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// `<stem>` of the input file, used to name every derived output.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf.bak"] {
            std::fs::write(dir.path().join(name), b"%PDF-1.7").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.pdf")).unwrap();

        let found: Vec<String> = discover_pdfs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(found, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn discover_missing_dir() {
        let err = discover_pdfs(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, Pdf2TableError::InputDirNotFound { .. }));
    }

    #[test]
    fn resolve_rejects_missing_and_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.pdf");
        assert!(matches!(
            resolve_local(&missing),
            Err(Pdf2TableError::FileNotFound { .. })
        ));

        let fake = dir.path().join("fake.pdf");
        std::fs::write(&fake, b"GIF89a").unwrap();
        assert!(matches!(
            resolve_local(&fake),
            Err(Pdf2TableError::NotAPdf { magic, .. }) if &magic == b"GIF8"
        ));

        let real = dir.path().join("real.pdf");
        std::fs::write(&real, b"%PDF-1.4\n").unwrap();
        assert_eq!(resolve_local(&real).unwrap(), real);
    }

    #[test]
    fn stem_of_path() {
        assert_eq!(file_stem(Path::new("/x/report.final.pdf")), "report.final");
    }
}
