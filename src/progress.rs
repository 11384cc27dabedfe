//! Progress-callback trait for batch extraction events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to be told
//! when each PDF of a batch starts, finishes or fails.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2table::{BatchProgressCallback, ExtractionConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, source: &Path, output: &Path, tables: usize) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} → {} ({} tables)", source.display(), output.display(), tables);
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch driver as it works through a directory.
///
/// Documents run concurrently when `parallel > 1`, so the per-document
/// methods may be called from several tasks at once. Every method has a
/// no-op default.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once, after discovery, before any document starts.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    fn on_document_start(&self, source: &Path) {
        let _ = source;
    }

    /// Called after the output file has been written.
    fn on_document_complete(&self, source: &Path, output: &Path, tables: usize) {
        let _ = (source, output, tables);
    }

    /// Called when a document fails; its siblings keep going.
    fn on_document_error(&self, source: &Path, error: &str) {
        let _ = (source, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// The type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        total: AtomicUsize,
        starts: AtomicUsize,
        tables: AtomicUsize,
        errors: Mutex<Vec<String>>,
        succeeded: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_documents: usize) {
            self.total.store(total_documents, Ordering::SeqCst);
        }

        fn on_document_start(&self, _source: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _source: &Path, _output: &Path, tables: usize) {
            self.tables.fetch_add(tables, Ordering::SeqCst);
        }

        fn on_document_error(&self, source: &Path, error: &str) {
            self.errors
                .lock()
                .unwrap()
                .push(format!("{}: {}", source.display(), error));
        }

        fn on_batch_complete(&self, _total_documents: usize, success_count: usize) {
            self.succeeded.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_document_start(Path::new("a.pdf"));
        cb.on_document_complete(Path::new("a.pdf"), Path::new("a_tables.json"), 3);
        cb.on_document_error(Path::new("b.pdf"), "corrupt");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            tracker.on_document_start(Path::new(name));
        }
        tracker.on_document_complete(Path::new("a.pdf"), Path::new("a_tables.json"), 2);
        tracker.on_document_complete(Path::new("b.pdf"), Path::new("b_tables.json"), 5);
        tracker.on_document_error(Path::new("c.pdf"), "No valid pages");
        tracker.on_batch_complete(3, 2);

        assert_eq!(tracker.total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.tables.load(Ordering::SeqCst), 7);
        assert_eq!(tracker.errors.lock().unwrap().as_slice(), ["c.pdf: No valid pages"]);
        assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(1);
        cb.on_document_start(Path::new("x.pdf"));
    }
}
