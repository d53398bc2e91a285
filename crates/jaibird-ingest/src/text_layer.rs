//! Text-layer extraction for documents that carry embedded text.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use tracing::{debug, warn};

/// Reads the embedded text layer of a document. `None` means nothing usable.
pub trait TextLayerExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, pdf: &Path) -> Option<String>;
}

/// Layout-aware extraction via `pdf-extract`.
pub struct PdfExtractTextLayer;

impl TextLayerExtractor for PdfExtractTextLayer {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(&self, pdf: &Path) -> Option<String> {
        match pdf_extract::extract_text(pdf) {
            Ok(text) => non_empty(text),
            Err(e) => {
                debug!("pdf-extract failed on {}: {}", pdf.display(), e);
                None
            }
        }
    }
}

/// Per-page extraction via `lopdf`.
pub struct LopdfTextLayer;

impl TextLayerExtractor for LopdfTextLayer {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&self, pdf: &Path) -> Option<String> {
        let document = match lopdf::Document::load(pdf) {
            Ok(doc) => doc,
            Err(e) => {
                debug!("lopdf failed to load {}: {}", pdf.display(), e);
                return None;
            }
        };

        let mut text = String::new();
        for page_num in document.get_pages().keys() {
            if let Ok(page_text) = document.extract_text(&[*page_num]) {
                text.push_str(&page_text);
                text.push('\n');
            }
        }
        non_empty(text)
    }
}

/// The default chain: layout-aware first, generic second.
pub fn default_chain() -> Vec<Box<dyn TextLayerExtractor>> {
    vec![Box::new(PdfExtractTextLayer), Box::new(LopdfTextLayer)]
}

/// First non-empty result from `chain`, trimmed.
///
/// PDF libraries panic on some malformed documents; a panicking extractor
/// counts as having produced nothing.
pub fn extract_first(chain: &[Box<dyn TextLayerExtractor>], pdf: &Path) -> Option<String> {
    for extractor in chain {
        match catch_unwind(AssertUnwindSafe(|| extractor.extract(pdf))) {
            Ok(Some(text)) => {
                debug!("{} extracted {} characters", extractor.name(), text.len());
                return Some(text);
            }
            Ok(None) => {}
            Err(_) => warn!("{} panicked on {}", extractor.name(), pdf.display()),
        }
    }
    None
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
