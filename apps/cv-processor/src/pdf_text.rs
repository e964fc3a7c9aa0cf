//! Text Extractor — turns a PDF on disk into one plain-text string.
//!
//! Pages are visited in page-number order and their text concatenated with
//! no separator. A page whose text cannot be extracted contributes nothing;
//! only a file that cannot be opened as a PDF at all is an error.

use std::path::Path;

use lopdf::Document;
use tracing::warn;

use crate::errors::AppError;

/// Source of plain text for a résumé file. `PdfTextExtractor` is the real one;
/// the orchestrator tests substitute their own.
pub trait DocumentReader: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, AppError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl DocumentReader for PdfTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, AppError> {
        let doc = Document::load(path).map_err(|e| AppError::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(concat_pages(&doc, path))
    }
}

fn concat_pages(doc: &Document, path: &Path) -> String {
    let mut text = String::new();
    // get_pages() is a BTreeMap keyed by 1-based page number
    for page_num in doc.get_pages().keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => {
                warn!(
                    "No text extracted from page {} of {}: {}",
                    page_num,
                    path.display(),
                    e
                );
            }
        }
    }
    text
}
