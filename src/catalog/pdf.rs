//! PDF text extraction using the `pdf-extract` crate.
//!
//! `pdf-extract` returns all pages as a single string, so pages are recovered
//! with page-break heuristics: form feeds when present, triple newlines
//! otherwise. The page count drives PDF length filtering.

use crate::catalog::error::{CatalogError, CatalogResult};

/// Extracted text of a PDF, one entry per page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfText {
    pub pages: Vec<String>,
}

impl PdfText {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages joined with blank lines.
    pub fn text(&self) -> String {
        self.pages.join("\n\n")
    }
}

/// Extract page text from PDF bytes.
pub fn extract(data: &[u8]) -> CatalogResult<PdfText> {
    // pdf-extract panics on some malformed inputs.
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data));
    let text = match result {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            return Err(CatalogError::ParseError {
                format: "pdf".into(),
                message: e.to_string(),
            });
        }
        Err(_) => {
            return Err(CatalogError::ParseError {
                format: "pdf".into(),
                message: "pdf parser panicked".into(),
            });
        }
    };
    Ok(split_pages(&text))
}

/// Split extracted text into pages.
pub fn split_pages(text: &str) -> PdfText {
    let mut pages: Vec<String> = if text.contains('\x0C') {
        // Interior blank pages are real pages; only the trailing break is not.
        text.split('\x0C').map(|p| p.trim().to_string()).collect()
    } else {
        text.split("\n\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    };

    while pages.last().is_some_and(|p| p.is_empty()) {
        pages.pop();
    }

    PdfText { pages }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_pdf_bytes_are_a_parse_error() {
        let err = extract(b"This is not a PDF").unwrap_err();
        assert!(matches!(err, CatalogError::ParseError { .. }));
    }

    #[test]
    fn splits_on_form_feeds() {
        let pages = split_pages("first page\x0Csecond page\x0C\x0Cfourth\x0C");
        assert_eq!(pages.page_count(), 4);
        assert_eq!(pages.pages[0], "first page");
        assert_eq!(pages.pages[2], "");
        assert_eq!(pages.pages[3], "fourth");
    }

    #[test]
    fn falls_back_to_triple_newlines() {
        let pages = split_pages("one\nstill one\n\n\ntwo\n\n\n\n\nthree\n");
        assert_eq!(pages.page_count(), 3);
        assert_eq!(pages.text(), "one\nstill one\n\ntwo\n\nthree");
    }

    #[test]
    fn empty_text_has_no_pages() {
        assert_eq!(split_pages("   \n").page_count(), 0);
    }
}
