//! Bulk-marking filter: compile a [`FilterRequest`] once, then test documents.

use regex::Regex;

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::model::{DocumentContent, DocumentKind, FilterRequest};
use crate::catalog::pdf;
use crate::mark::Mark;

/// A validated filter, ready to match documents.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    name: Option<Regex>,
    content: Option<Regex>,
    min: usize,
    max: usize,
    mark: Mark,
}

impl FilterRequest {
    /// Validate patterns and range. Both the client and the server run this,
    /// so a malformed pattern never leaves the reviewer's machine.
    pub fn compile(&self) -> CatalogResult<CompiledFilter> {
        let name = compile_optional("filename", &self.file_name_regex)?;
        let content = compile_optional("content", &self.content_pattern)?;
        let (min, max) = (self.min(), self.max());
        if min > max {
            return Err(CatalogError::InvalidRange { min, max });
        }
        Ok(CompiledFilter {
            name,
            content,
            min,
            max,
            mark: self.mark_color,
        })
    }
}

fn compile_optional(field: &'static str, pattern: &str) -> CatalogResult<Option<Regex>> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Ok(None);
    }
    Regex::new(pattern)
        .map(Some)
        .map_err(|e| CatalogError::InvalidPattern {
            field,
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// Length and searchable text of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measured {
    /// Characters for text, pages for PDF.
    pub length: usize,
    pub text: String,
}

/// Measure a document for filtering.
pub fn measure(doc: &DocumentContent) -> CatalogResult<Measured> {
    match doc.kind {
        DocumentKind::Text => {
            let text =
                String::from_utf8(doc.bytes.clone()).map_err(|e| CatalogError::ParseError {
                    format: "text".into(),
                    message: e.to_string(),
                })?;
            Ok(Measured {
                length: text.chars().count(),
                text,
            })
        }
        DocumentKind::Pdf => {
            let extracted = pdf::extract(&doc.bytes)?;
            Ok(Measured {
                length: extracted.page_count(),
                text: extracted.text(),
            })
        }
    }
}

impl CompiledFilter {
    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// Filename test; cheap, run before reading the document.
    pub fn matches_name(&self, filename: &str) -> bool {
        self.name.as_ref().is_none_or(|re| re.is_match(filename))
    }

    /// Length and content test on a measured document.
    pub fn matches_measured(&self, measured: &Measured) -> bool {
        (self.min..=self.max).contains(&measured.length)
            && self
                .content
                .as_ref()
                .is_none_or(|re| re.is_match(&measured.text))
    }

    /// Full test. Errors mean the document could not be read or parsed.
    pub fn matches(&self, doc: &DocumentContent) -> CatalogResult<bool> {
        if !self.matches_name(&doc.filename) {
            return Ok(false);
        }
        Ok(self.matches_measured(&measure(doc)?))
    }
}
