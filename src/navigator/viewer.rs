//! What the viewer pane shows for the current document.

use crate::catalog::{DocumentContent, DocumentKind, pdf};

/// Rendered state of the viewer pane.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Viewer {
    /// Nothing open.
    #[default]
    Empty,
    /// Content requested, reply not yet applied.
    Loading { filename: String },
    Text { filename: String, text: String },
    Pdf { filename: String, pages: Vec<String> },
    /// Fetched, but could not be decoded for display.
    Unreadable { filename: String, reason: String },
    /// The fetch itself failed.
    Failed { filename: String, message: String },
}

impl Viewer {
    /// Decode fetched bytes according to the document kind.
    ///
    /// Text is decoded lossily so a stray invalid byte never hides a
    /// document. PDFs are reduced to their extracted page text.
    pub fn from_content(content: DocumentContent) -> Self {
        let DocumentContent {
            filename,
            kind,
            bytes,
        } = content;
        match kind {
            DocumentKind::Text => Viewer::Text {
                filename,
                text: String::from_utf8_lossy(&bytes).into_owned(),
            },
            DocumentKind::Pdf => match pdf::extract(&bytes) {
                Ok(extracted) => Viewer::Pdf {
                    filename,
                    pages: extracted.pages,
                },
                Err(e) => {
                    tracing::warn!(file = %filename, error = %e, "pdf not renderable");
                    Viewer::Unreadable {
                        filename,
                        reason: e.to_string(),
                    }
                }
            },
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            Viewer::Empty => None,
            Viewer::Loading { filename }
            | Viewer::Text { filename, .. }
            | Viewer::Pdf { filename, .. }
            | Viewer::Unreadable { filename, .. }
            | Viewer::Failed { filename, .. } => Some(filename),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Viewer::Loading { .. })
    }

    /// Lines to draw. PDF pages are separated by a page rule.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Viewer::Empty => vec!["No document open.".to_string()],
            Viewer::Loading { filename } => vec![format!("Loading {filename}...")],
            Viewer::Text { text, .. } => text.lines().map(str::to_string).collect(),
            Viewer::Pdf { pages, .. } => {
                let mut out = Vec::new();
                for (i, page) in pages.iter().enumerate() {
                    out.push(format!("── page {} of {} ──", i + 1, pages.len()));
                    out.extend(page.lines().map(str::to_string));
                    out.push(String::new());
                }
                out
            }
            Viewer::Unreadable { reason, .. } => vec![format!("Cannot display document: {reason}")],
            Viewer::Failed { message, .. } => vec![format!("Failed to load document: {message}")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_decoded_lossily() {
        let viewer = Viewer::from_content(DocumentContent {
            filename: "a.txt".into(),
            kind: DocumentKind::Text,
            bytes: b"ok\xffline\nnext".to_vec(),
        });
        let Viewer::Text { text, .. } = &viewer else {
            panic!("expected text, got {viewer:?}");
        };
        assert!(text.starts_with("ok"));
        assert_eq!(viewer.lines().len(), 2);
        assert_eq!(viewer.filename(), Some("a.txt"));
    }

    #[test]
    fn broken_pdf_is_unreadable() {
        let viewer = Viewer::from_content(DocumentContent {
            filename: "b.pdf".into(),
            kind: DocumentKind::Pdf,
            bytes: b"not a pdf".to_vec(),
        });
        assert!(matches!(viewer, Viewer::Unreadable { .. }));
        assert_eq!(viewer.filename(), Some("b.pdf"));
    }

    #[test]
    fn pdf_lines_carry_page_rules() {
        let viewer = Viewer::Pdf {
            filename: "b.pdf".into(),
            pages: vec!["one".into(), "two".into()],
        };
        let lines = viewer.lines();
        assert_eq!(lines[0], "── page 1 of 2 ──");
        assert_eq!(lines[1], "one");
        assert!(lines.contains(&"── page 2 of 2 ──".to_string()));
    }
}
