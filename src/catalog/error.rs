//! Rich diagnostic error types for the document catalog.

use miette::Diagnostic;
use thiserror::Error;

/// Errors from catalog operations.
#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("document not found: \"{filename}\"")]
    #[diagnostic(
        code(docmark::catalog::not_found),
        help(
            "No document with this name exists in the documents directory. \
             List available documents with `docmark list`."
        )
    )]
    DocumentNotFound { filename: String },

    #[error("invalid document name: \"{filename}\"")]
    #[diagnostic(
        code(docmark::catalog::invalid_name),
        help("Document names are plain file names without directory components.")
    )]
    InvalidName { filename: String },

    #[error("unsupported document type: \"{filename}\"")]
    #[diagnostic(
        code(docmark::catalog::unsupported_format),
        help("Only .txt and .pdf documents can be reviewed.")
    )]
    UnsupportedFormat { filename: String },

    #[error("invalid {field} pattern \"{pattern}\": {message}")]
    #[diagnostic(
        code(docmark::catalog::invalid_pattern),
        help("Filter patterns are regular expressions. Escape literal characters such as `.` or `(`.")
    )]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        message: String,
    },

    #[error("invalid length range: min {min} is greater than max {max}")]
    #[diagnostic(
        code(docmark::catalog::invalid_range),
        help("Choose a minimum length that does not exceed the maximum.")
    )]
    InvalidRange { min: usize, max: usize },

    #[error("parse error in {format} document: {message}")]
    #[diagnostic(
        code(docmark::catalog::parse_error),
        help("The document could not be parsed. Verify the file is valid {format} and not corrupted.")
    )]
    ParseError { format: String, message: String },

    #[error("mark store error: {message}")]
    #[diagnostic(
        code(docmark::catalog::mark_store),
        help(
            "Failed to read or write data/marks.json. Check that the data \
             directory exists and has correct permissions."
        )
    )]
    MarkStore { message: String },

    #[error("export failed: {message}")]
    #[diagnostic(
        code(docmark::catalog::export),
        help("Check that the exports directory is writable and not held open by another program.")
    )]
    Export { message: String },

    #[error("I/O error on {path}: {source}")]
    #[diagnostic(
        code(docmark::catalog::io),
        help("A filesystem operation failed. Check file paths and permissions.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] crate::paths::PathError),
}

/// Convenience alias for catalog operation results.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
