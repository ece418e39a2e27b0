//! Top-level error type for docmark.
//!
//! Each subsystem defines its own diagnostic error next to its code. This
//! enum gathers them so the binaries can return one type and still print
//! every error code and help line through miette.

use miette::Diagnostic;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::client::ClientError;
use crate::mark::ParseMarkError;
use crate::navigator::NavigationError;
use crate::paths::PathError;
use crate::settings::SettingsError;

#[derive(Debug, Error, Diagnostic)]
pub enum DocmarkError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Mark(#[from] ParseMarkError),

    #[error("terminal error: {message}")]
    #[diagnostic(
        code(docmark::terminal),
        help("The review screen needs an interactive terminal.")
    )]
    Terminal { message: String },
}

pub type DocmarkResult<T> = Result<T, DocmarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_keep_their_code() {
        let err: DocmarkError = CatalogError::DocumentNotFound {
            filename: "a.txt".into(),
        }
        .into();
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("docmark::catalog::not_found")
        );

        let err: DocmarkError = NavigationError::NothingOpen.into();
        assert_eq!(err.to_string(), "no document is open");
    }
}
