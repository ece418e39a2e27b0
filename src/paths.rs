//! Project directory layout for docmark.
//!
//! A review project is a single root directory:
//!
//! ```text
//! <root>/
//!   documents/          files under review (.txt, .pdf)
//!   data/marks.json     persisted marks
//!   data/settings.toml  key bindings and mark colours
//!   data/docmarkd.pid   running server info
//!   data/docmark.log    TUI log output
//!   exports/            export output and report.csv/report.xlsx (wiped on every export)
//! ```

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine the working directory")]
    #[diagnostic(
        code(docmark::paths::no_cwd),
        help("Pass --root explicitly or set DOCMARK_HOME.")
    )]
    NoWorkingDir {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(docmark::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Environment variable overriding the project root.
pub const HOME_ENV: &str = "DOCMARK_HOME";

/// Resolved directories of one review project.
#[derive(Debug, Clone)]
pub struct DocmarkPaths {
    pub root: PathBuf,
    /// `root/documents/`
    pub documents_dir: PathBuf,
    /// `root/data/`
    pub data_dir: PathBuf,
    /// `root/exports/`
    pub exports_dir: PathBuf,
}

impl DocmarkPaths {
    /// Lay out a project under `root`. Touches nothing on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            documents_dir: root.join("documents"),
            data_dir: root.join("data"),
            exports_dir: root.join("exports"),
            root,
        }
    }

    /// Resolve the project root: explicit argument, then `$DOCMARK_HOME`,
    /// then the current working directory.
    pub fn resolve(root: Option<&Path>) -> PathResult<Self> {
        if let Some(root) = root {
            return Ok(Self::new(root));
        }
        if let Ok(home) = std::env::var(HOME_ENV) {
            if !home.trim().is_empty() {
                return Ok(Self::new(home));
            }
        }
        let cwd = std::env::current_dir().map_err(|e| PathError::NoWorkingDir { source: e })?;
        Ok(Self::new(cwd))
    }

    /// Create all project directories. Idempotent.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        for dir in [&self.root, &self.documents_dir, &self.data_dir] {
            std::fs::create_dir_all(dir).map_err(|e| PathError::CreateDir {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    pub fn marks_file(&self) -> PathBuf {
        self.data_dir.join("marks.json")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join("settings.toml")
    }

    /// Written by `docmarkd` so the CLI can find it.
    pub fn pid_file(&self) -> PathBuf {
        self.data_dir.join("docmarkd.pid")
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("docmark.log")
    }

    pub fn report_file(&self) -> PathBuf {
        self.exports_dir.join("report.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_derives_from_root() {
        let paths = DocmarkPaths::new("/srv/review");
        assert_eq!(paths.documents_dir, PathBuf::from("/srv/review/documents"));
        assert_eq!(paths.marks_file(), PathBuf::from("/srv/review/data/marks.json"));
        assert_eq!(
            paths.settings_file(),
            PathBuf::from("/srv/review/data/settings.toml")
        );
        assert_eq!(
            paths.report_file(),
            PathBuf::from("/srv/review/exports/report.csv")
        );
    }

    #[test]
    fn explicit_root_wins() {
        let paths = DocmarkPaths::resolve(Some(Path::new("/tmp/explicit"))).unwrap();
        assert_eq!(paths.root, PathBuf::from("/tmp/explicit"));
    }

    #[test]
    fn ensure_dirs_is_idempotent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = DocmarkPaths::new(tmp.path().join("project"));
        paths.ensure_dirs().unwrap();
        paths.ensure_dirs().unwrap();
        assert!(paths.documents_dir.is_dir());
        assert!(paths.data_dir.is_dir());
        // Exports are created lazily by the export writer.
        assert!(!paths.exports_dir.exists());
    }
}
