//! Read-only view of the documents directory.

use std::path::{Path, PathBuf};

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::model::{DocumentContent, DocumentKind};

/// The reviewable files of one project, addressed by bare file name.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List reviewable documents, sorted by name. A missing directory is empty.
    pub fn list(&self) -> CatalogResult<Vec<String>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CatalogError::Io {
                    path: self.dir.display().to_string(),
                    source: e,
                });
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| DocumentKind::detect(name).is_some())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Whether `filename` names an existing reviewable document.
    pub fn contains(&self, filename: &str) -> bool {
        self.path_for(filename).is_ok()
    }

    /// Resolve a document name to its path inside the store.
    pub fn path_for(&self, filename: &str) -> CatalogResult<PathBuf> {
        validate_name(filename)?;
        if DocumentKind::detect(filename).is_none() {
            return Err(CatalogError::UnsupportedFormat {
                filename: filename.to_string(),
            });
        }
        let path = self.dir.join(filename);
        if !path.is_file() {
            return Err(CatalogError::DocumentNotFound {
                filename: filename.to_string(),
            });
        }
        Ok(path)
    }

    /// Read a document's bytes.
    pub fn read(&self, filename: &str) -> CatalogResult<DocumentContent> {
        let path = self.path_for(filename)?;
        let bytes = std::fs::read(&path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let kind = DocumentKind::detect(filename).ok_or_else(|| CatalogError::UnsupportedFormat {
            filename: filename.to_string(),
        })?;
        Ok(DocumentContent {
            filename: filename.to_string(),
            kind,
            bytes,
        })
    }
}

/// Names must stay inside the documents directory.
fn validate_name(filename: &str) -> CatalogResult<()> {
    let bad = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\', '\0']);
    if bad {
        return Err(CatalogError::InvalidName {
            filename: filename.to_string(),
        });
    }
    Ok(())
}
