//! The document catalog: the project's documents, their marks, and the bulk
//! filter and export operations over them.
//!
//! This is the authority the review server exposes over HTTP and the local
//! client calls in-process. Every mutating operation persists before it
//! returns.

pub mod error;
pub mod export;
pub mod filter;
pub mod marks;
pub mod model;
pub mod pdf;
pub mod store;

pub use error::{CatalogError, CatalogResult};
pub use filter::CompiledFilter;
pub use marks::MarkStore;
pub use model::{
    DocumentContent, DocumentKind, ExportRequest, ExportResponse, FileListing, FilterRequest,
    FilterResponse, MarkRequest, MarkResponse,
};
pub use store::DocumentStore;

use crate::mark::Mark;
use crate::paths::DocmarkPaths;

use export::ExportWriter;

/// Documents plus marks for one project root.
pub struct Catalog {
    paths: DocmarkPaths,
    store: DocumentStore,
    marks: MarkStore,
}

impl Catalog {
    /// Open the catalog, creating the project directories if needed.
    pub fn open(paths: &DocmarkPaths) -> CatalogResult<Self> {
        paths.ensure_dirs()?;
        let marks = MarkStore::open(&paths.marks_file())?;
        Ok(Self {
            store: DocumentStore::new(&paths.documents_dir),
            paths: paths.clone(),
            marks,
        })
    }

    pub fn paths(&self) -> &DocmarkPaths {
        &self.paths
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// All documents and every stored mark.
    pub fn listing(&self) -> CatalogResult<FileListing> {
        Ok(FileListing {
            files: self.store.list()?,
            marks: self.marks.as_map().clone(),
        })
    }

    /// Raw document content.
    pub fn content(&self, filename: &str) -> CatalogResult<DocumentContent> {
        self.store.read(filename)
    }

    pub fn mark_of(&self, filename: &str) -> Option<Mark> {
        self.marks.get(filename)
    }

    /// Persist a mark for an existing document. Returns the previous mark.
    pub fn set_mark(&mut self, filename: &str, mark: Mark) -> CatalogResult<Option<Mark>> {
        self.store.path_for(filename)?;
        let previous = self.marks.insert(filename, mark);
        self.marks.flush()?;
        tracing::info!(file = filename, %mark, "mark saved");
        Ok(previous)
    }

    /// Mark every document matching `request`. Unreadable documents are
    /// skipped. Returns how many documents received the mark.
    pub fn filter(&mut self, request: &FilterRequest) -> CatalogResult<FilterResponse> {
        let compiled = request.compile()?;
        tracing::info!(
            name = %request.file_name_regex,
            content = %request.content_pattern,
            min = request.min(),
            max = request.max(),
            mark = %request.mark_color,
            "filter started"
        );

        let mut updated_count = 0;
        for filename in self.store.list()? {
            if !compiled.matches_name(&filename) {
                continue;
            }
            let matched = self
                .store
                .read(&filename)
                .and_then(|doc| compiled.matches(&doc));
            match matched {
                Ok(true) => {
                    self.marks.insert(&filename, compiled.mark());
                    updated_count += 1;
                    tracing::debug!(file = %filename, mark = %compiled.mark(), "filter matched");
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(file = %filename, error = %e, "filter skipped unreadable document");
                }
            }
        }

        self.marks.flush()?;
        tracing::info!(updated_count, "filter finished");
        Ok(FilterResponse { updated_count })
    }

    /// Export documents whose mark is selected.
    ///
    /// Marks of documents that no longer exist are dropped first and
    /// reported in `removed`. The exports directory is rebuilt from scratch.
    pub fn export(&mut self, request: &ExportRequest) -> CatalogResult<ExportResponse> {
        let store = &self.store;
        let removed = self.marks.retain(|name| store.contains(name));
        if !removed.is_empty() {
            self.marks.flush()?;
            tracing::info!(count = removed.len(), "dropped marks of missing documents");
        }

        let mut writer = ExportWriter::reset(&self.paths.exports_dir)?;
        for (filename, mark) in self.marks.iter() {
            if !request.colors.contains(&mark) {
                continue;
            }
            let source = self.store.path_for(filename)?;
            writer.copy(&source, filename, mark)?;
        }
        let written = writer.finish()?;

        tracing::info!(exported = written.len(), dir = %self.paths.exports_dir.display(), "export finished");
        Ok(ExportResponse {
            exported: written.into_iter().map(|f| f.filename).collect(),
            removed,
        })
    }
}
