//! Persistent mark store backed by `data/marks.json`.
//!
//! The file is a flat JSON object mapping document name to mark. Writes go
//! through [`MarkStore::flush`]; bulk operations insert many marks and flush
//! once.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::mark::Mark;

pub struct MarkStore {
    path: PathBuf,
    marks: BTreeMap<String, Mark>,
}

impl MarkStore {
    /// Open the store at `path`. A missing file starts empty.
    ///
    /// Entries whose value is not a known mark are dropped with a warning,
    /// and a file that is not a JSON object starts empty. In both cases the
    /// file as found is first copied to `marks.json.bak`, since the next
    /// flush rewrites it.
    pub fn open(path: &Path) -> CatalogResult<Self> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                marks: BTreeMap::new(),
            });
        }

        let data = std::fs::read_to_string(path).map_err(|e| CatalogError::MarkStore {
            message: format!("read {}: {e}", path.display()),
        })?;
        let (marks, damaged) = match serde_json::from_str::<BTreeMap<String, Value>>(&data) {
            Ok(raw) => parse_entries(raw),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "mark store unreadable, starting empty");
                (BTreeMap::new(), true)
            }
        };
        if damaged {
            backup(path)?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            marks,
        })
    }

    /// Write the store to disk.
    pub fn flush(&self) -> CatalogResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::MarkStore {
                message: format!("create dir {}: {e}", parent.display()),
            })?;
        }
        let json =
            serde_json::to_string_pretty(&self.marks).map_err(|e| CatalogError::MarkStore {
                message: format!("serialize marks: {e}"),
            })?;
        std::fs::write(&self.path, json).map_err(|e| CatalogError::MarkStore {
            message: format!("write {}: {e}", self.path.display()),
        })
    }

    pub fn get(&self, filename: &str) -> Option<Mark> {
        self.marks.get(filename).copied()
    }

    /// Set a mark in memory, returning the previous one.
    pub fn insert(&mut self, filename: &str, mark: Mark) -> Option<Mark> {
        self.marks.insert(filename.to_string(), mark)
    }

    /// Keep only marks whose name satisfies `keep`; returns the dropped names.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut removed = Vec::new();
        self.marks.retain(|name, _| {
            let kept = keep(name);
            if !kept {
                removed.push(name.clone());
            }
            kept
        });
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Mark)> {
        self.marks.iter().map(|(name, mark)| (name.as_str(), *mark))
    }

    pub fn as_map(&self) -> &BTreeMap<String, Mark> {
        &self.marks
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// Keep entries holding a known mark. The flag reports whether any were
/// dropped.
fn parse_entries(raw: BTreeMap<String, Value>) -> (BTreeMap<String, Mark>, bool) {
    let mut marks = BTreeMap::new();
    let mut damaged = false;
    for (filename, value) in raw {
        match serde_json::from_value::<Mark>(value.clone()) {
            Ok(mark) => {
                marks.insert(filename, mark);
            }
            Err(_) => {
                tracing::warn!(file = %filename, value = %value, "dropping unknown mark");
                damaged = true;
            }
        }
    }
    (marks, damaged)
}

/// Copy the file aside as `<name>.bak`, replacing an older backup.
fn backup(path: &Path) -> CatalogResult<()> {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    let bak = path.with_file_name(name);
    std::fs::copy(path, &bak).map_err(|e| CatalogError::MarkStore {
        message: format!("back up {} to {}: {e}", path.display(), bak.display()),
    })?;
    tracing::warn!(backup = %bak.display(), "kept a copy of the damaged mark store");
    Ok(())
}
