//! Session state: the ordered document list, cached marks, and the cursor.

use std::collections::BTreeMap;

use crate::catalog::FileListing;
use crate::mark::Mark;

/// Where the reviewer is in the document list.
///
/// `Unset` and `PastEnd` both read as "no current document". They differ in
/// how a catalog refresh treats them: only `Unset` jumps to the first
/// document, so running off the end stays there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Unset,
    At(usize),
    PastEnd,
}

impl Cursor {
    pub fn index(&self) -> Option<usize> {
        match self {
            Cursor::At(i) => Some(*i),
            Cursor::Unset | Cursor::PastEnd => None,
        }
    }
}

/// Local copy of the catalog plus the reviewer's position in it.
///
/// Invariant: `Cursor::At(i)` implies `i < documents.len()`.
#[derive(Debug, Clone, Default)]
pub struct Session {
    documents: Vec<String>,
    marks: BTreeMap<String, Mark>,
    cursor: Cursor,
}

impl Session {
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn marks(&self) -> &BTreeMap<String, Mark> {
        &self.marks
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Current position, or `None` when nothing is selected.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor.index()
    }

    pub fn cursor_state(&self) -> Cursor {
        self.cursor
    }

    /// Name of the document under the cursor.
    pub fn current(&self) -> Option<&str> {
        self.cursor
            .index()
            .and_then(|i| self.documents.get(i))
            .map(String::as_str)
    }

    pub fn mark_of(&self, filename: &str) -> Option<Mark> {
        self.marks.get(filename).copied()
    }

    pub fn position_of(&self, filename: &str) -> Option<usize> {
        self.documents.iter().position(|d| d == filename)
    }

    /// Marked documents per mark, counting only listed documents.
    pub fn mark_counts(&self) -> BTreeMap<Mark, usize> {
        let mut counts = BTreeMap::new();
        for doc in &self.documents {
            if let Some(mark) = self.marks.get(doc) {
                *counts.entry(*mark).or_insert(0) += 1;
            }
        }
        counts
    }

    pub(crate) fn set_cursor(&mut self, cursor: Cursor) {
        debug_assert!(
            cursor.index().is_none_or(|i| i < self.documents.len()),
            "cursor {cursor:?} out of bounds for {} documents",
            self.documents.len()
        );
        self.cursor = cursor;
    }

    /// Overwrite the cached mark; `None` clears it. Returns the old value.
    pub(crate) fn set_local_mark(&mut self, filename: &str, mark: Option<Mark>) -> Option<Mark> {
        match mark {
            Some(mark) => self.marks.insert(filename.to_string(), mark),
            None => self.marks.remove(filename),
        }
    }

    /// Replace the cached catalog with a fresh listing and re-seat the cursor.
    ///
    /// The cursor follows its document by name. A vanished document clamps
    /// the cursor to the last valid index; an empty list unsets it. Returns
    /// the index whose content must be (re)loaded, if any.
    pub(crate) fn reconcile(&mut self, listing: FileListing) -> Option<usize> {
        let previous = self.current().map(str::to_string);
        self.documents = listing.files;
        self.marks = listing.marks;

        if self.documents.is_empty() {
            self.cursor = Cursor::Unset;
            return None;
        }

        let last = self.documents.len() - 1;
        let (cursor, reload) = match (self.cursor, previous) {
            (Cursor::Unset, _) => (Cursor::At(0), Some(0)),
            (Cursor::PastEnd, _) => (Cursor::PastEnd, None),
            (Cursor::At(_), Some(name)) => match self.position_of(&name) {
                Some(j) => (Cursor::At(j), None),
                None => {
                    let j = self.cursor.index().unwrap_or(0).min(last);
                    (Cursor::At(j), Some(j))
                }
            },
            (Cursor::At(i), None) => (Cursor::At(i.min(last)), Some(i.min(last))),
        };
        self.cursor = cursor;
        reload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(files: &[&str]) -> FileListing {
        FileListing {
            files: files.iter().map(|f| f.to_string()).collect(),
            marks: BTreeMap::new(),
        }
    }

    #[test]
    fn first_load_selects_first_document() {
        let mut s = Session::default();
        assert_eq!(s.reconcile(listing(&["a.txt", "b.txt"])), Some(0));
        assert_eq!(s.cursor(), Some(0));
        assert_eq!(s.current(), Some("a.txt"));
    }

    #[test]
    fn empty_load_leaves_cursor_unset() {
        let mut s = Session::default();
        assert_eq!(s.reconcile(listing(&[])), None);
        assert_eq!(s.cursor_state(), Cursor::Unset);
    }

    #[test]
    fn cursor_follows_document_across_reorder() {
        let mut s = Session::default();
        s.reconcile(listing(&["a.txt", "b.txt", "c.txt"]));
        s.set_cursor(Cursor::At(1));

        assert_eq!(s.reconcile(listing(&["0.txt", "a.txt", "b.txt", "c.txt"])), None);
        assert_eq!(s.cursor(), Some(2));
        assert_eq!(s.current(), Some("b.txt"));
    }

    #[test]
    fn vanished_document_clamps_and_reloads() {
        let mut s = Session::default();
        s.reconcile(listing(&["a.txt", "b.txt", "c.txt"]));
        s.set_cursor(Cursor::At(2));

        assert_eq!(s.reconcile(listing(&["a.txt", "b.txt"])), Some(1));
        assert_eq!(s.current(), Some("b.txt"));
    }

    #[test]
    fn past_end_is_sticky() {
        let mut s = Session::default();
        s.reconcile(listing(&["a.txt"]));
        s.set_cursor(Cursor::PastEnd);

        assert_eq!(s.reconcile(listing(&["a.txt", "b.txt"])), None);
        assert_eq!(s.cursor(), None);
        assert_eq!(s.cursor_state(), Cursor::PastEnd);
    }

    #[test]
    fn mark_counts_ignore_unlisted_documents() {
        let mut s = Session::default();
        let mut l = listing(&["a.txt", "b.txt"]);
        l.marks.insert("a.txt".into(), Mark::A);
        l.marks.insert("gone.txt".into(), Mark::A);
        l.marks.insert("b.txt".into(), Mark::B);
        s.reconcile(l);

        let counts = s.mark_counts();
        assert_eq!(counts.get(&Mark::A), Some(&1));
        assert_eq!(counts.get(&Mark::B), Some(&1));
    }
}
