//! Session navigator: the review state machine.
//!
//! The [`Navigator`] owns the cached document list, marks, cursor, and viewer
//! state. It performs no I/O. Every operation returns the [`Command`]s to
//! run, and every finished command comes back as a [`Reply`] passed to
//! [`Navigator::apply`], which may ask for follow-up commands.
//!
//! Ordering guarantees:
//! - Content replies carry a ticket. Only the reply for the most recent
//!   `open` is shown; older ones are dropped.
//! - Marks are applied optimistically and rolled back if the catalog rejects
//!   them, returning the cursor to the rejected document.
//! - Running past the last document leaves no current document until the
//!   reviewer opens one explicitly.

pub mod command;
pub mod controller;
pub mod executor;
pub mod notice;
pub mod session;
pub mod viewer;

pub use command::{Command, Reply, execute};
pub use controller::{Action, Controller};
pub use executor::{Executor, InlineExecutor, WorkerExecutor};
pub use notice::{Notice, NoticeLevel};
pub use session::{Cursor, Session};
pub use viewer::Viewer;

use std::collections::HashMap;

use miette::Diagnostic;
use thiserror::Error;

use crate::catalog::{CatalogError, ExportRequest, ExportResponse, FilterRequest, FilterResponse};
use crate::mark::Mark;

#[derive(Debug, Error, Diagnostic)]
pub enum NavigationError {
    #[error("no document at position {index} (list has {len})")]
    #[diagnostic(code(docmark::navigator::out_of_bounds))]
    OutOfBounds { index: usize, len: usize },

    #[error("no document is open")]
    #[diagnostic(
        code(docmark::navigator::nothing_open),
        help("Open a document from the list first.")
    )]
    NothingOpen,

    #[error("\"{filename}\" has no mark to save")]
    #[diagnostic(
        code(docmark::navigator::unmarked),
        help("Assign a mark with one of the mark keys.")
    )]
    Unmarked { filename: String },

    #[error("no marks selected for export")]
    #[diagnostic(
        code(docmark::navigator::nothing_selected),
        help("Select at least one mark to export.")
    )]
    NoMarksSelected,

    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidFilter(#[from] CatalogError),

    #[error("review worker error: {message}")]
    #[diagnostic(code(docmark::navigator::worker))]
    Worker { message: String },
}

pub type NavResult<T> = Result<T, NavigationError>;

/// Notices kept before the oldest is discarded.
const MAX_NOTICES: usize = 16;

/// A mark sent to the catalog whose reply has not arrived yet.
#[derive(Debug, Clone)]
struct PendingMark {
    filename: String,
    mark: Mark,
    previous: Option<Mark>,
    /// Whether the cursor moved on after marking. A rejected mark that
    /// advanced reopens its document wherever the reviewer has got to since,
    /// so the unsaved document is shown again rather than skipped.
    advanced: bool,
}

/// Review state machine.
#[derive(Debug, Default)]
pub struct Navigator {
    session: Session,
    viewer: Viewer,
    next_ticket: u64,
    /// Ticket of the content request whose reply may be shown.
    content_ticket: Option<u64>,
    pending_marks: HashMap<u64, PendingMark>,
    notices: Vec<Notice>,
    last_filter_request: Option<FilterRequest>,
    last_filter: Option<FilterResponse>,
    last_export: Option<ExportResponse>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn cursor(&self) -> Option<usize> {
        self.session.cursor()
    }

    pub fn current(&self) -> Option<&str> {
        self.session.current()
    }

    /// Most recent notice, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notices.pop()
    }

    pub fn push_notice(&mut self, notice: Notice) {
        if notice.is_error() {
            tracing::warn!(notice = %notice, "error notice");
        }
        if self.notices.len() >= MAX_NOTICES {
            self.notices.remove(0);
        }
        self.notices.push(notice);
    }

    /// Criteria of the most recent accepted filter.
    pub fn last_filter_request(&self) -> Option<&FilterRequest> {
        self.last_filter_request.as_ref()
    }

    pub fn last_filter(&self) -> Option<&FilterResponse> {
        self.last_filter.as_ref()
    }

    pub fn last_export(&self) -> Option<&ExportResponse> {
        self.last_export.as_ref()
    }

    /// Marks sent but not yet acknowledged.
    pub fn pending_marks(&self) -> usize {
        self.pending_marks.len()
    }

    fn ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Full resync with the catalog. Safe to call at any time.
    pub fn refresh(&self) -> Vec<Command> {
        vec![Command::Refresh]
    }

    /// Request content for `index` and make it the only reply worth showing.
    fn load(&mut self, index: usize) -> Command {
        let filename = self.session.documents()[index].clone();
        let ticket = self.ticket();
        self.content_ticket = Some(ticket);
        self.viewer = Viewer::Loading {
            filename: filename.clone(),
        };
        tracing::debug!(index, file = %filename, ticket, "loading document");
        Command::FetchContent { ticket, filename }
    }

    /// Move the cursor to `index`, fetch its content, and resync the list.
    pub fn open(&mut self, index: usize) -> NavResult<Vec<Command>> {
        let len = self.session.len();
        if index >= len {
            return Err(NavigationError::OutOfBounds { index, len });
        }
        self.session.set_cursor(Cursor::At(index));
        let fetch = self.load(index);
        Ok(vec![fetch, Command::Refresh])
    }

    /// Open the neighbour `delta` positions away. Out of range is a no-op,
    /// as is stepping with no current document.
    pub fn step(&mut self, delta: isize) -> Vec<Command> {
        let Some(current) = self.session.cursor() else {
            return Vec::new();
        };
        match current.checked_add_signed(delta) {
            Some(target) if target < self.session.len() => self.open(target).unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Mark the current document and move to the next one.
    ///
    /// The mark is shown immediately and sent without waiting. After the
    /// last document the cursor is left past the end.
    pub fn mark_current_and_advance(&mut self, mark: Mark) -> NavResult<Vec<Command>> {
        let (index, filename) = self.current_entry()?;
        let mut commands = vec![self.send_mark(index, filename, mark, true)];

        if index + 1 < self.session.len() {
            commands.extend(self.open(index + 1)?);
        } else {
            self.session.set_cursor(Cursor::PastEnd);
            self.viewer = Viewer::Empty;
            self.content_ticket = None;
            self.push_notice(Notice::info("Reached the last document."));
            commands.push(Command::Refresh);
        }
        Ok(commands)
    }

    /// Re-send the current document's mark without moving.
    pub fn save_current_mark(&mut self) -> NavResult<Vec<Command>> {
        let (index, filename) = self.current_entry()?;
        let Some(mark) = self.session.mark_of(&filename) else {
            return Err(NavigationError::Unmarked { filename });
        };
        let command = self.send_mark(index, filename, mark, false);
        Ok(vec![command, Command::Refresh])
    }

    fn current_entry(&self) -> NavResult<(usize, String)> {
        let index = self.session.cursor().ok_or(NavigationError::NothingOpen)?;
        let filename = self.session.documents()[index].clone();
        Ok((index, filename))
    }

    fn send_mark(&mut self, index: usize, filename: String, mark: Mark, advanced: bool) -> Command {
        let previous = self.session.set_local_mark(&filename, Some(mark));
        let ticket = self.ticket();
        tracing::debug!(index, file = %filename, %mark, ticket, "marking");
        self.pending_marks.insert(
            ticket,
            PendingMark {
                filename: filename.clone(),
                mark,
                previous,
                advanced,
            },
        );
        Command::SetMark {
            ticket,
            filename,
            mark,
        }
    }

    /// Bulk-mark matching documents. Patterns are validated here; invalid
    /// criteria produce an error and no command.
    pub fn filter(&mut self, request: FilterRequest) -> NavResult<Vec<Command>> {
        request.compile()?;
        self.last_filter_request = Some(request.clone());
        Ok(vec![Command::Filter(request)])
    }

    /// Export documents carrying any of `marks`.
    pub fn export(&mut self, marks: impl IntoIterator<Item = Mark>) -> NavResult<Vec<Command>> {
        let request = ExportRequest::new(marks);
        if request.colors.is_empty() {
            return Err(NavigationError::NoMarksSelected);
        }
        Ok(vec![Command::Export(request)])
    }

    /// Fold a finished command into the state. Returns follow-up commands.
    pub fn apply(&mut self, reply: Reply) -> Vec<Command> {
        match reply {
            Reply::Catalog(Ok(listing)) => {
                let reload = self.session.reconcile(listing);
                // Marks still in flight win over the listing that raced them.
                let mut pending: Vec<_> = self.pending_marks.iter().collect();
                pending.sort_by_key(|(ticket, _)| **ticket);
                let overlay: Vec<(String, Mark)> = pending
                    .into_iter()
                    .map(|(_, p)| (p.filename.clone(), p.mark))
                    .collect();
                for (filename, mark) in overlay {
                    self.session.set_local_mark(&filename, Some(mark));
                }

                if self.session.cursor().is_none() && self.viewer.filename().is_some() {
                    self.viewer = Viewer::Empty;
                    self.content_ticket = None;
                }
                tracing::debug!(documents = self.session.len(), cursor = ?self.session.cursor(), "catalog applied");
                reload.map(|i| vec![self.load(i)]).unwrap_or_default()
            }
            Reply::Catalog(Err(e)) => {
                self.push_notice(Notice::from_diagnostic("Refresh failed", &e));
                Vec::new()
            }

            Reply::Content {
                ticket,
                filename,
                result,
            } => {
                if self.content_ticket != Some(ticket) {
                    tracing::debug!(ticket, file = %filename, "dropping stale content");
                    return Vec::new();
                }
                self.viewer = match result {
                    Ok(viewer) => viewer,
                    Err(e) => {
                        self.push_notice(Notice::from_diagnostic(
                            &format!("Could not load {filename}"),
                            &e,
                        ));
                        Viewer::Failed {
                            filename,
                            message: e.to_string(),
                        }
                    }
                };
                Vec::new()
            }

            Reply::MarkSaved {
                ticket,
                filename,
                mark,
                result,
            } => {
                let pending = self.pending_marks.remove(&ticket);
                match result {
                    Ok(()) => {
                        tracing::debug!(file = %filename, %mark, "mark acknowledged");
                        Vec::new()
                    }
                    Err(e) => {
                        self.push_notice(Notice::from_diagnostic(
                            &format!("Mark {mark} for {filename} was not saved"),
                            &e,
                        ));
                        match pending {
                            Some(pending) => self.roll_back(pending),
                            None => Vec::new(),
                        }
                    }
                }
            }

            Reply::Filtered(Ok(response)) => {
                self.push_notice(Notice::info(format!(
                    "Filter marked {} document(s).",
                    response.updated_count
                )));
                self.last_filter = Some(response);
                vec![Command::Refresh]
            }
            Reply::Filtered(Err(e)) => {
                self.push_notice(Notice::from_diagnostic("Filter failed", &e));
                Vec::new()
            }

            Reply::Exported(Ok(response)) => {
                let mut text = format!("Exported {} document(s).", response.exported.len());
                if !response.removed.is_empty() {
                    text.push_str(&format!(
                        " Dropped {} mark(s) of missing documents.",
                        response.removed.len()
                    ));
                }
                self.push_notice(Notice::info(text));
                self.last_export = Some(response);
                vec![Command::Refresh]
            }
            Reply::Exported(Err(e)) => {
                self.push_notice(Notice::from_diagnostic("Export failed", &e));
                Vec::new()
            }
        }
    }

    /// Undo a rejected optimistic mark and return to its document.
    fn roll_back(&mut self, pending: PendingMark) -> Vec<Command> {
        let superseded = self
            .pending_marks
            .values()
            .any(|p| p.filename == pending.filename);
        if !superseded && self.session.mark_of(&pending.filename) == Some(pending.mark) {
            self.session
                .set_local_mark(&pending.filename, pending.previous);
        }
        if !pending.advanced {
            return Vec::new();
        }
        match self.session.position_of(&pending.filename) {
            Some(index) => self.open(index).unwrap_or_default(),
            None => Vec::new(),
        }
    }
}
