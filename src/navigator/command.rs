//! Requests the navigator issues and the replies it consumes.

use crate::catalog::{
    ExportRequest, ExportResponse, FileListing, FilterRequest, FilterResponse,
};
use crate::client::{ClientError, ClientResult, ReviewService};
use crate::mark::Mark;
use crate::navigator::viewer::Viewer;

/// One unit of I/O requested by the navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Re-fetch the full document list and marks.
    Refresh,
    FetchContent { ticket: u64, filename: String },
    SetMark { ticket: u64, filename: String, mark: Mark },
    Filter(FilterRequest),
    Export(ExportRequest),
}

/// Outcome of a [`Command`], carried back to the navigator.
#[derive(Debug)]
pub enum Reply {
    Catalog(ClientResult<FileListing>),
    Content {
        ticket: u64,
        filename: String,
        result: ClientResult<Viewer>,
    },
    MarkSaved {
        ticket: u64,
        filename: String,
        mark: Mark,
        result: ClientResult<()>,
    },
    Filtered(ClientResult<FilterResponse>),
    Exported(ClientResult<ExportResponse>),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Refresh => "refresh",
            Command::FetchContent { .. } => "fetch_content",
            Command::SetMark { .. } => "set_mark",
            Command::Filter(_) => "filter",
            Command::Export(_) => "export",
        }
    }

    /// The reply this command would produce had it failed with `err`.
    pub fn failed(self, err: ClientError) -> Reply {
        match self {
            Command::Refresh => Reply::Catalog(Err(err)),
            Command::FetchContent { ticket, filename } => Reply::Content {
                ticket,
                filename,
                result: Err(err),
            },
            Command::SetMark {
                ticket,
                filename,
                mark,
            } => Reply::MarkSaved {
                ticket,
                filename,
                mark,
                result: Err(err),
            },
            Command::Filter(_) => Reply::Filtered(Err(err)),
            Command::Export(_) => Reply::Exported(Err(err)),
        }
    }
}

/// Run `command` against `service`. Blocks for the duration of the call.
///
/// Content is decoded here, so PDF extraction happens wherever the command
/// runs rather than on the UI thread.
pub fn execute<S: ReviewService + ?Sized>(service: &S, command: Command) -> Reply {
    tracing::debug!(command = command.name(), "executing");
    match command {
        Command::Refresh => Reply::Catalog(service.list_documents()),
        Command::FetchContent { ticket, filename } => {
            let result = service.fetch_content(&filename).map(Viewer::from_content);
            Reply::Content {
                ticket,
                filename,
                result,
            }
        }
        Command::SetMark {
            ticket,
            filename,
            mark,
        } => {
            let result = service.set_mark(&filename, mark);
            Reply::MarkSaved {
                ticket,
                filename,
                mark,
                result,
            }
        }
        Command::Filter(request) => Reply::Filtered(service.filter(&request)),
        Command::Export(request) => Reply::Exported(service.export(&request)),
    }
}
