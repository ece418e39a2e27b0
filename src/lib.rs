// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # docmark
//!
//! Review a directory of text and PDF documents: page through them, label
//! each one `A` or `B`, bulk-label by filter, and export labelled files.
//!
//! ## Architecture
//!
//! - **Catalog** (`catalog`): document store, persisted marks, filter and export
//! - **Client** (`client`): local catalog or HTTP connection to `docmarkd`
//! - **Navigator** (`navigator`): I/O-free review state machine plus executors
//! - **TUI** (`tui`): ratatui review screen
//! - **Server** (`server`, feature `server`): axum HTTP API over a catalog
//!
//! ## Library usage
//!
//! ```no_run
//! use docmark::catalog::Catalog;
//! use docmark::client::DocmarkClient;
//! use docmark::mark::Mark;
//! use docmark::navigator::{Action, Controller, InlineExecutor};
//! use docmark::paths::DocmarkPaths;
//!
//! let paths = DocmarkPaths::new("/srv/review");
//! let client = DocmarkClient::local(Catalog::open(&paths).unwrap());
//! let mut controller = Controller::new(InlineExecutor::new(client));
//! controller.dispatch(Action::Refresh).unwrap();
//! controller.pump();
//! controller.dispatch(Action::Mark(Mark::A)).unwrap();
//! controller.pump();
//! ```

pub mod catalog;
pub mod client;
pub mod error;
pub mod mark;
pub mod navigator;
pub mod paths;
#[cfg(feature = "server")]
pub mod server;
pub mod settings;
pub mod tui;
