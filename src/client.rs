//! Client abstraction for talking to a review catalog.
//!
//! `DocmarkClient` wraps either an in-process [`Catalog`] or an HTTP
//! connection to a `docmarkd` server. The CLI resolves which variant to use at
//! startup via [`DocmarkClient::connect`], which prefers an explicit URL,
//! then a server discovered through its PID file, then the local catalog.
//!
//! The navigator only sees the two service traits, so tests can drive it
//! against a local catalog or a hand-written fake.

use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::catalog::{
    Catalog, CatalogError, DocumentContent, DocumentKind, ExportRequest, ExportResponse,
    FileListing, FilterRequest, FilterResponse, MarkRequest, MarkResponse,
};
use crate::mark::Mark;
use crate::paths::DocmarkPaths;
use crate::settings::{Settings, SettingsError};

// ---------------------------------------------------------------------------
// Service traits
// ---------------------------------------------------------------------------

/// Owner of the document list, marks, and the bulk operations.
pub trait CatalogService {
    fn list_documents(&self) -> ClientResult<FileListing>;
    fn set_mark(&self, filename: &str, mark: Mark) -> ClientResult<()>;
    fn filter(&self, request: &FilterRequest) -> ClientResult<FilterResponse>;
    fn export(&self, request: &ExportRequest) -> ClientResult<ExportResponse>;
}

/// Serves the raw bytes of one document.
pub trait ContentService {
    fn fetch_content(&self, filename: &str) -> ClientResult<DocumentContent>;
}

/// Everything a review session needs.
pub trait ReviewService: CatalogService + ContentService {}

impl<T: CatalogService + ContentService + ?Sized> ReviewService for T {}

// ---------------------------------------------------------------------------
// Server discovery
// ---------------------------------------------------------------------------

/// Information about a running docmarkd instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub pid: u32,
    pub port: u16,
    pub bind: String,
}

impl ServerInfo {
    /// Base URL for HTTP requests.
    pub fn base_url(&self) -> String {
        let host = if self.bind == "0.0.0.0" {
            "127.0.0.1"
        } else {
            &self.bind
        };
        format!("http://{host}:{}", self.port)
    }
}

/// `GET /health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub documents: usize,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Discover a running docmarkd server via its PID file.
///
/// Returns `Some(ServerInfo)` when:
/// 1. The PID file exists and parses correctly
/// 2. The process is still alive (`kill(pid, 0)` succeeds)
/// 3. The server responds to `GET /health`
pub fn discover_server(paths: &DocmarkPaths) -> Option<ServerInfo> {
    let pid_path = paths.pid_file();
    let contents = std::fs::read_to_string(&pid_path).ok()?;
    let info: ServerInfo = serde_json::from_str(&contents).ok()?;

    if !process_alive(info.pid) {
        tracing::debug!(pid = info.pid, "removing stale PID file");
        let _ = std::fs::remove_file(&pid_path);
        return None;
    }

    let url = format!("{}/health", info.base_url());
    match ureq::get(&url).timeout(Duration::from_secs(2)).call() {
        Ok(resp) if resp.status() == 200 => Some(info),
        _ => None,
    }
}

/// Write a PID file for the current docmarkd process.
pub fn write_pid_file(paths: &DocmarkPaths, port: u16, bind: &str) -> std::io::Result<()> {
    let info = ServerInfo {
        pid: std::process::id(),
        port,
        bind: bind.to_string(),
    };
    let json = serde_json::to_string_pretty(&info).map_err(std::io::Error::other)?;
    std::fs::write(paths.pid_file(), json)
}

/// Remove the PID file on shutdown.
pub fn remove_pid_file(paths: &DocmarkPaths) {
    let _ = std::fs::remove_file(paths.pid_file());
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: kill with signal 0 doesn't actually send a signal;
    // it only checks whether the process exists.
    unsafe { libc::kill(pid, 0) == 0 }
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    // On non-unix, fall back to trusting the PID file.
    true
}

// ---------------------------------------------------------------------------
// Client error
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ClientError {
    #[error("remote request failed: {message}")]
    #[diagnostic(code(docmark::client::request), help("Is docmarkd running and reachable?"))]
    Request { message: String },

    #[error("unexpected response from server: {message}")]
    #[diagnostic(code(docmark::client::response), help("Server version mismatch?"))]
    Response { message: String },

    #[error("not found: {message}")]
    #[diagnostic(
        code(docmark::client::not_found),
        help("The document may have been removed; refresh the list.")
    )]
    NotFound { message: String },

    #[error("server rejected request ({status}): {message}")]
    #[diagnostic(code(docmark::client::rejected))]
    Rejected { status: u16, message: String },

    #[error("invalid server URL \"{url}\": {message}")]
    #[diagnostic(
        code(docmark::client::url),
        help("Use an absolute URL such as http://127.0.0.1:8300.")
    )]
    InvalidUrl { url: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Settings(#[from] SettingsError),
}

pub type ClientResult<T> = Result<T, ClientError>;

// ---------------------------------------------------------------------------
// DocmarkClient
// ---------------------------------------------------------------------------

/// Either an in-process catalog or a remote HTTP connection to docmarkd.
#[derive(Clone)]
pub enum DocmarkClient {
    /// Direct catalog access.
    Local(Arc<Mutex<Catalog>>),
    /// HTTP client to a running docmarkd server.
    Remote { base_url: Url, http: ureq::Agent },
}

/// Transport timeout for remote calls.
const REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on a single document download.
const MAX_CONTENT_BYTES: u64 = 512 * 1024 * 1024;

impl DocmarkClient {
    /// Wrap a local catalog.
    pub fn local(catalog: Catalog) -> Self {
        DocmarkClient::Local(Arc::new(Mutex::new(catalog)))
    }

    /// Connect to a server at `base_url`.
    pub fn remote(base_url: &str) -> ClientResult<Self> {
        let parsed = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: base_url.to_string(),
                message: "URL cannot carry a path".into(),
            });
        }
        Ok(DocmarkClient::Remote {
            base_url: parsed,
            http: ureq::AgentBuilder::new().timeout(REMOTE_TIMEOUT).build(),
        })
    }

    /// Pick a backend: explicit URL, discovered server, or local catalog.
    pub fn connect(paths: &DocmarkPaths, server: Option<&str>) -> ClientResult<Self> {
        if let Some(url) = server {
            tracing::info!(%url, "using explicit server");
            return Self::remote(url);
        }
        if let Some(info) = discover_server(paths) {
            tracing::info!(url = %info.base_url(), pid = info.pid, "discovered docmarkd");
            return Self::remote(&info.base_url());
        }
        tracing::info!(root = %paths.root.display(), "using local catalog");
        Ok(Self::local(Catalog::open(paths)?))
    }

    /// Returns true if this is a remote client.
    pub fn is_remote(&self) -> bool {
        matches!(self, DocmarkClient::Remote { .. })
    }

    /// Short label for status displays.
    pub fn describe(&self) -> String {
        match self {
            DocmarkClient::Local(catalog) => match catalog.lock() {
                Ok(c) => format!("local:{}", c.paths().root.display()),
                Err(_) => "local".to_string(),
            },
            DocmarkClient::Remote { base_url, .. } => base_url.to_string(),
        }
    }

    /// Reviewer settings: from the project directory, or from the server.
    pub fn settings(&self) -> ClientResult<Settings> {
        match self {
            DocmarkClient::Local(_) => {
                let path = self.catalog()?.paths().settings_file();
                Ok(Settings::load_or_default(&path)?)
            }
            DocmarkClient::Remote { .. } => self.get_json(&["api", "settings"]),
        }
    }

    // -- helpers for local calls --

    fn catalog(&self) -> ClientResult<MutexGuard<'_, Catalog>> {
        let DocmarkClient::Local(catalog) = self else {
            unreachable!("catalog called on remote client");
        };
        catalog.lock().map_err(|_| ClientError::Request {
            message: "catalog lock poisoned".into(),
        })
    }

    // -- helpers for remote calls --

    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let DocmarkClient::Remote { base_url, .. } = self else {
            unreachable!("endpoint called on local client");
        };
        let mut url = base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl {
                url: base_url.to_string(),
                message: "URL cannot carry a path".into(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn agent(&self) -> &ureq::Agent {
        let DocmarkClient::Remote { http, .. } = self else {
            unreachable!("agent called on local client");
        };
        http
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let url = self.endpoint(segments)?;
        let resp = self
            .agent()
            .get(url.as_str())
            .call()
            .map_err(map_ureq_error)?;
        resp.into_json().map_err(|e| ClientError::Response {
            message: format!("failed to parse JSON: {e}"),
        })
    }

    fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ClientResult<T> {
        let url = self.endpoint(segments)?;
        let resp = self
            .agent()
            .post(url.as_str())
            .send_json(body)
            .map_err(map_ureq_error)?;
        resp.into_json().map_err(|e| ClientError::Response {
            message: format!("failed to parse JSON: {e}"),
        })
    }

    /// Server health (remote only).
    pub fn health(&self) -> ClientResult<HealthResponse> {
        match self {
            DocmarkClient::Local(_) => {
                let documents = self.catalog()?.store().list()?.len();
                Ok(HealthResponse {
                    status: "ok".into(),
                    version: env!("CARGO_PKG_VERSION").into(),
                    documents,
                })
            }
            DocmarkClient::Remote { .. } => self.get_json(&["health"]),
        }
    }
}

fn map_ureq_error(err: ureq::Error) -> ClientError {
    match err {
        ureq::Error::Status(404, resp) => ClientError::NotFound {
            message: error_message(resp),
        },
        ureq::Error::Status(status, resp) => ClientError::Rejected {
            status,
            message: error_message(resp),
        },
        ureq::Error::Transport(t) => ClientError::Request {
            message: t.to_string(),
        },
    }
}

/// Prefer the `{ "error": ... }` body; fall back to the raw text.
fn error_message(resp: ureq::Response) -> String {
    let body = resp.into_string().unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body)
}

impl CatalogService for DocmarkClient {
    fn list_documents(&self) -> ClientResult<FileListing> {
        match self {
            DocmarkClient::Local(_) => Ok(self.catalog()?.listing()?),
            DocmarkClient::Remote { .. } => self.get_json(&["api", "files"]),
        }
    }

    fn set_mark(&self, filename: &str, mark: Mark) -> ClientResult<()> {
        match self {
            DocmarkClient::Local(_) => {
                self.catalog()?.set_mark(filename, mark)?;
                Ok(())
            }
            DocmarkClient::Remote { .. } => {
                let body = MarkRequest {
                    filename: filename.to_string(),
                    mark,
                };
                let resp: MarkResponse = self.post_json(&["api", "mark"], &body)?;
                if resp.success {
                    Ok(())
                } else {
                    Err(ClientError::Rejected {
                        status: 200,
                        message: format!("mark for \"{filename}\" not saved"),
                    })
                }
            }
        }
    }

    fn filter(&self, request: &FilterRequest) -> ClientResult<FilterResponse> {
        match self {
            DocmarkClient::Local(_) => Ok(self.catalog()?.filter(request)?),
            DocmarkClient::Remote { .. } => self.post_json(&["api", "filter"], request),
        }
    }

    fn export(&self, request: &ExportRequest) -> ClientResult<ExportResponse> {
        match self {
            DocmarkClient::Local(_) => Ok(self.catalog()?.export(request)?),
            DocmarkClient::Remote { .. } => self.post_json(&["api", "export"], request),
        }
    }
}

impl ContentService for DocmarkClient {
    fn fetch_content(&self, filename: &str) -> ClientResult<DocumentContent> {
        match self {
            DocmarkClient::Local(_) => Ok(self.catalog()?.content(filename)?),
            DocmarkClient::Remote { .. } => {
                let url = self.endpoint(&["api", "file", filename])?;
                let resp = self
                    .agent()
                    .get(url.as_str())
                    .call()
                    .map_err(map_ureq_error)?;
                let kind = DocumentKind::from_content_type(resp.content_type())
                    .or_else(|| DocumentKind::detect(filename))
                    .ok_or_else(|| ClientError::Response {
                        message: format!("unexpected content type {}", resp.content_type()),
                    })?;
                let mut bytes = Vec::new();
                resp.into_reader()
                    .take(MAX_CONTENT_BYTES)
                    .read_to_end(&mut bytes)
                    .map_err(|e| ClientError::Response {
                        message: format!("failed to read document body: {e}"),
                    })?;
                Ok(DocumentContent {
                    filename: filename.to_string(),
                    kind,
                    bytes,
                })
            }
        }
    }
}
