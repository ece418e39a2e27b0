//! HTTP API over a [`Catalog`], served by `docmarkd`.
//!
//! - `GET  /health`: server status
//! - `GET  /api/files`: document names and marks
//! - `GET  /api/file/{*filename}`: raw document bytes
//! - `POST /api/mark`: set one mark
//! - `POST /api/filter`: bulk-mark matching documents
//! - `POST /api/export`: copy marked documents into `exports/`
//! - `GET  /api/settings`: reviewer settings
//!
//! Every failure answers `{ "error": message }`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::{
    Catalog, CatalogError, ExportRequest, ExportResponse, FileListing, FilterRequest,
    FilterResponse, MarkRequest, MarkResponse,
};
use crate::client::{ErrorBody, HealthResponse};
use crate::paths::DocmarkPaths;
use crate::settings::{Settings, SettingsError};

// ── Server state ──────────────────────────────────────────────────────────

pub struct ServerState {
    paths: DocmarkPaths,
    catalog: Mutex<Catalog>,
}

impl ServerState {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            paths: catalog.paths().clone(),
            catalog: Mutex::new(catalog),
        }
    }

    pub fn paths(&self) -> &DocmarkPaths {
        &self.paths
    }
}

// ── Errors ────────────────────────────────────────────────────────────────

/// Handler failure, rendered as a JSON error body.
#[derive(Debug)]
pub enum ApiError {
    Catalog(CatalogError),
    Settings(SettingsError),
    /// Request body that is not valid JSON for the route.
    Body(JsonRejection),
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::Body(e)
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        ApiError::Catalog(e)
    }
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        ApiError::Settings(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Catalog(e) => match e {
                CatalogError::DocumentNotFound { .. } => StatusCode::NOT_FOUND,
                CatalogError::InvalidName { .. }
                | CatalogError::UnsupportedFormat { .. }
                | CatalogError::InvalidPattern { .. }
                | CatalogError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Settings(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Body(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Catalog(e) => e.to_string(),
            ApiError::Settings(e) => e.to_string(),
            ApiError::Body(e) => e.body_text(),
        };
        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        } else {
            tracing::debug!(%status, error = %message, "request rejected");
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// `Json` whose rejections answer with the usual error body.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

// ── Router ────────────────────────────────────────────────────────────────

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/files", get(list_files))
        .route("/api/file/{*filename}", get(file_content))
        .route("/api/mark", post(set_mark))
        .route("/api/filter", post(filter))
        .route("/api/export", post(export))
        .route("/api/settings", get(settings))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health(State(state): State<Arc<ServerState>>) -> ApiResult<Json<HealthResponse>> {
    let catalog = state.catalog.lock().await;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: catalog.store().list()?.len(),
    }))
}

async fn list_files(State(state): State<Arc<ServerState>>) -> ApiResult<Json<FileListing>> {
    let catalog = state.catalog.lock().await;
    Ok(Json(catalog.listing()?))
}

async fn file_content(
    State(state): State<Arc<ServerState>>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let catalog = state.catalog.lock().await;
    let content = catalog.content(&filename)?;
    Ok((
        [(header::CONTENT_TYPE, content.kind.content_type())],
        content.bytes,
    )
        .into_response())
}

async fn set_mark(
    State(state): State<Arc<ServerState>>,
    ApiJson(body): ApiJson<MarkRequest>,
) -> ApiResult<Json<MarkResponse>> {
    let mut catalog = state.catalog.lock().await;
    catalog.set_mark(&body.filename, body.mark)?;
    Ok(Json(MarkResponse { success: true }))
}

async fn filter(
    State(state): State<Arc<ServerState>>,
    ApiJson(body): ApiJson<FilterRequest>,
) -> ApiResult<Json<FilterResponse>> {
    let mut catalog = state.catalog.lock().await;
    Ok(Json(catalog.filter(&body)?))
}

async fn export(
    State(state): State<Arc<ServerState>>,
    ApiJson(body): ApiJson<ExportRequest>,
) -> ApiResult<Json<ExportResponse>> {
    let mut catalog = state.catalog.lock().await;
    Ok(Json(catalog.export(&body)?))
}

async fn settings(State(state): State<Arc<ServerState>>) -> ApiResult<Json<Settings>> {
    Ok(Json(Settings::load_or_default(&state.paths.settings_file())?))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::mark::Mark;

    fn app(files: &[(&str, &str)]) -> (tempfile::TempDir, Router) {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = DocmarkPaths::new(tmp.path());
        paths.ensure_dirs().unwrap();
        for (name, body) in files {
            std::fs::write(paths.documents_dir.join(name), body).unwrap();
        }
        let state = Arc::new(ServerState::new(Catalog::open(&paths).unwrap()));
        (tmp, router(state))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>, Option<String>) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec(), content_type)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, json: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_document_count() {
        let (_tmp, app) = app(&[("a.txt", "alpha")]);
        let (status, body, _) = send(&app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.documents, 1);
    }

    #[tokio::test]
    async fn mark_then_list() {
        let (_tmp, app) = app(&[("a.txt", "alpha"), ("b.pdf", "%PDF")]);
        let (status, body, _) = send(
            &app,
            post_json("/api/mark", r#"{"filename":"a.txt","mark":"A"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"success":true}"#);

        let (status, body, _) = send(&app, get_req("/api/files")).await;
        assert_eq!(status, StatusCode::OK);
        let listing: FileListing = serde_json::from_slice(&body).unwrap();
        assert_eq!(listing.files, vec!["a.txt", "b.pdf"]);
        assert_eq!(listing.marks.get("a.txt"), Some(&Mark::A));
    }

    #[tokio::test]
    async fn file_content_sets_type() {
        let (_tmp, app) = app(&[("my notes.txt", "hello")]);
        let (status, body, content_type) = send(&app, get_req("/api/file/my%20notes.txt")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"hello");
        assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));
    }

    #[tokio::test]
    async fn missing_file_is_404_with_error_body() {
        let (_tmp, app) = app(&[]);
        let (status, body, _) = send(&app, get_req("/api/file/ghost.txt")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("ghost.txt"));
    }

    #[tokio::test]
    async fn unsupported_and_traversal_names_are_400() {
        let (_tmp, app) = app(&[]);
        let (status, _, _) = send(&app, get_req("/api/file/image.png")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _, _) = send(&app, get_req("/api/file/..%2Fsecret.txt")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn filter_accepts_string_lengths() {
        let (_tmp, app) = app(&[("a.txt", "alpha"), ("b.txt", "be")]);
        let (status, body, _) = send(
            &app,
            post_json(
                "/api/filter",
                r#"{"fileNameRegex":"","contentPattern":"","minLength":"3","maxLength":"","markColor":"B"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"updatedCount":1}"#);
    }

    #[tokio::test]
    async fn invalid_filter_is_400() {
        let (_tmp, app) = app(&[("a.txt", "alpha")]);
        let (status, body, _) =
            send(&app, post_json("/api/filter", r#"{"fileNameRegex":"(["}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("invalid filename pattern"));
    }

    #[tokio::test]
    async fn unknown_mark_is_400_with_error_body() {
        let (_tmp, app) = app(&[("a.txt", "alpha")]);
        let (status, body, content_type) = send(
            &app,
            post_json("/api/mark", r#"{"filename":"a.txt","mark":"C"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert!(!err.error.is_empty());
    }

    #[tokio::test]
    async fn malformed_filter_body_is_400_with_error_body() {
        let (_tmp, app) = app(&[("a.txt", "alpha")]);
        for json in [r#"{"minLength":"-5"}"#, r#"{"maxLength":"many"}"#, "not json"] {
            let (status, body, content_type) = send(&app, post_json("/api/filter", json)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{json}");
            assert_eq!(content_type.as_deref(), Some("application/json"));
            let err: ErrorBody = serde_json::from_slice(&body).unwrap();
            assert!(!err.error.is_empty());
        }
    }

    #[tokio::test]
    async fn missing_content_type_is_400_with_error_body() {
        let (_tmp, app) = app(&[]);
        let req = Request::post("/api/export")
            .body(Body::from(r#"{"colors":["A"]}"#))
            .unwrap();
        let (status, body, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("Content-Type"));
    }

    #[tokio::test]
    async fn export_returns_exported_names() {
        let (tmp, app) = app(&[("a.txt", "alpha"), ("c.txt", "gamma")]);
        send(&app, post_json("/api/mark", r#"{"filename":"a.txt","mark":"A"}"#)).await;
        send(&app, post_json("/api/mark", r#"{"filename":"c.txt","mark":"B"}"#)).await;

        let (status, body, _) = send(&app, post_json("/api/export", r#"{"colors":["A"]}"#)).await;
        assert_eq!(status, StatusCode::OK);
        let resp: ExportResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.exported, vec!["a.txt"]);
        assert!(tmp.path().join("exports/A/a.txt").is_file());
    }

    #[tokio::test]
    async fn settings_default_when_absent() {
        let (_tmp, app) = app(&[]);
        let (status, body, _) = send(&app, get_req("/api/settings")).await;
        assert_eq!(status, StatusCode::OK);
        let settings: Settings = serde_json::from_slice(&body).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
