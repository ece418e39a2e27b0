//! docmarkd: the docmark review server.
//!
//! Serves one project's catalog over HTTP; `docmark` discovers it through
//! `data/docmarkd.pid` and routes every review operation here.
//!
//! Environment:
//! - `DOCMARK_HOME`: project root (defaults to the working directory)
//! - `DOCMARK_SERVER_BIND`: listen address (default `127.0.0.1`)
//! - `DOCMARK_SERVER_PORT`: listen port (default `8300`)
//!
//! Build and run: `cargo run --bin docmarkd`

use std::sync::Arc;

use docmark::catalog::Catalog;
use docmark::client::{remove_pid_file, write_pid_file};
use docmark::paths::DocmarkPaths;
use docmark::server::{ServerState, router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,tower_http=info,pdf_extract=warn")
            }),
        )
        .init();

    let bind = std::env::var("DOCMARK_SERVER_BIND").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("DOCMARK_SERVER_PORT").unwrap_or_else(|_| "8300".to_string());
    let port_num: u16 = port.parse().unwrap_or_else(|_| {
        tracing::error!(%port, "DOCMARK_SERVER_PORT must be a valid port number");
        std::process::exit(1);
    });
    let addr = format!("{bind}:{port_num}");

    let paths = DocmarkPaths::resolve(None).unwrap_or_else(|e| {
        tracing::error!("failed to resolve project root: {e}");
        std::process::exit(1);
    });
    let catalog = Catalog::open(&paths).unwrap_or_else(|e| {
        tracing::error!("failed to open catalog at {}: {e}", paths.root.display());
        std::process::exit(1);
    });
    let state = Arc::new(ServerState::new(catalog));

    tracing::info!(root = %paths.root.display(), "docmarkd initialized");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    // Write the PID file only once the port is ours, so `docmark` never
    // discovers a server that is not listening.
    if let Err(e) = write_pid_file(&paths, port_num, &bind) {
        tracing::warn!("failed to write PID file: {e}");
    }

    tracing::info!("docmarkd listening on {addr}");

    // Serve with graceful shutdown on SIGTERM/SIGINT.
    let paths_for_shutdown = paths.clone();
    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("docmarkd shutting down");
            remove_pid_file(&paths_for_shutdown);
        })
        .await;

    remove_pid_file(&paths);
    if let Err(e) = served {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("failed to register SIGTERM handler: {e}");
                ctrl_c.await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
