//! Local preview server for a finished clone
//!
//! Serves the output directory the way a static host would: `/` maps to
//! `index.html`, directories map to their `index.html`, and a path without an
//! extension falls back to `<path>.html`, matching the names the path mapper
//! produces.

use crate::{MirrorError, Result};
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builds the router serving files under `root`
pub fn router(root: PathBuf) -> Router {
    Router::new()
        .fallback(serve_file)
        .with_state(Arc::new(root))
}

/// Serves `root` on an already bound listener until `shutdown` completes
pub async fn serve_with_shutdown<F>(listener: TcpListener, root: PathBuf, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(root))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| MirrorError::Server(e.to_string()))
}

/// Serves `root` on `127.0.0.1:<port>` until Ctrl-C
///
/// With `open_browser` the default browser is pointed at the site once the
/// listener is bound; failing to launch it is only logged.
pub async fn serve(root: PathBuf, port: u16, open_browser: bool) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| MirrorError::Server(format!("cannot bind {}: {}", addr, e)))?;

    let url = format!("http://localhost:{}/", port);
    println!("Serving {} at {}", root.display(), url);
    println!("Press Ctrl+C to stop");

    if open_browser {
        if let Err(e) = open::that(&url) {
            tracing::warn!("Could not open browser: {}", e);
        }
    }

    serve_with_shutdown(listener, root, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down preview server");
    })
    .await
}

async fn serve_file(State(root): State<Arc<PathBuf>>, uri: Uri) -> Response {
    let Some(path) = resolve_file(&root, uri.path()) else {
        return (StatusCode::NOT_FOUND, "404 Not Found").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], content).into_response()
        }
        Err(e) => {
            tracing::debug!("Failed to read {}: {}", path.display(), e);
            (StatusCode::NOT_FOUND, "404 Not Found").into_response()
        }
    }
}

/// Maps a request path to an existing file under `root`
///
/// Returns `None` for traversal attempts and for paths with no matching file.
pub fn resolve_file(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;
    let relative = decoded.trim_start_matches('/');

    let mut path = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if path.is_dir() {
        path.push("index.html");
    }
    if path.is_file() {
        return Some(path);
    }

    if path.extension().is_none() {
        let mut with_html = path.into_os_string();
        with_html.push(".html");
        let with_html = PathBuf::from(with_html);
        if with_html.is_file() {
            return Some(with_html);
        }
    }
    None
}
