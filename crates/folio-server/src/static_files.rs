//! Static file serving from the output directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;

use crate::state::AppState;

const INDEX_FILE: &str = "index.html";

/// Map a request path onto a file under `root`.
///
/// Directories resolve to their `index.html`. Returns `None` for paths that
/// escape the root or do not name an existing file.
pub(crate) fn resolve_file(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;

    let mut path = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains('\\') => return None,
            s => path.push(s),
        }
    }

    if path.is_dir() {
        path.push(INDEX_FILE);
    }
    path.is_file().then_some(path)
}

/// Serve a file from the output directory.
pub(crate) async fn serve_file(State(state): State<Arc<AppState>>, req: Request<Body>) -> Response {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let Some(path) = resolve_file(&state.output_dir, req.uri().path()) else {
        return not_found();
    };

    match tokio::fs::read(&path).await {
        Ok(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime.as_ref())
                .header(header::CACHE_CONTROL, "no-cache")
                .body(Body::from(content))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read file");
            not_found()
        }
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Not found",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        fs::create_dir(dir.path().join("guide")).unwrap();
        fs::write(dir.path().join("guide/index.html"), "guide").unwrap();
        fs::write(dir.path().join("guide/setup.html"), "setup").unwrap();
        fs::write(dir.path().join("my file.html"), "spaced").unwrap();
        dir
    }

    #[test]
    fn test_resolve_file() {
        let dir = site();
        let root = dir.path();

        assert_eq!(resolve_file(root, "/"), Some(root.join("index.html")));
        assert_eq!(
            resolve_file(root, "/guide"),
            Some(root.join("guide/index.html"))
        );
        assert_eq!(
            resolve_file(root, "/guide/"),
            Some(root.join("guide/index.html"))
        );
        assert_eq!(
            resolve_file(root, "/guide/setup.html"),
            Some(root.join("guide/setup.html"))
        );
        assert_eq!(
            resolve_file(root, "/my%20file.html"),
            Some(root.join("my file.html"))
        );
        assert_eq!(resolve_file(root, "/missing.html"), None);
    }

    #[test]
    fn test_resolve_file_rejects_traversal() {
        let dir = site();
        let root = dir.path().join("guide");

        assert_eq!(resolve_file(&root, "/../index.html"), None);
        assert_eq!(resolve_file(&root, "/%2e%2e/index.html"), None);
        assert_eq!(resolve_file(&root, "/..%2findex.html"), None);
    }

    #[test]
    fn test_directory_without_index_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        assert_eq!(resolve_file(dir.path(), "/empty"), None);
    }
}
