//! Router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use folio_site::LIVE_RELOAD_PATH;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::live_reload;
use crate::middleware::security;
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
///
/// The live reload endpoint is only routed when `live_reload` is set.
pub(crate) fn create_router(state: Arc<AppState>, live_reload: bool) -> Router {
    let mut router = Router::new();

    if live_reload {
        router = router.route(LIVE_RELOAD_PATH, get(live_reload::sse_handler));
    }

    router
        .fallback(static_files::serve_file)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::csp_layer())
                .layer(security::content_type_options_layer()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::ReloadHub;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tower::ServiceExt;

    fn router(dir: &tempfile::TempDir, live_reload: bool) -> (Router, Arc<ReloadHub>) {
        let hub = Arc::new(ReloadHub::new());
        let state = Arc::new(AppState {
            output_dir: dir.path().to_path_buf(),
            hub: Arc::clone(&hub),
        });
        (create_router(state, live_reload), hub)
    }

    fn output() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>Home</h1>").unwrap();
        fs::write(dir.path().join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        dir
    }

    async fn get_path(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_serves_index_for_root() {
        let dir = output();
        let (app, _) = router(&dir, false);

        let response = get_path(app, "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert!(response.headers().contains_key("content-security-policy"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>Home</h1>");
    }

    #[tokio::test]
    async fn test_csp_allows_remote_images() {
        let dir = output();
        let (app, _) = router(&dir, false);

        let response = get_path(app, "/").await;

        let csp = response.headers()["content-security-policy"]
            .to_str()
            .unwrap();
        let img_src = csp
            .split(';')
            .map(str::trim)
            .find(|d| d.starts_with("img-src"))
            .unwrap();
        assert!(img_src.contains("https:"));
        assert!(img_src.contains("http:"));
        assert!(img_src.contains("'self'"));
    }

    #[tokio::test]
    async fn test_content_type_from_extension() {
        let dir = output();
        let (app, _) = router(&dir, false);

        let response = get_path(app, "/logo.png").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = output();
        let (app, _) = router(&dir, false);

        let response = get_path(app, "/nope.html").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Not found");
    }

    #[tokio::test]
    async fn test_post_is_rejected() {
        let dir = output();
        let (app, _) = router(&dir, false);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/index.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_live_reload_endpoint_streams_events() {
        let dir = output();
        let (app, hub) = router(&dir, true);

        let response = get_path(app, LIVE_RELOAD_PATH).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        assert_eq!(hub.client_count(), 1);

        drop(response);
        assert_eq!(hub.client_count(), 0);
    }

    #[tokio::test]
    async fn test_live_reload_endpoint_absent_when_disabled() {
        let dir = output();
        let (app, hub) = router(&dir, false);

        let response = get_path(app, LIVE_RELOAD_PATH).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(hub.client_count(), 0);
    }
}
