//! Preview server and live reload loop for Folio.
//!
//! [`run_preview`] builds the site once, serves the output directory over
//! HTTP and, with live reload enabled, rebuilds on source changes and tells
//! connected pages to reload.
//!
//! ```text
//! notify ──► watcher ──► DevLoop ──debounce──► Rebuild
//!                           │
//!                           └──► ReloadHub ──SSE──► browser
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use folio_build::{BuildConfig, BuildMode, SiteBuilder};
//! use folio_server::{PreviewConfig, run_preview};
//!
//! #[tokio::main]
//! async fn main() {
//!     let preview = PreviewConfig::default();
//!     let builder = SiteBuilder::new(
//!         BuildConfig::new(&preview.source_dir, &preview.output_dir),
//!         BuildMode::Preview { base_url: preview.base_url(), live_reload: true },
//!     );
//!     run_preview(preview, builder).await.unwrap();
//! }
//! ```

mod app;
mod debouncer;
mod dev_loop;
mod error;
mod hub;
mod live_reload;
mod middleware;
mod state;
mod static_files;
mod watcher;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use folio_build::Rebuild;
use state::AppState;

pub use debouncer::{DEFAULT_DEBOUNCE_MS, Debouncer};
pub use dev_loop::DevLoop;
pub use error::ServerError;
pub use hub::{ClientStream, ReloadHub};
pub use watcher::{DEFAULT_WATCH_PATTERNS, SourceWatcher, watch};

/// Preview server configuration.
#[derive(Clone, Debug)]
pub struct PreviewConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Markdown source directory (watched for changes).
    pub source_dir: PathBuf,
    /// Generated site directory (served).
    pub output_dir: PathBuf,
    /// Enable watching and live reload.
    pub live_reload: bool,
    /// Quiet period before a rebuild.
    pub debounce: Duration,
    /// Glob patterns selecting which changes trigger a rebuild.
    pub watch_patterns: Option<Vec<String>>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            source_dir: PathBuf::from("md"),
            output_dir: PathBuf::from("public"),
            live_reload: true,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            watch_patterns: None,
        }
    }
}

impl PreviewConfig {
    /// Create preview configuration from Folio config.
    #[must_use]
    pub fn from_config(config: &folio_config::Config) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            source_dir: config.docs_resolved.source_dir.clone(),
            output_dir: config.docs_resolved.output_dir.clone(),
            live_reload: config.live_reload.enabled,
            debounce: config.live_reload.debounce(),
            watch_patterns: config.live_reload.watch_patterns.clone(),
        }
    }

    /// URL the site is served under, without a trailing slash.
    ///
    /// An unspecified bind address (`0.0.0.0`, `::`) is advertised as
    /// loopback.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = match self.host.trim_start_matches('[').trim_end_matches(']') {
            "0.0.0.0" => "127.0.0.1",
            "::" => "::1",
            host => host,
        };
        if host.contains(':') {
            format!("http://[{host}]:{}", self.port)
        } else {
            format!("http://{host}:{}", self.port)
        }
    }

    fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        let ip = if host == "localhost" {
            std::net::IpAddr::from([127, 0, 0, 1])
        } else {
            host.parse().map_err(|_| ServerError::InvalidAddress {
                host: self.host.clone(),
                port: self.port,
            })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Build the site, then serve it until Ctrl-C.
///
/// `builder` should render in preview mode against [`PreviewConfig::base_url`].
/// The initial build must succeed; later rebuild failures are logged and the
/// previous output keeps being served.
///
/// # Errors
///
/// Returns an error if the initial build fails, the address cannot be bound,
/// or the source directory cannot be watched.
pub async fn run_preview<R: Rebuild + 'static>(
    config: PreviewConfig,
    builder: R,
) -> Result<(), ServerError> {
    let builder = Arc::new(builder);

    let initial = Arc::clone(&builder);
    let report = tokio::task::spawn_blocking(move || initial.rebuild())
        .await?
        .map_err(ServerError::InitialBuild)?;
    tracing::info!(
        pages = report.pages,
        images = report.images,
        "Initial build complete"
    );

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::AddrInUse => ServerError::PortInUse { addr },
            _ => ServerError::Bind { addr, source },
        })?;

    let hub = Arc::new(ReloadHub::new());

    // Held for the lifetime of the server
    let _watcher = if config.live_reload {
        let patterns = config.watch_patterns.clone().unwrap_or_else(|| {
            DEFAULT_WATCH_PATTERNS
                .iter()
                .map(|&p| p.to_owned())
                .collect()
        });
        let (watcher, changes) =
            watch(&config.source_dir, &patterns, Some(config.output_dir.clone()))?;
        let dev_loop = DevLoop::new(Arc::clone(&builder), Arc::clone(&hub), config.debounce);
        tokio::spawn(dev_loop.run(changes));
        Some(watcher)
    } else {
        None
    };

    let state = Arc::new(AppState {
        output_dir: config.output_dir.clone(),
        hub: Arc::clone(&hub),
    });
    let app = app::create_router(state, config.live_reload);

    tracing::info!(address = %config.base_url(), "Serving preview");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub))
        .await
        .map_err(ServerError::Serve)
}

/// Wait for Ctrl-C, then end open live reload streams.
async fn shutdown_signal(hub: Arc<ReloadHub>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
    hub.close_all();
}
