//! Watch, debounce, rebuild, broadcast.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use folio_build::Rebuild;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use crate::debouncer::Debouncer;
use crate::hub::ReloadHub;

/// Drives rebuilds from change notifications.
///
/// At most one rebuild runs at a time. Notifications arriving while a
/// rebuild is running wait in the channel and start the next window.
pub struct DevLoop<R> {
    builder: Arc<R>,
    hub: Arc<ReloadHub>,
    window: Duration,
}

impl<R: Rebuild + 'static> DevLoop<R> {
    pub fn new(builder: Arc<R>, hub: Arc<ReloadHub>, window: Duration) -> Self {
        Self {
            builder,
            hub,
            window,
        }
    }

    /// Run until the notification channel closes.
    ///
    /// A burst still pending when the channel closes is rebuilt before
    /// returning.
    pub async fn run(self, mut changes: mpsc::Receiver<PathBuf>) {
        let mut debouncer = Debouncer::new(self.window);

        loop {
            tokio::select! {
                change = changes.recv() => match change {
                    Some(path) => {
                        tracing::debug!(path = %path.display(), "Change detected");
                        debouncer.trigger(Instant::now());
                    }
                    None => {
                        if debouncer.is_pending() {
                            self.rebuild_and_notify().await;
                        }
                        break;
                    }
                },
                () = wait_for(debouncer.deadline()) => {
                    if debouncer.fire(Instant::now()) {
                        self.rebuild_and_notify().await;
                    }
                }
            }
        }
    }

    /// Rebuild on a blocking thread, then broadcast on success.
    async fn rebuild_and_notify(&self) {
        let builder = Arc::clone(&self.builder);
        let started = Instant::now();

        match tokio::task::spawn_blocking(move || builder.rebuild()).await {
            Ok(Ok(report)) => {
                let clients = self.hub.broadcast();
                tracing::info!(
                    pages = report.pages,
                    clients,
                    elapsed = ?started.elapsed(),
                    "Rebuilt site"
                );
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Rebuild failed, keeping previous output");
            }
            Err(e) => {
                tracing::error!(error = %e, "Rebuild task panicked");
            }
        }
    }
}

/// Sleep until `deadline`, or forever when there is none.
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
