//! Registry of connected live reload clients.
//!
//! Each client owns a [`ClientStream`] fed by an unbounded channel. Dropping
//! the stream (the HTTP connection closed) removes the client; broadcasting
//! also prunes clients whose receiver is gone.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;

/// Connected preview clients.
#[derive(Debug, Default)]
pub struct ReloadHub {
    clients: Mutex<HashMap<u64, mpsc::UnboundedSender<()>>>,
    next_id: AtomicU64,
}

impl ReloadHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client.
    pub fn connect(self: &Arc<Self>) -> ClientStream {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.lock().unwrap().insert(id, tx);
        tracing::debug!(client = id, "Live reload client connected");

        ClientStream {
            id,
            hub: Arc::clone(self),
            rx,
        }
    }

    /// Signal every open client to reload.
    ///
    /// Returns the number of clients notified.
    pub fn broadcast(&self) -> usize {
        let mut clients = self.clients.lock().unwrap();
        clients.retain(|id, tx| {
            let open = tx.send(()).is_ok();
            if !open {
                tracing::debug!(client = id, "Pruned closed live reload client");
            }
            open
        });
        clients.len()
    }

    /// Number of registered clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.lock().unwrap().len()
    }

    /// Disconnect every client, ending their streams.
    pub fn close_all(&self) {
        self.clients.lock().unwrap().clear();
    }

    fn disconnect(&self, id: u64) {
        if self.clients.lock().unwrap().remove(&id).is_some() {
            tracing::debug!(client = id, "Live reload client disconnected");
        }
    }
}

/// Reload signals for one client.
///
/// Ends when the hub closes the client.
#[derive(Debug)]
pub struct ClientStream {
    id: u64,
    hub: Arc<ReloadHub>,
    rx: mpsc::UnboundedReceiver<()>,
}

impl Stream for ClientStream {
    type Item = ();

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<()>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for ClientStream {
    fn drop(&mut self) {
        self.hub.disconnect(self.id);
    }
}
