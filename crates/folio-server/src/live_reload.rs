//! Server-Sent Events endpoint for live reload.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::{Stream, StreamExt};

use crate::state::AppState;

/// Payload telling the page to reload.
pub(crate) const RELOAD_EVENT: &str = "reload";

/// Stream reload events to one preview page.
pub(crate) async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state
        .hub
        .connect()
        .map(|()| Ok(Event::default().data(RELOAD_EVENT)));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
