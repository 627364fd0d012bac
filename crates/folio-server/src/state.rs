//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::hub::ReloadHub;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Directory the site is served from.
    pub(crate) output_dir: PathBuf,
    /// Connected live reload clients.
    pub(crate) hub: Arc<ReloadHub>,
}
