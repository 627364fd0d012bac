//! Source directory watching.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Patterns used when none are configured.
pub const DEFAULT_WATCH_PATTERNS: &[&str] = &["**/*"];

/// Capacity of the change notification channel.
const CHANNEL_CAPACITY: usize = 100;

/// Keeps the underlying filesystem watcher alive.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
}

/// Watch `source_dir` recursively.
///
/// Returns a receiver of changed paths that match `patterns` (relative to
/// `source_dir`). Paths under `ignore_dir` are dropped so that writing the
/// output tree inside the source tree does not retrigger a build.
pub fn watch(
    source_dir: &Path,
    patterns: &[String],
    ignore_dir: Option<PathBuf>,
) -> Result<(SourceWatcher, mpsc::Receiver<PathBuf>), notify::Error> {
    let (tx, rx) = mpsc::channel::<PathBuf>(CHANNEL_CAPACITY);
    let root = source_dir.to_path_buf();
    let patterns = compile_patterns(patterns);

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "File watcher error");
                return;
            }
        };
        if !is_change(&event.kind) {
            return;
        }
        for path in event.paths {
            if ignore_dir.as_ref().is_some_and(|dir| path.starts_with(dir)) {
                continue;
            }
            if !matches_patterns(&path, &root, &patterns) {
                continue;
            }
            tracing::debug!(path = %path.display(), kind = ?event.kind, "Recorded filesystem event");
            // Callback runs on the watcher thread, outside the runtime
            if tx.blocking_send(path).is_err() {
                return;
            }
        }
    })?;

    watcher.watch(source_dir, RecursiveMode::Recursive)?;
    tracing::info!(path = %source_dir.display(), "Watching for changes");

    Ok((SourceWatcher { _watcher: watcher }, rx))
}

/// Parse glob patterns, skipping invalid ones.
fn compile_patterns(patterns: &[String]) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!(pattern = %p, error = %e, "Ignoring invalid watch pattern");
                None
            }
        })
        .collect()
}

/// Content changes only: creations, modifications and removals.
fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Check a path against watch patterns relative to the source directory.
fn matches_patterns(path: &Path, source_dir: &Path, patterns: &[glob::Pattern]) -> bool {
    let Ok(relative) = path.strip_prefix(source_dir) else {
        return false;
    };

    let relative_str = relative.to_string_lossy();
    patterns.iter().any(|pattern| pattern.matches(&relative_str))
}
