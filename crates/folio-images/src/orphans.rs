//! Removal of cached images no longer referenced by any document.

use std::path::Path;

use crate::touched::TouchedImages;

/// File extensions treated as images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "avif", "bmp", "ico",
];

/// Outcome of an orphan sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrphanReport {
    /// Number of images deleted.
    pub removed: usize,
    /// Number of images that could not be deleted.
    pub failed: usize,
}

/// Whether the path carries an image extension.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Delete every image directly in `output_dir` that is not in `touched`.
///
/// Subdirectories and non-image files are never touched. A missing directory
/// is a no-op. Failures are logged and the sweep continues.
pub fn collect_orphans(output_dir: &Path, touched: &TouchedImages) -> OrphanReport {
    let mut report = OrphanReport::default();

    let entries = match std::fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return report,
        Err(e) => {
            tracing::warn!(path = %output_dir.display(), error = %e, "Failed to scan output directory");
            return report;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read directory entry");
                continue;
            }
        };

        let path = entry.path();
        let is_file = entry.file_type().is_ok_and(|t| t.is_file());
        if !is_file || !is_image_path(&path) || touched.contains(&path) {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Removed unused image");
                report.removed += 1;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove unused image");
                report.failed += 1;
            }
        }
    }

    report
}
