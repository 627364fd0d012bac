use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Local image paths referenced during one build pass.
///
/// Created empty at the start of every pass, filled by the
/// [`Externalizer`](crate::Externalizer) and consumed by
/// [`collect_orphans`](crate::collect_orphans).
#[derive(Debug, Default, Clone)]
pub struct TouchedImages {
    paths: HashSet<PathBuf>,
}

impl TouchedImages {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a referenced image. Returns `false` if it was already recorded.
    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        self.paths.insert(path.into())
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}
