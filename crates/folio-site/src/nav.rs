//! Navigation model for the document tree.
//!
//! # Architecture
//!
//! Nodes are stored in a flat `Vec<NavNode>` with parent/children
//! relationships tracked by indices. The tree is rebuilt from the filesystem
//! on every build pass.
//!
//! Ordering rules live in pure functions over [`Entry`] lists:
//! - documents come before directories
//! - `index.md` is the first document, the rest sort by filename
//! - directories sort by name
//! - hidden entries and non-markdown files are skipped

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Extension marking a file as a renderable document.
pub const DOCUMENT_EXTENSION: &str = "md";

/// Path of a directory node without an index page.
pub const PLACEHOLDER_PATH: &str = "#";

const INDEX_STEM: &str = "index";

/// Error building the navigation model.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Document,
    Directory,
}

/// Directory entry considered for navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// File or directory name, including extension.
    pub name: String,
    pub kind: EntryKind,
}

impl Entry {
    pub fn document(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Document,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    /// Name without the document extension.
    fn stem(&self) -> &str {
        match self.kind {
            EntryKind::Document => self
                .name
                .strip_suffix(DOCUMENT_EXTENSION)
                .and_then(|s| s.strip_suffix('.'))
                .unwrap_or(&self.name),
            EntryKind::Directory => &self.name,
        }
    }

    fn is_index(&self) -> bool {
        self.kind == EntryKind::Document && self.stem() == INDEX_STEM
    }
}

/// Filter and order the entries of one directory.
///
/// Documents come first with `index` leading, then directories. Both groups
/// sort lexicographically by name.
pub fn order_entries(entries: Vec<Entry>) -> Vec<Entry> {
    let (mut documents, mut directories): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .filter(|e| !e.name.starts_with('.'))
        .partition(|e| e.kind == EntryKind::Document);

    documents.sort_by(compare_documents);
    directories.sort_by(|a, b| a.name.cmp(&b.name));

    documents.extend(directories);
    documents
}

fn compare_documents(a: &Entry, b: &Entry) -> Ordering {
    match (a.is_index(), b.is_index()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    }
}

/// Human-readable name for a file stem or directory name.
///
/// `index` becomes "Home"; otherwise hyphens become spaces and every word is
/// capitalized (`getting-started` -> "Getting Started").
pub fn display_name(stem: &str) -> String {
    if stem == INDEX_STEM {
        return "Home".to_owned();
    }
    stem.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One navigable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavNode {
    /// Display name.
    pub title: String,
    /// Web path (`/guide/setup.html`), or [`PLACEHOLDER_PATH`].
    pub path: String,
    /// Source path relative to the document root. `None` for directories.
    pub source: Option<PathBuf>,
}

impl NavNode {
    #[must_use]
    pub fn is_document(&self) -> bool {
        self.source.is_some()
    }

    /// Whether the node links somewhere.
    #[must_use]
    pub fn is_navigable(&self) -> bool {
        self.path != PLACEHOLDER_PATH
    }

    /// Output path relative to the output root (`guide/setup.html`).
    #[must_use]
    pub fn output_path(&self) -> Option<PathBuf> {
        self.source.as_ref().map(|s| s.with_extension("html"))
    }
}

/// Ordered navigation tree.
#[derive(Debug, Default)]
pub struct NavTree {
    nodes: Vec<NavNode>,
    children: Vec<Vec<usize>>,
    parents: Vec<Option<usize>>,
    roots: Vec<usize>,
}

impl NavTree {
    /// Build the tree for every document under `root`.
    ///
    /// Directories without documents, directly or transitively, produce no
    /// node.
    pub fn build(root: &Path) -> Result<Self, NavError> {
        let mut tree = Self::default();
        tree.roots = tree.visit(root, Path::new(""), "", None)?;
        tracing::debug!(nodes = tree.len(), "Built navigation tree");
        Ok(tree)
    }

    /// Visit one directory and return the emitted node indices in order.
    fn visit(
        &mut self,
        dir: &Path,
        rel_dir: &Path,
        web_prefix: &str,
        parent: Option<usize>,
    ) -> Result<Vec<usize>, NavError> {
        let entries = read_entries(dir)?;
        let mut emitted = Vec::new();

        for entry in order_entries(entries) {
            let rel_path = rel_dir.join(&entry.name);
            match entry.kind {
                EntryKind::Document => {
                    let node = NavNode {
                        title: display_name(entry.stem()),
                        path: format!("{web_prefix}/{}.html", entry.stem()),
                        source: Some(rel_path),
                    };
                    emitted.push(self.push(node, parent));
                }
                EntryKind::Directory => {
                    let node = NavNode {
                        title: display_name(&entry.name),
                        path: PLACEHOLDER_PATH.to_owned(),
                        source: None,
                    };
                    let idx = self.push(node, parent);
                    let child_prefix = format!("{web_prefix}/{}", entry.name);
                    let children =
                        self.visit(&dir.join(&entry.name), &rel_path, &child_prefix, Some(idx))?;

                    if children.is_empty() {
                        self.pop();
                        continue;
                    }

                    let index_path = children
                        .iter()
                        .map(|&c| &self.nodes[c].path)
                        .find(|p| p.ends_with("/index.html"))
                        .cloned();
                    if let Some(index_path) = index_path {
                        self.nodes[idx].path = index_path;
                    }
                    self.children[idx] = children;
                    emitted.push(idx);
                }
            }
        }

        Ok(emitted)
    }

    fn push(&mut self, node: NavNode, parent: Option<usize>) -> usize {
        self.nodes.push(node);
        self.children.push(Vec::new());
        self.parents.push(parent);
        self.nodes.len() - 1
    }

    /// Discard the most recently pushed node (an empty directory).
    fn pop(&mut self) {
        self.nodes.pop();
        self.children.pop();
        self.parents.pop();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level node indices in navigation order.
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    #[must_use]
    pub fn node(&self, idx: usize) -> &NavNode {
        &self.nodes[idx]
    }

    #[must_use]
    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    #[must_use]
    pub fn parent(&self, idx: usize) -> Option<usize> {
        self.parents[idx]
    }

    /// Document nodes in navigation order (depth-first, pre-order).
    pub fn documents(&self) -> Vec<&NavNode> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if node.is_document() {
                out.push(node);
            }
            stack.extend(self.children[idx].iter().rev());
        }
        out
    }
}

/// Read a directory into navigation entries.
fn read_entries(dir: &Path) -> Result<Vec<Entry>, NavError> {
    let read_err = |source| NavError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let Ok(name) = entry.file_name().into_string() else {
            tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 path");
            continue;
        };
        let path = entry.path();
        if path.is_dir() {
            entries.push(Entry::directory(name));
        } else if path.extension().is_some_and(|ext| ext == DOCUMENT_EXTENSION) {
            entries.push(Entry::document(name));
        }
    }
    Ok(entries)
}
