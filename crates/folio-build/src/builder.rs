//! Static site builder.

use std::path::{Component, Path, PathBuf};

use folio_config::Config;
use folio_images::{
    CompressionSettings, Externalizer, ImageFetcher, ImageTarget, TouchedImages, UreqFetcher,
    collect_orphans,
};
use folio_renderer::MarkdownRenderer;
use folio_site::{NavTree, PageContext, assemble_page, render_nav};

/// Document written when the source directory does not exist yet.
const SEED_INDEX: &str = "# Welcome\n\nThis page was created for you. Edit `index.md` to get started.\n";

/// Target of a build pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    /// Deployable site. The output directory is replaced wholesale.
    Static,
    /// Site served by the preview server. The output directory is kept
    /// between passes.
    Preview {
        /// Preview server origin, e.g. `http://127.0.0.1:8080`.
        base_url: String,
        /// Pages listen for reload events.
        live_reload: bool,
    },
}

impl BuildMode {
    fn live_reload(&self) -> bool {
        matches!(
            self,
            Self::Preview {
                live_reload: true,
                ..
            }
        )
    }

    fn image_target(&self) -> ImageTarget {
        match self {
            Self::Static => ImageTarget::Static,
            Self::Preview { base_url, .. } => ImageTarget::Preview {
                base_url: base_url.clone(),
            },
        }
    }
}

/// Configuration for site building.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Markdown source directory.
    pub source_dir: PathBuf,
    /// Output directory.
    pub output_dir: PathBuf,
    /// Image compression parameters.
    pub compression: CompressionSettings,
}

impl BuildConfig {
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            compression: CompressionSettings::default(),
        }
    }

    /// Build configuration from loaded application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_dir: config.docs_resolved.source_dir.clone(),
            output_dir: config.docs_resolved.output_dir.clone(),
            compression: CompressionSettings {
                jpeg_quality: config.images.jpeg_quality,
                png_quality_min: config.images.png_quality_min,
                png_quality_max: config.images.png_quality_max,
            },
        }
    }
}

/// Error returned by the site builder.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to create source directory {}: {source}", path.display())]
    SourceDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to prepare output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("output directory {} must not contain the source directory {}", output.display(), source_dir.display())]
    OverlappingDirs { output: PathBuf, source_dir: PathBuf },
    #[error(transparent)]
    Nav(#[from] folio_site::NavError),
    #[error("failed to read {}: {source}", path.display())]
    ReadDocument {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    WritePage {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Summary of one build pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Pages written.
    pub pages: usize,
    /// Distinct local image paths referenced by documents.
    pub images: usize,
    /// Unreferenced images deleted.
    pub orphans_removed: usize,
}

/// Something that can regenerate the site.
pub trait Rebuild: Send + Sync {
    fn rebuild(&self) -> Result<BuildReport, BuildError>;
}

/// Builds the site from a markdown directory.
pub struct SiteBuilder {
    config: BuildConfig,
    mode: BuildMode,
    fetcher: Box<dyn ImageFetcher>,
    renderer: MarkdownRenderer,
}

impl SiteBuilder {
    /// Create a builder downloading images over HTTP.
    pub fn new(config: BuildConfig, mode: BuildMode) -> Self {
        Self {
            config,
            mode,
            fetcher: Box::new(UreqFetcher::default()),
            renderer: MarkdownRenderer::new(),
        }
    }

    /// Replace the image fetcher.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: impl ImageFetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> &BuildMode {
        &self.mode
    }

    /// Run one full build pass.
    ///
    /// There is no rollback: a failure midway leaves the pages written so
    /// far in place.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let source_dir = &self.config.source_dir;
        let output_dir = &self.config.output_dir;

        let overlapping = contains_path(output_dir, source_dir).map_err(|e| {
            BuildError::OutputDir {
                path: output_dir.clone(),
                source: e,
            }
        })?;
        if overlapping {
            return Err(BuildError::OverlappingDirs {
                output: output_dir.clone(),
                source_dir: source_dir.clone(),
            });
        }

        ensure_source_dir(source_dir)?;
        self.prepare_output_dir()?;

        let tree = NavTree::build(source_dir)?;
        let externalizer = Externalizer::new(
            output_dir,
            self.mode.image_target(),
            self.fetcher.as_ref(),
            self.config.compression,
        );
        let mut touched = TouchedImages::new();
        let mut report = BuildReport::default();

        for node in tree.documents() {
            let (Some(source), Some(output)) = (&node.source, node.output_path()) else {
                continue;
            };
            let source_path = source_dir.join(source);
            let output_path = output_dir.join(output);

            let text =
                std::fs::read_to_string(&source_path).map_err(|e| BuildError::ReadDocument {
                    path: source_path.clone(),
                    source: e,
                })?;
            let text = externalizer.externalize(&text, &mut touched);
            let content = self.renderer.render(&text);
            let navigation = render_nav(&tree, &node.path);
            let html = assemble_page(&PageContext {
                title: &node.title,
                content: &content,
                navigation: &navigation,
                live_reload: self.mode.live_reload(),
            });

            write_page(&output_path, &html)?;
            tracing::info!(path = %output_path.display(), "Generated page");
            report.pages += 1;
        }

        report.images = touched.len();
        report.orphans_removed = collect_orphans(output_dir, &touched).removed;

        tracing::info!(
            pages = report.pages,
            images = report.images,
            orphans_removed = report.orphans_removed,
            "Build complete"
        );
        Ok(report)
    }

    /// Replace (static) or create (preview) the output directory.
    fn prepare_output_dir(&self) -> Result<(), BuildError> {
        let output_dir = &self.config.output_dir;
        let output_err = |e| BuildError::OutputDir {
            path: output_dir.clone(),
            source: e,
        };

        if self.mode == BuildMode::Static {
            match std::fs::remove_dir_all(output_dir) {
                Ok(()) => tracing::debug!(path = %output_dir.display(), "Removed output directory"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(output_err(e)),
            }
        }
        std::fs::create_dir_all(output_dir).map_err(output_err)
    }
}

impl Rebuild for SiteBuilder {
    fn rebuild(&self) -> Result<BuildReport, BuildError> {
        self.build()
    }
}

/// Create the source directory with a starter page if it is missing.
fn ensure_source_dir(source_dir: &Path) -> Result<(), BuildError> {
    if source_dir.exists() {
        return Ok(());
    }

    let source_err = |e| BuildError::SourceDir {
        path: source_dir.to_path_buf(),
        source: e,
    };
    std::fs::create_dir_all(source_dir).map_err(source_err)?;
    std::fs::write(source_dir.join("index.md"), SEED_INDEX).map_err(source_err)?;
    tracing::info!(path = %source_dir.display(), "Created source directory with a starter page");
    Ok(())
}

/// Whether `outer` is `inner` or one of its ancestors.
///
/// Paths are compared absolute and lexically normalized, and also after
/// symlink resolution when both exist.
fn contains_path(outer: &Path, inner: &Path) -> std::io::Result<bool> {
    let outer_abs = normalize(&std::path::absolute(outer)?);
    let inner_abs = normalize(&std::path::absolute(inner)?);
    if inner_abs.starts_with(&outer_abs) {
        return Ok(true);
    }

    match (outer.canonicalize(), inner.canonicalize()) {
        (Ok(outer), Ok(inner)) => Ok(inner.starts_with(outer)),
        _ => Ok(false),
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn write_page(path: &Path, html: &str) -> Result<(), BuildError> {
    let write_err = |e| BuildError::WritePage {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, html).map_err(write_err)
}
