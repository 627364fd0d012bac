//! Remote image externalization.
//!
//! Rewrites `![alt](https://host/path/file.png "title")` references so they
//! point at a cached copy in the output root. The cache is keyed by the
//! trailing filename of the URL; two URLs sharing a filename resolve to the
//! same cached file.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::compress::{CompressionSettings, compress};
use crate::fetch::ImageFetcher;
use crate::orphans::is_image_path;
use crate::touched::TouchedImages;

/// Markdown image with an http(s) destination and optional title.
static REMOTE_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[([^\]]*)\]\((https?://[^\s)]+)((?:\s+"[^"]*")?)\)"#).unwrap()
});

/// Where rewritten references point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageTarget {
    /// Root-relative paths (`/logo.png`) for the deployable site.
    Static,
    /// Absolute URLs on the preview server (`http://127.0.0.1:8080/logo.png`).
    Preview {
        /// Server origin without a trailing slash.
        base_url: String,
    },
}

impl ImageTarget {
    fn url_for(&self, filename: &str) -> String {
        match self {
            Self::Static => format!("/{filename}"),
            Self::Preview { base_url } => {
                format!("{}/{filename}", base_url.trim_end_matches('/'))
            }
        }
    }
}

/// Rewrites remote image references in markdown documents.
pub struct Externalizer<'a> {
    output_dir: PathBuf,
    target: ImageTarget,
    fetcher: &'a dyn ImageFetcher,
    compression: CompressionSettings,
}

impl<'a> Externalizer<'a> {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        target: ImageTarget,
        fetcher: &'a dyn ImageFetcher,
        compression: CompressionSettings,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            target,
            fetcher,
            compression,
        }
    }

    /// Rewrite every remote image reference in `text`.
    ///
    /// Each local path is recorded in `touched`, whether the file was already
    /// cached, freshly downloaded, or failed to download. A reference whose
    /// image cannot be obtained is left pointing at the remote URL.
    pub fn externalize(&self, text: &str, touched: &mut TouchedImages) -> String {
        REMOTE_IMAGE_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let url = &caps[2];
                match self.localize(url, touched) {
                    Some(local_url) => format!("![{}]({local_url}{})", &caps[1], &caps[3]),
                    None => caps[0].to_owned(),
                }
            })
            .into_owned()
    }

    /// Ensure `url` is cached and return the URL to reference it by.
    fn localize(&self, url: &str, touched: &mut TouchedImages) -> Option<String> {
        let Some(filename) = cache_filename(url) else {
            tracing::warn!(url, "Cannot derive a cache filename, keeping remote reference");
            return None;
        };

        let local_path = self.output_dir.join(filename);
        touched.insert(local_path.clone());

        if !local_path.exists() && !self.download(url, &local_path) {
            return None;
        }

        Some(self.target.url_for(filename))
    }

    /// Fetch, compress and store one image. Returns `false` on failure.
    fn download(&self, url: &str, local_path: &Path) -> bool {
        let bytes = match self.fetcher.fetch(url) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(url, error = %e, "Failed to download image");
                return false;
            }
        };

        let compressed = compress(&bytes, &self.compression);
        if let Err(e) = std::fs::write(local_path, &compressed) {
            tracing::warn!(path = %local_path.display(), error = %e, "Failed to write image");
            return false;
        }

        tracing::info!(
            url,
            path = %local_path.display(),
            bytes = compressed.len(),
            "Downloaded image"
        );
        true
    }
}

/// Derive the cache filename from the last segment of a URL path.
///
/// Query strings and fragments are ignored. Returns `None` when the URL has
/// no path segment, when the segment contains anything besides ASCII
/// alphanumerics, `.`, `-`, `_` and `+`, when it starts with a dot, or when it
/// lacks an image extension. Cached files must stay visible to the orphan sweep.
pub fn cache_filename(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let (_, path) = rest.split_once('/')?;
    let name = path.rsplit('/').next().unwrap_or_default();

    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+'))
        && is_image_path(Path::new(name));
    valid.then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Fetcher serving fixed bytes and recording every requested URL.
    #[derive(Default)]
    struct RecordingFetcher {
        body: Vec<u8>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingFetcher {
        fn with_body(body: &[u8]) -> Self {
            Self {
                body: body.to_vec(),
                calls: Mutex::default(),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl ImageFetcher for RecordingFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.lock().unwrap().push(url.to_owned());
            Ok(self.body.clone())
        }
    }

    struct FailingFetcher;

    impl ImageFetcher for FailingFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::Http {
                url: url.to_owned(),
                message: "dns error".to_owned(),
            })
        }
    }

    fn externalizer<'a>(
        dir: &Path,
        target: ImageTarget,
        fetcher: &'a dyn ImageFetcher,
    ) -> Externalizer<'a> {
        Externalizer::new(dir, target, fetcher, CompressionSettings::default())
    }

    #[test]
    fn test_cache_filename() {
        assert_eq!(
            cache_filename("https://cdn.example.com/a/b/cat.png"),
            Some("cat.png")
        );
        assert_eq!(
            cache_filename("https://cdn.example.com/cat.png?w=200#top"),
            Some("cat.png")
        );
        assert_eq!(cache_filename("https://cdn.example.com"), None);
        assert_eq!(cache_filename("https://cdn.example.com/"), None);
        assert_eq!(cache_filename("https://cdn.example.com/dir/"), None);
        assert_eq!(cache_filename("https://cdn.example.com/.htaccess"), None);
        assert_eq!(cache_filename("https://cdn.example.com/my%20cat.png"), None);
        assert_eq!(
            cache_filename("https://cdn.example.com/a/LOGO.SVG"),
            Some("LOGO.SVG")
        );
    }

    #[test]
    fn test_cache_filename_requires_image_extension() {
        assert_eq!(cache_filename("https://cdn.example.com/photo"), None);
        assert_eq!(cache_filename("https://cdn.example.com/pic.tiff"), None);
        assert_eq!(cache_filename("https://cdn.example.com/notes.txt"), None);
        assert_eq!(cache_filename("https://cdn.example.com/index.html"), None);
    }

    #[test]
    fn test_non_image_url_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::with_body(b"data");
        let ext = externalizer(dir.path(), ImageTarget::Static, &fetcher);
        let mut touched = TouchedImages::new();

        let input = "![Chart](https://cdn.example.com/chart)\n";
        let out = ext.externalize(input, &mut touched);

        assert_eq!(out, input);
        assert_eq!(fetcher.call_count(), 0);
        assert!(touched.is_empty());
        assert!(!dir.path().join("chart").exists());
    }

    #[test]
    fn test_static_rewrite_and_touch() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::with_body(b"not really a png");
        let ext = externalizer(dir.path(), ImageTarget::Static, &fetcher);
        let mut touched = TouchedImages::new();

        let out = ext.externalize(
            "Intro\n\n![A cat](https://cdn.example.com/img/cat.png)\n",
            &mut touched,
        );

        assert_eq!(out, "Intro\n\n![A cat](/cat.png)\n");
        assert!(touched.contains(&dir.path().join("cat.png")));
        assert_eq!(
            std::fs::read(dir.path().join("cat.png")).unwrap(),
            b"not really a png"
        );
    }

    #[test]
    fn test_preview_rewrite_uses_server_origin() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::with_body(b"bytes");
        let target = ImageTarget::Preview {
            base_url: "http://127.0.0.1:8080".to_owned(),
        };
        let ext = externalizer(dir.path(), target, &fetcher);
        let mut touched = TouchedImages::new();

        let out = ext.externalize("![x](https://cdn.example.com/x.gif)", &mut touched);

        assert_eq!(out, "![x](http://127.0.0.1:8080/x.gif)");
    }

    #[test]
    fn test_title_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::with_body(b"bytes");
        let ext = externalizer(dir.path(), ImageTarget::Static, &fetcher);
        let mut touched = TouchedImages::new();

        let out = ext.externalize(
            r#"![Logo](https://cdn.example.com/logo.png "Our logo")"#,
            &mut touched,
        );

        assert_eq!(out, r#"![Logo](/logo.png "Our logo")"#);
    }

    #[test]
    fn test_cached_image_is_not_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::with_body(b"first download");
        let ext = externalizer(dir.path(), ImageTarget::Static, &fetcher);
        let doc = "![a](https://cdn.example.com/a.png)";

        let mut first = TouchedImages::new();
        let out_first = ext.externalize(doc, &mut first);
        let modified = std::fs::metadata(dir.path().join("a.png"))
            .unwrap()
            .modified()
            .unwrap();

        let mut second = TouchedImages::new();
        let out_second = ext.externalize(doc, &mut second);

        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(out_first, out_second);
        assert!(second.contains(&dir.path().join("a.png")));
        let metadata = std::fs::metadata(dir.path().join("a.png")).unwrap();
        assert_eq!(metadata.modified().unwrap(), modified);
        assert_eq!(
            std::fs::read(dir.path().join("a.png")).unwrap(),
            b"first download"
        );
    }

    #[test]
    fn test_same_filename_collides() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::with_body(b"bytes");
        let ext = externalizer(dir.path(), ImageTarget::Static, &fetcher);
        let mut touched = TouchedImages::new();

        let out = ext.externalize(
            "![a](https://one.example.com/logo.png) ![b](https://two.example.com/logo.png)",
            &mut touched,
        );

        assert_eq!(out, "![a](/logo.png) ![b](/logo.png)");
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(touched.len(), 1);
    }

    #[test]
    fn test_local_references_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::default();
        let ext = externalizer(dir.path(), ImageTarget::Static, &fetcher);
        let mut touched = TouchedImages::new();
        let doc = "![a](images/a.png) ![b](/b.png) [link](https://example.com/page.png)";

        let out = ext.externalize(doc, &mut touched);

        assert_eq!(out, doc);
        assert_eq!(fetcher.call_count(), 0);
        assert!(touched.is_empty());
    }

    #[test]
    fn test_failed_fetch_keeps_remote_url() {
        let dir = tempfile::tempdir().unwrap();
        let ext = externalizer(dir.path(), ImageTarget::Static, &FailingFetcher);
        let mut touched = TouchedImages::new();
        let doc = "![x](https://bad.example/img.png)";

        let out = ext.externalize(doc, &mut touched);

        assert_eq!(out, doc);
        assert!(!dir.path().join("img.png").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_underivable_filename_keeps_remote_url() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::with_body(b"bytes");
        let ext = externalizer(dir.path(), ImageTarget::Static, &fetcher);
        let mut touched = TouchedImages::new();
        let doc = "![x](https://example.com/)";

        let out = ext.externalize(doc, &mut touched);

        assert_eq!(out, doc);
        assert_eq!(fetcher.call_count(), 0);
        assert!(touched.is_empty());
    }
}
