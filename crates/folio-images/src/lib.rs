//! Remote image handling for Folio.
//!
//! Documents may reference images hosted elsewhere. During a build pass each
//! remote reference is downloaded once, compressed, stored flat in the output
//! root and the reference is rewritten to point at the local copy:
//!
//! - [`Externalizer`]: scans markdown and rewrites remote image references
//! - [`ImageFetcher`]: download seam, [`UreqFetcher`] over HTTP
//! - [`compress`]: format-aware recompression that never grows a file
//! - [`TouchedImages`]: per-pass record of referenced local images
//! - [`collect_orphans`]: removes cached images no document references
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use folio_images::{
//!     CompressionSettings, Externalizer, ImageTarget, TouchedImages, UreqFetcher,
//!     collect_orphans,
//! };
//!
//! let fetcher = UreqFetcher::default();
//! let externalizer = Externalizer::new(
//!     Path::new("public"),
//!     ImageTarget::Static,
//!     &fetcher,
//!     CompressionSettings::default(),
//! );
//!
//! let mut touched = TouchedImages::new();
//! let text = externalizer.externalize("![logo](https://example.com/logo.png)", &mut touched);
//! assert_eq!(text, "![logo](/logo.png)");
//! collect_orphans(Path::new("public"), &touched);
//! ```

mod compress;
mod externalize;
mod fetch;
mod orphans;
mod touched;

pub use compress::{CompressError, CompressionSettings, compress};
pub use externalize::{Externalizer, ImageTarget, cache_filename};
pub use fetch::{DEFAULT_TIMEOUT, FetchError, ImageFetcher, UreqFetcher, create_agent};
pub use orphans::{IMAGE_EXTENSIONS, OrphanReport, collect_orphans, is_image_path};
pub use touched::TouchedImages;
