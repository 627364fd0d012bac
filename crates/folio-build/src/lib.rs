//! Build orchestration for Folio.
//!
//! [`SiteBuilder`] runs one full pass over the source tree: navigation,
//! image externalization, rendering, page assembly and the orphan sweep.
//! The dev loop drives it through the [`Rebuild`] trait.

mod builder;

pub use builder::{BuildConfig, BuildError, BuildMode, BuildReport, Rebuild, SiteBuilder};
