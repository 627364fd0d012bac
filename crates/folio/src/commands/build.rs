//! `folio build` command implementation.

use std::path::PathBuf;

use clap::Args;
use folio_build::{BuildConfig, BuildMode, SiteBuilder};
use folio_config::{CliSettings, Config};
use folio_images::UreqFetcher;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory for the generated site (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

impl BuildArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Source: {}",
            config.docs_resolved.source_dir.display()
        ));
        output.info(&format!(
            "Output: {}",
            config.docs_resolved.output_dir.display()
        ));

        let builder = SiteBuilder::new(BuildConfig::from_config(&config), BuildMode::Static)
            .with_fetcher(UreqFetcher::new(config.images.fetch_timeout()));
        let report = builder.build()?;
        tracing::debug!(?report, "Build finished");

        output.success(&format!(
            "Built {} pages ({} images) to {}",
            report.pages,
            report.images,
            config.docs_resolved.output_dir.display()
        ));
        if report.orphans_removed > 0 {
            output.warning(&format!(
                "Removed {} unreferenced images",
                report.orphans_removed
            ));
        }
        Ok(())
    }
}
