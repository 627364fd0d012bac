//! `folio serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use folio_build::{BuildConfig, BuildMode, SiteBuilder};
use folio_config::{CliSettings, Config};
use folio_images::UreqFetcher;
use folio_server::{PreviewConfig, run_preview};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory for the generated site (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long, env = "FOLIO_HOST")]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long, env = "FOLIO_PORT")]
    port: Option<u16>,

    /// Enable live reload (default: enabled).
    #[arg(long)]
    live_reload: Option<bool>,

    /// Disable live reload.
    #[arg(long, conflicts_with = "live_reload")]
    no_live_reload: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the initial build fails or
    /// the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let live_reload_enabled = self.resolve_live_reload_enabled();
        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            live_reload_enabled,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let preview = PreviewConfig::from_config(&config);

        output.highlight(&format!("Serving on {}", preview.base_url()));
        output.info(&format!(
            "Source directory: {}",
            preview.source_dir.display()
        ));
        output.info(&format!(
            "Output directory: {}",
            preview.output_dir.display()
        ));
        if preview.live_reload {
            output.info("Live reload: enabled");
        } else {
            output.info("Live reload: disabled");
        }

        let mode = BuildMode::Preview {
            base_url: preview.base_url(),
            live_reload: preview.live_reload,
        };
        let builder = SiteBuilder::new(BuildConfig::from_config(&config), mode)
            .with_fetcher(UreqFetcher::new(config.images.fetch_timeout()));

        run_preview(preview, builder).await?;
        Ok(())
    }

    /// Resolve `live_reload_enabled` from --live-reload/--no-live-reload flags.
    fn resolve_live_reload_enabled(&self) -> Option<bool> {
        self.no_live_reload.then_some(false).or(self.live_reload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ServeArgs,
    }

    fn parse(args: &[&str]) -> ServeArgs {
        Harness::try_parse_from(std::iter::once("serve").chain(args.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_live_reload_flags() {
        assert_eq!(parse(&[]).resolve_live_reload_enabled(), None);
        assert_eq!(
            parse(&["--no-live-reload"]).resolve_live_reload_enabled(),
            Some(false)
        );
        assert_eq!(
            parse(&["--live-reload", "true"]).resolve_live_reload_enabled(),
            Some(true)
        );
    }

    #[test]
    fn test_conflicting_live_reload_flags() {
        let result = Harness::try_parse_from([
            "serve",
            "--live-reload",
            "true",
            "--no-live-reload",
        ]);
        assert!(result.is_err());
    }
}
