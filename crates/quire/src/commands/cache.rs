//! `quire cache` command implementation.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use quire_cache::{Cache, FileCache};
use quire_config::{CliSettings, Config};

use super::VERSION;
use super::render::HTML_BUCKET;
use crate::error::CliError;
use crate::output::Output;

/// Render cache commands.
#[derive(Subcommand)]
pub(crate) enum CacheCommand {
    /// Remove all cached render output.
    Clear(ClearArgs),
}

impl CacheCommand {
    /// Execute the cache subcommand.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Clear(args) => args.execute(),
        }
    }
}

/// Arguments for the cache clear command.
#[derive(Args)]
pub(crate) struct ClearArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cache directory (overrides config).
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

impl ClearArgs {
    fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let cli_settings = CliSettings {
            cache_dir: self.cache_dir,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        if !config.cache_resolved.enabled {
            output.info("Cache: disabled");
            return Ok(());
        }

        let dir = &config.cache_resolved.dir;
        let cache = FileCache::new(dir.clone(), VERSION);
        if !cache.is_active() {
            return Err(CliError::Cache(format!(
                "{} is not a Quire cache directory",
                dir.display()
            )));
        }
        if !cache.bucket(HTML_BUCKET).clear() {
            return Err(CliError::Cache(format!(
                "Failed to clear cache at {}",
                dir.display()
            )));
        }

        output.success(&format!("Cleared cache at {}", dir.display()));
        Ok(())
    }
}
