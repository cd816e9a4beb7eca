//! `quire highlight` command implementation.

use std::path::PathBuf;

use clap::Args;
use quire_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the highlight command.
#[derive(Args)]
pub(crate) struct HighlightArgs {
    /// Source file to highlight (default: stdin).
    input: Option<PathBuf>,

    /// Language name or alias (unknown names use the default profile).
    #[arg(short, long)]
    language: String,

    /// Write HTML to this file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTML-escape code before highlighting.
    #[arg(long)]
    escape_code: bool,
}

impl HighlightArgs {
    /// Execute the highlight command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading the input or writing the
    /// output fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            escape_code: self.escape_code.then_some(true),
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let highlighter = super::highlighter(&config)?;

        if highlighter.table().get(&self.language).is_none() {
            output.warning(&format!(
                "Unknown language '{}', using '{}'",
                self.language,
                highlighter.table().default_profile().name()
            ));
        }

        let source = super::read_input(self.input.as_deref())?;
        let html = highlighter.highlight(&source, &self.language);
        super::write_output(self.output.as_deref(), &html)?;

        if let Some(path) = &self.output {
            output.success(&format!("Wrote {}", path.display()));
        }
        Ok(())
    }
}
