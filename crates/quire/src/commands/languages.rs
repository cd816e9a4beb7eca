//! `quire languages` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use quire_config::Config;
use quire_highlight::{LanguageProfile, ProfileTable};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the languages command.
#[derive(Args)]
pub(crate) struct LanguagesArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl LanguagesArgs {
    /// Execute the languages command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or stdout is closed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let table = super::profile_table(&config)?;

        output.highlight(&format!("{} languages", table.len()));

        let mut stdout = std::io::stdout().lock();
        for line in describe(&table) {
            writeln!(stdout, "{line}")?;
        }
        Ok(())
    }
}

/// One line per profile, default first.
fn describe(table: &ProfileTable) -> Vec<String> {
    let default = table.default_profile().name();
    table
        .iter()
        .map(|profile| describe_profile(profile, profile.name() == default))
        .collect()
}

fn describe_profile(profile: &LanguageProfile, is_default: bool) -> String {
    let mut line = profile.name().to_owned();
    if !profile.aliases().is_empty() {
        line.push_str(&format!(" ({})", profile.aliases().join(", ")));
    }
    line.push_str(&format!(" - {} keywords", profile.keywords().len()));
    if profile.supports_comments() {
        line.push_str(", comments");
    }
    if is_default {
        line.push_str(" [default]");
    }
    line
}
