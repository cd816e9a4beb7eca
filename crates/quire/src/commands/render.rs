//! `quire render` command implementation.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use quire_cache::CacheBucketExt;
use quire_config::{CliSettings, Config, LanguageConfig, LineBreakMode};
use sha2::{Digest, Sha256};

use super::VERSION;
use crate::error::CliError;
use crate::output::{Output, format_file_size};

/// Cache bucket holding rendered HTML.
pub(crate) const HTML_BUCKET: &str = "html";

/// `--line-breaks` values.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LineBreaksArg {
    /// Convert newlines in running text only.
    OutsideBlocks,
    /// Convert every newline.
    All,
}

impl From<LineBreaksArg> for LineBreakMode {
    fn from(arg: LineBreaksArg) -> Self {
        match arg {
            LineBreaksArg::OutsideBlocks => Self::OutsideBlocks,
            LineBreaksArg::All => Self::All,
        }
    }
}

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render (default: stdin).
    input: Option<PathBuf>,

    /// Write HTML to this file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Newline handling (overrides config).
    #[arg(long, value_enum)]
    line_breaks: Option<LineBreaksArg>,

    /// Language for code fences without a tag (overrides config).
    #[arg(long)]
    default_language: Option<String>,

    /// HTML-escape code before highlighting.
    #[arg(long)]
    escape_code: bool,

    /// Disable the render cache.
    #[arg(long)]
    no_cache: bool,

    /// Cache directory (overrides config).
    #[arg(long, conflicts_with = "no_cache")]
    cache_dir: Option<PathBuf>,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading the input or writing the
    /// output fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;

        let markdown = super::read_input(self.input.as_deref())?;
        let key = RenderKey::new(&config, &markdown).compute_hash();

        let cache = super::open_cache(&config);
        let bucket = cache.bucket(HTML_BUCKET);

        let html = if let Some(html) = bucket.get_string(&key, VERSION) {
            tracing::info!(key = %key, "Using cached render");
            html
        } else {
            let renderer = super::renderer(&config)?;
            let html = renderer.render(&markdown);
            if !bucket.set_string(&key, VERSION, &html) {
                tracing::debug!(key = %key, "Rendered HTML was not cached");
            }
            html
        };

        super::write_output(self.output.as_deref(), &html)?;

        if let Some(path) = &self.output {
            output.success(&format!(
                "Wrote {} ({})",
                path.display(),
                format_file_size(html.len() as u64)
            ));
        }
        Ok(())
    }

    /// Overrides taken from command-line flags.
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            line_breaks: self.line_breaks.map(Into::into),
            default_language: self.default_language.clone(),
            escape_code: self.escape_code.then_some(true),
            cache_enabled: self.no_cache.then_some(false),
            cache_dir: self.cache_dir.clone(),
        }
    }
}

/// Everything that affects rendered output, hashed into a cache key.
#[derive(Debug)]
struct RenderKey<'a> {
    source: &'a str,
    line_breaks: LineBreakMode,
    default_language: &'a str,
    escape_code: bool,
    languages: &'a [LanguageConfig],
}

impl<'a> RenderKey<'a> {
    fn new(config: &'a Config, source: &'a str) -> Self {
        Self {
            source,
            line_breaks: config.render.line_breaks,
            default_language: &config.render.default_language,
            escape_code: config.render.escape_code,
            languages: &config.languages,
        }
    }

    /// SHA-256 over the options, each configured language and the source.
    fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(
            format!(
                "{}:{}:{}\n",
                self.line_breaks.as_str(),
                self.default_language,
                self.escape_code
            )
            .as_bytes(),
        );
        for language in self.languages {
            hasher.update(
                format!(
                    "{}:{}:{}:{}\n",
                    language.name,
                    language.aliases.join(","),
                    language.keywords.join(","),
                    language.comments
                )
                .as_bytes(),
            );
        }
        hasher.update(self.source.as_bytes());
        hex::encode(hasher.finalize())
    }
}
