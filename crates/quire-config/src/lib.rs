//! Configuration management for Quire.
//!
//! Parses `quire.toml` files with serde and discovers them in the current
//! directory or its parents. CLI flags are layered on top through
//! [`CliSettings`].
//!
//! ```toml
//! [render]
//! line_breaks = "outside-blocks"
//! default_language = "text"
//! escape_code = false
//!
//! [cache]
//! enabled = true
//! dir = ".quire/cache"
//!
//! [[languages]]
//! name = "rust"
//! aliases = ["rs"]
//! keywords = ["fn", "let", "mut", "impl"]
//! comments = true
//! ```
//!
//! ## Environment Variable Expansion
//!
//! `cache.dir` supports `${VAR}` (error if unset) and `${VAR:-default}`.

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "quire.toml";

/// Default cache directory, relative to the config file.
const DEFAULT_CACHE_DIR: &str = ".quire/cache";

/// CLI settings that override configuration file values.
///
/// Only `Some` values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override newline handling.
    pub line_breaks: Option<LineBreakMode>,
    /// Override the language of untagged code fences.
    pub default_language: Option<String>,
    /// Override HTML escaping of code.
    pub escape_code: Option<bool>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override cache directory.
    pub cache_dir: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Rendering options.
    pub render: RenderConfig,
    /// Cache section as written in TOML.
    cache: CacheConfigRaw,
    /// Additional language profiles.
    pub languages: Vec<LanguageConfig>,

    /// Resolved cache configuration (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Newline handling mode as written in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineBreakMode {
    /// Convert newlines in running text only.
    #[default]
    OutsideBlocks,
    /// Convert every newline.
    All,
}

impl LineBreakMode {
    /// Kebab-case name, as accepted in `quire.toml`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OutsideBlocks => "outside-blocks",
            Self::All => "all",
        }
    }
}

/// `[render]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Newline handling of the final render stage.
    pub line_breaks: LineBreakMode,
    /// Language for code fences without a tag.
    pub default_language: String,
    /// Escape `<`, `>`, `&` and quotes in highlighted code.
    pub escape_code: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            line_breaks: LineBreakMode::default(),
            default_language: "text".to_owned(),
            escape_code: false,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct CacheConfigRaw {
    enabled: Option<bool>,
    dir: Option<String>,
}

/// Resolved cache configuration with an absolute directory.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Whether rendered output is cached.
    pub enabled: bool,
    /// Cache root directory.
    pub dir: PathBuf,
}

/// One `[[languages]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageConfig {
    /// Canonical name used in fence tags.
    pub name: String,
    /// Alternative fence tags.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Words highlighted as keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Whether `//` and `/* */` comments are highlighted.
    #[serde(default)]
    pub comments: bool,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`cache.dir`").
        field: String,
        /// Error message (e.g., "${`QUIRE_CACHE`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a language identifier usable as a code fence tag.
fn require_language_id(value: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(value, field)?;
    let valid = value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '+' | '#' | '.' | '-'));
    if !valid {
        return Err(ConfigError::Validation(format!(
            "{field} may only contain letters, digits and _ + # . -"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `quire.toml` in the current directory and its parents, falling back
    /// to defaults rooted at the current directory.
    ///
    /// CLI settings are applied last and take precedence over file values.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, the file
    /// cannot be read or parsed, or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            tracing::debug!(path = %discovered.display(), "Discovered config file");
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(line_breaks) = settings.line_breaks {
            self.render.line_breaks = line_breaks;
        }
        if let Some(language) = &settings.default_language {
            self.render.default_language.clone_from(language);
        }
        if let Some(escape_code) = settings.escape_code {
            self.render.escape_code = escape_code;
        }
        if let Some(enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = enabled;
        }
        if let Some(dir) = &settings.cache_dir {
            self.cache_resolved.dir.clone_from(dir);
        }
    }

    /// Search for the config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILENAME))
            .find(|candidate| candidate.is_file())
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to `base`.
    fn default_with_base(base: &Path) -> Self {
        Self {
            render: RenderConfig::default(),
            cache: CacheConfigRaw::default(),
            languages: Vec::new(),
            cache_resolved: CacheConfig {
                enabled: true,
                dir: base.join(DEFAULT_CACHE_DIR),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for a default language that is empty
    /// or not a valid fence tag, a language entry with an empty name, or an
    /// empty keyword.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_language_id(&self.render.default_language, "render.default_language")?;

        for (index, language) in self.languages.iter().enumerate() {
            require_non_empty(&language.name, &format!("languages[{index}].name"))?;
            for keyword in &language.keywords {
                require_non_empty(keyword, &format!("languages[{index}].keywords"))?;
            }
            for alias in &language.aliases {
                require_non_empty(alias, &format!("languages[{index}].aliases"))?;
            }
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(dir) = &self.cache.dir {
            self.cache.dir = Some(expand::expand_env(dir, "cache.dir")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.cache_resolved = CacheConfig {
            enabled: self.cache.enabled.unwrap_or(true),
            dir: config_dir.join(self.cache.dir.as_deref().unwrap_or(DEFAULT_CACHE_DIR)),
        };
    }
}
