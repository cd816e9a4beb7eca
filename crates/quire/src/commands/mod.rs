//! CLI command implementations.

pub(crate) mod cache;
pub(crate) mod highlight;
pub(crate) mod languages;
pub(crate) mod render;

pub(crate) use cache::CacheCommand;
pub(crate) use highlight::HighlightArgs;
pub(crate) use languages::LanguagesArgs;
pub(crate) use render::RenderArgs;

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use quire_cache::{Cache, FileCache, NullCache};
use quire_config::{Config, LineBreakMode};
use quire_highlight::{Highlighter, LanguageProfile, ProfileTable};
use quire_renderer::{LineBreaks, MarkdownRenderer, RenderOptions};

use crate::error::CliError;

/// Application version from Cargo.toml, used as the cache version.
pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Built-in profiles extended with the `[[languages]]` entries of `config`.
///
/// A configured language replaces a built-in one of the same name.
pub(crate) fn profile_table(config: &Config) -> Result<Arc<ProfileTable>, CliError> {
    if config.languages.is_empty() {
        return Ok(ProfileTable::builtin());
    }

    let mut table = ProfileTable::default();
    for language in &config.languages {
        let profile =
            LanguageProfile::new(&language.name, language.keywords.iter().cloned(), language.comments)?
                .with_aliases(&language.aliases);
        tracing::debug!(language = profile.name(), "Registered configured language");
        table.insert(profile);
    }
    Ok(Arc::new(table))
}

/// Highlighter configured from `[render]` and `[[languages]]`.
pub(crate) fn highlighter(config: &Config) -> Result<Highlighter, CliError> {
    Ok(Highlighter::new(profile_table(config)?).with_html_escaping(config.render.escape_code))
}

/// Markdown renderer configured from `config`.
pub(crate) fn renderer(config: &Config) -> Result<MarkdownRenderer, CliError> {
    let options = RenderOptions {
        line_breaks: match config.render.line_breaks {
            LineBreakMode::OutsideBlocks => LineBreaks::OutsideBlocks,
            LineBreakMode::All => LineBreaks::All,
        },
        default_language: config.render.default_language.clone(),
    };
    Ok(MarkdownRenderer::new()
        .with_highlighter(highlighter(config)?)
        .with_options(options))
}

/// Cache rooted at the configured directory, or a no-op cache when disabled
/// or when the directory was refused.
pub(crate) fn open_cache(config: &Config) -> Box<dyn Cache> {
    if !config.cache_resolved.enabled {
        return Box::new(NullCache);
    }
    let cache = FileCache::new(config.cache_resolved.dir.clone(), VERSION);
    if cache.is_active() {
        Box::new(cache)
    } else {
        Box::new(NullCache)
    }
}

/// Read the whole input file, or stdin when no path (or `-`) is given.
pub(crate) fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut buf = String::new();
            std::io::stdin().lock().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Write `content` to the output file, or stdout when no path is given.
pub(crate) fn write_output(path: Option<&Path>, content: &str) -> Result<(), CliError> {
    if let Some(path) = path {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        if !content.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        stdout.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quire_config::{CacheConfig, LanguageConfig};
    use tempfile::TempDir;

    use super::*;

    fn rust_language() -> LanguageConfig {
        LanguageConfig {
            name: "rust".to_owned(),
            aliases: vec!["rs".to_owned()],
            keywords: vec!["fn".to_owned(), "let".to_owned()],
            comments: true,
        }
    }

    #[test]
    fn test_profile_table_without_languages_is_builtin() {
        let config = Config::default();
        let table = profile_table(&config).unwrap();
        assert!(Arc::ptr_eq(&table, &ProfileTable::builtin()));
    }

    #[test]
    fn test_profile_table_adds_configured_language() {
        let mut config = Config::default();
        config.languages.push(rust_language());

        let table = profile_table(&config).unwrap();
        let rust = table.get("rs").unwrap();
        assert_eq!(rust.name(), "rust");
        assert!(rust.supports_comments());
        assert!(table.get("javascript").is_some());
    }

    #[test]
    fn test_profile_table_rejects_invalid_keyword() {
        let mut config = Config::default();
        let mut language = rust_language();
        language.keywords.push("not a word".to_owned());
        config.languages.push(language);

        assert!(matches!(profile_table(&config), Err(CliError::Profile(_))));
    }

    #[test]
    fn test_renderer_uses_config() {
        let mut config = Config::default();
        config.languages.push(rust_language());
        config.render.line_breaks = LineBreakMode::All;
        config.render.default_language = "rust".to_owned();

        let renderer = renderer(&config).unwrap();
        assert_eq!(renderer.options().line_breaks, LineBreaks::All);
        assert_eq!(
            renderer.render("```\nfn\n```"),
            concat!(
                r#"<pre class="code-block"><code class="language-rust">"#,
                r#"<span class="keyword">fn</span><br></code></pre>"#
            )
        );
    }

    #[test]
    fn test_highlighter_escapes_when_configured() {
        let mut config = Config::default();
        config.render.escape_code = true;

        let highlighter = highlighter(&config).unwrap();
        assert_eq!(highlighter.highlight("a < b", "text"), "a &lt; b");
    }

    #[test]
    fn test_open_cache_leaves_project_directory_alone() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("notes.md"), "# Notes").unwrap();

        let mut config = Config::default();
        config.cache_resolved = CacheConfig {
            enabled: true,
            dir: tmp.path().to_path_buf(),
        };

        let bucket = open_cache(&config).bucket("html");
        assert!(!bucket.set("page", "etag", b"<p>x</p>"));
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("notes.md")).unwrap(),
            "# Notes"
        );
        assert!(!tmp.path().join("html").exists());
    }

    #[test]
    fn test_open_cache_uses_fresh_directory() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache_resolved = CacheConfig {
            enabled: true,
            dir: tmp.path().join("cache"),
        };

        let bucket = open_cache(&config).bucket("html");
        assert!(bucket.set("page", "etag", b"<p>x</p>"));
        assert_eq!(bucket.get("page", "etag"), Some(b"<p>x</p>".to_vec()));
    }

    #[test]
    fn test_write_and_read_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/page.html");

        write_output(Some(&path), "<h1>A</h1>").unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), "<h1>A</h1>");
    }

    #[test]
    fn test_read_missing_input() {
        let tmp = TempDir::new().unwrap();
        let err = read_input(Some(&tmp.path().join("missing.md"))).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
