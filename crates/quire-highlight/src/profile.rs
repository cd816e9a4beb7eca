//! Language profiles for syntax highlighting.
//!
//! A [`LanguageProfile`] pairs a language identifier with the keywords that get
//! marked and a flag saying whether C-style comments are recognized. Profiles
//! live in a [`ProfileTable`]; lookups are case-insensitive and a miss resolves
//! to the table's default profile.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;

/// Identifier of the built-in default profile.
pub const DEFAULT_LANGUAGE: &str = "text";

const SCRIPT_KEYWORDS: &[&str] = &[
    "function", "const", "let", "var", "if", "else", "for", "while", "return", "class", "import",
    "export", "default", "async", "await", "try", "catch",
];

const TYPED_KEYWORDS: &[&str] = &[
    "interface",
    "type",
    "as",
    "enum",
    "declare",
    "namespace",
    "module",
];

const MARKUP_KEYWORDS: &[&str] = &[
    "div", "span", "p", "a", "img", "script", "style", "link", "meta",
];

const STYLE_KEYWORDS: &[&str] = &[
    "color",
    "background",
    "font",
    "padding",
    "margin",
    "border",
    "display",
];

static BUILTIN: LazyLock<Arc<ProfileTable>> = LazyLock::new(|| Arc::new(builtin_table()));

/// Error building a user-defined language profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Profile name is empty or whitespace.
    #[error("language name cannot be empty")]
    EmptyName,
    /// A keyword is empty or whitespace.
    #[error("language {language}: keyword cannot be empty")]
    EmptyKeyword {
        /// Profile the keyword belongs to.
        language: String,
    },
    /// A keyword contains characters that cannot form a whole word.
    #[error("language {language}: keyword {keyword:?} must consist of letters, digits or '_'")]
    InvalidKeyword {
        /// Profile the keyword belongs to.
        language: String,
        /// Offending keyword.
        keyword: String,
    },
    /// The combined keyword pattern exceeded the regex engine limits.
    #[error("language {language}: keyword pattern failed to compile: {source}")]
    Pattern {
        /// Profile the pattern was built for.
        language: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
}

/// Keyword set and comment support for one language.
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    name: String,
    aliases: Vec<String>,
    keywords: Vec<String>,
    comments: bool,
    /// Whole-word matcher over all keywords, `None` when there are none.
    keyword_pattern: Option<Regex>,
}

impl LanguageProfile {
    /// Build a profile, compiling its whole-word keyword matcher.
    ///
    /// The name is stored lowercase. Duplicate keywords are dropped, keeping the
    /// first occurrence. Keywords are escaped before compilation, so they are
    /// always matched literally.
    pub fn new<I>(name: &str, keywords: I, comments: bool) -> Result<Self, ProfileError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let name = normalize(name);
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }

        let mut unique: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword: String = keyword.into();
            let keyword = keyword.trim();
            if keyword.is_empty() {
                return Err(ProfileError::EmptyKeyword { language: name });
            }
            if !keyword.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(ProfileError::InvalidKeyword {
                    language: name,
                    keyword: keyword.to_owned(),
                });
            }
            if !unique.iter().any(|k| k == keyword) {
                unique.push(keyword.to_owned());
            }
        }

        let keyword_pattern = if unique.is_empty() {
            None
        } else {
            let alternation = unique
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = Regex::new(&format!(r"\b(?:{alternation})\b")).map_err(|source| {
                ProfileError::Pattern {
                    language: name.clone(),
                    source,
                }
            })?;
            Some(pattern)
        };

        Ok(Self {
            name,
            aliases: Vec::new(),
            keywords: unique,
            comments,
            keyword_pattern,
        })
    }

    /// Add alternative identifiers (e.g. `js` for `javascript`).
    #[must_use]
    pub fn with_aliases<I>(mut self, aliases: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.aliases.extend(
            aliases
                .into_iter()
                .map(|a| normalize(a.as_ref()))
                .filter(|a| !a.is_empty() && *a != self.name),
        );
        self
    }

    /// Canonical lowercase identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternative identifiers.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Keywords in declaration order.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Whether `//` line comments and `/* */` block comments are marked.
    pub fn supports_comments(&self) -> bool {
        self.comments
    }

    pub(crate) fn keyword_pattern(&self) -> Option<&Regex> {
        self.keyword_pattern.as_ref()
    }

    fn identifiers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Immutable lookup table of language profiles with a designated default.
///
/// # Example
///
/// ```
/// use quire_highlight::ProfileTable;
///
/// let table = ProfileTable::builtin();
/// assert_eq!(table.resolve("JS").name(), "javascript");
/// assert_eq!(table.resolve("cobol").name(), "text");
/// ```
#[derive(Debug, Clone)]
pub struct ProfileTable {
    profiles: Vec<LanguageProfile>,
    lookup: HashMap<String, usize>,
    default: usize,
}

impl ProfileTable {
    /// Create a table holding only the given default profile.
    #[must_use]
    pub fn new(default: LanguageProfile) -> Self {
        let mut table = Self {
            profiles: vec![default],
            lookup: HashMap::new(),
            default: 0,
        };
        table.reindex();
        table
    }

    /// Shared handle to the built-in table.
    ///
    /// The table is built on first use and never mutated afterwards.
    #[must_use]
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN)
    }

    /// Add a profile, replacing any existing profile with the same name.
    ///
    /// Identifiers of the new profile take precedence over aliases of
    /// previously registered profiles.
    pub fn insert(&mut self, profile: LanguageProfile) {
        match self.profiles.iter().position(|p| p.name == profile.name) {
            Some(index) => self.profiles[index] = profile,
            None => self.profiles.push(profile),
        }
        self.reindex();
    }

    /// Builder-style variant of [`insert`](Self::insert).
    #[must_use]
    pub fn with_profile(mut self, profile: LanguageProfile) -> Self {
        self.insert(profile);
        self
    }

    /// Look up a profile by name or alias, case-insensitively.
    pub fn get(&self, language: &str) -> Option<&LanguageProfile> {
        self.lookup
            .get(&normalize(language))
            .map(|&index| &self.profiles[index])
    }

    /// Look up a profile, falling back to the default profile on a miss.
    pub fn resolve(&self, language: &str) -> &LanguageProfile {
        if let Some(profile) = self.get(language) {
            return profile;
        }
        if !language.trim().is_empty() {
            tracing::debug!(language, "Unknown language, using default profile");
        }
        self.default_profile()
    }

    /// The profile used for unknown identifiers.
    pub fn default_profile(&self) -> &LanguageProfile {
        &self.profiles[self.default]
    }

    /// Iterate over profiles in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &LanguageProfile> {
        self.profiles.iter()
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Always false: a table holds at least its default profile.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    fn reindex(&mut self) {
        self.lookup.clear();
        for (index, profile) in self.profiles.iter().enumerate() {
            for id in profile.identifiers() {
                self.lookup.insert(id.to_owned(), index);
            }
        }
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        builtin_table()
    }
}

fn normalize(language: &str) -> String {
    language.trim().to_lowercase()
}

fn builtin_profile(name: &str, keywords: &[&[&str]], comments: bool) -> LanguageProfile {
    LanguageProfile::new(name, keywords.concat(), comments)
        .expect("built-in language profiles are valid")
}

fn builtin_table() -> ProfileTable {
    ProfileTable::new(builtin_profile(DEFAULT_LANGUAGE, &[SCRIPT_KEYWORDS], false))
        .with_profile(
            builtin_profile("javascript", &[SCRIPT_KEYWORDS], true)
                .with_aliases(["js", "mjs", "cjs", "jsx"]),
        )
        .with_profile(
            builtin_profile("typescript", &[SCRIPT_KEYWORDS, TYPED_KEYWORDS], true)
                .with_aliases(["ts", "tsx"]),
        )
        .with_profile(builtin_profile("html", &[MARKUP_KEYWORDS], false).with_aliases(["htm", "xml"]))
        .with_profile(builtin_profile("css", &[STYLE_KEYWORDS], false))
}
