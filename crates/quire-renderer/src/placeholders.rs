//! Opaque placeholders for rendered fragments that later stages must not touch.
//!
//! A stage that emits finished HTML (fenced code blocks) stores it here and
//! leaves a short token in the document instead. Tokens are delimited by two
//! private-use code points, which input text is never allowed to contain (see
//! [`Placeholders::sanitize`]). All tokens are swapped back in one pass by
//! [`Placeholders::restore`].

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}([0-9]+)\u{E001}").unwrap());

/// Regex source matching a single placeholder token.
pub(crate) const TOKEN_SOURCE: &str = "\u{E000}[0-9]+\u{E001}";

/// Protected HTML fragments, addressed by token.
#[derive(Debug, Default)]
pub(crate) struct Placeholders {
    items: Vec<String>,
}

impl Placeholders {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Replace placeholder delimiters in author text with U+FFFD.
    pub(crate) fn sanitize(text: &str) -> Cow<'_, str> {
        if text.contains([OPEN, CLOSE]) {
            Cow::Owned(text.replace([OPEN, CLOSE], "\u{FFFD}"))
        } else {
            Cow::Borrowed(text)
        }
    }

    /// Store `html` and return the token that stands in for it.
    pub(crate) fn protect(&mut self, html: String) -> String {
        let token = format!("{OPEN}{}{CLOSE}", self.items.len());
        self.items.push(html);
        token
    }

    /// Substitute every known token in `text` with its stored fragment.
    ///
    /// Unknown tokens are left as they are.
    pub(crate) fn restore(&self, text: &str) -> String {
        if self.items.is_empty() {
            return text.to_owned();
        }
        TOKEN_PATTERN
            .replace_all(text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.items.get(index))
                    .map_or_else(|| caps[0].to_owned(), Clone::clone)
            })
            .into_owned()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}
