//! Pattern-based highlighting passes.
//!
//! Highlighting runs four passes in a fixed order: keywords, strings, numbers,
//! comments. Every pass matches against the plain source text, so markup
//! emitted by one pass is never re-read by the next. Matches become spans over
//! source byte ranges; a later span may enclose earlier ones (a string literal
//! containing a keyword keeps the keyword span inside the string span), while
//! a match that would partially overlap an accepted span is dropped so the
//! result always nests.

use std::ops::Range;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::html::push_escaped;
use crate::profile::{LanguageProfile, ProfileTable};

/// Quoted literal with `"`, `'` or `` ` `` delimiters and backslash escapes.
static STRING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'|`(?:\\.|[^`\\])*`"#).unwrap()
});

/// Digit run with at most one decimal point.
static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+\.?\d*\b").unwrap());

/// `//` up to the end of the line.
static LINE_COMMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?R)//.*").unwrap());

/// `/* ... */`, shortest match, may span lines.
static BLOCK_COMMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

static DEFAULT_HIGHLIGHTER: LazyLock<Highlighter> = LazyLock::new(Highlighter::default);

/// Highlight `source` using the built-in language table.
///
/// Unknown languages fall back to the default (`text`) profile.
///
/// # Example
///
/// ```
/// let html = quire_highlight::highlight("const x = 1;", "js");
/// assert_eq!(
///     html,
///     r#"<span class="keyword">const</span> x = <span class="number">1</span>;"#
/// );
/// ```
#[must_use]
pub fn highlight(source: &str, language: &str) -> String {
    DEFAULT_HIGHLIGHTER.highlight(source, language)
}

/// One highlighting pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HighlightPass {
    /// Whole-word keywords of the resolved profile.
    Keywords,
    /// Quoted string literals.
    Strings,
    /// Integer and decimal numbers.
    Numbers,
    /// Line and block comments (only for profiles that support comments).
    Comments,
}

impl HighlightPass {
    /// All passes in the order they run.
    pub const ORDER: [Self; 4] = [Self::Keywords, Self::Strings, Self::Numbers, Self::Comments];

    /// CSS class of the wrapping span.
    #[must_use]
    pub fn class(self) -> &'static str {
        match self {
            Self::Keywords => "keyword",
            Self::Strings => "string",
            Self::Numbers => "number",
            Self::Comments => "comment",
        }
    }

    fn patterns(self, profile: &LanguageProfile) -> Vec<&Regex> {
        match self {
            Self::Keywords => profile.keyword_pattern().into_iter().collect(),
            Self::Strings => vec![&*STRING_PATTERN],
            Self::Numbers => vec![&*NUMBER_PATTERN],
            Self::Comments if profile.supports_comments() => {
                vec![&*LINE_COMMENT_PATTERN, &*BLOCK_COMMENT_PATTERN]
            }
            Self::Comments => Vec::new(),
        }
    }
}

/// Add every match of `re` that does not cross an accepted span.
///
/// A rejected match does not end the scan: matching resumes after the span it
/// started inside (so `//` within a string literal cannot hide a real comment
/// later on the line), or one character further otherwise.
fn collect_spans(re: &Regex, source: &str, pass: HighlightPass, spans: &mut Vec<Span>) {
    let mut pos = 0;
    while pos <= source.len() {
        let Some(m) = re.find_at(source, pos) else {
            break;
        };
        let span = Span {
            range: m.range(),
            pass,
        };
        let crossed = spans
            .iter()
            .find(|accepted| span.crosses(accepted))
            .map(|accepted| accepted.range.clone());
        pos = match crossed {
            Some(crossed) if crossed.contains(&span.range.start) => crossed.end,
            Some(_) => next_char(source, span.range.start),
            None if span.range.is_empty() => next_char(source, span.range.end),
            None => {
                let end = span.range.end;
                spans.push(span);
                end
            }
        };
    }
}

/// Byte offset just past the character at `at`.
fn next_char(source: &str, at: usize) -> usize {
    at + source[at..].chars().next().map_or(1, char::len_utf8)
}

#[derive(Debug, Clone)]
struct Span {
    range: Range<usize>,
    pass: HighlightPass,
}

impl Span {
    /// True when the two spans overlap without one containing the other.
    fn crosses(&self, other: &Span) -> bool {
        let (a, b) = (&self.range, &other.range);
        (a.start < b.start && b.start < a.end && a.end < b.end)
            || (b.start < a.start && a.start < b.end && b.end < a.end)
    }
}

/// Syntax highlighter over a [`ProfileTable`].
///
/// Cheap to clone; the table is shared.
#[derive(Debug, Clone)]
pub struct Highlighter {
    table: Arc<ProfileTable>,
    escape_html: bool,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(ProfileTable::builtin())
    }
}

impl Highlighter {
    /// Create a highlighter over the given table.
    #[must_use]
    pub fn new(table: Arc<ProfileTable>) -> Self {
        Self {
            table,
            escape_html: false,
        }
    }

    /// HTML-escape source text between spans.
    ///
    /// Off by default, in which case text without any highlightable token is
    /// returned exactly as given.
    #[must_use]
    pub fn with_html_escaping(mut self, enabled: bool) -> Self {
        self.escape_html = enabled;
        self
    }

    /// Language table used for lookups.
    pub fn table(&self) -> &ProfileTable {
        &self.table
    }

    /// Highlight `source` as `language`.
    #[must_use]
    pub fn highlight(&self, source: &str, language: &str) -> String {
        if source.is_empty() {
            return String::new();
        }

        let profile = self.table.resolve(language);
        let mut spans: Vec<Span> = Vec::new();
        for pass in HighlightPass::ORDER {
            for re in pass.patterns(profile) {
                collect_spans(re, source, pass, &mut spans);
            }
        }

        self.assemble(source, spans)
    }

    /// Emit source text with nested `<span>` markup.
    fn assemble(&self, source: &str, mut spans: Vec<Span>) -> String {
        // Outer spans first: earliest start, then longest, then the later pass.
        spans.sort_by(|a, b| {
            a.range
                .start
                .cmp(&b.range.start)
                .then(b.range.end.cmp(&a.range.end))
                .then(b.pass.cmp(&a.pass))
        });

        let mut out = String::with_capacity(source.len() + spans.len() * 32);
        let mut cursor = 0;
        let mut open: Vec<usize> = Vec::new();

        for span in &spans {
            while let Some(&end) = open.last() {
                if end > span.range.start {
                    break;
                }
                self.push_text(&mut out, &source[cursor..end]);
                out.push_str("</span>");
                cursor = end;
                open.pop();
            }
            self.push_text(&mut out, &source[cursor..span.range.start]);
            cursor = span.range.start;
            out.push_str("<span class=\"");
            out.push_str(span.pass.class());
            out.push_str("\">");
            open.push(span.range.end);
        }

        while let Some(end) = open.pop() {
            self.push_text(&mut out, &source[cursor..end]);
            out.push_str("</span>");
            cursor = end;
        }
        self.push_text(&mut out, &source[cursor..]);

        out
    }

    fn push_text(&self, out: &mut String, text: &str) {
        if self.escape_html {
            push_escaped(out, text);
        } else {
            out.push_str(text);
        }
    }
}
