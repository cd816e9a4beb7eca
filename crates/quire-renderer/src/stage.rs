//! Named substitution stages of the rendering pipeline.
//!
//! Each stage rewrites the whole document produced by the previous stage.
//! Stages are plain regular-expression substitutions, not a parser: the order
//! in [`Stage::PIPELINE`] is what keeps them from stepping on each other.

use std::sync::LazyLock;

use quire_highlight::{Highlighter, escape_html};
use regex::{Captures, Regex};

use crate::placeholders::{Placeholders, TOKEN_SOURCE};
use crate::renderer::{LineBreaks, RenderOptions};

static FENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?msR)^```([\w+#.-]*)[ \t]*\r?\n(.*?)^```[ \t]*$").unwrap()
});

static H3_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?mR)^### (.*)$").unwrap());
static H2_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?mR)^## (.*)$").unwrap());
static H1_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?mR)^# (.*)$").unwrap());

// Opening marker must be followed by a non-blank; spans stay on one line.
static STRONG_EM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\*([^*\s][^*\r\n]*)\*\*\*").unwrap());
static STRONG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\s][^*\r\n]*)\*\*").unwrap());
static EM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s][^*\r\n]*)\*").unwrap());

static INLINE_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\r\n]+)`").unwrap());

static IMAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]\r\n]*)\]\(([^)\r\n]+)\)").unwrap());

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\r\n]+)\]\(([^)\r\n]+)\)").unwrap());

static LIST_ITEM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mR)^[*-] (.+)$").unwrap());

static LIST_RUN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mR)^<li>.*</li>$(?:\r?\n<li>.*</li>$)*").unwrap());

static NEWLINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n").unwrap());

/// Block-level markup emitted by earlier stages.
static BLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"<h[1-3]>.*?</h[1-3]>|<ul>(?s:.*?)</ul>|{TOKEN_SOURCE}"
    ))
    .unwrap()
});

/// One substitution stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Fenced code blocks, highlighted and protected from later stages.
    FencedCode,
    /// `#`, `##`, `###` headings.
    Headings,
    /// `***bold italic***`, `**bold**`, `*italic*`.
    Emphasis,
    /// `` `inline code` ``.
    InlineCode,
    /// `![alt](url)`.
    Images,
    /// `[text](url)`, opened in a new browsing context.
    Links,
    /// `*`/`-` bullet lines, grouped into `<ul>` per contiguous run.
    ListItems,
    /// Remaining newlines to `<br>`, see [`LineBreaks`].
    LineBreaks,
}

impl Stage {
    /// Default stage order.
    ///
    /// Fences go first so no markdown stage rewrites code. Images precede links
    /// because every image also looks like a link after its `!`.
    pub const PIPELINE: [Self; 8] = [
        Self::FencedCode,
        Self::Headings,
        Self::Emphasis,
        Self::InlineCode,
        Self::Images,
        Self::Links,
        Self::ListItems,
        Self::LineBreaks,
    ];

    /// Stable kebab-case name, used in logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::FencedCode => "fenced-code",
            Self::Headings => "headings",
            Self::Emphasis => "emphasis",
            Self::InlineCode => "inline-code",
            Self::Images => "images",
            Self::Links => "links",
            Self::ListItems => "list-items",
            Self::LineBreaks => "line-breaks",
        }
    }

    pub(crate) fn apply(self, input: &str, ctx: &mut StageContext<'_>) -> String {
        match self {
            Self::FencedCode => fenced_code(input, ctx),
            Self::Headings => headings(input),
            Self::Emphasis => emphasis(input),
            Self::InlineCode => INLINE_CODE_PATTERN
                .replace_all(input, r#"<code class="inline-code">${1}</code>"#)
                .into_owned(),
            Self::Images => IMAGE_PATTERN
                .replace_all(input, r#"<img src="${2}" alt="${1}" />"#)
                .into_owned(),
            Self::Links => LINK_PATTERN
                .replace_all(input, r#"<a href="${2}" target="_blank">${1}</a>"#)
                .into_owned(),
            Self::ListItems => list_items(input),
            Self::LineBreaks => match ctx.options.line_breaks {
                LineBreaks::All => {
                    let restored = ctx.placeholders.restore(input);
                    NEWLINE_PATTERN.replace_all(&restored, "<br>").into_owned()
                }
                LineBreaks::OutsideBlocks => break_lines_outside_blocks(input),
            },
        }
    }
}

/// Per-call state shared by the stages of one render.
pub(crate) struct StageContext<'a> {
    pub(crate) highlighter: &'a Highlighter,
    pub(crate) options: &'a RenderOptions,
    pub(crate) placeholders: Placeholders,
}

impl<'a> StageContext<'a> {
    pub(crate) fn new(highlighter: &'a Highlighter, options: &'a RenderOptions) -> Self {
        Self {
            highlighter,
            options,
            placeholders: Placeholders::new(),
        }
    }
}

fn fenced_code(input: &str, ctx: &mut StageContext<'_>) -> String {
    FENCE_PATTERN
        .replace_all(input, |caps: &Captures| {
            let language = match &caps[1] {
                "" => ctx.options.default_language.as_str(),
                tag => tag,
            };
            let code = ctx.highlighter.highlight(&caps[2], language);
            // Fence tags are word characters; the configured default may be anything.
            let class = escape_html(language);
            ctx.placeholders.protect(format!(
                r#"<pre class="code-block"><code class="language-{class}">{code}</code></pre>"#
            ))
        })
        .into_owned()
}

fn headings(input: &str) -> String {
    // Most specific first, so "### x" is never read as "# " + "## x".
    let html = H3_PATTERN.replace_all(input, "<h3>${1}</h3>");
    let html = H2_PATTERN.replace_all(&html, "<h2>${1}</h2>");
    H1_PATTERN.replace_all(&html, "<h1>${1}</h1>").into_owned()
}

fn emphasis(input: &str) -> String {
    let html = STRONG_EM_PATTERN.replace_all(input, "<strong><em>${1}</em></strong>");
    let html = STRONG_PATTERN.replace_all(&html, "<strong>${1}</strong>");
    EM_PATTERN.replace_all(&html, "<em>${1}</em>").into_owned()
}

fn list_items(input: &str) -> String {
    let html = LIST_ITEM_PATTERN.replace_all(input, "<li>${1}</li>");
    LIST_RUN_PATTERN
        .replace_all(&html, "<ul>${0}</ul>")
        .into_owned()
}

/// Convert newlines to `<br>` everywhere except in and around block markup.
///
/// Newlines inside a `<ul>` are dropped, code placeholders are left alone, and
/// one newline directly before and after each block is consumed.
fn break_lines_outside_blocks(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    let mut after_block = false;

    for block in BLOCK_PATTERN.find_iter(input) {
        push_residual(&mut out, &input[last..block.start()], after_block, true);
        let text = block.as_str();
        if text.starts_with("<ul>") {
            out.push_str(&NEWLINE_PATTERN.replace_all(text, ""));
        } else {
            out.push_str(text);
        }
        last = block.end();
        after_block = true;
    }
    push_residual(&mut out, &input[last..], after_block, false);

    out
}

fn push_residual(out: &mut String, mut text: &str, after_block: bool, before_block: bool) {
    if after_block {
        text = strip_leading_newline(text);
    }
    if before_block {
        text = strip_trailing_newline(text);
    }
    out.push_str(&NEWLINE_PATTERN.replace_all(text, "<br>"));
}

fn strip_leading_newline(text: &str) -> &str {
    text.strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .unwrap_or(text)
}

fn strip_trailing_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}
