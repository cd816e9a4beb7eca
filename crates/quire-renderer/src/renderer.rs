//! Markdown renderer running the stage pipeline.

use std::sync::LazyLock;

use quire_highlight::{DEFAULT_LANGUAGE, Highlighter};

use crate::placeholders::Placeholders;
use crate::stage::{Stage, StageContext};

static DEFAULT_RENDERER: LazyLock<MarkdownRenderer> = LazyLock::new(MarkdownRenderer::new);

/// Render markdown to an HTML fragment with default options.
///
/// # Example
///
/// ```
/// assert_eq!(quire_renderer::render("### Title"), "<h3>Title</h3>");
/// ```
#[must_use]
pub fn render(markdown: &str) -> String {
    DEFAULT_RENDERER.render(markdown)
}

/// How the final stage treats newlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineBreaks {
    /// Convert newlines in running text only. Newlines inside lists and code
    /// blocks, and one newline on each side of a block element, are dropped.
    #[default]
    OutsideBlocks,
    /// Convert every newline, including inside code blocks and between list
    /// items.
    All,
}

impl LineBreaks {
    /// Parse a mode from its kebab-case name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "outside-blocks" => Some(Self::OutsideBlocks),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Kebab-case name of the mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OutsideBlocks => "outside-blocks",
            Self::All => "all",
        }
    }
}

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Newline handling of the final stage.
    pub line_breaks: LineBreaks,
    /// Language for fenced code blocks without a tag.
    pub default_language: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            line_breaks: LineBreaks::default(),
            default_language: DEFAULT_LANGUAGE.to_owned(),
        }
    }
}

/// Markdown renderer over an ordered list of [`Stage`]s.
///
/// Rendering is a pure function of the input, the options and the
/// highlighter's language table; one renderer can be shared across threads.
///
/// # Example
///
/// ```
/// use quire_renderer::{LineBreaks, MarkdownRenderer};
///
/// let renderer = MarkdownRenderer::new().with_line_breaks(LineBreaks::All);
/// assert_eq!(renderer.render("# A\nb"), "<h1>A</h1><br>b");
/// ```
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    highlighter: Highlighter,
    options: RenderOptions,
    stages: Vec<Stage>,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Create a renderer with the full pipeline and built-in languages.
    #[must_use]
    pub fn new() -> Self {
        Self {
            highlighter: Highlighter::default(),
            options: RenderOptions::default(),
            stages: Stage::PIPELINE.to_vec(),
        }
    }

    /// Use a custom highlighter for fenced code blocks.
    #[must_use]
    pub fn with_highlighter(mut self, highlighter: Highlighter) -> Self {
        self.highlighter = highlighter;
        self
    }

    /// Replace all options.
    #[must_use]
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the newline handling mode.
    #[must_use]
    pub fn with_line_breaks(mut self, line_breaks: LineBreaks) -> Self {
        self.options.line_breaks = line_breaks;
        self
    }

    /// Drop a stage from the pipeline.
    #[must_use]
    pub fn without_stage(mut self, stage: Stage) -> Self {
        self.stages.retain(|&s| s != stage);
        self
    }

    /// Stages in execution order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Current options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Highlighter used for fenced code blocks.
    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    /// Render markdown to an HTML fragment.
    ///
    /// Never fails: unterminated fences and unmatched markers stay as text.
    #[must_use]
    pub fn render(&self, markdown: &str) -> String {
        let mut ctx = StageContext::new(&self.highlighter, &self.options);
        let mut html = Placeholders::sanitize(markdown).into_owned();

        for &stage in &self.stages {
            html = stage.apply(&html, &mut ctx);
            tracing::trace!(stage = stage.name(), len = html.len(), "Applied render stage");
        }

        let html = ctx.placeholders.restore(&html);
        tracing::debug!(
            input_len = markdown.len(),
            output_len = html.len(),
            code_blocks = ctx.placeholders.len(),
            "Rendered markdown"
        );
        html
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use quire_highlight::{LanguageProfile, ProfileTable};

    use super::*;

    const DOCUMENT: &str = "# Title\n\nSome *em* and **strong** text with a [link](http://a.b) \
                            and ![img](i.png).\n\n* one\n* two\n\nEnd `code`";

    #[test]
    fn test_fenced_block_with_keyword_and_number() {
        let html = render("```js\nconst x = 1;\n```");
        assert_eq!(html.matches("<pre").count(), 1);
        assert_eq!(
            html,
            concat!(
                r#"<pre class="code-block"><code class="language-js">"#,
                r#"<span class="keyword">const</span> x = <span class="number">1</span>;"#,
                "\n</code></pre>"
            )
        );
    }

    #[test]
    fn test_image_is_never_a_link() {
        let html = render("![alt](a.png)");
        assert_eq!(html, r#"<img src="a.png" alt="alt" />"#);
        assert!(!html.contains("<a"));
    }

    #[test]
    fn test_linked_image() {
        assert_eq!(
            render("[![logo](l.png)](https://x.dev)"),
            r#"<a href="https://x.dev" target="_blank"><img src="l.png" alt="logo" /></a>"#
        );
    }

    #[test]
    fn test_heading_precedence() {
        assert_eq!(render("### Title"), "<h3>Title</h3>");
    }

    #[test]
    fn test_full_document() {
        assert_eq!(
            render(DOCUMENT),
            concat!(
                "<h1>Title</h1>",
                "<br>Some <em>em</em> and <strong>strong</strong> text with a ",
                r#"<a href="http://a.b" target="_blank">link</a> and "#,
                r#"<img src="i.png" alt="img" />.<br>"#,
                "<ul><li>one</li><li>two</li></ul>",
                r#"<br>End <code class="inline-code">code</code>"#
            )
        );
    }

    #[test]
    fn test_render_is_idempotent_without_code() {
        let once = render(DOCUMENT);
        assert_eq!(render(&once), once);
    }

    #[test]
    fn test_line_breaks_all() {
        let renderer = MarkdownRenderer::new().with_line_breaks(LineBreaks::All);
        assert_eq!(
            renderer.render("* one\n* two\n\nafter"),
            "<ul><li>one</li><br><li>two</li></ul><br><br>after"
        );
        assert_eq!(
            renderer.render("```js\nlet a\n```"),
            concat!(
                r#"<pre class="code-block"><code class="language-js">"#,
                r#"<span class="keyword">let</span> a<br></code></pre>"#
            )
        );
    }

    #[test]
    fn test_line_breaks_outside_blocks() {
        assert_eq!(render("# A\nText\n## B"), "<h1>A</h1>Text<h2>B</h2>");
        assert_eq!(render("line one\nline two"), "line one<br>line two");
    }

    #[test]
    fn test_code_is_protected_from_markdown_stages() {
        assert_eq!(
            render("```\n# not heading\n[x](y) *z*\n```\nafter"),
            concat!(
                r#"<pre class="code-block"><code class="language-text">"#,
                "# not heading\n[x](y) *z*\n</code></pre>after"
            )
        );
    }

    #[test]
    fn test_unterminated_fence_falls_through() {
        assert_eq!(render("```js\nconst a"), "```js<br>const a");
    }

    #[test]
    fn test_pattern_special_input() {
        let input = "[(.*+?)] \\1 $0 ${1} ^$|";
        assert_eq!(render(input), input);
    }

    #[test]
    fn test_placeholder_delimiters_are_sanitized() {
        assert_eq!(render("a\u{E000}0\u{E001}b"), "a\u{FFFD}0\u{FFFD}b");
    }

    #[test]
    fn test_crlf_input() {
        assert_eq!(render("# A\r\nB\r\nC"), "<h1>A</h1>B<br>C");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_without_stage() {
        let renderer = MarkdownRenderer::new().without_stage(Stage::LineBreaks);
        assert!(!renderer.stages().contains(&Stage::LineBreaks));
        assert_eq!(renderer.render("a\nb"), "a\nb");
    }

    #[test]
    fn test_custom_default_language() {
        let renderer = MarkdownRenderer::new().with_options(RenderOptions {
            default_language: "javascript".to_owned(),
            ..RenderOptions::default()
        });
        assert_eq!(
            renderer.render("```\nreturn\n```"),
            concat!(
                r#"<pre class="code-block"><code class="language-javascript">"#,
                r#"<span class="keyword">return</span>"#,
                "\n</code></pre>"
            )
        );
    }

    #[test]
    fn test_custom_highlighter() {
        let table = ProfileTable::default().with_profile(
            LanguageProfile::new("rust", ["fn"], true)
                .unwrap()
                .with_aliases(["rs"]),
        );
        let renderer =
            MarkdownRenderer::new().with_highlighter(Highlighter::new(Arc::new(table)));
        assert_eq!(
            renderer.render("```rs\nfn f()\n```"),
            concat!(
                r#"<pre class="code-block"><code class="language-rs">"#,
                r#"<span class="keyword">fn</span> f()"#,
                "\n</code></pre>"
            )
        );
    }

    #[test]
    fn test_line_breaks_parse() {
        assert_eq!(LineBreaks::parse("all"), Some(LineBreaks::All));
        assert_eq!(
            LineBreaks::parse("outside-blocks"),
            Some(LineBreaks::OutsideBlocks)
        );
        assert_eq!(LineBreaks::parse("some"), None);
        assert_eq!(LineBreaks::All.as_str(), "all");
    }

    #[test]
    fn test_renderer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MarkdownRenderer>();

        let renderer = Arc::new(MarkdownRenderer::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let renderer = Arc::clone(&renderer);
                std::thread::spawn(move || renderer.render(&format!("# Page {i}")))
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), format!("<h1>Page {i}</h1>"));
        }
    }
}
