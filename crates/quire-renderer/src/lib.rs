//! Markdown to HTML rendering for Quire.
//!
//! The renderer handles a restricted markdown dialect: headings (`#`–`###`),
//! emphasis, inline code, fenced code blocks, links, images, bullet lists and
//! line breaks. It is a fixed sequence of whole-document substitutions rather
//! than a parser; see [`Stage`] for the order and what each stage rewrites.
//!
//! Fenced code blocks are passed to [`quire_highlight::Highlighter`] and the
//! highlighted HTML is spliced back into the output.
//!
//! # Example
//!
//! ```
//! use quire_renderer::MarkdownRenderer;
//!
//! let html = MarkdownRenderer::new().render("## Setup\nRun **cargo**.");
//! assert_eq!(html, "<h2>Setup</h2>Run <strong>cargo</strong>.");
//! ```

mod placeholders;
mod renderer;
mod stage;

pub use renderer::{LineBreaks, MarkdownRenderer, RenderOptions, render};
pub use stage::Stage;
