//! Pattern-based syntax highlighting for code samples.
//!
//! Given a code fragment and a language identifier, [`highlight`] returns an
//! HTML fragment in which keywords, string literals, numbers and comments are
//! wrapped in `<span class="keyword|string|number|comment">` elements.
//!
//! # Architecture
//!
//! - [`LanguageProfile`]: keywords and comment support for one language
//! - [`ProfileTable`]: case-insensitive lookup with a default fallback
//! - [`Highlighter`]: runs the [`HighlightPass`]es over a table
//!
//! This is not a tokenizer. Passes are regular-expression matches over the
//! source text; a keyword that appears inside a string literal is marked as a
//! keyword *and* enclosed by the string span.
//!
//! # Example
//!
//! ```
//! use quire_highlight::{Highlighter, ProfileTable};
//!
//! let highlighter = Highlighter::new(ProfileTable::builtin());
//! let html = highlighter.highlight("return 42 // answer", "javascript");
//! assert_eq!(
//!     html,
//!     r#"<span class="keyword">return</span> <span class="number">42</span> <span class="comment">// answer</span>"#
//! );
//! ```

mod highlighter;
mod html;
mod profile;

pub use highlighter::{HighlightPass, Highlighter, highlight};
pub use html::escape_html;
pub use profile::{DEFAULT_LANGUAGE, LanguageProfile, ProfileError, ProfileTable};
