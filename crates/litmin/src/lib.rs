//! # litmin
//!
//! Minifies HTML and CSS written inside tagged template literals, leaving the
//! surrounding code and every `${...}` expression where it was.
//!
//! Each template is handled with a placeholder round trip:
//! - **Placeholder**: pick token(s) that appear nowhere in the template text
//! - **Combine**: join the literal parts with the token(s) into one document
//! - **Minify**: run minify-html or lightningcss on that document
//! - **Split**: cut the result back into exactly as many parts as before
//!
//! The minified parts overwrite the original parts in an [`EditBuffer`], which
//! also produces a high-resolution source map.
//!
//! ## Example
//!
//! ```text
//! use litmin::{minify_source, Options, Outcome};
//!
//! let source = "html`<div   class=\"${cls}\">  hello  </div>`";
//! match minify_source(source, &Options::new().with_file_name("app.js")).await? {
//!     Outcome::Changed(min) => println!("{}", min.code),
//!     Outcome::Unchanged { .. } => println!("nothing to do"),
//! }
//! ```

mod config;
mod css;
mod edit;
mod html;
mod minify;
mod options;
mod placeholder;
mod source_map;
mod split;
mod strategy;
mod validate;

pub use config::MinifyConfig;
pub use css::restore_pseudo_class_spacing;
pub use edit::{EditBuffer, EditorFactory, SourceEditor};
pub use litmin_literals::{LiteralParser, OxcLiteralParser, ParseError, Part, Template};
pub use minify::{
    MinifiedSource, Outcome, Warning, default_should_minify, default_should_minify_css,
    minify_source,
};
pub use options::{
    CssFn, CssMinify, CssOptions, HtmlOptions, MapFn, MinifyOptions, Options, Predicate,
    SourceMapMode, Validation,
};
pub use placeholder::{Language, Placeholder, generate_placeholder};
pub use source_map::{MapOptions, SourceMapOutput};
pub use split::{combine, split};
pub use strategy::{CssOutcome, DefaultStrategy, HtmlOutcome, SkipReason, Strategy};
pub use validate::{DefaultValidator, Validator};

/// Error type for litmin operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A placeholder token was empty, or the token list was empty
    #[error("placeholder must be a non-empty string (or a list of non-empty strings)")]
    EmptyPlaceholder,

    /// Splitting produced a different number of parts than the template had
    #[error("splitting must return as many strings as template parts: expected {expected}, got {actual}")]
    PartCountMismatch { expected: usize, actual: usize },

    /// An ordered placeholder token was missing from the minified output
    #[error("placeholder token `{token}` not found after byte {from} of minified output")]
    PlaceholderNotFound { token: String, from: usize },

    /// The CSS minifier rejected the stylesheet
    #[error("CSS minification failed: {0}")]
    CssMinify(String),

    /// The HTML minifier produced unusable output
    #[error("HTML minification failed: {0}")]
    HtmlMinify(String),

    /// Template literals could not be located
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An overwrite intersects an earlier one
    #[error("overlapping edits: [{a_start},{a_end}) overlaps [{b_start},{b_end})")]
    OverlappingEdit {
        a_start: usize,
        a_end: usize,
        b_start: usize,
        b_end: usize,
    },

    /// An overwrite range is empty, reversed, or outside the source
    #[error("invalid edit [{start},{end}) for a source of {len} bytes")]
    InvalidEdit { start: usize, end: usize, len: usize },

    /// Source map could not be built or serialized
    #[error("source map error: {0}")]
    SourceMap(String),

    /// Configuration could not be loaded
    #[error("config error: {0}")]
    Config(String),
}

impl From<sourcemap::Error> for Error {
    fn from(e: sourcemap::Error) -> Self {
        Error::SourceMap(e.to_string())
    }
}

/// Result type alias for litmin operations.
pub type Result<T> = std::result::Result<T, Error>;
