//! # litmin-literals
//!
//! Locates template literals in JavaScript and TypeScript source and exposes
//! them as [`Template`]s: an optional tag plus the literal [`Part`]s that sit
//! between `${...}` expressions, with byte offsets into the original source.
//!
//! The default [`OxcLiteralParser`] uses OXC. Anything implementing
//! [`LiteralParser`] can stand in for it.
//!
//! ## Example
//!
//! ```text
//! use litmin_literals::{LiteralParser, OxcLiteralParser};
//!
//! let templates = OxcLiteralParser.parse("html`<p>${name}</p>`", None)?;
//! assert_eq!(templates[0].tag.as_deref(), Some("html"));
//! assert_eq!(templates[0].parts.len(), 2);
//! ```

mod oxc_parser;

pub use oxc_parser::OxcLiteralParser;

/// A literal text segment of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Raw text, exactly as written in the source
    pub text: String,
    /// Byte offset of the first character in the original source
    pub start: usize,
    /// Byte offset one past the last character in the original source
    pub end: usize,
}

impl Part {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Zero-length parts come from adjacent expressions (`${a}${b}`).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A template literal: consecutive parts are separated by exactly one expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Source text of the tag expression (`html`, `svg`, `this.css`, ...)
    pub tag: Option<String>,
    /// Literal segments, always one more than the number of expressions
    pub parts: Vec<Part>,
}

impl Template {
    pub fn new(tag: Option<String>, parts: Vec<Part>) -> Self {
        Self { tag, parts }
    }

    /// Number of `${...}` expression slots.
    pub fn expression_count(&self) -> usize {
        self.parts.len().saturating_sub(1)
    }

    /// Byte offset where the first part starts.
    pub fn start(&self) -> usize {
        self.parts.first().map(|p| p.start).unwrap_or(0)
    }
}

/// Finds template literals in a source string.
pub trait LiteralParser: Send + Sync {
    /// Return every template literal in `source`, ordered by position.
    ///
    /// `file_name` selects the dialect (`.ts`, `.tsx`, `.jsx`, ...) when known.
    fn parse(&self, source: &str, file_name: Option<&str>) -> Result<Vec<Template>>;
}

/// Error type for literal parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The source could not be parsed at all
    #[error("{file}: failed to parse source: {}", messages.join("; "))]
    Syntax { file: String, messages: Vec<String> },

    /// A literal span did not line up with the source text
    #[error("template literal at byte {offset} is out of bounds for a source of {len} bytes")]
    OutOfBounds { offset: usize, len: usize },
}

/// Result type alias for literal parsing.
pub type Result<T> = std::result::Result<T, ParseError>;
