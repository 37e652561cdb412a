//! Options for minifying a source file.

use std::fmt;
use std::sync::Arc;

use litmin_literals::{LiteralParser, Template};

use crate::edit::{EditorFactory, SourceEditor};
use crate::source_map::SourceMapOutput;
use crate::strategy::Strategy;
use crate::validate::Validator;

/// Decides whether a template should be minified.
pub type Predicate = Arc<dyn Fn(&Template) -> bool + Send + Sync>;

/// Replaces the CSS minifier with a caller-supplied function.
pub type CssFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Builds a source map from the edited buffer and the file name.
pub type MapFn = Arc<dyn Fn(&dyn SourceEditor, &str) -> crate::Result<SourceMapOutput> + Send + Sync>;

/// Knobs for the HTML minifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlOptions {
    /// Also remove line breaks inside `<svg>` elements. minify-html always
    /// collapses whitespace elsewhere.
    pub collapse_whitespace: bool,

    /// Drop `<!-- ... -->` comments
    pub remove_comments: bool,

    /// Keep optional closing tags (`</p>`, `</li>`), which matter in fragments
    pub keep_closing_tags: bool,

    /// Keep the space between attributes even where it could be dropped
    pub keep_spaces_between_attributes: bool,

    /// Minify `<script>` contents
    pub minify_js: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            collapse_whitespace: true,
            remove_comments: true,
            keep_closing_tags: true,
            keep_spaces_between_attributes: true,
            minify_js: false,
        }
    }
}

/// Knobs for the CSS minifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssOptions {
    /// Put back spaces the minifier removed inside pseudo-class arguments,
    /// e.g. `:nth-child(2n + 1)`
    pub restore_pseudo_class_spacing: bool,
}

impl Default for CssOptions {
    fn default() -> Self {
        Self {
            restore_pseudo_class_spacing: true,
        }
    }
}

/// How stylesheet text is minified, both in `css` templates and in `<style>`.
#[derive(Clone)]
pub enum CssMinify {
    /// Use lightningcss (and minify-html's CSS path inside markup)
    Default(CssOptions),
    /// Leave stylesheet text alone
    Disabled,
    /// Use a caller-supplied minifier
    Custom(CssFn),
}

impl Default for CssMinify {
    fn default() -> Self {
        CssMinify::Default(CssOptions::default())
    }
}

impl fmt::Debug for CssMinify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CssMinify::Default(options) => f.debug_tuple("Default").field(options).finish(),
            CssMinify::Disabled => f.write_str("Disabled"),
            CssMinify::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Options forwarded to the minifiers.
#[derive(Debug, Clone, Default)]
pub struct MinifyOptions {
    pub html: HtmlOptions,
    pub css: CssMinify,
}

/// Whether and how a source map is produced.
#[derive(Clone, Default)]
pub enum SourceMapMode {
    /// High-resolution map named `<file>.map`
    #[default]
    Default,
    /// No source map
    Disabled,
    /// Caller-supplied map generator
    Custom(MapFn),
}

/// Whether and how the placeholder protocol is validated.
#[derive(Clone, Default)]
pub enum Validation {
    /// [`DefaultValidator`](crate::DefaultValidator)
    #[default]
    Default,
    /// No checks
    Disabled,
    /// Caller-supplied checks
    Custom(Arc<dyn Validator>),
}

/// Options for [`minify_source`](crate::minify_source).
#[derive(Clone, Default)]
pub struct Options {
    /// Source file name, used for the map and to pick the parser dialect
    pub file_name: Option<String>,

    /// Options forwarded to the minifiers
    pub minify: MinifyOptions,

    /// Overrides [`default_should_minify`](crate::default_should_minify)
    pub should_minify: Option<Predicate>,

    /// Overrides [`default_should_minify_css`](crate::default_should_minify_css)
    pub should_minify_css: Option<Predicate>,

    pub source_map: SourceMapMode,

    pub validation: Validation,

    /// Replaces [`DefaultStrategy`](crate::DefaultStrategy)
    pub strategy: Option<Arc<dyn Strategy>>,

    /// Replaces [`OxcLiteralParser`](crate::OxcLiteralParser)
    pub parser: Option<Arc<dyn LiteralParser>>,

    /// Replaces [`EditBuffer`](crate::EditBuffer)
    pub editor: Option<EditorFactory>,
}

impl Options {
    /// Create new options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_minify_options(mut self, minify: MinifyOptions) -> Self {
        self.minify = minify;
        self
    }

    pub fn with_should_minify<F>(mut self, f: F) -> Self
    where
        F: Fn(&Template) -> bool + Send + Sync + 'static,
    {
        self.should_minify = Some(Arc::new(f));
        self
    }

    pub fn with_should_minify_css<F>(mut self, f: F) -> Self
    where
        F: Fn(&Template) -> bool + Send + Sync + 'static,
    {
        self.should_minify_css = Some(Arc::new(f));
        self
    }

    pub fn with_source_map(mut self, mode: SourceMapMode) -> Self {
        self.source_map = mode;
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_strategy<S: Strategy + 'static>(mut self, strategy: S) -> Self {
        self.strategy = Some(Arc::new(strategy));
        self
    }

    pub fn with_parser<P: LiteralParser + 'static>(mut self, parser: P) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    pub fn with_editor(mut self, factory: EditorFactory) -> Self {
        self.editor = Some(factory);
        self
    }
}
