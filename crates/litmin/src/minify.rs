//! Minifying every eligible template in a source file.

use std::fmt;
use std::sync::{Arc, LazyLock};

use futures::future::try_join_all;
use litmin_literals::{LiteralParser, OxcLiteralParser, Template};
use regex::Regex;

use crate::Result;
use crate::edit::EditBuffer;
use crate::options::{CssMinify, MinifyOptions, Options, SourceMapMode, Validation};
use crate::placeholder::Language;
use crate::source_map::{MapOptions, SourceMapOutput};
use crate::strategy::{CssOutcome, DefaultStrategy, HtmlOutcome, SkipReason, Strategy};
use crate::validate::{DefaultValidator, Validator};

const UNSAFE_CSS: &str = "unsafeCSS";
const UNSAFE_HTML: &str = "unsafeHTML";

/// A call to `unsafeCSS(..)` disables stylesheet minification for a file
static UNSAFE_CSS_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bunsafeCSS\s*\(").unwrap());

/// A call to `unsafeHTML(..)` disables markup minification for a file
static UNSAFE_HTML_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bunsafeHTML\s*\(").unwrap());

/// Something worth telling the user that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The file calls `unsafeCSS`; stylesheet templates were left alone
    UnsafeCss,
    /// The file calls `unsafeHTML`; markup templates were left alone
    UnsafeHtml,
    /// A markup template had an expression inside a comment and was left alone
    ExpressionInComment { tag: Option<String>, start: usize },
    /// The CSS minifier reported recoverable errors or mangled a placeholder;
    /// only line breaks were removed
    CssFallback {
        tag: Option<String>,
        start: usize,
        messages: Vec<String>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnsafeCss => write!(
                f,
                "`{UNSAFE_CSS}(..)` called in source; skipping CSS minification for this file"
            ),
            Warning::UnsafeHtml => write!(
                f,
                "`{UNSAFE_HTML}(..)` called in source; skipping HTML minification for this file"
            ),
            Warning::ExpressionInComment { tag, start } => write!(
                f,
                "template `{}` at byte {start} has an expression inside an HTML comment; left unminified",
                tag.as_deref().unwrap_or("")
            ),
            Warning::CssFallback {
                tag,
                start,
                messages,
            } => write!(
                f,
                "CSS minifier reported errors for template `{}` at byte {start}; left unminified: {}",
                tag.as_deref().unwrap_or(""),
                messages.join("; ")
            ),
        }
    }
}

/// The rewritten file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifiedSource {
    pub code: String,
    /// `None` when maps are disabled
    pub map: Option<SourceMapOutput>,
    pub warnings: Vec<Warning>,
}

/// Result of [`minify_source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed; the caller should keep the file as it was
    Unchanged { warnings: Vec<Warning> },
    Changed(MinifiedSource),
}

impl Outcome {
    pub fn warnings(&self) -> &[Warning] {
        match self {
            Outcome::Unchanged { warnings } => warnings,
            Outcome::Changed(source) => &source.warnings,
        }
    }

    /// The rewritten code, if anything changed.
    pub fn code(&self) -> Option<&str> {
        match self {
            Outcome::Unchanged { .. } => None,
            Outcome::Changed(source) => Some(&source.code),
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Outcome::Changed(_))
    }
}

/// Minify templates whose tag mentions `html` or `svg` (case-insensitive).
pub fn default_should_minify(template: &Template) -> bool {
    template.tag.as_deref().is_some_and(|tag| {
        let tag = tag.to_lowercase();
        tag.contains("html") || tag.contains("svg")
    })
}

/// Minify templates as stylesheets when their tag mentions `css`.
pub fn default_should_minify_css(template: &Template) -> bool {
    template
        .tag
        .as_deref()
        .is_some_and(|tag| tag.to_lowercase().contains("css"))
}

/// Replacements for one template.
#[derive(Default)]
struct TemplateEdits {
    /// `(start, end, text)` against the original source
    edits: Vec<(usize, usize, String)>,
    warning: Option<Warning>,
}

/// Minify every eligible template literal in `source`.
///
/// Templates are minified concurrently; the edits are applied afterwards, in
/// source order. Any error aborts the whole call and nothing is returned.
pub async fn minify_source(source: &str, options: &Options) -> Result<Outcome> {
    let parser: Arc<dyn LiteralParser> = options
        .parser
        .clone()
        .unwrap_or_else(|| Arc::new(OxcLiteralParser));
    let strategy: Arc<dyn Strategy> = options
        .strategy
        .clone()
        .unwrap_or_else(|| Arc::new(DefaultStrategy));
    let validator: Option<Arc<dyn Validator>> = match &options.validation {
        Validation::Default => Some(Arc::new(DefaultValidator)),
        Validation::Disabled => None,
        Validation::Custom(validator) => Some(validator.clone()),
    };

    let templates = parser.parse(source, options.file_name.as_deref())?;
    tracing::debug!(
        file = ?options.file_name,
        templates = templates.len(),
        "found template literals"
    );

    let mut warnings = Vec::new();
    let skip_css = UNSAFE_CSS_CALL.is_match(source);
    if skip_css {
        warnings.push(Warning::UnsafeCss);
    }
    let skip_html = UNSAFE_HTML_CALL.is_match(source);
    if skip_html {
        warnings.push(Warning::UnsafeHtml);
    }

    let should_minify = |template: &Template| match &options.should_minify {
        Some(predicate) => predicate(template),
        None => default_should_minify(template),
    };
    let should_minify_css = |template: &Template| match &options.should_minify_css {
        Some(predicate) => predicate(template),
        None => default_should_minify_css(template),
    };

    let jobs = templates.iter().filter_map(|template| {
        let language = if !skip_css && should_minify_css(template) {
            Language::Css
        } else if !skip_html && should_minify(template) {
            Language::Html
        } else {
            return None;
        };
        Some(minify_template(
            template,
            language,
            strategy.as_ref(),
            validator.as_deref(),
            &options.minify,
        ))
    });
    let results = try_join_all(jobs).await?;

    let factory = options.editor.clone().unwrap_or_else(EditBuffer::factory);
    let mut editor = factory(source);
    for result in results {
        for (start, end, text) in result.edits {
            editor.overwrite(start, end, &text)?;
        }
        warnings.extend(result.warning);
    }

    for warning in &warnings {
        tracing::warn!(file = ?options.file_name, "{warning}");
    }

    let code = editor.to_code();
    if code == source {
        tracing::debug!(file = ?options.file_name, "no changes");
        return Ok(Outcome::Unchanged { warnings });
    }

    let file_name = options.file_name.as_deref().unwrap_or("");
    let map = match &options.source_map {
        SourceMapMode::Default => Some(editor.generate_map(&MapOptions::for_file(file_name))?),
        SourceMapMode::Disabled => None,
        SourceMapMode::Custom(generate) => Some(generate(editor.as_ref(), file_name)?),
    };

    tracing::debug!(
        file = ?options.file_name,
        before = source.len(),
        after = code.len(),
        "minified templates"
    );

    Ok(Outcome::Changed(MinifiedSource {
        code,
        map,
        warnings,
    }))
}

/// Run the placeholder round trip for one template.
async fn minify_template(
    template: &Template,
    language: Language,
    strategy: &dyn Strategy,
    validator: Option<&dyn Validator>,
    options: &MinifyOptions,
) -> Result<TemplateEdits> {
    let parts = &template.parts;
    let placeholder = strategy.placeholder(parts, language);
    if let Some(validator) = validator {
        validator.ensure_placeholder_valid(&placeholder)?;
    }

    let combined = strategy.combine(parts, &placeholder);
    tracing::trace!(start = template.start(), ?language, %combined, "combined template");

    let mut warning = None;
    let minified = match language {
        Language::Css => match &options.css {
            CssMinify::Custom(minify) => minify(&combined),
            CssMinify::Disabled => combined,
            CssMinify::Default(css_options) => {
                match strategy
                    .minify_css(&combined, &placeholder, css_options)
                    .await?
                {
                    CssOutcome::Minified(css) => css,
                    CssOutcome::Fallback { css, warnings } => {
                        warning = Some(Warning::CssFallback {
                            tag: template.tag.clone(),
                            start: template.start(),
                            messages: warnings,
                        });
                        css
                    }
                }
            }
        },
        Language::Html => match strategy.minify_html(&combined, &placeholder, options).await? {
            HtmlOutcome::Minified(html) => html,
            HtmlOutcome::Skipped {
                reason: SkipReason::ExpressionInComment,
                ..
            } => {
                return Ok(TemplateEdits {
                    edits: Vec::new(),
                    warning: Some(Warning::ExpressionInComment {
                        tag: template.tag.clone(),
                        start: template.start(),
                    }),
                });
            }
        },
    };

    let minified_parts = strategy.split(&minified, &placeholder)?;
    if let Some(validator) = validator {
        validator.ensure_parts_valid(parts, &minified_parts)?;
    }

    // Zero-length parts have no range to overwrite
    let edits = parts
        .iter()
        .zip(minified_parts)
        .filter(|(part, _)| !part.is_empty())
        .map(|(part, text)| (part.start, part.end, text))
        .collect();

    Ok(TemplateEdits { edits, warning })
}
